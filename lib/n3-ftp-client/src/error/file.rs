/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::io;

use thiserror::Error;

use super::{
    FtpCommandError, FtpLineDataReadError, FtpReplyError, FtpTransferServerError,
    FtpTransferSetupError,
};

#[derive(Debug, Error)]
pub enum FtpFileFactsParseError {
    #[error("no space delimiter")]
    NoSpaceDelimiter,
    #[error("no delimiter in fact ({0})")]
    NoDelimiterInFact(String),
    #[error("invalid modify time: {0}")]
    InvalidModifyTime(chrono::ParseError),
    #[error("invalid create time: {0}")]
    InvalidCreateTime(chrono::ParseError),
    #[error("invalid size")]
    InvalidSize,
}

#[derive(Debug, Error)]
pub enum FtpFileStatError {
    #[error("raw command error: {0}")]
    RawCommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("feature unavailable")]
    FeatUnavailable,
    #[error("file unavailable")]
    FileUnavailable,
}

impl From<FtpCommandError> for FtpFileStatError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileStatError::ServiceNotAvailable,
            _ => FtpFileStatError::RawCommandError(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileListError {
    #[error("server reported error: {0}")]
    ServerReportedError(#[from] FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
    #[error("timeout to wait all data")]
    TimeoutToWaitAllData,
    #[error("data read failed: {0}")]
    DataReadFailed(FtpLineDataReadError),
    #[error("local io callback failed")]
    LocalIoCallbackFailed,
}

impl From<FtpLineDataReadError> for FtpFileListError {
    fn from(e: FtpLineDataReadError) -> Self {
        match e {
            FtpLineDataReadError::AbortedByCallback => FtpFileListError::LocalIoCallbackFailed,
            _ => FtpFileListError::DataReadFailed(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileRetrieveError {
    #[error("server reported error: {0}")]
    ServerReportedError(FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
    #[error("control read error: {0}")]
    ControlReadError(FtpReplyError),
}

impl From<FtpTransferServerError> for FtpFileRetrieveError {
    fn from(e: FtpTransferServerError) -> Self {
        if let FtpTransferServerError::RecvFailed(e) = e {
            FtpFileRetrieveError::ControlReadError(e)
        } else {
            FtpFileRetrieveError::ServerReportedError(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileStoreError {
    #[error("server reported error: {0}")]
    ServerReportedError(FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
    #[error("control read error: {0}")]
    ControlReadError(FtpReplyError),
}

impl From<FtpTransferServerError> for FtpFileStoreError {
    fn from(e: FtpTransferServerError) -> Self {
        if let FtpTransferServerError::RecvFailed(e) = e {
            FtpFileStoreError::ControlReadError(e)
        } else {
            FtpFileStoreError::ServerReportedError(e)
        }
    }
}

/// Error of the one-shot copy helpers, which drive setup, the data
/// phase and the end reply in a single call.
#[derive(Debug, Error)]
pub enum FtpFileCopyError<E: std::error::Error> {
    #[error("transfer setup failed: {0}")]
    SetupFailed(#[from] FtpTransferSetupError<E>),
    #[error("not supported in remote transfer mode")]
    RemoteModeNotSupported,
    #[error("data copy failed: {0:?}")]
    DataCopyFailed(io::Error),
    #[error("server reported error: {0}")]
    ServerReportedError(FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
}

#[derive(Debug, Error)]
pub enum FtpDirectoryListError<E: std::error::Error> {
    #[error("transfer setup failed: {0}")]
    SetupFailed(#[from] FtpTransferSetupError<E>),
    #[error("not supported in remote transfer mode")]
    RemoteModeNotSupported,
    #[error("list receive failed: {0}")]
    ListFailed(#[from] FtpFileListError),
}
