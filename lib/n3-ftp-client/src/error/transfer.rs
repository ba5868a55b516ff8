/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::io;
use std::net::IpAddr;

use thiserror::Error;

use super::{FtpCommandError, FtpReplyError};
use crate::control::FtpCommand;

#[derive(Debug)]
pub(crate) enum FtpFilePreTransferStatus {
    Proceed,
    Invalid,
}

/// Rejection of the transfer command itself (RETR / STOR / LIST / ...).
#[derive(Debug, Error)]
pub enum FtpTransferStartError {
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable")]
    FileUnavailable,
    #[error("need account for storing")]
    NeedAccountForStoring,
    #[error("filename not allowed")]
    FileNameNotAllowed,
    #[error("insufficient storage space")]
    InsufficientStorageSpace,
}

impl From<FtpCommandError> for FtpTransferStartError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpTransferStartError::ServiceNotAvailable,
            _ => FtpTransferStartError::CommandError(e),
        }
    }
}

impl From<FtpReplyError> for FtpTransferStartError {
    fn from(e: FtpReplyError) -> Self {
        FtpCommandError::from(e).into()
    }
}

/// Failure while negotiating and opening the per-transfer data connection.
#[derive(Debug, Error)]
pub enum FtpTransferSetupError<E: std::error::Error> {
    #[error("raw command error: {0}")]
    RawCommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("transfer start rejected: {0}")]
    StartRejected(FtpTransferStartError),
    #[error("pre transfer rejected by server")]
    PreTransferRejected,
    #[error("restart not accepted, reply code {0}")]
    RestartNotAccepted(u16),
    #[error("data connect failed: {0:?}")]
    DataConnectFailed(E),
    #[error("timed out to connect data connection")]
    DataConnectTimedOut,
    #[error("data listen failed: {0:?}")]
    DataListenFailed(E),
    #[error("data accept failed: {0:?}")]
    DataAcceptFailed(E),
    #[error("timed out to accept data connection")]
    DataAcceptTimedOut,
    #[error("data connection peer {actual} does not match control peer {expected}")]
    DataPeerMismatch { expected: IpAddr, actual: IpAddr },
}

impl<E: std::error::Error> From<FtpCommandError> for FtpTransferSetupError<E> {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpTransferSetupError::ServiceNotAvailable,
            _ => FtpTransferSetupError::RawCommandError(e),
        }
    }
}

impl<E: std::error::Error> From<FtpTransferStartError> for FtpTransferSetupError<E> {
    fn from(e: FtpTransferStartError) -> Self {
        match e {
            FtpTransferStartError::ServiceNotAvailable => {
                FtpTransferSetupError::ServiceNotAvailable
            }
            _ => FtpTransferSetupError::StartRejected(e),
        }
    }
}

/// Server verdict read from the control channel after the data phase.
#[derive(Debug, Error)]
pub enum FtpTransferServerError {
    #[error("recv failed: {0}")]
    RecvFailed(#[from] FtpReplyError),
    #[error("restart needed")]
    RestartNeeded,
    #[error("data transfer not established")]
    DataTransferNotEstablished,
    #[error("data transfer lost")]
    DataTransferLost,
    #[error("server failed")]
    ServerFailed,
    #[error("page type unknown")]
    PageTypeUnknown,
    #[error("exceeded storage allocation")]
    ExceededStorageAllocation,
    #[error("unexpected end reply code ({0} -> {1})")]
    UnexpectedEndReplyCode(FtpCommand, u16),
}

#[derive(Debug, Error)]
pub enum FtpLineDataReadError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("unsupported encoding")]
    UnsupportedEncoding,
    #[error("line {0} is too long")]
    LineTooLong(usize),
    #[error("too many lines")]
    TooManyLines,
    #[error("aborted by callback")]
    AbortedByCallback,
}
