/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

mod reply;
pub use reply::FtpReplyError;

mod command;
pub use command::FtpCommandError;

mod connect;
pub use connect::FtpConnectError;

mod session;
pub use session::FtpSessionOpenError;
pub(crate) use session::FtpAuthStatus;

mod transfer;
pub use transfer::{
    FtpLineDataReadError, FtpTransferServerError, FtpTransferSetupError, FtpTransferStartError,
};
pub(crate) use transfer::FtpFilePreTransferStatus;

mod file;
pub use file::{
    FtpDirectoryListError, FtpFileCopyError, FtpFileFactsParseError, FtpFileListError,
    FtpFileRetrieveError, FtpFileStatError, FtpFileStoreError,
};
