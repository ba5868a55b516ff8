/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod io;

mod auth;
pub use auth::{CredentialParseError, Password, Username};

mod net;
pub use net::{Host, UpstreamAddr, UpstreamAddrParseError};

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

pub mod error;

mod observer;
pub use observer::FtpEventObserver;

mod feature;

mod control;
pub use control::FtpReply;

mod connection;
pub use connection::{FtpConnectionProvider, TcpConnectionProvider};

mod transfer;
pub use transfer::{
    FtpDataConnectionMode, FtpFileStructure, FtpLineDataReceiver, FtpTransferMode, FtpTransferType,
    NetasciiReader, NetasciiWriter,
};

mod facts;
pub use facts::{FtpFileEntryType, FtpFileFacts};

mod listing;
pub use listing::{
    FtpAccessClass, FtpDirectoryListing, FtpEntryTime, FtpFilePermissions, FtpFileType,
    FtpListEntry, FtpListEntryParser, FtpListParsePolicy, FtpListingPager, FtpPermissionType,
    UnixListEntryParser,
};

mod client;
pub use client::FtpClient;
