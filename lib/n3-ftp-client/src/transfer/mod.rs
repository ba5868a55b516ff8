/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::net::SocketAddr;

mod line;
pub use line::FtpLineDataReceiver;
pub(crate) use line::FtpLineDataTransfer;

mod netascii;
pub use netascii::{NetasciiReader, NetasciiWriter};

/// The TYPE in effect for file transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpTransferType {
    /// TYPE A, line endings are rewritten to CRLF on the wire
    Ascii,
    /// TYPE I, bytes pass through untouched
    #[default]
    Image,
}

/// How the data connection of a transfer gets established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpDataConnectionMode {
    /// we listen and tell the server where to connect (PORT/EPRT)
    #[default]
    ActiveLocal,
    /// the server listens and we connect (PASV/EPSV)
    PassiveLocal,
    /// server-to-server: point this server at another server's listener
    ActiveRemote(SocketAddr),
    /// server-to-server: put this server in passive mode and leave the
    /// connect to its peer
    PassiveRemote,
}

impl FtpDataConnectionMode {
    /// Whether a transfer in this mode yields a local data socket.
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            FtpDataConnectionMode::ActiveLocal | FtpDataConnectionMode::PassiveLocal
        )
    }
}

/// The STRU in effect. Only `File` is ever useful against today's
/// servers; the others exist for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpFileStructure {
    #[default]
    File,
    Record,
    Page,
}

impl FtpFileStructure {
    pub(crate) fn as_arg(&self) -> &'static str {
        match self {
            FtpFileStructure::File => "F",
            FtpFileStructure::Record => "R",
            FtpFileStructure::Page => "P",
        }
    }
}

/// The MODE in effect. Stream is the only one in practical use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtpTransferMode {
    #[default]
    Stream,
    Block,
    Compressed,
}

impl FtpTransferMode {
    pub(crate) fn as_arg(&self) -> &'static str {
        match self {
            FtpTransferMode::Stream => "S",
            FtpTransferMode::Block => "B",
            FtpTransferMode::Compressed => "C",
        }
    }
}
