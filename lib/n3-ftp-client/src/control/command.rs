/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::FtpControlChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpCommand(&'static str);

impl FtpCommand {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ftp_commands {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $phrase:expr);
        )+
    ) => {
        impl FtpCommand {
        $(
            $(#[$docs])*
            pub const $konst: FtpCommand = FtpCommand($phrase);
        )+
        }
    };
}

ftp_commands! {
    /// a fake command for greeting
    (GREETING, "-");
    (USER, "USER");
    (PASS, "PASS");
    (ACCT, "ACCT");
    (CWD, "CWD");
    (CDUP, "CDUP");
    (SMNT, "SMNT");
    (REIN, "REIN");
    (QUIT, "QUIT");
    (PORT, "PORT");
    (EPRT, "EPRT");
    (PASV, "PASV");
    (EPSV, "EPSV");
    (TYPE_A, "TYPE A");
    (TYPE_I, "TYPE I");
    (STRU, "STRU");
    (MODE, "MODE");
    (ALLO, "ALLO");
    (RETR, "RETR");
    (STOR, "STOR");
    (STOU, "STOU");
    (APPE, "APPE");
    (REST, "REST");
    (RNFR, "RNFR");
    (RNTO, "RNTO");
    (ABOR, "ABOR");
    (DELE, "DELE");
    (RMD, "RMD");
    (MKD, "MKD");
    (PWD, "PWD");
    (LIST, "LIST");
    (NLST, "NLST");
    (SITE, "SITE");
    (SYST, "SYST");
    (STAT, "STAT");
    (HELP, "HELP");
    (NOOP, "NOOP");
    (FEAT, "FEAT");
    (OPTS_UTF8_ON, "OPTS UTF8 ON");
    (PRET, "PRET");
    (SIZE, "SIZE");
    (MDTM, "MDTM");
    (MLST, "MLST");
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) async fn send_all_raw(&mut self, verb: &str, buf: &str) -> io::Result<()> {
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(buf.trim_end());

        self.stream.write_all(buf.as_bytes()).await?;
        self.stream.flush().await?;
        self.observers.notify_command_sent(verb, buf.trim_end());
        Ok(())
    }

    pub(super) async fn send_cmd(&mut self, cmd: FtpCommand) -> io::Result<()> {
        let mut buf = String::with_capacity(cmd.0.len() + 2);
        buf.push_str(cmd.0);
        buf.push_str("\r\n");

        self.send_all_raw(cmd.0, &buf).await
    }

    pub(super) async fn send_cmd1(&mut self, cmd: FtpCommand, param1: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(cmd.0.len() + 1 + param1.len() + 2);
        buf.push_str(cmd.0);
        buf.push(' ');
        buf.push_str(param1);
        buf.push_str("\r\n");

        self.send_all_raw(cmd.0, &buf).await
    }

    pub(super) async fn send_pre_transfer_cmd(
        &mut self,
        cmd: FtpCommand,
        param1: &str,
    ) -> io::Result<()> {
        let mut buf = String::with_capacity(5 + cmd.0.len() + 1 + param1.len() + 2);
        buf.push_str("PRET ");
        buf.push_str(cmd.0);
        if !param1.is_empty() {
            buf.push(' ');
            buf.push_str(param1);
        }
        buf.push_str("\r\n");

        self.send_all_raw(FtpCommand::PRET.0, &buf).await
    }
}
