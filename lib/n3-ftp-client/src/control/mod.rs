/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::net::{SocketAddr, SocketAddrV4};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::auth::{Password, Username};
use crate::config::FtpControlConfig;
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpFilePreTransferStatus, FtpFileStatError, FtpReplyError,
    FtpTransferServerError, FtpTransferStartError,
};
use crate::facts::{FtpFileFacts, time_val};
use crate::feature::FtpServerFeature;
use crate::io::LimitedLineReadExt;
use crate::observer::FtpEventObserverList;
use crate::transfer::{FtpFileStructure, FtpTransferMode, FtpTransferType};

mod reply;
pub use reply::FtpReply;

mod command;
pub(crate) use command::FtpCommand;

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
    observers: FtpEventObserverList,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
            observers: FtpEventObserverList::default(),
        }
    }

    #[inline]
    pub(crate) fn observers_mut(&mut self) -> &mut FtpEventObserverList {
        &mut self.observers
    }

    pub(crate) async fn wait_read_ready(&mut self) -> Result<(), FtpReplyError> {
        match self.stream.wait_data_ready().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(FtpReplyError::ConnectionClosed),
            Err(e) => Err(FtpReplyError::ReadFailed(e)),
        }
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_reply().await?;
            return match reply.code() {
                // a "service starting" notice precedes the real greeting
                100..200 => continue,
                220 => Ok(()),
                n => Err(FtpCommandError::UnexpectedReplyCode(
                    FtpCommand::GREETING,
                    n,
                )),
            };
        }
    }

    pub(crate) async fn check_server_feature(
        &mut self,
    ) -> Result<FtpServerFeature, FtpCommandError> {
        let mut feature = FtpServerFeature::default();

        let cmd = FtpCommand::FEAT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("check server feature").await?;
        match reply.code() {
            500 | 501 | 502 => {}
            211 => {
                let lines = reply.lines();
                for line in &lines[1..] {
                    if line.as_bytes().first() != Some(&b' ') {
                        break;
                    }
                    feature.parse_and_set(line.trim());
                }
            }
            n => return Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }

        Ok(feature)
    }

    pub(crate) async fn set_use_utf8(&mut self) -> Result<bool, FtpCommandError> {
        let cmd = FtpCommand::OPTS_UTF8_ON;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("set use utf8").await?;
        match reply.code() {
            500 | 501 | 502 => Ok(false),
            200 => Ok(true),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_username(
        &mut self,
        name: Option<&Username>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        let username = name.map(|u| u.as_original()).unwrap_or("anonymous");
        self.send_cmd1(cmd, username)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send username").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: Option<&Password>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        let password = pass.map(|p| p.as_original()).unwrap_or("xxx");
        self.send_cmd1(cmd, password)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send password").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 => Err(FtpCommandError::CommandNotImplemented(cmd)), // not fatal but unexpected
            230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_account(
        &mut self,
        account: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::ACCT;
        self.send_cmd1(cmd, account)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send account").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send quit").await?;
        match reply.code() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            221 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_noop(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::NOOP;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send noop").await?;
        match reply.code() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn set_file_structure(
        &mut self,
        stru: FtpFileStructure,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::STRU;
        self.send_cmd1(cmd, stru.as_arg())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("set file structure").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn set_transfer_mode(
        &mut self,
        mode: FtpTransferMode,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::MODE;
        self.send_cmd1(cmd, mode.as_arg())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("set transfer mode").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn allocate_space(&mut self, size: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::ALLO;
        self.send_cmd1(cmd, &size.to_string())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("allocate space").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 | 202 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    /// REIN drops the login while keeping the control connection; the
    /// server may answer with a preliminary notice before the fresh 220.
    pub(crate) async fn reinitialize(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REIN;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        loop {
            let reply = self.timed_read_reply("reinitialize").await?;
            return match reply.code() {
                100..200 => continue,
                220 => Ok(()),
                500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
                502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
                n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
            };
        }
    }

    pub(crate) async fn mount_structure(&mut self, path: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::SMNT;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("mount structure").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            202 | 250 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_server_status(
        &mut self,
        path: &str,
    ) -> Result<Vec<String>, FtpCommandError> {
        let cmd = FtpCommand::STAT;
        if path.is_empty() {
            self.send_cmd(cmd)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        } else {
            self.send_cmd1(cmd, path)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        }

        let reply = self.timed_read_reply("request server status").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            211 | 212 | 213 => Ok(reply.lines().to_vec()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_help(
        &mut self,
        topic: &str,
    ) -> Result<Vec<String>, FtpCommandError> {
        let cmd = FtpCommand::HELP;
        if topic.is_empty() {
            self.send_cmd(cmd)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        } else {
            self.send_cmd1(cmd, topic)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        }

        let reply = self.timed_read_reply("request help").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            211 | 214 => Ok(reply.lines().to_vec()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_site_command(&mut self, params: &str) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::SITE;
        self.send_cmd1(cmd, params)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send site command").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 | 202 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_system_type(&mut self) -> Result<String, FtpCommandError> {
        let cmd = FtpCommand::SYST;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request system type").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            215 => match reply.line_trimmed() {
                Some(s) => Ok(s.to_string()),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 215)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_working_dir(&mut self) -> Result<String, FtpCommandError> {
        let cmd = FtpCommand::PWD;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request working dir").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            257 => match reply.parse_257_pathname() {
                Some(path) => Ok(path),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 257)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn change_working_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::CWD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("change working dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            200 | 250 => Ok(()),
            550 => Err(FtpFileStatError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn change_to_parent_dir(&mut self) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::CDUP;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("change to parent dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            200 | 250 => Ok(()),
            550 => Err(FtpFileStatError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn make_dir(&mut self, path: &str) -> Result<String, FtpFileStatError> {
        let cmd = FtpCommand::MKD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("make dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            257 => match reply.parse_257_pathname() {
                Some(path) => Ok(path),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 257).into()),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn delete_file(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::DELE;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("delete file")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            250 => Ok(()),
            450 => Err(FtpFileStatError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn remove_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::RMD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("remove dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            250 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn rename_file(
        &mut self,
        from_path: &str,
        to_path: &str,
    ) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::RNFR;
        self.send_cmd1(cmd, from_path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("rename from")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => return Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => return Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => return Err(FtpCommandError::NotLoggedIn.into()),
            450 | 550 => return Err(FtpFileStatError::FileUnavailable),
            350 => {}
            n => return Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }

        let cmd = FtpCommand::RNTO;
        self.send_cmd1(cmd, to_path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_reply("rename to")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            503 => Err(FtpCommandError::BadCommandSequence(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            532 => Err(FtpFileStatError::FileUnavailable),
            553 => Err(FtpFileStatError::FileUnavailable),
            250 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn request_mlst(
        &mut self,
        path: &str,
    ) -> Result<Option<FtpFileFacts>, FtpCommandError> {
        let cmd = FtpCommand::MLST;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request mlst").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            550 => Ok(None),
            250 => {
                let lines = reply.lines();
                if lines.len() == 3 {
                    if let Ok(ff) = FtpFileFacts::parse_line(lines[1].as_str()) {
                        return Ok(Some(ff));
                    }
                }

                Err(FtpCommandError::InvalidReplySyntax(cmd, 250))
            }
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_size(
        &mut self,
        path: &str,
    ) -> Result<Option<u64>, FtpCommandError> {
        if path.is_empty() {
            return Ok(None);
        }

        let cmd = FtpCommand::SIZE;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request size").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            550 => Ok(None),
            213 => {
                if let Some(s) = reply.line_trimmed() {
                    let size = u64::from_str(s)
                        .map_err(|_| FtpCommandError::InvalidReplySyntax(cmd, 213))?;
                    Ok(Some(size))
                } else {
                    Err(FtpCommandError::InvalidReplySyntax(cmd, 213))
                }
            }
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_mtime(
        &mut self,
        path: &str,
    ) -> Result<Option<DateTime<Utc>>, FtpCommandError> {
        let cmd = FtpCommand::MDTM;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request mtime").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            550 => Ok(None),
            213 => {
                if let Some(s) = reply.line_trimmed() {
                    let mtime = time_val::parse_from_str(s)
                        .map_err(|_| FtpCommandError::InvalidReplySyntax(cmd, 213))?;
                    Ok(Some(mtime))
                } else {
                    Err(FtpCommandError::InvalidReplySyntax(cmd, 213))
                }
            }
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_pasv_port(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request pasv port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            227 => match reply.parse_pasv_227_reply() {
                Some(addr) => Ok(addr),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_epsv_port(&mut self) -> Result<u16, FtpCommandError> {
        let cmd = FtpCommand::EPSV;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request epsv port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            522 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            229 => match reply.parse_epsv_229_reply() {
                Some(port) => Ok(port),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 229)),
            },
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_active_port(
        &mut self,
        addr: SocketAddrV4,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PORT;
        let o = addr.ip().octets();
        let arg = format!(
            "{},{},{},{},{},{}",
            o[0],
            o[1],
            o[2],
            o[3],
            addr.port() >> 8,
            addr.port() & 0xFF
        );
        self.send_cmd1(cmd, &arg)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send active port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_extended_active_port(
        &mut self,
        addr: SocketAddr,
    ) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::EPRT;
        let proto = if addr.is_ipv4() { 1 } else { 2 };
        let arg = format!("|{}|{}|{}|", proto, addr.ip(), addr.port());
        self.send_cmd1(cmd, &arg)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("send extended active port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            522 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn abort_transfer(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::ABOR;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("abort transfer").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            225 | 226 => Ok(()),
            426 => {
                let reply = self.timed_read_reply("wait abort transfer").await?;
                match reply.code() {
                    226 => Ok(()),
                    n => {
                        // use 1xxx to represent the second one of reply code
                        Err(FtpCommandError::UnexpectedReplyCode(cmd, 1000 + n))
                    }
                }
            }
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Image => FtpCommand::TYPE_I,
        };
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request transfer type").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_restart(&mut self, position: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REST;
        self.send_cmd1(cmd, &position.to_string())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_reply("request restart").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            350 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    async fn wait_pre_transfer_reply(
        &mut self,
        cmd: FtpCommand,
    ) -> Result<FtpFilePreTransferStatus, FtpCommandError> {
        let reply = self.timed_read_reply("wait pre transfer reply").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(FtpCommand::PRET)),
            502 => Err(FtpCommandError::CommandNotImplemented(FtpCommand::PRET)),
            530 => Err(FtpCommandError::NotLoggedIn),
            550 => Ok(FtpFilePreTransferStatus::Invalid),
            200 => Ok(FtpFilePreTransferStatus::Proceed),
            n => Err(FtpCommandError::PreTransferFailed(cmd, n)),
        }
    }

    pub(crate) async fn pre_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<FtpFilePreTransferStatus, FtpCommandError> {
        self.send_pre_transfer_cmd(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;
        self.wait_pre_transfer_reply(cmd).await
    }

    /// Send RETR/LIST/NLST and wait for the preliminary reply.
    pub(crate) async fn start_retrieve_like(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<(), FtpTransferStartError> {
        if path.is_empty() {
            self.send_cmd(cmd)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        } else {
            self.send_cmd1(cmd, path)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        }

        let reply = self
            .timed_read_reply("start retrieve")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpTransferStartError::FileUnavailable),
            125 | 150 => Ok(()),
            450 => Err(FtpTransferStartError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Send STOR/STOU/APPE and wait for the preliminary reply.
    pub(crate) async fn start_store_like(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<(), FtpTransferStartError> {
        if path.is_empty() {
            self.send_cmd(cmd)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        } else {
            self.send_cmd1(cmd, path)
                .await
                .map_err(FtpCommandError::SendFailed)?;
        }

        let reply = self
            .timed_read_reply("start store")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            532 => Err(FtpTransferStartError::NeedAccountForStoring),
            553 => Err(FtpTransferStartError::FileNameNotAllowed),
            125 | 150 => Ok(()),
            450 => Err(FtpTransferStartError::FileUnavailable),
            452 => Err(FtpTransferStartError::InsufficientStorageSpace),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Wait for the completion reply of an ongoing data transfer. The caller
    /// wraps this in its own end-of-transfer timeout.
    pub(crate) async fn wait_transfer_end(
        &mut self,
        cmd: FtpCommand,
    ) -> Result<(), FtpTransferServerError> {
        let reply = self.read_reply().await?;
        match reply.code() {
            110 => Err(FtpTransferServerError::RestartNeeded),
            226 | 250 => Ok(()),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            551 => Err(FtpTransferServerError::PageTypeUnknown),
            552 => Err(FtpTransferServerError::ExceededStorageAllocation),
            n => Err(FtpTransferServerError::UnexpectedEndReplyCode(cmd, n)),
        }
    }

    /// Exchange an arbitrary command line for its full reply. Used for
    /// verbs without a typed method, such as SITE and STAT.
    pub(crate) async fn exchange_raw(&mut self, line: &str) -> Result<FtpReply, FtpCommandError> {
        let verb_len = memchr::memchr(b' ', line.as_bytes()).unwrap_or(line.len());
        let mut buf = String::with_capacity(line.len() + 2);
        buf.push_str(line);
        buf.push_str("\r\n");
        self.send_all_raw(&line[..verb_len], &buf)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        self.timed_read_reply("exchange raw")
            .await
            .map_err(FtpCommandError::RecvFailed)
    }
}
