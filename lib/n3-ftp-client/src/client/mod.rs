/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::auth::{Password, Username};
use crate::config::FtpClientConfig;
use crate::connection::FtpConnectionProvider;
use crate::control::{FtpCommand, FtpControlChannel, FtpReply};
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpConnectError, FtpDirectoryListError, FtpFileCopyError,
    FtpFileListError, FtpFilePreTransferStatus, FtpFileRetrieveError, FtpFileStatError,
    FtpFileStoreError, FtpReplyError, FtpSessionOpenError, FtpTransferSetupError,
    FtpTransferStartError,
};
use crate::facts::FtpFileFacts;
use crate::feature::FtpServerFeature;
use crate::listing::{FtpDirectoryListing, FtpListingCollector};
use crate::net::UpstreamAddr;
use crate::observer::FtpEventObserver;
use crate::transfer::{
    FtpDataConnectionMode, FtpFileStructure, FtpLineDataReceiver, FtpLineDataTransfer,
    FtpTransferMode, FtpTransferType, NetasciiReader, NetasciiWriter,
};

/// One FTP session over one control connection.
///
/// At most one data connection is live at a time. A transfer started via
/// one of the `*_start` methods is not finished until the matching
/// `wait_*_end` call has consumed the completion reply; starting another
/// transfer before that is a protocol violation the server answers to
/// unpredictably.
pub struct FtpClient<CP, S, E, UD>
where
    S: AsyncRead + AsyncWrite,
    CP: FtpConnectionProvider<S, E, UD>,
    E: std::error::Error,
{
    config: Arc<FtpClientConfig>,
    connection_provider: CP,
    control: FtpControlChannel<S>,
    upstream: UpstreamAddr,
    server_feature: FtpServerFeature,
    transfer_type: FtpTransferType,
    wire_transfer_type: Option<FtpTransferType>,
    data_mode: FtpDataConnectionMode,
    remote_passive_addr: Option<UpstreamAddr>,
    restart_offset: Option<u64>,
    epsv_rejected: bool,
    last_transfer_cmd: FtpCommand,
    _phantom: PhantomData<(E, UD)>,
}

impl<CP, S, E, UD> FtpClient<CP, S, E, UD>
where
    S: AsyncRead + AsyncWrite + Unpin,
    CP: FtpConnectionProvider<S, E, UD>,
    E: std::error::Error,
{
    /// Open the control connection and consume the greeting. On failure
    /// the connection provider is handed back for reuse.
    pub async fn connect_to(
        upstream: UpstreamAddr,
        mut connection_provider: CP,
        user_data: &UD,
        config: &Arc<FtpClientConfig>,
    ) -> Result<Self, (FtpConnectError<E>, CP)> {
        let r = tokio::time::timeout(
            config.connect_timeout,
            connection_provider.new_control_connection(&upstream, user_data),
        )
        .await;
        let stream = match r {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err((FtpConnectError::ConnectIoError(e), connection_provider)),
            Err(_) => return Err((FtpConnectError::ConnectTimedOut, connection_provider)),
        };

        let mut control = FtpControlChannel::new(stream, config.control.clone());
        match tokio::time::timeout(config.greeting_timeout, control.wait_greetings()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let e = match e {
                    FtpCommandError::ServiceNotAvailable => FtpConnectError::ServiceNotAvailable,
                    FtpCommandError::UnexpectedReplyCode(_, code) => {
                        FtpConnectError::InvalidReplyCode(code)
                    }
                    e => FtpConnectError::GreetingFailed(e),
                };
                return Err((e, connection_provider));
            }
            Err(_) => return Err((FtpConnectError::GreetingTimedOut, connection_provider)),
        }

        Ok(FtpClient {
            config: Arc::clone(config),
            connection_provider,
            control,
            upstream,
            server_feature: FtpServerFeature::default(),
            transfer_type: FtpTransferType::default(),
            wire_transfer_type: None,
            data_mode: FtpDataConnectionMode::default(),
            remote_passive_addr: None,
            restart_offset: None,
            epsv_rejected: false,
            last_transfer_cmd: FtpCommand::GREETING,
            _phantom: PhantomData,
        })
    }

    /// Register a protocol tracing hook. Observers are invoked in
    /// registration order.
    pub fn add_observer(&mut self, observer: Box<dyn FtpEventObserver + Send>) {
        self.control.observers_mut().push(observer);
    }

    /// Log in and probe server features. Anonymous login if no username
    /// is given.
    pub async fn new_user_session(
        &mut self,
        username: Option<&Username>,
        password: Option<&Password>,
    ) -> Result<(), FtpSessionOpenError> {
        match self.control.send_username(username).await? {
            FtpAuthStatus::LoggedIn => {}
            FtpAuthStatus::NotLoggedIn => return Err(FtpSessionOpenError::NotLoggedIn),
            FtpAuthStatus::NeedAccount => return Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NeedPassword => match self.control.send_password(password).await? {
                FtpAuthStatus::LoggedIn => {}
                FtpAuthStatus::NeedAccount => return Err(FtpSessionOpenError::AccountIsNeeded),
                _ => return Err(FtpSessionOpenError::NotLoggedIn),
            },
        }
        self.post_login().await
    }

    /// `new_user_session` with a boolean outcome: `Ok(false)` when the
    /// server simply refused the credentials, `Err` only for channel or
    /// protocol failures.
    pub async fn login(
        &mut self,
        username: Option<&Username>,
        password: Option<&Password>,
    ) -> Result<bool, FtpSessionOpenError> {
        match self.new_user_session(username, password).await {
            Ok(()) => Ok(true),
            Err(FtpSessionOpenError::NotLoggedIn | FtpSessionOpenError::AccountIsNeeded) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Supply the ACCT value after `new_user_session` failed with
    /// `AccountIsNeeded`.
    pub async fn continue_account_session(
        &mut self,
        account: &str,
    ) -> Result<(), FtpSessionOpenError> {
        match self.control.send_account(account).await? {
            FtpAuthStatus::LoggedIn => self.post_login().await,
            _ => Err(FtpSessionOpenError::NotLoggedIn),
        }
    }

    async fn post_login(&mut self) -> Result<(), FtpSessionOpenError> {
        self.server_feature = self.control.check_server_feature().await?;
        if self.server_feature.support_utf8() {
            self.control.set_use_utf8().await?;
        }
        Ok(())
    }

    pub async fn quit_and_close(mut self) -> Result<(), FtpCommandError> {
        self.control.send_quit().await
    }

    /// Block until the control channel has readable data, without
    /// consuming it. A liveness probe between transfers.
    pub async fn wait_control_read_ready(&mut self) -> Result<(), FtpReplyError> {
        self.control.wait_read_ready().await
    }

    /// Exchange one arbitrary command line, for verbs with no typed
    /// method.
    pub async fn send_raw_command(&mut self, line: &str) -> Result<FtpReply, FtpCommandError> {
        self.control.exchange_raw(line).await
    }

    #[inline]
    pub fn set_transfer_type(&mut self, t: FtpTransferType) {
        self.transfer_type = t;
    }

    /// Set the restart offset for the next transfer only; it is consumed
    /// (and cleared) by that transfer's setup.
    #[inline]
    pub fn set_restart_offset(&mut self, offset: u64) {
        self.restart_offset = Some(offset);
    }

    #[inline]
    pub fn clear_restart_offset(&mut self) {
        self.restart_offset = None;
    }

    #[inline]
    pub fn data_connection_mode(&self) -> FtpDataConnectionMode {
        self.data_mode
    }

    pub fn enter_local_active_mode(&mut self) {
        self.data_mode = FtpDataConnectionMode::ActiveLocal;
        self.remote_passive_addr = None;
    }

    pub fn enter_local_passive_mode(&mut self) {
        self.data_mode = FtpDataConnectionMode::PassiveLocal;
        // the passive target is renegotiated immediately before every data
        // socket open, servers only guarantee the listener for a window
        self.remote_passive_addr = None;
    }

    /// Server-to-server setup: point this server at another server's
    /// listener. Performs the PORT/EPRT round-trip now.
    pub async fn enter_remote_active_mode(
        &mut self,
        target: SocketAddr,
    ) -> Result<(), FtpCommandError> {
        match target {
            SocketAddr::V4(v4) => self.control.send_active_port(v4).await?,
            SocketAddr::V6(_) => self.control.send_extended_active_port(target).await?,
        }
        self.data_mode = FtpDataConnectionMode::ActiveRemote(target);
        self.remote_passive_addr = None;
        Ok(())
    }

    /// Server-to-server setup: put this server in passive mode and return
    /// the listener address its peer should be pointed at.
    pub async fn enter_remote_passive_mode(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let addr = self.control.request_pasv_port().await?;
        self.data_mode = FtpDataConnectionMode::PassiveRemote;
        self.remote_passive_addr = Some(UpstreamAddr::from(addr));
        Ok(addr)
    }

    /// The listener address cached by the last `enter_remote_passive_mode`
    /// call, if still valid.
    #[inline]
    pub fn remote_passive_addr(&self) -> Option<&UpstreamAddr> {
        self.remote_passive_addr.as_ref()
    }

    async fn ensure_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        if self.wire_transfer_type != Some(t) {
            self.control.request_transfer_type(t).await?;
            self.wire_transfer_type = Some(t);
        }
        Ok(())
    }

    async fn send_restart_if_needed(&mut self) -> Result<(), FtpTransferSetupError<E>> {
        if let Some(offset) = self.restart_offset.take() {
            match self.control.request_restart(offset).await {
                Ok(()) => Ok(()),
                Err(FtpCommandError::UnexpectedReplyCode(_, code)) => {
                    Err(FtpTransferSetupError::RestartNotAccepted(code))
                }
                Err(e) => Err(e.into()),
            }
        } else {
            Ok(())
        }
    }

    async fn start_transfer_cmd(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        store: bool,
    ) -> Result<(), FtpTransferStartError> {
        self.last_transfer_cmd = cmd;
        if store {
            self.control.start_store_like(cmd, path).await
        } else {
            self.control.start_retrieve_like(cmd, path).await
        }
    }

    fn verify_data_peer(&self, actual: SocketAddr) -> Result<(), FtpTransferSetupError<E>> {
        if !self.config.transfer.verify_data_peer {
            return Ok(());
        }
        let Some(control_peer) = self.connection_provider.control_peer_addr() else {
            return Ok(());
        };
        if actual.ip() != control_peer.ip() {
            return Err(FtpTransferSetupError::DataPeerMismatch {
                expected: control_peer.ip(),
                actual: actual.ip(),
            });
        }
        Ok(())
    }

    async fn request_passive_target(
        &mut self,
    ) -> Result<UpstreamAddr, FtpTransferSetupError<E>> {
        if (self.config.always_try_epsv || self.server_feature.support_epsv())
            && !self.epsv_rejected
        {
            match self.control.request_epsv_port().await {
                Ok(port) => {
                    let mut addr = self.upstream.clone();
                    addr.set_port(port);
                    return Ok(addr);
                }
                Err(
                    FtpCommandError::CommandNotImplemented(_)
                    | FtpCommandError::RejectedCommandSyntax(_),
                ) => {
                    // remember and fall back to PASV for this session
                    self.epsv_rejected = true;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let addr = self.control.request_pasv_port().await?;
        // a redirect to a host other than the control peer is treated as
        // hostile unless verification is disabled
        self.verify_data_peer(addr)?;
        Ok(UpstreamAddr::from(addr))
    }

    async fn open_passive_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
        store: bool,
    ) -> Result<S, FtpTransferSetupError<E>> {
        if self.server_feature.support_pret() {
            match self.control.pre_transfer(cmd, path).await? {
                FtpFilePreTransferStatus::Proceed => {}
                FtpFilePreTransferStatus::Invalid => {
                    return Err(FtpTransferSetupError::PreTransferRejected);
                }
            }
        }

        let target = self.request_passive_target().await?;
        let stream = match tokio::time::timeout(
            self.config.transfer.data_connect_timeout,
            self.connection_provider
                .new_data_connection(&target, user_data),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FtpTransferSetupError::DataConnectFailed(e)),
            Err(_) => return Err(FtpTransferSetupError::DataConnectTimedOut),
        };

        self.send_restart_if_needed().await?;
        self.start_transfer_cmd(cmd, path, store).await?;
        Ok(stream)
    }

    async fn open_active_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
        store: bool,
    ) -> Result<S, FtpTransferSetupError<E>> {
        let listen_addr = self
            .connection_provider
            .new_data_listener(user_data)
            .await
            .map_err(FtpTransferSetupError::DataListenFailed)?;

        let r = self
            .drive_active_transfer(cmd, path, user_data, store, listen_addr)
            .await;
        if r.is_err() {
            self.connection_provider.close_data_listener();
        }
        r
    }

    async fn drive_active_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
        store: bool,
        listen_addr: SocketAddr,
    ) -> Result<S, FtpTransferSetupError<E>> {
        match listen_addr {
            SocketAddr::V4(v4) => self.control.send_active_port(v4).await?,
            SocketAddr::V6(_) => self.control.send_extended_active_port(listen_addr).await?,
        }

        self.send_restart_if_needed().await?;
        self.start_transfer_cmd(cmd, path, store).await?;

        // the server connects back only after the preliminary reply
        let (stream, peer) = match tokio::time::timeout(
            self.config.transfer.data_accept_timeout,
            self.connection_provider.accept_data_connection(user_data),
        )
        .await
        {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => return Err(FtpTransferSetupError::DataAcceptFailed(e)),
            Err(_) => return Err(FtpTransferSetupError::DataAcceptTimedOut),
        };
        self.connection_provider.close_data_listener();

        if let Err(e) = self.verify_data_peer(peer) {
            drop(stream);
            return Err(e);
        }
        Ok(stream)
    }

    /// Negotiate and open the data connection for one transfer, then send
    /// the transfer command and consume its preliminary reply. Returns
    /// `None` in the server-to-server modes, where no local data socket
    /// exists and both legs are driven separately.
    async fn open_data_transfer(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
        store: bool,
    ) -> Result<Option<S>, FtpTransferSetupError<E>> {
        match self.data_mode {
            FtpDataConnectionMode::PassiveLocal => self
                .open_passive_transfer(cmd, path, user_data, store)
                .await
                .map(Some),
            FtpDataConnectionMode::ActiveLocal => self
                .open_active_transfer(cmd, path, user_data, store)
                .await
                .map(Some),
            FtpDataConnectionMode::ActiveRemote(_) | FtpDataConnectionMode::PassiveRemote => {
                self.start_transfer_cmd(cmd, path, store).await?;
                Ok(None)
            }
        }
    }

    async fn wait_transfer_end_timed(&mut self) -> Result<(), FtpFileListError> {
        let cmd = self.last_transfer_cmd;
        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.wait_transfer_end(cmd),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FtpFileListError::ServerReportedError(e)),
            Err(_) => Err(FtpFileListError::TimeoutToWaitEndReply),
        }
    }

    /// Start a LIST transfer and hand back the open data stream. The
    /// caller must read it to EOF, drop it, and then call
    /// [`list_directory_detailed_receive`](Self::list_directory_detailed_receive)
    /// or [`wait_retrieve_end`](Self::wait_retrieve_end).
    pub async fn list_directory_detailed_start(
        &mut self,
        path: &str,
        user_data: &UD,
    ) -> Result<S, FtpDirectoryListError<E>> {
        self.start_listing(FtpCommand::LIST, path, user_data).await
    }

    /// NLST variant: names only, one per line.
    pub async fn list_directory_simple_start(
        &mut self,
        path: &str,
        user_data: &UD,
    ) -> Result<S, FtpDirectoryListError<E>> {
        self.start_listing(FtpCommand::NLST, path, user_data).await
    }

    async fn start_listing(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
    ) -> Result<S, FtpDirectoryListError<E>> {
        self.ensure_transfer_type(FtpTransferType::Ascii)
            .await
            .map_err(|e| FtpDirectoryListError::SetupFailed(e.into()))?;
        match self.open_data_transfer(cmd, path, user_data, false).await? {
            Some(stream) => Ok(stream),
            None => Err(FtpDirectoryListError::RemoteModeNotSupported),
        }
    }

    /// Drain a started listing transfer into `receiver` line by line,
    /// close the data stream, and consume the completion reply.
    pub async fn list_directory_detailed_receive<R>(
        &mut self,
        data_stream: S,
        receiver: &mut R,
    ) -> Result<(), FtpFileListError>
    where
        R: FtpLineDataReceiver + Send,
    {
        let transfer = FtpLineDataTransfer::new(data_stream, &self.config.transfer);
        match tokio::time::timeout(
            self.config.transfer.list_all_timeout,
            transfer.read_to_end(receiver),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(FtpFileListError::TimeoutToWaitAllData),
        }
        // data stream is dropped at this point, the server may now send
        // its completion reply
        self.wait_transfer_end_timed().await
    }

    /// One-shot LIST: fetch the whole raw listing of `path`.
    pub async fn fetch_directory_listing(
        &mut self,
        path: &str,
        user_data: &UD,
    ) -> Result<FtpDirectoryListing, FtpDirectoryListError<E>> {
        let stream = self.list_directory_detailed_start(path, user_data).await?;
        let mut collector = FtpListingCollector::default();
        self.list_directory_detailed_receive(stream, &mut collector)
            .await?;
        Ok(FtpDirectoryListing::new(collector.into_lines()))
    }

    /// Start a RETR transfer. The returned stream carries the raw bytes;
    /// wrap it in [`NetasciiReader`] if an ASCII transfer was negotiated.
    pub async fn retrieve_file_start(
        &mut self,
        path: &str,
        user_data: &UD,
    ) -> Result<Option<S>, FtpTransferSetupError<E>> {
        self.ensure_transfer_type(self.transfer_type).await?;
        self.open_data_transfer(FtpCommand::RETR, path, user_data, false)
            .await
    }

    /// Consume the completion reply of a retrieve-direction transfer
    /// (RETR, or a caller-driven LIST/NLST stream) once its data stream
    /// has been closed.
    pub async fn wait_retrieve_end(&mut self) -> Result<(), FtpFileRetrieveError> {
        let cmd = self.last_transfer_cmd;
        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.wait_transfer_end(cmd),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(FtpFileRetrieveError::TimeoutToWaitEndReply),
        }
    }

    /// Consume the completion reply of a store-direction transfer (STOR,
    /// STOU, APPE) once its data stream has been shut down.
    pub async fn wait_store_end(&mut self) -> Result<(), FtpFileStoreError> {
        let cmd = self.last_transfer_cmd;
        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.wait_transfer_end(cmd),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(FtpFileStoreError::TimeoutToWaitEndReply),
        }
    }

    /// One-shot RETR into `output`. Returns the local byte count, which
    /// for ASCII transfers differs from the wire count.
    pub async fn retrieve_file<W>(
        &mut self,
        path: &str,
        user_data: &UD,
        output: &mut W,
    ) -> Result<u64, FtpFileCopyError<E>>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(stream) = self.retrieve_file_start(path, user_data).await? else {
            return Err(FtpFileCopyError::RemoteModeNotSupported);
        };

        let copied = match self.transfer_type {
            FtpTransferType::Ascii => {
                let mut reader = NetasciiReader::new(stream);
                tokio::io::copy(&mut reader, output).await
            }
            FtpTransferType::Image => {
                let mut stream = stream;
                tokio::io::copy(&mut stream, output).await
            }
        }
        .map_err(FtpFileCopyError::DataCopyFailed)?;

        self.wait_copy_end().await?;
        Ok(copied)
    }

    async fn store_file_with(
        &mut self,
        cmd: FtpCommand,
        path: &str,
        user_data: &UD,
        input: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, FtpFileCopyError<E>> {
        self.ensure_transfer_type(self.transfer_type)
            .await
            .map_err(FtpTransferSetupError::from)?;
        let Some(stream) = self.open_data_transfer(cmd, path, user_data, true).await? else {
            return Err(FtpFileCopyError::RemoteModeNotSupported);
        };

        let copied = match self.transfer_type {
            FtpTransferType::Ascii => {
                let mut writer = NetasciiWriter::new(stream);
                let n = tokio::io::copy(input, &mut writer)
                    .await
                    .map_err(FtpFileCopyError::DataCopyFailed)?;
                writer
                    .shutdown()
                    .await
                    .map_err(FtpFileCopyError::DataCopyFailed)?;
                n
            }
            FtpTransferType::Image => {
                let mut stream = stream;
                let n = tokio::io::copy(input, &mut stream)
                    .await
                    .map_err(FtpFileCopyError::DataCopyFailed)?;
                stream
                    .shutdown()
                    .await
                    .map_err(FtpFileCopyError::DataCopyFailed)?;
                n
            }
        };

        self.wait_copy_end().await?;
        Ok(copied)
    }

    async fn wait_copy_end(&mut self) -> Result<(), FtpFileCopyError<E>> {
        let cmd = self.last_transfer_cmd;
        match tokio::time::timeout(
            self.config.transfer.end_wait_timeout,
            self.control.wait_transfer_end(cmd),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FtpFileCopyError::ServerReportedError(e)),
            Err(_) => Err(FtpFileCopyError::TimeoutToWaitEndReply),
        }
    }

    /// One-shot STOR of `input` to `path`.
    pub async fn store_file<R>(
        &mut self,
        path: &str,
        user_data: &UD,
        input: &mut R,
    ) -> Result<u64, FtpFileCopyError<E>>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.store_file_with(FtpCommand::STOR, path, user_data, input)
            .await
    }

    /// STOU: let the server pick a unique name.
    pub async fn store_unique_file<R>(
        &mut self,
        user_data: &UD,
        input: &mut R,
    ) -> Result<u64, FtpFileCopyError<E>>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.store_file_with(FtpCommand::STOU, "", user_data, input)
            .await
    }

    /// APPE: append to (or create) `path`.
    pub async fn append_file<R>(
        &mut self,
        path: &str,
        user_data: &UD,
        input: &mut R,
    ) -> Result<u64, FtpFileCopyError<E>>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.store_file_with(FtpCommand::APPE, path, user_data, input)
            .await
    }

    /// Send ABOR. Callers use this after tearing down a data stream they
    /// no longer want to drain; it is never issued automatically.
    pub async fn abort_transfer(&mut self) -> Result<(), FtpCommandError> {
        self.control.abort_transfer().await
    }

    /// Per-file facts via MLST, falling back to SIZE/MDTM on servers
    /// without MLST support. `None` if the server knows nothing about the
    /// path.
    pub async fn fetch_file_facts(
        &mut self,
        path: &str,
    ) -> Result<Option<FtpFileFacts>, FtpFileStatError> {
        if self.server_feature.support_mlst() {
            return Ok(self.control.request_mlst(path).await?);
        }
        if !self.server_feature.support_size() && !self.server_feature.support_mdtm() {
            return Err(FtpFileStatError::FeatUnavailable);
        }

        let mut facts = FtpFileFacts::new(path);
        let mut found = false;
        if self.server_feature.support_size() {
            if let Some(size) = self.control.request_size(path).await? {
                facts.set_size(size);
                found = true;
            }
        }
        if self.server_feature.support_mdtm() {
            if let Some(mtime) = self.control.request_mtime(path).await? {
                facts.set_mtime(mtime);
                found = true;
            }
        }
        if found { Ok(Some(facts)) } else { Ok(None) }
    }

    pub async fn request_file_size(&mut self, path: &str) -> Result<Option<u64>, FtpFileStatError> {
        Ok(self.control.request_size(path).await?)
    }

    pub async fn request_file_mtime(
        &mut self,
        path: &str,
    ) -> Result<Option<DateTime<Utc>>, FtpFileStatError> {
        Ok(self.control.request_mtime(path).await?)
    }

    pub async fn delete_file(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        self.control.delete_file(path).await
    }

    pub async fn remove_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        self.control.remove_dir(path).await
    }

    /// MKD. Returns the created pathname as reported by the server.
    pub async fn make_dir(&mut self, path: &str) -> Result<String, FtpFileStatError> {
        self.control.make_dir(path).await
    }

    pub async fn rename_file(
        &mut self,
        from_path: &str,
        to_path: &str,
    ) -> Result<(), FtpFileStatError> {
        self.control.rename_file(from_path, to_path).await
    }

    pub async fn change_working_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        self.control.change_working_dir(path).await
    }

    pub async fn change_to_parent_dir(&mut self) -> Result<(), FtpFileStatError> {
        self.control.change_to_parent_dir().await
    }

    pub async fn request_working_dir(&mut self) -> Result<String, FtpCommandError> {
        self.control.request_working_dir().await
    }

    pub async fn request_system_type(&mut self) -> Result<String, FtpCommandError> {
        self.control.request_system_type().await
    }

    pub async fn send_noop(&mut self) -> Result<(), FtpCommandError> {
        self.control.send_noop().await
    }

    pub async fn set_file_structure(
        &mut self,
        stru: FtpFileStructure,
    ) -> Result<(), FtpCommandError> {
        self.control.set_file_structure(stru).await
    }

    pub async fn set_transfer_mode(
        &mut self,
        mode: FtpTransferMode,
    ) -> Result<(), FtpCommandError> {
        self.control.set_transfer_mode(mode).await
    }

    /// ALLO. Many servers treat this as a no-op and answer 202.
    pub async fn allocate_space(&mut self, size: u64) -> Result<(), FtpCommandError> {
        self.control.allocate_space(size).await
    }

    /// REIN. Drops the login but keeps the control connection open, so
    /// all per-session state learned since the greeting is forgotten.
    pub async fn reinitialize(&mut self) -> Result<(), FtpCommandError> {
        self.control.reinitialize().await?;
        self.server_feature = FtpServerFeature::default();
        self.wire_transfer_type = None;
        self.epsv_rejected = false;
        self.restart_offset = None;
        self.remote_passive_addr = None;
        Ok(())
    }

    pub async fn mount_structure(&mut self, path: &str) -> Result<(), FtpCommandError> {
        self.control.mount_structure(path).await
    }

    /// STAT. With an empty path this reports server status; with a path
    /// it returns a listing-like status over the control channel.
    pub async fn request_server_status(
        &mut self,
        path: &str,
    ) -> Result<Vec<String>, FtpCommandError> {
        self.control.request_server_status(path).await
    }

    pub async fn request_help(&mut self, topic: &str) -> Result<Vec<String>, FtpCommandError> {
        self.control.request_help(topic).await
    }

    pub async fn send_site_command(&mut self, params: &str) -> Result<(), FtpCommandError> {
        self.control.send_site_command(params).await
    }
}
