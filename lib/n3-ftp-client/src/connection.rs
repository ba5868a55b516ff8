/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::error::Error;
use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::net::{Host, UpstreamAddr};

/// Supplier of the sockets used by a client session.
///
/// The data connection methods come in two flavors: `new_data_connection`
/// for passive mode, and the listener methods for active mode, where the
/// server connects back to us. A provider serves one session at a time and
/// holds at most one pending data listener.
#[async_trait]
pub trait FtpConnectionProvider<T: AsyncRead + AsyncWrite, E: Error, UD> {
    async fn new_control_connection(
        &mut self,
        upstream: &UpstreamAddr,
        user_data: &UD,
    ) -> Result<T, E>;

    async fn new_data_connection(
        &mut self,
        server_addr: &UpstreamAddr,
        user_data: &UD,
    ) -> Result<T, E>;

    /// Open a listening socket for an active mode transfer and return the
    /// address the server should be told to connect to.
    async fn new_data_listener(&mut self, user_data: &UD) -> Result<SocketAddr, E>;

    /// Accept exactly one connection on the pending listener.
    async fn accept_data_connection(&mut self, user_data: &UD) -> Result<(T, SocketAddr), E>;

    /// Drop the pending listener, if any. Called both after a successful
    /// accept and on any setup failure.
    fn close_data_listener(&mut self);

    /// Peer address of the control connection, once established. Used to
    /// verify the source of inbound data connections.
    fn control_peer_addr(&self) -> Option<SocketAddr>;
}

/// Plain TCP provider, with an optional local bind IP.
#[derive(Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    control_local_addr: Option<SocketAddr>,
    control_peer_addr: Option<SocketAddr>,
    data_listener: Option<TcpListener>,
}

impl TcpConnectionProvider {
    pub fn new(bind_ip: Option<IpAddr>) -> Self {
        TcpConnectionProvider {
            bind_ip,
            ..Default::default()
        }
    }

    async fn resolve(&self, upstream: &UpstreamAddr) -> io::Result<SocketAddr> {
        match upstream.host() {
            Host::Ip(ip) => Ok(SocketAddr::new(*ip, upstream.port())),
            Host::Domain(domain) => {
                tokio::net::lookup_host((domain.as_str(), upstream.port()))
                    .await?
                    .next()
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, "no usable resolved address")
                    })
            }
        }
    }

    async fn connect_to(&self, peer: SocketAddr) -> io::Result<TcpStream> {
        match self.bind_ip {
            Some(ip) if ip.is_ipv4() == peer.is_ipv4() => {
                let socket = if peer.is_ipv4() {
                    TcpSocket::new_v4()?
                } else {
                    TcpSocket::new_v6()?
                };
                socket.bind(SocketAddr::new(ip, 0))?;
                socket.connect(peer).await
            }
            _ => TcpStream::connect(peer).await,
        }
    }
}

#[async_trait]
impl FtpConnectionProvider<TcpStream, io::Error, ()> for TcpConnectionProvider {
    async fn new_control_connection(
        &mut self,
        upstream: &UpstreamAddr,
        _user_data: &(),
    ) -> Result<TcpStream, io::Error> {
        let peer = self.resolve(upstream).await?;
        let stream = self.connect_to(peer).await?;
        self.control_local_addr = Some(stream.local_addr()?);
        self.control_peer_addr = Some(stream.peer_addr()?);
        Ok(stream)
    }

    async fn new_data_connection(
        &mut self,
        server_addr: &UpstreamAddr,
        _user_data: &(),
    ) -> Result<TcpStream, io::Error> {
        let peer = self.resolve(server_addr).await?;
        self.connect_to(peer).await
    }

    async fn new_data_listener(&mut self, _user_data: &()) -> Result<SocketAddr, io::Error> {
        let ip = self
            .bind_ip
            .or(self.control_local_addr.map(|addr| addr.ip()))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "control connection not set")
            })?;
        let listener = TcpListener::bind(SocketAddr::new(ip, 0)).await?;
        let addr = listener.local_addr()?;
        self.data_listener = Some(listener);
        Ok(addr)
    }

    async fn accept_data_connection(
        &mut self,
        _user_data: &(),
    ) -> Result<(TcpStream, SocketAddr), io::Error> {
        let listener = self.data_listener.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "no pending data listener")
        })?;
        listener.accept().await
    }

    fn close_data_listener(&mut self) {
        self.data_listener = None;
    }

    fn control_peer_addr(&self) -> Option<SocketAddr> {
        self.control_peer_addr
    }
}
