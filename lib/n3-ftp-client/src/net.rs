/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum UpstreamAddrParseError {
    #[error("empty string")]
    EmptyString,
    #[error("invalid host")]
    InvalidHost,
    #[error("invalid port")]
    InvalidPort,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Host {
    Ip(IpAddr),
    Domain(String),
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(ip) => write!(f, "{ip}"),
            Host::Domain(domain) => write!(f, "{domain}"),
        }
    }
}

impl FromStr for Host {
    type Err = UpstreamAddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UpstreamAddrParseError::EmptyString);
        }
        if s.as_bytes()[0] == b'[' {
            let pos_last = s.len() - 1;
            if s.as_bytes()[pos_last] != b']' {
                return Err(UpstreamAddrParseError::InvalidHost);
            }
            let ip6 = Ipv6Addr::from_str(&s[1..pos_last])
                .map_err(|_| UpstreamAddrParseError::InvalidHost)?;
            return Ok(Host::Ip(IpAddr::V6(ip6)));
        }
        if let Ok(ip) = IpAddr::from_str(s) {
            return Ok(Host::Ip(ip));
        }
        Ok(Host::Domain(s.to_string()))
    }
}

/// Address of an FTP server, either for the control connection or as
/// advertised by a passive mode reply.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn host_str(&self) -> String {
        self.host.to_string()
    }
}

impl From<SocketAddr> for UpstreamAddr {
    fn from(addr: SocketAddr) -> Self {
        UpstreamAddr {
            host: Host::Ip(addr.ip()),
            port: addr.port(),
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]:{}", self.port),
            host => write!(f, "{host}:{}", self.port),
        }
    }
}

impl FromStr for UpstreamAddr {
    type Err = UpstreamAddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(UpstreamAddrParseError::EmptyString);
        }

        if s.as_bytes()[0] == b'[' {
            // "[v6]" or "[v6]:port"
            return match s.rfind(']') {
                Some(pos_last) => {
                    let host = Host::from_str(&s[0..=pos_last])?;
                    let port = match s[pos_last + 1..].strip_prefix(':') {
                        Some(p) => {
                            u16::from_str(p).map_err(|_| UpstreamAddrParseError::InvalidPort)?
                        }
                        None if s.len() == pos_last + 1 => 0,
                        None => return Err(UpstreamAddrParseError::InvalidPort),
                    };
                    Ok(UpstreamAddr { host, port })
                }
                None => Err(UpstreamAddrParseError::InvalidHost),
            };
        }

        if let Ok(ip6) = Ipv6Addr::from_str(s) {
            return Ok(UpstreamAddr {
                host: Host::Ip(IpAddr::V6(ip6)),
                port: 0,
            });
        }

        match s.rsplit_once(':') {
            Some((host, port)) => {
                let host = Host::from_str(host)?;
                let port = u16::from_str(port).map_err(|_| UpstreamAddrParseError::InvalidPort)?;
                Ok(UpstreamAddr { host, port })
            }
            None => {
                let host = Host::from_str(s)?;
                Ok(UpstreamAddr { host, port: 0 })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_domain_with_port() {
        let addr = UpstreamAddr::from_str("ftp.example.net:2121").unwrap();
        assert_eq!(addr.host(), &Host::Domain("ftp.example.net".to_string()));
        assert_eq!(addr.port(), 2121);
    }

    #[test]
    fn parse_domain_no_port() {
        let mut addr = UpstreamAddr::from_str("ftp.example.net").unwrap();
        assert_eq!(addr.port(), 0);
        addr.set_port(21);
        assert_eq!(addr.port(), 21);
    }

    #[test]
    fn parse_ip4() {
        let addr = UpstreamAddr::from_str("192.0.2.10:21").unwrap();
        assert_eq!(
            addr.host(),
            &Host::Ip(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)))
        );
        assert_eq!(addr.port(), 21);
    }

    #[test]
    fn parse_ip6() {
        let addr = UpstreamAddr::from_str("[2001:db8::1]:21").unwrap();
        assert_eq!(addr.port(), 21);
        assert_eq!(addr.to_string(), "[2001:db8::1]:21");

        let addr = UpstreamAddr::from_str("2001:db8::1").unwrap();
        assert_eq!(addr.port(), 0);
    }

    #[test]
    fn parse_invalid() {
        assert!(UpstreamAddr::from_str("").is_err());
        assert!(UpstreamAddr::from_str("host:70000").is_err());
        assert!(UpstreamAddr::from_str("[2001:db8::1").is_err());
    }
}
