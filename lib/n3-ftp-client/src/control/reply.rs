/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpControlChannel;
use crate::error::FtpReplyError;
use crate::io::LimitedLineReadExt;

macro_rules! char_to_u16 {
    ($c:expr) => {
        ($c - b'0') as u16
    };
}

/// One fully read control channel reply.
///
/// `lines` holds the raw reply text (code prefix included, end-of-line
/// stripped), in server order. A multi-line reply keeps the code of its
/// opening line.
#[derive(Debug)]
pub struct FtpReply {
    code: u16,
    lines: Vec<String>,
    multiline: bool,
}

impl FtpReply {
    fn parse_leading_code(line: &[u8]) -> Result<u16, FtpReplyError> {
        if line.len() < 3 {
            return Err(FtpReplyError::InvalidLineFormat);
        }
        if !line[0].is_ascii_digit() || !line[1].is_ascii_digit() || !line[2].is_ascii_digit() {
            return Err(FtpReplyError::InvalidLineFormat);
        }
        let code = char_to_u16!(line[0]) * 100 + char_to_u16!(line[1]) * 10 + char_to_u16!(line[2]);
        if !(100..600).contains(&code) {
            return Err(FtpReplyError::InvalidReplyCode(code));
        }
        Ok(code)
    }

    /// The deliberately lenient end-of-reply check: a continuation run is
    /// terminated by any line that starts with a digit and does not carry
    /// `-` at index 3. Servers whose continuation lines do not echo the
    /// original code are thereby tolerated.
    fn ends_multiline(line: &[u8]) -> bool {
        if line.len() < 3 || !line[0].is_ascii_digit() {
            return false;
        }
        match line.get(3) {
            Some(b'-') => false,
            _ => true,
        }
    }

    fn push_line(&mut self, line: &[u8]) -> Result<(), FtpReplyError> {
        let msg = std::str::from_utf8(line).map_err(|_| FtpReplyError::LineIsNotUtf8)?;
        // do not trim whitespace at the beginning
        self.lines.push(msg.trim_end().to_string());
        Ok(())
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[inline]
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// The message of a single-line reply, code prefix stripped.
    pub fn line_trimmed(&self) -> Option<&str> {
        if self.multiline {
            return None;
        }
        let line = self.lines.first()?;
        Some(line.get(4..).unwrap_or("").trim())
    }

    #[inline]
    pub fn is_positive_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    #[inline]
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    #[inline]
    pub fn is_positive_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    #[inline]
    pub fn is_transient_negative(&self) -> bool {
        (400..500).contains(&self.code)
    }

    #[inline]
    pub fn is_permanent_negative(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Extract the host/port pair from a `227 Entering Passive Mode
    /// (h1,h2,h3,h4,p1,p2)` reply.
    pub(crate) fn parse_pasv_227_reply(&self) -> Option<SocketAddr> {
        let line = self.lines.first()?;

        let p_start = memchr::memchr(b'(', line.as_bytes())?;
        let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;

        let a: Vec<&str> = line[p_start + 1..p_end].split(',').collect();
        if a.len() != 6 {
            return None;
        }

        let h1 = u8::from_str(a[0].trim()).ok()?;
        let h2 = u8::from_str(a[1].trim()).ok()?;
        let h3 = u8::from_str(a[2].trim()).ok()?;
        let h4 = u8::from_str(a[3].trim()).ok()?;
        let p1 = u8::from_str(a[4].trim()).ok()?;
        let p2 = u8::from_str(a[5].trim()).ok()?;

        let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
        let port = ((p1 as u16) << 8) + (p2 as u16);
        Some(SocketAddr::new(ip, port))
    }

    /// Extract the port from a `229 Entering Extended Passive Mode
    /// (|||port|)` reply.
    pub(crate) fn parse_epsv_229_reply(&self) -> Option<u16> {
        let line = self.lines.first()?;

        let p_start = memchr::memchr(b'(', line.as_bytes())?;
        let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;

        if !line[p_start + 1..p_end].starts_with("|||") {
            return None;
        }
        if p_end - 1 <= p_start + 4 {
            return None;
        }
        if line.as_bytes()[p_end - 1] != b'|' {
            return None;
        }
        u16::from_str(&line[p_start + 4..p_end - 1]).ok()
    }

    /// Extract the double-quoted pathname from a `257 "pathname" created`
    /// reply. An embedded quote is escaped as two consecutive quotes.
    pub(crate) fn parse_257_pathname(&self) -> Option<String> {
        let line = self.lines.first()?;
        let start = memchr::memchr(b'"', line.as_bytes())?;

        let mut out = String::new();
        let mut rest = &line[start + 1..];
        loop {
            let i = rest.find('"')?;
            out.push_str(&rest[..i]);
            if rest[i + 1..].starts_with('"') {
                out.push('"');
                rest = &rest[i + 2..];
            } else {
                return Some(out);
            }
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let mut line = buf;
    if line.last() == Some(&b'\n') {
        line = &line[..line.len() - 1];
    }
    if line.last() == Some(&b'\r') {
        line = &line[..line.len() - 1];
    }
    line
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpReplyError> {
        buf.clear();

        let (found, len) = self
            .stream
            .limited_read_line(self.config.max_line_len, buf)
            .await
            .map_err(FtpReplyError::ReadFailed)?;
        if len == 0 {
            return Err(FtpReplyError::ConnectionClosed);
        }

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(String::from_utf8_lossy(buf).trim_end());

        if !found {
            return Err(FtpReplyError::LineTooLong);
        }
        Ok(())
    }

    async fn read_raw_reply(&mut self) -> Result<FtpReply, FtpReplyError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len);
        self.read_line(&mut buf).await?;

        let first = trim_line_ending(&buf);
        let code = FtpReply::parse_leading_code(first)?;
        let mut reply = FtpReply {
            code,
            lines: Vec::with_capacity(1),
            multiline: first.get(3) == Some(&b'-'),
        };
        reply.push_line(first)?;

        if reply.multiline {
            let mut terminated = false;
            for _ in 0..self.config.max_multi_lines {
                self.read_line(&mut buf).await?;
                let line = trim_line_ending(&buf);
                reply.push_line(line)?;
                if FtpReply::ends_multiline(line) {
                    terminated = true;
                    break;
                }
            }
            if !terminated {
                return Err(FtpReplyError::TooManyLines);
            }
        }

        Ok(reply)
    }

    pub(crate) async fn read_reply(&mut self) -> Result<FtpReply, FtpReplyError> {
        let reply = self.read_raw_reply().await?;
        self.observers
            .notify_reply_received(reply.code, &reply.lines.join("\n"));
        if reply.code == 421 {
            // captured, but never surfaced as an ordinary reply
            return Err(FtpReplyError::ServiceNotAvailable);
        }
        Ok(reply)
    }

    pub(crate) async fn timed_read_reply(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpReply, FtpReplyError> {
        match tokio::time::timeout(self.config.command_timeout, self.read_reply()).await {
            Ok(r) => r,
            Err(_) => Err(FtpReplyError::ReadReplyTimedOut(stage)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FtpControlConfig;

    fn channel_over(data: &[u8]) -> FtpControlChannel<tokio_test::io::Mock> {
        let stream = tokio_test::io::Builder::new().read(data).build();
        FtpControlChannel::new(stream, FtpControlConfig::default())
    }

    #[tokio::test]
    async fn read_codes_of_all_categories() {
        for (text, code) in [
            ("125 transfer starting\r\n", 125),
            ("226 closing data connection\r\n", 226),
            ("331 need password\r\n", 331),
            ("450 file unavailable\r\n", 450),
            ("550 no such file\r\n", 550),
        ] {
            let mut channel = channel_over(text.as_bytes());
            let reply = channel.read_reply().await.unwrap();
            assert_eq!(reply.code(), code);
            assert!(!reply.is_multiline());
        }
    }

    #[tokio::test]
    async fn read_multiline_reply() {
        let mut channel = channel_over(b"211-Features:\r\n MDTM\r\n SIZE\r\n211 End\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.code(), 211);
        assert!(reply.is_multiline());
        assert_eq!(reply.lines().len(), 4);
        assert_eq!(reply.lines()[1], " MDTM");
    }

    #[tokio::test]
    async fn lenient_multiline_termination() {
        // continuation lines need not echo the opening code
        let mut channel = channel_over(b"150-about to open\r\n150 data connection ready\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.code(), 150);
        assert_eq!(reply.lines().len(), 2);

        // a preliminary/completion pair is two distinct replies
        let mut channel = channel_over(b"150-start\r\n150 middle\r\n226 done\r\n");
        let first = channel.read_reply().await.unwrap();
        assert_eq!(first.code(), 150);
        assert_eq!(first.lines().len(), 2);
        let end = channel.read_reply().await.unwrap();
        assert_eq!(end.code(), 226);
        assert!(end.is_positive_completion());
    }

    #[tokio::test]
    async fn reject_short_line() {
        let mut channel = channel_over(b"2\r\n");
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpReplyError::InvalidLineFormat)
        ));
    }

    #[tokio::test]
    async fn reject_non_numeric_code() {
        let mut channel = channel_over(b"hello world\r\n");
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpReplyError::InvalidLineFormat)
        ));
    }

    #[tokio::test]
    async fn closed_on_empty_read() {
        let mut channel = channel_over(b"");
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpReplyError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn service_not_available_is_fatal() {
        let mut channel = channel_over(b"421 service shutting down\r\n");
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpReplyError::ServiceNotAvailable)
        ));
    }

    #[tokio::test]
    async fn parse_pasv_reply() {
        let mut channel = channel_over(b"227 Entering Passive Mode (127,0,0,1,19,136).\r\n");
        let reply = channel.read_reply().await.unwrap();
        let addr = reply.parse_pasv_227_reply().unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(addr.port(), 19 * 256 + 136);
    }

    #[tokio::test]
    async fn parse_pasv_reply_bad_tuple() {
        let mut channel = channel_over(b"227 Entering Passive Mode (127,0,0,one,19,136).\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert!(reply.parse_pasv_227_reply().is_none());
    }

    #[tokio::test]
    async fn parse_epsv_reply() {
        let mut channel = channel_over(b"229 Entering Extended Passive Mode (|||6446|)\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.parse_epsv_229_reply(), Some(6446));
    }

    #[tokio::test]
    async fn parse_257_pathname() {
        let mut channel = channel_over(b"257 \"/tmp/new dir\" created\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.parse_257_pathname().unwrap(), "/tmp/new dir");

        let mut channel = channel_over(b"257 \"/with\"\"quote\" created\r\n");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.parse_257_pathname().unwrap(), "/with\"quote");
    }
}
