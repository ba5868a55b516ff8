/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use async_trait::async_trait;
use tokio::io::{AsyncRead, BufReader};

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::io::LimitedLineReadExt;

/// Sink for line oriented data transfers such as LIST and NLST.
///
/// Lines are delivered with their end-of-line bytes still attached.
#[async_trait]
pub trait FtpLineDataReceiver {
    async fn recv_line(&mut self, line: &str);
    fn should_return_early(&self) -> bool;
}

pub(crate) struct FtpLineDataTransfer<T: AsyncRead> {
    io: BufReader<T>,
    read_lines: usize,
    max_lines: usize,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufReader::new(io),
            read_lines: 0,
            max_lines: config.list_max_entries,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    async fn send_buf_to_receiver<R>(
        &mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver + Send,
    {
        let s = std::str::from_utf8(&self.line_buf)
            .map_err(|_| FtpLineDataReadError::UnsupportedEncoding)?;
        receiver.recv_line(s).await;
        if receiver.should_return_early() {
            self.read_lines += 1;
            return Err(FtpLineDataReadError::AbortedByCallback);
        }
        self.line_buf.clear();
        Ok(())
    }

    pub(crate) async fn read_to_end<R>(
        mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver + Send,
    {
        if !self.line_buf.is_empty() {
            self.send_buf_to_receiver(receiver).await?;
        }

        for i in self.read_lines..self.max_lines {
            let (found, nr) = self
                .io
                .limited_read_line(self.line_buf.capacity(), &mut self.line_buf)
                .await?;
            if nr == 0 {
                return Ok(());
            }

            if !found {
                return Err(FtpLineDataReadError::LineTooLong(i + 1));
            }

            self.send_buf_to_receiver(receiver).await?;
        }

        Err(FtpLineDataReadError::TooManyLines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectLines {
        lines: Vec<String>,
        stop_after: Option<usize>,
    }

    #[async_trait]
    impl FtpLineDataReceiver for CollectLines {
        async fn recv_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }

        fn should_return_early(&self) -> bool {
            self.stop_after
                .map(|n| self.lines.len() >= n)
                .unwrap_or(false)
        }
    }

    #[tokio::test]
    async fn read_all_lines() {
        let io = tokio_test::io::Builder::new()
            .read(b"first\r\nsecond\r\n")
            .build();
        let transfer = FtpLineDataTransfer::new(io, &FtpTransferConfig::default());
        let mut receiver = CollectLines::default();
        transfer.read_to_end(&mut receiver).await.unwrap();
        assert_eq!(receiver.lines, vec!["first\r\n", "second\r\n"]);
    }

    #[tokio::test]
    async fn stop_early_on_callback() {
        let io = tokio_test::io::Builder::new()
            .read(b"first\r\nsecond\r\nthird\r\n")
            .build();
        let transfer = FtpLineDataTransfer::new(io, &FtpTransferConfig::default());
        let mut receiver = CollectLines {
            stop_after: Some(1),
            ..Default::default()
        };
        let r = transfer.read_to_end(&mut receiver).await;
        assert!(matches!(r, Err(FtpLineDataReadError::AbortedByCallback)));
        assert_eq!(receiver.lines.len(), 1);
    }

    #[tokio::test]
    async fn reject_oversized_line() {
        let mut config = FtpTransferConfig::default();
        config.list_max_line_len = 8;
        let io = tokio_test::io::Builder::new()
            .read(b"this line is much too long\r\n")
            .build();
        let transfer = FtpLineDataTransfer::new(io, &config);
        let mut receiver = CollectLines::default();
        let r = transfer.read_to_end(&mut receiver).await;
        assert!(matches!(r, Err(FtpLineDataReadError::LineTooLong(1))));
    }
}
