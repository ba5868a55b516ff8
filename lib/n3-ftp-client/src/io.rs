/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::AsyncBufRead;

/// Line-oriented read helpers for the control and listing channels.
///
/// A reply line that never ends is an attack surface, so every read is
/// capped: the returned tuple is (delimiter found within the cap, bytes
/// appended to the buffer).
pub(crate) trait LimitedLineReadExt: AsyncBufRead {
    fn limited_read_line<'a>(
        &'a mut self,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadLine<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadLine::new(self, max_len, buf)
    }

    /// return Ok(true) once at least one byte is buffered, Ok(false) on EOF
    fn wait_data_ready(&mut self) -> WaitDataReady<Self>
    where
        Self: Unpin,
    {
        WaitDataReady::new(self)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedLineReadExt for R {}

pub(crate) struct LimitedReadLine<'a, R: ?Sized> {
    reader: &'a mut R,
    buf: &'a mut Vec<u8>,
    read: usize,
    limit: usize,
}

impl<'a, R> LimitedReadLine<'a, R>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    fn new(reader: &'a mut R, max_len: usize, buf: &'a mut Vec<u8>) -> Self {
        Self {
            reader,
            buf,
            read: 0,
            limit: max_len,
        }
    }
}

fn read_line_internal<R: AsyncBufRead + ?Sized>(
    mut reader: Pin<&mut R>,
    cx: &mut Context<'_>,
    buf: &mut Vec<u8>,
    read: &mut usize,
    limit: usize,
) -> Poll<io::Result<(bool, usize)>> {
    loop {
        let (done, used) = {
            let available = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if let Some(i) = memchr::memchr(b'\n', available) {
                buf.extend_from_slice(&available[..=i]);
                (true, i + 1)
            } else {
                buf.extend_from_slice(available);
                (false, available.len())
            }
        };
        reader.as_mut().consume(used);
        *read += used;
        if done {
            return if *read > limit {
                Poll::Ready(Ok((false, mem::replace(read, 0))))
            } else {
                Poll::Ready(Ok((true, mem::replace(read, 0))))
            };
        }
        if used == 0 || *read > limit {
            return Poll::Ready(Ok((false, mem::replace(read, 0))));
        }
    }
}

impl<R: AsyncBufRead + ?Sized + Unpin> Future for LimitedReadLine<'_, R> {
    type Output = io::Result<(bool, usize)>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self {
            reader,
            buf,
            read,
            limit,
        } = &mut *self;
        read_line_internal(Pin::new(reader), cx, buf, read, *limit)
    }
}

pub(crate) struct WaitDataReady<'a, R: ?Sized> {
    reader: &'a mut R,
}

impl<'a, R> WaitDataReady<'a, R>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }
}

impl<R: AsyncBufRead + ?Sized + Unpin> Future for WaitDataReady<'_, R> {
    type Output = io::Result<bool>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self { reader } = &mut *self;
        let buf = ready!(Pin::new(reader).poll_fill_buf(cx))?;
        Poll::Ready(Ok(!buf.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn read_single_line() {
        let stream = tokio_test::io::Builder::new().read(b"220 ready\r\n").build();
        let mut reader = BufReader::new(stream);

        let mut buf = Vec::new();
        let (found, len) = reader.limited_read_line(512, &mut buf).await.unwrap();
        assert!(found);
        assert_eq!(len, 11);
        assert_eq!(buf.as_slice(), b"220 ready\r\n");
    }

    #[tokio::test]
    async fn read_split_line() {
        let stream = tokio_test::io::Builder::new()
            .read(b"220 re")
            .read(b"ady\r\n221 bye\r\n")
            .build();
        let mut reader = BufReader::new(stream);

        let mut buf = Vec::new();
        let (found, _) = reader.limited_read_line(512, &mut buf).await.unwrap();
        assert!(found);
        assert_eq!(buf.as_slice(), b"220 ready\r\n");

        buf.clear();
        let (found, _) = reader.limited_read_line(512, &mut buf).await.unwrap();
        assert!(found);
        assert_eq!(buf.as_slice(), b"221 bye\r\n");
    }

    #[tokio::test]
    async fn read_line_too_long() {
        let stream = tokio_test::io::Builder::new()
            .read(b"220 some very long greeting line\r\n")
            .build();
        let mut reader = BufReader::new(stream);

        let mut buf = Vec::new();
        let (found, len) = reader.limited_read_line(8, &mut buf).await.unwrap();
        assert!(!found);
        assert!(len > 8);
    }

    #[tokio::test]
    async fn read_line_eof() {
        let stream = tokio_test::io::Builder::new().build();
        let mut reader = BufReader::new(stream);

        let mut buf = Vec::new();
        let (found, len) = reader.limited_read_line(512, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(len, 0);
    }
}
