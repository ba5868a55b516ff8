/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the n3 project authors.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const CHUNK_SIZE: usize = 8192;

/// Translate NETASCII (CRLF line endings) to local LF while reading.
///
/// A CR that ends a raw chunk is held back until the next byte shows
/// whether it belongs to a CRLF pair. A lone CR is passed through.
pub struct NetasciiReader<R> {
    inner: R,
    chunk: Box<[u8]>,
    out: Vec<u8>,
    out_pos: usize,
    pending_cr: bool,
    eof: bool,
}

impl<R> NetasciiReader<R> {
    pub fn new(inner: R) -> Self {
        NetasciiReader {
            inner,
            chunk: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            out: Vec::with_capacity(CHUNK_SIZE),
            out_pos: 0,
            pending_cr: false,
            eof: false,
        }
    }

    fn translate(&mut self, len: usize) {
        self.out.clear();
        self.out_pos = 0;

        let mut i = 0usize;
        if self.pending_cr {
            self.pending_cr = false;
            if self.chunk[0] == b'\n' {
                self.out.push(b'\n');
                i = 1;
            } else {
                self.out.push(b'\r');
            }
        }
        while i < len {
            let b = self.chunk[i];
            if b == b'\r' {
                if i + 1 == len {
                    self.pending_cr = true;
                    i += 1;
                } else if self.chunk[i + 1] == b'\n' {
                    self.out.push(b'\n');
                    i += 2;
                } else {
                    self.out.push(b'\r');
                    i += 1;
                }
            } else {
                self.out.push(b);
                i += 1;
            }
        }
    }
}

impl<R> AsyncRead for NetasciiReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = self.get_mut();

        loop {
            if me.out_pos < me.out.len() {
                let nr = buf.remaining().min(me.out.len() - me.out_pos);
                buf.put_slice(&me.out[me.out_pos..me.out_pos + nr]);
                me.out_pos += nr;
                return Poll::Ready(Ok(()));
            }

            if me.eof {
                if me.pending_cr {
                    me.pending_cr = false;
                    buf.put_slice(b"\r");
                }
                return Poll::Ready(Ok(()));
            }

            let mut raw = ReadBuf::new(&mut me.chunk);
            ready!(Pin::new(&mut me.inner).poll_read(cx, &mut raw))?;
            let len = raw.filled().len();
            if len == 0 {
                me.eof = true;
            } else {
                me.translate(len);
            }
        }
    }
}

/// Translate local LF line endings to NETASCII CRLF while writing.
pub struct NetasciiWriter<W> {
    inner: W,
    out: Vec<u8>,
    out_pos: usize,
}

impl<W> NetasciiWriter<W> {
    pub fn new(inner: W) -> Self {
        NetasciiWriter {
            inner,
            out: Vec::with_capacity(CHUNK_SIZE),
            out_pos: 0,
        }
    }
}

impl<W> NetasciiWriter<W>
where
    W: AsyncWrite + Unpin,
{
    fn poll_flush_out(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.out_pos < self.out.len() {
            let nw = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.out[self.out_pos..]))?;
            if nw == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "data connection closed while writing",
                )));
            }
            self.out_pos += nw;
        }
        self.out.clear();
        self.out_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W> AsyncWrite for NetasciiWriter<W>
where
    W: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let me = self.get_mut();
        ready!(me.poll_flush_out(cx))?;

        let take = buf.len().min(CHUNK_SIZE / 2);
        for b in &buf[..take] {
            if *b == b'\n' {
                me.out.extend_from_slice(b"\r\n");
            } else {
                me.out.push(*b);
            }
        }

        // opportunistic, the buffered bytes go out on the next write or flush
        let _ = me.poll_flush_out(cx)?;
        Poll::Ready(Ok(take))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        ready!(me.poll_flush_out(cx))?;
        Pin::new(&mut me.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        ready!(me.poll_flush_out(cx))?;
        Pin::new(&mut me.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn read_translates_crlf() {
        let io = tokio_test::io::Builder::new()
            .read(b"one\r\ntwo\r")
            .read(b"\nthree\rmiddle\r\n")
            .build();
        let mut reader = NetasciiReader::new(io);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"one\ntwo\nthree\rmiddle\n");
    }

    #[tokio::test]
    async fn read_keeps_trailing_cr() {
        let io = tokio_test::io::Builder::new().read(b"line\r").build();
        let mut reader = NetasciiReader::new(io);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"line\r");
    }

    #[tokio::test]
    async fn write_translates_lf() {
        let io = tokio_test::io::Builder::new()
            .write(b"one\r\ntwo\r\n")
            .build();
        let mut writer = NetasciiWriter::new(io);
        writer.write_all(b"one\ntwo\n").await.unwrap();
        writer.flush().await.unwrap();
    }
}
