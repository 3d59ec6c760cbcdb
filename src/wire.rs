use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};

/// Shared handle on the bytes written through a [`WireCapture`].
#[derive(Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<BytesMut>>);

impl Captured {
    /// Takes everything captured so far.
    pub(crate) fn take(&self) -> Bytes {
        self.0.lock().split().freeze()
    }
}

/// Socket wrapper that records written bytes while behaving like a real
/// connection.
pub(crate) struct WireCapture {
    inner: tokio::io::DuplexStream,
    captured: Captured,
}

impl WireCapture {
    pub(crate) fn new(inner: tokio::io::DuplexStream) -> Self {
        Self {
            inner,
            captured: Captured::default(),
        }
    }

    pub(crate) fn captured(&self) -> Captured {
        self.captured.clone()
    }
}

impl AsyncRead for WireCapture {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for WireCapture {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        // Record only the accepted prefix.
        if let Poll::Ready(Ok(n)) = poll {
            self.captured.0.lock().extend_from_slice(&buf[..n]);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), io::Error>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    use super::*;

    #[tokio::test]
    async fn records_written_bytes() {
        let (a, mut b) = duplex(64);
        let mut capture = WireCapture::new(a);
        let captured = capture.captured();

        capture.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        let mut buf = [0u8; 16];
        b.read_exact(&mut buf).await.unwrap();

        assert_eq!(&buf, b"GET / HTTP/1.1\r\n");
        assert_eq!(captured.take(), Bytes::from_static(b"GET / HTTP/1.1\r\n"));
        assert!(captured.take().is_empty());
    }
}
