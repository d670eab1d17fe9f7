// Shared fixtures for download tests: scripted transports, in-memory storage,
// and a ledger counting how many owned resources are still open.
#![allow(dead_code)]

use std::io::{self, Cursor};
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use doodad::download::{DownloadError, Remote, Storage, Transport};
use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use url::Url;

/// Counts resources opened and released.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl Ledger {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.opened() - self.released()
    }

    fn track<T>(&self, inner: T) -> Tracked<T> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Tracked {
            inner,
            ledger: self.clone(),
        }
    }
}

/// A reader or writer that reports its drop to a [`Ledger`].
pub struct Tracked<T> {
    inner: T,
    ledger: Ledger,
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for Tracked<T> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for Tracked<T> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Never yields another byte.
struct Stall;

impl AsyncRead for Stall {
    fn poll_read(self: Pin<&mut Self>, _: &mut Context<'_>, _: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Pending
    }
}

/// Fails on the first read.
struct Broken;

impl AsyncRead for Broken {
    fn poll_read(self: Pin<&mut Self>, _: &mut Context<'_>, _: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")))
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    /// The bytes, then end of stream.
    Complete(Vec<u8>),
    /// The bytes, then nothing ever again.
    Stalled(Vec<u8>),
    /// The bytes, then a connection reset.
    Broken(Vec<u8>),
    /// The server refuses with this status.
    Status(u16),
}

/// A transport serving one scripted body for every URL.
#[derive(Debug, Clone)]
pub struct Scripted {
    body: Body,
    total: u64,
    ledger: Ledger,
}

impl Scripted {
    pub fn new(body: Body, ledger: &Ledger) -> Self {
        let total = match &body {
            Body::Complete(bytes) | Body::Stalled(bytes) | Body::Broken(bytes) => bytes.len() as u64,
            Body::Status(_) => 0,
        };
        Self {
            body,
            total,
            ledger: ledger.clone(),
        }
    }

    /// Pretend the server declared a different length.
    pub fn declaring(self, total: u64) -> Self {
        Self { total, ..self }
    }
}

impl Transport for Scripted {
    fn open<'a>(&'a self, _: &'a Url) -> BoxFuture<'a, Result<Remote, DownloadError>> {
        Box::pin(async move {
            let body: Box<dyn AsyncRead + Send + Unpin> = match &self.body {
                Body::Complete(bytes) => Box::new(self.ledger.track(Cursor::new(bytes.clone()))),
                Body::Stalled(bytes) => Box::new(self.ledger.track(Cursor::new(bytes.clone()).chain(Stall))),
                Body::Broken(bytes) => Box::new(self.ledger.track(Cursor::new(bytes.clone()).chain(Broken))),
                Body::Status(status) => return Err(DownloadError::Status(*status)),
            };
            Ok(Remote {
                body,
                total: self.total,
            })
        })
    }
}

/// Collects written bytes in memory.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    bytes: Arc<Mutex<Vec<u8>>>,
    ledger: Ledger,
}

impl Memory {
    pub fn new(ledger: &Ledger) -> Self {
        Self {
            bytes: Arc::default(),
            ledger: ledger.clone(),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().expect("memory lock").clone()
    }
}

struct MemoryWriter(Arc<Mutex<Vec<u8>>>);

impl AsyncWrite for MemoryWriter {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.0.lock().expect("memory lock").extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Storage for Memory {
    fn create<'a>(&'a self, _: &'a Path) -> BoxFuture<'a, Result<Box<dyn AsyncWrite + Send + Unpin>, DownloadError>> {
        Box::pin(async move {
            let writer = self.ledger.track(MemoryWriter(Arc::clone(&self.bytes)));
            Ok(Box::new(writer) as Box<dyn AsyncWrite + Send + Unpin>)
        })
    }
}

/// `len` bytes of a repeating pattern.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
