use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::DownloadError;
use super::transport::Remote;

/// The live resources of one download: the response body, the destination
/// writer, and the byte counters.
///
/// A context has exactly one owner. It moves from one chain step to the next
/// inside a message and is never cloned or shared. Dropping it releases both
/// resources, which makes drop the single release point on every exit path;
/// [`Context::finish`] additionally flushes and closes the writer on a
/// normal end of stream.
pub struct Context {
    body: Box<dyn AsyncRead + Send + Unpin>,
    sink: Box<dyn AsyncWrite + Send + Unpin>,
    total: u64,
    received: u64,
}

impl Context {
    pub(crate) fn new(remote: Remote, sink: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            body: remote.body,
            sink,
            total: remote.total,
            received: 0,
        }
    }

    /// Declared size in bytes, 0 when unknown.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Move up to `chunk_size` bytes from the body to the sink.
    ///
    /// Returns the number of bytes moved; 0 means end of stream.
    pub(crate) async fn pump(&mut self, chunk_size: usize) -> Result<usize, DownloadError> {
        let mut chunk = Vec::with_capacity(chunk_size);
        let limit = u64::try_from(chunk_size).unwrap_or(u64::MAX);
        let read = (&mut self.body).take(limit).read_to_end(&mut chunk).await?;

        if read > 0 {
            self.sink.write_all(&chunk).await?;
            self.received += chunk.len() as u64;
        }
        trace!(read, received = self.received, total = self.total, "chunk moved");

        Ok(read)
    }

    /// Flush and close the sink, then release everything.
    ///
    /// Returns the number of bytes written.
    pub(crate) async fn finish(mut self) -> Result<u64, DownloadError> {
        self.sink.flush().await?;
        self.sink.shutdown().await?;
        Ok(self.received)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        trace!(received = self.received, total = self.total, "download context released");
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("total", &self.total)
            .field("received", &self.received)
            .finish_non_exhaustive()
    }
}
