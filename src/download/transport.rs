use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use futures::TryStreamExt;
use futures::future::BoxFuture;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use super::DownloadError;
use crate::config::DownloadConfig;

/// An opened remote resource.
pub struct Remote {
    pub body: Box<dyn AsyncRead + Send + Unpin>,
    /// Declared size in bytes, 0 when the remote did not say.
    pub total: u64,
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").field("total", &self.total).finish_non_exhaustive()
    }
}

/// Where download bytes come from.
pub trait Transport: Send + Sync + 'static {
    /// Connect and validate the response. Fails on anything but success.
    fn open<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Remote, DownloadError>>;
}

/// Where download bytes go.
pub trait Storage: Send + Sync + 'static {
    fn create<'a>(
        &'a self,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<Box<dyn AsyncWrite + Send + Unpin>, DownloadError>>;
}

/// Streams response bodies over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn open<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Remote, DownloadError>> {
        Box::pin(async move {
            let response = self.client.get(url.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(DownloadError::Status(status.as_u16()));
            }

            let total = response.content_length().unwrap_or(0);
            debug!(%url, total, "response accepted");

            let stream = response.bytes_stream().map_err(io::Error::other);
            Ok(Remote {
                body: Box::new(StreamReader::new(Box::pin(stream))),
                total,
            })
        })
    }
}

/// Writes to the local filesystem, truncating any existing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStorage;

impl Storage for FileStorage {
    fn create<'a>(
        &'a self,
        path: &'a Path,
    ) -> BoxFuture<'a, Result<Box<dyn AsyncWrite + Send + Unpin>, DownloadError>> {
        Box::pin(async move {
            let file = File::create(path).await?;
            debug!(path = %path.display(), "destination opened");
            Ok(Box::new(file) as Box<dyn AsyncWrite + Send + Unpin>)
        })
    }
}

/// Everything a download chain needs to open its resources.
///
/// Holds no live resource itself, so it is safe to keep in a model.
#[derive(Clone)]
pub struct Fetcher {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) chunk_size: usize,
}

impl Fetcher {
    pub fn new(transport: impl Transport, storage: impl Storage, config: &DownloadConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            storage: Arc::new(storage),
            chunk_size: config.chunk_size.max(1),
        }
    }

    /// HTTP(S) into local files.
    #[must_use]
    pub fn http(config: &DownloadConfig) -> Self {
        Self::new(HttpTransport::default(), FileStorage, config)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Fetcher {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.transport, &other.transport)
            && Arc::ptr_eq(&self.storage, &other.storage)
            && self.chunk_size == other.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_file_storage_creates_and_truncates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"stale contents").expect("seed file");

        let mut sink = FileStorage.create(&path).await.expect("create");
        sink.write_all(b"new").await.expect("write");
        sink.shutdown().await.expect("shutdown");
        drop(sink);

        assert_eq!(std::fs::read(&path).expect("read back"), b"new");
    }

    #[tokio::test]
    async fn test_file_storage_reports_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.bin");

        let error = FileStorage.create(&path).await.err().expect("create should fail");
        assert!(matches!(error, DownloadError::Io(_)));
    }

    #[test]
    fn test_fetcher_equality_is_by_identity() {
        let config = DownloadConfig::default().with_chunk_size(8);
        let fetcher = Fetcher::http(&config);
        assert_eq!(fetcher, fetcher.clone());
        assert_ne!(fetcher, Fetcher::http(&config));
        assert_eq!(fetcher.chunk_size(), 8);
    }
}
