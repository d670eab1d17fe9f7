use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Bytes moved per download step when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// File name used when a URL's path has no usable basename.
pub const FALLBACK_FILE_NAME: &str = "download.bin";

/// Configuration for the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How long the input worker sleeps after a poll that found nothing.
    pub input_poll_interval: Duration,

    /// How long shutdown waits for in-flight commands to release their
    /// resources after cancellation has been raised.
    pub shutdown_grace: Duration,

    /// Whether SIGINT (Ctrl+C outside raw mode) shuts the loop down.
    pub handle_interrupt: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            input_poll_interval: Duration::from_millis(10),
            shutdown_grace: Duration::from_secs(2),
            handle_interrupt: true,
        }
    }
}

impl RuntimeConfig {
    /// Creates a runtime configuration with the given poll interval and shutdown grace.
    #[must_use]
    pub const fn new(input_poll_interval: Duration, shutdown_grace: Duration) -> Self {
        Self {
            input_poll_interval,
            shutdown_grace,
            handle_interrupt: true,
        }
    }

    /// Leave SIGINT to the process default.
    #[must_use]
    pub const fn without_interrupt_handler(self) -> Self {
        Self {
            handle_interrupt: false,
            ..self
        }
    }
}

/// Configuration for chunked downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Upper bound on the bytes read and written by one chain step.
    pub chunk_size: usize,

    /// File name used when the URL path ends without a basename.
    pub fallback_file_name: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            fallback_file_name: FALLBACK_FILE_NAME.to_string(),
        }
    }
}

impl DownloadConfig {
    /// Use a different chunk size. Zero is raised to one byte.
    #[must_use]
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            ..self
        }
    }

    /// The percent-decoded basename of the URL's path, or the fallback name
    /// when it is empty.
    ///
    /// Separators that decode out of the segment become `_`, so the name
    /// never leaves the destination directory.
    #[must_use]
    pub fn file_name_for(&self, url: &Url) -> String {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(|segment| {
                let decoded = urlencoding::decode_binary(segment.as_bytes());
                String::from_utf8_lossy(&decoded).replace(['/', '\\'], "_")
            })
            .filter(|name| !matches!(name.as_str(), "" | "." | ".."))
            .unwrap_or_else(|| self.fallback_file_name.clone())
    }

    /// Where a download of `url` lands inside `dir`.
    #[must_use]
    pub fn destination_for(&self, url: &Url, dir: &Path) -> PathBuf {
        dir.join(self.file_name_for(url))
    }
}
