//! The steps of a download chain.
//!
//! A download is not one long task. [`start`] opens the resources and moves
//! the first chunk; every following chunk is its own command built by
//! [`read_chunk`] from the [`Context`] the previous step handed back. Each
//! step races its I/O against the cancellation token, and on cancellation
//! or error the context is dropped before the step returns.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::DownloadError;
use super::context::Context;
use super::transport::Fetcher;

/// What a chain step produced.
#[derive(Debug)]
pub enum Step {
    /// More bytes may follow; the context travels on to the next step.
    Progress {
        context: Context,
        received: u64,
        total: u64,
    },
    /// End of stream. The context has been flushed and released.
    Completed { total: u64 },
}

/// Step 0: connect, open the destination, and move the first chunk.
///
/// # Errors
///
/// [`DownloadError::Cancelled`] if `token` fires first, otherwise whatever
/// the transport, the storage, or the first chunk fails with.
pub async fn start(
    fetcher: &Fetcher,
    url: &Url,
    destination: &Path,
    token: CancellationToken,
) -> Result<Step, DownloadError> {
    let open = async {
        let remote = fetcher.transport.open(url).await?;
        let sink = fetcher.storage.create(destination).await?;
        Ok::<_, DownloadError>(Context::new(remote, sink))
    };

    let context = tokio::select! {
        biased;
        () = token.cancelled() => None,
        context = open => Some(context?),
    };
    let Some(context) = context else {
        debug!(%url, "download cancelled while connecting");
        return Err(DownloadError::Cancelled);
    };

    info!(%url, destination = %destination.display(), total = context.total(), "download started");
    read_chunk(context, fetcher.chunk_size, token).await
}

/// Step N: move the next chunk through an already open context.
///
/// # Errors
///
/// [`DownloadError::Cancelled`] if `token` fires first, otherwise the I/O
/// error that stopped the chunk. The context is released in both cases.
pub async fn read_chunk(
    mut context: Context,
    chunk_size: usize,
    token: CancellationToken,
) -> Result<Step, DownloadError> {
    let moved = tokio::select! {
        biased;
        () = token.cancelled() => None,
        moved = context.pump(chunk_size) => Some(moved),
    };

    match moved {
        None => {
            debug!(received = context.received(), "download cancelled mid-stream");
            Err(DownloadError::Cancelled)
        }
        Some(Err(error)) => Err(error),
        Some(Ok(0)) => {
            let total = context.finish().await?;
            info!(total, "download completed");
            Ok(Step::Completed { total })
        }
        Some(Ok(_)) => {
            let received = context.received();
            let total = context.total();
            Ok(Step::Progress {
                context,
                received,
                total,
            })
        }
    }
}
