//! Chunked downloads built from a chain of commands.
//!
//! [`Download`] starts the chain from `init`. Every progress message carries
//! the [`Context`] holding the open response body and destination file; the
//! `update` arm that folds it hands the context straight to the next
//! [`chain::read_chunk`] command, batched with the progress bar's animation
//! so a slow read never holds up a frame. The model itself only keeps
//! counters.

pub mod chain;
mod context;
mod transport;

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use ratatui::style::{Color, Style};
use thiserror::Error;
use tracing::warn;
use url::Url;

pub use self::chain::Step;
pub use self::context::Context;
pub use self::transport::{FileStorage, Fetcher, HttpTransport, Remote, Storage, Transport};
use crate::command::{Command, CommandError};
use crate::doodad::{Doodad, Id, IdAllocator};
use crate::doodads::progress::{self, Progress};
use crate::runtime::executor::panic_description;
use crate::surface::{Offset, Surface};

/// Why a download step failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The runtime is shutting down. Never shown to the user.
    #[error("download cancelled")]
    Cancelled,

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a download is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Connecting; no bytes yet.
    Pending,
    Running,
    Completed,
    Failed(String),
}

/// Messages a [`Download`] folds. Each chain message carries the id of the
/// download it belongs to.
#[derive(Debug)]
pub enum Message {
    /// A chunk landed; `context` is needed to read the next one.
    Progress {
        id: Id,
        context: Context,
        received: u64,
        total: u64,
    },
    Completed {
        id: Id,
        total: u64,
    },
    Failed {
        id: Id,
        error: String,
    },
    /// Forwarded to the progress bar.
    Bar(progress::Message),
}

/// One file transfer with its counters and progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    id: Id,
    url: Url,
    destination: PathBuf,
    fetcher: Fetcher,
    received: u64,
    total: u64,
    status: Status,
    bar: Progress,
}

impl Download {
    /// A pending download of `url` into `destination`. Nothing happens until
    /// the command from [`Doodad::init`] runs.
    pub fn new(ids: &IdAllocator, url: Url, destination: PathBuf, fetcher: Fetcher) -> Self {
        Self {
            id: ids.allocate(),
            url,
            destination,
            fetcher,
            received: 0,
            total: 0,
            status: Status::Pending,
            bar: Progress::new(ids),
        }
    }

    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Completed or failed; no further chain steps will run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.status, Status::Completed | Status::Failed(_))
    }

    #[must_use]
    pub const fn bar(&self) -> &Progress {
        &self.bar
    }

    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.received as f64 / self.total as f64
        }
    }

    fn read_next(&self, context: Context) -> Command<Message> {
        let id = self.id;
        let chunk_size = self.fetcher.chunk_size();
        Command::task(move |token| guarded(id, chain::read_chunk(context, chunk_size, token)))
    }

    fn retarget(self, percent: f64) -> (Self, Command<Message>) {
        let msg = self.bar.set_percent(percent);
        let (bar, cmd) = self.bar.update(msg);
        (Self { bar, ..self }, cmd.map(Message::Bar))
    }
}

/// Run one chain step, turning a panic into a failure of this download.
///
/// The context is dropped while unwinding, so the resources are released
/// before the failure is reported.
async fn guarded(
    id: Id,
    step: impl Future<Output = Result<Step, DownloadError>>,
) -> Result<Option<Message>, CommandError> {
    match AssertUnwindSafe(step).catch_unwind().await {
        Ok(step) => settle(id, step),
        Err(payload) => {
            let error = panic_description(payload.as_ref());
            warn!(%id, %error, "download step panicked");
            Ok(Some(Message::Failed { id, error }))
        }
    }
}

/// Turn a chain step's result into the message the doodad folds next.
fn settle(id: Id, step: Result<Step, DownloadError>) -> Result<Option<Message>, CommandError> {
    match step {
        Ok(Step::Progress {
            context,
            received,
            total,
        }) => Ok(Some(Message::Progress {
            id,
            context,
            received,
            total,
        })),
        Ok(Step::Completed { total }) => Ok(Some(Message::Completed { id, total })),
        Err(DownloadError::Cancelled) => Err(CommandError::Cancelled),
        Err(error) => {
            warn!(%id, %error, "download failed");
            Ok(Some(Message::Failed {
                id,
                error: error.to_string(),
            }))
        }
    }
}

impl Doodad for Download {
    type Message = Message;

    fn init(&self) -> Command<Message> {
        let id = self.id;
        let fetcher = self.fetcher.clone();
        let url = self.url.clone();
        let destination = self.destination.clone();

        Command::task(move |token| async move {
            guarded(id, chain::start(&fetcher, &url, &destination, token)).await
        })
    }

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::Progress {
                id,
                context,
                received,
                total,
            } if id == self.id && !self.is_finished() => {
                let read = self.read_next(context);
                let next = Self {
                    received,
                    total,
                    status: Status::Running,
                    ..self
                };
                let fraction = next.fraction();
                let (next, animate) = next.retarget(fraction);
                (next, Command::batch([read, animate]))
            }
            Message::Completed { id, total } if id == self.id && !self.is_finished() => Self {
                received: total,
                total,
                status: Status::Completed,
                ..self
            }
            .retarget(1.0),
            Message::Failed { id, error } if id == self.id && !self.is_finished() => (
                Self {
                    status: Status::Failed(error),
                    ..self
                },
                Command::none(),
            ),
            Message::Bar(msg) => {
                let (bar, cmd) = self.bar.update(msg);
                (Self { bar, ..self }, cmd.map(Message::Bar))
            }
            // Anything else, including a progress message nobody continues,
            // is dropped here; dropping its context releases the resources.
            _ => (self, Command::none()),
        }
    }

    fn view(&self, surface: &mut dyn Surface) {
        let name = self
            .destination
            .file_name()
            .map_or_else(|| self.destination.display().to_string(), |name| name.to_string_lossy().into_owned());

        let (label, style) = match &self.status {
            Status::Pending => ("connecting", Style::default().fg(Color::Yellow)),
            Status::Running => ("downloading", Style::default().fg(Color::Cyan)),
            Status::Completed => ("done", Style::default().fg(Color::Green)),
            Status::Failed(_) => ("failed", Style::default().fg(Color::Red)),
        };
        let at = surface.write_text(0, 0, label, style);
        surface.write_text(at.x.saturating_add(1), 0, &name, Style::default());

        let width = surface.size().width.clamp(10, 60);
        self.bar.clone().with_width(width.saturating_sub(6)).view(&mut Offset::new(surface, 0, 1));

        let counter = if self.total == 0 {
            human_bytes(self.received)
        } else {
            format!("{} / {}", human_bytes(self.received), human_bytes(self.total))
        };
        surface.write_text(0, 2, &counter, Style::default().fg(Color::DarkGray));

        if let Status::Failed(error) = &self.status {
            surface.write_text(0, 3, error, Style::default().fg(Color::Red));
        }
    }
}

/// Format a byte count with binary units.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
