//! The root application behind the `doodad` binary: one download with a
//! progress bar, a status line, and quit keys.

use std::path::PathBuf;
use std::time::Duration;

use ratatui::layout::Size;
use ratatui::style::{Color, Modifier, Style};
use tracing::info;
use url::Url;

use crate::command::Command;
use crate::doodad::{Application, Doodad, IdAllocator};
use crate::download::{self, Download, Fetcher, Status};
use crate::event::{Event, Key, KeyPress};
use crate::surface::{Offset, Surface};

/// How long the finished screen stays up before the application quits.
pub const DEFAULT_LINGER: Duration = Duration::from_millis(750);

/// Startup parameters for [`Fetch`].
#[derive(Debug, Clone)]
pub struct Flags {
    pub url: Url,
    pub destination: PathBuf,
    pub fetcher: Fetcher,
    pub linger: Duration,
}

#[derive(Debug)]
pub enum Message {
    Download(download::Message),
    System(Event),
    /// The finished screen has been shown long enough.
    Linger,
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Self::System(event)
    }
}

/// Downloads one URL and quits shortly after it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    url: Url,
    download: Download,
    size: Option<Size>,
    notice: Option<String>,
    linger: Duration,
    closing: bool,
}

impl Fetch {
    #[must_use]
    pub const fn download(&self) -> &Download {
        &self.download
    }

    /// The last unexpected failure reported by the runtime.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub const fn size(&self) -> Option<Size> {
        self.size
    }

    fn delegate(self, msg: download::Message) -> (Self, Command<Message>) {
        let (download, cmd) = self.download.update(msg);
        let cmd = cmd.map(Message::Download);

        if self.closing || *download.status() != Status::Completed {
            return (Self { download, ..self }, cmd);
        }

        info!(destination = %download.destination().display(), "download finished, closing");
        let close = Command::sequence([
            Command::tick(self.linger, |_| Message::Linger),
            Command::quit(),
        ]);
        (
            Self {
                download,
                closing: true,
                ..self
            },
            Command::batch([cmd, close]),
        )
    }
}

const fn is_quit_key(press: &KeyPress) -> bool {
    (matches!(press.key, Key::Esc | Key::Char('q')) && !press.modifiers.ctrl) || press.is_ctrl('c')
}

impl Application for Fetch {
    type Flags = Flags;

    fn new(flags: Flags, ids: &IdAllocator) -> Self {
        let Flags {
            url,
            destination,
            fetcher,
            linger,
        } = flags;

        Self {
            download: Download::new(ids, url.clone(), destination, fetcher),
            url,
            size: None,
            notice: None,
            linger,
            closing: false,
        }
    }
}

impl Doodad for Fetch {
    type Message = Message;

    fn init(&self) -> Command<Message> {
        self.download.init().map(Message::Download)
    }

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::Download(msg) => self.delegate(msg),
            Message::System(Event::Key(press)) if is_quit_key(&press) => (self, Command::quit()),
            Message::System(Event::Resize { width, height }) => (
                Self {
                    size: Some(Size::new(width, height)),
                    ..self
                },
                Command::none(),
            ),
            Message::System(Event::Failure { description }) => (
                Self {
                    notice: Some(description),
                    ..self
                },
                Command::none(),
            ),
            Message::System(Event::Key(_)) | Message::Linger => (self, Command::none()),
        }
    }

    fn view(&self, surface: &mut dyn Surface) {
        let title = Style::default().add_modifier(Modifier::BOLD);
        let at = surface.write_text(0, 0, "doodad", title);
        surface.write_text(at.x.saturating_add(1), 0, self.url.as_str(), Style::default().fg(Color::DarkGray));

        self.download.view(&mut Offset::new(surface, 0, 2));

        let height = surface.size().height;
        if let Some(notice) = &self.notice {
            surface.write_text(0, height.saturating_sub(2), notice, Style::default().fg(Color::Red));
        }
        surface.write_text(
            0,
            height.saturating_sub(1),
            "q quit",
            Style::default().fg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Action, collect};
    use crate::config::DownloadConfig;
    use crate::event::Modifiers;
    use tokio_util::sync::CancellationToken;

    fn app() -> Fetch {
        let config = DownloadConfig::default();
        let url = Url::parse("https://x/test.zip").expect("valid url");
        let flags = Flags {
            destination: config.destination_for(&url, std::path::Path::new(".")),
            url,
            fetcher: Fetcher::http(&config),
            linger: Duration::from_millis(10),
        };
        Fetch::new(flags, &IdAllocator::new())
    }

    async fn quits(cmd: Command<Message>) -> bool {
        collect(cmd, CancellationToken::new())
            .await
            .iter()
            .any(|outcome| matches!(outcome, Ok(Some(Action::Quit))))
    }

    #[tokio::test]
    async fn test_quit_keys() {
        for press in [
            KeyPress::char('q'),
            KeyPress::from(Key::Esc),
            KeyPress::new(Key::Char('c'), Modifiers::CTRL),
        ] {
            let (_, cmd) = app().update(Message::System(Event::Key(press)));
            assert!(quits(cmd).await, "{press:?} should quit");
        }
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let app = app();
        let expected = app.clone();

        let (app, cmd) = app.update(Message::System(Event::Key(KeyPress::char('x'))));
        assert_eq!(app, expected);
        assert!(cmd.is_none());

        let (app, cmd) = app.update(Message::System(Event::Key(KeyPress::new(
            Key::Char('q'),
            Modifiers::CTRL,
        ))));
        assert_eq!(app, expected);
        assert!(cmd.is_none());
    }

    #[test]
    fn test_resize_is_recorded() {
        let (app, _) = app().update(Message::System(Event::Resize {
            width: 100,
            height: 30,
        }));
        assert_eq!(app.size(), Some(Size::new(100, 30)));
    }

    #[test]
    fn test_failure_sets_notice_and_keeps_running() {
        let (app, cmd) = app().update(Message::System(Event::Failure {
            description: "command panicked: boom".to_string(),
        }));
        assert_eq!(app.notice(), Some("command panicked: boom"));
        assert!(cmd.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_lingers_then_quits() {
        let app = app();
        let id = app.download().id();

        let (app, cmd) = app.update(Message::Download(download::Message::Completed { id, total: 0 }));
        assert_eq!(app.download().status(), &Status::Completed);
        assert!(quits(cmd).await);

        // A second completion does not schedule another quit
        let (_, cmd) = app.update(Message::Download(download::Message::Completed { id, total: 0 }));
        assert!(cmd.is_none());
    }

    #[tokio::test]
    async fn test_download_failure_keeps_running() {
        let app = app();
        let id = app.download().id();

        let (app, cmd) = app.update(Message::Download(download::Message::Failed {
            id,
            error: "server responded with status 404".to_string(),
        }));
        assert!(matches!(app.download().status(), Status::Failed(_)));
        assert!(!quits(cmd).await);
    }
}
