//! Countdown timer and stopwatch.

use std::time::Duration;

use ratatui::style::Style;

use crate::command::Command;
use crate::doodad::{Doodad, Generational, Id, IdAllocator, Stamp, Tag};
use crate::surface::Surface;

/// Which way the clock counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Counts down from the configured duration and stops at zero.
    Countdown(Duration),
    /// Counts up without bound.
    Stopwatch,
}

/// Controls addressed to a clock by id, plus its own ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Start(Id),
    Stop(Id),
    Toggle(Id),
    Reset(Id),
    Tick(Stamp),
    /// A countdown reached zero.
    Expired(Id),
}

/// A countdown or stopwatch that ticks once per interval while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    id: Id,
    tag: Tag,
    mode: Mode,
    interval: Duration,
    elapsed: Duration,
    running: bool,
}

impl Clock {
    #[must_use]
    pub fn countdown(ids: &IdAllocator, duration: Duration) -> Self {
        Self::with_mode(ids, Mode::Countdown(duration))
    }

    #[must_use]
    pub fn stopwatch(ids: &IdAllocator) -> Self {
        Self::with_mode(ids, Mode::Stopwatch)
    }

    fn with_mode(ids: &IdAllocator, mode: Mode) -> Self {
        Self {
            id: ids.allocate(),
            tag: Tag::ZERO,
            mode,
            interval: Duration::from_secs(1),
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    /// Tick at a different resolution. A zero interval is raised to one millisecond.
    #[must_use]
    pub fn with_interval(self, interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            ..self
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time shown on the face: remaining for a countdown, elapsed for a stopwatch.
    #[must_use]
    pub fn display(&self) -> Duration {
        match self.mode {
            Mode::Countdown(total) => total.saturating_sub(self.elapsed),
            Mode::Stopwatch => self.elapsed,
        }
    }

    fn expired(&self) -> bool {
        matches!(self.mode, Mode::Countdown(total) if self.elapsed >= total)
    }

    fn schedule(&self) -> Command<Message> {
        let stamp = self.stamp();
        Command::tick(self.interval, move |_| Message::Tick(stamp))
    }

    fn start(self) -> (Self, Command<Message>) {
        if self.running || self.expired() {
            return (self, Command::none());
        }

        let next = Self {
            running: true,
            ..self
        };
        let cmd = next.schedule();
        (next, cmd)
    }

    fn stop(self) -> (Self, Command<Message>) {
        if !self.running {
            return (self, Command::none());
        }

        (
            Self {
                tag: self.tag.next(),
                running: false,
                ..self
            },
            Command::none(),
        )
    }

    fn tick(self) -> (Self, Command<Message>) {
        let next = Self {
            elapsed: self.elapsed + self.interval,
            ..self
        };

        if next.expired() {
            let id = next.id;
            let stopped = Self {
                tag: next.tag.next(),
                running: false,
                ..next
            };
            return (stopped, Command::emit(Message::Expired(id)));
        }

        let cmd = next.schedule();
        (next, cmd)
    }
}

impl Generational for Clock {
    fn id(&self) -> Id {
        self.id
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

impl Doodad for Clock {
    type Message = Message;

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::Start(id) if id == self.id => self.start(),
            Message::Stop(id) if id == self.id => self.stop(),
            Message::Toggle(id) if id == self.id => {
                if self.running {
                    self.stop()
                } else {
                    self.start()
                }
            }
            Message::Reset(id) if id == self.id => (
                Self {
                    tag: self.tag.next(),
                    elapsed: Duration::ZERO,
                    running: false,
                    ..self
                },
                Command::none(),
            ),
            Message::Tick(stamp) if self.running && self.is_current(stamp) => self.tick(),
            _ => (self, Command::none()),
        }
    }

    fn view(&self, surface: &mut dyn Surface) {
        let secs = self.display().as_secs();
        let text = format!("{:02}:{:02}", secs / 60, secs % 60);
        surface.write_text(0, 0, &text, Style::default());
    }
}
