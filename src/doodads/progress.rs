//! A spring-animated progress bar.
//!
//! [`Message::SetPercent`] retargets the bar and starts a chain of frame
//! ticks. Each frame steps the spring; once both the distance to the target
//! and the velocity fall under [`EPSILON`] the bar snaps to the target and the
//! chain ends.

use std::time::Duration;

use ratatui::style::{Color, Style};

use super::spring::Spring;
use crate::command::Command;
use crate::doodad::{Doodad, Generational, Id, IdAllocator, Stamp, Tag};
use crate::surface::Surface;

pub const FPS: u32 = 60;

/// Distance and speed under which the animation counts as settled.
pub const EPSILON: f64 = 0.001;

const FILLED: &str = "█";
const EMPTY: &str = "░";

#[must_use]
pub fn frame_interval() -> Duration {
    Duration::from_secs(1) / FPS
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    SetPercent { id: Id, percent: f64 },
    Frame(Stamp),
}

/// A horizontal bar that springs toward its target percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    id: Id,
    tag: Tag,
    width: u16,
    spring: Spring,
    target: f64,
    shown: f64,
    velocity: f64,
}

impl Progress {
    #[must_use]
    pub fn new(ids: &IdAllocator) -> Self {
        Self {
            id: ids.allocate(),
            tag: Tag::ZERO,
            width: 40,
            spring: Spring::default(),
            target: 0.0,
            shown: 0.0,
            velocity: 0.0,
        }
    }

    #[must_use]
    pub fn with_width(self, width: u16) -> Self {
        Self { width, ..self }
    }

    /// The message that retargets this bar.
    #[must_use]
    pub const fn set_percent(&self, percent: f64) -> Message {
        Message::SetPercent {
            id: self.id,
            percent,
        }
    }

    /// Where the animation is heading, in `0.0..=1.0`.
    #[must_use]
    pub const fn target(&self) -> f64 {
        self.target
    }

    /// What the bar currently shows.
    #[must_use]
    pub const fn shown(&self) -> f64 {
        self.shown
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.settled()
    }

    fn settled(&self) -> bool {
        (self.target - self.shown).abs() < EPSILON && self.velocity.abs() < EPSILON
    }

    fn schedule(&self) -> Command<Message> {
        let stamp = self.stamp();
        Command::tick(frame_interval(), move |_| Message::Frame(stamp))
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 1.0)
    }
}

impl Generational for Progress {
    fn id(&self) -> Id {
        self.id
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

impl Doodad for Progress {
    type Message = Message;

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::SetPercent { id, percent } if id == self.id => {
                let next = Self {
                    tag: self.tag.next(),
                    target: clamp_percent(percent),
                    ..self
                };
                if next.settled() {
                    return (next, Command::none());
                }
                let cmd = next.schedule();
                (next, cmd)
            }
            Message::Frame(stamp) if self.is_current(stamp) => {
                let (shown, velocity) =
                    self.spring
                        .step(frame_interval(), self.shown, self.velocity, self.target);
                let next = Self {
                    shown,
                    velocity,
                    ..self
                };

                if next.settled() {
                    return (
                        Self {
                            shown: next.target,
                            velocity: 0.0,
                            ..next
                        },
                        Command::none(),
                    );
                }

                let cmd = next.schedule();
                (next, cmd)
            }
            _ => (self, Command::none()),
        }
    }

    fn view(&self, surface: &mut dyn Surface) {
        let shown = self.shown.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let filled = (f64::from(self.width) * shown).round() as usize;
        let empty = usize::from(self.width).saturating_sub(filled);

        let at = surface.write_text(0, 0, &FILLED.repeat(filled), Style::default().fg(Color::Cyan));
        let at = surface.write_text(at.x, at.y, &EMPTY.repeat(empty), Style::default().fg(Color::DarkGray));
        surface.write_text(at.x, at.y, &format!(" {:>3.0}%", shown * 100.0), Style::default());
    }
}
