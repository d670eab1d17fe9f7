//! A blinking cursor.
//!
//! While focused the cursor toggles visibility every [`BLINK_INTERVAL`].
//! Focus and blur move the tag forward so a refocus never ends up with two
//! tick chains alternating against each other.

use std::time::Duration;

use ratatui::style::{Modifier, Style};

use crate::command::Command;
use crate::doodad::{Doodad, Generational, Id, IdAllocator, Stamp, Tag};
use crate::surface::Surface;

pub const BLINK_INTERVAL: Duration = Duration::from_millis(530);

/// Focus changes and the ticks that drive the blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Tick(Stamp),
    Focus(Id),
    Blur(Id),
}

/// A blinking cursor glyph. It only blinks while focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blink {
    id: Id,
    tag: Tag,
    focused: bool,
    visible: bool,
    glyph: char,
}

impl Blink {
    #[must_use]
    pub fn new(ids: &IdAllocator) -> Self {
        Self {
            id: ids.allocate(),
            tag: Tag::ZERO,
            focused: false,
            visible: true,
            glyph: '█',
        }
    }

    #[must_use]
    pub fn with_glyph(self, glyph: char) -> Self {
        Self { glyph, ..self }
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    fn schedule(&self) -> Command<Message> {
        let stamp = self.stamp();
        Command::tick(BLINK_INTERVAL, move |_| Message::Tick(stamp))
    }
}

impl Generational for Blink {
    fn id(&self) -> Id {
        self.id
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

impl Doodad for Blink {
    type Message = Message;

    fn update(self, msg: Message) -> (Self, Command<Message>) {
        match msg {
            Message::Focus(id) if id == self.id => {
                let next = Self {
                    tag: self.tag.next(),
                    focused: true,
                    visible: true,
                    ..self
                };
                let cmd = next.schedule();
                (next, cmd)
            }
            Message::Blur(id) if id == self.id => (
                Self {
                    tag: self.tag.next(),
                    focused: false,
                    visible: true,
                    ..self
                },
                Command::none(),
            ),
            Message::Tick(stamp) if self.focused && self.is_current(stamp) => {
                let next = Self {
                    visible: !self.visible,
                    ..self
                };
                let cmd = next.schedule();
                (next, cmd)
            }
            _ => (self, Command::none()),
        }
    }

    fn view(&self, surface: &mut dyn Surface) {
        let style = if self.visible {
            Style::default()
        } else {
            Style::default().add_modifier(Modifier::HIDDEN)
        };
        surface.write_text(0, 0, &self.glyph.to_string(), style);
    }
}
