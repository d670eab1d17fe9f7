//! System events produced by the runtime itself.
//!
//! Applications receive these through their own message type, which must
//! implement `From<Event>`:
//!
//! ```
//! use doodad::event::Event;
//!
//! enum Message {
//!     System(Event),
//!     Increment,
//! }
//!
//! impl From<Event> for Message {
//!     fn from(event: Event) -> Self {
//!         Self::System(event)
//!     }
//! }
//! ```

/// An event the runtime delivers on its own behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The viewport changed size. Always the first event from an input reader.
    Resize { width: u16, height: u16 },
    /// A key was pressed.
    Key(KeyPress),
    /// A command failed in a way its own logic did not anticipate, or panicked.
    Failure { description: String },
}

/// Key identity, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Unknown,
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        alt: false,
        ctrl: false,
        shift: false,
    };

    pub const CTRL: Self = Self {
        alt: false,
        ctrl: true,
        shift: false,
    };
}

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    /// The character this press types, if any. Absent for control chords.
    pub ch: Option<char>,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Build a key press, deriving the typed character from the key.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        let ch = match key {
            Key::Char(c) if !modifiers.ctrl && !modifiers.alt => Some(c),
            _ => None,
        };
        Self { key, ch, modifiers }
    }

    /// A plain character key with no modifiers.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::NONE)
    }

    /// `true` for Ctrl held together with `c`.
    #[must_use]
    pub const fn is_ctrl(&self, c: char) -> bool {
        self.modifiers.ctrl && matches!(self.key, Key::Char(k) if k == c)
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}
