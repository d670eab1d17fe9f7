//! Input readers feeding the runtime.
//!
//! The runtime runs one polling worker per [`InputReader`]. Each poll is
//! non-blocking: a reader returns `Ok(None)` when nothing is pending and the
//! worker sleeps for [`RuntimeConfig::input_poll_interval`](crate::config::RuntimeConfig)
//! before trying again.

pub mod mock;

use std::io;
use std::time::Duration;

use crossterm::event::{
    self as terminal_event, Event as TerminalEvent, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal;
use tokio_util::sync::CancellationToken;

use crate::event::{Event, Key, KeyPress, Modifiers};

/// A source of key presses and viewport resizes.
pub trait InputReader: Send + 'static {
    /// Return the next pending event without blocking.
    ///
    /// The first call reports the current viewport size as
    /// [`Event::Resize`]; later calls report a resize whenever the size
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device can no longer be read.
    fn poll_next(&mut self, cancel: &CancellationToken) -> io::Result<Option<Event>>;
}

/// Reads the real terminal through crossterm.
#[derive(Debug, Default)]
pub struct CrosstermInput {
    size: Option<(u16, u16)>,
}

impl CrosstermInput {
    #[must_use]
    pub const fn new() -> Self {
        Self { size: None }
    }

    fn resized(&mut self, width: u16, height: u16) -> Option<Event> {
        if self.size == Some((width, height)) {
            return None;
        }
        self.size = Some((width, height));
        Some(Event::Resize { width, height })
    }
}

impl InputReader for CrosstermInput {
    fn poll_next(&mut self, cancel: &CancellationToken) -> io::Result<Option<Event>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        if self.size.is_none() {
            let (width, height) = terminal::size()?;
            return Ok(self.resized(width, height));
        }

        while terminal_event::poll(Duration::ZERO)? {
            match terminal_event::read()? {
                TerminalEvent::Key(key) if key.kind != KeyEventKind::Release => {
                    return Ok(Some(Event::Key(key_press(key))));
                }
                TerminalEvent::Resize(width, height) => {
                    if let Some(event) = self.resized(width, height) {
                        return Ok(Some(event));
                    }
                }
                _ => {}
            }
        }

        Ok(None)
    }
}

/// Translate a crossterm key event into a backend-neutral [`KeyPress`].
#[must_use]
pub fn key_press(event: KeyEvent) -> KeyPress {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => Key::Unknown,
    };

    let modifiers = Modifiers {
        alt: event.modifiers.contains(KeyModifiers::ALT),
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    };

    KeyPress::new(key, modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_plain_char() {
        let press = key_press(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        assert_eq!(press, KeyPress::char('a'));
    }

    #[test]
    fn test_key_press_modifiers() {
        let press = key_press(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ));
        assert_eq!(press.key, Key::Char('c'));
        assert_eq!(press.ch, None);
        assert!(press.modifiers.ctrl);
        assert!(press.modifiers.shift);
        assert!(!press.modifiers.alt);
    }

    #[test]
    fn test_key_press_named_keys() {
        let press = key_press(KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE));
        assert_eq!(press.key, Key::F(5));

        let press = key_press(KeyEvent::new(KeyCode::CapsLock, KeyModifiers::NONE));
        assert_eq!(press.key, Key::Unknown);
    }

    #[test]
    fn test_resize_reported_only_on_change() {
        let mut input = CrosstermInput::new();
        assert_eq!(
            input.resized(80, 24),
            Some(Event::Resize {
                width: 80,
                height: 24
            })
        );
        assert_eq!(input.resized(80, 24), None);
        assert!(input.resized(100, 30).is_some());
    }

    #[test]
    fn test_cancelled_reader_reports_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let mut input = CrosstermInput::new();
        assert!(matches!(input.poll_next(&token), Ok(None)));
    }
}
