//! Mock input reader for testing.
//!
//! [`MockInput`] behaves like a terminal that only ever receives what the test
//! feeds it through its [`MockInputHandle`], so runtime tests stay
//! deterministic.
//!
//! ```
//! use doodad::event::KeyPress;
//! use doodad::input::mock::MockInput;
//!
//! let (input, handle) = MockInput::new(80, 24);
//! handle.key(KeyPress::char('q'));
//! # drop(input);
//! ```

use std::io;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::InputReader;
use crate::event::{Event, KeyPress};

/// A scripted input reader.
#[derive(Debug)]
pub struct MockInput {
    size: (u16, u16),
    announced: bool,
    receiver: mpsc::UnboundedReceiver<Event>,
}

/// The test side of a [`MockInput`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    sender: mpsc::UnboundedSender<Event>,
}

impl MockInput {
    /// Create a reader whose viewport starts at `width` x `height`.
    #[must_use]
    pub fn new(width: u16, height: u16) -> (Self, MockInputHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let input = Self {
            size: (width, height),
            announced: false,
            receiver,
        };
        (input, MockInputHandle { sender })
    }
}

impl InputReader for MockInput {
    fn poll_next(&mut self, cancel: &CancellationToken) -> io::Result<Option<Event>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        if !self.announced {
            self.announced = true;
            let (width, height) = self.size;
            return Ok(Some(Event::Resize { width, height }));
        }

        while let Ok(event) = self.receiver.try_recv() {
            match event {
                Event::Resize { width, height } if self.size == (width, height) => {}
                Event::Resize { width, height } => {
                    self.size = (width, height);
                    return Ok(Some(event));
                }
                other => return Ok(Some(other)),
            }
        }

        Ok(None)
    }
}

impl MockInputHandle {
    /// Queue an event for the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub fn emit(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.sender.send(event)
    }

    /// Queue a key press, ignoring a dropped reader.
    pub fn key(&self, press: KeyPress) {
        let _ = self.emit(Event::Key(press));
    }

    /// Queue a viewport resize, ignoring a dropped reader.
    pub fn resize(&self, width: u16, height: u16) {
        let _ = self.emit(Event::Resize { width, height });
    }
}
