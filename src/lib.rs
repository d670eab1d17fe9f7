//! # Doodad - message-driven terminal applications
//!
//! Doodad is a runtime for terminal applications built around the Elm
//! Architecture, drawing through [ratatui](https://ratatui.rs/) and running
//! side effects on [tokio](https://tokio.rs/).
//!
//! ## Architecture
//!
//! 1. **Model**: an immutable value; every transition returns a new one
//! 2. **Message**: a plain value describing one event or result
//! 3. **Update**: folds one message into the model and may return a command
//! 4. **View**: projects the model onto a [`Surface`](surface::Surface)
//! 5. **Commands**: deferred, cancellable work yielding at most one message
//!
//! The [`Runtime`](runtime::Runtime) owns the only live model. Commands run
//! concurrently on their own tasks; their messages are folded one at a time,
//! and the view is redrawn once per settled burst of transitions.
//!
//! ## Core Components
//!
//! - [`Doodad`](doodad::Doodad): the init/update/view contract of every component
//! - [`Application`](doodad::Application): the root doodad, built from flags
//! - [`Command`](command::Command): deferred work and its combinators
//! - [`Runtime`](runtime::Runtime): the dispatch loop
//! - [`Tag`](doodad::Tag): generation counter for dropping stale recurring work
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use doodad::prelude::*;
//! use ratatui::style::Style;
//!
//! #[derive(Debug)]
//! enum Message {
//!     Tick,
//!     System(Event),
//! }
//!
//! impl From<Event> for Message {
//!     fn from(event: Event) -> Self {
//!         Self::System(event)
//!     }
//! }
//!
//! struct Seconds {
//!     count: u32,
//! }
//!
//! impl Doodad for Seconds {
//!     type Message = Message;
//!
//!     fn init(&self) -> Command<Message> {
//!         Command::tick(Duration::from_secs(1), |_| Message::Tick)
//!     }
//!
//!     fn update(self, msg: Message) -> (Self, Command<Message>) {
//!         match msg {
//!             Message::Tick => (
//!                 Self { count: self.count + 1 },
//!                 Command::tick(Duration::from_secs(1), |_| Message::Tick),
//!             ),
//!             Message::System(Event::Key(_)) => (self, Command::quit()),
//!             Message::System(_) => (self, Command::none()),
//!         }
//!     }
//!
//!     fn view(&self, surface: &mut dyn Surface) {
//!         surface.write_text(0, 0, &self.count.to_string(), Style::default());
//!     }
//! }
//!
//! impl Application for Seconds {
//!     type Flags = ();
//!
//!     fn new(_flags: (), _ids: &IdAllocator) -> Self {
//!         Self { count: 0 }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> color_eyre::Result<()> {
//!     let runtime = Runtime::<Seconds>::new(()).with_input(CrosstermInput::new());
//!     let mut terminal = ratatui::init();
//!     let result = runtime.run(&mut terminal).await;
//!     ratatui::restore();
//!     result.map(|_| ())
//! }
//! ```

pub mod app;
pub mod command;
pub mod config;
pub mod doodad;
pub mod doodads;
pub mod download;
pub mod event;
pub mod input;
pub mod prelude;
pub mod runtime;
pub mod surface;
