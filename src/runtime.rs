pub(crate) mod executor;

use std::time::Duration;

use color_eyre::eyre::Result;
use ratatui::Terminal;
use ratatui::prelude::Backend;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::executor::{Delivery, Executor, settle};
use crate::command::Action;
use crate::config::RuntimeConfig;
use crate::doodad::{Application, Doodad, IdAllocator};
use crate::event::Event;
use crate::input::InputReader;

/// Drives an [`Application`]: owns the only live model, folds every message
/// into it one at a time, runs commands concurrently, and redraws after each
/// settled burst of transitions.
///
/// # Example
///
/// ```rust,no_run
/// # use doodad::prelude::*;
/// # use doodad::input::CrosstermInput;
/// # struct App;
/// # #[derive(Debug)] struct Message(Event);
/// # impl From<Event> for Message { fn from(e: Event) -> Self { Self(e) } }
/// # impl Doodad for App {
/// #     type Message = Message;
/// #     fn update(self, _: Message) -> (Self, Command<Message>) { (self, Command::quit()) }
/// #     fn view(&self, _: &mut dyn Surface) {}
/// # }
/// # impl Application for App {
/// #     type Flags = ();
/// #     fn new(_: (), _: &IdAllocator) -> Self { App }
/// # }
/// # async fn run() -> color_eyre::Result<()> {
/// let runtime = Runtime::<App>::new(()).with_input(CrosstermInput::new());
///
/// let mut terminal = ratatui::init();
/// let result = runtime.run(&mut terminal).await;
/// ratatui::restore();
///
/// let _app = result?;
/// # Ok(())
/// # }
/// ```
pub struct Runtime<A: Application> {
    app: A,
    ids: IdAllocator,
    config: RuntimeConfig,
    input: Option<Box<dyn InputReader>>,
}

enum Wake<Msg> {
    Delivery(Option<Delivery<Msg>>),
    Interrupt,
}

impl<A> Runtime<A>
where
    A: Application,
    A::Message: From<Event>,
{
    pub fn new(flags: A::Flags) -> Self {
        Self::with_config(flags, RuntimeConfig::default())
    }

    pub fn with_config(flags: A::Flags, config: RuntimeConfig) -> Self {
        let ids = IdAllocator::new();
        let app = A::new(flags, &ids);

        Self {
            app,
            ids,
            config,
            input: None,
        }
    }

    /// Attach the reader the input worker polls.
    #[must_use]
    pub fn with_input(self, reader: impl InputReader) -> Self {
        Self {
            input: Some(Box::new(reader)),
            ..self
        }
    }

    /// The allocator the application was constructed with.
    pub const fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Run until the application quits or the process is interrupted.
    ///
    /// Returns the final model once every outstanding command has observed
    /// cancellation, or once [`RuntimeConfig::shutdown_grace`] has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails.
    pub async fn run<B: Backend>(self, terminal: &mut Terminal<B>) -> Result<A> {
        let Self {
            app, config, input, ..
        } = self;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = Executor::new(tx, CancellationToken::new());

        if let Some(reader) = input {
            executor.spawn_worker(poll_input(reader, executor.clone(), config.input_poll_interval));
        }
        executor.spawn(app.init());

        let interrupt = interrupted(config.handle_interrupt);
        tokio::pin!(interrupt);

        let mut model = app;
        let mut quitting = false;
        let mut outcome = draw(terminal, &model);

        while outcome.is_ok() && !quitting {
            let wake = tokio::select! {
                () = &mut interrupt => Wake::Interrupt,
                delivery = rx.recv() => Wake::Delivery(delivery),
            };

            let mut next = match wake {
                Wake::Delivery(Some(delivery)) => Some(delivery),
                Wake::Delivery(None) => break,
                Wake::Interrupt => {
                    info!("interrupted");
                    break;
                }
            };

            // Fold everything already queued before paying for a redraw
            while let Some(delivery) = next.take() {
                let (folded, quit) = fold(model, delivery, &executor);
                model = folded;
                if quit {
                    quitting = true;
                    break;
                }
                next = rx.try_recv().ok();
            }

            outcome = draw(terminal, &model);
        }

        // Late deliveries are dropped; their acks release waiting sequences
        rx.close();
        while rx.try_recv().is_ok() {}

        if !executor.shutdown(config.shutdown_grace).await {
            warn!(grace = ?config.shutdown_grace, "commands still running after shutdown grace");
        }
        debug!("runtime stopped");

        outcome.map(|()| model)
    }
}

fn fold<A>(model: A, delivery: Delivery<A::Message>, executor: &Executor<A::Message>) -> (A, bool)
where
    A: Doodad,
    A::Message: From<Event>,
{
    let Delivery { action, ack } = delivery;

    let folded = match action {
        Action::Message(msg) => {
            let (model, cmd) = model.update(msg);
            executor.spawn(cmd);
            (model, false)
        }
        Action::Quit => {
            info!("quit requested");
            (model, true)
        }
    };

    settle(ack);
    folded
}

fn draw<A: Doodad, B: Backend>(terminal: &mut Terminal<B>, model: &A) -> Result<()> {
    terminal.draw(|frame| model.view(frame.buffer_mut()))?;
    Ok(())
}

async fn interrupted(enabled: bool) {
    if enabled && tokio::signal::ctrl_c().await.is_ok() {
        return;
    }
    std::future::pending::<()>().await;
}

async fn poll_input<Msg>(mut reader: Box<dyn InputReader>, executor: Executor<Msg>, interval: Duration)
where
    Msg: From<Event> + Send + 'static,
{
    let token = executor.token().clone();

    while !token.is_cancelled() {
        match reader.poll_next(&token) {
            Ok(Some(event)) => {
                executor.send(Action::Message(Msg::from(event)));
                // A reader with a backlog must not starve the loop on a single thread
                tokio::task::yield_now().await;
            }
            Ok(None) => {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = sleep(interval) => {}
                }
            }
            Err(error) => {
                warn!(%error, "input reader failed");
                executor.send(Action::Message(Msg::from(Event::Failure {
                    description: format!("input: {error}"),
                })));
                break;
            }
        }
    }
}
