use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Report;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// An action that can be performed by a command.
///
/// Actions are what a finished command hands back to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<Msg> {
    /// Send a message to the application's update function.
    ///
    /// This is the most common action, used to communicate results of
    /// asynchronous operations back to the application.
    Message(Msg),

    /// Request the application to quit.
    ///
    /// The runtime finishes the transition it is currently folding, then
    /// cancels every outstanding command and shuts down.
    Quit,
}

impl<Msg> Action<Msg> {
    /// Transform the message carried by this action, if any.
    pub fn map<T>(self, f: impl FnOnce(Msg) -> T) -> Action<T> {
        match self {
            Self::Message(msg) => Action::Message(f(msg)),
            Self::Quit => Action::Quit,
        }
    }
}

/// Why a command finished without producing an action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command observed the runtime's cancellation signal.
    ///
    /// Cancellation is cooperative teardown, never an error the application sees.
    #[error("command cancelled")]
    Cancelled,

    /// The command failed outside any error path its domain anticipated.
    ///
    /// The runtime turns this into an [`Event::Failure`](crate::event::Event::Failure)
    /// message instead of tearing down the loop.
    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    /// Build a [`CommandError::Failed`] from anything displayable.
    pub fn failed(error: impl fmt::Display) -> Self {
        Self::Failed(error.to_string())
    }
}

impl From<Report> for CommandError {
    fn from(report: Report) -> Self {
        Self::Failed(format!("{report:#}"))
    }
}

pub(crate) type Outcome<Msg> = Result<Option<Action<Msg>>, CommandError>;

pub(crate) type Unit<Msg> =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Outcome<Msg>> + Send>;

pub(crate) enum Kind<Msg> {
    /// A single unit of deferred work yielding at most one action.
    Unit(Unit<Msg>),
    /// Children start together; each delivers on its own schedule.
    Batch(Vec<Command<Msg>>),
    /// Children start one at a time, each after the previous one's
    /// message has been folded into the model.
    Sequence(Vec<Command<Msg>>),
}

/// A description of deferred, cancellable work.
///
/// A command is inert until the runtime schedules it. Once scheduled, every
/// unit of work inside it runs independently and yields at most one
/// [`Action`]: a message for `update`, a quit request, or nothing at all.
///
/// Commands are returned from [`Doodad::init`](crate::doodad::Doodad::init) and
/// [`Doodad::update`](crate::doodad::Doodad::update) and combined with
/// [`Command::batch`] and [`Command::sequence`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doodad::command::Command;
///
/// enum Message {
///     GotResult(i32),
///     Tick,
/// }
///
/// let cmd = Command::batch([
///     Command::perform(async { 42 }, Message::GotResult),
///     Command::tick(Duration::from_millis(16), |_| Message::Tick),
/// ]);
/// assert!(!cmd.is_none());
/// ```
pub struct Command<Msg> {
    pub(crate) kind: Option<Kind<Msg>>,
}

impl<Msg: Send + 'static> Command<Msg> {
    /// Create a command that does nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::Command;
    ///
    /// let cmd: Command<i32> = Command::none();
    /// assert!(cmd.is_none());
    /// ```
    #[must_use]
    pub const fn none() -> Self {
        Self { kind: None }
    }

    /// Returns `true` if scheduling this command would start no work.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.kind.is_none()
    }

    /// Create a command from work that observes cancellation itself.
    ///
    /// This is the general constructor. The closure receives the runtime's
    /// cancellation token and returns a future resolving to at most one
    /// message. Commands that own exclusive resources (sockets, files) use
    /// this so they can release them before reporting
    /// [`CommandError::Cancelled`].
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::{Command, CommandError};
    ///
    /// let cmd: Command<u32> = Command::task(|token| async move {
    ///     if token.is_cancelled() {
    ///         return Err(CommandError::Cancelled);
    ///     }
    ///     Ok(Some(7))
    /// });
    /// ```
    pub fn task<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<Msg>, CommandError>> + Send + 'static,
    {
        Self::unit(move |token| {
            f(token)
                .map(|outcome| outcome.map(|msg| msg.map(Action::Message)))
                .boxed()
        })
    }

    fn unit(
        f: impl FnOnce(CancellationToken) -> BoxFuture<'static, Outcome<Msg>> + Send + 'static,
    ) -> Self {
        Self {
            kind: Some(Kind::Unit(Box::new(f))),
        }
    }

    /// Create a command from a future that produces a message.
    ///
    /// The future is dropped as soon as the runtime raises its cancellation
    /// signal.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::Command;
    ///
    /// let cmd = Command::future(async { 42 });
    /// ```
    pub fn future(future: impl Future<Output = Msg> + Send + 'static) -> Self {
        Self::task(move |token| async move {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(CommandError::Cancelled),
                msg = future => Ok(Some(msg)),
            }
        })
    }

    /// Perform an asynchronous operation and convert its result to a message.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::Command;
    ///
    /// async fn fetch_data() -> String {
    ///     "data".to_string()
    /// }
    ///
    /// enum Message {
    ///     DataReceived(String),
    /// }
    ///
    /// let cmd = Command::perform(fetch_data(), Message::DataReceived);
    /// ```
    pub fn perform<A>(
        future: impl Future<Output = A> + Send + 'static,
        f: impl FnOnce(A) -> Msg + Send + 'static,
    ) -> Self {
        Self::future(future.map(f))
    }

    /// Create a command that performs a single action immediately.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::{Action, Command};
    ///
    /// let quit: Command<i32> = Command::effect(Action::Quit);
    /// let send = Command::effect(Action::Message(42));
    /// ```
    pub fn effect(action: Action<Msg>) -> Self {
        Self::unit(move |_| future::ready(Ok(Some(action))).boxed())
    }

    /// Deliver an already-known message without any delay.
    pub fn emit(msg: Msg) -> Self {
        Self::effect(Action::Message(msg))
    }

    /// Ask the runtime to shut down once the current transition settles.
    pub fn quit() -> Self {
        Self::effect(Action::Quit)
    }

    /// Produce a single message after `duration` has elapsed.
    ///
    /// A tick fires once. Recurring work is built by returning a fresh tick
    /// from the `update` arm that handles the delivered message, usually
    /// stamped with a generation [`Tag`](crate::doodad::Tag) so superseded
    /// ticks can be dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use doodad::command::Command;
    ///
    /// enum Message {
    ///     Frame,
    /// }
    ///
    /// let cmd = Command::tick(Duration::from_millis(16), |_| Message::Frame);
    /// ```
    pub fn tick(duration: Duration, f: impl FnOnce(Instant) -> Msg + Send + 'static) -> Self {
        Self::task(move |token| async move {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(CommandError::Cancelled),
                () = sleep(duration) => Ok(Some(f(Instant::now()))),
            }
        })
    }

    /// Batch multiple commands into a single command.
    ///
    /// All commands start concurrently and each one's message is delivered as
    /// soon as it is ready: a batch never waits for siblings and imposes no
    /// order between them. Commands that are `Command::none()` are filtered out.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::Command;
    ///
    /// enum Message {
    ///     First(i32),
    ///     Second(String),
    /// }
    ///
    /// let cmd = Command::batch(vec![
    ///     Command::perform(async { 1 }, Message::First),
    ///     Command::perform(async { "data".to_string() }, Message::Second),
    ///     Command::none(), // This will be filtered out
    /// ]);
    /// ```
    pub fn batch(commands: impl IntoIterator<Item = Self>) -> Self {
        Self::combine(commands, Kind::Batch)
    }

    /// Run commands strictly one after another.
    ///
    /// The first command starts immediately. The next one starts only after
    /// the previous one's message has been folded into the model by `update`
    /// (or, if it produced nothing, after it finished).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use doodad::command::Command;
    ///
    /// enum Message {
    ///     Shown,
    /// }
    ///
    /// // Show a final frame for half a second, then quit.
    /// let cmd = Command::sequence([
    ///     Command::tick(Duration::from_millis(500), |_| Message::Shown),
    ///     Command::quit(),
    /// ]);
    /// ```
    pub fn sequence(commands: impl IntoIterator<Item = Self>) -> Self {
        Self::combine(commands, Kind::Sequence)
    }

    fn combine(commands: impl IntoIterator<Item = Self>, kind: fn(Vec<Self>) -> Kind<Msg>) -> Self {
        let mut commands: Vec<_> = commands.into_iter().filter(|cmd| !cmd.is_none()).collect();

        if commands.len() > 1 {
            Self {
                kind: Some(kind(commands)),
            }
        } else {
            commands.pop().unwrap_or_else(Self::none)
        }
    }

    /// Transform every message this command can produce.
    ///
    /// Container doodads use this to re-wrap a child's command so its
    /// messages come back addressed to the child.
    ///
    /// # Examples
    ///
    /// ```
    /// use doodad::command::Command;
    ///
    /// enum Message {
    ///     Child(u32),
    /// }
    ///
    /// let child: Command<u32> = Command::future(async { 1 });
    /// let cmd: Command<Message> = child.map(Message::Child);
    /// ```
    pub fn map<T: Send + 'static>(self, f: impl Fn(Msg) -> T + Send + Sync + 'static) -> Command<T> {
        let f: Arc<dyn Fn(Msg) -> T + Send + Sync> = Arc::new(f);
        self.map_shared(&f)
    }

    fn map_shared<T: Send + 'static>(self, f: &Arc<dyn Fn(Msg) -> T + Send + Sync>) -> Command<T> {
        let kind = self.kind.map(|kind| match kind {
            Kind::Unit(unit) => {
                let f = Arc::clone(f);
                Kind::Unit(Box::new(move |token| {
                    unit(token)
                        .map(move |outcome| outcome.map(|action| action.map(|action| action.map(&*f))))
                        .boxed()
                }))
            }
            Kind::Batch(children) => {
                Kind::Batch(children.into_iter().map(|child| child.map_shared(f)).collect())
            }
            Kind::Sequence(children) => {
                Kind::Sequence(children.into_iter().map(|child| child.map_shared(f)).collect())
            }
        });

        Command { kind }
    }
}

impl<Msg> fmt::Debug for Command<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            None => f.write_str("Command::None"),
            Some(Kind::Unit(_)) => f.write_str("Command::Unit"),
            Some(Kind::Batch(children)) => f.debug_tuple("Command::Batch").field(children).finish(),
            Some(Kind::Sequence(children)) => {
                f.debug_tuple("Command::Sequence").field(children).finish()
            }
        }
    }
}

/// Runs a command tree outside the runtime, in place, returning every action in
/// completion order. Sequence members run back to back without an `update`
/// in between.
#[cfg(test)]
pub(crate) fn collect<Msg: Send + 'static>(
    cmd: Command<Msg>,
    token: CancellationToken,
) -> BoxFuture<'static, Vec<Outcome<Msg>>> {
    async move {
        match cmd.kind {
            None => vec![],
            Some(Kind::Unit(unit)) => vec![unit(token).await],
            Some(Kind::Batch(children)) => {
                let runs = children.into_iter().map(|child| collect(child, token.clone()));
                future::join_all(runs).await.into_iter().flatten().collect()
            }
            Some(Kind::Sequence(children)) => {
                let mut outcomes = vec![];
                for child in children {
                    outcomes.extend(collect(child, token.clone()).await);
                }
                outcomes
            }
        }
    }
    .boxed()
}
