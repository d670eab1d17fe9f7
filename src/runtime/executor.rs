use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use crate::command::{Action, Command, CommandError, Kind, Unit};
use crate::event::Event;

/// One action on its way to the dispatch loop.
pub(crate) struct Delivery<Msg> {
    pub(crate) action: Action<Msg>,
    /// Present when a sequence is waiting for this action to be folded.
    pub(crate) ack: Option<oneshot::Sender<()>>,
}

/// Tell a waiting sequence that its message has been folded.
pub(crate) fn settle(ack: Option<oneshot::Sender<()>>) {
    if let Some(ack) = ack {
        let _ = ack.send(());
    }
}

/// Schedules command trees on tokio tasks.
///
/// Every unit of work runs in its own task and reports back over the
/// dispatch loop's unbounded channel. One cancellation token reaches every
/// unit; the task tracker lets shutdown wait for them.
pub(crate) struct Executor<Msg> {
    tx: mpsc::UnboundedSender<Delivery<Msg>>,
    token: CancellationToken,
    tracker: TaskTracker,
}

impl<Msg> Clone for Executor<Msg> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            token: self.token.clone(),
            tracker: self.tracker.clone(),
        }
    }
}

impl<Msg> Executor<Msg>
where
    Msg: From<Event> + Send + 'static,
{
    pub(crate) fn new(tx: mpsc::UnboundedSender<Delivery<Msg>>, token: CancellationToken) -> Self {
        Self {
            tx,
            token,
            tracker: TaskTracker::new(),
        }
    }

    pub(crate) const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Start a command. Batch members each get their own task.
    pub(crate) fn spawn(&self, command: Command<Msg>) {
        let Some(kind) = command.kind else {
            return;
        };

        if self.token.is_cancelled() {
            debug!("dropping command scheduled after shutdown");
            return;
        }

        match kind {
            Kind::Batch(children) => {
                for child in children {
                    self.spawn(child);
                }
            }
            kind => {
                self.tracker.spawn(self.drive(kind, false));
            }
        }
    }

    /// Run a long-lived worker under the same shutdown tracking as commands.
    pub(crate) fn spawn_worker(&self, worker: impl Future<Output = ()> + Send + 'static) {
        self.tracker.spawn(worker);
    }

    /// Hand an action to the dispatch loop without waiting for it to be folded.
    pub(crate) fn send(&self, action: Action<Msg>) {
        if self.tx.send(Delivery { action, ack: None }).is_err() {
            trace!("dispatch loop gone, dropping action");
        }
    }

    /// Raise cancellation and wait up to `grace` for every task to finish.
    ///
    /// Returns `false` if some task was still running when the grace period ran out.
    pub(crate) async fn shutdown(&self, grace: Duration) -> bool {
        self.token.cancel();
        self.tracker.close();
        debug!(in_flight = self.tracker.len(), "waiting for commands to wind down");
        timeout(grace, self.tracker.wait()).await.is_ok()
    }

    /// `ordered` is set inside a sequence: every produced action is acknowledged
    /// by the loop before the future completes.
    fn drive(&self, kind: Kind<Msg>, ordered: bool) -> BoxFuture<'static, ()> {
        let this = self.clone();

        async move {
            match kind {
                Kind::Unit(unit) => this.run_unit(unit, ordered).await,
                Kind::Batch(children) => {
                    let handles: Vec<_> = children
                        .into_iter()
                        .filter_map(|child| child.kind)
                        .map(|kind| this.tracker.spawn(this.drive(kind, ordered)))
                        .collect();

                    if ordered {
                        join_all(handles).await;
                    }
                }
                Kind::Sequence(children) => {
                    for kind in children.into_iter().filter_map(|child| child.kind) {
                        if this.token.is_cancelled() {
                            break;
                        }
                        this.drive(kind, true).await;
                    }
                }
            }
        }
        .boxed()
    }

    async fn run_unit(&self, unit: Unit<Msg>, ordered: bool) {
        let token = self.token.child_token();
        let outcome = AssertUnwindSafe(async move { unit(token).await })
            .catch_unwind()
            .await;

        let action = match outcome {
            Ok(Ok(Some(action))) => action,
            Ok(Ok(None)) => return,
            Ok(Err(CommandError::Cancelled)) => {
                trace!("command observed cancellation");
                return;
            }
            Ok(Err(CommandError::Failed(description))) => {
                warn!(%description, "command failed");
                Action::Message(Msg::from(Event::Failure { description }))
            }
            Err(payload) => {
                let description = panic_description(payload.as_ref());
                warn!(%description, "command panicked");
                Action::Message(Msg::from(Event::Failure { description }))
            }
        };

        if !ordered {
            self.send(action);
            return;
        }

        let (ack, folded) = oneshot::channel();
        if self.tx.send(Delivery { action, ack: Some(ack) }).is_ok() {
            // Err means the loop dropped the delivery while shutting down
            let _ = folded.await;
        }
    }
}

pub(crate) fn panic_description(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match detail {
        Some(detail) => format!("command panicked: {detail}"),
        None => "command panicked".to_string(),
    }
}
