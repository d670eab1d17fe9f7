use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::command::Command;
use crate::surface::Surface;

/// A stateful UI unit following the Elm Architecture.
///
/// A doodad is an immutable model value. `update` consumes the current value
/// and returns the next one, so no transition can observe a model it has
/// already replaced. Containers hold child doodads, delegate messages to the
/// child's `update`, and re-wrap the returned command with [`Command::map`].
///
/// # Example
///
/// ```
/// use doodad::prelude::*;
/// use ratatui::style::Style;
///
/// #[derive(Debug, Clone, Copy)]
/// enum Message {
///     Increment,
///     Reset,
/// }
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Counter {
///     value: u32,
/// }
///
/// impl Doodad for Counter {
///     type Message = Message;
///
///     fn update(self, msg: Message) -> (Self, Command<Message>) {
///         match msg {
///             Message::Increment => (Self { value: self.value + 1 }, Command::none()),
///             Message::Reset => (Self { value: 0 }, Command::none()),
///         }
///     }
///
///     fn view(&self, surface: &mut dyn Surface) {
///         surface.write_text(0, 0, &self.value.to_string(), Style::default());
///     }
/// }
///
/// let (counter, _) = Counter { value: 0 }.update(Message::Increment);
/// assert_eq!(counter.value, 1);
/// ```
pub trait Doodad: Sized {
    /// The messages this doodad reacts to.
    type Message: Send + 'static;

    /// Called once when the doodad enters the running system.
    fn init(&self) -> Command<Self::Message> {
        Command::none()
    }

    /// Fold one message into the model.
    ///
    /// Must be fast and free of I/O; side effects are returned as a command.
    /// Messages the doodad does not recognise, including messages addressed to
    /// another instance, must return the model unchanged with
    /// [`Command::none`].
    fn update(self, msg: Self::Message) -> (Self, Command<Self::Message>);

    /// Project the model onto the surface. Must not change the model.
    fn view(&self, surface: &mut dyn Surface);
}

/// The root doodad a [`Runtime`](crate::runtime::Runtime) drives.
pub trait Application: Doodad {
    /// Configuration data for constructing the application.
    ///
    /// Use `()` if no configuration is needed.
    type Flags: Send;

    /// Construct the initial model.
    ///
    /// `ids` is the runtime's identity allocator; pass it on to every child
    /// doodad that needs an [`Id`].
    fn new(flags: Self::Flags, ids: &IdAllocator) -> Self;
}

/// Identity of one doodad instance, used to route messages among
/// structurally identical siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u64);

impl Id {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing [`Id`]s.
///
/// Clones share one counter. Each runtime owns its own allocator, so tests
/// building models side by side never see each other's ids.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the next identity.
    #[must_use]
    pub fn allocate(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generation counter of a doodad instance.
///
/// A transition that must invalidate previously scheduled recurring work
/// (stop, reset, refocus, retarget) moves the tag forward. Messages stamped
/// with an older tag are then dropped on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tag(u64);

impl Tag {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The `(Id, Tag)` pair captured into a scheduled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    pub id: Id,
    pub tag: Tag,
}

impl Stamp {
    #[must_use]
    pub const fn new(id: Id, tag: Tag) -> Self {
        Self { id, tag }
    }
}

/// A doodad that schedules recurring work guarded by its generation tag.
pub trait Generational {
    fn id(&self) -> Id;

    fn tag(&self) -> Tag;

    /// The stamp to capture into the next scheduled message.
    fn stamp(&self) -> Stamp {
        Stamp::new(self.id(), self.tag())
    }

    /// Whether a delivered stamp still belongs to the newest lineage of work.
    fn is_current(&self, stamp: Stamp) -> bool {
        stamp == self.stamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        id: Id,
        tag: Tag,
    }

    impl Generational for Probe {
        fn id(&self) -> Id {
            self.id
        }

        fn tag(&self) -> Tag {
            self.tag
        }
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = IdAllocator::new();
        let first = ids.allocate();
        let second = ids.allocate();
        assert!(second > first);
    }

    #[test]
    fn test_cloned_allocators_share_counter() {
        let ids = IdAllocator::new();
        let shared = ids.clone();
        let a = ids.allocate();
        let b = shared.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_separate_allocators_are_isolated() {
        let a = IdAllocator::new().allocate();
        let b = IdAllocator::new().allocate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tag_only_moves_forward() {
        let tag = Tag::ZERO;
        assert!(tag.next() > tag);
        assert_eq!(tag.next().next().get(), 2);
        assert_eq!(Tag(u64::MAX).next(), Tag(u64::MAX));
    }

    #[test]
    fn test_stale_stamp_is_not_current() {
        let ids = IdAllocator::new();
        let probe = Probe {
            id: ids.allocate(),
            tag: Tag::ZERO,
        };
        let stamp = probe.stamp();
        assert!(probe.is_current(stamp));

        let retagged = Probe {
            tag: probe.tag.next(),
            ..probe
        };
        assert!(!retagged.is_current(stamp));

        let sibling = Probe {
            id: ids.allocate(),
            tag: Tag::ZERO,
        };
        assert!(!sibling.is_current(stamp));
    }

    #[test]
    fn test_id_display() {
        let id = IdAllocator::new().allocate();
        assert_eq!(id.to_string(), "#1");
    }
}
