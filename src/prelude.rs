//! Prelude module for convenient imports.
//!
//! ```
//! use doodad::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`Doodad`] and [`Application`] - The component contracts
//! - [`Command`] and [`Action`] - For performing side effects
//! - [`Id`], [`IdAllocator`], [`Tag`], [`Stamp`], [`Generational`] - Identity and staleness
//! - [`Event`], [`Key`], [`KeyPress`] - What the runtime delivers on its own behalf
//! - [`Surface`] - What views draw onto
//! - [`Runtime`] and [`RuntimeConfig`] - The dispatch loop
//! - [`CrosstermInput`] - The terminal input reader

pub use crate::command::{Action, Command, CommandError};
pub use crate::config::RuntimeConfig;
pub use crate::doodad::{Application, Doodad, Generational, Id, IdAllocator, Stamp, Tag};
pub use crate::event::{Event, Key, KeyPress, Modifiers};
pub use crate::input::{CrosstermInput, InputReader};
pub use crate::runtime::Runtime;
pub use crate::surface::Surface;
