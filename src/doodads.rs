//! Reference doodads.
//!
//! Each of these schedules recurring work with [`Command::tick`](crate::command::Command::tick)
//! and guards it with a generation [`Tag`](crate::doodad::Tag): a stop, reset,
//! refocus or retarget moves the tag forward and every tick already in flight
//! is dropped on delivery.

pub mod blink;
pub mod clock;
pub mod progress;
pub mod spring;
