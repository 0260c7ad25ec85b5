//! Coroutine manager.
//!
//! This module contains the scheduling core of the crate:
//! - `core`: the [`Coroutines`] manager and its yield/resume protocol,
//! - `thread`: logical thread identities and completion,
//! - `builder`: manager configuration,
//! - `state`: the parking states recorded in the suspended table.
//!
//! Every logical thread runs on its own OS thread, but must hold the
//! manager's run lock to execute application code. The lock changes hands
//! only when the holder returns or yields, so logical threads appear to run
//! one at a time, in the order in which they were created and resumed.

pub(crate) mod builder;
pub(crate) mod core;
pub(crate) mod state;
pub(crate) mod thread;

pub use builder::CoroutinesBuilder;
pub use self::core::Coroutines;
pub use thread::{Thread, ThreadId};
