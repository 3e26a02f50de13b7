//! Host surface: DOM access, media hooks, timers/observers and alerts
//!
//! The lock logic never talks to a browser directly. Backends implement the
//! traits in this module (the in-memory [`crate::page::Page`] is one) and the
//! core works against the composite [`Host`] trait.

pub mod dom;
pub mod media;
pub mod scheduler;

pub use dom::Dom;
pub use media::{MediaControl, MediaEvent, MediaHooks, MediaListener, MediaState};
pub use scheduler::{Scheduler, Trigger, Wakeup};

use thiserror::Error;

/// Handle to a browsing context (a window or a frame's window)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub usize);

/// Handle to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub usize);

/// Handle to an element node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Handle to a pending one-shot or repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Handle to a connected mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// Handle to a bound media event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A read blocked by a cross-origin security boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("blocked a frame from accessing a cross-origin {0}")]
pub struct SecurityError(pub String);

/// Developer-facing alert presentation
pub trait AlertSink {
    fn alert(&mut self, message: &str);
}

/// Everything the lock logic needs from its environment.
///
/// Implemented automatically for any type providing the four surfaces.
pub trait Host: Dom + MediaHooks + Scheduler + AlertSink {}

impl<T: Dom + MediaHooks + Scheduler + AlertSink> Host for T {}
