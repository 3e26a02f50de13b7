//! Timers and mutation observers
//!
//! Hosts do not call back into the lock logic directly. Every registration
//! carries an owner key (the target identifier) and a [`Trigger`]; when the
//! work is due the host hands out a [`Wakeup`] that the embedder routes to
//! [`crate::Registry::dispatch`].

use std::time::Duration;

use super::{DocId, ObserverHandle, TimerHandle};

/// Why a reconciliation cycle was woken up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The observed document changed structurally or in its attributes
    Mutation,
    /// The backstop polling interval elapsed
    Poll,
    /// The grace window for a failed resolution elapsed
    AlertDeadline,
}

/// A due trigger for the reconciler registered under `owner`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wakeup {
    pub owner: String,
    pub trigger: Trigger,
}

pub trait Scheduler {
    /// Fire `trigger` once after `delay`
    fn set_timeout(&mut self, owner: &str, trigger: Trigger, delay: Duration) -> TimerHandle;

    /// Fire `trigger` every `period` until cleared
    fn set_interval(&mut self, owner: &str, trigger: Trigger, period: Duration) -> TimerHandle;

    /// Cancel a timer; clearing an unknown or fired timer is a no-op
    fn clear_timer(&mut self, handle: TimerHandle);

    /// Fire [`Trigger::Mutation`] whenever the subtree of `doc` changes
    /// (child list or attributes)
    fn observe_mutations(&mut self, owner: &str, doc: DocId) -> ObserverHandle;

    /// Disconnect an observer; disconnecting twice is a no-op
    fn disconnect_observer(&mut self, handle: ObserverHandle);
}
