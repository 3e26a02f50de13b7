//! Virtual clock, timer queue and mutation observers for the in-memory page

use std::time::Duration;

use crate::platform::{DocId, ObserverHandle, Scheduler, TimerHandle, Trigger, Wakeup};

use super::Page;

/// Maximum wakeups a single pump may deliver before it is considered runaway
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// A timer that has not fired (or, for intervals, will fire again)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub handle: TimerHandle,
    pub owner: String,
    pub trigger: Trigger,
    pub due_at: u64,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    timer: PendingTimer,
    order: u64,
}

#[derive(Debug, Clone)]
struct Observer {
    handle: ObserverHandle,
    owner: String,
    doc: DocId,
    pending: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Clock {
    now_ms: u64,
    next_id: u64,
    next_order: u64,
    timers: Vec<ScheduledTimer>,
    observers: Vec<Observer>,
}

impl Clock {
    pub(crate) fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn next_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn push(&mut self, timer: PendingTimer) {
        self.next_order += 1;
        self.timers.push(ScheduledTimer {
            timer,
            order: self.next_order,
        });
    }

    fn schedule(&mut self, owner: &str, trigger: Trigger, delay: Duration, repeat: bool) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        let ms = delay.as_millis() as u64;
        // a zero period would starve the clock
        let interval_ms = repeat.then(|| ms.max(1));
        self.push(PendingTimer {
            handle,
            owner: owner.to_string(),
            trigger,
            due_at: self.now_ms + interval_ms.unwrap_or(ms),
            interval_ms,
        });
        handle
    }

    fn clear(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.timer.handle != handle);
    }

    fn observe(&mut self, owner: &str, doc: DocId) -> ObserverHandle {
        let handle = ObserverHandle(self.next_handle());
        self.observers.push(Observer {
            handle,
            owner: owner.to_string(),
            doc,
            pending: false,
        });
        handle
    }

    fn disconnect(&mut self, handle: ObserverHandle) {
        self.observers.retain(|o| o.handle != handle);
    }

    pub(crate) fn record_mutation(&mut self, doc: DocId) {
        for o in self.observers.iter_mut().filter(|o| o.doc == doc) {
            o.pending = true;
        }
    }

    /// One wakeup per observer with queued mutation records
    pub(crate) fn take_mutation_wakeups(&mut self) -> Vec<Wakeup> {
        self.observers
            .iter_mut()
            .filter(|o| o.pending)
            .map(|o| {
                o.pending = false;
                Wakeup {
                    owner: o.owner.clone(),
                    trigger: Trigger::Mutation,
                }
            })
            .collect()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Intervals are re-queued.
    pub(crate) fn pop_due(&mut self, until: u64) -> Option<Wakeup> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.timer.due_at <= until)
            .min_by_key(|(_, t)| (t.timer.due_at, t.order))
            .map(|(i, _)| i)?;
        let scheduled = self.timers.remove(idx);
        let mut timer = scheduled.timer;
        if timer.due_at > self.now_ms {
            self.now_ms = timer.due_at;
        }
        let wakeup = Wakeup {
            owner: timer.owner.clone(),
            trigger: timer.trigger,
        };
        if let Some(period) = timer.interval_ms {
            timer.due_at += period;
            self.push(timer);
        }
        Some(wakeup)
    }

    pub(crate) fn advance_to(&mut self, ms: u64) {
        if ms > self.now_ms {
            self.now_ms = ms;
        }
    }

    pub(crate) fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self.timers.clone();
        timers.sort_by_key(|t| (t.timer.due_at, t.order));
        timers.into_iter().map(|t| t.timer).collect()
    }

    pub(crate) fn active_observers(&self) -> usize {
        self.observers.len()
    }
}

impl Scheduler for Page {
    fn set_timeout(&mut self, owner: &str, trigger: Trigger, delay: Duration) -> TimerHandle {
        self.clock.schedule(owner, trigger, delay, false)
    }

    fn set_interval(&mut self, owner: &str, trigger: Trigger, period: Duration) -> TimerHandle {
        self.clock.schedule(owner, trigger, period, true)
    }

    fn clear_timer(&mut self, handle: TimerHandle) {
        self.clock.clear(handle);
    }

    fn observe_mutations(&mut self, owner: &str, doc: DocId) -> ObserverHandle {
        self.clock.observe(owner, doc)
    }

    fn disconnect_observer(&mut self, handle: ObserverHandle) {
        self.clock.disconnect(handle);
    }
}
