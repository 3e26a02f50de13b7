//! Reconciliation: keep the lock in force while the host re-renders
//!
//! Course players rebuild their DOM for layers, hover states and slide
//! transitions, so an element found once may be gone a moment later. A
//! [`Reconciler`] re-runs discovery and enforcement on every trigger it has
//! armed: a mutation observer on the executing document and a polling
//! interval for changes the observer cannot see (re-parenting inside other
//! frames). Both feed the same [`Reconciler::apply`] entry point, and every
//! step of a cycle is idempotent, so overlapping triggers are harmless.

use std::time::Duration;

use crate::alert::AlertNotifier;
use crate::annotate::{annotate, deannotate, style_id};
use crate::collect::collect_documents;
use crate::lock::LockController;
use crate::platform::{DocId, Host, ObserverHandle, Scheduler, TimerHandle, Trigger, Wakeup};
use crate::resolve::{resolve_video, ResolvedVideo};
use crate::variables::Target;
use crate::{Error, LockConfig};

/// Registry key used when the host supplied no identifier
pub const UNCONFIGURED_KEY: &str = "__noid__";

/// Registry key for a target identifier
pub fn reconciler_key(target_id: &str) -> &str {
    if target_id.is_empty() {
        UNCONFIGURED_KEY
    } else {
        target_id
    }
}

/// A source of reconciliation wakeups that can be armed and disarmed.
///
/// Arming an armed source and disarming a disarmed one are no-ops.
pub trait TriggerSource {
    /// The trigger this source delivers
    fn trigger(&self) -> Trigger;

    fn arm(&mut self, scheduler: &mut dyn Scheduler, owner: &str, doc: DocId);

    fn disarm(&mut self, scheduler: &mut dyn Scheduler);

    fn is_armed(&self) -> bool;
}

/// Observes child-list and attribute changes on one document
#[derive(Debug, Default)]
pub struct MutationTrigger {
    handle: Option<ObserverHandle>,
}

impl MutationTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerSource for MutationTrigger {
    fn trigger(&self) -> Trigger {
        Trigger::Mutation
    }

    fn arm(&mut self, scheduler: &mut dyn Scheduler, owner: &str, doc: DocId) {
        if self.handle.is_none() {
            self.handle = Some(scheduler.observe_mutations(owner, doc));
            log::debug!("{}: observing mutations on {:?}", owner, doc);
        }
    }

    fn disarm(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(h) = self.handle.take() {
            scheduler.disconnect_observer(h);
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

/// Fixed-interval polling backstop
#[derive(Debug)]
pub struct IntervalTrigger {
    period: Duration,
    handle: Option<TimerHandle>,
}

impl IntervalTrigger {
    pub fn new(period: Duration) -> Self {
        Self { period, handle: None }
    }
}

impl TriggerSource for IntervalTrigger {
    fn trigger(&self) -> Trigger {
        Trigger::Poll
    }

    fn arm(&mut self, scheduler: &mut dyn Scheduler, owner: &str, _doc: DocId) {
        if self.handle.is_none() {
            self.handle = Some(scheduler.set_interval(owner, Trigger::Poll, self.period));
            log::debug!("{}: polling every {:?}", owner, self.period);
        }
    }

    fn disarm(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(h) = self.handle.take() {
            scheduler.clear_timer(h);
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

/// Live handles owned by one reconciler
pub struct ReconciliationState {
    sources: Vec<Box<dyn TriggerSource>>,
    alert_timer: Option<TimerHandle>,
}

impl std::fmt::Debug for ReconciliationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationState")
            .field("armed", &self.sources.iter().filter(|s| s.is_armed()).map(|s| s.trigger()).collect::<Vec<_>>())
            .field("alert_timer", &self.alert_timer)
            .finish()
    }
}

impl ReconciliationState {
    pub fn new(sources: Vec<Box<dyn TriggerSource>>) -> Self {
        Self { sources, alert_timer: None }
    }

    /// Whether a source delivering `trigger` is armed; for
    /// [`Trigger::AlertDeadline`] whether the confirmation timer is pending
    pub fn is_armed(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::AlertDeadline => self.alert_timer.is_some(),
            t => self.sources.iter().any(|s| s.trigger() == t && s.is_armed()),
        }
    }

    /// True when no observer, interval or alert timer is live
    pub fn is_idle(&self) -> bool {
        self.alert_timer.is_none() && self.sources.iter().all(|s| !s.is_armed())
    }

    fn arm(&mut self, scheduler: &mut dyn Scheduler, owner: &str, doc: DocId) {
        for source in &mut self.sources {
            source.arm(scheduler, owner, doc);
        }
    }

    fn teardown(&mut self, scheduler: &mut dyn Scheduler) {
        for source in &mut self.sources {
            source.disarm(scheduler);
        }
        if let Some(h) = self.alert_timer.take() {
            scheduler.clear_timer(h);
        }
    }
}

/// Where a reconciler stands after its latest cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No video resolved yet (an alert confirmation may be pending)
    Unresolved,
    /// Video resolved and lock/annotation state matches the request
    Active,
    /// Unlocked and torn down; nothing runs until the next install
    Quiescent,
}

/// Drives discovery and enforcement for one target identifier
#[derive(Debug)]
pub struct Reconciler {
    target: Target,
    config: LockConfig,
    key: String,
    style_id: String,
    lock: LockController,
    alerts: AlertNotifier,
    state: ReconciliationState,
    phase: Phase,
    cycles: u64,
}

impl Reconciler {
    /// Reconciler with the standard mutation and polling triggers
    pub fn new(target: Target, config: LockConfig) -> Self {
        let sources: Vec<Box<dyn TriggerSource>> = vec![
            Box::new(MutationTrigger::new()),
            Box::new(IntervalTrigger::new(Duration::from_millis(config.poll_interval_ms))),
        ];
        Self::with_sources(target, config, sources)
    }

    /// Reconciler with caller-supplied trigger sources
    pub fn with_sources(target: Target, config: LockConfig, sources: Vec<Box<dyn TriggerSource>>) -> Self {
        let key = reconciler_key(&target.id).to_string();
        let style_id = style_id(&config.style_id_prefix, &target.id);
        Self {
            lock: LockController::new(config.tolerance_secs),
            alerts: AlertNotifier::new(),
            state: ReconciliationState::new(sources),
            phase: Phase::Unresolved,
            cycles: 0,
            target,
            config,
            key,
            style_id,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn lock_controller(&self) -> &LockController {
        &self.lock
    }

    pub fn alerts(&self) -> &AlertNotifier {
        &self.alerts
    }

    /// Number of apply cycles run so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Change the requested lock state; takes effect on the next cycle
    pub fn set_lock_requested(&mut self, lock_requested: bool) {
        self.target.lock_requested = lock_requested;
    }

    /// Run the first cycle and, when locking is requested, arm the triggers.
    /// A reconciler torn down by an earlier unlock is revived here.
    pub fn start<H: Host>(&mut self, host: &mut H) {
        if self.target.lock_requested && self.phase == Phase::Quiescent {
            self.phase = Phase::Unresolved;
        }
        self.apply(host);
        if self.target.lock_requested && self.target.is_configured() {
            let current = host.current_window();
            match host.window_document(current) {
                Ok(doc) => self.state.arm(host, &self.key, doc),
                Err(e) => log::warn!("{}: cannot observe executing document: {}", self.key, e),
            }
        }
    }

    /// Resolve the target's video across every reachable document
    pub fn resolve<H: Host>(&self, host: &H) -> Option<ResolvedVideo> {
        let docs = collect_documents(host, self.config.max_parent_hops, &self.config.frame_tag);
        resolve_video(host, &self.target.id, &docs, &self.config)
    }

    /// One reconciliation cycle
    pub fn apply<H: Host>(&mut self, host: &mut H) {
        self.cycles += 1;
        log::trace!("{}: cycle {}", self.key, self.cycles);

        if !self.target.is_configured() {
            self.alerts.notify(host, &Error::ConfigurationMissing);
            return;
        }

        self.lock.prune(host);

        let Some(found) = self.resolve(host) else {
            if self.state.alert_timer.is_none() {
                let delay = Duration::from_millis(self.config.alert_delay_ms);
                self.state.alert_timer = Some(host.set_timeout(&self.key, Trigger::AlertDeadline, delay));
            }
            self.phase = Phase::Unresolved;
            return;
        };

        self.alerts.reset();

        if self.target.lock_requested {
            annotate(host, found.document, &self.style_id);
            self.lock.lock(host, found.video);
            self.phase = Phase::Active;
        } else {
            deannotate(host, found.document, &self.style_id);
            self.lock.unlock(host, found.video);
            self.teardown(host);
        }
    }

    /// Handle a wakeup delivered by the host
    pub fn dispatch<H: Host>(&mut self, host: &mut H, trigger: Trigger) {
        match trigger {
            Trigger::Mutation | Trigger::Poll => self.apply(host),
            Trigger::AlertDeadline => self.confirm_unresolved(host),
        }
    }

    fn confirm_unresolved<H: Host>(&mut self, host: &mut H) {
        self.state.alert_timer = None;
        if self.resolve(host).is_none() {
            let err = if self.target.is_configured() {
                Error::ResolutionFailed(self.target.id.clone())
            } else {
                Error::ConfigurationMissing
            };
            self.alerts.notify(host, &err);
        }
    }

    /// Stop every trigger and release remaining locks
    pub fn teardown<H: Host>(&mut self, host: &mut H) {
        self.state.teardown(host);
        self.lock.unlock_all(host);
        self.phase = Phase::Quiescent;
        log::debug!("{}: reconciliation stopped", self.key);
    }

    /// Whether `wakeup` is addressed to this reconciler
    pub fn owns(&self, wakeup: &Wakeup) -> bool {
        wakeup.owner == self.key
    }
}
