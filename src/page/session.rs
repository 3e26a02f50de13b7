//! Event loop glue between the in-memory page and a registry

use crate::platform::Wakeup;
use crate::reconcile::{Phase, Reconciler};
use crate::registry::Registry;
use crate::variables::{Target, VariableSource};
use crate::{Error, LockConfig, Result};

use super::{Page, DEFAULT_STEP_LIMIT};

/// Owns a page and a registry and plays the role of the browser's event
/// loop: due timers and queued mutation records are delivered one at a time.
#[derive(Debug)]
pub struct Session {
    page: Page,
    registry: Registry,
    step_limit: usize,
    delivered: usize,
}

impl Session {
    pub fn new(page: Page, config: LockConfig) -> Result<Self> {
        Ok(Self {
            page,
            registry: Registry::new(config)?,
            step_limit: DEFAULT_STEP_LIMIT,
            delivered: 0,
        })
    }

    /// Cap on wakeups delivered by a single [`Session::advance`] or flush
    pub fn set_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::PageError("step limit requires at least 1 step".into()));
        }
        self.step_limit = max_steps;
        Ok(())
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn reconciler(&self, target_id: &str) -> Option<&Reconciler> {
        self.registry.get(target_id)
    }

    /// Total wakeups delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Install a target (as re-running the host script would) and settle
    /// the mutations it causes
    pub fn install(&mut self, target: Target) -> Result<Phase> {
        let phase = self.registry.install(&mut self.page, target).phase();
        self.flush_mutations()?;
        Ok(phase)
    }

    /// Install the target named by the player's variables
    pub fn install_from_variables(&mut self, sources: &[Box<dyn VariableSource>]) -> Result<Phase> {
        let phase = self.registry.install_from_variables(&mut self.page, sources).phase();
        self.flush_mutations()?;
        Ok(phase)
    }

    fn deliver(&mut self, wakeup: &Wakeup, steps: &mut usize) -> Result<()> {
        *steps += 1;
        if *steps > self.step_limit {
            return Err(Error::PageError(format!(
                "exceeded max wakeup steps ({}) at {}ms; next wakeup {:?} for {}",
                self.step_limit,
                self.page.now_ms(),
                wakeup.trigger,
                wakeup.owner
            )));
        }
        self.delivered += 1;
        self.registry.dispatch(&mut self.page, wakeup);
        Ok(())
    }

    fn drain_mutations(&mut self, steps: &mut usize) -> Result<()> {
        loop {
            let wakeups = self.page.clock.take_mutation_wakeups();
            if wakeups.is_empty() {
                return Ok(());
            }
            for w in &wakeups {
                self.deliver(w, steps)?;
            }
        }
    }

    /// Deliver queued mutation wakeups until none remain. Returns the number delivered.
    pub fn flush_mutations(&mut self) -> Result<usize> {
        let mut steps = 0;
        self.drain_mutations(&mut steps)?;
        Ok(steps)
    }

    /// Move the virtual clock forward by `ms`, delivering every timer that
    /// falls due (in order) and the mutations each one causes
    pub fn advance(&mut self, ms: u64) -> Result<usize> {
        let until = self.page.now_ms().saturating_add(ms);
        let mut steps = 0;
        self.drain_mutations(&mut steps)?;
        while let Some(wakeup) = self.page.clock.pop_due(until) {
            self.deliver(&wakeup, &mut steps)?;
            self.drain_mutations(&mut steps)?;
        }
        self.page.clock.advance_to(until);
        log::trace!("advanced to {}ms, {} wakeup(s)", until, steps);
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Trigger;

    const PAGE: &str = r#"<html><head></head><body><div data-model-id="v"><video></video></div></body></html>"#;

    #[test]
    fn polling_runs_every_interval() {
        let mut s = Session::new(Page::from_html(PAGE), LockConfig::default()).unwrap();
        s.install(Target::new("v", true)).unwrap();
        let before = s.reconciler("v").unwrap().cycles();
        let delivered = s.advance(900).unwrap();
        assert_eq!(delivered, 3);
        assert_eq!(s.reconciler("v").unwrap().cycles(), before + 3);
        assert_eq!(s.page().now_ms(), 900);
    }

    #[test]
    fn runaway_pumps_are_reported() {
        let mut s = Session::new(Page::from_html(PAGE), LockConfig::default()).unwrap();
        s.install(Target::new("v", true)).unwrap();
        s.set_step_limit(2).unwrap();
        let err = s.advance(3_000).unwrap_err();
        assert!(matches!(err, Error::PageError(_)));
        assert!(s.set_step_limit(0).is_err());
    }

    #[test]
    fn own_style_mutation_settles() {
        let mut s = Session::new(Page::from_html(PAGE), LockConfig::default()).unwrap();
        s.install(Target::new("v", true)).unwrap();
        assert_eq!(s.flush_mutations().unwrap(), 0);
        assert!(s.reconciler("v").unwrap().state().is_armed(Trigger::Mutation));
    }
}
