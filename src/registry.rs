//! Per-identifier reconcilers that survive re-installation
//!
//! Authoring tools re-execute their trigger script whenever a variable
//! changes, so the lock for a target may be installed many times. The
//! registry keeps one [`Reconciler`] per identifier, so a later install
//! finds the handlers, style and timers created by an earlier one.

use std::collections::HashMap;

use crate::platform::{Host, Wakeup};
use crate::reconcile::{reconciler_key, Reconciler};
use crate::variables::{read_target, Target, VariableSource};
use crate::{LockConfig, Result};

#[derive(Debug, Default)]
pub struct Registry {
    config: LockConfig,
    reconcilers: HashMap<String, Reconciler>,
}

impl Registry {
    /// Registry using `config` for every target. Fails on invalid configuration.
    pub fn new(config: LockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reconcilers: HashMap::new(),
        })
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Install (or re-install) the lock for `target` and run its first cycle
    pub fn install<H: Host>(&mut self, host: &mut H, target: Target) -> &Reconciler {
        let key = reconciler_key(&target.id).to_string();
        log::info!("installing seek lock for {} (locked: {})", key, target.lock_requested);
        let config = &self.config;
        let reconciler = self
            .reconcilers
            .entry(key)
            .or_insert_with(|| Reconciler::new(target.clone(), config.clone()));
        reconciler.set_lock_requested(target.lock_requested);
        reconciler.start(host);
        reconciler
    }

    /// Read the target from the player's variables, then [`Registry::install`] it
    pub fn install_from_variables<H: Host>(&mut self, host: &mut H, sources: &[Box<dyn VariableSource>]) -> &Reconciler {
        let target = read_target(sources, &self.config);
        self.install(host, target)
    }

    /// Route a host wakeup to its reconciler. Returns false for unknown owners.
    pub fn dispatch<H: Host>(&mut self, host: &mut H, wakeup: &Wakeup) -> bool {
        match self.reconcilers.get_mut(&wakeup.owner) {
            Some(r) => {
                r.dispatch(host, wakeup.trigger);
                true
            }
            None => {
                log::debug!("ignoring wakeup for unknown target {}", wakeup.owner);
                false
            }
        }
    }

    /// Reconciler for a target identifier
    pub fn get(&self, target_id: &str) -> Option<&Reconciler> {
        self.reconcilers.get(reconciler_key(target_id))
    }

    pub fn len(&self) -> usize {
        self.reconcilers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reconcilers.is_empty()
    }
}

#[cfg(all(test, feature = "page"))]
mod tests {
    use super::*;
    use crate::page::Page;
    use crate::platform::Trigger;
    use crate::reconcile::Phase;
    use crate::variables::MapVariables;
    use serde_json::json;

    const PAGE: &str = r#"<html><head></head><body><div data-acc-id="vid1"><video></video></div></body></html>"#;

    #[test]
    fn reinstall_reuses_reconciler() {
        let mut page = Page::from_html(PAGE);
        let mut reg = Registry::new(LockConfig::default()).unwrap();
        reg.install(&mut page, Target::new("vid1", true));
        reg.install(&mut page, Target::new("vid1", true));
        assert_eq!(reg.len(), 1);
        assert_eq!(page.active_observers(), 1);
        let r = reg.install(&mut page, Target::new("vid1", false));
        assert_eq!(r.phase(), Phase::Quiescent);
        assert_eq!(page.active_observers(), 0);
        assert!(page.pending_timers().is_empty());
    }

    #[test]
    fn install_from_variables_reads_player() {
        let mut page = Page::from_html(PAGE);
        let mut reg = Registry::new(LockConfig::default()).unwrap();
        let sources: Vec<Box<dyn VariableSource>> =
            vec![Box::new(MapVariables::new("player").with("videoObjectId", json!("vid1")).with("videoLocked", json!(1)))];
        let r = reg.install_from_variables(&mut page, &sources);
        assert!(r.target().lock_requested);
        assert_eq!(r.phase(), Phase::Active);
    }

    #[test]
    fn unknown_wakeups_are_ignored() {
        let mut page = Page::from_html(PAGE);
        let mut reg = Registry::new(LockConfig::default()).unwrap();
        let stray = Wakeup {
            owner: "nobody".into(),
            trigger: Trigger::Poll,
        };
        assert!(!reg.dispatch(&mut page, &stray));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = LockConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(Registry::new(cfg).is_err());
    }
}
