//! Seek Lock
//!
//! Enforces a locked playback mode on one video embedded in a course player:
//! while locked, the viewer cannot seek past the furthest position reached by
//! normal playback. The player re-renders its DOM freely and may run inside
//! cross-origin frames, so the lock is re-established continuously rather
//! than attached once.
//!
//! # Features
//!
//! - **Host-agnostic**: the browser is reached only through the traits in
//!   [`platform`]; backends decide how DOM, media and timers are provided
//! - **Cross-origin tolerant**: blocked frame reads shrink the searched
//!   document set instead of failing
//! - **In-memory page** (`page` feature, default): a deterministic host built
//!   from HTML fixtures with a virtual clock, used by the test-suite
//!
//! # Example
//!
//! ```
//! use seeklock::page::{Page, Session};
//! use seeklock::{LockConfig, Target};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let page = Page::from_html(
//!     r#"<html><head></head><body><div data-model-id="vid1"><video></video></div></body></html>"#,
//! );
//! let mut session = Session::new(page, LockConfig::default())?;
//! session.install(Target::new("vid1", true))?;
//!
//! let video = session.page().videos()[0];
//! session.page_mut().play(video);
//! session.page_mut().play_for(video, 3.0);
//! session.page_mut().seek(video, 60.0);
//! assert!(session.page().current_time(video).unwrap() < 3.5);
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;

pub mod error;
pub use error::{Error, Result};

// Host surface (DOM, media hooks, timers/observers, alerts)
pub mod platform;

pub mod access;
pub mod alert;
pub mod annotate;
pub mod collect;
pub mod lock;
pub mod reconcile;
pub mod registry;
pub mod resolve;
pub mod variables;

// Deterministic in-memory host built from HTML fixtures
#[cfg(feature = "page")]
pub mod page;

pub use collect::{collect_documents, DocumentSet};
pub use lock::LockController;
pub use reconcile::{Phase, Reconciler};
pub use registry::Registry;
pub use resolve::{resolve_video, ResolvedVideo};
pub use variables::Target;

/// Configuration for the seek lock
///
/// The defaults match the player vocabulary and timings the lock was tuned
/// for: 0.25 s of drift tolerance, a 300 ms polling backstop and a 3 s grace
/// window before an unresolved target is reported.
///
/// Every field has a default, so a JSON document only needs the fields it
/// overrides.
///
/// # Examples
///
/// ```
/// let cfg = seeklock::LockConfig::from_json(r#"{ "alert_delay_ms": 5000 }"#).unwrap();
/// assert_eq!(cfg.alert_delay_ms, 5000);
/// assert_eq!(cfg.poll_interval_ms, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Allowed drift from the safe position before a seek is reverted (seconds)
    pub tolerance_secs: f64,
    /// Polling backstop period in milliseconds
    pub poll_interval_ms: u64,
    /// Grace window before an unresolved target is reported, in milliseconds
    pub alert_delay_ms: u64,
    /// Maximum number of windows visited when walking up the parent chain
    pub max_parent_hops: usize,
    /// Attribute carrying the authoring tool's model identifier
    pub model_attribute: String,
    /// Attribute carrying the accessibility identifier
    pub accessibility_attribute: String,
    /// Tag of the playable media element inside the container
    pub media_tag: String,
    /// Tag of embedded frame elements
    pub frame_tag: String,
    /// Prefix of the injected style element's id
    pub style_id_prefix: String,
    /// Player variable holding the target identifier
    pub id_variable: String,
    /// Player variable holding the lock flag
    pub lock_variable: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: lock::DEFAULT_TOLERANCE,
            poll_interval_ms: 300,
            alert_delay_ms: 3000,
            max_parent_hops: 10,
            model_attribute: "data-model-id".to_string(),
            accessibility_attribute: "data-acc-id".to_string(),
            media_tag: "video".to_string(),
            frame_tag: "iframe".to_string(),
            style_id_prefix: "slVideoLockStyle_".to_string(),
            id_variable: "videoObjectId".to_string(),
            lock_variable: "videoLocked".to_string(),
        }
    }
}

impl LockConfig {
    /// Parse a JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: LockConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the reconciler cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance_secs.is_finite() || self.tolerance_secs < 0.0 {
            return Err(Error::ConfigError(format!("tolerance_secs must be a non-negative number, got {}", self.tolerance_secs)));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::ConfigError("poll_interval_ms must be greater than zero".into()));
        }
        if self.max_parent_hops == 0 {
            return Err(Error::ConfigError("max_parent_hops must be at least 1".into()));
        }
        let names = [
            ("model_attribute", &self.model_attribute),
            ("accessibility_attribute", &self.accessibility_attribute),
            ("media_tag", &self.media_tag),
            ("frame_tag", &self.frame_tag),
            ("id_variable", &self.id_variable),
            ("lock_variable", &self.lock_variable),
        ];
        if let Some((field, _)) = names.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::ConfigError(format!("{} must not be empty", field)));
        }
        Ok(())
    }
}
