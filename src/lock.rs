//! Seek clamping bound to individual video elements
//!
//! While an element is locked the controller tracks its safe position, the
//! furthest point reached by normal playback. Any seek that lands more than
//! the tolerance away from it is snapped back.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::platform::{Dom, ListenerId, MediaControl, MediaEvent, MediaHooks, MediaListener, NodeId};

/// Allowed drift between the playback position and the safe position, in seconds
pub const DEFAULT_TOLERANCE: f64 = 0.25;

/// Per-element lock bookkeeping. Present in the side table only while locked,
/// so "locked" and "listeners bound" cannot disagree.
#[derive(Debug)]
struct LockState {
    safe_position: Rc<Cell<f64>>,
    listeners: Vec<ListenerId>,
}

/// Owns the lock state of every element it has locked
#[derive(Debug)]
pub struct LockController {
    tolerance: f64,
    locked: HashMap<NodeId, LockState>,
}

impl Default for LockController {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl LockController {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            locked: HashMap::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_locked(&self, video: NodeId) -> bool {
        self.locked.contains_key(&video)
    }

    /// Furthest naturally reached position of a locked element
    pub fn safe_position(&self, video: NodeId) -> Option<f64> {
        self.locked.get(&video).map(|s| s.safe_position.get())
    }

    /// Number of elements currently locked
    pub fn locked_count(&self) -> usize {
        self.locked.len()
    }

    /// Lock `video`. Returns false when it was already locked or is not a
    /// media element.
    pub fn lock<H: MediaHooks + ?Sized>(&mut self, host: &mut H, video: NodeId) -> bool {
        if self.is_locked(video) {
            return false;
        }
        let Some(media) = host.media(video) else {
            return false;
        };
        let start = media.current_time();
        let safe_position = Rc::new(Cell::new(if start.is_finite() { start } else { 0.0 }));

        let on_progress: MediaListener = {
            let safe = Rc::clone(&safe_position);
            Rc::new(move |m: &mut dyn MediaControl| {
                let t = m.current_time();
                if !m.is_seeking() && !m.is_paused() && t > safe.get() {
                    safe.set(t);
                }
            })
        };
        let clamp: MediaListener = {
            let safe = Rc::clone(&safe_position);
            let tolerance = self.tolerance;
            Rc::new(move |m: &mut dyn MediaControl| {
                let target = safe.get();
                if (m.current_time() - target).abs() > tolerance {
                    m.set_current_time(target);
                }
            })
        };

        let listeners = vec![
            host.add_media_listener(video, MediaEvent::TimeUpdate, on_progress),
            host.add_media_listener(video, MediaEvent::Seeking, Rc::clone(&clamp)),
            host.add_media_listener(video, MediaEvent::Seeked, clamp),
        ];
        log::debug!("locked {:?} at {:.3}s", video, safe_position.get());
        self.locked.insert(video, LockState { safe_position, listeners });
        true
    }

    /// Unlock `video`, unbinding its listeners. Returns false when it was not locked.
    pub fn unlock<H: MediaHooks + ?Sized>(&mut self, host: &mut H, video: NodeId) -> bool {
        let Some(state) = self.locked.remove(&video) else {
            return false;
        };
        for id in state.listeners {
            host.remove_media_listener(video, id);
        }
        log::debug!("unlocked {:?}", video);
        true
    }

    /// Unlock every element still tracked
    pub fn unlock_all<H: MediaHooks + ?Sized>(&mut self, host: &mut H) -> usize {
        let videos: Vec<NodeId> = self.locked.keys().copied().collect();
        let mut released = 0;
        for video in videos {
            if self.unlock(host, video) {
                released += 1;
            }
        }
        released
    }

    /// Forget elements that were detached by a re-render. Their listeners die
    /// with the element.
    pub fn prune<H: Dom + ?Sized>(&mut self, host: &H) -> usize {
        let before = self.locked.len();
        self.locked.retain(|node, _| host.is_connected(*node));
        let dropped = before - self.locked.len();
        if dropped > 0 {
            log::debug!("dropped lock state for {} detached element(s)", dropped);
        }
        dropped
    }
}

#[cfg(all(test, feature = "page"))]
mod tests {
    use super::*;
    use crate::page::Page;

    fn page_with_video() -> (Page, NodeId) {
        let page = Page::from_html(r#"<html><body><div id="c"><video></video></div></body></html>"#);
        let doc = page.main_document();
        let video = page.elements_by_tag(doc, "video").unwrap()[0];
        (page, video)
    }

    #[test]
    fn lock_is_idempotent() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        assert!(ctl.lock(&mut page, video));
        assert!(!ctl.lock(&mut page, video));
        assert_eq!(page.media_listener_count(video), 3);
    }

    #[test]
    fn unlock_unbinds_everything() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        ctl.lock(&mut page, video);
        assert!(ctl.unlock(&mut page, video));
        assert!(!ctl.unlock(&mut page, video));
        assert_eq!(page.media_listener_count(video), 0);
        assert!(ctl.safe_position(video).is_none());
    }

    #[test]
    fn forward_seek_is_reverted() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        ctl.lock(&mut page, video);
        page.play(video);
        page.play_for(video, 4.0);
        let safe = ctl.safe_position(video).unwrap();
        assert!((safe - 4.0).abs() < 1e-9);
        page.seek(video, 30.0);
        let t = page.current_time(video).unwrap();
        assert!((t - safe).abs() <= DEFAULT_TOLERANCE);
    }

    #[test]
    fn small_drift_is_tolerated() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        ctl.lock(&mut page, video);
        page.play(video);
        page.play_for(video, 2.0);
        page.seek(video, 2.2);
        assert!((page.current_time(video).unwrap() - 2.2).abs() < 1e-9);
    }

    #[test]
    fn paused_progress_does_not_advance_safe_position() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        ctl.lock(&mut page, video);
        page.set_current_time_silently(video, 9.0);
        page.dispatch_media_event(video, MediaEvent::TimeUpdate);
        assert_eq!(ctl.safe_position(video), Some(0.0));
    }

    #[test]
    fn detached_elements_are_pruned() {
        let (mut page, video) = page_with_video();
        let mut ctl = LockController::default();
        ctl.lock(&mut page, video);
        let container = page.element_by_id(page.main_document(), "c").unwrap().unwrap();
        page.remove_node(container);
        assert_eq!(ctl.prune(&page), 1);
        assert!(!ctl.is_locked(video));
    }
}
