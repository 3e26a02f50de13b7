//! Simulated media playback for the in-memory page

use std::rc::Rc;

use crate::platform::{ListenerId, MediaControl, MediaEvent, MediaHooks, MediaListener, MediaState, NodeId};

use super::Page;

/// Duration given to media elements without a `data-duration` attribute
pub(crate) const DEFAULT_DURATION: f64 = 600.0;

/// Interval between simulated `timeupdate` events, in seconds
const TIME_UPDATE_STEP: f64 = 0.25;

/// Playback state of one media element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaElement {
    current_time: f64,
    duration: f64,
    paused: bool,
    seeking: bool,
    ended: bool,
}

impl MediaElement {
    pub fn new(duration: f64) -> Self {
        Self {
            current_time: 0.0,
            duration,
            paused: true,
            seeking: false,
            ended: false,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl MediaControl for MediaElement {
    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds.clamp(0.0, self.duration);
        self.ended = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_seeking(&self) -> bool {
        self.seeking
    }

    fn state(&self) -> MediaState {
        if self.ended {
            MediaState::Ended
        } else if self.paused {
            MediaState::Paused
        } else {
            MediaState::Playing
        }
    }
}

pub(crate) struct BoundListener {
    id: ListenerId,
    event: MediaEvent,
    callback: MediaListener,
}

impl Page {
    pub fn play(&mut self, node: NodeId) {
        if let Some(m) = self.media.get_mut(&node) {
            m.paused = false;
            m.ended = false;
        }
    }

    pub fn pause(&mut self, node: NodeId) {
        if let Some(m) = self.media.get_mut(&node) {
            m.paused = true;
        }
    }

    pub fn current_time(&self, node: NodeId) -> Option<f64> {
        self.media.get(&node).map(|m| m.current_time)
    }

    pub fn playback_state(&self, node: NodeId) -> Option<MediaState> {
        self.media.get(&node).map(|m| m.state())
    }

    /// Move the position without dispatching any event
    pub fn set_current_time_silently(&mut self, node: NodeId, seconds: f64) {
        if let Some(m) = self.media.get_mut(&node) {
            m.set_current_time(seconds);
        }
    }

    /// Play for `seconds` of media time, dispatching `timeupdate` every
    /// quarter second. Stops early at the end of the media or when paused.
    pub fn play_for(&mut self, node: NodeId, seconds: f64) {
        let mut remaining = seconds;
        while remaining > 0.0 {
            let Some(m) = self.media.get_mut(&node) else {
                return;
            };
            if m.paused {
                return;
            }
            let step = remaining.min(TIME_UPDATE_STEP);
            m.current_time = (m.current_time + step).min(m.duration);
            if m.current_time >= m.duration {
                m.ended = true;
                m.paused = true;
            }
            remaining -= step;
            self.dispatch_media_event(node, MediaEvent::TimeUpdate);
        }
    }

    /// User seek: position moves, then `seeking` and `seeked` are dispatched
    pub fn seek(&mut self, node: NodeId, seconds: f64) {
        let Some(m) = self.media.get_mut(&node) else {
            return;
        };
        m.seeking = true;
        m.set_current_time(seconds);
        self.dispatch_media_event(node, MediaEvent::Seeking);
        if let Some(m) = self.media.get_mut(&node) {
            m.seeking = false;
        }
        self.dispatch_media_event(node, MediaEvent::Seeked);
    }

    /// Invoke the listeners bound to `event` on `node`
    pub fn dispatch_media_event(&mut self, node: NodeId, event: MediaEvent) {
        let callbacks: Vec<MediaListener> = self
            .listeners
            .get(&node)
            .map(|ls| ls.iter().filter(|l| l.event == event).map(|l| Rc::clone(&l.callback)).collect())
            .unwrap_or_default();
        let Some(m) = self.media.get_mut(&node) else {
            return;
        };
        for cb in &callbacks {
            let view: &mut dyn MediaControl = &mut *m;
            cb(view);
        }
    }
}

impl MediaHooks for Page {
    fn media(&mut self, node: NodeId) -> Option<&mut dyn MediaControl> {
        self.media.get_mut(&node).map(|m| m as &mut dyn MediaControl)
    }

    fn add_media_listener(&mut self, node: NodeId, event: MediaEvent, listener: MediaListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(node).or_default().push(BoundListener {
            id,
            event,
            callback: listener,
        });
        id
    }

    fn remove_media_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(ls) = self.listeners.get_mut(&node) else {
            return false;
        };
        let before = ls.len();
        ls.retain(|l| l.id != id);
        before != ls.len()
    }

    fn media_listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).map(|ls| ls.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn page() -> (Page, NodeId) {
        let page = Page::from_html(r#"<html><body><video data-duration="2"></video></body></html>"#);
        let v = page.videos()[0];
        (page, v)
    }

    #[test]
    fn playback_ends_at_duration() {
        let (mut p, v) = page();
        p.play(v);
        assert_eq!(p.playback_state(v), Some(MediaState::Playing));
        p.play_for(v, 10.0);
        assert_eq!(p.current_time(v), Some(2.0));
        assert_eq!(p.playback_state(v), Some(MediaState::Ended));
    }

    #[test]
    fn seek_dispatches_seeking_then_seeked() {
        let (mut p, v) = page();
        let seen = Rc::new(Cell::new(0u32));
        let s = Rc::clone(&seen);
        p.add_media_listener(
            v,
            MediaEvent::Seeking,
            Rc::new(move |m: &mut dyn MediaControl| {
                assert!(m.is_seeking());
                s.set(s.get() + 1);
            }),
        );
        let s = Rc::clone(&seen);
        let id = p.add_media_listener(
            v,
            MediaEvent::Seeked,
            Rc::new(move |m: &mut dyn MediaControl| {
                assert!(!m.is_seeking());
                s.set(s.get() + 10);
            }),
        );
        p.seek(v, 1.0);
        assert_eq!(seen.get(), 11);
        assert!(p.remove_media_listener(v, id));
        assert!(!p.remove_media_listener(v, id));
        assert_eq!(p.media_listener_count(v), 1);
    }

    #[test]
    fn paused_media_does_not_advance() {
        let (mut p, v) = page();
        p.play_for(v, 1.0);
        assert_eq!(p.current_time(v), Some(0.0));
    }
}
