//! Media element hooks: playback position access and event listeners

use std::rc::Rc;

use super::{ListenerId, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Playing,
    Paused,
    Ended,
}

/// Playback events the seek lock listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// Periodic position update while playing
    TimeUpdate,
    /// A seek operation started
    Seeking,
    /// A seek operation completed
    Seeked,
}

impl MediaEvent {
    pub fn name(self) -> &'static str {
        match self {
            MediaEvent::TimeUpdate => "timeupdate",
            MediaEvent::Seeking => "seeking",
            MediaEvent::Seeked => "seeked",
        }
    }
}

/// Mutable view of a media element's playback, handed to listeners
pub trait MediaControl {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;
    /// Move the playback position
    fn set_current_time(&mut self, seconds: f64);
    fn is_paused(&self) -> bool;
    fn is_seeking(&self) -> bool;

    fn state(&self) -> MediaState {
        if self.is_paused() {
            MediaState::Paused
        } else {
            MediaState::Playing
        }
    }
}

/// Event callback bound to a media element
pub type MediaListener = Rc<dyn Fn(&mut dyn MediaControl)>;

pub trait MediaHooks {
    /// Playback view of `node`, or `None` when it is not a media element
    fn media(&mut self, node: NodeId) -> Option<&mut dyn MediaControl>;

    /// Bind `listener` to `event` on `node`
    fn add_media_listener(&mut self, node: NodeId, event: MediaEvent, listener: MediaListener) -> ListenerId;

    /// Unbind a listener. Returns false when it was not bound.
    fn remove_media_listener(&mut self, node: NodeId, id: ListenerId) -> bool;

    /// Number of listeners currently bound on `node`
    fn media_listener_count(&self, node: NodeId) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        t: f64,
        paused: bool,
    }

    impl MediaControl for Fixed {
        fn current_time(&self) -> f64 {
            self.t
        }
        fn set_current_time(&mut self, seconds: f64) {
            self.t = seconds;
        }
        fn is_paused(&self) -> bool {
            self.paused
        }
        fn is_seeking(&self) -> bool {
            false
        }
    }

    #[test]
    fn state_follows_paused_flag() {
        let mut m = Fixed { t: 0.0, paused: true };
        assert_eq!(m.state(), MediaState::Paused);
        m.paused = false;
        assert_eq!(m.state(), MediaState::Playing);
        m.set_current_time(3.0);
        assert_eq!(m.current_time(), 3.0);
    }

    #[test]
    fn event_names_match_dom_vocabulary() {
        assert_eq!(MediaEvent::TimeUpdate.name(), "timeupdate");
        assert_eq!(MediaEvent::Seeked.name(), "seeked");
    }
}
