//! One-shot developer alert for a target that cannot be resolved

use crate::platform::AlertSink;
use crate::Error;

/// Emits at most one alert per continuous failure episode.
///
/// The suppression flag is cleared by [`AlertNotifier::reset`] after a
/// successful resolution so a later failure can alert again.
#[derive(Debug, Default)]
pub struct AlertNotifier {
    shown: bool,
    emitted: usize,
}

impl AlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present `error` unless this episode already alerted. Returns true when
    /// an alert was emitted.
    pub fn notify<A: AlertSink + ?Sized>(&mut self, sink: &mut A, error: &Error) -> bool {
        if self.shown {
            return false;
        }
        self.shown = true;
        self.emitted += 1;
        log::warn!("{}", error);
        sink.alert(&error.to_string());
        true
    }

    /// End the current failure episode
    pub fn reset(&mut self) {
        self.shown = false;
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Total alerts emitted over the notifier's lifetime
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl AlertSink for Recorder {
        fn alert(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    #[test]
    fn alerts_once_per_episode() {
        let mut sink = Recorder::default();
        let mut n = AlertNotifier::new();
        let err = Error::ResolutionFailed("vid1".into());
        assert!(n.notify(&mut sink, &err));
        assert!(!n.notify(&mut sink, &err));
        assert_eq!(sink.0.len(), 1);

        n.reset();
        assert!(n.notify(&mut sink, &err));
        assert_eq!(sink.0.len(), 2);
        assert_eq!(n.emitted(), 2);
    }
}
