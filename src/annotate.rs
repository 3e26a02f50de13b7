//! Style injection that hides the speed control and freezes the seek bar

use crate::platform::{DocId, Dom};

/// Rules applied while a target is locked. The class names are the host
/// player's control vocabulary.
pub const LOCK_STYLE_CSS: &str = "
.video-playback-speed{display:none!important}
.video-seekbar,.video-seekbar-hitarea,.video-seekbar-track,
.video-seekbar-bar,.video-seekbar-seek-thumb{
  pointer-events:none!important
}
";

/// Deterministic id of the style element for `target_id`
pub fn style_id(prefix: &str, target_id: &str) -> String {
    format!("{}{}", prefix, target_id)
}

/// Inject the lock style into `doc` unless it is already there.
/// Returns true when a style element was created.
pub fn annotate<H: Dom + ?Sized>(host: &mut H, doc: DocId, style_id: &str) -> bool {
    if matches!(host.element_by_id(doc, style_id), Ok(Some(_))) {
        return false;
    }
    if host.insert_style(doc, style_id, LOCK_STYLE_CSS).is_none() {
        return false;
    }
    log::debug!("injected {} into {:?}", style_id, doc);
    true
}

/// Remove the lock style from `doc`. Returns true when one was removed.
pub fn deannotate<H: Dom + ?Sized>(host: &mut H, doc: DocId, style_id: &str) -> bool {
    match host.element_by_id(doc, style_id) {
        Ok(Some(node)) => {
            host.remove_element(node);
            log::debug!("removed {} from {:?}", style_id, doc);
            true
        }
        _ => false,
    }
}
