//! Locate the video element belonging to a target identifier

use crate::access::attempt;
use crate::collect::DocumentSet;
use crate::platform::{DocId, Dom, NodeId};
use crate::LockConfig;

/// A video element together with the document that contains it.
///
/// Recomputed on every cycle; never stored across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub video: NodeId,
    pub document: DocId,
}

/// How a container element is matched to the target identifier, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMatch {
    /// Authoring-tool model identifier attribute
    ModelId,
    /// Accessibility identifier attribute
    AccessibilityId,
    /// Plain element id
    ElementId,
}

impl ContainerMatch {
    pub const PRIORITY: [ContainerMatch; 3] = [ContainerMatch::ModelId, ContainerMatch::AccessibilityId, ContainerMatch::ElementId];
}

fn find_container<H: Dom + ?Sized>(host: &H, doc: DocId, target_id: &str, config: &LockConfig) -> Option<NodeId> {
    ContainerMatch::PRIORITY.iter().find_map(|how| {
        let found = match how {
            ContainerMatch::ModelId => attempt(|| host.query_attribute(doc, &config.model_attribute, target_id)),
            ContainerMatch::AccessibilityId => attempt(|| host.query_attribute(doc, &config.accessibility_attribute, target_id)),
            ContainerMatch::ElementId => attempt(|| host.element_by_id(doc, target_id)),
        };
        found.into_option().flatten()
    })
}

/// First `(video, document)` pair for `target_id`, scanning `docs` in order.
///
/// A document without a container, or whose container holds no media
/// element, simply does not match. An empty identifier never matches.
pub fn resolve_video<H: Dom + ?Sized>(host: &H, target_id: &str, docs: &DocumentSet, config: &LockConfig) -> Option<ResolvedVideo> {
    if target_id.is_empty() {
        return None;
    }
    for document in docs.iter() {
        let Some(container) = find_container(host, document, target_id, config) else {
            continue;
        };
        if let Some(video) = host.first_descendant_by_tag(container, &config.media_tag) {
            return Some(ResolvedVideo { video, document });
        }
    }
    None
}
