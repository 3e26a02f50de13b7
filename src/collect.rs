//! Collect every document reachable from the executing context
//!
//! Course content is often served inside review or LMS frames that may be
//! cross-origin. The current document is always usable; the top document,
//! the parent chain and embedded frame documents are added only when a read
//! succeeds. The set is rebuilt on every cycle because frames load and unload.

use crate::access::{attempt, attempt_optional};
use crate::platform::{DocId, Dom};

/// Ordered, identity-deduplicated list of documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    docs: Vec<DocId>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `doc` unless already present. Returns true when it was added.
    pub fn insert(&mut self, doc: DocId) -> bool {
        if self.docs.contains(&doc) {
            return false;
        }
        self.docs.push(doc);
        true
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.docs.contains(&doc)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.docs.iter().copied()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.docs
    }
}

/// Build the document set for the current context.
///
/// `max_hops` bounds the parent walk so a malformed frame graph cannot loop.
/// `frame_tag` names the embedding element (normally `iframe`).
pub fn collect_documents<H: Dom + ?Sized>(host: &H, max_hops: usize, frame_tag: &str) -> DocumentSet {
    let mut set = DocumentSet::new();
    let current = host.current_window();

    if let Some(doc) = attempt(|| host.window_document(current)).into_option() {
        set.insert(doc);
    }

    if let Some(top_doc) = attempt(|| host.window_top(current).and_then(|top| host.window_document(top))).into_option() {
        set.insert(top_doc);
    }

    let mut window = current;
    for _ in 0..max_hops {
        if let Some(doc) = attempt(|| host.window_document(window)).into_option() {
            set.insert(doc);
        }
        let Some(parent) = attempt(|| host.window_parent(window)).into_option() else {
            break;
        };
        if parent == window {
            break;
        }
        window = parent;
    }

    // snapshot: frame documents found below are not scanned for further frames
    let snapshot: Vec<DocId> = set.iter().collect();
    for doc in snapshot {
        let frames = attempt(|| host.elements_by_tag(doc, frame_tag)).into_option().unwrap_or_default();
        for frame in frames {
            if let Some(inner) = attempt_optional(|| host.frame_document(frame)).into_option() {
                set.insert(inner);
            }
        }
    }

    log::trace!("collected {} document(s)", set.len());
    set
}
