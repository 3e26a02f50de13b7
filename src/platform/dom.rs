//! Document tree access as seen from the executing script context

use super::{DocId, NodeId, SecurityError, WindowId};

pub trait Dom {
    /// The window the lock logic is executing in
    fn current_window(&self) -> WindowId;

    /// The top-level browsing context of `window`
    fn window_top(&self, window: WindowId) -> Result<WindowId, SecurityError>;

    /// The parent of `window`; a top-level window is its own parent
    fn window_parent(&self, window: WindowId) -> Result<WindowId, SecurityError>;

    /// The document of `window`; fails for cross-origin windows
    fn window_document(&self, window: WindowId) -> Result<DocId, SecurityError>;

    /// First element in `doc` (document order) whose `attr` equals `value`
    fn query_attribute(&self, doc: DocId, attr: &str, value: &str) -> Result<Option<NodeId>, SecurityError>;

    /// Element in `doc` with the given `id`
    fn element_by_id(&self, doc: DocId, id: &str) -> Result<Option<NodeId>, SecurityError>;

    /// All elements in `doc` with the given tag, in document order
    fn elements_by_tag(&self, doc: DocId, tag: &str) -> Result<Vec<NodeId>, SecurityError>;

    /// First descendant of `node` with the given tag
    fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId>;

    /// Content document of an embedded frame element. `Ok(None)` when the
    /// frame has no document yet, `Err` when it is cross-origin.
    fn frame_document(&self, frame: NodeId) -> Result<Option<DocId>, SecurityError>;

    /// Whether `node` is still attached to a document
    fn is_connected(&self, node: NodeId) -> bool;

    /// Append a `<style id=..>` element holding `css` to the head of `doc`
    /// (or its document element when there is no head). `None` when `doc`
    /// no longer exists.
    fn insert_style(&mut self, doc: DocId, id: &str, css: &str) -> Option<NodeId>;

    /// Detach `node` from its parent
    fn remove_element(&mut self, node: NodeId);
}
