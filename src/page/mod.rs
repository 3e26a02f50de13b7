//! In-memory page: a deterministic host for tests and benches
//!
//! Documents are parsed from HTML with `scraper` and copied into a mutable
//! arena. Frames carry an origin so cross-origin reads fail the way they do
//! in a browser. Timers run on a virtual clock and mutation observers queue
//! wakeups until the [`Session`] pumps them into a [`crate::Registry`].

mod clock;
mod media;
mod session;

pub use clock::{PendingTimer, DEFAULT_STEP_LIMIT};
pub use media::MediaElement;
pub use session::Session;

use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::platform::{AlertSink, DocId, Dom, NodeId, SecurityError, WindowId};
use crate::{Error, Result};

use clock::Clock;
use media::BoundListener;

const TEXT_TAG: &str = "#text";

/// Origin of a frame relative to the document that embeds it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Same origin as the embedding document
    Same,
    /// A fresh origin no other frame shares
    Cross,
}

#[derive(Debug, Clone)]
struct Node {
    doc: DocId,
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    connected: bool,
}

#[derive(Debug, Clone)]
struct Document {
    root: NodeId,
}

#[derive(Debug, Clone)]
struct Window {
    parent: Option<WindowId>,
    document: DocId,
    origin: u32,
}

/// A tree of windows and documents with simulated media, timers and alerts
pub struct Page {
    nodes: Vec<Node>,
    docs: Vec<Document>,
    windows: Vec<Window>,
    frames: HashMap<NodeId, WindowId>,
    current: WindowId,
    next_origin: u32,
    media: HashMap<NodeId, MediaElement>,
    listeners: HashMap<NodeId, Vec<BoundListener>>,
    next_listener: u64,
    clock: Clock,
    alerts: Vec<String>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("windows", &self.windows.len())
            .field("documents", &self.docs.len())
            .field("nodes", &self.nodes.len())
            .field("current", &self.current)
            .field("now_ms", &self.clock.now_ms())
            .field("alerts", &self.alerts)
            .finish()
    }
}

impl Page {
    /// A single top-level window holding a document parsed from `html`
    pub fn from_html(html: &str) -> Self {
        let mut page = Page {
            nodes: Vec::new(),
            docs: Vec::new(),
            windows: Vec::new(),
            frames: HashMap::new(),
            current: WindowId(0),
            next_origin: 1,
            media: HashMap::new(),
            listeners: HashMap::new(),
            next_listener: 1,
            clock: Clock::default(),
            alerts: Vec::new(),
        };
        let doc = page.load_document(html);
        page.windows.push(Window {
            parent: None,
            document: doc,
            origin: 0,
        });
        page
    }

    fn load_document(&mut self, html: &str) -> DocId {
        let parsed = Html::parse_document(html);
        let doc = DocId(self.docs.len());
        let root = self.import_element(doc, None, parsed.root_element());
        self.docs.push(Document { root });
        doc
    }

    fn push_node(&mut self, doc: DocId, parent: Option<NodeId>, tag: String, attrs: Vec<(String, String)>, text: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        let connected = parent.map(|p| self.nodes[p.0].connected).unwrap_or(true);
        self.nodes.push(Node {
            doc,
            tag,
            attrs,
            text,
            parent,
            children: Vec::new(),
            connected,
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn import_element(&mut self, doc: DocId, parent: Option<NodeId>, el: ElementRef) -> NodeId {
        let tag = el.value().name().to_ascii_lowercase();
        let attrs = el.value().attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Vec<_>>();
        let id = self.push_node(doc, parent, tag.clone(), attrs, String::new());
        if tag == "video" || tag == "audio" {
            let duration = self.attribute(id, "data-duration").and_then(|d| d.parse::<f64>().ok());
            self.media.insert(id, MediaElement::new(duration.unwrap_or(media::DEFAULT_DURATION)));
        }
        for child in el.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                self.import_element(doc, Some(id), child_el);
            } else if let Some(text) = child.value().as_text() {
                let s: &str = text;
                self.push_node(doc, Some(id), TEXT_TAG.to_string(), Vec::new(), s.to_string());
            }
        }
        id
    }

    fn node(&self, node: NodeId) -> Result<&Node> {
        self.nodes.get(node.0).ok_or_else(|| Error::PageError(format!("unknown node {:?}", node)))
    }

    fn window(&self, window: WindowId) -> std::result::Result<&Window, SecurityError> {
        self.windows.get(window.0).ok_or_else(|| SecurityError(format!("window {:?}", window)))
    }

    fn origin_of_doc(&self, doc: DocId) -> Option<u32> {
        self.windows.iter().find(|w| w.document == doc).map(|w| w.origin)
    }

    fn current_origin(&self) -> u32 {
        self.windows[self.current.0].origin
    }

    fn check_doc(&self, doc: DocId) -> std::result::Result<(), SecurityError> {
        match self.origin_of_doc(doc) {
            Some(o) if o == self.current_origin() => Ok(()),
            Some(_) => Err(SecurityError("document".into())),
            None => Err(SecurityError(format!("unknown document {:?}", doc))),
        }
    }

    /// Preorder descendants of `node`, excluding `node`
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    /// Root and descendants of `doc` in document order, elements only
    fn doc_elements(&self, doc: DocId) -> Vec<NodeId> {
        let root = self.docs[doc.0].root;
        let mut all = vec![root];
        all.extend(self.descendants(root));
        all.retain(|n| self.nodes[n.0].tag != TEXT_TAG);
        all
    }

    fn find_child(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[parent.0].children.iter().copied().find(|c| self.nodes[c.0].tag == tag)
    }

    fn mark_connected(&mut self, node: NodeId, connected: bool) {
        self.nodes[node.0].connected = connected;
        for d in self.descendants(node) {
            self.nodes[d.0].connected = connected;
        }
    }

    // --- Structure -------------------------------------------------------

    /// Document of the top-level window
    pub fn main_document(&self) -> DocId {
        self.windows[0].document
    }

    /// Document of `window`, regardless of origin
    pub fn document_of_window(&self, window: WindowId) -> Option<DocId> {
        self.windows.get(window.0).map(|w| w.document)
    }

    /// Document that owns `node`
    pub fn document_of(&self, node: NodeId) -> Option<DocId> {
        self.nodes.get(node.0).map(|n| n.doc)
    }

    /// Make `window` the executing context
    pub fn enter_window(&mut self, window: WindowId) {
        if window.0 < self.windows.len() {
            self.current = window;
        }
    }

    /// Embed a new frame in the body of `parent_doc`, loading `html` into it
    pub fn add_frame(&mut self, parent_doc: DocId, html: &str, origin: Origin) -> Result<(WindowId, DocId)> {
        let parent_window = self
            .windows
            .iter()
            .position(|w| w.document == parent_doc)
            .map(WindowId)
            .ok_or_else(|| Error::PageError(format!("unknown document {:?}", parent_doc)))?;
        let root = self.docs[parent_doc.0].root;
        let host_el = self.find_child(root, "body").unwrap_or(root);
        let frame = self.push_node(parent_doc, Some(host_el), "iframe".to_string(), Vec::new(), String::new());

        let doc = self.load_document(html);
        let origin = match origin {
            Origin::Same => self.windows[parent_window.0].origin,
            Origin::Cross => {
                self.next_origin += 1;
                self.next_origin
            }
        };
        let window = WindowId(self.windows.len());
        self.windows.push(Window {
            parent: Some(parent_window),
            document: doc,
            origin,
        });
        self.frames.insert(frame, window);
        self.clock.record_mutation(parent_doc);
        Ok((window, doc))
    }

    /// Parse `html` as a fragment and append its nodes to `parent`
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
        let doc = self.node(parent)?.doc;
        let fragment = Html::parse_fragment(html);
        let mut added = Vec::new();
        for child in fragment.root_element().children() {
            if let Some(el) = ElementRef::wrap(child) {
                added.push(self.import_element(doc, Some(parent), el));
            }
        }
        self.clock.record_mutation(doc);
        Ok(added)
    }

    /// Append `html` to the body of `doc`
    pub fn append_to_body(&mut self, doc: DocId, html: &str) -> Result<Vec<NodeId>> {
        let root = self.docs.get(doc.0).ok_or_else(|| Error::PageError(format!("unknown document {:?}", doc)))?.root;
        let body = self.find_child(root, "body").unwrap_or(root);
        self.append_html(body, html)
    }

    /// Detach `node` (and its subtree) from its parent
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let n = self.node(node)?;
        let (doc, parent) = (n.doc, n.parent);
        let parent = parent.ok_or_else(|| Error::PageError(format!("cannot remove root {:?}", node)))?;
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
        self.mark_connected(node, false);
        self.clock.record_mutation(doc);
        Ok(())
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let doc = self.node(node)?.doc;
        let attrs = &mut self.nodes[node.0].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
        self.clock.record_mutation(doc);
        Ok(())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.get(node.0)?.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    /// Concatenated text of `node`'s subtree
    pub fn text_content(&self, node: NodeId) -> String {
        if node.0 >= self.nodes.len() {
            return String::new();
        }
        let mut all = vec![node];
        all.extend(self.descendants(node));
        all.iter().map(|n| self.nodes[n.0].text.as_str()).collect()
    }

    /// Every connected video element, documents in creation order
    pub fn videos(&self) -> Vec<NodeId> {
        (0..self.docs.len())
            .flat_map(|d| self.doc_elements(DocId(d)))
            .filter(|n| self.nodes[n.0].tag == "video")
            .collect()
    }

    /// Alert messages shown so far
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    // --- Clock -----------------------------------------------------------

    /// Virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Timers still scheduled, in due order
    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.clock.pending_timers()
    }

    /// Number of connected mutation observers
    pub fn active_observers(&self) -> usize {
        self.clock.active_observers()
    }
}

impl Dom for Page {
    fn current_window(&self) -> WindowId {
        self.current
    }

    fn window_top(&self, window: WindowId) -> std::result::Result<WindowId, SecurityError> {
        let mut w = window;
        while let Some(parent) = self.window(w)?.parent {
            w = parent;
        }
        Ok(w)
    }

    fn window_parent(&self, window: WindowId) -> std::result::Result<WindowId, SecurityError> {
        Ok(self.window(window)?.parent.unwrap_or(window))
    }

    fn window_document(&self, window: WindowId) -> std::result::Result<DocId, SecurityError> {
        let w = self.window(window)?;
        if w.origin != self.current_origin() {
            return Err(SecurityError("document".into()));
        }
        Ok(w.document)
    }

    fn query_attribute(&self, doc: DocId, attr: &str, value: &str) -> std::result::Result<Option<NodeId>, SecurityError> {
        self.check_doc(doc)?;
        Ok(self
            .doc_elements(doc)
            .into_iter()
            .find(|n| self.nodes[n.0].attrs.iter().any(|(k, v)| k == attr && v == value)))
    }

    fn element_by_id(&self, doc: DocId, id: &str) -> std::result::Result<Option<NodeId>, SecurityError> {
        self.query_attribute(doc, "id", id)
    }

    fn elements_by_tag(&self, doc: DocId, tag: &str) -> std::result::Result<Vec<NodeId>, SecurityError> {
        self.check_doc(doc)?;
        Ok(self.doc_elements(doc).into_iter().filter(|n| self.nodes[n.0].tag == tag).collect())
    }

    fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        if node.0 >= self.nodes.len() {
            return None;
        }
        self.descendants(node).into_iter().find(|n| self.nodes[n.0].tag == tag)
    }

    fn frame_document(&self, frame: NodeId) -> std::result::Result<Option<DocId>, SecurityError> {
        let Some(window) = self.frames.get(&frame) else {
            return Ok(None);
        };
        self.window_document(*window).map(Some)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).map(|n| n.connected).unwrap_or(false)
    }

    fn insert_style(&mut self, doc: DocId, id: &str, css: &str) -> Option<NodeId> {
        let Some(root) = self.docs.get(doc.0).map(|d| d.root) else {
            log::debug!("insert_style ignored: unknown document {:?}", doc);
            return None;
        };
        let head = self.find_child(root, "head").unwrap_or(root);
        let style = self.push_node(doc, Some(head), "style".to_string(), vec![("id".to_string(), id.to_string())], String::new());
        self.push_node(doc, Some(style), TEXT_TAG.to_string(), Vec::new(), css.to_string());
        self.clock.record_mutation(doc);
        Some(style)
    }

    fn remove_element(&mut self, node: NodeId) {
        if let Err(e) = self.remove_node(node) {
            log::debug!("remove_element ignored: {}", e);
        }
    }
}

impl AlertSink for Page {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
