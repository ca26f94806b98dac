use indextree::{Arena, NodeId};
use smallvec::SmallVec;

use crate::desired::DesiredNode;
use crate::updating::DOMUpdate;

/// Elements that carry a current value apart from their declared `value` attribute.
const FORM_CONTROLS: [&str; 3] = ["input", "textarea", "select"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

/// Cursor range inside a form control's current value, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    #[must_use]
    pub fn clamped(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
    /// Current value of a form control. `None` for everything else.
    pub value: Option<String>,
    pub selection: Option<Selection>,
}

impl DOMNode {
    pub fn element(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let value = FORM_CONTROLS.contains(&tag.as_str()).then(String::new);
        Self {
            kind: NodeKind::Element { tag },
            value,
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text { text: text.into() },
            ..Self::default()
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Comment { text: text.into() },
            ..Self::default()
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Document | NodeKind::Text { .. } | NodeKind::Comment { .. } => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub const fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Whether this node has a current-value property distinct from its attribute.
    pub const fn supports_value(&self) -> bool {
        self.value.is_some()
    }
}

/// The persistent, mutable tree that is on screen.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Ids of removed nodes stay
/// harmless: every accessor treats them as absent.
pub struct Dom {
    pub(crate) arena: Arena<DOMNode>,
    pub(crate) root: NodeId,
    focused: Option<NodeId>,
    journal: Option<Vec<DOMUpdate>>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Creates a tree holding only a document node. Journaling starts disabled.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DOMNode::default());
        Self {
            arena,
            root,
            focused: None,
            journal: None,
        }
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    // -----------------------
    // Journal
    // -----------------------

    /// Starts or stops recording mutations. Stopping discards what was recorded.
    pub fn set_recording(&mut self, enabled: bool) {
        let recorded = self.journal.take();
        self.journal = enabled.then(|| recorded.unwrap_or_default());
    }

    /// Takes every update recorded since the last drain.
    pub fn drain_updates(&mut self) -> Vec<DOMUpdate> {
        self.journal.as_mut().map(core::mem::take).unwrap_or_default()
    }

    fn record(&mut self, update: DOMUpdate) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(update);
        }
    }

    /// Records the insertion of `node` and, recursively, everything beneath it.
    fn record_insert(&mut self, parent: NodeId, node: NodeId, pos: usize) {
        if self.journal.is_none() {
            return;
        }
        let mut batch = Vec::new();
        self.describe_insert(parent, node, pos, &mut batch);
        if let Some(journal) = self.journal.as_mut() {
            journal.extend(batch);
        }
    }

    fn describe_insert(&self, parent: NodeId, node: NodeId, pos: usize, out: &mut Vec<DOMUpdate>) {
        let Some(data) = self.node(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Element { tag } => {
                out.push(DOMUpdate::InsertElement {
                    parent,
                    node,
                    tag: tag.clone(),
                    pos,
                });
                for (name, value) in &data.attrs {
                    out.push(DOMUpdate::SetAttr {
                        node,
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
            NodeKind::Text { text } => out.push(DOMUpdate::InsertText {
                parent,
                node,
                text: text.clone(),
                pos,
            }),
            NodeKind::Comment { text } => out.push(DOMUpdate::InsertComment {
                parent,
                node,
                text: text.clone(),
                pos,
            }),
            NodeKind::Document => {}
        }
        for (index, child) in node.children(&self.arena).enumerate() {
            self.describe_insert(node, child, index, out);
        }
    }

    // -----------------------
    // Reads
    // -----------------------

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.get(id).is_some() && !id.is_removed(&self.arena)
    }

    pub fn node(&self, id: NodeId) -> Option<&DOMNode> {
        if !self.contains(id) {
            return None;
        }
        self.arena.get(id).map(indextree::Node::get)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut DOMNode> {
        if !self.contains(id) {
            return None;
        }
        self.arena.get_mut(id).map(indextree::Node::get_mut)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(DOMNode::tag)
    }

    /// Text of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text { text } | NodeKind::Comment { text } => Some(text),
            NodeKind::Document | NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated text of every text node beneath `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        if !self.contains(id) {
            return String::new();
        }
        id.descendants(&self.arena)
            .filter_map(|node| match &self.arena.get(node)?.get().kind {
                NodeKind::Text { text } => Some(text.as_str()),
                NodeKind::Document | NodeKind::Element { .. } | NodeKind::Comment { .. } => None,
            })
            .collect()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attr(name)
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.node(id) {
            Some(node) => &node.attrs[..],
            None => &[],
        }
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id)?.value.as_deref()
    }

    pub fn selection(&self, id: NodeId) -> Option<Selection> {
        self.node(id)?.selection
    }

    pub fn supports_value(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(DOMNode::supports_value)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        self.arena.get(id)?.parent()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        id.children(&self.arena).collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        id.children(&self.arena).count()
    }

    /// Whether `id` is `ancestor` or lies beneath it.
    pub fn is_inclusive_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.contains(id) && id.ancestors(&self.arena).any(|node| node == ancestor)
    }

    /// Ancestor chain starting at `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        id.ancestors(&self.arena).collect()
    }

    /// First element strictly beneath `root` whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.find(root, |node| node.attr(name) == Some(value))
    }

    /// Every element strictly beneath `root` with the given tag, in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.find_all(root, |node| node.tag() == Some(tag))
    }

    pub fn find(&self, root: NodeId, predicate: impl Fn(&DOMNode) -> bool) -> Option<NodeId> {
        self.find_all(root, predicate).into_iter().next()
    }

    pub fn find_all(&self, root: NodeId, predicate: impl Fn(&DOMNode) -> bool) -> Vec<NodeId> {
        if !self.contains(root) {
            return Vec::new();
        }
        root.descendants(&self.arena)
            .skip(1)
            .filter(|id| {
                self.arena
                    .get(*id)
                    .is_some_and(|node| node.get().is_element() && predicate(node.get()))
            })
            .collect()
    }

    // -----------------------
    // Node creation
    // -----------------------

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.arena.new_node(DOMNode::element(tag))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(DOMNode::text(text))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(DOMNode::comment(text))
    }

    /// Builds a detached deep copy of a desired node.
    ///
    /// Form controls start with their current value taken from the declared `value`
    /// attribute, or from their text content for `textarea`.
    pub fn instantiate(&mut self, desired: &DesiredNode) -> NodeId {
        match desired {
            DesiredNode::Text { content } => self.create_text(content.as_str()),
            DesiredNode::Comment { content } => self.create_comment(content.as_str()),
            DesiredNode::Element {
                tag,
                attributes,
                children,
            } => {
                let mut data = DOMNode::element(tag.as_str());
                for (name, value) in attributes {
                    data.attrs.push((name.clone(), value.clone()));
                }
                if data.supports_value() {
                    data.value = Some(initial_value(tag, attributes, children));
                }
                let id = self.arena.new_node(data);
                for child in children {
                    let child_id = self.instantiate(child);
                    id.append(child_id, &mut self.arena);
                }
                id
            }
        }
    }

    // -----------------------
    // Structural mutation
    // -----------------------

    /// Appends a detached node (and its subtree) as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            log::warn!("append_child on a removed node ignored");
            return;
        }
        let pos = self.child_count(parent);
        parent.append(child, &mut self.arena);
        self.record_insert(parent, child, pos);
    }

    /// Inserts a detached node right before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.parent(reference) else {
            log::warn!("insert_before needs a reference node with a parent");
            return;
        };
        if !self.contains(node) {
            return;
        }
        let pos = parent
            .children(&self.arena)
            .position(|child| child == reference)
            .unwrap_or_default();
        reference.insert_before(node, &mut self.arena);
        self.record_insert(parent, node, pos);
    }

    /// Removes `id` and its whole subtree. Focus inside the subtree is dropped.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) || id == self.root {
            return;
        }
        if self
            .focused
            .is_some_and(|focused| self.is_inclusive_descendant(focused, id))
        {
            self.focused = None;
        }
        self.record(DOMUpdate::RemoveNode { node: id });
        id.remove_subtree(&mut self.arena);
    }

    /// Puts the detached `replacement` where `old` is, then removes `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) {
        self.insert_before(old, replacement);
        self.remove(old);
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    // -----------------------
    // Content mutation
    // -----------------------

    /// Sets the text of a text or comment node. Returns false for other kinds.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        match &mut node.kind {
            NodeKind::Text { text: current } | NodeKind::Comment { text: current } => {
                current.clone_from(&text);
            }
            NodeKind::Document | NodeKind::Element { .. } => return false,
        }
        self.record(DOMUpdate::SetText { node: id, text });
        true
    }

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        let Some(node) = self.node_mut(id).filter(|node| node.is_element()) else {
            return;
        };
        match node.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, current)) => current.clone_from(&value),
            None => node.attrs.push((name.clone(), value.clone())),
        }
        self.record(DOMUpdate::SetAttr {
            node: id,
            name,
            value,
        });
    }

    /// Removes an attribute, returning whether it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let Some(index) = node.attrs.iter().position(|(key, _)| key == name) else {
            return false;
        };
        node.attrs.remove(index);
        self.record(DOMUpdate::RemoveAttr {
            node: id,
            name: name.to_owned(),
        });
        true
    }

    /// Sets a form control's current value. Returns false when `id` has no such property.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        let value = value.into();
        let Some(node) = self.node_mut(id).filter(|node| node.supports_value()) else {
            return false;
        };
        node.value = Some(value.clone());
        self.record(DOMUpdate::SetValue { node: id, value });
        true
    }

    /// Places the cursor range of a form control, clamped to its current value.
    pub fn set_selection(&mut self, id: NodeId, selection: Selection) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let Some(value) = node.value.as_deref() else {
            return false;
        };
        node.selection = Some(selection.clamped(value.chars().count()));
        true
    }

    // -----------------------
    // Focus
    // -----------------------

    /// Focuses an element. Returns false for non-elements and removed nodes.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.node(id).is_some_and(DOMNode::is_element) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.contains(*id))
    }
}

fn initial_value(tag: &str, attributes: &[(String, String)], children: &[DesiredNode]) -> String {
    if tag == "textarea" {
        return children
            .iter()
            .filter_map(|child| match child {
                DesiredNode::Text { content } => Some(content.as_str()),
                DesiredNode::Element { .. } | DesiredNode::Comment { .. } => None,
            })
            .collect();
    }
    attributes
        .iter()
        .find(|(name, _)| name == "value")
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_a_subtree_drops_focus_inside_it() {
        let mut dom = Dom::new();
        let root = dom.root();
        let form = dom.create_element("form");
        let input = dom.create_element("input");
        dom.append_child(root, form);
        dom.append_child(form, input);
        assert!(dom.focus(input));

        dom.remove(form);

        assert_eq!(dom.focused(), None);
        assert!(!dom.contains(input));
        assert_eq!(dom.child_count(root), 0);
    }

    #[test]
    fn journal_replays_subtree_inserts_in_document_order() {
        let mut dom = Dom::new();
        dom.set_recording(true);
        let desired = DesiredNode::element("ul")
            .with_attr("class", "items")
            .with_child(DesiredNode::element("li").with_child(DesiredNode::text("one")));
        let list = dom.instantiate(&desired);
        dom.append_child(dom.root(), list);

        let updates = dom.drain_updates();
        assert_eq!(updates.len(), 4);
        assert!(matches!(&updates[0], DOMUpdate::InsertElement { tag, pos: 0, .. } if tag == "ul"));
        assert!(matches!(&updates[1], DOMUpdate::SetAttr { name, .. } if name == "class"));
        assert!(matches!(&updates[2], DOMUpdate::InsertElement { tag, .. } if tag == "li"));
        assert!(matches!(&updates[3], DOMUpdate::InsertText { text, .. } if text == "one"));
        assert!(dom.drain_updates().is_empty());
    }

    #[test]
    fn form_controls_start_from_their_declared_value() {
        let mut dom = Dom::new();
        let input = dom.instantiate(&DesiredNode::element("input").with_attr("value", "hi"));
        let area = dom.instantiate(&DesiredNode::element("textarea").with_child(DesiredNode::text("body")));
        let div = dom.instantiate(&DesiredNode::element("div").with_attr("value", "x"));

        assert_eq!(dom.value(input), Some("hi"));
        assert_eq!(dom.value(area), Some("body"));
        assert_eq!(dom.value(div), None);
        assert!(!dom.set_value(div, "y"));
    }

    #[test]
    fn selection_is_clamped_to_the_current_value() {
        let mut dom = Dom::new();
        let input = dom.instantiate(&DesiredNode::element("input").with_attr("value", "abc"));

        assert!(dom.set_selection(input, Selection { start: 1, end: 10 }));

        assert_eq!(dom.selection(input), Some(Selection { start: 1, end: 3 }));
    }
}
