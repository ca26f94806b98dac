use indextree::NodeId;

/// A single mutation applied to the live tree, in the order it happened.
///
/// Inserts carry the position among the parent's children at insertion time so a mirror
/// can replay the journal without walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DOMUpdate {
    InsertElement {
        parent: NodeId,
        node: NodeId,
        tag: String,
        pos: usize,
    },
    InsertText {
        parent: NodeId,
        node: NodeId,
        text: String,
        pos: usize,
    },
    InsertComment {
        parent: NodeId,
        node: NodeId,
        text: String,
        pos: usize,
    },
    SetAttr {
        node: NodeId,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: NodeId,
        name: String,
    },
    SetText {
        node: NodeId,
        text: String,
    },
    SetValue {
        node: NodeId,
        value: String,
    },
    RemoveNode {
        node: NodeId,
    },
}
