//! Index-aligned reconciliation of a live subtree against a desired tree.
//!
//! Children are matched by position only, there is no keying and no move detection. A
//! reordered list therefore shows up as a run of content and attribute patches rather
//! than a move, which is the accepted cost of an O(max(n, m)) walk per sibling list.
//!
//! The reconciler trusts its input: it has no error conditions, and degenerate input
//! (removed parents, empty lists) turns into no-ops.

use indextree::NodeId;

use crate::desired::DesiredNode;
use crate::tree::{Dom, NodeKind};

/// What patching a live node against a desired node amounts to.
enum Patch {
    /// Same kind and same content, nothing to do.
    Keep,
    /// Text or comment whose content differs.
    Retext,
    /// Element with the same tag: sync attributes, then recurse.
    Descend,
    /// Kind or tag differs.
    Replace,
}

fn classify(kind: &NodeKind, desired: &DesiredNode) -> Patch {
    match (kind, desired) {
        (NodeKind::Text { text }, DesiredNode::Text { content })
        | (NodeKind::Comment { text }, DesiredNode::Comment { content }) => {
            if text == content {
                Patch::Keep
            } else {
                Patch::Retext
            }
        }
        (NodeKind::Element { tag }, DesiredNode::Element { tag: wanted, .. }) if tag == wanted => {
            Patch::Descend
        }
        _ => Patch::Replace,
    }
}

/// Mutates the children of `live_parent` in place until they match `desired`.
pub fn reconcile(dom: &mut Dom, live_parent: NodeId, desired: &[DesiredNode]) {
    let live = dom.children(live_parent);
    for (index, wanted) in desired.iter().enumerate() {
        match live.get(index) {
            Some(&node) => patch(dom, node, wanted),
            None => {
                let copy = dom.instantiate(wanted);
                dom.append_child(live_parent, copy);
            }
        }
    }
    for &extra in live.iter().skip(desired.len()) {
        dom.remove(extra);
    }
}

/// Brings a single live node in line with a desired node.
pub fn patch(dom: &mut Dom, live: NodeId, desired: &DesiredNode) {
    let Some(kind) = dom.kind(live) else {
        return;
    };
    match classify(kind, desired) {
        Patch::Keep => {}
        Patch::Retext => match desired {
            DesiredNode::Text { content } | DesiredNode::Comment { content } => {
                dom.set_text(live, content.as_str());
            }
            DesiredNode::Element { .. } => {}
        },
        Patch::Descend => {
            if let DesiredNode::Element {
                attributes,
                children,
                ..
            } = desired
            {
                sync_attributes(dom, live, attributes);
                reconcile(dom, live, children);
            }
        }
        Patch::Replace => {
            let copy = dom.instantiate(desired);
            dom.replace(live, copy);
        }
    }
}

/// Drops live attributes the desired node lacks and sets those whose value changed.
///
/// A changed `value` attribute on a form control also moves its current value, but only
/// when the current value differs, so the cursor of an edit in progress is not reset.
fn sync_attributes(dom: &mut Dom, live: NodeId, desired: &[(String, String)]) {
    let stale: Vec<String> = dom
        .attrs(live)
        .iter()
        .filter(|(name, _)| !desired.iter().any(|(wanted, _)| wanted == name))
        .map(|(name, _)| name.clone())
        .collect();
    for name in stale {
        dom.remove_attr(live, &name);
    }

    for (name, value) in desired {
        if dom.attr(live, name) == Some(value.as_str()) {
            continue;
        }
        dom.set_attr(live, name.as_str(), value.as_str());
        if name == "value" && dom.supports_value(live) && dom.value(live) != Some(value.as_str()) {
            dom.set_value(live, value.as_str());
        }
    }
}
