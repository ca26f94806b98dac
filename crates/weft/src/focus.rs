//! Focus and cursor preservation across renders.

use dom::{Dom, NodeId, Selection};

/// Which element had focus before a render, identified by attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FocusSnapshot {
    key: String,
    selection: Option<Selection>,
}

impl FocusSnapshot {
    /// Records the focused element inside `container`, if it carries `attribute`.
    pub(crate) fn capture(dom: &Dom, container: NodeId, attribute: &str) -> Option<Self> {
        let focused = dom.focused()?;
        if focused == container || !dom.is_inclusive_descendant(focused, container) {
            return None;
        }
        let key = dom.attr(focused, attribute)?.to_owned();
        Some(Self {
            key,
            selection: dom.selection(focused),
        })
    }

    /// Focuses the element now carrying the recorded key and puts its cursor back,
    /// clamped to the new value. Returns false when no such element survived.
    pub(crate) fn restore(&self, dom: &mut Dom, container: NodeId, attribute: &str) -> bool {
        let Some(node) = dom.find_by_attr(container, attribute, &self.key) else {
            log::debug!("focused element {attribute}={:?} is gone after render", self.key);
            return false;
        };
        dom.focus(node);
        if let Some(selection) = self.selection {
            dom.set_selection(node, selection);
        }
        true
    }
}
