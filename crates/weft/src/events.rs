//! Declarative event binding.
//!
//! After each render the binder scans the mount container for elements carrying the
//! binding attribute, a JSON object mapping event types to handler names:
//!
//! ```html
//! <button data-events='{"click": "todo:add"}'>Add</button>
//! ```
//!
//! Each entry resolving to a registered handler becomes an active listener. The attribute
//! is removed once processed so a later scan never binds the same element twice. All
//! listeners are dropped at the start of the next render.

use dom::{Dom, NodeId};
use serde_json::{Map, Value};

use crate::handlers::{Handler, HandlerRegistry};

/// A handler attached to one element for one event type.
pub(crate) struct ActiveListener {
    pub(crate) element: NodeId,
    pub(crate) event_type: String,
    pub(crate) handler_name: String,
    pub(crate) callback: Handler,
}

/// Every listener attached by the most recent binding pass.
#[derive(Default)]
pub(crate) struct ListenerSet {
    active: Vec<ActiveListener>,
}

impl ListenerSet {
    pub(crate) fn attach(&mut self, listener: ActiveListener) {
        log::trace!(
            "bound {} on {:?} to {}",
            listener.event_type,
            listener.element,
            listener.handler_name
        );
        self.active.push(listener);
    }

    /// Detaches everything, handing the callbacks back so the caller decides when they drop.
    pub(crate) fn cleanup(&mut self) -> Vec<Handler> {
        self.active
            .drain(..)
            .map(|listener| listener.callback)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn count_for(&self, element: NodeId) -> usize {
        self.active
            .iter()
            .filter(|listener| listener.element == element)
            .count()
    }

    /// Callbacks bound on `element` for `event_type`, in attachment order.
    pub(crate) fn callbacks_for(&self, element: NodeId, event_type: &str) -> Vec<Handler> {
        self.active
            .iter()
            .filter(|listener| listener.element == element && listener.event_type == event_type)
            .map(|listener| Handler::clone(&listener.callback))
            .collect()
    }
}

/// Decodes a binding attribute value. `None` when it is not a JSON object.
///
/// Entries whose handler name is not a string are skipped with a warning.
pub(crate) fn parse_bindings(raw: &str) -> Option<Vec<(String, String)>> {
    let map: Map<String, Value> = serde_json::from_str(raw).ok()?;
    let bindings = map
        .into_iter()
        .filter_map(|(event_type, handler)| match handler {
            Value::String(name) => Some((event_type, name)),
            other => {
                log::warn!("ignoring binding for {event_type}: handler name {other} is not a string");
                None
            }
        })
        .collect();
    Some(bindings)
}

/// Attaches listeners for every element under `root` carrying `attribute`, stripping the
/// attribute as it goes. Returns how many listeners were attached.
pub(crate) fn bind_events(
    dom: &mut Dom,
    root: NodeId,
    attribute: &str,
    registry: &HandlerRegistry,
    listeners: &mut ListenerSet,
) -> usize {
    let mut attached = 0;
    for element in dom.find_all(root, |node| node.attr(attribute).is_some()) {
        let Some(raw) = dom.attr(element, attribute).map(str::to_owned) else {
            continue;
        };
        dom.remove_attr(element, attribute);

        let Some(bindings) = parse_bindings(&raw) else {
            log::warn!("ignoring malformed {attribute} attribute {raw:?}");
            continue;
        };
        for (event_type, handler_name) in bindings {
            let Some(callback) = registry.get(&handler_name) else {
                log::warn!("no handler registered as {handler_name:?} for {event_type} event");
                continue;
            };
            listeners.attach(ActiveListener {
                element,
                event_type,
                handler_name,
                callback,
            });
            attached += 1;
        }
    }
    attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::EventContext;
    use dom::DesiredNode;
    use std::rc::Rc;

    fn registry_with(names: &[&str]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::default();
        for name in names {
            registry.register(*name, Rc::new(|_ctx: &EventContext| {}));
        }
        registry
    }

    fn mounted(dom: &mut Dom, desired: &DesiredNode) -> (NodeId, NodeId) {
        let container = dom.create_element("div");
        dom.append_child(dom.root(), container);
        let node = dom.instantiate(desired);
        dom.append_child(container, node);
        (container, node)
    }

    #[test]
    fn bindings_resolve_and_strip_the_attribute() {
        let mut dom = Dom::new();
        let (container, button) = mounted(
            &mut dom,
            &DesiredNode::element("button")
                .with_attr("data-events", r#"{"click": "todo:add", "focus": "missing"}"#),
        );
        let registry = registry_with(&["todo:add"]);
        let mut listeners = ListenerSet::default();

        let attached = bind_events(&mut dom, container, "data-events", &registry, &mut listeners);

        assert_eq!(attached, 1);
        assert_eq!(listeners.callbacks_for(button, "click").len(), 1);
        assert!(listeners.callbacks_for(button, "focus").is_empty());
        assert_eq!(dom.attr(button, "data-events"), None);
    }

    #[test]
    fn second_pass_finds_nothing_to_bind() {
        let mut dom = Dom::new();
        let (container, _) = mounted(
            &mut dom,
            &DesiredNode::element("button").with_attr("data-events", r#"{"click": "go"}"#),
        );
        let registry = registry_with(&["go"]);
        let mut listeners = ListenerSet::default();

        bind_events(&mut dom, container, "data-events", &registry, &mut listeners);
        bind_events(&mut dom, container, "data-events", &registry, &mut listeners);

        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn malformed_bindings_are_stripped_without_listeners() {
        let mut dom = Dom::new();
        let (container, button) = mounted(
            &mut dom,
            &DesiredNode::element("button").with_attr("data-events", "click: go"),
        );
        let mut listeners = ListenerSet::default();

        let attached = bind_events(
            &mut dom,
            container,
            "data-events",
            &registry_with(&["go"]),
            &mut listeners,
        );

        assert_eq!(attached, 0);
        assert_eq!(dom.attr(button, "data-events"), None);
    }

    #[test]
    fn non_string_handler_names_are_skipped() {
        let bindings = parse_bindings(r#"{"click": "go", "input": 3}"#).unwrap_or_default();

        assert_eq!(bindings, vec![("click".to_owned(), "go".to_owned())]);
        assert_eq!(parse_bindings("[\"click\"]"), None);
    }
}
