//! Handler registry and the context handed to handlers.

use std::collections::HashMap;
use std::rc::Rc;

use dom::NodeId;

use crate::App;

/// Context passed to event handlers
pub struct EventContext {
    /// The container the event was dispatched through
    pub app: App,
    /// The node the event was dispatched to
    pub target: NodeId,
    /// The node whose binding is running, `target` or one of its ancestors
    pub current_target: NodeId,
    /// The event type (e.g., "click", "input")
    pub event_type: String,
    attrs: Vec<(String, String)>,
    value: Option<String>,
}

impl EventContext {
    pub(crate) const fn new(
        app: App,
        target: NodeId,
        current_target: NodeId,
        event_type: String,
        attrs: Vec<(String, String)>,
        value: Option<String>,
    ) -> Self {
        Self {
            app,
            target,
            current_target,
            event_type,
            attrs,
            value,
        }
    }

    /// Attribute of the element carrying the binding, read when the event was dispatched.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Current value of the target when it is a form control.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Type-erased event handler
pub type Handler = Rc<dyn Fn(&EventContext)>;

/// Flat map from qualified handler name (`name` or `scope:name`) to callback.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Registers a handler, silently replacing an existing one. Returns whether it replaced.
    pub(crate) fn register(&mut self, name: impl Into<String>, handler: Handler) -> bool {
        self.handlers.insert(name.into(), handler).is_some()
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Removes every handler whose name starts with `prefix`, returning how many went.
    pub(crate) fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.handlers.len();
        self.handlers.retain(|name, _| !name.starts_with(prefix));
        before - self.handlers.len()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Empties the registry, handing the callbacks back so they can be dropped later.
    pub(crate) fn take_all(&mut self) -> Vec<Handler> {
        self.handlers.drain().map(|(_, handler)| handler).collect()
    }
}
