//! Named component scopes.
//!
//! A scope owns a private state map and namespaces its handlers as `scope:name` in the
//! container's flat registry. [`Scope`] handles are weak: they hold the scope's name and
//! the generation it was created with, so a handle to a destroyed scope never reaches a
//! later scope registered under the same name.

use core::fmt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::app::{App, AppInner};
use crate::handlers::EventContext;
use crate::state::StateMap;

pub(crate) struct ScopeEntry {
    generation: u64,
    pub(crate) state: StateMap,
}

pub(crate) const DEAD_GENERATION: u64 = 0;

#[derive(Default)]
pub(crate) struct ScopeRegistry {
    next_generation: u64,
    scopes: HashMap<String, ScopeEntry>,
}

impl ScopeRegistry {
    /// Generation of the scope named `name`, creating it when absent.
    /// Generations start at 1, so `DEAD_GENERATION` never names a live scope.
    pub(crate) fn get_or_create(&mut self, name: &str) -> u64 {
        if let Some(entry) = self.scopes.get(name) {
            log::warn!("scope {name:?} already exists, returning it unchanged");
            return entry.generation;
        }
        self.next_generation = self.next_generation.saturating_add(1);
        let generation = self.next_generation;
        self.scopes.insert(
            name.to_owned(),
            ScopeEntry {
                generation,
                state: StateMap::new(),
            },
        );
        log::debug!("created scope {name:?}");
        generation
    }

    pub(crate) fn generation(&self, name: &str) -> Option<u64> {
        self.scopes.get(name).map(|entry| entry.generation)
    }

    pub(crate) fn entry(&self, name: &str, generation: u64) -> Option<&ScopeEntry> {
        self.scopes
            .get(name)
            .filter(|entry| entry.generation == generation)
    }

    pub(crate) fn entry_mut(&mut self, name: &str, generation: u64) -> Option<&mut ScopeEntry> {
        self.scopes
            .get_mut(name)
            .filter(|entry| entry.generation == generation)
    }

    pub(crate) fn remove(&mut self, name: &str, generation: u64) -> bool {
        if self.entry(name, generation).is_none() {
            return false;
        }
        self.scopes.remove(name).is_some()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.scopes.len();
        self.scopes.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.scopes.len()
    }
}

/// Qualified registry name of a scope handler.
pub(crate) fn qualified(scope: &str, handler: &str) -> String {
    format!("{scope}:{handler}")
}

/// Handle to a named component scope.
#[derive(Clone)]
pub struct Scope {
    name: Rc<str>,
    generation: u64,
    app: Weak<RefCell<AppInner>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Scope {
    pub(crate) fn new(name: &str, generation: u64, app: Weak<RefCell<AppInner>>) -> Self {
        Self {
            name: Rc::from(name),
            generation,
            app,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the scope this handle was issued for still exists.
    pub fn is_alive(&self) -> bool {
        self.app.upgrade().is_some_and(|inner| {
            inner
                .borrow()
                .scopes
                .entry(&self.name, self.generation)
                .is_some()
        })
    }

    /// Qualified handler name for use in binding attributes, e.g. `todo:add`.
    pub fn handler(&self, name: &str) -> String {
        qualified(&self.name, name)
    }

    /// Stores a scope value and schedules a render when the container is mounted.
    pub fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        let Some(app) = self.app() else {
            log::warn!("scope {:?} outlived its application, state change ignored", self.name);
            return;
        };
        let stored = app
            .inner
            .borrow_mut()
            .scopes
            .entry_mut(&self.name, self.generation)
            .map(|entry| entry.state.set(key, value))
            .is_some();
        if stored {
            app.schedule_render();
        } else {
            log::warn!("scope {:?} was destroyed, state change ignored", self.name);
        }
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.read(|state| state.get(key).cloned()).flatten()
    }

    pub fn get_state_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read(|state| state.get_as(key)).flatten()
    }

    /// Copy of every scope value. Empty once the scope is gone.
    pub fn all(&self) -> HashMap<String, Value> {
        self.read(StateMap::snapshot).unwrap_or_default()
    }

    /// Reads from the application's global state.
    pub fn get_global(&self, key: &str) -> Option<Value> {
        self.app()?.get_state(key)
    }

    /// Registers `callback` as `scope:name`, replacing any handler already there.
    pub fn on<F>(&self, name: &str, callback: F)
    where
        F: Fn(&EventContext) + 'static,
    {
        let Some(app) = self.app() else {
            return;
        };
        if !self.is_alive() {
            log::warn!("scope {:?} was destroyed, handler {name:?} not registered", self.name);
            return;
        }
        app.on(self.handler(name), callback);
    }

    pub fn off(&self, name: &str) -> bool {
        let Some(app) = self.app() else {
            return false;
        };
        if !self.is_alive() {
            log::warn!("scope {:?} was destroyed, handler {name:?} not removed", self.name);
            return false;
        }
        app.off(&self.handler(name))
    }

    /// Removes the scope's handlers and state and unregisters it. Later calls are no-ops.
    pub fn destroy(&self) {
        let Some(app) = self.app() else {
            return;
        };
        let removed = {
            let mut inner = app.inner.borrow_mut();
            if !inner.scopes.remove(&self.name, self.generation) {
                return;
            }
            let prefix = qualified(&self.name, "");
            inner.handlers.remove_prefixed(&prefix)
        };
        log::debug!("destroyed scope {:?} and {removed} handlers", self.name);
    }

    fn app(&self) -> Option<App> {
        self.app.upgrade().map(App::from_inner)
    }

    fn read<R>(&self, read: impl FnOnce(&StateMap) -> R) -> Option<R> {
        let inner = self.app.upgrade()?;
        let borrowed = inner.borrow();
        let result = borrowed
            .scopes
            .entry(&self.name, self.generation)
            .map(|entry| read(&entry.state));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recreated_scope_gets_a_new_generation() {
        let mut registry = ScopeRegistry::default();
        let first = registry.get_or_create("todo");

        assert_eq!(registry.get_or_create("todo"), first);
        assert!(registry.remove("todo", first));

        let second = registry.get_or_create("todo");
        assert_ne!(first, second);
        assert!(registry.entry("todo", first).is_none());
        assert!(!registry.remove("todo", first));
        assert_eq!(registry.len(), 1);
    }
}
