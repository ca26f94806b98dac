//! The application container.
//!
//! An [`App`] owns a live [`Dom`] with a mount container element, the global state map,
//! the scope and handler registries, the listeners bound by the latest render and every
//! timer it started. It is a cheap, clonable handle; clones share one container.
//!
//! Rendering and timers run as local tasks, so an app must be driven from inside a
//! [`tokio::task::LocalSet`].

use core::cell::RefCell;
use core::time::Duration;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use anyhow::{Result, bail};
use dom::{DOMUpdate, Dom, Fragment, NodeId, Selection, reconcile};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{RenderStrategy, WeftConfig};
use crate::events::{ListenerSet, bind_events};
use crate::focus::FocusSnapshot;
use crate::handlers::{EventContext, Handler, HandlerRegistry};
use crate::scheduler::RenderScheduler;
use crate::scope::{DEAD_GENERATION, Scope, ScopeRegistry};
use crate::state::StateMap;
use crate::timers::{TimerId, TimerKind, TimerSet};

/// Produces the desired content of the mount container from a snapshot of global state.
pub type RenderFn = Rc<dyn Fn(&StateMap) -> Result<Fragment>>;

/// Where an application is in its life.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Unmounted,
    Mounted,
    Destroyed,
}

#[derive(Clone, Copy, Debug, Default)]
struct RenderStats {
    renders: u64,
    failed: u64,
    last_mutations: usize,
}

pub(crate) struct AppInner {
    config: WeftConfig,
    lifecycle: Lifecycle,
    dom: Dom,
    container: NodeId,
    global: StateMap,
    pub(crate) scopes: ScopeRegistry,
    pub(crate) handlers: HandlerRegistry,
    listeners: ListenerSet,
    scheduler: RenderScheduler,
    timers: TimerSet,
    render_fn: Option<RenderFn>,
    stats: RenderStats,
}

impl AppInner {
    fn new(config: WeftConfig) -> Self {
        let mut dom = Dom::new();
        let container = dom.create_element("div");
        dom.set_attr(container, "id", config.container_id.as_str());
        dom.append_child(dom.root(), container);
        dom.set_recording(config.record_mutations);
        dom.drain_updates();
        Self {
            config,
            lifecycle: Lifecycle::Unmounted,
            dom,
            container,
            global: StateMap::new(),
            scopes: ScopeRegistry::default(),
            handlers: HandlerRegistry::default(),
            listeners: ListenerSet::default(),
            scheduler: RenderScheduler::default(),
            timers: TimerSet::default(),
            render_fn: None,
            stats: RenderStats::default(),
        }
    }

    /// Brings the container in line with `desired`, rebinds events and restores focus.
    /// Returns the listeners detached from the previous render.
    fn apply(&mut self, desired: &Fragment, focus: Option<&FocusSnapshot>) -> Vec<Handler> {
        let detached = self.listeners.cleanup();
        let container = self.container;

        if self.stats.renders == 0 || self.config.strategy == RenderStrategy::Replace {
            self.dom.clear_children(container);
            for node in &desired.children {
                let live = self.dom.instantiate(node);
                self.dom.append_child(container, live);
            }
        } else {
            reconcile(&mut self.dom, container, &desired.children);
        }
        // The binder strips binding attributes, so the reconciler sets them back each render.
        let binding = self.config.binding_attribute.as_str();
        let mutations = self
            .dom
            .drain_updates()
            .iter()
            .filter(|update| !matches!(update, DOMUpdate::SetAttr { name, .. } if name == binding))
            .count();

        let bound = bind_events(
            &mut self.dom,
            container,
            &self.config.binding_attribute,
            &self.handlers,
            &mut self.listeners,
        );
        if let Some(focus) = focus {
            focus.restore(&mut self.dom, container, &self.config.focus_attribute);
        }
        self.dom.drain_updates();

        self.stats.renders += 1;
        self.stats.last_mutations = mutations;
        log::debug!(
            "render #{} applied {mutations} mutations, bound {bound} listeners",
            self.stats.renders
        );
        detached
    }
}

/// Handle to an application container.
#[derive(Clone)]
pub struct App {
    pub(crate) inner: Rc<RefCell<AppInner>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self::with_config(WeftConfig::default())
    }

    pub fn from_env() -> Self {
        Self::with_config(WeftConfig::from_env())
    }

    pub fn with_config(config: WeftConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AppInner::new(config))),
        }
    }

    pub(crate) const fn from_inner(inner: Rc<RefCell<AppInner>>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<RefCell<AppInner>> {
        Rc::downgrade(&self.inner)
    }

    pub fn config(&self) -> WeftConfig {
        self.inner.borrow().config.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.borrow().lifecycle
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle() == Lifecycle::Mounted
    }

    // -----------------------
    // Global state
    // -----------------------

    /// Stores a global value and schedules a render when mounted.
    pub fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle == Lifecycle::Destroyed {
                log::warn!("state change on a destroyed application ignored");
                return;
            }
            inner.global.set(key, value);
        }
        self.schedule_render();
    }

    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.inner.borrow().global.get(key).cloned()
    }

    pub fn get_state_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner.borrow().global.get_as(key)
    }

    /// Removes a global value without scheduling a render.
    pub fn delete_state(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().global.remove(key)
    }

    /// Copy of every global value.
    pub fn all_state(&self) -> HashMap<String, Value> {
        self.inner.borrow().global.snapshot()
    }

    // -----------------------
    // Scopes and handlers
    // -----------------------

    /// Returns the scope named `name`, creating it on first use.
    ///
    /// A destroyed application hands out a handle that is never alive.
    pub fn create_scope(&self, name: &str) -> Scope {
        let generation = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle == Lifecycle::Destroyed {
                log::warn!("scope {name:?} not created: application is destroyed");
                DEAD_GENERATION
            } else {
                inner.scopes.get_or_create(name)
            }
        };
        Scope::new(name, generation, self.downgrade())
    }

    pub fn get_scope(&self, name: &str) -> Option<Scope> {
        let Some(generation) = self.inner.borrow().scopes.generation(name) else {
            log::warn!("no scope named {name:?}");
            return None;
        };
        Some(Scope::new(name, generation, self.downgrade()))
    }

    /// Registers a global handler, replacing any handler of the same name.
    ///
    /// Listeners bound by earlier renders keep their old callback until the next render.
    pub fn on<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&EventContext) + 'static,
    {
        let name = name.into();
        let replaced = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle == Lifecycle::Destroyed {
                log::warn!("handler {name:?} not registered: application is destroyed");
                return;
            }
            inner.handlers.register(name.as_str(), Rc::new(callback))
        };
        if replaced {
            log::debug!("handler {name:?} replaced");
        }
    }

    pub fn off(&self, name: &str) -> bool {
        let removed = self.inner.borrow_mut().handlers.remove(name);
        removed
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.inner.borrow().handlers.contains(name)
    }

    /// Registered handlers, global and scoped.
    pub fn handler_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    /// Live scopes.
    pub fn scope_count(&self) -> usize {
        self.inner.borrow().scopes.len()
    }

    // -----------------------
    // Lifecycle
    // -----------------------

    /// Installs the render function and renders once, synchronously.
    ///
    /// # Errors
    /// When the application is already mounted or has been destroyed.
    pub fn mount<F>(&self, render_fn: F) -> Result<()>
    where
        F: Fn(&StateMap) -> Result<Fragment> + 'static,
    {
        {
            let mut inner = self.inner.borrow_mut();
            match inner.lifecycle {
                Lifecycle::Unmounted => {}
                Lifecycle::Mounted => bail!("application is already mounted"),
                Lifecycle::Destroyed => bail!("a destroyed application cannot be mounted"),
            }
            inner.lifecycle = Lifecycle::Mounted;
            inner.render_fn = Some(Rc::new(render_fn));
        }
        log::info!("mounted application");
        self.render_now();
        Ok(())
    }

    /// Stops every timer, drops listeners, scopes, handlers and state, and empties the
    /// container. Destroying twice only warns.
    pub fn destroy(&self) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle == Lifecycle::Destroyed {
                log::warn!("application destroyed twice");
                return;
            }
            inner.lifecycle = Lifecycle::Destroyed;
            inner.scheduler.cancel();
            let timers = inner.timers.cancel_all();
            let mut released = inner.listeners.cleanup();
            released.extend(inner.handlers.take_all());
            let scopes = inner.scopes.clear();
            inner.global.clear();
            let container = inner.container;
            inner.dom.clear_children(container);
            inner.dom.drain_updates();
            log::info!("destroyed application: stopped {timers} timers, dropped {scopes} scopes");
            (released, inner.render_fn.take())
        };
        // Callbacks may own clones of this app; they drop outside the borrow.
        drop(released);
    }

    // -----------------------
    // Rendering
    // -----------------------

    /// Requests a render. Requests made before the render runs are folded into it.
    ///
    /// # Panics
    /// When called outside a [`tokio::task::LocalSet`] while a render must be queued.
    pub fn schedule_render(&self) {
        let queue = {
            let mut inner = self.inner.borrow_mut();
            inner.lifecycle == Lifecycle::Mounted && inner.scheduler.request()
        };
        if !queue {
            return;
        }
        let weak = self.downgrade();
        tokio::task::spawn_local(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let app = App::from_inner(inner);
            let claimed = app.inner.borrow_mut().scheduler.begin();
            if claimed {
                app.render_now();
            }
        });
    }

    /// Runs one render cycle immediately, bypassing the scheduler.
    ///
    /// A failing render function is logged and leaves the previous content, and its
    /// listeners, in place.
    pub fn render_now(&self) {
        let (render_fn, snapshot, focus) = {
            let inner = self.inner.borrow();
            if inner.lifecycle != Lifecycle::Mounted {
                return;
            }
            let Some(render_fn) = inner.render_fn.clone() else {
                return;
            };
            let focus = FocusSnapshot::capture(
                &inner.dom,
                inner.container,
                &inner.config.focus_attribute,
            );
            (render_fn, inner.global.clone(), focus)
        };

        let desired = match render_fn(&snapshot) {
            Ok(desired) => desired,
            Err(error) => {
                log::error!("render failed, keeping previous content: {error:#}");
                self.inner.borrow_mut().stats.failed += 1;
                return;
            }
        };

        let detached = {
            let mut inner = self.inner.borrow_mut();
            if inner.lifecycle != Lifecycle::Mounted {
                return;
            }
            inner.apply(&desired, focus.as_ref())
        };
        drop(detached);
    }

    /// Waits until no render is outstanding.
    pub async fn settle(&self) {
        while self.is_render_pending() {
            tokio::task::yield_now().await;
        }
    }

    pub fn is_render_pending(&self) -> bool {
        self.inner.borrow().scheduler.is_pending()
    }

    /// Completed renders, the initial one included.
    pub fn render_count(&self) -> u64 {
        self.inner.borrow().stats.renders
    }

    /// Render functions that returned an error.
    pub fn failed_render_count(&self) -> u64 {
        self.inner.borrow().stats.failed
    }

    /// Requests folded into an already outstanding render.
    pub fn coalesced_render_count(&self) -> u64 {
        self.inner.borrow().scheduler.coalesced()
    }

    /// Structural and content mutations the last render applied to the container, not
    /// counting binding attributes written back and stripped again by the event binder.
    pub fn last_mutation_count(&self) -> usize {
        self.inner.borrow().stats.last_mutations
    }

    // -----------------------
    // Events
    // -----------------------

    /// Delivers an event to `target`, running matching listeners on it and then on each
    /// ancestor up to, but excluding, the mount container. Returns how many ran.
    ///
    /// A listener that destroys the application stops the remaining ones.
    pub fn dispatch(&self, target: NodeId, event_type: &str) -> usize {
        let (calls, value) = {
            let inner = self.inner.borrow();
            if inner.lifecycle != Lifecycle::Mounted
                || target == inner.container
                || !inner.dom.is_inclusive_descendant(target, inner.container)
            {
                return 0;
            }
            let calls: Vec<(NodeId, Vec<(String, String)>, Handler)> = inner
                .dom
                .ancestors(target)
                .into_iter()
                .take_while(|node| *node != inner.container)
                .flat_map(|node| {
                    let attrs = inner.dom.attrs(node).to_vec();
                    inner
                        .listeners
                        .callbacks_for(node, event_type)
                        .into_iter()
                        .map(move |callback| (node, attrs.clone(), callback))
                })
                .collect();
            (calls, inner.dom.value(target).map(str::to_owned))
        };

        let mut ran = 0;
        for (current_target, attrs, callback) in calls {
            if self.lifecycle() == Lifecycle::Destroyed {
                log::debug!("{event_type} dispatch stopped: application destroyed");
                break;
            }
            let ctx = EventContext::new(
                self.clone(),
                target,
                current_target,
                event_type.to_owned(),
                attrs,
                value.clone(),
            );
            callback(&ctx);
            ran += 1;
        }
        log::trace!("{event_type} on {target:?} ran {ran} listeners");
        ran
    }

    /// Active listeners bound on `element`.
    pub fn listener_count(&self, element: NodeId) -> usize {
        self.inner.borrow().listeners.count_for(element)
    }

    /// Active listeners across the container.
    pub fn total_listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    // -----------------------
    // Host input
    // -----------------------

    pub fn focus(&self, node: NodeId) -> bool {
        self.inner.borrow_mut().dom.focus(node)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().dom.focused()
    }

    /// Types into a form control: sets its value and puts the caret at the end.
    pub fn set_value(&self, node: NodeId, value: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let changed = inner.dom.set_value(node, value);
        if changed {
            inner
                .dom
                .set_selection(node, Selection::caret(value.chars().count()));
            inner.dom.drain_updates();
        }
        changed
    }

    pub fn set_selection(&self, node: NodeId, selection: Selection) -> bool {
        self.inner.borrow_mut().dom.set_selection(node, selection)
    }

    // -----------------------
    // Inspection
    // -----------------------

    pub fn container(&self) -> NodeId {
        self.inner.borrow().container
    }

    /// First element in the container whose attribute `name` equals `value`.
    pub fn query(&self, name: &str, value: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.dom.find_by_attr(inner.container, name, value)
    }

    pub fn query_tag(&self, tag: &str) -> Vec<NodeId> {
        let inner = self.inner.borrow();
        inner.dom.find_by_tag(inner.container, tag)
    }

    pub fn inner_html(&self) -> String {
        let inner = self.inner.borrow();
        inner.dom.inner_html(inner.container)
    }

    pub fn to_json(&self) -> Value {
        let inner = self.inner.borrow();
        inner.dom.to_json(inner.container)
    }

    /// Reads the live tree. `read` must not call back into this app.
    pub fn with_dom<R>(&self, read: impl FnOnce(&Dom) -> R) -> R {
        read(&self.inner.borrow().dom)
    }

    // -----------------------
    // Timers
    // -----------------------

    /// Runs `callback` every `period`, first after one period, until cleared or destroyed.
    ///
    /// # Panics
    /// When called outside a [`tokio::task::LocalSet`].
    pub fn set_interval<F>(&self, period: Duration, callback: F) -> TimerId
    where
        F: Fn(&App) + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let id = self.inner.borrow_mut().timers.allocate();
        if self.lifecycle() == Lifecycle::Destroyed {
            log::warn!("{id} not started: application is destroyed");
            return id;
        }
        let weak = self.downgrade();
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                callback(&App::from_inner(inner));
            }
        });
        self.inner
            .borrow_mut()
            .timers
            .track(id, TimerKind::Interval, handle);
        log::debug!("{id} repeats every {period:?}");
        id
    }

    /// Runs `callback` once after `delay` unless cleared or destroyed first.
    ///
    /// # Panics
    /// When called outside a [`tokio::task::LocalSet`].
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&App) + 'static,
    {
        let id = self.inner.borrow_mut().timers.allocate();
        if self.lifecycle() == Lifecycle::Destroyed {
            log::warn!("{id} not started: application is destroyed");
            return id;
        }
        let weak = self.downgrade();
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let app = App::from_inner(inner);
            app.inner.borrow_mut().timers.finish_timeout(id);
            callback(&app);
        });
        self.inner
            .borrow_mut()
            .timers
            .track(id, TimerKind::Timeout, handle);
        id
    }

    pub fn clear_interval(&self, id: TimerId) -> bool {
        let cleared = self
            .inner
            .borrow_mut()
            .timers
            .cancel(id, TimerKind::Interval);
        cleared
    }

    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let cleared = self
            .inner
            .borrow_mut()
            .timers
            .cancel(id, TimerKind::Timeout);
        cleared
    }

    /// Timers started and neither cleared nor (for timeouts) fired.
    pub fn active_timer_count(&self) -> usize {
        self.inner.borrow().timers.len()
    }
}
