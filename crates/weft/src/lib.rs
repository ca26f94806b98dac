//! Reactive UI micro-library.
//!
//! An [`App`] renders a component tree from its global state into a mount container.
//! State changes schedule a render; requests are coalesced so a burst of changes costs
//! one render. Each render reconciles the live tree against the freshly rendered one,
//! keeping focus and cursor position in form controls, and rebinds event handlers from
//! declarative `data-events` attributes. Components keep private state and namespaced
//! handlers in named [`Scope`]s. Timers started through the app stop when it is destroyed.
//!
//! ```no_run
//! use weft::{App, Slot, render};
//!
//! # async fn counter() -> anyhow::Result<()> {
//! let app = App::new();
//! app.set_state("count", 0);
//! app.on("increment", |ctx| {
//!     let count = ctx.app.get_state_as::<i64>("count").unwrap_or_default();
//!     ctx.app.set_state("count", count + 1);
//! });
//! app.mount(|state| {
//!     let count = state.get_as::<i64>("count").unwrap_or_default();
//!     render(
//!         &["<button data-events='{\"click\":\"increment\"}'>", "</button>"],
//!         &[Slot::from(count)],
//!     )
//! })?;
//! app.settle().await;
//! # Ok(())
//! # }
//! ```

#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

mod app;
pub mod config;
mod events;
mod focus;
mod handlers;
mod scheduler;
mod scope;
pub mod state;
mod timers;

pub use app::{App, Lifecycle, RenderFn};
pub use config::{RenderStrategy, WeftConfig};
pub use dom::{DesiredNode, Dom, Fragment, NodeId, Selection};
pub use handlers::{EventContext, Handler};
pub use scope::Scope;
pub use serde_json::Value;
pub use state::StateMap;
pub use template::{Slot, Template, escape, markup, parse, render};
pub use timers::TimerId;
