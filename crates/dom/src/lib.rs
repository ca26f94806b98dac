//! Live DOM tree, desired-tree types and the reconciler that merges one into the other.
//!
//! The live tree is an arena of [`DOMNode`]s owned by a [`Dom`]. Render passes produce
//! detached [`DesiredNode`] trees, and [`reconcile`] patches the live children of a node so
//! they match a desired child list with as few mutations as an index-aligned walk allows.
//! Every mutation can be journaled as a [`DOMUpdate`] for mirrors and diagnostics.

#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

pub mod desired;
mod printing;
pub mod reconcile;
mod tree;
mod updating;

pub use desired::{DesiredNode, Fragment};
pub use indextree::NodeId;
pub use reconcile::{patch, reconcile};
pub use tree::{DOMNode, Dom, NodeKind, Selection};
pub use updating::DOMUpdate;
