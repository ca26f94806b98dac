//! Configuration for an application container.
//!
//! Settings can be loaded from environment variables or built programmatically. The
//! defaults match what component markup conventionally uses: `data-events` for event
//! bindings and `id` for locating the focused element across renders.

use core::str::FromStr;
use std::env;

use anyhow::{Error, anyhow};

/// How renders after the first one update the mount container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Patch the live children against the desired tree.
    #[default]
    Reconcile,
    /// Throw the previous content away and build the desired tree from scratch.
    Replace,
}

impl FromStr for RenderStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reconcile" | "patch" => Ok(Self::Reconcile),
            "replace" => Ok(Self::Replace),
            other => Err(anyhow!("unknown render strategy {other:?}")),
        }
    }
}

/// Runtime configuration for an [`App`](crate::App).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeftConfig {
    /// Attribute holding an element's JSON event-to-handler map
    pub binding_attribute: String,
    /// Attribute used to find the focused element again after a render
    pub focus_attribute: String,
    /// Update strategy for renders after the first
    pub strategy: RenderStrategy,
    /// Whether the live tree journals its mutations, feeding `last_mutation_count`
    pub record_mutations: bool,
    /// `id` given to the mount container element
    pub container_id: String,
}

impl Default for WeftConfig {
    fn default() -> Self {
        Self {
            binding_attribute: String::from("data-events"),
            focus_attribute: String::from("id"),
            strategy: RenderStrategy::default(),
            record_mutations: true,
            container_id: String::from("app"),
        }
    }
}

impl WeftConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `WEFT_BINDING_ATTR`: event binding attribute (default: `data-events`)
    /// - `WEFT_FOCUS_ATTR`: focus-identifying attribute (default: `id`)
    /// - `WEFT_RENDER_STRATEGY`: `reconcile` or `replace` (default: `reconcile`)
    /// - `WEFT_RECORD_MUTATIONS`: set to "0" to disable the mutation journal
    ///
    /// Unparseable values fall back to the default with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let binding_attribute = env::var("WEFT_BINDING_ATTR")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.binding_attribute);
        let focus_attribute = env::var("WEFT_FOCUS_ATTR")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.focus_attribute);
        let strategy = env::var("WEFT_RENDER_STRATEGY")
            .ok()
            .and_then(|raw| {
                raw.parse::<RenderStrategy>()
                    .map_err(|error| log::warn!("WEFT_RENDER_STRATEGY ignored: {error}"))
                    .ok()
            })
            .unwrap_or(defaults.strategy);
        let record_mutations = env::var("WEFT_RECORD_MUTATIONS").ok().as_deref() != Some("0");
        Self {
            binding_attribute,
            focus_attribute,
            strategy,
            record_mutations,
            container_id: defaults.container_id,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_binding_attribute(mut self, name: impl Into<String>) -> Self {
        self.binding_attribute = name.into();
        self
    }

    #[must_use]
    pub fn with_focus_attribute(mut self, name: impl Into<String>) -> Self {
        self.focus_attribute = name.into();
        self
    }

    #[must_use]
    pub const fn with_mutation_journal(mut self, enabled: bool) -> Self {
        self.record_mutations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Replace".parse::<RenderStrategy>().ok(), Some(RenderStrategy::Replace));
        assert_eq!(" reconcile ".parse::<RenderStrategy>().ok(), Some(RenderStrategy::Reconcile));
        assert!("morph".parse::<RenderStrategy>().is_err());
    }

    #[test]
    fn builders_override_defaults() {
        let config = WeftConfig::default()
            .with_strategy(RenderStrategy::Replace)
            .with_binding_attribute("data-on")
            .with_focus_attribute("data-key");

        assert_eq!(config.strategy, RenderStrategy::Replace);
        assert_eq!(config.binding_attribute, "data-on");
        assert_eq!(config.focus_attribute, "data-key");
        assert!(config.record_mutations);
    }
}
