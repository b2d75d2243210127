// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph behaviour configuration.
//!
//! Stored as RON so hosts can ship editor tweaks next to their assets.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// How many incoming links an input pin keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputLinkPolicy {
    /// A new link replaces the existing incoming link
    #[default]
    Single,
    /// Links from distinct sources accumulate
    Multiple,
}

/// What happens when a node declares a pin identifier twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePinPolicy {
    /// Log and keep the first pin
    #[default]
    Ignore,
    /// Treat it as a programming error
    Panic,
}

/// Graph-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Allow links between two pins of the same node
    pub allow_self_connection: bool,
    /// Incoming link cardinality of input pins
    pub input_links: InputLinkPolicy,
    /// Duplicate pin identifier handling
    pub duplicate_pins: DuplicatePinPolicy,
    /// Pick radius around links, in screen units
    pub link_hit_radius: f32,
    /// Thickness of the curve drawn while dragging a new link
    pub drag_preview_thickness: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            allow_self_connection: false,
            input_links: InputLinkPolicy::Single,
            duplicate_pins: DuplicatePinPolicy::Ignore,
            link_hit_radius: 6.0,
            drag_preview_thickness: 2.5,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The RON document is malformed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the configuration failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl GraphConfig {
    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::debug!("Loaded graph config from {:?}", path);
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default();
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }
}
