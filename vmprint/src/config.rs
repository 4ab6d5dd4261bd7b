//! Forwarder configuration types
//!
//! The forwarder needs very little configuration: an optional cap on the
//! size of a single rendered message and whether a panicking sink is
//! contained or allowed to unwind into the caller.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Forwarder`](crate::Forwarder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Reject messages longer than this many bytes (terminator excluded)
    #[serde(default)]
    pub max_message_len: Option<usize>,

    /// Catch a panicking sink, log it and return normally
    #[serde(default = "default_true")]
    pub catch_sink_panics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_message_len: None,
            catch_sink_panics: true,
        }
    }
}

impl ForwarderConfig {
    /// Create a new forwarder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: cap the rendered message length
    pub fn with_max_message_len(mut self, limit: usize) -> Self {
        self.max_message_len = Some(limit);
        self
    }

    /// Builder method: contain or propagate sink panics
    pub fn with_catch_sink_panics(mut self, enabled: bool) -> Self {
        self.catch_sink_panics = enabled;
        self
    }

    /// Check a measured length against the configured cap
    pub fn allows_len(&self, len: usize) -> bool {
        match self.max_message_len {
            Some(limit) => len <= limit,
            None => true,
        }
    }
}
