use crate::render::Renderer;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Global switch for statement caching. When off, every call compiles a
    /// transient statement regardless of its `use_cache` flag.
    pub cache_plans: bool,
    /// Maximum passes for nested template rendering (`1..=10000`).
    pub max_depth: usize,
    /// Whether to log executed SQL.
    pub logging_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_plans: true,
            max_depth: Renderer::DEFAULT_MAX_DEPTH,
            logging_enabled: false,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global statement caching switch.
    pub fn cache_plans(mut self, enabled: bool) -> Self {
        self.cache_plans = enabled;
        self
    }

    /// Disable statement caching for every call.
    pub fn no_cache(mut self) -> Self {
        self.cache_plans = false;
        self
    }

    /// Set the maximum nested rendering depth, clamped to `1..=10000`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, Renderer::MAX_DEPTH_LIMIT);
        self
    }

    /// Enable SQL logging.
    pub fn with_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// The renderer matching this configuration.
    pub fn renderer(&self) -> Renderer {
        Renderer::new().max_depth(self.max_depth)
    }
}
