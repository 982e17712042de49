//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between the last keystroke and the account search it triggers.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Number of candidate accounts requested per search.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;

/// Minimum time a destructive confirmation must wait after it was first requested.
pub const DEFAULT_DELIBERATION_DELAY_MS: u64 = 3000;

/// Timing and paging knobs shared by the engine services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub search_debounce_ms: u64,
    pub search_page_size: u32,
    pub deliberation_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            deliberation_delay_ms: DEFAULT_DELIBERATION_DELAY_MS,
        }
    }
}

impl EngineConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn deliberation_delay(&self) -> Duration {
        Duration::from_millis(self.deliberation_delay_ms)
    }
}
