//! Device capability profile driving caching decisions.

use serde::{Deserialize, Serialize};

/// Memory (MB) below which full worksite data is not cached.
pub const FULL_CACHE_MIN_MEMORY_MB: u64 = 3_072;

/// Short worksite page size on capable devices.
pub const SHORT_PAGE_SIZE_CAPABLE: u32 = 60;

/// Short worksite page size on constrained devices.
pub const SHORT_PAGE_SIZE_CONSTRAINED: u32 = 30;

/// Full worksite page size on capable devices.
pub const FULL_PAGE_SIZE: u32 = 30;

/// Floor for adaptive page sizing.
pub const MIN_PAGE_SIZE: u32 = 10;

/// Capabilities of the device running the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    pub total_memory_mb: u64,
    pub metered_connection: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            total_memory_mb: 4_096,
            metered_connection: false,
        }
    }
}

impl DeviceCapabilities {
    pub fn new(total_memory_mb: u64, metered_connection: bool) -> Self {
        Self {
            total_memory_mb,
            metered_connection,
        }
    }

    /// Full worksite data is cached only on devices with memory headroom
    /// and an unmetered connection.
    pub fn allows_full_caching(&self) -> bool {
        self.total_memory_mb >= FULL_CACHE_MIN_MEMORY_MB && !self.metered_connection
    }

    /// Starting page size for short worksite pulls.
    pub fn short_page_size(&self) -> u32 {
        if self.total_memory_mb >= FULL_CACHE_MIN_MEMORY_MB {
            SHORT_PAGE_SIZE_CAPABLE
        } else {
            SHORT_PAGE_SIZE_CONSTRAINED
        }
    }
}
