//! Tunables of the transaction core.

use std::time::Duration;

use crate::deadline::Deadline;

/// Default ceiling on an item's image payload (1 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 1 << 20;

/// Default time budget for one mutating operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration consumed by the marketplace services.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Largest accepted image payload in bytes.
    pub max_image_bytes: usize,

    /// Budget applied to each request-scoped unit of work.
    pub operation_timeout: Duration,
}

impl MarketConfig {
    /// Deadline for a unit of work starting now.
    pub fn request_deadline(&self) -> Deadline {
        Deadline::after(self.operation_timeout)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}
