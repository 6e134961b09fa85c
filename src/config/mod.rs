//! Configuration parsing and types.
//!
//! - `types` - Config structure (`SupervisorConfig`, `ContainerConfig`, ...)
//! - `duration` - Human-readable duration strings
//! - `parser` - YAML config discovery and parsing

mod duration;
mod parser;
mod types;

pub use duration::*;
pub use parser::*;
pub use types::*;

use std::time::Duration;

/// Delay before every readiness probe.
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between stopping the first-boot container and running it again.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Poll interval for the `poll_gone` settle strategy.
pub const DEFAULT_SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Upper bound for the `poll_gone` settle strategy.
pub const DEFAULT_SETTLE_POLL_TIMEOUT: Duration = Duration::from_secs(10);
