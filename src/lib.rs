//! Cache Options - memory limit options for cache storage adapters
//!
//! Normalizes size strings ("256M", "1G") into byte counts, defaults the limit
//! from the host memory limit, and notifies subscribers when it changes.

pub mod config;
pub mod error;
pub mod host;
pub mod options;
pub mod tasks;

pub use config::Config;
pub use error::{OptionsError, Result};
pub use host::{EnvMemoryLimit, FixedMemoryLimit, HostMemoryLimit};
pub use options::{normalize, MemoryLimitOptions, OptionChange, Options, SizeValue};
pub use tasks::spawn_change_listener;
