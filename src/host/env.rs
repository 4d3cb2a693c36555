//! Environment-backed host memory limit.

use std::env;

use tracing::debug;

use super::{HostMemoryLimit, UNLIMITED};
use crate::options::SizeValue;

/// Environment variable holding the process memory limit (e.g. `128M`, `-1`).
pub const MEMORY_LIMIT_ENV: &str = "MEMORY_LIMIT";

// == Env Memory Limit ==
/// Default host: the `MEMORY_LIMIT` environment variable, then the cgroup
/// memory limit on Linux, then unlimited.
#[derive(Debug, Clone, Default)]
pub struct EnvMemoryLimit;

impl EnvMemoryLimit {
    pub fn new() -> Self {
        Self
    }
}

impl HostMemoryLimit for EnvMemoryLimit {
    fn memory_limit(&self) -> SizeValue {
        if let Ok(raw) = env::var(MEMORY_LIMIT_ENV) {
            debug!(source = MEMORY_LIMIT_ENV, raw = %raw, "host memory limit from environment");
            return SizeValue::Text(raw);
        }

        if let Some(bytes) = cgroup_limit() {
            debug!(bytes, "host memory limit from cgroup");
            return SizeValue::Bytes(bytes);
        }

        SizeValue::Bytes(UNLIMITED)
    }
}

#[cfg(target_os = "linux")]
fn cgroup_limit() -> Option<i64> {
    super::cgroup::cgroup_memory_limit_bytes().and_then(|bytes| i64::try_from(bytes).ok())
}

#[cfg(not(target_os = "linux"))]
fn cgroup_limit() -> Option<i64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_memory_limit_reads_variable() {
        env::set_var(MEMORY_LIMIT_ENV, "256M");
        let reported = EnvMemoryLimit::new().memory_limit();
        env::remove_var(MEMORY_LIMIT_ENV);

        assert_eq!(reported, SizeValue::Text("256M".to_string()));
    }
}
