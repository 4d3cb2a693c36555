//! Host Module
//!
//! Sources for the process-wide memory limit reported by the host.
//!
//! The reported value is passed verbatim to size normalization, so a host may
//! report shorthand strings ("128M"), raw byte counts, or `-1` for unlimited.

mod cgroup;
mod env;

pub use cgroup::{parse_cgroup_memory_limit_bytes, parse_proc_self_cgroup, ProcSelfCgroup};
pub use env::{EnvMemoryLimit, MEMORY_LIMIT_ENV};

use crate::options::SizeValue;

/// Value reported when the host imposes no memory limit.
pub const UNLIMITED: i64 = -1;

// == Host Memory Limit ==
/// A read-only query for the host's configured memory limit.
pub trait HostMemoryLimit: Send + Sync {
    /// Returns the current limit in whatever shape the host reports it.
    fn memory_limit(&self) -> SizeValue;
}

impl<F> HostMemoryLimit for F
where
    F: Fn() -> SizeValue + Send + Sync,
{
    fn memory_limit(&self) -> SizeValue {
        self()
    }
}

// == Fixed Memory Limit ==
/// Host that always reports the same limit.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedMemoryLimit(pub SizeValue);

impl FixedMemoryLimit {
    pub fn new(limit: impl Into<SizeValue>) -> Self {
        Self(limit.into())
    }

    pub fn unlimited() -> Self {
        Self(SizeValue::Bytes(UNLIMITED))
    }
}

impl HostMemoryLimit for FixedMemoryLimit {
    fn memory_limit(&self) -> SizeValue {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_memory_limit() {
        let host = FixedMemoryLimit::new("128M");
        assert_eq!(host.memory_limit(), SizeValue::Text("128M".to_string()));
    }

    #[test]
    fn test_fixed_unlimited() {
        assert_eq!(
            FixedMemoryLimit::unlimited().memory_limit(),
            SizeValue::Bytes(-1)
        );
    }

    #[test]
    fn test_closure_is_host() {
        let host = || SizeValue::from(4096);
        assert_eq!(host.memory_limit(), SizeValue::Bytes(4096));
    }
}
