//! Memory Limit Options
//!
//! Holds the byte threshold past which a cache adapter refuses writes.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{OptionsError, Result};
use crate::host::{EnvMemoryLimit, HostMemoryLimit, UNLIMITED};
use crate::options::{
    normalize, normalize_option_key, ChangeNotifier, Options, SizeValue, MEMORY_LIMIT,
};

// == Memory Limit Options ==
/// Memory limit option for a cache storage adapter.
///
/// The limit is a byte count: zero or negative means no limit is enforced.
/// It starts at half the host-reported memory limit and may be overwritten
/// with byte counts or shorthand strings such as `"256M"`.
///
/// Not synchronized; callers sharing an instance across threads must
/// serialize access.
pub struct MemoryLimitOptions {
    /// Resolved limit in bytes, `None` until resolved
    memory_limit: Option<i64>,
    host: Box<dyn HostMemoryLimit>,
    notifier: ChangeNotifier,
}

impl MemoryLimitOptions {
    // == Constructors ==
    /// Creates options defaulted from the environment-backed host limit.
    pub fn new() -> Self {
        Self::with_host(EnvMemoryLimit::new())
    }

    /// Creates options defaulted to half of `host`'s reported limit.
    pub fn with_host(host: impl HostMemoryLimit + 'static) -> Self {
        let mut options = Self::deferred(host);
        let reported = options.host_limit();
        options.memory_limit = Some(reported / 2);
        options
    }

    /// Creates options whose limit is resolved on first read instead of now.
    pub fn deferred(host: impl HostMemoryLimit + 'static) -> Self {
        Self {
            memory_limit: None,
            host: Box::new(host),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Creates options from `host`, then applies `source` through the setters.
    ///
    /// # Errors
    /// Propagates the first error raised while applying `source`.
    pub fn from_source<I, K>(host: impl HostMemoryLimit + 'static, source: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut options = Self::with_host(host);
        options.set_from_iter(source)?;
        Ok(options)
    }

    // == Set Memory Limit ==
    /// Sets the limit from a byte count or shorthand size string.
    ///
    /// Emits one `memory_limit` change notification when the normalized value
    /// differs from the stored one; otherwise does nothing.
    ///
    /// # Errors
    /// `InvalidArgument` when `value` is not a valid size.
    pub fn set_memory_limit(&mut self, value: impl Into<SizeValue>) -> Result<&mut Self> {
        let bytes = normalize(value)?;
        if self.memory_limit != Some(bytes) {
            self.notifier.notify(MEMORY_LIMIT, bytes);
            self.memory_limit = Some(bytes);
        }
        Ok(self)
    }

    // == Get Memory Limit ==
    /// Returns the limit in bytes, resolving it from the host on first use.
    ///
    /// A lazily resolved limit is half the host limit, or `0` when the host
    /// reports a negative (unlimited) value. The result is cached until the
    /// next `set_memory_limit` or `reset_memory_limit`.
    pub fn memory_limit(&mut self) -> i64 {
        if let Some(bytes) = self.memory_limit {
            return bytes;
        }

        let reported = self.host_limit();
        let bytes = if reported < 0 { 0 } else { reported / 2 };
        debug!(reported, bytes, "resolved memory limit from host");
        self.memory_limit = Some(bytes);
        bytes
    }

    /// Returns the limit to the unresolved state. No notification is sent.
    pub fn reset_memory_limit(&mut self) -> &mut Self {
        self.memory_limit = None;
        self
    }

    /// Whether `usage_bytes` fits under the limit. A non-positive limit
    /// allows everything.
    pub fn is_within_limit(&mut self, usage_bytes: u64) -> bool {
        let limit = self.memory_limit();
        limit <= 0 || usage_bytes <= limit as u64
    }

    /// Normalized host limit; an unparseable report counts as unlimited.
    fn host_limit(&self) -> i64 {
        let reported = self.host.memory_limit();
        match normalize(reported.clone()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(reported = %reported, error = %err, "ignoring invalid host memory limit");
                UNLIMITED
            }
        }
    }
}

impl Default for MemoryLimitOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryLimitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLimitOptions")
            .field("memory_limit", &self.memory_limit)
            .field("subscribers", &self.notifier.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl Options for MemoryLimitOptions {
    fn set_option(&mut self, key: &str, value: &Value) -> Result<()> {
        match normalize_option_key(key).as_str() {
            "memorylimit" => {
                let size = SizeValue::from_option_value(MEMORY_LIMIT, value)?;
                self.set_memory_limit(size)?;
                Ok(())
            }
            _ => Err(OptionsError::UnknownOption(key.to_string())),
        }
    }

    fn get_option(&mut self, key: &str) -> Result<Value> {
        match normalize_option_key(key).as_str() {
            "memorylimit" => Ok(Value::from(self.memory_limit())),
            _ => Err(OptionsError::UnknownOption(key.to_string())),
        }
    }

    fn to_map(&mut self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(MEMORY_LIMIT.to_string(), Value::from(self.memory_limit()));
        map
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
