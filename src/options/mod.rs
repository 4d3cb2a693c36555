//! Options Module
//!
//! Option holders for cache storage adapters: applying a configuration
//! source through setters, and notifying subscribers when a value changes.

mod memory;
mod size;


pub use memory::MemoryLimitOptions;
pub use size::{normalize, unit_exponent, SizeValue};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;

// == Public Constants ==
/// Canonical name of the memory limit option
pub const MEMORY_LIMIT: &str = "memory_limit";

/// Pending notifications kept per subscriber before it starts lagging
pub const CHANGE_CHANNEL_CAPACITY: usize = 16;

// == Option Change ==
/// Notification emitted when a setter changes a stored value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChange {
    /// Canonical option name (e.g. `memory_limit`)
    pub option: String,
    /// The new, normalized value
    pub value: Value,
    /// When the change was made
    pub changed_at: DateTime<Utc>,
}

// == Change Notifier ==
/// Broadcasts option changes to the subscribers of one options object.
#[derive(Debug)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<OptionChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Registers a new subscriber. It only sees changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<OptionChange> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends one change notification. Having no subscribers is not an error.
    pub fn notify(&self, option: &str, value: impl Into<Value>) {
        let change = OptionChange {
            option: option.to_string(),
            value: value.into(),
            changed_at: Utc::now(),
        };
        debug!(option, value = %change.value, "option changed");
        // Err only means nobody is listening
        let _ = self.sender.send(change);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

// == Option Keys ==
/// Folds an option key so `memory_limit`, `memoryLimit` and `MEMORY-LIMIT`
/// address the same setter.
pub fn normalize_option_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// == Options Trait ==
/// Common behavior of option holders: keyed access to setters and getters,
/// applying a configuration source, and change subscription.
pub trait Options {
    /// Sets one option through its setter.
    ///
    /// # Errors
    /// `UnknownOption` when no setter matches `key`, or whatever the setter
    /// reports for an invalid value.
    fn set_option(&mut self, key: &str, value: &Value) -> Result<()>;

    /// Reads one option through its getter.
    fn get_option(&mut self, key: &str) -> Result<Value>;

    /// All options under their canonical names.
    fn to_map(&mut self) -> Map<String, Value>;

    /// The notifier change events are published on.
    fn notifier(&self) -> &ChangeNotifier;

    /// Applies key/value pairs in order, stopping at the first failure.
    fn set_from_iter<I, K>(&mut self, source: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (key, value) in source {
            self.set_option(key.as_ref(), &value)?;
        }
        Ok(())
    }

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<OptionChange> {
        self.notifier().subscribe()
    }
}
