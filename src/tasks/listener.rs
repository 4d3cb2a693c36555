//! Change Listener Task
//!
//! Background task that hands option change notifications to a callback,
//! so a live cache adapter can react when its limit moves.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::options::OptionChange;

/// Spawns a task that calls `handler` for every change received on `changes`.
///
/// The task ends when the options object (and with it the sender) is dropped.
/// A receiver that falls behind logs how many changes it skipped and keeps
/// going from the oldest one still buffered.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let mut options = MemoryLimitOptions::new();
/// let handle = spawn_change_listener(options.subscribe(), |change| {
///     println!("{} -> {}", change.option, change.value);
/// });
/// options.set_memory_limit("512M")?;
/// ```
pub fn spawn_change_listener<F>(
    mut changes: broadcast::Receiver<OptionChange>,
    mut handler: F,
) -> JoinHandle<()>
where
    F: FnMut(&OptionChange) + Send + 'static,
{
    tokio::spawn(async move {
        info!("Starting option change listener");

        loop {
            match changes.recv().await {
                Ok(change) => {
                    debug!(option = %change.option, value = %change.value, "dispatching option change");
                    handler(&change);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "option change listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!("Option change listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::json;

    use crate::host::FixedMemoryLimit;
    use crate::options::{MemoryLimitOptions, Options};

    #[tokio::test]
    async fn test_listener_receives_changes() {
        let mut options = MemoryLimitOptions::with_host(FixedMemoryLimit::new("128M"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let handle = spawn_change_listener(options.subscribe(), move |change| {
            sink.lock().unwrap().push(change.value.clone());
        });

        options.set_memory_limit("1M").unwrap();
        options.set_memory_limit("1M").unwrap();
        options.set_memory_limit(2048).unwrap();

        // Dropping the options closes the channel and ends the task
        drop(options);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener should stop once options are dropped")
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![json!(1048576), json!(2048)]);
    }

    #[tokio::test]
    async fn test_listener_survives_lag() {
        let mut options = MemoryLimitOptions::with_host(FixedMemoryLimit::new(0));
        let rx = options.subscribe();

        // Overflow the buffer before the task starts reading
        for bytes in 1..=40 {
            options.set_memory_limit(bytes).unwrap();
        }

        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);
        let handle = spawn_change_listener(rx, move |_| *sink.lock().unwrap() += 1);

        drop(options);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener should stop once options are dropped")
            .unwrap();

        let count = *count.lock().unwrap();
        assert!(count > 0 && count < 40, "unexpected count {count}");
    }

    #[tokio::test]
    async fn test_listener_can_be_aborted() {
        let options = MemoryLimitOptions::with_host(FixedMemoryLimit::new(0));
        let handle = spawn_change_listener(options.subscribe(), |_| {});

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
