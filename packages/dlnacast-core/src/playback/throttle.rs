//! Single-slot "latest wins" throttle.
//!
//! Each submission overwrites the pending value. A drain task waits out the
//! window after the first submission, then dispatches whatever is in the slot
//! at that moment. Bursts collapse into one dispatch of the last value.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub struct Throttle<T> {
    slot: Arc<Mutex<Option<T>>>,
    notify: Arc<Notify>,
}

impl<T: Send + 'static> Throttle<T> {
    /// Spawns the drain task. `dispatch` runs once per window at most and is
    /// awaited before the next window starts; values submitted meanwhile
    /// keep replacing each other in the slot.
    pub fn spawn<F, Fut>(window: Duration, cancel: CancellationToken, mut dispatch: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let slot: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        let notify = Arc::new(Notify::new());

        let task_slot = Arc::clone(&slot);
        let task_notify = Arc::clone(&notify);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = task_notify.notified() => {}
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(window) => {}
                }
                let pending = task_slot.lock().take();
                if let Some(value) = pending {
                    dispatch(value).await;
                }
            }
        });

        Self { slot, notify }
    }

    /// Replaces the pending value. Returns `true` if an earlier value was
    /// dropped.
    pub fn submit(&self, value: T) -> bool {
        let replaced = self.slot.lock().replace(value).is_some();
        // notify_one stores a permit if the task is not waiting yet
        self.notify.notify_one();
        replaced
    }
}
