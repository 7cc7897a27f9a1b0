// Read-only context feed.
//
// A display surface wants a periodically refreshed view of the selection
// without ever blocking (or being blocked by) command processing. The
// refresh task and the dispatcher share nothing mutable: the task reads
// the host under its own lock acquisition and publishes an immutable
// snapshot into a slot the display reads at its leisure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use gridmind_core::SpreadsheetContext;
use gridmind_host::SpreadsheetHost;

use crate::context::build_context;

/// Shared slot holding the most recently published snapshot.
#[derive(Clone)]
pub struct ContextFeed {
    slot: Arc<Mutex<Arc<SpreadsheetContext>>>,
}

impl ContextFeed {
    pub fn new() -> Self {
        Self { slot: Arc::new(Mutex::new(Arc::new(SpreadsheetContext::empty()))) }
    }

    /// Publish a fresh snapshot, replacing the previous one.
    pub fn publish(&self, context: SpreadsheetContext) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(context);
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<SpreadsheetContext> {
        let guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }
}

impl Default for ContextFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running refresh task. Dropping it stops the task.
pub struct RefreshHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Signal the task to stop and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the periodic refresh task. It only ever reads the host; the
/// host's own lock is the sole synchronization point with command
/// processing.
pub fn spawn_refresh<H>(
    host: Arc<Mutex<H>>,
    feed: ContextFeed,
    interval: Duration,
) -> RefreshHandle
where
    H: SpreadsheetHost + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let join = std::thread::spawn(move || {
        // Poll in short slices so stop() returns promptly even with a
        // long refresh interval.
        let slice = Duration::from_millis(25);
        loop {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            let snapshot = {
                let guard = host.lock().unwrap_or_else(|e| e.into_inner());
                build_context(&*guard)
            };
            feed.publish(snapshot);

            let mut slept = Duration::ZERO;
            while slept < interval {
                if stop_flag.load(Ordering::Relaxed) {
                    return;
                }
                let nap = slice.min(interval - slept);
                std::thread::sleep(nap);
                slept += nap;
            }
        }
    });

    RefreshHandle { stop, join: Some(join) }
}
