use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

struct Slot {
    id: u64,
    token: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

struct DebouncerInner {
    delay: Duration,
    next_id: AtomicU64,
    slot: Mutex<Option<Slot>>,
}

/// A single-slot debouncer: each `schedule` call supersedes the previous one,
/// so only the action armed last can fire once the delay elapses undisturbed.
///
/// Must be used from within a tokio runtime; the armed action runs as a
/// spawned task.
#[derive(Clone)]
pub struct Debouncer {
    inner: Arc<DebouncerInner>,
}

/// Handle to one armed debounce slot.
pub struct DebounceHandle {
    token: CancellationToken,
}

impl DebounceHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(DebouncerInner {
                delay,
                next_id: AtomicU64::new(1),
                slot: Mutex::new(None),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Arm the slot with `action`, cancelling whatever was armed before.
    pub fn schedule<F, Fut>(&self, action: F) -> DebounceHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some(previous) = self.inner.slot.lock().take() {
            previous.token.cancel();
            previous.handle.abort();
        }

        let inner = Arc::clone(&self.inner);
        let token_for_task = token.clone();
        let delay = self.inner.delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token_for_task.cancelled() => {
                    release_slot(&inner, id);
                }
                _ = tokio::time::sleep(delay) => {
                    // Detach before running: once the timer has fired,
                    // `cancel` and re-arming must not abort the action
                    // mid-execution.
                    release_slot(&inner, id);
                    tracing::trace!(id, "debounce timer fired");
                    action().await;
                }
            }
        });

        *self.inner.slot.lock() = Some(Slot {
            id,
            token: token.clone(),
            handle,
        });

        DebounceHandle { token }
    }

    /// Disarm the slot. Returns `false` if nothing was armed.
    pub fn cancel(&self) -> bool {
        let Some(slot) = self.inner.slot.lock().take() else {
            return false;
        };
        slot.token.cancel();
        slot.handle.abort();
        true
    }

    /// Whether a timer is currently armed. Once the timer fires the slot is
    /// released, so a running action no longer counts as armed.
    pub fn is_armed(&self) -> bool {
        self.inner.slot.lock().is_some()
    }
}

/// Drop the slot entry, but only if it still belongs to task `id`; a newer
/// schedule may already own the slot.
fn release_slot(inner: &DebouncerInner, id: u64) {
    let mut slot = inner.slot.lock();
    if slot.as_ref().is_some_and(|current| current.id == id) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn burst_of_schedules_fires_once() {
        let debouncer = Debouncer::new(SHORT);
        let fired = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(Notify::new());

        for _ in 0..5 {
            let fired = Arc::clone(&fired);
            let done = Arc::clone(&done);
            debouncer.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
                done.notify_one();
            });
        }

        done.notified().await;
        // Give any superseded timers a chance to misfire before asserting.
        tokio::time::sleep(SHORT * 3).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_prevents_the_fire() {
        let debouncer = Debouncer::new(SHORT);
        let fired = Arc::new(AtomicUsize::new(0));

        {
            let fired = Arc::clone(&fired);
            debouncer.schedule(move || async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(debouncer.cancel());
        assert!(!debouncer.is_armed());

        tokio::time::sleep(SHORT * 3).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_on_empty_slot_is_a_noop() {
        let debouncer = Debouncer::new(SHORT);
        assert!(!debouncer.cancel());
        assert!(!debouncer.cancel());
    }

    #[tokio::test]
    async fn handle_cancellation_marks_the_token() {
        let debouncer = Debouncer::new(SHORT);
        let handle = debouncer.schedule(|| async {});
        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_after_fire_does_not_abort_the_running_action() {
        let debouncer = Debouncer::new(SHORT);
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let finished = Arc::new(AtomicUsize::new(0));

        {
            let started = Arc::clone(&started);
            let release = Arc::clone(&release);
            let finished = Arc::clone(&finished);
            debouncer.schedule(move || async move {
                started.notify_one();
                release.notified().await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        started.notified().await;
        // The timer has fired and the action is mid-flight; the slot must
        // already be free, so cancelling hits nothing.
        assert!(!debouncer.is_armed());
        assert!(!debouncer.cancel());

        release.notify_one();
        tokio::time::sleep(SHORT).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn later_schedule_supersedes_earlier_one() {
        let debouncer = Debouncer::new(SHORT);
        let winner = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(Notify::new());

        {
            let winner = Arc::clone(&winner);
            debouncer.schedule(move || async move {
                winner.store(1, Ordering::SeqCst);
            });
        }
        {
            let winner = Arc::clone(&winner);
            let done = Arc::clone(&done);
            debouncer.schedule(move || async move {
                winner.store(2, Ordering::SeqCst);
                done.notify_one();
            });
        }

        done.notified().await;
        assert_eq!(winner.load(Ordering::SeqCst), 2);
    }
}
