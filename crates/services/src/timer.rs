//! Cancellable timers backed by tokio tasks.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A handle to at most one pending timer task.
///
/// Arming replaces (and aborts) whatever was pending. Dropping the handle
/// cancels the task.
#[derive(Debug, Default)]
pub struct Timer {
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` once after `delay`, cancelling any pending run.
    pub fn arm<F>(&mut self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        }));
    }

    /// Run `tick` every `period`, first after one full period.
    pub fn arm_interval<F, Fut>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick().await;
            }
        }));
    }

    /// Abort the pending task, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a task is pending and has not yet finished.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let read = {
            let count = Arc::clone(&count);
            move || count.load(Ordering::SeqCst)
        };
        (count, read)
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_keeps_only_the_latest_run() {
        let (count, read) = counter();
        let mut timer = Timer::new();
        for _ in 0..3 {
            let count = Arc::clone(&count);
            timer.arm(Duration::from_millis(100), async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(timer.is_armed());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(read(), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_the_task() {
        let (count, read) = counter();
        let mut timer = Timer::new();
        let c = Arc::clone(&count);
        timer.arm(Duration::from_millis(100), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();
        timer.cancel();

        let mut dropped = Timer::new();
        let c = Arc::clone(&count);
        dropped.arm(Duration::from_millis(100), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(read(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_until_cancelled() {
        let (count, read) = counter();
        let mut timer = Timer::new();
        timer.arm_interval(Duration::from_millis(1000), move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(read(), 3);
        timer.cancel();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(read(), 3);
    }
}
