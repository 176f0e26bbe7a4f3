//! Keystroke coalescing for the search box.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::timer::Timer;

type QueryCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Delivers a search query once typing has paused for `delay`.
///
/// A query equal to the last delivered one is not delivered again.
pub struct SearchDebouncer {
    delay: Duration,
    timer: Timer,
    last: Arc<Mutex<Option<String>>>,
    on_query: QueryCallback,
}

impl SearchDebouncer {
    pub fn new<F>(delay: Duration, on_query: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            delay,
            timer: Timer::new(),
            last: Arc::new(Mutex::new(None)),
            on_query: Arc::new(on_query),
        }
    }

    /// Record the current input; restarts the quiet period.
    pub fn input(&mut self, text: impl Into<String>) {
        let text = text.into();
        let last = Arc::clone(&self.last);
        let on_query = Arc::clone(&self.on_query);
        self.timer.arm(self.delay, async move {
            deliver(&last, on_query.as_ref(), text);
        });
    }

    /// Drop pending input and deliver an empty query right away.
    pub fn clear(&mut self) {
        self.timer.cancel();
        deliver(&self.last, self.on_query.as_ref(), String::new());
    }

    /// Drop pending input without delivering anything.
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }
}

fn deliver(last: &Mutex<Option<String>>, on_query: &(dyn Fn(String) + Send + Sync), text: String) {
    {
        let mut last = last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() == Some(text.as_str()) {
            return;
        }
        *last = Some(text.clone());
    }
    on_query(text);
}
