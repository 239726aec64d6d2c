/// Cancellable delayed work, polled from frame or timer timestamps.
///
/// Used for the Space Lab "experiment run": the result is computed when
/// the deadline passes, unless the screen cancelled the task first.

use std::cell::Cell;
use std::rc::Rc;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPoll<T> {
    Pending,
    Ready(T),
    Cancelled,
    /// Already yielded its result (or cancellation) earlier.
    Finished,
}

pub struct DelayedTask<T> {
    started_ms: f64,
    deadline_ms: f64,
    token: CancelToken,
    work: Option<Box<dyn FnOnce() -> T>>,
}

impl<T> DelayedTask<T> {
    pub fn new(started_ms: f64, delay_ms: f64, work: impl FnOnce() -> T + 'static) -> Self {
        Self {
            started_ms,
            deadline_ms: started_ms + delay_ms.max(0.0),
            token: CancelToken::new(),
            work: Some(Box::new(work)),
        }
    }

    /// A handle the owner keeps to cancel on teardown.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fraction of the delay elapsed at `now_ms`, 0.0..=1.0.
    pub fn progress(&self, now_ms: f64) -> f64 {
        let span = self.deadline_ms - self.started_ms;
        if span <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / span).clamp(0.0, 1.0)
    }

    pub fn poll(&mut self, now_ms: f64) -> TaskPoll<T> {
        if self.token.is_cancelled() {
            return match self.work.take() {
                Some(_) => TaskPoll::Cancelled,
                None => TaskPoll::Finished,
            };
        }
        if now_ms < self.deadline_ms {
            return if self.work.is_some() {
                TaskPoll::Pending
            } else {
                TaskPoll::Finished
            };
        }
        match self.work.take() {
            Some(work) => TaskPoll::Ready(work()),
            None => TaskPoll::Finished,
        }
    }
}
