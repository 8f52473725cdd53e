//! Virtual clock that never blocks.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::clock::Clock;

/// Clock whose sleeps complete immediately and advance virtual time.
///
/// Suited to single-task tests: the poller runs to completion without
/// waiting, and the recorded sleeps show which delays were chosen. For
/// several concurrent pollers use the tokio clock with paused time instead,
/// since this clock advances the same counter for every caller.
#[derive(Debug, Default)]
pub struct SteppingClock {
    now: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        *lock(&self.now)
    }

    async fn sleep(&self, duration: Duration) {
        *lock(&self.now) += duration;
        lock(&self.sleeps).push(duration);
        tokio::task::yield_now().await;
    }
}
