//! Throttled status reporting.
//!
//! The host UI only needs coarse progress, so emissions are rate-limited to
//! the configured interval. Terminal emissions (`done = true`) always pass.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::events::{Event, EventEmitter, EventError, StatusData, StatusLevel, StatusPhase};

/// Rate-limits outbound progress notifications to a host emitter.
///
/// The last-emission timestamp is instance state shared by every request on
/// the owning pipe. It sits behind a mutex so overlapping requests cannot
/// race it; the only contention cost is notification-timing jitter.
#[derive(Debug)]
pub struct StatusReporter {
    enabled: bool,
    interval: Duration,
    last_emit: Mutex<Option<Instant>>,
}

impl StatusReporter {
    /// Create a reporter.
    ///
    /// `enabled = false` disables all emissions, including terminal ones.
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval,
            last_emit: Mutex::new(None),
        }
    }

    /// Emit one status event through `emitter`, subject to the throttle.
    ///
    /// The event goes out only when the reporter is enabled AND one of:
    /// `done` is set, nothing was emitted yet, or the configured interval
    /// has elapsed since the previous emission. The timestamp is updated on
    /// every emission.
    ///
    /// # Errors
    ///
    /// Propagates [`EventError`] from the emitter unchanged; throttling
    /// never fails.
    pub async fn report(
        &self,
        emitter: &dyn EventEmitter,
        level: StatusLevel,
        description: impl Into<String>,
        done: bool,
    ) -> Result<(), EventError> {
        if !self.enabled {
            return Ok(());
        }

        let description = description.into();
        let now = Instant::now();
        {
            let mut last = match self.last_emit.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let due = match *last {
                None => true,
                Some(prev) => now.duration_since(prev) >= self.interval,
            };
            if !done && !due {
                tracing::trace!(%description, "status emission suppressed by throttle");
                return Ok(());
            }
            *last = Some(now);
        }

        let status = if done {
            StatusPhase::Complete
        } else {
            StatusPhase::InProgress
        };
        emitter
            .emit(Event::Status(StatusData {
                status,
                level,
                description,
                done,
            }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CountingEmitter {
        count: AtomicUsize,
        last: Mutex<Option<StatusData>>,
    }

    #[async_trait]
    impl EventEmitter for CountingEmitter {
        async fn emit(&self, event: Event) -> Result<(), EventError> {
            let Event::Status(data) = event;
            self.count.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().expect("not poisoned") = Some(data);
            Ok(())
        }
    }

    fn reporter(secs: u64) -> StatusReporter {
        StatusReporter::new(true, Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_emission_always_passes() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = reporter(2);
        r.report(emitter.as_ref(), StatusLevel::Info, "a", false)
            .await
            .expect("emit ok");
        assert_eq!(emitter.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_emission_within_interval_suppressed() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = reporter(2);
        r.report(emitter.as_ref(), StatusLevel::Info, "a", false)
            .await
            .expect("emit ok");
        tokio::time::advance(Duration::from_millis(500)).await;
        r.report(emitter.as_ref(), StatusLevel::Info, "b", false)
            .await
            .expect("emit ok");
        assert_eq!(emitter.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_bypasses_throttle() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = reporter(2);
        r.report(emitter.as_ref(), StatusLevel::Info, "a", false)
            .await
            .expect("emit ok");
        r.report(emitter.as_ref(), StatusLevel::Info, "finished", true)
            .await
            .expect("emit ok");
        assert_eq!(emitter.count.load(Ordering::SeqCst), 2);
        let last = emitter
            .last
            .lock()
            .expect("not poisoned")
            .clone()
            .expect("has event");
        assert_eq!(last.status, StatusPhase::Complete);
        assert!(last.done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emission_after_interval_passes() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = reporter(2);
        r.report(emitter.as_ref(), StatusLevel::Info, "a", false)
            .await
            .expect("emit ok");
        tokio::time::advance(Duration::from_secs(2)).await;
        r.report(emitter.as_ref(), StatusLevel::Info, "b", false)
            .await
            .expect("emit ok");
        assert_eq!(emitter.count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_reporter_never_emits() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = StatusReporter::new(false, Duration::from_secs(0));
        r.report(emitter.as_ref(), StatusLevel::Error, "a", true)
            .await
            .expect("emit ok");
        r.report(emitter.as_ref(), StatusLevel::Info, "b", false)
            .await
            .expect("emit ok");
        assert_eq!(emitter.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_emission_resets_window() {
        let emitter = Arc::new(CountingEmitter::default());
        let r = reporter(2);
        r.report(emitter.as_ref(), StatusLevel::Info, "terminal", true)
            .await
            .expect("emit ok");
        tokio::time::advance(Duration::from_millis(100)).await;
        r.report(emitter.as_ref(), StatusLevel::Info, "again", false)
            .await
            .expect("emit ok");
        // Window restarted at the terminal emission, so this one is early.
        assert_eq!(emitter.count.load(Ordering::SeqCst), 1);
    }
}
