//! Condition polling with bounded timeouts.
//!
//! Every wait in a scenario goes through [`poll_until`]: the probe runs at
//! least once, then every poll interval until it reports ready or the
//! timeout elapses. [`hold_steady`] is the inverse, used where a condition
//! must keep holding for a whole window (an unchanged URL, say).
//!
//! Driver errors from a probe are returned at once, except the transient
//! ones a navigation raises while it swaps the document out; those count
//! as "not yet" and are retried.

use crate::result::E2eResult;
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for commands (4 seconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 4_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition satisfied
    Ready(T),
    /// Not yet; carries what was observed instead
    Pending(String),
}

/// Successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the probe
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes made
    pub attempts: u32,
}

/// The probe never became ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimeout {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Last observation reported by the probe
    pub last_observed: String,
}

/// Poll `probe` until it is ready or `options.timeout_ms` elapses.
///
/// The outer `Result` carries driver failures; the inner one distinguishes
/// success from a timeout so the caller can classify it.
pub async fn poll_until<T, F, Fut>(
    options: &WaitOptions,
    mut probe: F,
) -> E2eResult<Result<WaitResult<T>, PollTimeout>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Probe<T>>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match settle(probe().await)? {
            Probe::Ready(value) => {
                return Ok(Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    attempts,
                }));
            }
            Probe::Pending(observed) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Ok(Err(PollTimeout {
                        elapsed,
                        last_observed: observed,
                    }));
                }
                let remaining = timeout - elapsed;
                tokio::time::sleep(options.poll_interval().min(remaining)).await;
            }
        }
    }
}

/// Fold a transient navigation error into a pending observation
fn settle<T>(outcome: E2eResult<Probe<T>>) -> E2eResult<Probe<T>> {
    match outcome {
        Err(err) if err.is_transient() => {
            tracing::debug!(error = %err, "page navigating, retrying");
            Ok(Probe::Pending(err.to_string()))
        }
        other => other,
    }
}

/// Require `probe` to stay ready for the whole `window`.
///
/// Returns `Ok(Err(observed))` at the first sample where the condition no
/// longer holds.
pub async fn hold_steady<F, Fut>(
    window: Duration,
    poll_interval: Duration,
    mut probe: F,
) -> E2eResult<Result<(), String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<Probe<()>>>,
{
    let start = Instant::now();
    loop {
        match probe().await {
            Ok(Probe::Pending(observed)) => return Ok(Err(observed)),
            Err(err) if !err.is_transient() => return Err(err),
            _ => {}
        }
        let elapsed = start.elapsed();
        if elapsed >= window {
            return Ok(Ok(()));
        }
        tokio::time::sleep(poll_interval.min(window - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::E2eError;
    use std::sync::atomic::{AtomicU32, Ordering};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_COMMAND_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new().with_timeout(10_000).with_poll_interval(25);
            assert_eq!(opts.timeout(), Duration::from_secs(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(25));
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_ready_on_first_probe() {
            let opts = WaitOptions::new().with_timeout(0);
            let res = poll_until(&opts, || async { Ok(Probe::Ready(7)) })
                .await
                .unwrap()
                .unwrap();
            assert_eq!(res.value, 7);
            assert_eq!(res.attempts, 1);
        }

        #[tokio::test]
        async fn test_ready_after_some_attempts() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let res = poll_until(&opts, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n >= 3 {
                        Ok(Probe::Ready(n))
                    } else {
                        Ok(Probe::Pending(format!("attempt {n}")))
                    }
                }
            })
            .await
            .unwrap()
            .unwrap();
            assert_eq!(res.value, 3);
            assert_eq!(res.attempts, 4);
        }

        #[tokio::test]
        async fn test_timeout_reports_last_observation() {
            let opts = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let res = poll_until(&opts, || async {
                Ok(Probe::<()>::Pending("hidden".to_string()))
            })
            .await
            .unwrap();
            let timeout = res.unwrap_err();
            assert_eq!(timeout.last_observed, "hidden");
            assert!(timeout.elapsed >= Duration::from_millis(20));
        }

        #[tokio::test]
        async fn test_driver_error_is_not_retried() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let res: E2eResult<Result<WaitResult<()>, PollTimeout>> = poll_until(&opts, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(E2eError::page("target closed")) }
            })
            .await;
            assert!(res.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_navigation_error_is_retried() {
            let calls = AtomicU32::new(0);
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let res = poll_until(&opts, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(E2eError::page(
                            "Execution context was destroyed, most likely because of a navigation.",
                        ))
                    } else {
                        Ok(Probe::Ready("/products/hoodie"))
                    }
                }
            })
            .await
            .unwrap()
            .unwrap();
            assert_eq!(res.value, "/products/hoodie");
            assert_eq!(res.attempts, 2);
        }

        #[tokio::test]
        async fn test_navigation_error_until_timeout_is_a_timeout() {
            let opts = WaitOptions::new().with_timeout(10).with_poll_interval(2);
            let res: E2eResult<Result<WaitResult<()>, PollTimeout>> = poll_until(&opts, || async {
                Err(E2eError::page("Cannot find context with specified id"))
            })
            .await;
            let timeout = res.unwrap().unwrap_err();
            assert!(timeout.last_observed.contains("Cannot find context"));
        }
    }

    mod hold_tests {
        use super::*;

        #[tokio::test]
        async fn test_holds_for_window() {
            let calls = AtomicU32::new(0);
            let res = hold_steady(Duration::from_millis(20), Duration::from_millis(5), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Probe::Ready(())) }
            })
            .await
            .unwrap();
            assert!(res.is_ok());
            assert!(calls.load(Ordering::SeqCst) >= 2);
        }

        #[tokio::test]
        async fn test_breaks_at_first_violation() {
            let calls = AtomicU32::new(0);
            let res = hold_steady(Duration::from_secs(5), Duration::from_millis(1), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 2 {
                        Ok(Probe::Pending("/products/hoodie".to_string()))
                    } else {
                        Ok(Probe::Ready(()))
                    }
                }
            })
            .await
            .unwrap();
            assert_eq!(res.unwrap_err(), "/products/hoodie");
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_navigation_error_skips_sample() {
            let calls = AtomicU32::new(0);
            let res = hold_steady(Duration::from_millis(10), Duration::from_millis(1), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(E2eError::page("Inspected target navigated or closed"))
                    } else {
                        Ok(Probe::Ready(()))
                    }
                }
            })
            .await
            .unwrap();
            assert!(res.is_ok());
        }
    }
}
