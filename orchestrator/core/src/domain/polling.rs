// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Polling Policy for submit-then-poll providers.
//!
//! Each asynchronous job walks an explicit state machine:
//!
//! ```text
//! Submitted ──job id──▶ Pending ──ready──▶ Complete
//!                        │  ▲
//!              not ready │  │ sleep(interval)
//!                        ▼  │
//!                       Pending ──deadline──▶ TimedOut
//!                          └──unexpected status──▶ Failed
//! ```
//!
//! Time is read through the [`Clock`] trait so tests can drive every
//! transition with a [`ManualClock`] instead of waiting in real time.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::prediction::PredictionError;

/// Interval for providers whose result page can be polled cheaply.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Interval for providers that only expose a slow job-status endpoint.
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(1300);

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on or advanced explicitly.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// What one look at the job endpoint reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobProbe {
    NotReady,
    Ready(String),
    Unexpected(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Submitted,
    Pending { job_id: String, attempts: u32 },
    Complete { job_id: String, body: String },
    TimedOut { job_id: String, elapsed: Duration },
    Failed { job_id: String, error: PredictionError },
}

impl JobState {
    /// `Submitted → Pending` once the provider handed back a job id.
    pub fn accept(self, job_id: impl Into<String>) -> Self {
        match self {
            JobState::Submitted => JobState::Pending {
                job_id: job_id.into(),
                attempts: 0,
            },
            other => other,
        }
    }

    /// Apply one probe result to a pending job. Terminal states are sticky.
    pub fn observe(self, probe: JobProbe) -> Self {
        let (job_id, attempts) = match self {
            JobState::Pending { job_id, attempts } => (job_id, attempts),
            other => return other,
        };

        match probe {
            JobProbe::NotReady => JobState::Pending {
                job_id,
                attempts: attempts + 1,
            },
            JobProbe::Ready(body) => JobState::Complete { job_id, body },
            JobProbe::Unexpected(status) => JobState::Failed {
                job_id,
                error: PredictionError::ProviderUnavailable(format!(
                    "unexpected status {} while polling",
                    status
                )),
            },
        }
    }

    pub fn fail(self, error: PredictionError) -> Self {
        match self {
            JobState::Pending { job_id, .. } => JobState::Failed { job_id, error },
            other => other,
        }
    }

    pub fn expire(self, elapsed: Duration) -> Self {
        match self {
            JobState::Pending { job_id, .. } => JobState::TimedOut { job_id, elapsed },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Complete { .. } | JobState::TimedOut { .. } | JobState::Failed { .. }
        )
    }

    /// Collapse a terminal state into the completed body or a failure.
    pub fn into_body(self) -> Result<String, PredictionError> {
        match self {
            JobState::Complete { body, .. } => Ok(body),
            JobState::TimedOut { elapsed, .. } => Err(PredictionError::TimedOut { elapsed }),
            JobState::Failed { error, .. } => Err(error),
            JobState::Submitted | JobState::Pending { .. } => Err(PredictionError::ProviderUnavailable(
                "job polling stopped before reaching a terminal state".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollingPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn fast(timeout: Duration) -> Self {
        Self::new(FAST_POLL_INTERVAL, timeout)
    }

    pub fn slow(timeout: Duration) -> Self {
        Self::new(SLOW_POLL_INTERVAL, timeout)
    }

    /// Poll `probe` until the job completes, fails, or `timeout` has elapsed
    /// since `started`. The deadline is checked before every probe, each
    /// probe is bounded by the time left, and a timed-out job is never
    /// retried.
    pub async fn run<F, Fut>(
        &self,
        clock: &dyn Clock,
        started: Instant,
        job_id: &str,
        mut probe: F,
    ) -> JobState
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<JobProbe, PredictionError>> + Send,
    {
        let mut state = JobState::Submitted.accept(job_id);

        loop {
            let elapsed = clock.now().saturating_duration_since(started);
            if elapsed > self.timeout {
                return state.expire(elapsed);
            }

            // A probe still in flight at the deadline is abandoned.
            let remaining = self.timeout.saturating_sub(elapsed);
            let observed = tokio::select! {
                biased;
                result = probe() => Some(result),
                _ = clock.sleep(remaining) => None,
            };

            state = match observed {
                Some(Ok(observation)) => state.observe(observation),
                Some(Err(e)) => state.fail(e),
                None => {
                    let elapsed = clock.now().saturating_duration_since(started);
                    debug!(job_id, elapsed_secs = elapsed.as_secs(), "Probe outlived the deadline");
                    return state.expire(elapsed);
                }
            };

            if state.is_terminal() {
                return state;
            }

            if let JobState::Pending { attempts, .. } = &state {
                debug!(job_id, attempts, elapsed_secs = elapsed.as_secs(), "Job not ready yet");
            }
            clock.sleep(self.interval).await;
        }
    }
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self::fast(DEFAULT_JOB_TIMEOUT)
    }
}
