//! Per-tool-class retry, circuit-breaking, and fallback text.
//!
//! Mechanically grounded on `clawft-llm/src/retry.rs`'s backoff math;
//! the policy table, rolling error counts, reset interval, and
//! context-hinted fallback text follow
//! `original_source/my_bot/core/error_recovery.py`'s `ErrorRecoveryManager`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::warn;

/// Retry policy for one tool class.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    /// Error count above which the class is reported unavailable.
    pub threshold: u64,
}

impl RecoveryPolicy {
    fn for_class(class: &str) -> Self {
        match class {
            "edr" => Self {
                max_retries: 2,
                initial_delay: Duration::from_secs_f64(1.0),
                backoff_factor: 2.0,
                threshold: 5,
            },
            "weather" => Self {
                max_retries: 3,
                initial_delay: Duration::from_secs_f64(0.5),
                backoff_factor: 1.5,
                threshold: 10,
            },
            "docsearch" => Self {
                max_retries: 1,
                initial_delay: Duration::from_secs_f64(0.5),
                backoff_factor: 1.0,
                threshold: 8,
            },
            _ => Self {
                max_retries: 2,
                initial_delay: Duration::from_secs_f64(1.0),
                backoff_factor: 2.0,
                threshold: 8,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct RecoveryState {
    error_count: u64,
    last_reset_at: DateTime<Utc>,
}

impl RecoveryState {
    fn fresh() -> Self {
        Self {
            error_count: 0,
            last_reset_at: Utc::now(),
        }
    }
}

/// Per-class health snapshot.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub counts: HashMap<String, u64>,
    pub availability: HashMap<String, bool>,
    pub last_reset: HashMap<String, DateTime<Utc>>,
}

/// Standardises retry, circuit-breaking, and fallback text for calls into
/// fragile external tools. One instance is shared process-wide.
pub struct ErrorRecovery {
    reset_interval: ChronoDuration,
    states: Mutex<HashMap<String, RecoveryState>>,
}

impl Default for ErrorRecovery {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorRecovery {
    pub fn new() -> Self {
        Self {
            reset_interval: ChronoDuration::hours(1),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Invoke `op`, retrying on failure with exponential backoff up to the
    /// class's `max_retries`. Any error from `op` is treated as retryable;
    /// the terminal failure is propagated unchanged. Resets the class's
    /// error count on success; increments it on terminal failure.
    pub async fn run<F, Fut, T, E>(&self, class: &str, op: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let policy = RecoveryPolicy::for_class(class);
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => {
                    self.reset_count(class);
                    return Ok(value);
                }
                Err(err) => {
                    if attempt >= policy.max_retries {
                        self.record_error(class, &err.to_string());
                        return Err(err);
                    }
                    let delay = policy
                        .initial_delay
                        .mul_f64(policy.backoff_factor.powi(attempt as i32));
                    warn!(class, attempt, error = %err, "tool call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Whether the class is still accepting calls: false iff its error
    /// count exceeds its threshold and the reset interval has not elapsed.
    pub fn available(&self, class: &str) -> bool {
        let policy = RecoveryPolicy::for_class(class);
        let mut states = self.states.lock().expect("recovery state poisoned");
        let state = self.reset_if_stale(&mut states, class);
        !(state.error_count > policy.threshold)
    }

    /// A human-readable fallback message for `class`, optionally refined
    /// by a context hint such as `"status"` or `"details"`.
    pub fn fallback(&self, class: &str, context_hint: Option<&str>) -> String {
        match (class, context_hint) {
            ("edr", Some("status")) => {
                "Unable to reach the EDR platform for device status right now. \
                 Please try again shortly or check the console directly."
                    .to_string()
            }
            ("edr", Some("details")) => {
                "Unable to reach the EDR platform for device details right now. \
                 Please try again shortly or check the console directly."
                    .to_string()
            }
            ("edr", _) => "The EDR platform is temporarily unavailable.".to_string(),
            ("weather", _) => "Weather data is temporarily unavailable.".to_string(),
            ("docsearch", _) => {
                "Document search is temporarily unavailable; answering from \
                 general knowledge only."
                    .to_string()
            }
            _ => "That request couldn't be completed right now. Please try again.".to_string(),
        }
    }

    /// Snapshot of error counts, availability, and last-reset time per
    /// class that has recorded activity.
    pub fn health(&self) -> HealthStatus {
        let mut states = self.states.lock().expect("recovery state poisoned");
        let classes: Vec<String> = states.keys().cloned().collect();
        let mut counts = HashMap::new();
        let mut availability = HashMap::new();
        let mut last_reset = HashMap::new();
        for class in classes {
            let policy = RecoveryPolicy::for_class(&class);
            let state = self.reset_if_stale(&mut states, &class).clone();
            counts.insert(class.clone(), state.error_count);
            availability.insert(class.clone(), state.error_count <= policy.threshold);
            last_reset.insert(class, state.last_reset_at);
        }
        HealthStatus { counts, availability, last_reset }
    }

    fn reset_count(&self, class: &str) {
        let mut states = self.states.lock().expect("recovery state poisoned");
        states.insert(class.to_string(), RecoveryState::fresh());
    }

    fn record_error(&self, class: &str, message: &str) {
        let mut states = self.states.lock().expect("recovery state poisoned");
        let state = self.reset_if_stale(&mut states, class);
        state.error_count += 1;
        let count = state.error_count;
        if count > 10 {
            warn!(class, count, "tool class error rate exceeds 10/interval");
        }
        tracing::debug!(class, error = message, count, "tool call failed after retries");
    }

    /// Fetch (or create) a class's state, resetting it first if the reset
    /// interval has elapsed since `last_reset_at`.
    fn reset_if_stale<'a>(
        &self,
        states: &'a mut HashMap<String, RecoveryState>,
        class: &str,
    ) -> &'a mut RecoveryState {
        let now = Utc::now();
        let entry = states.entry(class.to_string()).or_insert_with(RecoveryState::fresh);
        if now - entry.last_reset_at > self.reset_interval {
            *entry = RecoveryState { error_count: 0, last_reset_at: now };
        }
        entry
    }
}
