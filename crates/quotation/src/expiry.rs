//! Quotation expiry policy.
//!
//! The age threshold is configuration, not a domain constant. Nothing in
//! this crate runs a clock; an external scheduler consults the policy and
//! triggers the `Expire` command.

use chrono::{DateTime, Duration, Utc};

const MAX_AGE_ENV: &str = "QUOTELINK_QUOTATION_MAX_AGE_DAYS";
const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// How long a quotation may stay `Pending` before it is eligible for expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    max_age: Duration,
}

impl ExpiryPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Read the threshold from `QUOTELINK_QUOTATION_MAX_AGE_DAYS`,
    /// falling back to the 30-day default when unset or unparsable.
    pub fn from_env() -> Self {
        let days = std::env::var(MAX_AGE_ENV)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_MAX_AGE_DAYS);
        Self::new(Duration::days(days))
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Pure age check: has a quotation created at `created_at` outlived the
    /// policy threshold at `now`?
    pub fn is_past_threshold(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at > self.max_age
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_MAX_AGE_DAYS))
    }
}
