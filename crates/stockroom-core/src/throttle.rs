//! Failed-login counting and temporary lockout.
//!
//! Each username accumulates consecutive failures. Reaching the limit
//! locks the username until the lockout window passes; a correct login
//! clears the record. Failures older than the lockout window no longer
//! count and their records are dropped, so usernames that never log in
//! do not pile up. Callers pass the current time in, which keeps the
//! policy deterministic under test.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// A username is locked until the contained instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lockout {
    /// When the lockout ends.
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AttemptRecord {
    failures: u32,
    last_failure: DateTime<Utc>,
    locked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    /// Neither locked nor holding failures recent enough to count.
    fn is_stale(&self, window: Duration, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) => until <= now,
            None => self
                .last_failure
                .checked_add_signed(window)
                .is_some_and(|expires| expires < now),
        }
    }
}

/// Tracks failed logins per username.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    max_attempts: u32,
    lockout: Duration,
    records: BTreeMap<String, AttemptRecord>,
}

impl LoginThrottle {
    /// Create a throttle. `max_attempts == 0` disables lockout entirely.
    pub fn new(max_attempts: u32, lockout_minutes: u32) -> Self {
        Self {
            max_attempts,
            lockout: Duration::minutes(i64::from(lockout_minutes)),
            records: BTreeMap::new(),
        }
    }

    /// Whether lockout is enabled at all.
    pub const fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Check whether `username` may attempt a login at `now`.
    ///
    /// An expired lockout or stale failure count is cleared here, giving
    /// the user a fresh count.
    pub fn check(&mut self, username: &str, now: DateTime<Utc>) -> Result<(), Lockout> {
        let Some(record) = self.records.get(username) else {
            return Ok(());
        };

        if record.is_stale(self.lockout, now) {
            self.records.remove(username);
            return Ok(());
        }
        match record.locked_until {
            Some(until) => Err(Lockout { until }),
            None => Ok(()),
        }
    }

    /// Record a failed attempt. Returns the lockout if this failure
    /// triggered one.
    pub fn record_failure(&mut self, username: &str, now: DateTime<Utc>) -> Option<Lockout> {
        if !self.is_enabled() {
            return None;
        }

        self.prune(now);
        let record = self
            .records
            .entry(username.to_owned())
            .or_insert_with(|| AttemptRecord {
                failures: 0,
                last_failure: now,
                locked_until: None,
            });
        record.failures = record.failures.saturating_add(1);
        record.last_failure = now;

        if record.failures >= self.max_attempts {
            let until = now.checked_add_signed(self.lockout).unwrap_or(now);
            record.locked_until = Some(until);
            record.failures = 0;
            return Some(Lockout { until });
        }
        None
    }

    /// Forget all failures for `username`.
    pub fn record_success(&mut self, username: &str) {
        self.records.remove(username);
    }

    /// Number of failures counted toward the next lockout.
    pub fn failures(&self, username: &str) -> u32 {
        self.records.get(username).map_or(0, |r| r.failures)
    }

    /// Number of usernames with a live record.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Drop every record that no longer affects a login at `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.lockout;
        self.records.retain(|_, record| !record.is_stale(window, now));
    }
}
