use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::AppError;

/// Process-wide free-tier usage counter.
///
/// Starts at zero, counts requests that run without a caller-supplied key,
/// and is never persisted. The check and the increment are separate atomic
/// operations, so concurrent sessions may slightly under- or over-count.
#[derive(Debug)]
pub struct UsageCounter {
    used: AtomicU32,
    limit: u32,
}

impl UsageCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            used: AtomicU32::new(0),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    /// Fails with `FreeTierExhausted` once the cap is reached.
    pub fn check(&self) -> Result<(), AppError> {
        if self.used() >= self.limit {
            return Err(AppError::FreeTierExhausted { limit: self.limit });
        }
        Ok(())
    }

    /// Counts one free-tier request and returns the new total.
    pub fn record(&self) -> u32 {
        self.used.fetch_add(1, Ordering::Relaxed) + 1
    }
}
