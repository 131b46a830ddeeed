//! In-process request protector.
//!
//! Evaluates shield signatures, then bot user agents, then a sliding-window
//! log of admitted request instants keyed by rule and client IP. Counters
//! live in this process only; nothing is shared between replicas.

mod classify;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{ProtectionError, RequestProtector};
use crate::domain::{DenialReason, RateLimitDecision, RateLimitRule, RequestFingerprint};

/// Number of tracked keys above which idle windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

type WindowLog = HashMap<String, VecDeque<DateTime<Utc>>>;

/// Sliding-window protector with shield and bot classification.
pub struct SlidingWindowProtector {
    windows: Mutex<WindowLog>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowProtector {
    /// Create an empty protector reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn admit(&self, key: String, window: TimeDelta, max: u32) -> Result<bool, ProtectionError> {
        let now = self.clock.utc();
        let horizon = now - window;
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| ProtectionError::evaluation("window log lock poisoned"))?;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, log| log.back().is_some_and(|last| *last > horizon));
        }

        let log = windows.entry(key).or_default();
        while log.front().is_some_and(|first| *first <= horizon) {
            log.pop_front();
        }
        let capacity = usize::try_from(max).unwrap_or(usize::MAX);
        if log.len() >= capacity {
            return Ok(false);
        }
        log.push_back(now);
        Ok(true)
    }
}

#[async_trait]
impl RequestProtector for SlidingWindowProtector {
    async fn protect(
        &self,
        rule: &RateLimitRule,
        request: &RequestFingerprint,
    ) -> Result<RateLimitDecision, ProtectionError> {
        if classify::is_attack(request.path())? {
            debug!(path = request.path(), "shield signature matched");
            return Ok(RateLimitDecision::deny(DenialReason::Shield));
        }
        if classify::is_disallowed_bot(request.user_agent())? {
            debug!(user_agent = request.user_agent(), "automated client detected");
            return Ok(RateLimitDecision::deny(DenialReason::Bot));
        }

        let window = TimeDelta::from_std(rule.window())
            .map_err(|err| ProtectionError::evaluation(format!("window out of range: {err}")))?;
        let key = format!("{}:{}", rule.key(), request.client_ip());
        if self.admit(key, window, rule.max())? {
            Ok(RateLimitDecision::allow())
        } else {
            Ok(RateLimitDecision::deny(DenialReason::RateLimit))
        }
    }
}
