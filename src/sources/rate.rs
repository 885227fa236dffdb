// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Per-Source Rate Gate
 * Token bucket gating for sources that talk to external services
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Advisory per-source request gate. A zero rate means unlimited.
pub struct SourceGate {
    limiter: Option<DirectLimiter>,
}

impl SourceGate {
    pub fn new(requests_per_second: u32) -> Self {
        let limiter = if requests_per_second == 0 {
            None
        } else {
            let quota =
                Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32)));
            Some(RateLimiter::direct(quota))
        };

        Self { limiter }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
