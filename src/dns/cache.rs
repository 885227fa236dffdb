// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - DNS Answer Cache
 * Positive-answer caching with moka, TTL and hit/miss metrics
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Default TTL for cached answer sets (5 minutes)
const DEFAULT_DNS_TTL: u64 = 300;

/// Default maximum cache size
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Positive-answer DNS cache. Only successful resolutions are stored so a
/// transient failure never shadows a later success.
pub struct DnsCache {
    cache: Cache<String, Vec<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_MAX_CAPACITY, DEFAULT_DNS_TTL)
    }

    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, domain: &str) -> Option<Vec<String>> {
        match self.cache.get(domain).await {
            Some(ips) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("DNS cache hit for: {}", domain);
                Some(ips)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn insert(&self, domain: &str, ips: Vec<String>) {
        if !ips.is_empty() {
            self.cache.insert(domain.to_string(), ips).await;
        }
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    pub async fn size(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub fn stats(&self) -> DnsCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        DnsCacheStats {
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

/// DNS cache statistics
#[derive(Debug, Clone)]
pub struct DnsCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
