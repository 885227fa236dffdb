// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Wildcard DNS Detector
 * Probe-based wildcard zone characterization with a per-zone cache
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::dns::resolver::ResolverPool;
use crate::types::WildcardInfo;

/// Detects whether a zone answers arbitrary random labels.
///
/// Results are cached per zone for the lifetime of the detector (one scan);
/// the cache is written once per zone.
pub struct WildcardDetector {
    pool: Arc<ResolverPool>,
    tests: usize,
    cache: RwLock<HashMap<String, WildcardInfo>>,
}

impl WildcardDetector {
    pub fn new(pool: Arc<ResolverPool>, tests: usize) -> Self {
        Self {
            pool,
            tests: tests.max(1),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Characterize a zone, using the per-zone cache when warm.
    pub async fn check(&self, domain: &str) -> WildcardInfo {
        {
            let cache = self.cache.read().await;
            if let Some(info) = cache.get(domain) {
                return info.clone();
            }
        }

        let info = self.detect(domain).await;

        let mut cache = self.cache.write().await;
        cache
            .entry(domain.to_string())
            .or_insert_with(|| info.clone());

        info
    }

    async fn detect(&self, domain: &str) -> WildcardInfo {
        let mut info = WildcardInfo {
            detected_at: Some(Utc::now()),
            ..Default::default()
        };

        let probes = generate_probe_labels(domain, self.tests);

        let mut resolved_count = 0;
        let mut patterns: Vec<String> = Vec::new();

        for probe in probes {
            match self.pool.resolve(&probe).await {
                Ok(ips) if !ips.is_empty() => {
                    resolved_count += 1;
                    for ip in &ips {
                        if !patterns.contains(ip) {
                            patterns.push(ip.clone());
                        }
                    }
                    info.test_results.insert(probe, ips);
                }
                _ => {
                    debug!(domain = domain, probe = %probe, "wildcard probe did not resolve");
                }
            }
        }

        // If nearly all random labels answer, the zone is a wildcard.
        if resolved_count >= self.tests.saturating_sub(1) && resolved_count > 0 {
            info.is_wildcard = true;
            info.pattern_ips = patterns;

            warn!(
                domain = domain,
                test_count = self.tests,
                resolved_count = resolved_count,
                pattern_ips = ?info.pattern_ips,
                "Wildcard DNS detected"
            );
        }

        info
    }

    /// Seed the per-zone cache. Used when wildcard state is already known
    /// (for example from a prior phase within the same scan).
    pub async fn prime(&self, domain: &str, info: WildcardInfo) {
        let mut cache = self.cache.write().await;
        cache.entry(domain.to_string()).or_insert(info);
    }
}

/// High-entropy labels that are statistically certain not to exist.
fn generate_probe_labels(domain: &str, count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..count)
        .map(|i| format!("wildcard-test-{:016x}-{}.{}", rng.random::<u64>(), i, domain))
        .collect()
}
