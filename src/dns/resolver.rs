// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Rotating Resolver Pool
 * Round-robin recursive DNS with rate limiting, retry and backoff
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::stream::{self, StreamExt};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::DnsConfig;
use crate::dns::cache::DnsCache;
use crate::errors::DnsError;

/// Rotating, rate-limited pool of recursive resolvers.
///
/// One resolver handle is built per configured upstream (UDP port 53).
/// Each call picks the next resolver round-robin; a global semaphore bounds
/// requests in flight. Failed attempts retry with linear backoff
/// (`attempt x 100ms`) while rotating to the next resolver.
pub struct ResolverPool {
    resolvers: Vec<TokioResolver>,
    addresses: Vec<IpAddr>,
    index: Mutex<usize>,
    gate: Option<Semaphore>,
    cache: DnsCache,
    timeout: Duration,
    retries: u32,
}

impl ResolverPool {
    pub fn new(cfg: &DnsConfig) -> Result<Self, DnsError> {
        if cfg.resolvers.is_empty() {
            return Err(DnsError::NoResolvers);
        }

        let timeout = Duration::from_secs(cfg.timeout);

        let mut addresses = Vec::with_capacity(cfg.resolvers.len());
        let mut resolvers = Vec::with_capacity(cfg.resolvers.len());

        for raw in &cfg.resolvers {
            let addr: IpAddr = raw.trim().parse().map_err(|_| DnsError::InvalidResolver {
                address: raw.clone(),
            })?;

            let group = NameServerConfigGroup::from_ips_clear(&[addr], 53, true);
            let config = ResolverConfig::from_parts(None, vec![], group);

            let mut builder = TokioResolver::builder_with_config(
                config,
                TokioConnectionProvider::default(),
            );
            // Retries are the pool's job, one shot per upstream attempt.
            builder.options_mut().timeout = timeout;
            builder.options_mut().attempts = 1;

            resolvers.push(builder.build());
            addresses.push(addr);
        }

        let gate = if cfg.rate_limit > 0 {
            Some(Semaphore::new(cfg.rate_limit))
        } else {
            None
        };

        Ok(Self {
            resolvers,
            addresses,
            index: Mutex::new(0),
            gate,
            cache: DnsCache::new(),
            timeout,
            retries: cfg.retries,
        })
    }

    /// Resolve a name to its A/AAAA addresses.
    ///
    /// Failure after all retries means "not validated" to callers, never
    /// record deletion.
    pub async fn resolve(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        if let Some(cached) = self.cache.get(domain).await {
            return Ok(cached);
        }

        let _permit = match &self.gate {
            Some(gate) => gate.acquire().await.ok(),
            None => None,
        };

        let mut last_error = String::new();
        let mut timed_out = false;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                // Linear backoff, rotate to the next resolver on retry.
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }

            let slot = self.next_slot();
            let resolver = &self.resolvers[slot];

            match tokio::time::timeout(self.timeout, resolver.lookup_ip(domain)).await {
                Ok(Ok(lookup)) => {
                    let ips: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
                    if !ips.is_empty() {
                        self.cache.insert(domain, ips.clone()).await;
                        return Ok(ips);
                    }
                    timed_out = false;
                    last_error = "empty answer".to_string();
                }
                Ok(Err(e)) => {
                    timed_out = false;
                    last_error = e.to_string();
                }
                Err(_) => {
                    timed_out = true;
                    last_error = "deadline exceeded".to_string();
                }
            }

            debug!(
                domain = domain,
                resolver = %self.addresses[slot],
                attempt = attempt + 1,
                error = %last_error,
                "DNS resolution attempt failed"
            );
        }

        if timed_out {
            Err(DnsError::Timeout {
                domain: domain.to_string(),
                duration: self.timeout,
            })
        } else {
            Err(DnsError::ResolverFailure {
                domain: domain.to_string(),
                attempts: self.retries + 1,
                reason: last_error,
            })
        }
    }

    /// Resolve many names with a bounded worker set. Only names that
    /// resolved successfully appear in the result map.
    pub async fn resolve_batch(
        &self,
        domains: &[String],
        workers: usize,
    ) -> HashMap<String, Vec<String>> {
        let resolved: Vec<Option<(String, Vec<String>)>> = stream::iter(domains.to_vec())
            .map(|domain| async move {
                match self.resolve(&domain).await {
                    Ok(ips) => Some((domain, ips)),
                    Err(_) => None,
                }
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        resolved.into_iter().flatten().collect()
    }

    pub fn cache(&self) -> &DnsCache {
        &self.cache
    }

    fn next_slot(&self) -> usize {
        let mut index = self.index.lock();
        let slot = *index;
        *index = (slot + 1) % self.resolvers.len();
        slot
    }
}
