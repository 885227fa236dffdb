// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reconnaissance Orchestrator
 * Phase sequencer: wildcard probe, fan-out, validation, scoring, history
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::dns::resolver::ResolverPool;
use crate::dns::wildcard::WildcardDetector;
use crate::errors::ReconError;
use crate::merge;
use crate::probe::HttpProber;
use crate::scorer::ConfidenceScorer;
use crate::sources::{runner, Registry, Source};
use crate::storage::diff::{DiffResult, Differ};
use crate::storage::manager::{ScanTotals, StorageManager};
use crate::types::{DnsRecords, Subdomain, WildcardInfo};

/// Scan progress counters. All mutation goes through the mutex.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_sources: usize,
    pub completed_sources: usize,
    pub total_subdomains: usize,
    pub validated_subdomains: usize,
    pub failed_validations: usize,
    pub errors: Vec<String>,
}

/// Everything a completed scan produced.
pub struct ScanOutcome {
    pub scan_id: i64,
    pub subdomains: Vec<Subdomain>,
    pub diff: Option<DiffResult>,
    pub statistics: Statistics,
}

/// Runs the reconnaissance pipeline for one target zone.
///
/// The central subdomain table is owned here for the scan's duration;
/// sources hand results over by value and the storage layer receives an
/// immutable snapshot at persistence time.
pub struct Orchestrator {
    config: AppConfig,
    resolver: Arc<ResolverPool>,
    wildcard: WildcardDetector,
    registry: Registry,
    scorer: ConfidenceScorer,
    prober: Option<HttpProber>,
    storage: Arc<StorageManager>,
    results: RwLock<HashMap<String, Subdomain>>,
    stats: Mutex<Statistics>,
}

impl Orchestrator {
    pub fn new(config: AppConfig, storage: Arc<StorageManager>) -> Result<Self, ReconError> {
        let resolver = Arc::new(ResolverPool::new(&config.dns)?);
        let wildcard = WildcardDetector::new(Arc::clone(&resolver), config.dns.wildcard_tests);

        let prober = if config.validation.http_validation {
            Some(HttpProber::new(config.http_workers)?)
        } else {
            None
        };

        Ok(Self {
            config,
            resolver,
            wildcard,
            registry: Registry::new(),
            scorer: ConfidenceScorer::new(),
            prober,
            storage,
            results: RwLock::new(HashMap::new()),
            stats: Mutex::new(Statistics::default()),
        })
    }

    pub fn register_source(&mut self, source: Arc<dyn Source>) {
        info!(
            name = source.name(),
            source_type = %source.source_type(),
            enabled = source.is_enabled(),
            "Source registered"
        );
        self.registry.register(source);
    }

    pub fn resolver(&self) -> Arc<ResolverPool> {
        Arc::clone(&self.resolver)
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.lock().clone()
    }

    /// Run the scan with a wall-clock deadline.
    pub async fn run_with_deadline(
        &self,
        domain: &str,
        deadline: Duration,
    ) -> Result<ScanOutcome, ReconError> {
        match tokio::time::timeout(deadline, self.run(domain)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ReconError::Timeout { duration: deadline }),
        }
    }

    /// Execute the full phase sequence for one target zone.
    pub async fn run(&self, domain: &str) -> Result<ScanOutcome, ReconError> {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();

        let sources = self.registry.enabled();
        if sources.is_empty() {
            return Err(ReconError::NoEnabledSources);
        }

        info!(
            domain = %domain,
            mode = %self.config.scan_mode,
            source_count = sources.len(),
            "Starting orchestrated reconnaissance"
        );

        {
            let mut stats = self.stats.lock();
            *stats = Statistics::default();
            stats.start_time = Some(Utc::now());
            stats.total_sources = sources.len();
        }
        self.results.write().await.clear();

        let source_names: Vec<String> =
            sources.iter().map(|s| s.name().to_string()).collect();
        let scan_id = self.storage.create_scan(
            &domain,
            &self.config.scan_mode.to_string(),
            &source_names,
        )?;

        // Phase 1: wildcard probe (only meaningful when DNS validation will
        // produce addresses to filter; failure is non-fatal either way).
        let wildcard_info = if self.config.validation.dns_validation {
            info!("Phase 1: Wildcard detection");
            let info = self.wildcard.check(&domain).await;
            if info.is_wildcard {
                warn!(
                    domain = %domain,
                    pattern_ips = ?info.pattern_ips,
                    "Wildcard DNS detected - filtering will be applied"
                );
            }
            info
        } else {
            WildcardInfo::default()
        };

        // Phase 2: parallel source fan-out, merging each batch on arrival.
        info!("Phase 2: Source enumeration");
        let mut rx = runner::spawn_all(sources, &domain);
        while let Some(result) = rx.recv().await {
            match result {
                Ok(batch) => {
                    info!(
                        source = %batch.source,
                        subdomains_found = batch.subdomains.len(),
                        duration_ms = batch.duration.as_millis() as u64,
                        "Source completed"
                    );

                    let mut table = self.results.write().await;
                    merge::merge_names(&mut table, &batch, &domain);

                    let mut stats = self.stats.lock();
                    stats.completed_sources += 1;
                    stats.total_subdomains = table.len();
                }
                Err(e) => {
                    error!(error = %e, "Source enumeration failed");
                    self.stats.lock().errors.push(e.to_string());
                }
            }
        }

        // Phase 3: batched DNS validation.
        if self.config.validation.dns_validation {
            info!("Phase 3: DNS validation");
            self.validate_dns().await;
        }

        // Phase 4: optional HTTP probing of validated records.
        if let Some(prober) = &self.prober {
            info!("Phase 4: HTTP probing");
            let mut table = self.results.write().await;
            prober.probe_batch(&mut table).await;
        }

        // Phase 5: wildcard filtering.
        if wildcard_info.is_wildcard {
            info!("Phase 5: Wildcard filtering");
            let mut table = self.results.write().await;
            merge::remove_wildcard_hits(&mut table, &wildcard_info);
        }

        // Phase 6: confidence scoring.
        info!("Phase 6: Confidence scoring");
        {
            let mut table = self.results.write().await;
            self.scorer.score_all(&mut table);
        }

        // Threshold filter plus pre-persist noise/fuzzy passes.
        let finals = {
            let table = self.results.read().await;
            let records: Vec<Subdomain> = table.values().cloned().collect();
            let records = ConfidenceScorer::filter_by_confidence(
                records,
                self.config.validation.min_confidence,
            );
            let records = merge::remove_noise(records);
            let mut records = merge::fuzzy_dedupe(records);
            ConfidenceScorer::rank_by_confidence(&mut records);
            records
        };

        // Phase 7: persistence, one transaction per record.
        info!(count = finals.len(), "Phase 7: Persisting results");
        for sub in &finals {
            if let Err(e) = self.storage.save_subdomain(scan_id, sub) {
                error!(subdomain = %sub.domain, error = %e, "Failed to persist subdomain");
                self.stats.lock().errors.push(e.to_string());
            }
        }

        // Phase 8: diff against the prior completed scan. The current scan
        // is still `running`, so it can never be picked as its own
        // baseline.
        let differ = Differ::new(&self.storage);
        let diff = match differ.compare_latest(&domain, scan_id) {
            Ok(Some(result)) => {
                if let Err(e) = differ.save_changes(&result) {
                    error!(error = %e, "Failed to persist changes");
                }
                Some(result)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Diff against previous scan failed");
                None
            }
        };

        let validated_count = finals.iter().filter(|s| s.validated).count();
        if let Err(e) = self.storage.complete_scan(
            scan_id,
            ScanTotals {
                total_subdomains: finals.len(),
                validated_subdomains: validated_count,
            },
        ) {
            error!(error = %e, "Failed to complete scan; marking failed");
            let _ = self.storage.fail_scan(scan_id);
            return Err(e.into());
        }

        let statistics = {
            let mut stats = self.stats.lock();
            stats.end_time = Some(Utc::now());
            stats.clone()
        };
        self.log_statistics(&statistics);

        Ok(ScanOutcome {
            scan_id,
            subdomains: finals,
            diff,
            statistics,
        })
    }

    /// Resolve every known name and fold addresses back into the table.
    async fn validate_dns(&self) {
        let names: Vec<String> = {
            let table = self.results.read().await;
            table.keys().cloned().collect()
        };

        info!(count = names.len(), "Validating subdomains via DNS");

        let resolved = self
            .resolver
            .resolve_batch(&names, self.config.dns_workers)
            .await;

        let mut table = self.results.write().await;
        let mut validated = 0;

        for (name, ips) in resolved {
            if let Some(sub) = table.get_mut(&name) {
                sub.validated = true;
                sub.ip = ips.clone();
                sub.dns_records = Some(DnsRecords {
                    a: ips,
                    ..Default::default()
                });
                validated += 1;
            }
        }

        let failed = table.len().saturating_sub(validated);

        let mut stats = self.stats.lock();
        stats.validated_subdomains = validated;
        stats.failed_validations = failed;
    }

    fn log_statistics(&self, stats: &Statistics) {
        let duration = match (stats.start_time, stats.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds(),
            _ => 0,
        };

        info!(
            duration_ms = duration,
            sources_total = stats.total_sources,
            sources_completed = stats.completed_sources,
            subdomains_total = stats.total_subdomains,
            subdomains_validated = stats.validated_subdomains,
            validation_failures = stats.failed_validations,
            errors = stats.errors.len(),
            "Reconnaissance complete"
        );
    }
}
