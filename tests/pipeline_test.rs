// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Pipeline Integration Tests
 * End-to-end orchestrator scenarios with stub sources and in-memory storage
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use luotain::config::{AppConfig, StorageConfig};
use luotain::errors::{ReconError, SourceError};
use luotain::orchestrator::Orchestrator;
use luotain::sources::{Source, SourceType};
use luotain::storage::manager::StorageManager;
use luotain::types::SourceResult;

/// Source with a fixed answer set.
struct StaticSource {
    name: String,
    subdomains: Vec<String>,
}

impl StaticSource {
    fn new(name: &str, subdomains: &[&str]) -> Arc<dyn Source> {
        Arc::new(Self {
            name: name.to_string(),
            subdomains: subdomains.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Passive
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn enumerate(&self, _domain: &str) -> Result<SourceResult, SourceError> {
        Ok(SourceResult {
            source: self.name.clone(),
            subdomains: self.subdomains.clone(),
            error: None,
            duration: Duration::from_millis(1),
        })
    }
}

/// Source that always fails.
struct BrokenSource;

#[async_trait]
impl Source for BrokenSource {
    fn name(&self) -> &str {
        "broken"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Passive
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn enumerate(&self, _domain: &str) -> Result<SourceResult, SourceError> {
        Err(SourceError::Request {
            source_name: "broken".to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// Offline test configuration: no DNS validation, no HTTP probing, no
/// confidence floor.
fn offline_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.validation.dns_validation = false;
    config.validation.http_validation = false;
    config.validation.min_confidence = 0;
    config
}

fn memory_storage() -> Arc<StorageManager> {
    Arc::new(
        StorageManager::open(&StorageConfig {
            engine: "memory".to_string(),
            path: PathBuf::new(),
            cache_dir: PathBuf::new(),
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn empty_registry_fails_without_persisting() {
    let storage = memory_storage();
    let orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    let result = orchestrator.run("example.com").await;

    assert!(matches!(result, Err(ReconError::NoEnabledSources)));
    assert_eq!(storage.statistics().unwrap().total_scans, 0);
}

#[tokio::test]
async fn single_passive_source_without_validation() {
    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    // Labels outside the common-name whitelist and at least 15 characters
    // long, so only the source weight contributes to the score.
    orchestrator.register_source(StaticSource::new(
        "crtsh",
        &[
            "northwindtelemetry.example.com",
            "quartermasterdesk.example.com",
        ],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();

    assert_eq!(outcome.subdomains.len(), 2);
    for sub in &outcome.subdomains {
        assert_eq!(sub.sources, vec!["crtsh".to_string()]);
        assert!(!sub.validated);
        assert!(sub.ip.is_empty());
        assert_eq!(sub.confidence, 15);
        assert!(sub.first_seen <= sub.last_seen);
    }

    // The scan row was persisted and completed.
    assert_eq!(storage.get_latest_scan("example.com").unwrap(), Some(outcome.scan_id));
    let persisted = storage.get_scan_subdomains(outcome.scan_id).unwrap();
    assert_eq!(persisted.len(), 2);
}

#[tokio::test]
async fn duplicate_across_sources_merges_into_one_record() {
    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    orchestrator.register_source(StaticSource::new(
        "crtsh",
        &["northwindtelemetry.example.com"],
    ));
    orchestrator.register_source(StaticSource::new(
        "wayback_machine",
        &["northwindtelemetry.example.com"],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();

    assert_eq!(outcome.subdomains.len(), 1);
    let sub = &outcome.subdomains[0];

    let mut sources = sub.sources.clone();
    sources.sort();
    assert_eq!(
        sources,
        vec!["crtsh".to_string(), "wayback_machine".to_string()]
    );

    // 15 + 10 + log2(2) * 5 = 30 from the source component alone.
    assert_eq!(sub.confidence, 30);
}

#[tokio::test]
async fn source_failure_is_recorded_not_fatal() {
    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    orchestrator.register_source(Arc::new(BrokenSource));
    orchestrator.register_source(StaticSource::new(
        "crtsh",
        &["northwindtelemetry.example.com"],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();

    assert_eq!(outcome.subdomains.len(), 1);
    assert_eq!(outcome.statistics.completed_sources, 1);
    assert_eq!(outcome.statistics.total_sources, 2);
    assert_eq!(outcome.statistics.errors.len(), 1);
    assert!(outcome.statistics.errors[0].contains("connection refused"));
}

#[tokio::test]
async fn out_of_scope_candidates_are_dropped() {
    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    orchestrator.register_source(StaticSource::new(
        "crtsh",
        &[
            "northwindtelemetry.example.com",
            "intruder.other.org",
            "*.quartermasterdesk.example.com",
        ],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();

    let mut names: Vec<&str> = outcome
        .subdomains
        .iter()
        .map(|s| s.domain.as_str())
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "northwindtelemetry.example.com",
            "quartermasterdesk.example.com"
        ]
    );
}

#[tokio::test]
async fn diff_between_consecutive_scans() {
    let storage = memory_storage();

    let mut first = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();
    first.register_source(StaticSource::new(
        "crtsh",
        &["alpha.example.com", "bravo.example.com", "charlie.example.com"],
    ));
    let first_outcome = first.run("example.com").await.unwrap();
    assert!(first_outcome.diff.is_none());

    let mut second = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();
    second.register_source(StaticSource::new(
        "crtsh",
        &["bravo.example.com", "charlie.example.com", "delta.example.com"],
    ));
    let second_outcome = second.run("example.com").await.unwrap();

    let diff = second_outcome.diff.expect("second scan should diff");
    assert_eq!(diff.old_scan_id, first_outcome.scan_id);
    assert_eq!(diff.new_scan_id, second_outcome.scan_id);
    assert_eq!(diff.added, vec!["delta.example.com".to_string()]);
    assert_eq!(diff.removed, vec!["alpha.example.com".to_string()]);
    assert_eq!(
        diff.unchanged,
        vec!["bravo.example.com".to_string(), "charlie.example.com".to_string()]
    );
    assert!((diff.change_percent - 100.0 * 2.0 / 6.0).abs() < 0.001);

    // Change rows were persisted.
    let changes = storage.get_recent_changes("example.com", 10).unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes
        .iter()
        .any(|c| c.change_type == "added" && c.subdomain == "delta.example.com"));
    assert!(changes
        .iter()
        .any(|c| c.change_type == "removed" && c.subdomain == "alpha.example.com"));
}

#[tokio::test]
async fn min_confidence_filters_low_scores() {
    let storage = memory_storage();

    let mut config = offline_config();
    // Unknown source weight is 5; a bare unvalidated record cannot reach 50.
    config.validation.min_confidence = 50;

    let mut orchestrator = Orchestrator::new(config, Arc::clone(&storage)).unwrap();
    orchestrator.register_source(StaticSource::new(
        "mystery_plugin",
        &["northwindtelemetry.example.com"],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();
    assert!(outcome.subdomains.is_empty());
}

#[tokio::test]
async fn noise_candidates_never_reach_persistence() {
    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();

    orchestrator.register_source(StaticSource::new(
        "crtsh",
        &[
            "northwindtelemetry.example.com",
            "wildcard-test-1234-0.example.com",
            "_dmarc.example.com",
        ],
    ));

    let outcome = orchestrator.run("example.com").await.unwrap();

    assert_eq!(outcome.subdomains.len(), 1);
    assert_eq!(outcome.subdomains[0].domain, "northwindtelemetry.example.com");

    let persisted = storage.get_scan_subdomains(outcome.scan_id).unwrap();
    assert_eq!(persisted, vec!["northwindtelemetry.example.com".to_string()]);
}

#[tokio::test]
async fn scan_deadline_yields_timeout_error() {
    struct SlowSource;

    #[async_trait]
    impl Source for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn source_type(&self) -> SourceType {
            SourceType::Passive
        }

        fn is_enabled(&self) -> bool {
            true
        }

        async fn enumerate(&self, _domain: &str) -> Result<SourceResult, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(SourceResult::new("slow"))
        }
    }

    let storage = memory_storage();
    let mut orchestrator = Orchestrator::new(offline_config(), Arc::clone(&storage)).unwrap();
    orchestrator.register_source(Arc::new(SlowSource));

    let result = orchestrator
        .run_with_deadline("example.com", Duration::from_millis(100))
        .await;

    assert!(matches!(result, Err(ReconError::Timeout { .. })));
}
