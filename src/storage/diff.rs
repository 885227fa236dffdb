// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Diff Engine
 * Longitudinal comparison of persisted scans with trend classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashSet;
use std::fmt;
use tracing::{error, info};

use crate::errors::StorageError;
use crate::storage::manager::StorageManager;

/// Result of comparing two scans of the same domain.
#[derive(Debug, Clone)]
pub struct DiffResult {
    pub domain: String,
    pub old_scan_id: i64,
    pub new_scan_id: i64,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
    pub total_old: usize,
    pub total_new: usize,
    pub change_percent: f64,
}

/// Attack-surface trend over recent changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    RapidGrowth,
    Growth,
    Stable,
    Decline,
    RapidDecline,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::RapidGrowth => "rapid_growth",
            Trend::Growth => "growth",
            Trend::Stable => "stable",
            Trend::Decline => "decline",
            Trend::RapidDecline => "rapid_decline",
        };
        f.write_str(s)
    }
}

/// Trend analysis over the most recent change rows.
#[derive(Debug, Clone)]
pub struct TrendAnalysis {
    pub domain: String,
    pub total_changes: usize,
    pub added_count: usize,
    pub removed_count: usize,
    pub trend: Trend,
}

/// Compares persisted scans and records the resulting change rows.
pub struct Differ<'a> {
    storage: &'a StorageManager,
}

impl<'a> Differ<'a> {
    pub fn new(storage: &'a StorageManager) -> Self {
        Self { storage }
    }

    /// Compare two scans of `domain`.
    pub fn compare(
        &self,
        domain: &str,
        old_scan_id: i64,
        new_scan_id: i64,
    ) -> Result<DiffResult, StorageError> {
        info!(
            domain = domain,
            old_scan = old_scan_id,
            new_scan = new_scan_id,
            "Comparing scans"
        );

        let old_names = self.storage.get_scan_subdomains(old_scan_id)?;
        let new_names = self.storage.get_scan_subdomains(new_scan_id)?;

        let old_set: HashSet<&String> = old_names.iter().collect();
        let new_set: HashSet<&String> = new_names.iter().collect();

        let mut added: Vec<String> = new_names
            .iter()
            .filter(|name| !old_set.contains(*name))
            .cloned()
            .collect();
        let mut removed: Vec<String> = old_names
            .iter()
            .filter(|name| !new_set.contains(*name))
            .cloned()
            .collect();
        let mut unchanged: Vec<String> = new_names
            .iter()
            .filter(|name| old_set.contains(*name))
            .cloned()
            .collect();

        added.sort();
        removed.sort();
        unchanged.sort();

        let total_changes = added.len() + removed.len();
        let total_names = old_names.len() + new_names.len();
        let change_percent = if total_names > 0 {
            (total_changes as f64 / total_names as f64) * 100.0
        } else {
            0.0
        };

        let result = DiffResult {
            domain: domain.to_string(),
            old_scan_id,
            new_scan_id,
            added,
            removed,
            unchanged,
            total_old: old_names.len(),
            total_new: new_names.len(),
            change_percent,
        };

        info!(
            added = result.added.len(),
            removed = result.removed.len(),
            unchanged = result.unchanged.len(),
            change_percent = result.change_percent,
            "Diff complete"
        );

        Ok(result)
    }

    /// Compare the current scan against the most recent completed scan.
    /// Returns `None` when no prior scan exists (informational, not an
    /// error).
    pub fn compare_latest(
        &self,
        domain: &str,
        current_scan_id: i64,
    ) -> Result<Option<DiffResult>, StorageError> {
        let previous = self.storage.get_latest_scan(domain)?;

        match previous {
            Some(previous_id) if previous_id != current_scan_id => {
                Ok(Some(self.compare(domain, previous_id, current_scan_id)?))
            }
            _ => {
                info!(domain = domain, "No previous scan found for comparison");
                Ok(None)
            }
        }
    }

    /// Persist one change row per added/removed name. Row-level failures
    /// are logged and do not abort the batch.
    pub fn save_changes(&self, result: &DiffResult) -> Result<(), StorageError> {
        info!(
            domain = %result.domain,
            total_changes = result.added.len() + result.removed.len(),
            "Saving changes"
        );

        for subdomain in &result.added {
            if let Err(e) = self.storage.save_change(
                &result.domain,
                subdomain,
                "added",
                "",
                subdomain,
                result.old_scan_id,
                result.new_scan_id,
            ) {
                error!(subdomain = %subdomain, error = %e, "Failed to save change");
            }
        }

        for subdomain in &result.removed {
            if let Err(e) = self.storage.save_change(
                &result.domain,
                subdomain,
                "removed",
                subdomain,
                "",
                result.old_scan_id,
                result.new_scan_id,
            ) {
                error!(subdomain = %subdomain, error = %e, "Failed to save change");
            }
        }

        Ok(())
    }

    /// Classify the trend from the last `limit` change rows.
    pub fn detect_trends(
        &self,
        domain: &str,
        limit: usize,
    ) -> Result<TrendAnalysis, StorageError> {
        let changes = self.storage.get_recent_changes(domain, limit)?;

        let added_count = changes.iter().filter(|c| c.change_type == "added").count();
        let removed_count = changes
            .iter()
            .filter(|c| c.change_type == "removed")
            .count();

        let trend = classify_trend(added_count, removed_count);

        info!(
            domain = domain,
            trend = %trend,
            added = added_count,
            removed = removed_count,
            "Trend analysis complete"
        );

        Ok(TrendAnalysis {
            domain: domain.to_string(),
            total_changes: changes.len(),
            added_count,
            removed_count,
            trend,
        })
    }

    /// Render a human-readable change report.
    pub fn render_report(result: &DiffResult) -> String {
        let mut report = format!("Subdomain Change Report for {}\n", result.domain);
        report.push_str(&"=".repeat(result.domain.len() + 30));
        report.push_str("\n\n");

        report.push_str(&format!("Previous Scan: {} subdomains\n", result.total_old));
        report.push_str(&format!("Current Scan:  {} subdomains\n", result.total_new));
        report.push_str(&format!("Change Rate:   {:.2}%\n\n", result.change_percent));

        if !result.added.is_empty() {
            report.push_str(&format!("NEW SUBDOMAINS ({}):\n", result.added.len()));
            report.push_str(&"-".repeat(50));
            report.push('\n');
            for subdomain in &result.added {
                report.push_str(&format!("+ {subdomain}\n"));
            }
            report.push('\n');
        }

        if !result.removed.is_empty() {
            report.push_str(&format!("REMOVED SUBDOMAINS ({}):\n", result.removed.len()));
            report.push_str(&"-".repeat(50));
            report.push('\n');
            for subdomain in &result.removed {
                report.push_str(&format!("- {subdomain}\n"));
            }
            report.push('\n');
        }

        if result.added.is_empty() && result.removed.is_empty() {
            report.push_str("No changes detected.\n");
        }

        report
    }
}

/// A > 2R grows rapidly, R > 2A declines rapidly; otherwise the plain
/// comparison decides, with equality as stable.
fn classify_trend(added: usize, removed: usize) -> Trend {
    if added > removed * 2 {
        Trend::RapidGrowth
    } else if removed > added * 2 {
        Trend::RapidDecline
    } else if added > removed {
        Trend::Growth
    } else if removed > added {
        Trend::Decline
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::storage::manager::ScanTotals;
    use crate::types::Subdomain;
    use std::path::PathBuf;

    fn memory_storage() -> StorageManager {
        StorageManager::open(&StorageConfig {
            engine: "memory".to_string(),
            path: PathBuf::new(),
            cache_dir: PathBuf::new(),
        })
        .unwrap()
    }

    fn persist_scan(storage: &StorageManager, domain: &str, names: &[&str]) -> i64 {
        let scan_id = storage.create_scan(domain, "passive", &[]).unwrap();
        for name in names {
            storage
                .save_subdomain(scan_id, &Subdomain::new(*name, "crtsh"))
                .unwrap();
        }
        storage
            .complete_scan(
                scan_id,
                ScanTotals {
                    total_subdomains: names.len(),
                    validated_subdomains: 0,
                },
            )
            .unwrap();
        scan_id
    }

    #[test]
    fn added_removed_unchanged() {
        let storage = memory_storage();

        let old_scan = persist_scan(
            &storage,
            "example.com",
            &["a.example.com", "b.example.com", "c.example.com"],
        );
        let new_scan = persist_scan(
            &storage,
            "example.com",
            &["b.example.com", "c.example.com", "d.example.com"],
        );

        let differ = Differ::new(&storage);
        let result = differ.compare("example.com", old_scan, new_scan).unwrap();

        assert_eq!(result.added, vec!["d.example.com".to_string()]);
        assert_eq!(result.removed, vec!["a.example.com".to_string()]);
        assert_eq!(
            result.unchanged,
            vec!["b.example.com".to_string(), "c.example.com".to_string()]
        );
        assert_eq!(result.total_old, 3);
        assert_eq!(result.total_new, 3);
        // 100 * 2 / 6
        assert!((result.change_percent - 33.333333).abs() < 0.001);
    }

    #[test]
    fn diff_set_algebra_holds() {
        let storage = memory_storage();

        let old_scan = persist_scan(&storage, "example.com", &["a.example.com", "b.example.com"]);
        let new_scan = persist_scan(&storage, "example.com", &["b.example.com", "c.example.com"]);

        let differ = Differ::new(&storage);
        let result = differ.compare("example.com", old_scan, new_scan).unwrap();

        let added: HashSet<_> = result.added.iter().collect();
        let removed: HashSet<_> = result.removed.iter().collect();
        let unchanged: HashSet<_> = result.unchanged.iter().collect();

        assert!(added.is_disjoint(&removed));
        assert_eq!(unchanged.len() + removed.len(), result.total_old);
        assert_eq!(unchanged.len() + added.len(), result.total_new);
    }

    #[test]
    fn empty_scans_have_zero_change_percent() {
        let storage = memory_storage();

        let old_scan = persist_scan(&storage, "example.com", &[]);
        let new_scan = persist_scan(&storage, "example.com", &[]);

        let differ = Differ::new(&storage);
        let result = differ.compare("example.com", old_scan, new_scan).unwrap();

        assert_eq!(result.change_percent, 0.0);
        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn compare_latest_without_prior_scan_is_none() {
        let storage = memory_storage();
        let current = storage.create_scan("example.com", "passive", &[]).unwrap();

        let differ = Differ::new(&storage);
        assert!(differ
            .compare_latest("example.com", current)
            .unwrap()
            .is_none());
    }

    #[test]
    fn compare_latest_skips_self() {
        let storage = memory_storage();
        let only = persist_scan(&storage, "example.com", &["a.example.com"]);

        let differ = Differ::new(&storage);
        assert!(differ.compare_latest("example.com", only).unwrap().is_none());
    }

    #[test]
    fn save_changes_persists_rows() {
        let storage = memory_storage();

        let old_scan = persist_scan(&storage, "example.com", &["a.example.com"]);
        let new_scan = persist_scan(&storage, "example.com", &["d.example.com"]);

        let differ = Differ::new(&storage);
        let result = differ.compare("example.com", old_scan, new_scan).unwrap();
        differ.save_changes(&result).unwrap();

        let changes = storage.get_recent_changes("example.com", 10).unwrap();
        assert_eq!(changes.len(), 2);

        let added: Vec<_> = changes.iter().filter(|c| c.change_type == "added").collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].subdomain, "d.example.com");
        assert_eq!(added[0].new_value, "d.example.com");
        assert!(added[0].old_value.is_empty());
    }

    #[test]
    fn trend_classification() {
        assert_eq!(classify_trend(9, 1), Trend::RapidGrowth);
        assert_eq!(classify_trend(3, 2), Trend::Growth);
        assert_eq!(classify_trend(2, 2), Trend::Stable);
        assert_eq!(classify_trend(2, 3), Trend::Decline);
        assert_eq!(classify_trend(1, 9), Trend::RapidDecline);
        assert_eq!(classify_trend(0, 0), Trend::Stable);
    }

    #[test]
    fn detect_trends_reads_change_rows() {
        let storage = memory_storage();

        let old_scan = persist_scan(&storage, "example.com", &[]);
        let new_scan = persist_scan(&storage, "example.com", &[]);

        for i in 0..5 {
            storage
                .save_change(
                    "example.com",
                    &format!("s{i}.example.com"),
                    "added",
                    "",
                    &format!("s{i}.example.com"),
                    old_scan,
                    new_scan,
                )
                .unwrap();
        }

        let differ = Differ::new(&storage);
        let analysis = differ.detect_trends("example.com", 10).unwrap();

        assert_eq!(analysis.added_count, 5);
        assert_eq!(analysis.removed_count, 0);
        assert_eq!(analysis.trend, Trend::RapidGrowth);
    }

    #[test]
    fn report_renders_sections() {
        let result = DiffResult {
            domain: "example.com".to_string(),
            old_scan_id: 1,
            new_scan_id: 2,
            added: vec!["d.example.com".to_string()],
            removed: vec!["a.example.com".to_string()],
            unchanged: vec![],
            total_old: 1,
            total_new: 1,
            change_percent: 100.0,
        };

        let report = Differ::render_report(&result);
        assert!(report.contains("NEW SUBDOMAINS (1):"));
        assert!(report.contains("+ d.example.com"));
        assert!(report.contains("- a.example.com"));
    }
}
