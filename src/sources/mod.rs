// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Enumeration Source Registry
 * Source capability trait and registry for discovery fan-out
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod bruteforce;
pub mod crtsh;
pub mod rate;
pub mod runner;
pub mod wayback;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::SourceError;
use crate::types::SourceResult;

/// Source category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Passive,
    Active,
    Web,
    Ai,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Passive => "passive",
            SourceType::Active => "active",
            SourceType::Web => "web",
            SourceType::Ai => "ai",
        };
        f.write_str(s)
    }
}

/// Any component that produces candidate subdomain names for a target zone.
///
/// Failures stay local: a source error is recorded in scan statistics and
/// never cancels sibling sources or the scan.
#[async_trait]
pub trait Source: Send + Sync {
    /// Source identifier, also the key in the scoring weight table.
    fn name(&self) -> &str;

    fn source_type(&self) -> SourceType;

    fn is_enabled(&self) -> bool;

    /// Advisory requests-per-second limit (0 = unlimited).
    fn rate_limit(&self) -> u32 {
        0
    }

    /// Enumerate candidate subdomains of `domain`.
    async fn enumerate(&self, domain: &str) -> Result<SourceResult, SourceError>;
}

/// Registry of enumeration sources, keyed by name.
#[derive(Default)]
pub struct Registry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.name().to_string(), source);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Source>> {
        self.sources.get(name).cloned()
    }

    /// All enabled sources.
    pub fn enabled(&self) -> Vec<Arc<dyn Source>> {
        self.sources
            .values()
            .filter(|s| s.is_enabled())
            .cloned()
            .collect()
    }

    /// Enabled sources of a specific type.
    pub fn get_by_type(&self, source_type: SourceType) -> Vec<Arc<dyn Source>> {
        self.sources
            .values()
            .filter(|s| s.source_type() == source_type && s.is_enabled())
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sources.len()
    }

    pub fn count_enabled(&self) -> usize {
        self.sources.values().filter(|s| s.is_enabled()).count()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;

    fn stub(name: &str, enabled: bool) -> Arc<dyn Source> {
        Arc::new(StaticSource {
            name: name.to_string(),
            source_type: SourceType::Passive,
            enabled,
            subdomains: vec![],
        })
    }

    #[test]
    fn registry_counts_enabled_sources() {
        let mut registry = Registry::new();
        registry.register(stub("crtsh", true));
        registry.register(stub("wayback_machine", true));
        registry.register(stub("shodan", false));

        assert_eq!(registry.count(), 3);
        assert_eq!(registry.count_enabled(), 2);
        assert_eq!(registry.enabled().len(), 2);
    }

    #[test]
    fn registry_replaces_on_same_name() {
        let mut registry = Registry::new();
        registry.register(stub("crtsh", false));
        registry.register(stub("crtsh", true));

        assert_eq!(registry.count(), 1);
        assert!(registry.get("crtsh").unwrap().is_enabled());
    }

    #[test]
    fn registry_filters_by_type() {
        let mut registry = Registry::new();
        registry.register(stub("crtsh", true));
        registry.register(Arc::new(StaticSource {
            name: "dns_bruteforce".to_string(),
            source_type: SourceType::Active,
            enabled: true,
            subdomains: vec![],
        }));

        let passive = registry.get_by_type(SourceType::Passive);
        assert_eq!(passive.len(), 1);
        assert_eq!(passive[0].name(), "crtsh");
    }
}
