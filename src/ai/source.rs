// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - AI Enumeration Source
 * AI-backed candidate generation wired into the source registry
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::ai::engine::AiEngine;
use crate::errors::SourceError;
use crate::sources::{Source, SourceType};
use crate::types::SourceResult;

/// AI-enhanced discovery source. Unavailability of the backend is an
/// ordinary per-source failure; the scan proceeds without it.
pub struct AiSource {
    engine: Arc<AiEngine>,
    enabled: bool,
}

impl AiSource {
    pub fn new(engine: Arc<AiEngine>, enabled: bool) -> Self {
        Self { engine, enabled }
    }

    /// Infer patterns from already-known subdomains and return new full
    /// candidates.
    pub async fn enrich_with_patterns(
        &self,
        domain: &str,
        existing: &[String],
    ) -> Result<Vec<String>, SourceError> {
        if existing.is_empty() {
            return Ok(Vec::new());
        }

        let bare: Vec<String> = existing
            .iter()
            .map(|sub| strip_domain(sub, domain))
            .collect();

        let patterns =
            self.engine
                .infer_patterns(&bare)
                .await
                .map_err(|e| SourceError::Request {
                    source_name: self.name().to_string(),
                    reason: e.to_string(),
                })?;

        Ok(patterns
            .into_iter()
            .map(|label| format!("{label}.{domain}"))
            .collect())
    }

    /// Generate mutation candidates for one discovered subdomain.
    pub async fn mutations(
        &self,
        domain: &str,
        subdomain: &str,
    ) -> Result<Vec<String>, SourceError> {
        let bare = strip_domain(subdomain, domain);

        let mutations =
            self.engine
                .generate_mutations(&bare)
                .await
                .map_err(|e| SourceError::Request {
                    source_name: self.name().to_string(),
                    reason: e.to_string(),
                })?;

        Ok(mutations
            .into_iter()
            .map(|label| format!("{label}.{domain}"))
            .collect())
    }
}

#[async_trait]
impl Source for AiSource {
    fn name(&self) -> &str {
        "ai-enhanced"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Ai
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn enumerate(&self, domain: &str) -> Result<SourceResult, SourceError> {
        let started = Instant::now();

        if !self.engine.is_available().await {
            return Err(SourceError::AiUnavailable {
                source_name: self.name().to_string(),
                url: self.engine.backend_url().to_string(),
            });
        }

        info!(domain = domain, "Starting AI-enhanced discovery");

        let mut context: HashMap<&'static str, String> = HashMap::new();
        context.insert("Industry", infer_industry(domain).to_string());
        context.insert("CompanyType", "technology".to_string());

        let labels = match self.engine.generate_wordlist(domain, &context).await {
            Ok(labels) => labels,
            Err(e) => {
                error!(error = %e, "AI wordlist generation failed");
                Vec::new()
            }
        };

        let subdomains: Vec<String> = labels
            .into_iter()
            .map(|label| format!("{label}.{domain}"))
            .collect();

        info!(
            subdomain_count = subdomains.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "AI-enhanced discovery complete"
        );

        Ok(SourceResult {
            source: self.name().to_string(),
            subdomains,
            error: None,
            duration: started.elapsed(),
        })
    }
}

/// Remove the zone suffix from a full subdomain.
fn strip_domain(subdomain: &str, domain: &str) -> String {
    subdomain
        .strip_suffix(&format!(".{domain}"))
        .unwrap_or(subdomain)
        .to_string()
}

/// Coarse industry guess from the zone name, used as prompt context.
fn infer_industry(domain: &str) -> &'static str {
    const FINANCE: &[&str] = &["bank", "finance", "capital", "invest"];
    const HEALTH: &[&str] = &["health", "medical", "pharma", "clinic"];
    const TECH: &[&str] = &["tech", "soft", "dev", "cloud"];
    const RETAIL: &[&str] = &["shop", "store", "retail", "ecommerce"];

    if FINANCE.iter().any(|w| domain.contains(w)) {
        "finance"
    } else if HEALTH.iter().any(|w| domain.contains(w)) {
        "healthcare"
    } else if TECH.iter().any(|w| domain.contains(w)) {
        "technology"
    } else if RETAIL.iter().any(|w| domain.contains(w)) {
        "retail"
    } else {
        "general"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;

    fn offline_engine() -> Arc<AiEngine> {
        Arc::new(
            AiEngine::new(&AiConfig {
                enabled: true,
                backend_url: "http://127.0.0.1:1".to_string(),
                ..AiConfig::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn strip_domain_variants() {
        assert_eq!(strip_domain("api.example.com", "example.com"), "api");
        assert_eq!(
            strip_domain("api.staging.example.com", "example.com"),
            "api.staging"
        );
        assert_eq!(strip_domain("example.com", "example.com"), "example.com");
    }

    #[test]
    fn industry_inference() {
        assert_eq!(infer_industry("firstbank.com"), "finance");
        assert_eq!(infer_industry("cityclinic.org"), "healthcare");
        assert_eq!(infer_industry("devtools.io"), "technology");
        assert_eq!(infer_industry("bookshop.net"), "retail");
        assert_eq!(infer_industry("example.com"), "general");
    }

    #[tokio::test]
    async fn unavailable_backend_is_source_error() {
        let source = AiSource::new(offline_engine(), true);

        let result = source.enumerate("example.com").await;
        assert!(matches!(result, Err(SourceError::AiUnavailable { .. })));
    }
}
