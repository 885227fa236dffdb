// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Confidence Scorer
 * Weighted multi-component scoring of discovered subdomains (0-100)
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::Subdomain;

/// Weight for sources that are not in the credibility table
/// (including plugin-supplied names).
const UNKNOWN_SOURCE_WEIGHT: f64 = 5.0;

const SOURCE_CAP: f64 = 40.0;
const VALIDATION_CAP: f64 = 30.0;
const RESPONSE_CAP: f64 = 20.0;
const PATTERN_CAP: f64 = 10.0;

/// First labels that commonly exist in real zones.
const COMMON_PATTERNS: &[&str] = &[
    "www", "api", "mail", "ftp", "smtp", "pop", "imap", "dev", "staging", "stage", "test", "qa",
    "prod", "production", "admin", "portal", "dashboard", "app", "mobile", "m", "blog", "shop",
    "store", "cdn", "static", "assets", "vpn", "remote", "secure", "login", "auth", "us", "eu",
    "asia", "uk", "ca",
];

/// Substrings that mark probe residue and junk candidates.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    "wildcard-test",
    "random",
    "localhost",
    "invalid",
    "example",
    "test-test-test",
];

/// Calculates confidence scores from source credibility, validation state,
/// response quality and naming heuristics. Scores are recomputed every
/// scan; nothing historical carries forward.
pub struct ConfidenceScorer {
    source_weights: HashMap<&'static str, f64>,
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        let source_weights = HashMap::from([
            // Passive sources (high reliability)
            ("crtsh", 15.0),
            ("certificate_transparency", 15.0),
            ("virustotal", 12.0),
            ("passive_dns", 12.0),
            ("wayback_machine", 10.0),
            ("common_crawl", 8.0),
            ("shodan", 10.0),
            ("censys", 10.0),
            // Active sources (medium reliability, needs validation)
            ("dns_bruteforce", 8.0),
            ("permutations", 6.0),
            ("recursive", 7.0),
            // Web sources
            ("http_probing", 10.0),
            ("js_parsing", 9.0),
            ("cloud_assets", 11.0),
            // AI sources (lower weight, needs validation)
            ("ai-enhanced", 5.0),
            ("ai_patterns", 6.0),
            ("ai_mutations", 4.0),
        ]);

        Self { source_weights }
    }

    /// Score one record. The result is always within [0, 100].
    pub fn score(&self, subdomain: &Subdomain) -> i64 {
        let source = self.source_score(&subdomain.sources);
        let validation = validation_score(subdomain);
        let response = response_score(subdomain);
        let pattern = pattern_score(subdomain);

        let total = source + validation + response + pattern;
        let clamped = total.clamp(0.0, 100.0) as i64;

        debug!(
            domain = %subdomain.domain,
            score = clamped,
            source_score = source,
            validation_score = validation,
            response_score = response,
            pattern_score = pattern,
            "Subdomain scored"
        );

        clamped
    }

    /// Source credibility: sum of distinct per-source weights plus a
    /// multiplicity bonus of `log2(#distinct) * 5`, capped at 40.
    pub fn source_score(&self, sources: &[String]) -> f64 {
        if sources.is_empty() {
            return 0.0;
        }

        let mut seen: Vec<&str> = Vec::new();
        let mut total = 0.0;

        for source in sources {
            let source = source.as_str();
            if seen.contains(&source) {
                continue;
            }
            seen.push(source);

            total += self
                .source_weights
                .get(source)
                .copied()
                .unwrap_or(UNKNOWN_SOURCE_WEIGHT);
        }

        let multiplicity_bonus = (seen.len() as f64).log2() * 5.0;

        (total + multiplicity_bonus).min(SOURCE_CAP)
    }

    /// Recompute confidence over the whole table.
    pub fn score_all(&self, table: &mut HashMap<String, Subdomain>) {
        for subdomain in table.values_mut() {
            subdomain.confidence = self.score(subdomain);
        }

        info!(count = table.len(), "Batch scoring complete");
    }

    /// Sort records by descending confidence.
    pub fn rank_by_confidence(subdomains: &mut [Subdomain]) {
        subdomains.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    }

    /// Keep only records at or above the confidence threshold.
    pub fn filter_by_confidence(subdomains: Vec<Subdomain>, min_confidence: i64) -> Vec<Subdomain> {
        let before = subdomains.len();
        let filtered: Vec<Subdomain> = subdomains
            .into_iter()
            .filter(|sub| sub.confidence >= min_confidence)
            .collect();

        info!(
            original_count = before,
            filtered_count = filtered.len(),
            min_confidence = min_confidence,
            "Confidence filtering applied"
        );

        filtered
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation component: DNS, HTTP and TLS evidence, capped at 30.
fn validation_score(subdomain: &Subdomain) -> f64 {
    let mut score: f64 = 0.0;

    if subdomain.validated && !subdomain.ip.is_empty() {
        score += 15.0;

        // Multiple addresses indicate real infrastructure.
        if subdomain.ip.len() > 1 {
            score += 3.0;
        }
    }

    if let Some(http) = &subdomain.http {
        if (200..400).contains(&http.status_code) {
            score += 10.0;
        } else if (400..500).contains(&http.status_code) {
            score += 5.0; // exists, just restricted
        }
    }

    if let Some(tls) = &subdomain.tls {
        if tls.valid {
            score += 5.0;
        }
    }

    score.min(VALIDATION_CAP)
}

/// Response quality component, capped at 20.
fn response_score(subdomain: &Subdomain) -> f64 {
    let Some(http) = &subdomain.http else {
        return 0.0;
    };

    let mut score: f64 = 0.0;

    if http.status_code > 0 {
        score += 5.0;
    }

    if http.title.len() > 3 {
        score += 5.0;
    }

    if !http.server.is_empty() {
        score += 3.0;
    }

    if !http.technologies.is_empty() {
        score += 7.0;
    }

    score.min(RESPONSE_CAP)
}

/// Naming heuristic component in [0, 10].
fn pattern_score(subdomain: &Subdomain) -> f64 {
    let mut score: f64 = 0.0;

    if has_common_pattern(&subdomain.domain) {
        score += 5.0;
    }

    if subdomain.first_label().len() < 15 {
        score += 3.0;
    }

    if has_suspicious_pattern(&subdomain.domain) {
        score -= 5.0;
    }

    score.clamp(0.0, PATTERN_CAP)
}

/// First label equals a whitelist entry, or carries it as a hyphenated
/// prefix (`api-...`) or suffix (`...-api`).
pub fn has_common_pattern(domain: &str) -> bool {
    let first = match domain.split('.').next() {
        Some(label) if !label.is_empty() => label,
        _ => return false,
    };

    COMMON_PATTERNS.iter().any(|pattern| {
        first == *pattern
            || first.starts_with(&format!("{pattern}-"))
            || first.ends_with(&format!("-{pattern}"))
    })
}

/// Probe residue, junk substrings, over-long or hyphen-heavy first labels.
pub fn has_suspicious_pattern(domain: &str) -> bool {
    let lower = domain.to_lowercase();

    if SUSPICIOUS_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    let first = lower.split('.').next().unwrap_or(&lower);
    if first.len() > 50 {
        return true;
    }

    first.matches('-').count() > 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpInfo;
    use std::collections::HashMap as StdHashMap;

    fn record(domain: &str, sources: &[&str]) -> Subdomain {
        let mut sub = Subdomain::new(domain, sources[0]);
        for source in &sources[1..] {
            sub.sources.push(source.to_string());
        }
        sub
    }

    #[test]
    fn single_crtsh_source_scores_fifteen() {
        let scorer = ConfidenceScorer::new();
        // log2(1) = 0, so the component equals the raw weight.
        assert_eq!(scorer.source_score(&["crtsh".to_string()]), 15.0);
    }

    #[test]
    fn two_sources_add_multiplicity_bonus() {
        let scorer = ConfidenceScorer::new();
        // 15 + 10 + log2(2) * 5 = 30
        let score = scorer.source_score(&[
            "crtsh".to_string(),
            "wayback_machine".to_string(),
        ]);
        assert_eq!(score, 30.0);
    }

    #[test]
    fn duplicate_sources_count_once() {
        let scorer = ConfidenceScorer::new();
        let score = scorer.source_score(&["crtsh".to_string(), "crtsh".to_string()]);
        assert_eq!(score, 15.0);
    }

    #[test]
    fn unknown_source_defaults_to_five() {
        let scorer = ConfidenceScorer::new();
        assert_eq!(scorer.source_score(&["mystery_plugin".to_string()]), 5.0);
    }

    #[test]
    fn source_component_is_capped_at_forty() {
        let scorer = ConfidenceScorer::new();
        let sources: Vec<String> = vec![
            "crtsh".to_string(),
            "virustotal".to_string(),
            "passive_dns".to_string(),
            "cloud_assets".to_string(),
        ];
        assert_eq!(scorer.source_score(&sources), 40.0);
    }

    #[test]
    fn validation_component_caps_at_thirty() {
        let mut sub = record("api.example.com", &["crtsh"]);
        sub.validated = true;
        sub.ip = vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()];
        sub.http = Some(HttpInfo {
            status_code: 200,
            title: "Welcome".to_string(),
            server: "nginx".to_string(),
            content_type: "text/html".to_string(),
            response_time_ms: 10,
            headers: StdHashMap::new(),
            technologies: vec!["nginx".to_string()],
        });
        sub.tls = Some(crate::types::TlsInfo {
            valid: true,
            subject: "api.example.com".to_string(),
            issuer: "R3".to_string(),
            not_before: chrono::Utc::now(),
            not_after: chrono::Utc::now(),
            sans: vec![],
            organization: String::new(),
        });

        // 15 + 3 + 10 + 5 = 33, capped to 30.
        assert_eq!(validation_score(&sub), 30.0);
    }

    #[test]
    fn restricted_http_gets_partial_credit() {
        let mut sub = record("api.example.com", &["crtsh"]);
        sub.http = Some(HttpInfo {
            status_code: 403,
            title: String::new(),
            server: String::new(),
            content_type: String::new(),
            response_time_ms: 10,
            headers: StdHashMap::new(),
            technologies: vec![],
        });

        assert_eq!(validation_score(&sub), 5.0);
    }

    #[test]
    fn response_component_full_house_is_twenty() {
        let mut sub = record("api.example.com", &["crtsh"]);
        sub.http = Some(HttpInfo {
            status_code: 200,
            title: "Intranet".to_string(),
            server: "Apache".to_string(),
            content_type: "text/html".to_string(),
            response_time_ms: 10,
            headers: StdHashMap::new(),
            technologies: vec!["Apache".to_string()],
        });

        assert_eq!(response_score(&sub), 20.0);
    }

    #[test]
    fn common_pattern_boundaries() {
        assert!(has_common_pattern("www.example.com"));
        assert!(has_common_pattern("api.example.com"));
        // Hyphenated prefix and suffix forms match.
        assert!(has_common_pattern("api-gateway-internal.example.com"));
        assert!(has_common_pattern("my-api.example.com"));
        assert!(has_common_pattern("eu-payments-api.example.com"));
        // Embedded without a hyphen boundary does not match.
        assert!(!has_common_pattern("apigw.example.com"));
        assert!(!has_common_pattern("notwww.example.com"));
        assert!(!has_common_pattern("northwindtelemetry.example.com"));
    }

    #[test]
    fn suspicious_patterns() {
        assert!(has_suspicious_pattern("wildcard-test-12.example.com"));
        assert!(has_suspicious_pattern("something-random.example.com"));
        assert!(has_suspicious_pattern(&format!(
            "{}.example.com",
            "x".repeat(51)
        )));
        assert!(has_suspicious_pattern("a-b-c-d-e-f-g.example.com"));

        assert!(!has_suspicious_pattern("api.corp.net"));
    }

    #[test]
    fn pattern_component_never_negative() {
        // Long, suspicious label: 0 + 0 - 5 floors at 0.
        let sub = record(&format!("{}.example.com", "z".repeat(51)), &["crtsh"]);
        assert_eq!(pattern_score(&sub), 0.0);
    }

    #[test]
    fn unvalidated_single_source_totals() {
        let scorer = ConfidenceScorer::new();

        // Whitelisted short label: 15 + 5 + 3 = 23.
        let www = record("www.example.com", &["crtsh"]);
        assert_eq!(scorer.score(&www), 23);

        // Long non-whitelisted label keeps the bare source weight: 15.
        let plain = record("northwindtelemetry.example.com", &["crtsh"]);
        assert_eq!(scorer.score(&plain), 15);
    }

    #[test]
    fn score_is_always_in_range() {
        let scorer = ConfidenceScorer::new();

        let mut maxed = record("www.example.com", &[
            "crtsh",
            "virustotal",
            "passive_dns",
            "cloud_assets",
            "http_probing",
        ]);
        maxed.validated = true;
        maxed.ip = vec!["1.1.1.1".to_string(), "2.2.2.2".to_string()];
        maxed.http = Some(HttpInfo {
            status_code: 200,
            title: "Portal".to_string(),
            server: "nginx".to_string(),
            content_type: "text/html".to_string(),
            response_time_ms: 5,
            headers: StdHashMap::new(),
            technologies: vec!["nginx".to_string()],
        });

        let score = scorer.score(&maxed);
        assert!(score <= 100);
        assert!(score >= 0);

        let empty = record("wildcard-test-zz.example.com", &["mystery"]);
        let score = scorer.score(&empty);
        assert!((0..=100).contains(&score));
    }

    #[test]
    fn ranking_and_threshold_filtering() {
        let mut low = record("a.example.com", &["crtsh"]);
        low.confidence = 10;
        let mut high = record("b.example.com", &["crtsh"]);
        high.confidence = 90;

        let mut all = vec![low.clone(), high.clone()];
        ConfidenceScorer::rank_by_confidence(&mut all);
        assert_eq!(all[0].domain, "b.example.com");

        let kept = ConfidenceScorer::filter_by_confidence(vec![low, high], 50);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].domain, "b.example.com");
    }
}
