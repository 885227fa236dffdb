// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Merge and Deduplication Layer
 * Canonicalization, record fusion, fuzzy grouping and noise removal
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::{Subdomain, SourceResult, WildcardInfo};

/// First-label substrings that mark throwaway or infrastructure noise.
const NOISE_PATTERNS: &[&str] = &[
    "wildcard-test",
    "test-test-test",
    "asdfasdf",
    "xxxxxxxxxx",
    "localhost",
    "invalid",
    "example",
    "_domainkey",
    "_dmarc",
];

const MAX_LABEL_LEN: usize = 60;
const MAX_LABEL_HYPHENS: usize = 8;

/// Canonicalize a raw candidate: trim, lowercase, strip a wildcard prefix
/// and the trailing dot, then verify it belongs to the target root zone.
pub fn canonicalize(raw: &str, root: &str) -> Option<String> {
    let name = raw
        .trim()
        .to_lowercase()
        .trim_start_matches("*.")
        .trim_start_matches('.')
        .trim_end_matches('.')
        .to_string();

    if name.is_empty() || name.contains('*') || name.contains(char::is_whitespace) {
        return None;
    }

    let root = root.trim_end_matches('.').to_lowercase();
    if name == root || name.ends_with(&format!(".{root}")) {
        Some(name)
    } else {
        None
    }
}

/// Merge one source batch into the central table (exact merge).
pub fn merge_names(table: &mut HashMap<String, Subdomain>, result: &SourceResult, root: &str) {
    for raw in &result.subdomains {
        let Some(domain) = canonicalize(raw, root) else {
            debug!(candidate = raw, "Dropping out-of-scope candidate");
            continue;
        };

        merge_subdomain(table, Subdomain::new(domain, result.source.clone()), root);
    }
}

/// Merge a full record into the central table. Idempotent; commutative over
/// source results, so completion order is observable only through the
/// timestamps and the (unordered) sources list.
pub fn merge_subdomain(table: &mut HashMap<String, Subdomain>, incoming: Subdomain, root: &str) {
    let Some(domain) = canonicalize(&incoming.domain, root) else {
        return;
    };

    match table.get_mut(&domain) {
        Some(existing) => fuse(existing, &incoming),
        None => {
            let mut record = incoming;
            record.domain = domain.clone();
            table.insert(domain, record);
        }
    }
}

/// Fuse an incoming record into an existing one under the merge rules.
fn fuse(existing: &mut Subdomain, incoming: &Subdomain) {
    for source in &incoming.sources {
        if !existing.sources.contains(source) {
            existing.sources.push(source.clone());
        }
    }

    for ip in &incoming.ip {
        if !existing.ip.contains(ip) {
            existing.ip.push(ip.clone());
        }
    }

    if incoming.first_seen < existing.first_seen {
        existing.first_seen = incoming.first_seen;
    }
    let now = Utc::now();
    if incoming.last_seen > existing.last_seen {
        existing.last_seen = incoming.last_seen;
    }
    if now > existing.last_seen {
        existing.last_seen = now;
    }

    existing.validated = existing.validated || incoming.validated;

    // Keep the better HTTP record: a success-class (2xx/3xx) response beats
    // anything else, then the higher status wins.
    if let Some(new_http) = &incoming.http {
        let replace = match &existing.http {
            None => true,
            Some(old_http) => {
                let new_ok = (200..400).contains(&new_http.status_code);
                let old_ok = (200..400).contains(&old_http.status_code);
                (new_ok && !old_ok) || (new_ok == old_ok && new_http.status_code > old_http.status_code)
            }
        };
        if replace {
            existing.http = Some(new_http.clone());
        }
    }

    // Keep the TLS record that is valid over one that is not.
    if let Some(new_tls) = &incoming.tls {
        if new_tls.valid {
            match &existing.tls {
                Some(old_tls) if old_tls.valid => {}
                _ => existing.tls = Some(new_tls.clone()),
            }
        } else if existing.tls.is_none() {
            existing.tls = Some(new_tls.clone());
        }
    }

    if let Some(new_records) = &incoming.dns_records {
        let records = existing.dns_records.get_or_insert_with(Default::default);
        merge_values(&mut records.a, &new_records.a);
        merge_values(&mut records.aaaa, &new_records.aaaa);
        merge_values(&mut records.cname, &new_records.cname);
        merge_values(&mut records.mx, &new_records.mx);
        merge_values(&mut records.ns, &new_records.ns);
        merge_values(&mut records.txt, &new_records.txt);
    }

    // Per-key first write wins.
    for (key, value) in &incoming.metadata {
        existing
            .metadata
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

fn merge_values(target: &mut Vec<String>, source: &[String]) {
    for value in source {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

/// True when a candidate looks like scan residue rather than a real host.
pub fn is_noise(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    let first = domain.split('.').next().unwrap_or(&domain);

    if NOISE_PATTERNS.iter().any(|p| first.contains(p)) {
        return true;
    }

    if first.len() > MAX_LABEL_LEN {
        return true;
    }

    first.matches('-').count() > MAX_LABEL_HYPHENS
}

/// Drop noise records, returning the survivors.
pub fn remove_noise(subdomains: Vec<Subdomain>) -> Vec<Subdomain> {
    let before = subdomains.len();
    let filtered: Vec<Subdomain> = subdomains
        .into_iter()
        .filter(|sub| !is_noise(&sub.domain))
        .collect();

    if filtered.len() != before {
        info!(
            removed = before - filtered.len(),
            remaining = filtered.len(),
            "Noise removal complete"
        );
    }

    filtered
}

/// Drop validated records whose entire address set is covered by the
/// wildcard answer set. No-op when the zone is not a wildcard.
pub fn remove_wildcard_hits(
    table: &mut HashMap<String, Subdomain>,
    info: &WildcardInfo,
) -> usize {
    if !info.is_wildcard {
        return 0;
    }

    let before = table.len();
    table.retain(|_, sub| !info.covers(&sub.ip));
    let removed = before - table.len();

    if removed > 0 {
        info!(
            removed = removed,
            remaining = table.len(),
            "Wildcard filtering complete"
        );
    }

    removed
}

/// Fuzzy pre-persist pass: group by label fingerprint and keep the
/// highest-confidence record of each group.
pub fn fuzzy_dedupe(subdomains: Vec<Subdomain>) -> Vec<Subdomain> {
    let before = subdomains.len();

    let mut groups: HashMap<String, Vec<Subdomain>> = HashMap::new();
    for sub in subdomains {
        groups.entry(fingerprint(&sub.domain)).or_default().push(sub);
    }

    let mut result: Vec<Subdomain> = Vec::with_capacity(groups.len());
    for (_, mut group) in groups {
        group.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        result.push(group.remove(0));
    }

    if result.len() != before {
        info!(
            removed = before - result.len(),
            remaining = result.len(),
            "Fuzzy deduplication complete"
        );
    }

    result
}

/// Similarity fingerprint of the first label: environment affixes and
/// digits stripped, then hashed.
fn fingerprint(domain: &str) -> String {
    let first = domain.split('.').next().unwrap_or(domain);
    let mut normalized = first.to_lowercase();

    for prefix in ["www-", "www"] {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            normalized = rest.to_string();
            break;
        }
    }
    for suffix in ["-prod", "-dev", "-staging"] {
        if let Some(rest) = normalized.strip_suffix(suffix) {
            normalized = rest.to_string();
            break;
        }
    }

    let pattern: String = normalized
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == '-')
        .collect();

    let digest = Sha256::digest(pattern.as_bytes());
    hex_prefix(&digest)
}

fn hex_prefix(digest: &[u8]) -> String {
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpInfo;
    use std::time::Duration;

    fn result(source: &str, names: &[&str]) -> SourceResult {
        SourceResult {
            source: source.to_string(),
            subdomains: names.iter().map(|s| s.to_string()).collect(),
            error: None,
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn canonicalize_normalizes_and_scopes() {
        assert_eq!(
            canonicalize("  *.API.Example.COM. ", "example.com"),
            Some("api.example.com".to_string())
        );
        assert_eq!(
            canonicalize("example.com", "example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(canonicalize("api.other.com", "example.com"), None);
        // Suffix match must respect the label boundary.
        assert_eq!(canonicalize("evilexample.com", "example.com"), None);
        assert_eq!(canonicalize("", "example.com"), None);
    }

    #[test]
    fn merge_creates_and_updates() {
        let mut table = HashMap::new();

        merge_names(&mut table, &result("crtsh", &["www.example.com"]), "example.com");
        merge_names(
            &mut table,
            &result("wayback_machine", &["WWW.example.com", "api.example.com"]),
            "example.com",
        );

        assert_eq!(table.len(), 2);
        let www = &table["www.example.com"];
        assert_eq!(www.sources.len(), 2);
        assert!(www.sources.contains(&"crtsh".to_string()));
        assert!(www.sources.contains(&"wayback_machine".to_string()));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut table = HashMap::new();
        let batch = result("crtsh", &["www.example.com", "api.example.com"]);

        merge_names(&mut table, &batch, "example.com");
        merge_names(&mut table, &batch, "example.com");

        assert_eq!(table.len(), 2);
        assert_eq!(table["www.example.com"].sources, vec!["crtsh".to_string()]);
    }

    #[test]
    fn merge_is_commutative_over_source_order() {
        let a = result("crtsh", &["x.example.com", "y.example.com"]);
        let b = result("wayback_machine", &["y.example.com", "z.example.com"]);

        let mut forward = HashMap::new();
        merge_names(&mut forward, &a, "example.com");
        merge_names(&mut forward, &b, "example.com");

        let mut reverse = HashMap::new();
        merge_names(&mut reverse, &b, "example.com");
        merge_names(&mut reverse, &a, "example.com");

        assert_eq!(forward.len(), reverse.len());
        for (domain, record) in &forward {
            let other = &reverse[domain];
            let mut lhs = record.sources.clone();
            let mut rhs = other.sources.clone();
            lhs.sort();
            rhs.sort();
            assert_eq!(lhs, rhs);
        }
    }

    #[test]
    fn fuse_unions_ips_and_keeps_validation() {
        let mut table = HashMap::new();

        let mut first = Subdomain::new("api.example.com", "crtsh");
        first.validated = true;
        first.ip = vec!["1.2.3.4".to_string()];
        merge_subdomain(&mut table, first, "example.com");

        let mut second = Subdomain::new("api.example.com", "wayback_machine");
        second.ip = vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()];
        merge_subdomain(&mut table, second, "example.com");

        let merged = &table["api.example.com"];
        assert!(merged.validated);
        assert_eq!(merged.ip.len(), 2);
        assert!(merged.first_seen <= merged.last_seen);
    }

    #[test]
    fn fuse_prefers_success_class_http() {
        let mut table = HashMap::new();

        let mut errored = Subdomain::new("api.example.com", "crtsh");
        errored.http = Some(HttpInfo {
            status_code: 503,
            title: String::new(),
            server: String::new(),
            content_type: String::new(),
            response_time_ms: 10,
            headers: HashMap::new(),
            technologies: vec![],
        });
        merge_subdomain(&mut table, errored, "example.com");

        let mut ok = Subdomain::new("api.example.com", "http_probing");
        ok.http = Some(HttpInfo {
            status_code: 200,
            title: "Home".to_string(),
            server: String::new(),
            content_type: String::new(),
            response_time_ms: 12,
            headers: HashMap::new(),
            technologies: vec![],
        });
        merge_subdomain(&mut table, ok, "example.com");

        assert_eq!(table["api.example.com"].http.as_ref().unwrap().status_code, 200);

        // A later error response must not displace the success.
        let mut late_error = Subdomain::new("api.example.com", "crtsh");
        late_error.http = Some(HttpInfo {
            status_code: 500,
            title: String::new(),
            server: String::new(),
            content_type: String::new(),
            response_time_ms: 9,
            headers: HashMap::new(),
            technologies: vec![],
        });
        merge_subdomain(&mut table, late_error, "example.com");

        assert_eq!(table["api.example.com"].http.as_ref().unwrap().status_code, 200);
    }

    #[test]
    fn fuse_metadata_first_write_wins() {
        let mut table = HashMap::new();

        let mut first = Subdomain::new("api.example.com", "crtsh");
        first
            .metadata
            .insert("origin".to_string(), serde_json::json!("ct-log"));
        merge_subdomain(&mut table, first, "example.com");

        let mut second = Subdomain::new("api.example.com", "wayback_machine");
        second
            .metadata
            .insert("origin".to_string(), serde_json::json!("archive"));
        second
            .metadata
            .insert("snapshot".to_string(), serde_json::json!(2024));
        merge_subdomain(&mut table, second, "example.com");

        let merged = &table["api.example.com"];
        assert_eq!(merged.metadata["origin"], serde_json::json!("ct-log"));
        assert_eq!(merged.metadata["snapshot"], serde_json::json!(2024));
    }

    #[test]
    fn noise_detection() {
        assert!(is_noise("wildcard-test-123.example.com"));
        assert!(is_noise("_dmarc.example.com"));
        assert!(is_noise("test-test-test.example.com"));
        assert!(is_noise(&format!("{}.example.com", "a".repeat(61))));
        assert!(is_noise("a-b-c-d-e-f-g-h-i-j.example.com"));

        assert!(!is_noise("api.example.com"));
        assert!(!is_noise("www.example.com"));
        assert!(!is_noise("a-b-c.example.com"));
    }

    #[test]
    fn wildcard_filter_drops_covered_keeps_subset_overlap() {
        let info = WildcardInfo {
            is_wildcard: true,
            pattern_ips: vec!["1.2.3.4".to_string()],
            ..Default::default()
        };

        let mut table = HashMap::new();

        let mut foo = Subdomain::new("foo.ex.com", "crtsh");
        foo.validated = true;
        foo.ip = vec!["1.2.3.4".to_string()];
        table.insert(foo.domain.clone(), foo);

        let mut bar = Subdomain::new("bar.ex.com", "crtsh");
        bar.validated = true;
        bar.ip = vec!["5.6.7.8".to_string()];
        table.insert(bar.domain.clone(), bar);

        let mut mixed = Subdomain::new("mixed.ex.com", "crtsh");
        mixed.validated = true;
        mixed.ip = vec!["1.2.3.4".to_string(), "9.9.9.9".to_string()];
        table.insert(mixed.domain.clone(), mixed);

        let removed = remove_wildcard_hits(&mut table, &info);

        assert_eq!(removed, 1);
        assert!(!table.contains_key("foo.ex.com"));
        assert!(table.contains_key("bar.ex.com"));
        assert!(table.contains_key("mixed.ex.com"));
    }

    #[test]
    fn wildcard_filter_is_noop_without_wildcard() {
        let info = WildcardInfo::default();

        let mut table = HashMap::new();
        let mut foo = Subdomain::new("foo.ex.com", "crtsh");
        foo.ip = vec!["1.2.3.4".to_string()];
        table.insert(foo.domain.clone(), foo);

        assert_eq!(remove_wildcard_hits(&mut table, &info), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn fingerprint_groups_environment_variants() {
        assert_eq!(
            fingerprint("api-dev.example.com"),
            fingerprint("api-staging.example.com")
        );
        assert_eq!(fingerprint("app1.example.com"), fingerprint("app2.example.com"));
        assert_ne!(fingerprint("api.example.com"), fingerprint("mail.example.com"));
    }

    #[test]
    fn fuzzy_dedupe_keeps_highest_confidence() {
        let mut a = Subdomain::new("api-dev.example.com", "crtsh");
        a.confidence = 40;
        let mut b = Subdomain::new("api-staging.example.com", "crtsh");
        b.confidence = 70;
        let mut c = Subdomain::new("mail.example.com", "crtsh");
        c.confidence = 10;

        let result = fuzzy_dedupe(vec![a, b, c]);

        assert_eq!(result.len(), 2);
        let kept: Vec<&str> = result.iter().map(|s| s.domain.as_str()).collect();
        assert!(kept.contains(&"api-staging.example.com"));
        assert!(kept.contains(&"mail.example.com"));
    }
}
