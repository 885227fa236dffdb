// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Core Reconnaissance Types
 * Subdomain records, source results and wildcard characterization
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A discovered subdomain with all merged metadata.
///
/// Records are keyed by canonical FQDN in the central table. The merger is
/// the only writer during discovery; once a scan completes the record is
/// frozen and persisted as an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subdomain {
    pub domain: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip: Vec<String>,

    pub sources: Vec<String>,

    pub confidence: i64,

    pub validated: bool,

    pub first_seen: DateTime<Utc>,

    pub last_seen: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_records: Option<DnsRecords>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Subdomain {
    /// Create a fresh record for a canonical domain reported by one source.
    pub fn new(domain: impl Into<String>, source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            domain: domain.into(),
            ip: Vec::new(),
            sources: vec![source.into()],
            confidence: 0,
            validated: false,
            first_seen: now,
            last_seen: now,
            http: None,
            tls: None,
            dns_records: None,
            metadata: HashMap::new(),
        }
    }

    /// First DNS label of the record's domain.
    pub fn first_label(&self) -> &str {
        self.domain.split('.').next().unwrap_or(&self.domain)
    }
}

/// HTTP probe results for a single subdomain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpInfo {
    pub status_code: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,

    pub response_time_ms: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
}

/// TLS certificate information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsInfo {
    pub valid: bool,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
}

/// Multi-valued DNS record slots for a subdomain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsRecords {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub a: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aaaa: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cname: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mx: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txt: Vec<String>,
}

/// Raw output of a single enumeration source.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub source: String,
    pub subdomains: Vec<String>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl SourceResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            subdomains: Vec::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }
}

/// Scan mode selecting how aggressive discovery is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Passive,
    Active,
    Aggressive,
    Stealth,
}

impl Default for ScanMode {
    fn default() -> Self {
        ScanMode::Passive
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanMode::Passive => "passive",
            ScanMode::Active => "active",
            ScanMode::Aggressive => "aggressive",
            ScanMode::Stealth => "stealth",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passive" => Ok(ScanMode::Passive),
            "active" => Ok(ScanMode::Active),
            "aggressive" => Ok(ScanMode::Aggressive),
            "stealth" => Ok(ScanMode::Stealth),
            other => Err(format!("unknown scan mode: {other}")),
        }
    }
}

/// Wildcard DNS characterization for one zone, cached per scan.
#[derive(Debug, Clone, Default)]
pub struct WildcardInfo {
    pub is_wildcard: bool,
    /// IPs the zone answers for random nonexistent labels.
    pub pattern_ips: Vec<String>,
    /// Probe label -> answer IPs, for diagnostics.
    pub test_results: HashMap<String, Vec<String>>,
    pub detected_at: Option<DateTime<Utc>>,
}

impl WildcardInfo {
    /// True when the wildcard answer set covers every IP of a candidate.
    ///
    /// A strict subset match keeps the record: a host that shares one
    /// address with the wildcard front but owns others is real
    /// infrastructure.
    pub fn covers(&self, ips: &[String]) -> bool {
        if !self.is_wildcard || ips.is_empty() {
            return false;
        }
        ips.iter().all(|ip| self.pattern_ips.contains(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_covers_full_set() {
        let info = WildcardInfo {
            is_wildcard: true,
            pattern_ips: vec!["1.2.3.4".into(), "1.2.3.5".into()],
            ..Default::default()
        };

        assert!(info.covers(&["1.2.3.4".into()]));
        assert!(info.covers(&["1.2.3.4".into(), "1.2.3.5".into()]));
    }

    #[test]
    fn wildcard_keeps_strict_superset() {
        let info = WildcardInfo {
            is_wildcard: true,
            pattern_ips: vec!["1.2.3.4".into()],
            ..Default::default()
        };

        // One real address outside the wildcard set keeps the record.
        assert!(!info.covers(&["1.2.3.4".into(), "5.6.7.8".into()]));
        assert!(!info.covers(&["5.6.7.8".into()]));
    }

    #[test]
    fn wildcard_noop_when_not_wildcard() {
        let info = WildcardInfo {
            is_wildcard: false,
            pattern_ips: vec!["1.2.3.4".into()],
            ..Default::default()
        };

        assert!(!info.covers(&["1.2.3.4".into()]));
    }

    #[test]
    fn wildcard_ignores_empty_ip_set() {
        let info = WildcardInfo {
            is_wildcard: true,
            pattern_ips: vec!["1.2.3.4".into()],
            ..Default::default()
        };

        assert!(!info.covers(&[]));
    }

    #[test]
    fn new_record_has_consistent_timestamps() {
        let sub = Subdomain::new("api.example.com", "crtsh");
        assert!(sub.first_seen <= sub.last_seen);
        assert_eq!(sub.sources, vec!["crtsh".to_string()]);
        assert!(!sub.validated);
        assert!(sub.ip.is_empty());
    }

    #[test]
    fn first_label() {
        let sub = Subdomain::new("api.staging.example.com", "crtsh");
        assert_eq!(sub.first_label(), "api");
    }
}
