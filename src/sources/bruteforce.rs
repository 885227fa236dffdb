// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - DNS Bruteforce Source
 * Active enumeration over a wordlist through the resolver pool
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::dns::resolver::ResolverPool;
use crate::errors::SourceError;
use crate::sources::{Source, SourceType};
use crate::types::SourceResult;

/// Common subdomain labels used when no wordlist file is configured.
const BUILTIN_WORDLIST: &[&str] = &[
    "www", "api", "admin", "dev", "staging", "test", "qa", "uat", "mail", "smtp", "pop", "imap",
    "webmail", "ftp", "sftp", "ssh", "vpn", "remote", "access", "blog", "forum", "shop", "store",
    "cdn", "static", "assets", "media", "images", "m", "mobile", "app", "portal", "dashboard",
    "panel", "beta", "alpha", "demo", "git", "gitlab", "jenkins", "ci", "jira", "confluence",
    "wiki", "status", "monitor", "metrics", "db", "database", "cache", "backup", "old", "new",
    "legacy", "v1", "v2", "ws", "grpc", "graphql", "rest", "docs", "help", "support", "secure",
    "login", "auth", "oauth", "payment", "pay", "checkout", "internal", "corp", "intranet",
    "ns1", "ns2", "mx", "autodiscover", "cpanel", "proxy", "gateway", "lb", "sandbox", "preview",
    "preprod", "prod",
];

/// Wordlist bruteforce through the shared resolver pool. Only names that
/// actually resolve are reported.
pub struct BruteforceSource {
    enabled: bool,
    pool: Arc<ResolverPool>,
    wordlist: Vec<String>,
    workers: usize,
}

impl BruteforceSource {
    pub fn new(
        enabled: bool,
        pool: Arc<ResolverPool>,
        wordlist_files: &[PathBuf],
        workers: usize,
    ) -> Self {
        let wordlist = load_wordlists(wordlist_files);

        Self {
            enabled,
            pool,
            wordlist,
            workers: workers.max(1),
        }
    }

    #[cfg(test)]
    pub fn wordlist_len(&self) -> usize {
        self.wordlist.len()
    }
}

#[async_trait]
impl Source for BruteforceSource {
    fn name(&self) -> &str {
        "dns_bruteforce"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Active
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn enumerate(&self, domain: &str) -> Result<SourceResult, SourceError> {
        let started = Instant::now();

        let candidates: Vec<String> = self
            .wordlist
            .iter()
            .map(|word| format!("{word}.{domain}"))
            .collect();

        info!(
            domain = domain,
            candidates = candidates.len(),
            workers = self.workers,
            "Starting DNS bruteforce"
        );

        let resolved = self.pool.resolve_batch(&candidates, self.workers).await;

        Ok(SourceResult {
            source: self.name().to_string(),
            subdomains: resolved.into_keys().collect(),
            error: None,
            duration: started.elapsed(),
        })
    }
}

/// Read wordlist files (one label per line, `#` comments allowed), falling
/// back to the builtin list when nothing is configured or readable.
fn load_wordlists(files: &[PathBuf]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();

    for path in files {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                for line in content.lines() {
                    let word = line.trim().to_lowercase();
                    if !word.is_empty() && !word.starts_with('#') && !words.contains(&word) {
                        words.push(word);
                    }
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read wordlist");
            }
        }
    }

    if words.is_empty() {
        words = BUILTIN_WORDLIST.iter().map(|w| w.to_string()).collect();
    }

    words
}
