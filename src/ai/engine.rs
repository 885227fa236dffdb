// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - AI Enhancement Engine
 * Cached AI-assisted wordlist, pattern and mutation operations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai::client::AiClient;
use crate::ai::prompts;
use crate::config::AiConfig;
use crate::errors::AiError;

/// Hard limit for nested recursive discovery.
const MAX_RECURSION_DEPTH: usize = 3;

/// Cap on mutation suggestions per label.
const MAX_MUTATIONS: usize = 20;

/// Pattern inference samples at most this many known labels.
const PATTERN_SAMPLE: usize = 50;

/// Noise detection samples at most this many candidates.
const NOISE_SAMPLE: usize = 100;

/// DNS label grammar: 1-63 chars of [a-z0-9-], no leading/trailing hyphen.
static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("label regex"));

/// Checked recursion depth counter shared across discovery tasks.
pub struct RecursionGuard {
    depth: Mutex<usize>,
    max: usize,
}

impl RecursionGuard {
    fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            depth: Mutex::new(0),
            max,
        })
    }

    /// Atomically check-and-increment the depth. Fails at the limit without
    /// side effects.
    fn enter(self: &Arc<Self>) -> Result<DepthToken, AiError> {
        let mut depth = self.depth.lock();
        if *depth >= self.max {
            return Err(AiError::RecursionExhausted { max: self.max });
        }
        *depth += 1;

        Ok(DepthToken {
            guard: Arc::clone(self),
        })
    }

    fn current(&self) -> usize {
        *self.depth.lock()
    }
}

/// Releases one recursion level on drop.
pub struct DepthToken {
    guard: Arc<RecursionGuard>,
}

impl Drop for DepthToken {
    fn drop(&mut self) {
        let mut depth = self.guard.depth.lock();
        *depth = depth.saturating_sub(1);
    }
}

/// AI-assisted reconnaissance operations against the local backend.
///
/// A process-level cache keyed by `(operation, input)` guarantees the
/// backend is asked at most once per distinct query per scan.
pub struct AiEngine {
    client: AiClient,
    enabled: bool,
    cache: Mutex<HashMap<String, Vec<String>>>,
    recursion: Arc<RecursionGuard>,
}

impl AiEngine {
    pub fn new(cfg: &AiConfig) -> Result<Self, AiError> {
        Ok(Self {
            client: AiClient::new(cfg)?,
            enabled: cfg.enabled,
            cache: Mutex::new(HashMap::new()),
            recursion: RecursionGuard::new(MAX_RECURSION_DEPTH),
        })
    }

    pub async fn is_available(&self) -> bool {
        self.enabled && self.client.is_available().await
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    /// Generate a domain-specific wordlist with optional context.
    pub async fn generate_wordlist(
        &self,
        domain: &str,
        context: &HashMap<&'static str, String>,
    ) -> Result<Vec<String>, AiError> {
        let cache_key = format!("wordlist:{domain}");

        if let Some(cached) = self.cached(&cache_key) {
            debug!(domain = domain, "Using cached wordlist");
            return Ok(cached);
        }

        info!(domain = domain, "Generating AI wordlist");

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Domain", domain.to_string());
        for (key, value) in context {
            vars.insert(*key, value.clone());
        }

        let prompt = prompts::render("wordlist_generation", &vars)?;
        let response = self.client.generate(&prompt).await?;
        let wordlist = parse_wordlist(&response);

        self.store(&cache_key, &wordlist);

        info!(domain = domain, count = wordlist.len(), "AI wordlist generated");

        Ok(wordlist)
    }

    /// Infer naming patterns from a sample of known labels.
    pub async fn infer_patterns(&self, subdomains: &[String]) -> Result<Vec<String>, AiError> {
        if subdomains.is_empty() {
            return Ok(Vec::new());
        }

        let key_sample = subdomains
            .iter()
            .take(5)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        let cache_key = format!("patterns:{key_sample}");

        if let Some(cached) = self.cached(&cache_key) {
            debug!("Using cached pattern inference");
            return Ok(cached);
        }

        let sample_size = PATTERN_SAMPLE.min(subdomains.len());
        let sample = subdomains[..sample_size].join("\n");

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Subdomains", sample);

        let prompt = prompts::render("pattern_inference", &vars)?;
        let response = self.client.generate(&prompt).await?;
        let patterns = parse_wordlist(&response);

        self.store(&cache_key, &patterns);

        info!(new_suggestions = patterns.len(), "Pattern inference complete");

        Ok(patterns)
    }

    /// Generate up to 20 mutations of a single label.
    pub async fn generate_mutations(&self, subdomain: &str) -> Result<Vec<String>, AiError> {
        let cache_key = format!("mutations:{subdomain}");

        if let Some(cached) = self.cached(&cache_key) {
            return Ok(cached);
        }

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Subdomain", subdomain.to_string());

        let prompt = prompts::render("mutation_suggestions", &vars)?;
        let response = self.client.generate(&prompt).await?;

        let mut mutations = parse_wordlist(&response);
        mutations.truncate(MAX_MUTATIONS);

        self.store(&cache_key, &mutations);

        Ok(mutations)
    }

    /// Discover related labels from a seed and its inferred purpose.
    /// Nested calls beyond the depth limit fail fast without touching the
    /// backend or the cache.
    pub async fn recursive_discovery(
        &self,
        subdomain: &str,
        purpose: &str,
    ) -> Result<Vec<String>, AiError> {
        let _token = match self.recursion.enter() {
            Ok(token) => token,
            Err(e) => {
                warn!(depth = self.recursion.current(), "Max recursion depth reached");
                return Err(e);
            }
        };

        let cache_key = format!("recursive:{subdomain}:{purpose}");

        if let Some(cached) = self.cached(&cache_key) {
            return Ok(cached);
        }

        info!(
            subdomain = subdomain,
            purpose = purpose,
            depth = self.recursion.current(),
            "Recursive discovery"
        );

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Subdomain", subdomain.to_string());
        vars.insert("InferredPurpose", purpose.to_string());

        let prompt = prompts::render("recursive_discovery", &vars)?;
        let response = self.client.generate(&prompt).await?;
        let suggestions = parse_wordlist(&response);

        self.store(&cache_key, &suggestions);

        Ok(suggestions)
    }

    /// Ask the backend to rate a discovery. Returns `(score, reasoning)`.
    pub async fn analyze_confidence(
        &self,
        subdomain: &str,
        metadata: &HashMap<&'static str, String>,
    ) -> Result<(i64, String), AiError> {
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Subdomain", subdomain.to_string());
        for (key, value) in metadata {
            vars.insert(*key, value.clone());
        }

        let prompt = prompts::render("confidence_analysis", &vars)?;
        let response = self.client.generate(&prompt).await?;

        Ok(parse_confidence(&response))
    }

    /// Identify likely false positives; returns `label -> reason`.
    pub async fn detect_noise(
        &self,
        subdomains: &[String],
    ) -> Result<HashMap<String, String>, AiError> {
        if subdomains.is_empty() {
            return Ok(HashMap::new());
        }

        info!(subdomain_count = subdomains.len(), "Running AI noise detection");

        let sample_size = NOISE_SAMPLE.min(subdomains.len());
        let sample = subdomains[..sample_size].join("\n");

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("Subdomains", sample);

        let prompt = prompts::render("noise_detection", &vars)?;
        let response = self.client.generate(&prompt).await?;
        let noise = parse_noise(&response);

        info!(noise_count = noise.len(), "Noise detection complete");

        Ok(noise)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().len()
    }

    fn cached(&self, key: &str) -> Option<Vec<String>> {
        self.cache.lock().get(key).cloned()
    }

    fn store(&self, key: &str, value: &[String]) {
        self.cache.lock().insert(key.to_string(), value.to_vec());
    }
}

/// Parse a free-form model response into clean DNS labels: one candidate
/// per line, commentary dropped, last word taken, punctuation trimmed.
pub fn parse_wordlist(response: &str) -> Vec<String> {
    let mut wordlist: Vec<String> = Vec::new();

    for line in response.lines() {
        let line = line.trim();

        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("//")
            || line.contains(':')
        {
            continue;
        }

        let Some(word) = line.split_whitespace().last() else {
            continue;
        };

        let word = word.trim_end_matches(['.', ',', ';']).to_lowercase();

        if is_valid_label(&word) && !wordlist.contains(&word) {
            wordlist.push(word);
        }
    }

    wordlist
}

/// Parse `SCORE:` and `REASONING:` lines; score clamps to [0, 100].
pub fn parse_confidence(response: &str) -> (i64, String) {
    let mut score = 0i64;
    let mut reasoning = String::new();

    for line in response.lines() {
        if let Some(rest) = line.strip_prefix("SCORE:") {
            score = rest.trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("REASONING:") {
            reasoning = rest.trim().to_string();
        }
    }

    (score.clamp(0, 100), reasoning)
}

/// Parse `subdomain | reason` lines into a map.
pub fn parse_noise(response: &str) -> HashMap<String, String> {
    let mut noise = HashMap::new();

    for line in response.lines() {
        if let Some((subdomain, reason)) = line.split_once('|') {
            let subdomain = subdomain.trim();
            let reason = reason.trim();
            if !subdomain.is_empty() && !reason.contains('|') {
                noise.insert(subdomain.to_string(), reason.to_string());
            }
        }
    }

    noise
}

/// Valid DNS label: 1-63 chars of `[a-z0-9-]`, no edge hyphens.
pub fn is_valid_label(s: &str) -> bool {
    LABEL_RE.is_match(s)
}
