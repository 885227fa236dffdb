// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Prober
 * Concurrent HTTP(S) probing with title, header and technology fingerprints
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::errors::SourceError;
use crate::types::{HttpInfo, Subdomain};

/// Realistic browser User-Agents to avoid trivial blocks.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

fn browser_user_agent() -> &'static str {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum body bytes read per probe (1 MiB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Maximum redirects followed per probe.
const MAX_REDIRECTS: usize = 3;

/// Maximum extracted title length.
const MAX_TITLE_LEN: usize = 100;

/// Headers worth keeping from a probe response.
const PROBE_HEADERS: &[&str] = &[
    "Server",
    "X-Powered-By",
    "X-AspNet-Version",
    "X-Generator",
    "X-Drupal-Cache",
    "X-Frame-Options",
];

/// Body/header signatures mapped to technology names.
const TECH_SIGNATURES: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("wp-includes", "WordPress"),
    ("joomla", "Joomla"),
    ("drupal", "Drupal"),
    ("__next", "Next.js"),
    ("_next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("react", "React"),
    ("angular", "Angular"),
    ("vue.js", "Vue.js"),
    ("jquery", "jQuery"),
    ("bootstrap", "Bootstrap"),
    ("tailwind", "Tailwind CSS"),
    ("django", "Django"),
    ("laravel", "Laravel"),
    ("symfony", "Symfony"),
    ("spring", "Spring"),
    ("express", "Express"),
    ("flask", "Flask"),
    ("rails", "Ruby on Rails"),
    ("gatsby", "Gatsby"),
    ("shopify", "Shopify"),
    ("magento", "Magento"),
    ("squarespace", "Squarespace"),
    ("cloudflare", "Cloudflare"),
];

/// Probes validated candidates over HTTPS first, then HTTP.
///
/// TLS verification is disabled on purpose: reconnaissance targets routinely
/// serve self-signed or mismatched certificates, and a probe only records
/// what answered.
pub struct HttpProber {
    client: reqwest::Client,
    workers: usize,
}

impl HttpProber {
    pub fn new(workers: usize) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(browser_user_agent())
            .build()
            .map_err(|e| SourceError::Request {
                source_name: "http_probing".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            workers: workers.max(1),
        })
    }

    /// Probe a single host. HTTPS is tried first; HTTP only on failure.
    pub async fn probe(&self, domain: &str) -> Option<HttpInfo> {
        if let Some(info) = self.probe_scheme("https", domain).await {
            return Some(info);
        }
        self.probe_scheme("http", domain).await
    }

    async fn probe_scheme(&self, scheme: &str, domain: &str) -> Option<HttpInfo> {
        let url = format!("{scheme}://{domain}");
        let started = Instant::now();

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url = %url, error = %e, "HTTP probe failed");
                return None;
            }
        };

        let status_code = response.status().as_u16();

        let mut headers = HashMap::new();
        let mut server = String::new();
        let mut content_type = String::new();

        for name in PROBE_HEADERS {
            if let Some(value) = response.headers().get(*name) {
                if let Ok(value) = value.to_str() {
                    headers.insert(name.to_string(), value.to_string());
                }
            }
        }
        if let Some(value) = response.headers().get("Server") {
            server = value.to_str().unwrap_or_default().to_string();
        }
        if let Some(value) = response.headers().get("Content-Type") {
            content_type = value.to_str().unwrap_or_default().to_string();
        }

        let body_bytes = response.bytes().await.unwrap_or_default();
        let limit = body_bytes.len().min(MAX_BODY_SIZE);
        let body = String::from_utf8_lossy(&body_bytes[..limit]).to_string();

        let response_time_ms = started.elapsed().as_millis() as u64;

        Some(HttpInfo {
            status_code,
            title: extract_title(&body),
            server: server.clone(),
            content_type,
            response_time_ms,
            headers: headers.clone(),
            technologies: detect_technologies(&body, &server, &headers),
        })
    }

    /// Probe every validated record and attach the results.
    pub async fn probe_batch(&self, table: &mut HashMap<String, Subdomain>) {
        let targets: Vec<String> = table
            .values()
            .filter(|sub| sub.validated && !sub.ip.is_empty())
            .map(|sub| sub.domain.clone())
            .collect();

        if targets.is_empty() {
            return;
        }

        info!(
            count = targets.len(),
            workers = self.workers,
            "Starting HTTP probing"
        );

        let probed: Vec<(String, Option<HttpInfo>)> = stream::iter(targets)
            .map(|domain| async move {
                let info = self.probe(&domain).await;
                (domain, info)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut reached = 0;
        for (domain, info) in probed {
            if let Some(info) = info {
                if let Some(sub) = table.get_mut(&domain) {
                    sub.http = Some(info);
                    reached += 1;
                }
            }
        }

        info!(reached = reached, "HTTP probing complete");
    }
}

/// Extract the page `<title>`, truncated to a displayable length.
fn extract_title(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }

    let document = Html::parse_document(body);
    let selector = match Selector::parse("title") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let title = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    let title = title.trim();
    if title.chars().count() > MAX_TITLE_LEN {
        let truncated: String = title.chars().take(MAX_TITLE_LEN).collect();
        format!("{truncated}...")
    } else {
        title.to_string()
    }
}

/// Substring-match the fixed signature dictionary against body and headers.
fn detect_technologies(
    body: &str,
    server: &str,
    headers: &HashMap<String, String>,
) -> Vec<String> {
    let mut technologies: Vec<String> = Vec::new();

    let mut push_unique = |tech: &str| {
        if !technologies.iter().any(|t| t == tech) {
            technologies.push(tech.to_string());
        }
    };

    if server.to_lowercase().contains("nginx") {
        push_unique("nginx");
    }
    if server.contains("Apache") {
        push_unique("Apache");
    }
    if server.contains("IIS") {
        push_unique("IIS");
    }

    if let Some(powered_by) = headers.get("X-Powered-By") {
        if powered_by.contains("PHP") {
            push_unique("PHP");
        }
        if powered_by.contains("ASP.NET") {
            push_unique("ASP.NET");
        }
    }

    let body_lower = body.to_lowercase();
    for (signature, tech) in TECH_SIGNATURES {
        if body_lower.contains(signature) {
            push_unique(tech);
        }
    }

    technologies
}
