// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Wayback Machine Source
 * Passive enumeration via the Internet Archive CDX index
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use url::Url;

use crate::errors::SourceError;
use crate::sources::rate::SourceGate;
use crate::sources::{Source, SourceType};
use crate::types::SourceResult;

const WAYBACK_RATE_LIMIT: u32 = 5;
const WAYBACK_RESULT_LIMIT: usize = 10_000;

/// Historical hostname discovery through the Wayback Machine CDX API.
pub struct WaybackSource {
    enabled: bool,
    client: reqwest::Client,
    gate: SourceGate,
}

impl WaybackSource {
    pub fn new(enabled: bool) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("luotain/1.0 (subdomain reconnaissance)")
            .build()
            .map_err(|e| SourceError::Request {
                source_name: "wayback_machine".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            enabled,
            client,
            gate: SourceGate::new(WAYBACK_RATE_LIMIT),
        })
    }
}

#[async_trait]
impl Source for WaybackSource {
    fn name(&self) -> &str {
        "wayback_machine"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Passive
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn rate_limit(&self) -> u32 {
        WAYBACK_RATE_LIMIT
    }

    async fn enumerate(&self, domain: &str) -> Result<SourceResult, SourceError> {
        let started = Instant::now();

        self.gate.wait().await;

        let url = format!(
            "https://web.archive.org/cdx/search/cdx?url=*.{domain}/*&output=json&fl=original&collapse=urlkey&limit={WAYBACK_RESULT_LIMIT}"
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                source_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        // CDX JSON output is an array of rows; the first row is the header.
        let rows: Vec<Vec<String>> =
            response.json().await.map_err(|e| SourceError::Parse {
                source_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let suffix = format!(".{domain}");
        let mut unique: HashSet<String> = HashSet::new();

        for row in rows.iter().skip(1) {
            let Some(original) = row.first() else {
                continue;
            };

            if let Ok(parsed) = Url::parse(original) {
                if let Some(host) = parsed.host_str() {
                    let host = host.to_lowercase();
                    if host.ends_with(&suffix) || host == domain {
                        unique.insert(host);
                    }
                }
            }
        }

        Ok(SourceResult {
            source: self.name().to_string(),
            subdomains: unique.into_iter().collect(),
            error: None,
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_metadata() {
        let source = WaybackSource::new(true).unwrap();
        assert_eq!(source.name(), "wayback_machine");
        assert_eq!(source.source_type(), SourceType::Passive);
        assert_eq!(source.rate_limit(), 5);
    }
}
