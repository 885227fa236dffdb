// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Certificate Transparency Source
 * Passive enumeration via crt.sh certificate logs
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::errors::SourceError;
use crate::sources::rate::SourceGate;
use crate::sources::{Source, SourceType};
use crate::types::SourceResult;

const CRTSH_RATE_LIMIT: u32 = 10;

/// Certificate Transparency log enumeration via crt.sh.
pub struct CrtShSource {
    enabled: bool,
    client: reqwest::Client,
    gate: SourceGate,
}

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

impl CrtShSource {
    pub fn new(enabled: bool) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("luotain/1.0 (subdomain reconnaissance)")
            .build()
            .map_err(|e| SourceError::Request {
                source_name: "crtsh".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            enabled,
            client,
            gate: SourceGate::new(CRTSH_RATE_LIMIT),
        })
    }
}

#[async_trait]
impl Source for CrtShSource {
    fn name(&self) -> &str {
        "crtsh"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Passive
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn rate_limit(&self) -> u32 {
        CRTSH_RATE_LIMIT
    }

    async fn enumerate(&self, domain: &str) -> Result<SourceResult, SourceError> {
        let started = Instant::now();

        self.gate.wait().await;

        let url = format!("https://crt.sh/?q=%25.{domain}&output=json");

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

        let entries: Vec<CrtShEntry> =
            response.json().await.map_err(|e| SourceError::Parse {
                source_name: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let suffix = format!(".{domain}");
        let mut unique: HashSet<String> = HashSet::new();

        for entry in entries {
            // name_value can carry several names, newline separated.
            for name in entry.name_value.lines() {
                let cleaned = name
                    .trim()
                    .to_lowercase()
                    .trim_start_matches("*.")
                    .trim_start_matches('.')
                    .to_string();

                if !cleaned.contains('*') && (cleaned.ends_with(&suffix) || cleaned == domain) {
                    unique.insert(cleaned);
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
