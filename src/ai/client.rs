// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Local AI Backend Client
 * HTTP JSON client for an Ollama-compatible generation API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::errors::AiError;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "num_predict", skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for the local AI generation backend.
pub struct AiClient {
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    http: reqwest::Client,
}

impl AiClient {
    pub fn new(cfg: &AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            // Generation can take a while on local models.
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AiError::Generation(e.to_string()))?;

        Ok(Self {
            base_url: cfg.backend_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a prompt and return the completed response text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        let url = format!("{}/api/generate", self.base_url);

        debug!(model = %self.model, url = %url, "Sending request to AI backend");

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|_| AiError::BackendUnavailable {
                url: self.base_url.clone(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::Generation(e.to_string()))?;

        info!(
            model = %self.model,
            duration_ms = started.elapsed().as_millis() as u64,
            eval_count = generated.eval_count,
            done = generated.done,
            "AI generation complete"
        );

        Ok(generated.response)
    }

    /// Liveness probe against the tags endpoint.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// List model names the backend serves.
    pub async fn list_models(&self) -> Result<Vec<String>, AiError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|_| AiError::BackendUnavailable {
                url: self.base_url.clone(),
            })?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AiError::Generation(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let cfg = AiConfig {
            backend_url: "http://localhost:11434/".to_string(),
            ..AiConfig::default()
        };
        let client = AiClient::new(&cfg).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let cfg = AiConfig {
            backend_url: "http://127.0.0.1:1".to_string(),
            ..AiConfig::default()
        };
        let client = AiClient::new(&cfg).unwrap();
        assert!(!client.is_available().await);
    }
}
