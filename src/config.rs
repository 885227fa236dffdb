// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Application Configuration
 * YAML configuration with validated defaults, created on first run
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::errors::ConfigError;
use crate::types::ScanMode;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_file: String,

    #[serde(default)]
    pub scan_mode: ScanMode,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_dns_workers")]
    pub dns_workers: usize,

    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_http_workers")]
    pub http_workers: usize,

    #[validate(nested)]
    #[serde(default)]
    pub dns: DnsConfig,

    #[validate(nested)]
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[validate(nested)]
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DnsConfig {
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<String>,

    /// Per-call timeout in seconds.
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_dns_timeout")]
    pub timeout: u64,

    #[validate(range(max = 10))]
    #[serde(default = "default_dns_retries")]
    pub retries: u32,

    /// Maximum DNS requests in flight (0 = unlimited).
    #[serde(default = "default_dns_rate_limit")]
    pub rate_limit: usize,

    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_wildcard_tests")]
    pub wildcard_tests: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            resolvers: default_resolvers(),
            timeout: default_dns_timeout(),
            retries: default_dns_retries(),
            rate_limit: default_dns_rate_limit(),
            wildcard_tests: default_wildcard_tests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[validate(range(min = 0.0, max = 2.0))]
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[validate(range(min = 1, max = 100000))]
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend_url: default_backend_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            prompt_version: default_prompt_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub passive: PassiveSourcesConfig,

    #[serde(default)]
    pub active: ActiveSourcesConfig,

    #[serde(default)]
    pub web: WebSourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassiveSourcesConfig {
    #[serde(default = "default_true")]
    pub certificate_transparency: bool,

    #[serde(default = "default_true")]
    pub wayback_machine: bool,

    #[serde(default)]
    pub virustotal: bool,

    #[serde(default)]
    pub passive_dns: bool,

    #[serde(default)]
    pub common_crawl: bool,

    #[serde(default)]
    pub shodan: bool,
}

impl Default for PassiveSourcesConfig {
    fn default() -> Self {
        Self {
            certificate_transparency: true,
            wayback_machine: true,
            virustotal: false,
            passive_dns: false,
            common_crawl: false,
            shodan: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveSourcesConfig {
    #[serde(default)]
    pub dns_bruteforce: bool,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default)]
    pub permutations: bool,

    #[serde(default)]
    pub wordlists: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSourcesConfig {
    #[serde(default = "default_true")]
    pub http_probing: bool,

    #[serde(default)]
    pub js_parsing: bool,

    #[serde(default)]
    pub cloud_assets: bool,
}

impl Default for WebSourcesConfig {
    fn default() -> Self {
        Self {
            http_probing: true,
            js_parsing: false,
            cloud_assets: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub dns_validation: bool,

    #[serde(default = "default_true")]
    pub http_validation: bool,

    #[serde(default)]
    pub tls_validation: bool,

    #[validate(range(max = 100))]
    #[serde(default = "default_min_confidence")]
    pub min_confidence: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            dns_validation: true,
            http_validation: true,
            tls_validation: false,
            min_confidence: default_min_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage engine: sqlite, memory (postgres is reserved).
    #[serde(default = "default_storage_engine")]
    pub engine: String,

    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: default_storage_engine(),
            path: default_storage_path(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
            scan_mode: ScanMode::default(),
            output_dir: default_output_dir(),
            max_threads: default_max_threads(),
            dns_workers: default_dns_workers(),
            http_workers: default_http_workers(),
            dns: DnsConfig::default(),
            ai: AiConfig::default(),
            sources: SourcesConfig::default(),
            validation: ValidationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path, or from
    /// `~/.luotain/config.yaml`, creating a commented default file on the
    /// first run.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(p) => p.to_path_buf(),
            None => {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                let dir = Path::new(&home).join(".luotain");
                std::fs::create_dir_all(&dir)?;
                dir.join("config.yaml")
            }
        };

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG)?;
        }

        let raw = std::fs::read_to_string(&path)?;
        let cfg: AppConfig = serde_yaml::from_str(&raw)?;
        cfg.check()?;

        Ok(cfg)
    }

    /// Validate value ranges and cross-field constraints.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.dns.resolvers.is_empty() {
            return Err(ConfigError::Invalid(
                "dns.resolvers must list at least one resolver".to_string(),
            ));
        }

        if self.ai.enabled {
            url::Url::parse(&self.ai.backend_url).map_err(|e| {
                ConfigError::Invalid(format!("ai.backend_url is not a valid URL: {e}"))
            })?;
        }

        match self.storage.engine.as_str() {
            "sqlite" | "memory" | "postgres" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "storage.engine must be one of sqlite, postgres, memory (got {other})"
            ))),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_max_threads() -> usize {
    50
}

fn default_dns_workers() -> usize {
    100
}

fn default_http_workers() -> usize {
    50
}

fn default_resolvers() -> Vec<String> {
    vec![
        "8.8.8.8".to_string(),
        "8.8.4.4".to_string(),
        "1.1.1.1".to_string(),
        "1.0.0.1".to_string(),
    ]
}

fn default_dns_timeout() -> u64 {
    5
}

fn default_dns_retries() -> u32 {
    2
}

fn default_dns_rate_limit() -> usize {
    100
}

fn default_wildcard_tests() -> usize {
    5
}

fn default_backend_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "mistral".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_prompt_version() -> String {
    "v1".to_string()
}

fn default_min_confidence() -> i64 {
    50
}

fn default_storage_engine() -> String {
    "sqlite".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/luotain.db")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_true() -> bool {
    true
}

const DEFAULT_CONFIG: &str = r#"# Luotain configuration file
# Subdomain reconnaissance engine

# Core settings
log_level: info
log_file: ""
scan_mode: passive
output_dir: ./output

# Concurrency
max_threads: 50
dns_workers: 100
http_workers: 50

# DNS configuration
dns:
  resolvers:
    - 8.8.8.8
    - 8.8.4.4
    - 1.1.1.1
    - 1.0.0.1
  timeout: 5
  retries: 2
  rate_limit: 100
  wildcard_tests: 5

# AI configuration (local backend)
ai:
  enabled: false
  backend_url: http://localhost:11434
  model: mistral
  temperature: 0.7
  max_tokens: 1000
  prompt_version: v1

# Sources
sources:
  passive:
    certificate_transparency: true
    wayback_machine: true
    virustotal: false
    passive_dns: false
    common_crawl: false
    shodan: false

  active:
    dns_bruteforce: false
    recursive: false
    permutations: false
    wordlists: []

  web:
    http_probing: true
    js_parsing: false
    cloud_assets: false

# Validation
validation:
  dns_validation: true
  http_validation: true
  tls_validation: false
  min_confidence: 50

# Storage
storage:
  engine: sqlite
  path: ./data/luotain.db
  cache_dir: ./cache
"#;
