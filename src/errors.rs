// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reconnaissance Error Types
 * Enumerated failure kinds with structured context per subsystem
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the reconnaissance engine.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logger initialization errors (fatal at startup)
    #[error("Logger initialization failed: {0}")]
    LoggerInit(String),

    /// DNS resolution errors
    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),

    /// Per-source enumeration errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// AI backend errors
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The registry holds no enabled sources; the scan cannot start
    #[error("no enabled sources found")]
    NoEnabledSources,

    /// Scan-level deadline expired
    #[error("Scan timed out after {duration:?}")]
    Timeout { duration: Duration },
}

/// DNS-specific errors. A timeout is distinct from a resolver failure so
/// callers can tell deadline expiry apart from NXDOMAIN/SERVFAIL churn.
/// Both are treated as "not validated", never as record deletion.
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("DNS resolution timed out for {domain} after {duration:?}")]
    Timeout { domain: String, duration: Duration },

    #[error("DNS resolution failed for {domain} after {attempts} attempts: {reason}")]
    ResolverFailure {
        domain: String,
        attempts: u32,
        reason: String,
    },

    #[error("no DNS resolvers configured")]
    NoResolvers,

    #[error("invalid resolver address: {address}")]
    InvalidResolver { address: String },
}

/// Per-source errors. Recorded in scan statistics; never abort the scan.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{source_name}: request failed: {reason}")]
    Request { source_name: String, reason: String },

    #[error("{source_name}: HTTP status {status}")]
    Status { source_name: String, status: u16 },

    #[error("{source_name}: unexpected response: {reason}")]
    Parse { source_name: String, reason: String },

    #[error("{source_name}: AI backend unavailable at {url}")]
    AiUnavailable { source_name: String, url: String },
}

/// AI backend errors, all non-fatal to the scan.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI backend unavailable at {url}")]
    BackendUnavailable { url: String },

    #[error("AI backend returned status {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("max recursion depth {max} reached")]
    RecursionExhausted { max: usize },

    #[error("AI generation failed: {0}")]
    Generation(String),

    #[error("unknown prompt template: {0}")]
    UnknownTemplate(String),
}

/// Persistence errors. Subdomain-granular failures are logged and the scan
/// continues; a scan-wide commit failure marks the scan failed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("unsupported storage engine: {0} (supported: sqlite, memory)")]
    UnsupportedEngine(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading/validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to decode config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
