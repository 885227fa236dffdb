// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Storage Manager
 * Scan, subdomain and change persistence over embedded SQLite
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::StorageError;
use crate::storage::schema;
use crate::types::{DnsRecords, HttpInfo, Subdomain, TlsInfo};

/// Final scan counters written at completion time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanTotals {
    pub total_subdomains: usize,
    pub validated_subdomains: usize,
}

/// A persisted change row.
#[derive(Debug, Clone)]
pub struct Change {
    pub subdomain: String,
    pub change_type: String,
    pub old_value: String,
    pub new_value: String,
    pub detected_at: DateTime<Utc>,
}

/// Point-in-time state of one subdomain across scans.
#[derive(Debug, Clone)]
pub struct SubdomainSnapshot {
    pub id: i64,
    pub scan_id: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub confidence: i64,
    pub validated: bool,
    pub scan_time: DateTime<Utc>,
}

/// Aggregate storage counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageStatistics {
    pub total_scans: i64,
    pub total_subdomains: i64,
    pub total_changes: i64,
}

/// Persistence layer over a single embedded database file.
///
/// Writes are serialized behind the connection lock and grouped into
/// per-record transactions.
pub struct StorageManager {
    conn: Mutex<Connection>,
}

impl StorageManager {
    /// Open the configured engine. `sqlite` maps to the file at
    /// `storage.path` (parent directories are created), `memory` to an
    /// in-memory database. Anything else is rejected.
    pub fn open(cfg: &StorageConfig) -> Result<Self, StorageError> {
        let conn = match cfg.engine.as_str() {
            "sqlite" => {
                if let Some(parent) = cfg.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Connection::open(&cfg.path)?
            }
            "memory" => Connection::open_in_memory()?,
            other => return Err(StorageError::UnsupportedEngine(other.to_string())),
        };

        schema::init(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a scan row in `running` state and return its id.
    pub fn create_scan(
        &self,
        domain: &str,
        mode: &str,
        sources_used: &[String],
    ) -> Result<i64, StorageError> {
        let sources_json = serde_json::to_string(sources_used).unwrap_or_default();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO scans (domain, scan_mode, started_at, sources_used, status)
             VALUES (?1, ?2, ?3, ?4, 'running')",
            params![domain, mode, Utc::now(), sources_json],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Mark a scan completed with its final totals.
    pub fn complete_scan(&self, scan_id: i64, totals: ScanTotals) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE scans
             SET completed_at = ?1, total_subdomains = ?2, validated_subdomains = ?3,
                 status = 'completed'
             WHERE id = ?4",
            params![
                Utc::now(),
                totals.total_subdomains as i64,
                totals.validated_subdomains as i64,
                scan_id
            ],
        )?;

        Ok(())
    }

    /// Mark a scan failed (scan-wide commit failure).
    pub fn fail_scan(&self, scan_id: i64) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE scans SET completed_at = ?1, status = 'failed' WHERE id = ?2",
            params![Utc::now(), scan_id],
        )?;

        Ok(())
    }

    /// Persist one subdomain record and its satellites in a single
    /// transaction.
    pub fn save_subdomain(&self, scan_id: i64, sub: &Subdomain) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO subdomains (scan_id, domain, first_seen, last_seen, confidence, validated, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active')",
            params![
                scan_id,
                sub.domain,
                sub.first_seen,
                sub.last_seen,
                sub.confidence,
                sub.validated
            ],
        )?;

        let subdomain_id = tx.last_insert_rowid();
        let now = Utc::now();

        for source in &sub.sources {
            tx.execute(
                "INSERT OR IGNORE INTO subdomain_sources (subdomain_id, source, discovered_at)
                 VALUES (?1, ?2, ?3)",
                params![subdomain_id, source, now],
            )?;
        }

        // A records fall back to the resolved address set when no record
        // block was populated.
        let a_records: Vec<&String> = match &sub.dns_records {
            Some(records) if !records.a.is_empty() => records.a.iter().collect(),
            _ => sub.ip.iter().collect(),
        };
        for value in a_records {
            tx.execute(
                "INSERT INTO dns_records (subdomain_id, record_type, value, discovered_at)
                 VALUES (?1, 'A', ?2, ?3)",
                params![subdomain_id, value, now],
            )?;
        }
        if let Some(records) = &sub.dns_records {
            for value in &records.cname {
                tx.execute(
                    "INSERT INTO dns_records (subdomain_id, record_type, value, discovered_at)
                     VALUES (?1, 'CNAME', ?2, ?3)",
                    params![subdomain_id, value, now],
                )?;
            }
        }

        if let Some(http) = &sub.http {
            tx.execute(
                "INSERT INTO http_info (subdomain_id, status_code, title, server, content_type, response_time, checked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    subdomain_id,
                    http.status_code,
                    http.title,
                    http.server,
                    http.content_type,
                    http.response_time_ms as i64,
                    now
                ],
            )?;

            for tech in &http.technologies {
                tx.execute(
                    "INSERT OR IGNORE INTO technologies (subdomain_id, technology, detected_at)
                     VALUES (?1, ?2, ?3)",
                    params![subdomain_id, tech, now],
                )?;
            }
        }

        if let Some(tls) = &sub.tls {
            tx.execute(
                "INSERT INTO tls_info (subdomain_id, subject, issuer, not_before, not_after, valid, organization, checked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    subdomain_id,
                    tls.subject,
                    tls.issuer,
                    tls.not_before,
                    tls.not_after,
                    tls.valid,
                    tls.organization,
                    now
                ],
            )?;
        }

        for (key, value) in &sub.metadata {
            let value_json = serde_json::to_string(value).unwrap_or_default();
            tx.execute(
                "INSERT OR REPLACE INTO metadata (subdomain_id, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![subdomain_id, key, value_json, now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Most recent completed scan for a domain.
    pub fn get_latest_scan(&self, domain: &str) -> Result<Option<i64>, StorageError> {
        let conn = self.conn.lock();
        let scan_id = conn
            .query_row(
                "SELECT id FROM scans WHERE domain = ?1 AND status = 'completed'
                 ORDER BY completed_at DESC LIMIT 1",
                params![domain],
                |row| row.get(0),
            )
            .optional()?;

        Ok(scan_id)
    }

    /// Names of all active subdomains captured by a scan.
    pub fn get_scan_subdomains(&self, scan_id: i64) -> Result<Vec<String>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT domain FROM subdomains WHERE scan_id = ?1 AND status = 'active'",
        )?;

        let names = stmt
            .query_map(params![scan_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Reload the full records captured by a scan.
    pub fn get_scan_records(&self, scan_id: i64) -> Result<Vec<Subdomain>, StorageError> {
        let conn = self.conn.lock();

        struct Row {
            id: i64,
            domain: String,
            first_seen: DateTime<Utc>,
            last_seen: DateTime<Utc>,
            confidence: i64,
            validated: bool,
        }

        let mut stmt = conn.prepare(
            "SELECT id, domain, first_seen, last_seen, confidence, validated
             FROM subdomains WHERE scan_id = ?1 AND status = 'active'",
        )?;
        let rows = stmt
            .query_map(params![scan_id], |row| {
                Ok(Row {
                    id: row.get(0)?,
                    domain: row.get(1)?,
                    first_seen: row.get(2)?,
                    last_seen: row.get(3)?,
                    confidence: row.get(4)?,
                    validated: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<Row>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut stmt = conn.prepare(
                "SELECT source FROM subdomain_sources WHERE subdomain_id = ?1 ORDER BY id",
            )?;
            let sources = stmt
                .query_map(params![row.id], |r| r.get(0))?
                .collect::<Result<Vec<String>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT record_type, value FROM dns_records WHERE subdomain_id = ?1 ORDER BY id",
            )?;
            let mut dns = DnsRecords::default();
            for entry in stmt.query_map(params![row.id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })? {
                let (record_type, value) = entry?;
                match record_type.as_str() {
                    "A" => dns.a.push(value),
                    "AAAA" => dns.aaaa.push(value),
                    "CNAME" => dns.cname.push(value),
                    "MX" => dns.mx.push(value),
                    "NS" => dns.ns.push(value),
                    "TXT" => dns.txt.push(value),
                    _ => {}
                }
            }

            let http = conn
                .query_row(
                    "SELECT status_code, title, server, content_type, response_time
                     FROM http_info WHERE subdomain_id = ?1",
                    params![row.id],
                    |r| {
                        Ok(HttpInfo {
                            status_code: r.get(0)?,
                            title: r.get(1)?,
                            server: r.get(2)?,
                            content_type: r.get(3)?,
                            response_time_ms: r.get::<_, i64>(4)? as u64,
                            headers: HashMap::new(),
                            technologies: Vec::new(),
                        })
                    },
                )
                .optional()?;

            let http = match http {
                Some(mut info) => {
                    let mut stmt = conn.prepare(
                        "SELECT technology FROM technologies WHERE subdomain_id = ?1 ORDER BY id",
                    )?;
                    info.technologies = stmt
                        .query_map(params![row.id], |r| r.get(0))?
                        .collect::<Result<Vec<String>, _>>()?;
                    Some(info)
                }
                None => None,
            };

            let tls = conn
                .query_row(
                    "SELECT subject, issuer, not_before, not_after, valid, organization
                     FROM tls_info WHERE subdomain_id = ?1",
                    params![row.id],
                    |r| {
                        Ok(TlsInfo {
                            subject: r.get(0)?,
                            issuer: r.get(1)?,
                            not_before: r.get(2)?,
                            not_after: r.get(3)?,
                            valid: r.get(4)?,
                            organization: r.get(5)?,
                            sans: Vec::new(),
                        })
                    },
                )
                .optional()?;

            let mut stmt =
                conn.prepare("SELECT key, value FROM metadata WHERE subdomain_id = ?1")?;
            let mut metadata = HashMap::new();
            for entry in stmt.query_map(params![row.id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })? {
                let (key, value_json) = entry?;
                if let Ok(value) = serde_json::from_str(&value_json) {
                    metadata.insert(key, value);
                }
            }

            let ip = dns.a.clone();
            let dns_records = if dns.a.is_empty()
                && dns.aaaa.is_empty()
                && dns.cname.is_empty()
                && dns.mx.is_empty()
                && dns.ns.is_empty()
                && dns.txt.is_empty()
            {
                None
            } else {
                Some(dns)
            };

            records.push(Subdomain {
                domain: row.domain,
                ip,
                sources,
                confidence: row.confidence,
                validated: row.validated,
                first_seen: row.first_seen,
                last_seen: row.last_seen,
                http,
                tls,
                dns_records,
                metadata,
            });
        }

        Ok(records)
    }

    /// Historical states of one subdomain, newest first.
    pub fn subdomain_history(
        &self,
        domain: &str,
    ) -> Result<Vec<SubdomainSnapshot>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.scan_id, s.first_seen, s.last_seen, s.confidence, s.validated,
                    sc.started_at
             FROM subdomains s
             JOIN scans sc ON s.scan_id = sc.id
             WHERE s.domain = ?1
             ORDER BY s.last_seen DESC",
        )?;

        let history = stmt
            .query_map(params![domain], |row| {
                Ok(SubdomainSnapshot {
                    id: row.get(0)?,
                    scan_id: row.get(1)?,
                    first_seen: row.get(2)?,
                    last_seen: row.get(3)?,
                    confidence: row.get(4)?,
                    validated: row.get(5)?,
                    scan_time: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }

    /// Record one detected change.
    #[allow(clippy::too_many_arguments)]
    pub fn save_change(
        &self,
        domain: &str,
        subdomain: &str,
        change_type: &str,
        old_value: &str,
        new_value: &str,
        old_scan_id: i64,
        new_scan_id: i64,
    ) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO changes (domain, subdomain, change_type, old_value, new_value, detected_at, scan_id_old, scan_id_new)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                domain,
                subdomain,
                change_type,
                old_value,
                new_value,
                Utc::now(),
                old_scan_id,
                new_scan_id
            ],
        )?;

        Ok(())
    }

    /// Recent changes for a domain, newest first.
    pub fn get_recent_changes(
        &self,
        domain: &str,
        limit: usize,
    ) -> Result<Vec<Change>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT subdomain, change_type, old_value, new_value, detected_at
             FROM changes
             WHERE domain = ?1
             ORDER BY detected_at DESC, id DESC
             LIMIT ?2",
        )?;

        let changes = stmt
            .query_map(params![domain, limit as i64], |row| {
                Ok(Change {
                    subdomain: row.get(0)?,
                    change_type: row.get(1)?,
                    old_value: row.get(2)?,
                    new_value: row.get(3)?,
                    detected_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(changes)
    }

    /// Aggregate counters across all scans.
    pub fn statistics(&self) -> Result<StorageStatistics, StorageError> {
        let conn = self.conn.lock();

        let total_scans = conn.query_row("SELECT COUNT(*) FROM scans", [], |r| r.get(0))?;
        let total_subdomains = conn.query_row(
            "SELECT COUNT(*) FROM subdomains WHERE status = 'active'",
            [],
            |r| r.get(0),
        )?;
        let total_changes = conn.query_row("SELECT COUNT(*) FROM changes", [], |r| r.get(0))?;

        info!(
            total_scans = total_scans,
            total_subdomains = total_subdomains,
            total_changes = total_changes,
            "Storage statistics"
        );

        Ok(StorageStatistics {
            total_scans,
            total_subdomains,
            total_changes,
        })
    }
}
