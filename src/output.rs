// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Result Exporters
 * JSON, CSV, text, HTML, Nuclei and Burp output renderers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use chrono::Utc;
use std::fmt;
use std::path::Path;
use tracing::{error, info};

use crate::types::Subdomain;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Txt,
    Html,
    Nuclei,
    Burp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Txt => "txt",
            OutputFormat::Html => "html",
            OutputFormat::Nuclei => "nuclei",
            OutputFormat::Burp => "burp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "txt" | "text" => Ok(OutputFormat::Txt),
            "html" => Ok(OutputFormat::Html),
            "nuclei" => Ok(OutputFormat::Nuclei),
            "burp" => Ok(OutputFormat::Burp),
            other => Err(format!("unsupported format: {other}")),
        }
    }
}

/// Renders and writes scan results.
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    /// Export records to a file in the given format.
    pub fn export(
        &self,
        subdomains: &[Subdomain],
        format: OutputFormat,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            format = %format,
            path = %output_path.display(),
            count = subdomains.len(),
            "Exporting results"
        );

        let content = self.render(subdomains, format)?;
        std::fs::write(output_path, content)
            .with_context(|| format!("failed to write {}", output_path.display()))?;

        info!(path = %output_path.display(), "Export complete");
        Ok(())
    }

    /// Export to several formats at once under one directory. Per-format
    /// failures are logged and the remaining formats still run.
    pub fn export_multiple(
        &self,
        subdomains: &[Subdomain],
        formats: &[OutputFormat],
        output_dir: &Path,
    ) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        for format in formats {
            let path = output_dir.join(format!("results.{}", format.extension()));
            if let Err(e) = self.export(subdomains, *format, &path) {
                error!(format = %format, error = %e, "Failed to export format");
            }
        }

        Ok(())
    }

    /// Render records to a byte buffer in the given format.
    pub fn render(&self, subdomains: &[Subdomain], format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Json => self.render_json(subdomains),
            OutputFormat::Csv => self.render_csv(subdomains),
            OutputFormat::Txt | OutputFormat::Burp => Ok(self.render_text(subdomains)),
            OutputFormat::Html => Ok(self.render_html(subdomains)),
            OutputFormat::Nuclei => Ok(self.render_nuclei(subdomains)),
        }
    }

    fn render_json(&self, subdomains: &[Subdomain]) -> Result<Vec<u8>> {
        let output = serde_json::json!({
            "generated_at": Utc::now().to_rfc3339(),
            "total_count": subdomains.len(),
            "subdomains": subdomains,
        });

        let json = serde_json::to_string_pretty(&output).context("failed to encode JSON")?;
        Ok(json.into_bytes())
    }

    fn render_csv(&self, subdomains: &[Subdomain]) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        wtr.write_record([
            "Domain",
            "IP",
            "Confidence",
            "Validated",
            "Sources",
            "HTTP_Status",
            "HTTP_Title",
            "Technologies",
            "First_Seen",
            "Last_Seen",
        ])?;

        for sub in subdomains {
            let (status, title, technologies) = match &sub.http {
                Some(http) => (
                    http.status_code.to_string(),
                    http.title.clone(),
                    http.technologies.join(";"),
                ),
                None => (String::new(), String::new(), String::new()),
            };

            let record = vec![
                sub.domain.clone(),
                sub.ip.join(";"),
                sub.confidence.to_string(),
                sub.validated.to_string(),
                sub.sources.join(";"),
                status,
                title,
                technologies,
                sub.first_seen.to_rfc3339(),
                sub.last_seen.to_rfc3339(),
            ];
            wtr.write_record(&record)?;
        }

        let data = wtr.into_inner().context("failed to flush CSV")?;
        Ok(data)
    }

    fn render_text(&self, subdomains: &[Subdomain]) -> Vec<u8> {
        let mut out = String::new();
        for sub in subdomains {
            out.push_str(&sub.domain);
            out.push('\n');
        }
        out.into_bytes()
    }

    /// Nuclei expects URLs; only validated hosts qualify, HTTPS preferred.
    fn render_nuclei(&self, subdomains: &[Subdomain]) -> Vec<u8> {
        let mut out = String::new();
        for sub in subdomains {
            if sub.validated {
                out.push_str(&format!("https://{}\n", sub.domain));
            }
        }
        out.into_bytes()
    }

    fn render_html(&self, subdomains: &[Subdomain]) -> Vec<u8> {
        let validated_count = subdomains.iter().filter(|s| s.validated).count();
        let http_active_count = subdomains
            .iter()
            .filter(|s| {
                s.http
                    .as_ref()
                    .map(|h| (200..500).contains(&h.status_code))
                    .unwrap_or(false)
            })
            .count();

        let mut rows = String::new();
        for sub in subdomains {
            let confidence_class = if sub.confidence >= 70 {
                "confidence-high"
            } else if sub.confidence >= 40 {
                "confidence-medium"
            } else {
                "confidence-low"
            };

            let ips: String = sub
                .ip
                .iter()
                .map(|ip| format!("<div class=\"badge\">{}</div>", escape_html(ip)))
                .collect();

            let http_cell = match &sub.http {
                Some(http) => {
                    let class = if (200..400).contains(&http.status_code) {
                        "http-ok"
                    } else {
                        "http-error"
                    };
                    format!("<span class=\"{class}\">{}</span>", http.status_code)
                }
                None => String::new(),
            };

            let technologies: String = sub
                .http
                .as_ref()
                .map(|http| {
                    http.technologies
                        .iter()
                        .map(|t| format!("<div class=\"badge\">{}</div>", escape_html(t)))
                        .collect()
                })
                .unwrap_or_default();

            let sources: String = sub
                .sources
                .iter()
                .map(|s| format!("<div class=\"badge\">{}</div>", escape_html(s)))
                .collect();

            rows.push_str(&format!(
                "<tr><td><strong>{}</strong></td><td>{}</td>\
                 <td><span class=\"confidence {}\">{}</span></td>\
                 <td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&sub.domain),
                ips,
                confidence_class,
                sub.confidence,
                http_cell,
                technologies,
                sources
            ));
        }

        HTML_TEMPLATE
            .replace("{{GENERATED_AT}}", &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .replace("{{TOTAL_COUNT}}", &subdomains.len().to_string())
            .replace("{{VALIDATED_COUNT}}", &validated_count.to_string())
            .replace("{{HTTP_ACTIVE_COUNT}}", &http_active_count.to_string())
            .replace("{{ROWS}}", &rows)
            .into_bytes()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Luotain Reconnaissance Report</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; background: #0a0e27; color: #e0e0e0; padding: 20px; }
        .container { max-width: 1400px; margin: 0 auto; }
        h1 { color: #00ff88; margin-bottom: 10px; font-size: 2.5em; }
        .stats { background: #151932; border-radius: 8px; padding: 20px; margin: 20px 0; display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; }
        .stat { text-align: center; }
        .stat-value { font-size: 2em; color: #00ff88; font-weight: bold; }
        .stat-label { color: #888; margin-top: 5px; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; background: #151932; border-radius: 8px; overflow: hidden; }
        th { background: #1a1f3a; padding: 15px; text-align: left; color: #00ff88; font-weight: 600; }
        td { padding: 12px 15px; border-top: 1px solid #1a1f3a; }
        tr:hover { background: #1a1f3a; }
        .confidence { display: inline-block; padding: 4px 12px; border-radius: 12px; font-size: 0.85em; font-weight: 600; }
        .confidence-high { background: #00ff8844; color: #00ff88; }
        .confidence-medium { background: #ffaa0044; color: #ffaa00; }
        .confidence-low { background: #ff444444; color: #ff4444; }
        .badge { display: inline-block; padding: 3px 8px; background: #2a2f4a; border-radius: 4px; font-size: 0.8em; margin: 2px; }
        .http-ok { color: #00ff88; }
        .http-error { color: #ff4444; }
        .filter { margin: 20px 0; padding: 15px; background: #151932; border-radius: 8px; }
        .filter input { background: #0a0e27; border: 1px solid #2a2f4a; color: #e0e0e0; padding: 10px; border-radius: 4px; width: 300px; font-size: 1em; }
        .filter input:focus { outline: none; border-color: #00ff88; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Luotain Reconnaissance Report</h1>
        <p style="color: #888; margin-bottom: 30px;">Generated: {{GENERATED_AT}}</p>

        <div class="stats">
            <div class="stat">
                <div class="stat-value">{{TOTAL_COUNT}}</div>
                <div class="stat-label">Total Subdomains</div>
            </div>
            <div class="stat">
                <div class="stat-value">{{VALIDATED_COUNT}}</div>
                <div class="stat-label">Validated</div>
            </div>
            <div class="stat">
                <div class="stat-value">{{HTTP_ACTIVE_COUNT}}</div>
                <div class="stat-label">HTTP Active</div>
            </div>
        </div>

        <div class="filter">
            <input type="text" id="searchInput" placeholder="Filter subdomains..." onkeyup="filterTable()">
        </div>

        <table id="subdomainTable">
            <thead>
                <tr>
                    <th>Domain</th>
                    <th>IP</th>
                    <th>Confidence</th>
                    <th>HTTP</th>
                    <th>Technologies</th>
                    <th>Sources</th>
                </tr>
            </thead>
            <tbody>
{{ROWS}}
            </tbody>
        </table>
    </div>

    <script>
        function filterTable() {
            const input = document.getElementById('searchInput');
            const filter = input.value.toUpperCase();
            const table = document.getElementById('subdomainTable');
            const tr = table.getElementsByTagName('tr');

            for (let i = 1; i < tr.length; i++) {
                const td = tr[i].getElementsByTagName('td')[0];
                if (td) {
                    const txtValue = td.textContent || td.innerText;
                    tr[i].style.display = txtValue.toUpperCase().indexOf(filter) > -1 ? '' : 'none';
                }
            }
        }
    </script>
</body>
</html>"#;
