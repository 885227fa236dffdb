// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - AI Prompt Templates
 * Versioned prompt templates for reconnaissance operations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;

use crate::errors::AiError;

pub const PROMPT_VERSION: &str = "v1";

/// A named, versioned prompt template.
pub struct Template {
    pub name: &'static str,
    pub version: &'static str,
    pub template: &'static str,
}

const TEMPLATES: &[Template] = &[
    Template {
        name: "wordlist_generation",
        version: PROMPT_VERSION,
        template: r#"You are a subdomain enumeration expert. Generate a list of potential subdomains for the domain: {{.Domain}}

Context:
{{if .Industry}}- Industry: {{.Industry}}{{end}}
{{if .CompanyType}}- Company Type: {{.CompanyType}}{{end}}
{{if .KnownSubdomains}}- Known Subdomains: {{.KnownSubdomains}}{{end}}

Based on common naming patterns, generate 50 likely subdomain names. Consider:
- Environment indicators (dev, staging, prod, test, qa)
- Service types (api, mail, www, cdn, static)
- Geographic locations (us, eu, asia, uk)
- Technology stacks (jenkins, gitlab, jira, confluence)
- Department functions (hr, finance, sales, marketing)
- Infrastructure (vpn, proxy, gateway, firewall)

Output ONLY subdomain names, one per line, without the domain suffix.
Do not include explanations or numbering."#,
    },
    Template {
        name: "pattern_inference",
        version: PROMPT_VERSION,
        template: r#"Analyze these discovered subdomains and identify naming patterns:

{{.Subdomains}}

Identify:
1. Naming conventions (prefixes, suffixes, separators)
2. Numbering schemes
3. Service categories
4. Geographic patterns
5. Environment patterns

Generate 30 new subdomain names following these patterns.
Output ONLY subdomain names, one per line."#,
    },
    Template {
        name: "mutation_suggestions",
        version: PROMPT_VERSION,
        template: r#"Given this subdomain: {{.Subdomain}}

Generate 20 variations using:
- Common typos and alternatives
- Hyphen/underscore variations
- Number additions (1, 2, 01, 02, etc)
- Environment prefixes/suffixes
- Regional variations

Output ONLY subdomain names, one per line."#,
    },
    Template {
        name: "confidence_analysis",
        version: PROMPT_VERSION,
        template: r#"Analyze this subdomain discovery:

Domain: {{.Subdomain}}
Sources: {{.Sources}}
DNS Validated: {{.DNSValidated}}
HTTP Response: {{.HTTPStatus}}

Rate the confidence (0-100) that this is a legitimate, active subdomain.
Consider source reliability, validation status, and naming patterns.

Output format:
SCORE: [number]
REASONING: [brief explanation]"#,
    },
    Template {
        name: "noise_detection",
        version: PROMPT_VERSION,
        template: r#"Review these subdomains and identify likely false positives or noise:

{{.Subdomains}}

Look for:
- CDN artifacts
- Wildcard patterns
- Third-party services
- Malformed entries
- Obvious noise

Output suspicious entries, one per line, with reason:
FORMAT: subdomain | reason"#,
    },
    Template {
        name: "recursive_discovery",
        version: PROMPT_VERSION,
        template: r#"Based on this discovered subdomain: {{.Subdomain}}

The subdomain suggests {{.InferredPurpose}}.

Generate 15 related subdomains that might exist in the same infrastructure.
Consider logical groupings, parallel services, and infrastructure patterns.

Output ONLY subdomain names, one per line."#,
    },
];

/// Look up a template by name.
pub fn get(name: &str) -> Result<&'static Template, AiError> {
    TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| AiError::UnknownTemplate(name.to_string()))
}

/// Render a template with the given variables. Conditional lines whose
/// variables were not supplied are dropped.
pub fn render(name: &str, vars: &HashMap<&str, String>) -> Result<String, AiError> {
    let template = get(name)?;

    let mut result = template.template.to_string();

    for (key, value) in vars {
        let placeholder = format!("{{{{.{key}}}}}");
        result = result.replace(&placeholder, value);

        // Unwrap satisfied conditionals, keeping their body.
        let cond_open = format!("{{{{if .{key}}}}}");
        result = result.replace(&cond_open, "");
    }

    Ok(clean_unused_placeholders(&result))
}

/// Drop lines still carrying unresolved conditionals or placeholders, and
/// strip leftover `{{end}}` markers.
fn clean_unused_placeholders(text: &str) -> String {
    let cleaned: Vec<String> = text
        .lines()
        .filter(|line| !line.contains("{{if") && !line.contains("{{."))
        .map(|line| line.replace("{{end}}", ""))
        .collect();

    cleaned.join("\n")
}

/// All available template names.
pub fn list_templates() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_present() {
        let names = list_templates();
        for expected in [
            "wordlist_generation",
            "pattern_inference",
            "mutation_suggestions",
            "confidence_analysis",
            "noise_detection",
            "recursive_discovery",
        ] {
            assert!(names.contains(&expected), "missing template {expected}");
        }
    }

    #[test]
    fn unknown_template_errors() {
        assert!(get("nope").is_err());
    }

    #[test]
    fn render_substitutes_variables() {
        let mut vars = HashMap::new();
        vars.insert("Domain", "example.com".to_string());

        let rendered = render("wordlist_generation", &vars).unwrap();
        assert!(rendered.contains("example.com"));
        assert!(!rendered.contains("{{.Domain}}"));
    }

    #[test]
    fn render_drops_unsatisfied_conditionals() {
        let mut vars = HashMap::new();
        vars.insert("Domain", "example.com".to_string());

        let rendered = render("wordlist_generation", &vars).unwrap();
        // Industry/CompanyType were not supplied; their lines are gone.
        assert!(!rendered.contains("Industry"));
        assert!(!rendered.contains("{{if"));
        assert!(!rendered.contains("{{end}}"));
    }

    #[test]
    fn render_keeps_satisfied_conditionals() {
        let mut vars = HashMap::new();
        vars.insert("Domain", "example.com".to_string());
        vars.insert("Industry", "finance".to_string());

        let rendered = render("wordlist_generation", &vars).unwrap();
        assert!(rendered.contains("- Industry: finance"));
    }
}
