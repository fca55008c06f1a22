//! Parsers for free-text insight responses.
//!
//! Task prompts ask for one item per line:
//!
//! - findings: `TYPE: DESCRIPTION: LOCATION: SEVERITY`
//! - vulnerabilities: `TYPE: DESCRIPTION: LOCATION: SEVERITY: CVSS: REMEDIATION`
//!
//! Models do not reliably honor this, so parsing is tolerant: list bullets, numbering and
//! markdown emphasis are stripped, descriptions and remediations may themselves contain
//! colons, and lines that do not fit (headers, prose, echoed format strings) are skipped.
//! Fields are located by anchoring on the severity word (and the score that follows it)
//! rather than by fixed position.

use crate::model::{Finding, Severity, Vulnerability};

/// Parse extraction-task output. Lines that do not fit the format are skipped.
pub fn parse_findings(response: &str) -> Vec<Finding> {
    response.lines().filter_map(|line| finding_from_fields(&fields(line)?)).collect()
}

/// Parse vulnerability-task output. Lines that do not fit the format are skipped.
pub fn parse_vulnerabilities(response: &str) -> Vec<Vulnerability> {
    response.lines().filter_map(|line| vulnerability_from_fields(&fields(line)?)).collect()
}

/// Summary text, or `None` when the response is blank.
pub fn parse_summary(response: &str) -> Option<String> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a CVSS-like score (`7.5`, `CVSS 7.5`, `7.5/10`). Out-of-range values are rejected.
pub fn parse_score(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    if text.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("cvss")) {
        text = text[4..].trim_start();
    }
    let number = text.split('/').next()?.trim();
    let value: f64 = number.parse().ok()?;
    if value.is_finite() && (0.0..=10.0).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | '+')).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    line
}

fn fields(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
        return None;
    }
    let line = strip_list_marker(line);
    let parts: Vec<String> = line
        .split(':')
        .map(|part| part.replace("**", "").replace('`', "").trim().to_string())
        .collect();
    if parts.len() < 4 {
        return None;
    }
    Some(parts)
}

fn finding_from_fields(parts: &[String]) -> Option<Finding> {
    let n = parts.len();
    let severity = Severity::parse_loose(&parts[n - 1])?;
    let category = parts[0].clone();
    let description = parts[1..n - 2].join(": ");
    if category.is_empty() || description.is_empty() {
        return None;
    }
    Some(Finding { category, description, location: parts[n - 2].clone(), severity })
}

fn vulnerability_from_fields(parts: &[String]) -> Option<Vulnerability> {
    let n = parts.len();
    if n < 6 {
        return None;
    }
    // Severity sits after TYPE, DESCRIPTION, LOCATION and must leave room for CVSS and
    // REMEDIATION; the first index where SEVERITY and CVSS both parse wins.
    let (idx, severity, cvss) = (3..=n - 3).find_map(|i| {
        let severity = Severity::parse_loose(&parts[i])?;
        let cvss = parse_score(&parts[i + 1])?;
        Some((i, severity, cvss))
    })?;

    let category = parts[0].clone();
    let description = parts[1..idx - 1].join(": ");
    if category.is_empty() || description.is_empty() {
        return None;
    }
    Some(Vulnerability {
        category,
        description,
        location: parts[idx - 1].clone(),
        severity,
        cvss,
        remediation: parts[idx + 2..].join(": "),
    })
}
