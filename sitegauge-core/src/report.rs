// Report rendering for analysis output

use sitegauge_analyzer::config::SiteConfiguration;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// How many candidates the text and markdown renderings list.
const REPORT_CANDIDATE_LIMIT: usize = 20;

pub fn render(config: &SiteConfiguration, format: &ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(config),
        ReportFormat::Json => {
            serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string())
        }
        ReportFormat::Markdown => render_markdown(config),
    }
}

pub fn save_report(
    config: &SiteConfiguration,
    format: &ReportFormat,
    path: &Path,
) -> std::io::Result<()> {
    let content = render(config, format);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())
}

fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

fn render_text(config: &SiteConfiguration) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Source: {}\n", config.source_url));
    if let Some(ref name) = config.site_name {
        report.push_str(&format!("  Site name: {}\n", name));
    }
    if let Some(ref description) = config.description {
        report.push_str(&format!("  Description: {}\n", description));
    }
    report.push_str(&format!(
        "  Type: {} ({:.0}% confidence)\n",
        config.detection.site_type.as_str(),
        config.detection.confidence * 100.0
    ));
    report.push_str(&format!("  Analyzed at: {}\n", config.generated_at.to_rfc3339()));

    report.push_str("\n# Capabilities:\n");
    for (kind, confidence) in &config.detection.capabilities {
        report.push_str(&format!(
            "  {} {:<14} {:.2}\n",
            confidence_bar(*confidence),
            kind.as_str(),
            confidence
        ));
    }

    report.push_str("\n# Processing flags:\n");
    for (flag, value) in &config.derived_flags {
        report.push_str(&format!(
            "  {} {}\n",
            if *value { "[x]" } else { "[ ]" },
            flag.as_str()
        ));
    }

    report.push_str(&format!(
        "\n# Candidate URLs ({} total):\n",
        config.candidates.len()
    ));
    for candidate in config.candidates.iter().take(REPORT_CANDIDATE_LIMIT) {
        report.push_str(&format!("  {:.2} {}", candidate.score, candidate.url));
        if !candidate.anchor_text.is_empty() {
            report.push_str(&format!("  \"{}\"", candidate.anchor_text));
        }
        report.push('\n');
    }
    if config.candidates.len() > REPORT_CANDIDATE_LIMIT {
        report.push_str(&format!(
            "  ... and {} more\n",
            config.candidates.len() - REPORT_CANDIDATE_LIMIT
        ));
    }

    report.push_str("\n# Recommended settings:\n");
    report.push_str(&format!(
        "  Max URLs per session: {}\n",
        config.hints.max_urls_per_session
    ));
    report.push_str(&format!("  Request delay: {} ms\n", config.hints.request_delay_ms));
    report.push_str(&format!("  Priority candidates: {}\n", config.hints.priority_count));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report
}

fn render_markdown(config: &SiteConfiguration) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "# Site configuration: {}\n\n",
        config.site_name.as_deref().unwrap_or(&config.source_url)
    ));
    report.push_str(&format!("- **Source**: {}\n", config.source_url));
    report.push_str(&format!(
        "- **Type**: {} ({:.0}% confidence)\n",
        config.detection.site_type.as_str(),
        config.detection.confidence * 100.0
    ));
    if let Some(ref description) = config.description {
        report.push_str(&format!("- **Description**: {}\n", description));
    }
    report.push_str(&format!(
        "- **Analyzed at**: {}\n",
        config.generated_at.to_rfc3339()
    ));

    report.push_str("\n## Capabilities\n\n");
    report.push_str("| Capability | Confidence | Enabled |\n");
    report.push_str("|---|---|---|\n");
    for (kind, confidence) in &config.detection.capabilities {
        let flag = sitegauge_analyzer::config::DerivedFlag::for_region(*kind);
        let enabled = config.derived_flags.get(&flag).copied().unwrap_or(false);
        report.push_str(&format!(
            "| {} | {:.2} | {} |\n",
            kind.as_str(),
            confidence,
            if enabled { "yes" } else { "no" }
        ));
    }

    report.push_str("\n## Candidate URLs\n\n");
    for candidate in config.candidates.iter().take(REPORT_CANDIDATE_LIMIT) {
        report.push_str(&format!(
            "1. [{}]({}) ({:.2})\n",
            if candidate.anchor_text.is_empty() {
                &candidate.url
            } else {
                &candidate.anchor_text
            },
            candidate.url,
            candidate.score
        ));
    }

    report
}
