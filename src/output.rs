use serde::{Deserialize, Serialize};

use crate::matcher::MatchReport;
use crate::util::format_offset_ms;

/// Output format for a match report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable offset, counts, and a low-confidence warning.
    Simple,
    /// Full JSON with all report fields.
    Json,
    /// CSV format for logging.
    Csv,
    /// Custom format with placeholders.
    Custom(&'static str),
}

/// A formatted match report, ready to print.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutput {
    pub format: String,
    pub content: String,
}

impl MatchOutput {
    /// Formats `report` according to `format`, flagging low confidence
    /// against `confidence_threshold` under [`OutputFormat::Simple`].
    pub fn format_result(
        report: &MatchReport,
        format: OutputFormat,
        confidence_threshold: usize,
    ) -> Self {
        let content = match format {
            OutputFormat::Simple => {
                let mut summary = format!(
                    "offset: {} ({} ms), matches: {}, rate: {:.3}, confidence: {}",
                    format_offset_ms(report.offset_ms.round() as i64),
                    report.offset_ms,
                    report.match_count,
                    report.match_rate,
                    report.confidence
                );
                if report.confidence < confidence_threshold {
                    summary.push_str("\nwarning: low confidence match");
                }
                summary
            }
            OutputFormat::Json => {
                serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Csv => {
                format!(
                    "{},{},{:.6},{}",
                    report.offset_ms, report.match_count, report.match_rate, report.confidence
                )
            }
            OutputFormat::Custom(template) => Self::format_custom(report, template),
        };

        MatchOutput {
            format: format.to_string(),
            content,
        }
    }

    /// Formats using a custom template with placeholders.
    fn format_custom(report: &MatchReport, template: &str) -> String {
        template
            .replace("{offset_ms}", &report.offset_ms.to_string())
            .replace("{match_count}", &report.match_count.to_string())
            .replace("{match_rate}", &format!("{:.3}", report.match_rate))
            .replace("{confidence}", &report.confidence.to_string())
    }

    /// Returns the CSV header matching [`OutputFormat::Csv`]'s column order.
    pub fn csv_header() -> &'static str {
        "offset_ms,match_count,match_rate,confidence"
    }
}

impl std::fmt::Display for MatchOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Simple => write!(f, "Simple"),
            OutputFormat::Json => write!(f, "Json"),
            OutputFormat::Csv => write!(f, "Csv"),
            OutputFormat::Custom(template) => write!(f, "Custom({})", template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> MatchReport {
        MatchReport {
            offset_ms: 1000.0,
            match_count: 12,
            match_rate: 0.8,
            confidence: 12,
            matches: Vec::new(),
        }
    }

    #[test]
    fn simple_format_contains_h_mm_ss_mmm_offset() {
        let output = MatchOutput::format_result(&sample_report(), OutputFormat::Simple, 5);
        assert!(output.content.contains("0:00:01.000"));
        assert!(!output.content.contains("warning"));
    }

    #[test]
    fn simple_format_warns_on_low_confidence() {
        let mut report = sample_report();
        report.confidence = 2;
        let output = MatchOutput::format_result(&report, OutputFormat::Simple, 5);
        assert!(output.content.contains("warning: low confidence match"));
    }

    #[test]
    fn json_format_round_trips_fields() {
        let output = MatchOutput::format_result(&sample_report(), OutputFormat::Json, 5);
        let parsed: serde_json::Value = serde_json::from_str(&output.content).unwrap();
        assert_eq!(parsed["confidence"], 12);
    }
}
