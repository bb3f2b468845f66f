//! Transcript alignment: resolving each quote's timestamp from the markers in
//! its source transcript.
//!
//! The extractor's own timestamps are unreliable, so the alignment pass
//! locates every quote in the transcript and takes the nearest marker that
//! precedes it.

mod locate;
mod markers;

pub use locate::locate_quote;
pub use markers::{normalize_timestamp, MarkerScanner};

use crate::config::MissingTimestampPolicy;
use crate::corpus::QuoteRecord;
use crate::error::{PodquoteError, Result};
use serde::Serialize;

/// Timestamp written under [`MissingTimestampPolicy::Zero`].
pub const ZERO_TIMESTAMP: &str = "00:00:00";

/// Resolve the timestamp of one quote.
pub fn align_quote(scanner: &MarkerScanner, transcript: &str, quote: &str) -> Result<String> {
    let offset = locate_quote(transcript, quote)
        .ok_or_else(|| PodquoteError::AlignmentNotFound(format!("Text not found: {}", preview(quote))))?;

    scanner.timestamp_before(transcript, offset).ok_or_else(|| {
        PodquoteError::AlignmentNotFound(format!("No timestamp found for: {}", preview(quote)))
    })
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        out.push_str("...");
    }
    out
}

/// Outcome of aligning one or more quote files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlignmentReport {
    pub files: usize,
    pub quotes_checked: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub warnings: Vec<String>,
}

impl AlignmentReport {
    pub fn merge(&mut self, other: AlignmentReport) {
        self.files += other.files;
        self.quotes_checked += other.quotes_checked;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.warnings.extend(other.warnings);
    }
}

/// Align every quote of one unit in place.
///
/// Only the `timestamp` field is touched. Quotes that cannot be resolved are
/// handled according to `policy` and reported as warnings.
pub fn align_quotes(
    scanner: &MarkerScanner,
    transcript: &str,
    quotes: &mut [QuoteRecord],
    policy: MissingTimestampPolicy,
) -> AlignmentReport {
    let mut report = AlignmentReport {
        files: 1,
        quotes_checked: quotes.len(),
        ..Default::default()
    };

    for quote in quotes.iter_mut() {
        let resolved = match align_quote(scanner, transcript, &quote.text) {
            Ok(ts) => Some(ts),
            Err(e) => {
                report.warnings.push(e.to_string());
                match policy {
                    MissingTimestampPolicy::Leave => None,
                    MissingTimestampPolicy::Zero => Some(ZERO_TIMESTAMP.to_string()),
                }
            }
        };

        match resolved {
            Some(ts) if quote.timestamp.as_deref() != Some(ts.as_str()) => {
                quote.timestamp = Some(ts);
                report.updated += 1;
            }
            _ => report.unchanged += 1,
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_is_about_retention() {
        let transcript = "(00:01:15) Speaker: Growth is about retention.";
        let scanner = MarkerScanner::new();
        assert_eq!(
            align_quote(&scanner, transcript, "Growth is about retention.").unwrap(),
            "00:01:15"
        );
    }

    #[test]
    fn test_align_quote_errors() {
        let scanner = MarkerScanner::new();
        let err = align_quote(&scanner, "Ada: Focus wins.", "Never said.").unwrap_err();
        assert!(matches!(err, PodquoteError::AlignmentNotFound(_)));

        let err = align_quote(&scanner, "Ada: Focus wins.", "Focus wins.").unwrap_err();
        assert!(err.to_string().contains("No timestamp"));
    }

    fn quotes() -> Vec<QuoteRecord> {
        let mut correct = QuoteRecord::new("Focus wins.", "Ada");
        correct.timestamp = Some("00:00:40".to_string());
        let mut wrong = QuoteRecord::new("Hire for slope.", "Ada");
        wrong.timestamp = Some("00:59:59".to_string());
        let mut lost = QuoteRecord::new("Never said.", "Ada");
        lost.timestamp = Some("00:07:00".to_string());
        let missing = QuoteRecord::new("Also never said.", "Ada");
        vec![correct, wrong, lost, missing]
    }

    const TRANSCRIPT: &str = "(00:00:40) Ada: Focus wins. (01:10) Ada: Hire for slope.";

    #[test]
    fn test_align_quotes_leave_policy() {
        let mut quotes = quotes();
        let report = align_quotes(
            &MarkerScanner::new(),
            TRANSCRIPT,
            &mut quotes,
            MissingTimestampPolicy::Leave,
        );

        assert_eq!(report.quotes_checked, 4);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 3);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(quotes[1].timestamp.as_deref(), Some("00:01:10"));
        assert_eq!(quotes[2].timestamp.as_deref(), Some("00:07:00"));
        assert_eq!(quotes[3].timestamp, None);
    }

    #[test]
    fn test_align_quotes_zero_policy() {
        let mut quotes = quotes();
        let report = align_quotes(
            &MarkerScanner::new(),
            TRANSCRIPT,
            &mut quotes,
            MissingTimestampPolicy::Zero,
        );

        assert_eq!(report.updated, 3);
        assert_eq!(quotes[2].timestamp.as_deref(), Some(ZERO_TIMESTAMP));
        assert_eq!(quotes[3].timestamp.as_deref(), Some(ZERO_TIMESTAMP));
        assert_eq!(quotes.len(), 4);
    }
}
