//! CSV export of completed submissions

use civic_common::{FeedbackSubmission, ProcessingStatus};
use csv::{QuoteStyle, WriterBuilder};

/// Suggested download name
pub const EXPORT_FILENAME: &str = "civic-feedback-analysis.csv";

pub const EXPORT_HEADER: [&str; 7] = [
    "Original Text",
    "Original Language",
    "Translated Text",
    "Sentiment Label",
    "Sentiment Score",
    "Inclusive Rewrite",
    "Demographic Tags",
];

const TAG_SEPARATOR: &str = "; ";

/// Render completed submissions, in the given order, as CSV text.
///
/// Missing optional fields, the sentiment score included, are written as
/// empty cells.
pub fn export_csv(submissions: &[FeedbackSubmission]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;

    for submission in submissions
        .iter()
        .filter(|s| s.processing_status == ProcessingStatus::Completed)
    {
        let score = submission
            .sentiment_score
            .map(|score| score.to_string())
            .unwrap_or_default();
        let tags = submission.demographic_tags.join(TAG_SEPARATOR);
        writer.write_record([
            submission.original_text.as_str(),
            submission.original_language.as_deref().unwrap_or(""),
            submission.translated_text.as_deref().unwrap_or(""),
            submission.sentiment_label.map(|l| l.as_str()).unwrap_or(""),
            score.as_str(),
            submission.inclusive_rewrite.as_deref().unwrap_or(""),
            tags.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    // Every cell came from a &str
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civic_common::{NewSubmission, SentimentLabel};

    const HEADER_LINE: &str = "Original Text,Original Language,Translated Text,Sentiment Label,Sentiment Score,Inclusive Rewrite,Demographic Tags\n";

    fn record(text: &str, status: ProcessingStatus) -> FeedbackSubmission {
        let mut record = FeedbackSubmission::new(
            "id".to_string(),
            NewSubmission::new(text),
            Utc::now(),
        );
        record.processing_status = status;
        record
    }

    #[test]
    fn test_header_only_without_completed() {
        let pending = record("pending", ProcessingStatus::Pending);
        assert_eq!(export_csv(&[pending]).unwrap(), HEADER_LINE);
        assert_eq!(export_csv(&[]).unwrap(), HEADER_LINE);
    }

    #[test]
    fn test_row_fields_and_quoting() {
        let mut done = record("Buses are late, \"again\"", ProcessingStatus::Completed);
        done.original_language = Some("English".to_string());
        done.translated_text = Some("Buses are late, \"again\"".to_string());
        done.sentiment_label = Some(SentimentLabel::Negative);
        done.sentiment_score = Some(-0.6);
        done.inclusive_rewrite = Some("Bus service is often delayed".to_string());
        done.demographic_tags = vec!["Urban".to_string(), "Youth (18-25)".to_string()];

        let csv = export_csv(&[done]).unwrap();
        let row = csv.strip_prefix(HEADER_LINE).unwrap();
        assert_eq!(
            row,
            "\"Buses are late, \"\"again\"\"\",English,\"Buses are late, \"\"again\"\"\",negative,-0.6,Bus service is often delayed,Urban; Youth (18-25)\n"
        );
    }

    #[test]
    fn test_missing_score_is_empty_cell() {
        let done = record("text", ProcessingStatus::Completed);
        let csv = export_csv(&[done]).unwrap();
        assert_eq!(csv.strip_prefix(HEADER_LINE).unwrap(), "text,,,,,,\n");
    }

    #[test]
    fn test_zero_score_is_written() {
        let mut done = record("text", ProcessingStatus::Completed);
        done.sentiment_score = Some(0.0);
        let csv = export_csv(&[done]).unwrap();
        assert_eq!(csv.strip_prefix(HEADER_LINE).unwrap(), "text,,,,0,,\n");
    }

    #[test]
    fn test_keeps_input_order() {
        let first = record("first", ProcessingStatus::Completed);
        let skipped = record("skipped", ProcessingStatus::Failed);
        let second = record("second", ProcessingStatus::Completed);

        let csv = export_csv(&[first, skipped, second]).unwrap();
        let texts: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
