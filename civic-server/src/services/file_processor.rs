//! Batch upload parsing (CSV and line-per-item text)

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

const TEXT_COLUMNS: &[&str] = &["feedback", "text", "comment"];
const LANGUAGE_COLUMNS: &[&str] = &["language", "lang"];
const GROUP_COLUMNS: &[&str] = &["demographic", "group"];

/// File processing errors; the display text is returned to the uploader
#[derive(Debug, Error, PartialEq)]
pub enum FileProcessingError {
    #[error("No valid feedback found in CSV file. Please ensure the file has a \"feedback\" column with text content.")]
    NoCsvRows,

    #[error("Failed to parse CSV file: {0}")]
    CsvParse(String),

    #[error("No text content found in the file.")]
    NoTextLines,

    #[error("Unsupported file type. Please upload CSV or TXT files.")]
    UnsupportedType,
}

/// Upload formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Text,
}

impl UploadKind {
    /// Case-insensitive extension match
    pub fn from_filename(filename: &str) -> Result<Self, FileProcessingError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(UploadKind::Csv),
            Some("txt") => Ok(UploadKind::Text),
            _ => Err(FileProcessingError::UnsupportedType),
        }
    }
}

/// One feedback item extracted from an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRow {
    pub feedback: String,
    pub language: Option<String>,
    pub demographic: Option<String>,
}

/// Parse an uploaded file; bytes are decoded as UTF-8 (lossy)
pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<Vec<FeedbackRow>, FileProcessingError> {
    let kind = UploadKind::from_filename(filename)?;
    let content = String::from_utf8_lossy(bytes);
    match kind {
        UploadKind::Csv => parse_csv(&content),
        UploadKind::Text => parse_text(&content),
    }
}

/// Parse CSV with a header row.
///
/// Cells are trimmed, blank lines skipped and ragged rows tolerated. Rows
/// without feedback text are dropped.
pub fn parse_csv(content: &str) -> Result<Vec<FeedbackRow>, FileProcessingError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FileProcessingError::CsvParse(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FileProcessingError::CsvParse(e.to_string()))?;
        let Some(feedback) = first_present(&headers, &record, TEXT_COLUMNS) else {
            continue;
        };
        rows.push(FeedbackRow {
            feedback,
            language: first_present(&headers, &record, LANGUAGE_COLUMNS),
            demographic: first_present(&headers, &record, GROUP_COLUMNS),
        });
    }

    if rows.is_empty() {
        return Err(FileProcessingError::NoCsvRows);
    }

    tracing::debug!(rows = rows.len(), "Parsed CSV upload");
    Ok(rows)
}

/// One item per non-empty trimmed line
pub fn parse_text(content: &str) -> Result<Vec<FeedbackRow>, FileProcessingError> {
    let rows: Vec<FeedbackRow> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| FeedbackRow {
            feedback: line.to_string(),
            language: None,
            demographic: None,
        })
        .collect();

    if rows.is_empty() {
        return Err(FileProcessingError::NoTextLines);
    }

    Ok(rows)
}

/// First non-empty cell among `columns`, in column-name priority order
fn first_present(headers: &StringRecord, record: &StringRecord, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|name| {
        let index = headers.iter().position(|h| h == *name)?;
        record
            .get(index)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}
