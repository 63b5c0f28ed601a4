//! Load error taxonomy and user-facing message formatting.
//!
//! Messages are produced by matching on typed error variants (PolarsError,
//! io::ErrorKind, calamine::Error) rather than string parsing. Every failure
//! is reported to the user; none terminates the program.

use polars::prelude::PolarsError;
use std::io;

/// Failure modes of a single load operation.
///
/// `UnsupportedFormat` and the sheet errors carry enough context to be shown
/// directly; the parser variants wrap the underlying cause so callers can
/// still downcast when they need to.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File name does not end in a recognized extension.
    #[error("unsupported file format '{name}': expected .csv, .xls, or .xlsx")]
    UnsupportedFormat { name: String },

    /// The delimited-text parser rejected the content.
    #[error("failed to parse delimited text: {0}")]
    Csv(#[from] PolarsError),

    /// The spreadsheet parser rejected the container or a cell range.
    #[error("failed to read spreadsheet: {0}")]
    Excel(#[from] calamine::Error),

    /// A sheet was requested by name but the workbook has no such sheet.
    #[error("worksheet '{0}' not found in workbook")]
    SheetNotFound(String),

    /// Sheet enumeration failed; the caller leaves the sheet selector empty.
    #[error("could not list worksheets: {0}")]
    SheetListUnavailable(#[source] calamine::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoadError {
    /// Single-line message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Csv(e) => format!("Error loading file: {}", user_message_from_polars(e)),
            LoadError::Io(e) => format!("Error loading file: {}", user_message_from_io(e)),
            other => format!("Error loading file: {}", other),
        }
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check spelling and that the column exists.",
            msg
        ),
        PE::Duplicate(msg) => format!("Duplicate column: {}", msg),
        PE::IO { error, msg } => {
            let base = user_message_from_io(error.as_ref());
            match msg {
                Some(m) => format!("{} {}", base, m),
                None => base,
            }
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::OutOfBounds(msg) => format!("Index or row out of bounds: {}", msg),
        PE::ComputeError(msg) => msg.to_string(),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        _ => err.to_string(),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find LoadError, PolarsError, or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(le) = cause.downcast_ref::<LoadError>() {
            return le.user_message();
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(pe);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err);
        }
    }

    // Fallback: first line of display, to avoid long tracebacks
    let display = report.to_string();
    display
        .lines()
        .next()
        .map(str::trim)
        .unwrap_or("An error occurred")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = LoadError::UnsupportedFormat {
            name: "dataset.parquet".to_string(),
        };
        let msg = err.user_message();
        assert!(
            msg.contains("dataset.parquet"),
            "expected file name, got: {}",
            msg
        );
        assert!(msg.contains(".csv"), "expected hint, got: {}", msg);
    }

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        let msg = user_message_from_io(&err);
        assert!(
            msg.contains("not found"),
            "expected 'not found', got: {}",
            msg
        );
    }

    #[test]
    fn test_user_message_from_polars_column_not_found() {
        let err = PolarsError::ColumnNotFound("foo".into());
        let msg = user_message_from_polars(&err);
        assert!(msg.contains("foo"), "expected 'foo', got: {}", msg);
        assert!(
            msg.contains("Column not found"),
            "expected column not found, got: {}",
            msg
        );
    }

    #[test]
    fn test_report_downcast_finds_load_error() {
        let report = color_eyre::eyre::Report::new(LoadError::SheetNotFound("Plan2".to_string()));
        let msg = user_message_from_report(&report);
        assert!(msg.contains("Plan2"), "expected sheet name, got: {}", msg);
    }
}
