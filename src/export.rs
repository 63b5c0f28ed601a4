//! Re-serialization of a loaded frame back to delimited text.
//!
//! Output is comma-separated, double-quoted as needed, UTF-8, header row
//! included and no index column, matching what the download button of the
//! original tool produced.

use std::fs::File;
use std::path::Path;

use color_eyre::Result;
use polars::prelude::*;

/// Fixed artifact name offered for download.
pub const EXPORT_FILE_NAME: &str = "dataset_analisado.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// An in-memory downloadable file.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serialize the frame to CSV bytes.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(buf)
}

/// Build the download artifact for the current frame.
pub fn download_artifact(df: &DataFrame) -> Result<DownloadArtifact> {
    Ok(DownloadArtifact {
        file_name: EXPORT_FILE_NAME.to_string(),
        mime_type: EXPORT_MIME_TYPE,
        bytes: to_csv_bytes(df)?,
    })
}

/// Write the frame as CSV to a file on disk.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut df = df.clone();
    let file = File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name_and_mime() {
        let df = df!("a" => [1i64]).unwrap();
        let artifact = download_artifact(&df).unwrap();
        assert_eq!(artifact.file_name, "dataset_analisado.csv");
        assert_eq!(artifact.mime_type, "text/csv");
        assert!(!artifact.bytes.is_empty());
    }

    #[test]
    fn test_header_and_quoting() {
        let df = df!(
            "name" => ["plain", "with,comma"],
            "n" => [1i64, 2]
        )
        .unwrap();
        let text = String::from_utf8(to_csv_bytes(&df).unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("name,n"));
        assert_eq!(lines.next(), Some("plain,1"));
        assert_eq!(lines.next(), Some("\"with,comma\",2"));
    }
}
