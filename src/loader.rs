//! Dataset loading and column type inference.
//!
//! A load is a single synchronous operation: dispatch on the file extension,
//! parse CSV (polars) or Excel (calamine) into a DataFrame, then run the
//! datetime inference pass over the string columns. The returned frame is
//! consumed read-only by every analysis handler.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

use crate::error::LoadError;

/// Match-ratio gate for the datetime inference pass. A string column is
/// converted only when strictly more than this fraction of its non-missing
/// values parses as a date. Fixed, not user-tunable.
const DATETIME_MATCH_THRESHOLD: f64 = 0.5;

/// Field delimiter for delimited-text sources. Fixed enumerated set;
/// ignored for spreadsheet sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// Tab character
    Tab,
    /// `|`
    Pipe,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Comma
    }
}

/// Source format, detected from the file name extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Delimited text (.csv)
    Delimited,
    /// Excel workbook (.xls, .xlsx)
    Excel,
}

impl FileFormat {
    /// Detect format from a file name. Returns None when the extension is
    /// missing or unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension().and_then(|e| e.to_str())?;
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Delimited),
            "xls" | "xlsx" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Immutable inputs to a single load operation, supplied externally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Field delimiter; only consulted for delimited text.
    pub delimiter: Delimiter,
    /// Sheet name; only consulted for spreadsheets. None loads the first sheet.
    pub sheet: Option<String>,
}

/// Load an uploaded byte stream with its associated file name.
///
/// Dispatches on the extension, parses, then runs the datetime inference
/// pass. Any parse failure surfaces as a `LoadError`; no partially-built
/// table is ever returned.
pub fn load_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> Result<DataFrame, LoadError> {
    let format = FileFormat::from_name(name).ok_or_else(|| LoadError::UnsupportedFormat {
        name: name.to_string(),
    })?;
    let mut df = match format {
        FileFormat::Delimited => read_delimited(bytes, options.delimiter)?,
        FileFormat::Excel => read_excel(bytes, options.sheet.as_deref())?,
    };
    infer_datetime_columns(&mut df);
    log::info!(
        "loaded '{}': {} rows, {} columns",
        name,
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Load a file from disk. Reads the bytes and defers to [`load_bytes`].
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<DataFrame, LoadError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = std::fs::read(path)?;
    load_bytes(&name, &bytes, options)
}

/// Enumerate worksheet names of a spreadsheet source.
///
/// Fails with `UnsupportedFormat` for non-spreadsheet names and with
/// `SheetListUnavailable` when the workbook cannot be opened; the caller is
/// expected to show the message and leave the sheet selector empty.
pub fn sheet_names(name: &str, bytes: &[u8]) -> Result<Vec<String>, LoadError> {
    match FileFormat::from_name(name) {
        Some(FileFormat::Excel) => {}
        _ => {
            return Err(LoadError::UnsupportedFormat {
                name: name.to_string(),
            })
        }
    }
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(LoadError::SheetListUnavailable)?;
    Ok(workbook.sheet_names().to_vec())
}

/// Parse delimited text with the given separator.
///
/// Schema inference scans the whole input so a column with mixed content
/// lands as String (and gets a chance at the datetime pass) instead of
/// failing mid-file. A wrong delimiter typically yields a single-column
/// frame, which is valid output, not an error.
fn read_delimited(bytes: &[u8], delimiter: Delimiter) -> Result<DataFrame, LoadError> {
    let mut read_options = CsvReadOptions::default();
    read_options.infer_schema_length = None;
    read_options =
        read_options.map_parse_options(|opts| opts.with_separator(delimiter.as_byte()));
    let df = CsvReader::new(Cursor::new(bytes.to_vec()))
        .with_options(read_options)
        .finish()?;
    Ok(df)
}

/// Inferred value type for an Excel column (preserves numbers, bools, and
/// native dates; string cells go through the generic datetime pass instead).
#[derive(Clone, Copy)]
enum ExcelColType {
    Int64,
    Float64,
    Boolean,
    Utf8,
    Date,
    Datetime,
}

/// Read one worksheet of an Excel workbook (.xls, .xlsx) into a DataFrame.
/// Sheet is selected by name; None loads the first sheet.
fn read_excel(bytes: &[u8], sheet: Option<&str>) -> Result<DataFrame, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(LoadError::Excel(calamine::Error::Msg(
            "workbook has no worksheets",
        )));
    }
    let selected = match sheet {
        Some(s) => {
            if !names.iter().any(|n| n == s) {
                return Err(LoadError::SheetNotFound(s.to_string()));
            }
            s.to_string()
        }
        None => names[0].clone(),
    };
    let range = workbook.worksheet_range(&selected)?;

    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|c| calamine::DataType::as_string(c).unwrap_or_else(|| c.to_string()))
        .collect();
    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let inferred = excel_infer_column_type(&cells);
        let name = if header.is_empty() {
            format!("column_{}", col_idx + 1)
        } else {
            header.clone()
        };
        let series = excel_column_to_series(name.as_str(), &cells, inferred)?;
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Infers an Excel column's type from its cells. Whole-number float columns
/// become Int64; native date cells become Date when every time-of-day is
/// midnight, Datetime otherwise. Any string cell forces Utf8.
fn excel_infer_column_type(cells: &[Option<&Data>]) -> ExcelColType {
    use calamine::DataType as CalamineTrait;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if CalamineTrait::is_string(*cell) {
            return ExcelColType::Utf8;
        }
        if CalamineTrait::is_float(*cell) {
            has_float = true;
        }
        if CalamineTrait::is_int(*cell) {
            has_int = true;
        }
        if CalamineTrait::is_bool(*cell) {
            has_bool = true;
        }
        if CalamineTrait::is_datetime(*cell) || CalamineTrait::is_datetime_iso(*cell) {
            has_datetime = true;
        }
    }
    if has_datetime {
        if excel_cells_all_midnight(cells) {
            ExcelColType::Date
        } else {
            ExcelColType::Datetime
        }
    } else if has_int && !has_float {
        ExcelColType::Int64
    } else if has_float {
        let all_whole = cells.iter().flatten().all(|cell| {
            calamine::DataType::as_f64(*cell)
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole {
            ExcelColType::Int64
        } else {
            ExcelColType::Float64
        }
    } else if has_bool {
        ExcelColType::Boolean
    } else {
        ExcelColType::Utf8
    }
}

/// True if every cell that converts to a datetime has time 00:00:00.
fn excel_cells_all_midnight(cells: &[Option<&Data>]) -> bool {
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("valid time");
    cells
        .iter()
        .flatten()
        .filter_map(|c| excel_cell_to_datetime(c))
        .all(|dt| dt.time() == midnight)
}

/// Converts a calamine cell (Excel serial or ISO datetime) to NaiveDateTime.
fn excel_cell_to_datetime(cell: &Data) -> Option<NaiveDateTime> {
    calamine::DataType::as_datetime(cell)
}

/// Build a Polars Series from a column of calamine cells using the inferred type.
fn excel_column_to_series(
    name: &str,
    cells: &[Option<&Data>],
    col_type: ExcelColType,
) -> PolarsResult<Series> {
    use calamine::DataType as CalamineTrait;
    let series = match col_type {
        ExcelColType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::as_i64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::as_f64(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Utf8 => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.and_then(|cell| CalamineTrait::as_string(cell)))
                .collect();
            Series::new(name.into(), v)
        }
        ExcelColType::Date => {
            let v: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    c.and_then(excel_cell_to_datetime)
                        .map(|dt| days_since_epoch(dt.date()))
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Date)?
        }
        ExcelColType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(excel_cell_to_datetime)
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}

/// Days between the given date and 1970-01-01, the physical encoding of
/// the Date dtype.
pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");
    (date - epoch).num_days() as i32
}

/// Inverse of [`days_since_epoch`].
pub(crate) fn date_from_days(days: i32) -> NaiveDate {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date");
    epoch + chrono::Duration::days(days as i64)
}

/// Datetime inference pass over every string column of the frame.
///
/// For each column: parse every non-missing value as a date, count
/// successes, and convert the column to day-precision dates only when the
/// match ratio strictly exceeds 0.5. Unparseable cells in a converted
/// column become null dates. A column with zero non-missing values is
/// skipped. Per-column failures are absorbed; inference never aborts a load.
pub fn infer_datetime_columns(df: &mut DataFrame) {
    let candidates: Vec<String> = df
        .schema()
        .iter()
        .filter(|(_, dtype)| matches!(dtype, DataType::String))
        .map(|(name, _)| name.to_string())
        .collect();
    for name in candidates {
        if let Err(e) = try_convert_datetime_column(df, &name) {
            log::debug!("datetime inference left '{}' untouched: {}", name, e);
        }
    }
}

fn try_convert_datetime_column(df: &mut DataFrame, name: &str) -> PolarsResult<()> {
    let series = df.column(name)?.as_materialized_series().clone();
    let ca = series.str()?;
    let non_missing = ca.len() - ca.null_count();
    if non_missing == 0 {
        return Ok(());
    }

    let mut parsed: Vec<Option<i32>> = Vec::with_capacity(ca.len());
    let mut hits = 0usize;
    for value in ca.iter() {
        match value.and_then(parse_date_str) {
            Some(date) => {
                hits += 1;
                parsed.push(Some(days_since_epoch(date)));
            }
            None => parsed.push(None),
        }
    }

    let ratio = hits as f64 / non_missing as f64;
    if ratio > DATETIME_MATCH_THRESHOLD {
        log::debug!(
            "column '{}' converted to date ({}/{} values parsed)",
            name,
            hits,
            non_missing
        );
        let dates = Series::new(name.into(), parsed).cast(&DataType::Date)?;
        df.with_column(dates)?;
    }
    Ok(())
}

/// Parse a single cell as a date, truncating any time-of-day.
///
/// Datetime formats are tried before date-only formats; within each group,
/// first match wins, with day-first forms ahead of month-first.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_bytes(content: &str) -> Vec<u8> {
        content.as_bytes().to_vec()
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(FileFormat::from_name("a.csv"), Some(FileFormat::Delimited));
        assert_eq!(FileFormat::from_name("b.XLSX"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_name("c.xls"), Some(FileFormat::Excel));
        assert_eq!(FileFormat::from_name("d.parquet"), None);
        assert_eq!(FileFormat::from_name("noext"), None);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let err = load_bytes("data.json", b"{}", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_csv_with_semicolon_delimiter() {
        let bytes = csv_bytes("a;b\n1;x\n2;y\n");
        let options = LoadOptions {
            delimiter: Delimiter::Semicolon,
            sheet: None,
        };
        let df = load_bytes("data.csv", &bytes, &options).unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_delimiter_mismatch_yields_single_column() {
        // Semicolon-delimited content read with comma: one wide string column.
        let bytes = csv_bytes("a;b\n1;x\n2;y\n");
        let df = load_bytes("data.csv", &bytes, &LoadOptions::default()).unwrap();
        assert_eq!(df.width(), 1);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_parse_date_str_variants() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(parse_date_str("2021-03-14"), Some(d));
        assert_eq!(parse_date_str("2021/03/14"), Some(d));
        assert_eq!(parse_date_str("14/03/2021"), Some(d));
        assert_eq!(parse_date_str("2021-03-14 10:30:00"), Some(d));
        assert_eq!(parse_date_str("2021-03-14T10:30:00"), Some(d));
        assert_eq!(parse_date_str(" 2021-03-14 "), Some(d));
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn test_majority_dates_convert_with_nulls_for_failures() {
        let mut df = df!(
            "when" => ["2021-01-01", "2021-01-02", "2021-01-03", "xyz"]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        let col = df.column("when").unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_exactly_half_dates_stay_text() {
        // R = 2/4 = 0.5 exactly: strict > means no conversion.
        let mut df = df!(
            "maybe" => ["2021-01-01", "2021-01-02", "abc", "xyz"]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        assert_eq!(df.column("maybe").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_values_excluded_from_ratio() {
        // 2 parses out of 3 non-missing = 0.66 > 0.5, converts.
        let mut df = df!(
            "when" => [Some("2021-01-01"), None, Some("2021-01-02"), Some("junk")]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        let col = df.column("when").unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
        // original null plus the coercion failure
        assert_eq!(col.null_count(), 2);
    }

    #[test]
    fn test_all_missing_column_is_skipped() {
        let mut df = df!(
            "empty" => [None::<&str>, None, None]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        assert_eq!(df.column("empty").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_time_of_day_truncated() {
        let mut df = df!(
            "ts" => ["2021-06-01 08:15:00", "2021-06-02 23:59:59"]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        let col = df.column("ts").unwrap();
        assert_eq!(col.dtype(), &DataType::Date);
        let phys = col
            .as_materialized_series()
            .cast(&DataType::Int32)
            .unwrap();
        let days: Vec<i32> = phys.i32().unwrap().iter().flatten().collect();
        assert_eq!(
            days,
            vec![
                days_since_epoch(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()),
                days_since_epoch(NaiveDate::from_ymd_opt(2021, 6, 2).unwrap()),
            ]
        );
    }

    #[test]
    fn test_numeric_columns_untouched_by_inference() {
        let mut df = df!(
            "n" => [1i64, 2, 3]
        )
        .unwrap();
        infer_datetime_columns(&mut df);
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_sheet_names_rejects_non_excel() {
        let err = sheet_names("data.csv", b"a,b\n").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_sheet_names_unreadable_workbook() {
        let err = sheet_names("data.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, LoadError::SheetListUnavailable(_)));
    }

    #[test]
    fn test_date_days_round_trip() {
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(date_from_days(days_since_epoch(d)), d);
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(days_since_epoch(epoch), 0);
    }
}
