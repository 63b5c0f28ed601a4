//! Per-column statistics over a loaded frame.
//!
//! Everything here is a direct aggregation of the frame: describe-style
//! summaries, the info listing, missing-value counts, value counts,
//! histogram/box-plot data, and the Pearson correlation matrix. Results are
//! plain structs so the text reports and the chart writers share one source.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::classify::{classify, ColumnKind};
use crate::loader::date_from_days;

/// Describe-style summary of one column (`describe(include='all')` analog).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    /// Non-null count.
    pub count: usize,
    pub null_count: usize,
    pub numeric: Option<NumericSummary>,
    pub categorical: Option<CategoricalSummary>,
    pub datetime: Option<DatetimeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub unique: usize,
    /// Most frequent value and its count.
    pub top: Option<String>,
    pub freq: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatetimeSummary {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

/// Describe statistics for every column, in column order.
pub fn describe(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let kind = classify(series.dtype());
        let count = series.len() - series.null_count();

        let numeric = if kind == ColumnKind::Numeric {
            Some(numeric_summary(series))
        } else {
            None
        };
        let categorical = if kind == ColumnKind::Categorical {
            Some(categorical_summary(series)?)
        } else {
            None
        };
        let datetime = if kind == ColumnKind::Datetime {
            Some(datetime_summary(series)?)
        } else {
            None
        };

        summaries.push(ColumnSummary {
            name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            kind,
            count,
            null_count: series.null_count(),
            numeric,
            categorical,
            datetime,
        });
    }
    Ok(summaries)
}

/// Non-null values of a numeric column as f64, via a Float64 cast.
pub(crate) fn numeric_values(series: &Series) -> Vec<f64> {
    match series.cast(&DataType::Float64) {
        Ok(cast) => match cast.f64() {
            Ok(ca) => ca.iter().flatten().filter(|v| v.is_finite()).collect(),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn numeric_summary(series: &Series) -> NumericSummary {
    let mean = series.mean().unwrap_or(f64::NAN);
    let std = series.std(1).unwrap_or(f64::NAN); // sample std (ddof=1)

    let mut sorted = numeric_values(series);
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    NumericSummary {
        mean,
        std,
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q25: percentile(&sorted, 25.0),
        median: percentile(&sorted, 50.0),
        q75: percentile(&sorted, 75.0),
        max: sorted.last().copied().unwrap_or(f64::NAN),
    }
}

fn categorical_summary(series: &Series) -> Result<CategoricalSummary> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(CategoricalSummary {
            unique: 0,
            top: None,
            freq: None,
        });
    }
    let vc = non_null.value_counts(true, true, "counts".into(), false)?;
    let unique = vc.height();
    let columns = vc.get_columns();
    let top = columns[0].get(0).ok().map(|v| v.str_value().to_string());
    let freq = columns[1]
        .get(0)
        .ok()
        .and_then(|v| v.try_extract::<u32>().ok())
        .map(|c| c as usize);
    Ok(CategoricalSummary { unique, top, freq })
}

fn datetime_summary(series: &Series) -> Result<DatetimeSummary> {
    let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    let ca = days.i32()?;
    Ok(DatetimeSummary {
        min: ca.min().map(date_from_days),
        max: ca.max().map(date_from_days),
    })
}

/// One line of the info listing (`df.info()` analog).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    /// Estimated in-memory size of the frame, in bytes.
    pub estimated_bytes: usize,
}

pub fn table_info(df: &DataFrame) -> TableInfo {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            let s = col.as_materialized_series();
            ColumnInfo {
                name: s.name().to_string(),
                dtype: s.dtype().to_string(),
                non_null: s.len() - s.null_count(),
            }
        })
        .collect();
    TableInfo {
        rows: df.height(),
        columns,
        estimated_bytes: df.estimated_size(),
    }
}

/// Per-column null count, restricted to columns that have any.
#[derive(Debug, Clone, Serialize)]
pub struct MissingColumn {
    pub name: String,
    pub count: usize,
    /// Percentage of rows, rounded to 2 decimals.
    pub pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingReport {
    pub total_rows: usize,
    pub total_nulls: usize,
    pub columns: Vec<MissingColumn>,
}

pub fn missing_report(df: &DataFrame) -> MissingReport {
    let rows = df.height();
    let mut columns = Vec::new();
    let mut total_nulls = 0usize;
    for col in df.get_columns() {
        let nulls = col.as_materialized_series().null_count();
        total_nulls += nulls;
        if nulls > 0 {
            let pct = if rows > 0 {
                (nulls as f64 / rows as f64 * 100.0 * 100.0).round() / 100.0
            } else {
                0.0
            };
            columns.push(MissingColumn {
                name: col.name().to_string(),
                count: nulls,
                pct,
            });
        }
    }
    MissingReport {
        total_rows: rows,
        total_nulls,
        columns,
    }
}

/// Null mask per column, in column order. Input for the null-matrix heatmap.
pub fn null_mask(df: &DataFrame) -> Vec<(String, Vec<bool>)> {
    df.get_columns()
        .iter()
        .map(|col| {
            let s = col.as_materialized_series();
            let mask: Vec<bool> = (0..s.len())
                .map(|i| s.get(i).is_ok_and(|v| v.is_null()))
                .collect();
            (s.name().to_string(), mask)
        })
        .collect()
}

/// Category frequencies of a column, truncated to the `top` most frequent.
#[derive(Debug, Clone, Serialize)]
pub struct ValueCounts {
    pub column: String,
    pub total_categories: usize,
    /// (value, count) in descending count order.
    pub entries: Vec<(String, usize)>,
    /// Categories beyond the truncation limit.
    pub hidden: usize,
}

pub fn value_counts(series: &Series, top: usize) -> Result<ValueCounts> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(ValueCounts {
            column: series.name().to_string(),
            total_categories: 0,
            entries: Vec::new(),
            hidden: 0,
        });
    }
    let vc = non_null.value_counts(true, true, "counts".into(), false)?;
    let total = vc.height();
    let columns = vc.get_columns();
    let mut entries = Vec::with_capacity(total.min(top));
    for i in 0..total.min(top) {
        let value = columns[0].get(i)?.str_value().to_string();
        let count = columns[1].get(i)?.try_extract::<u32>()? as usize;
        entries.push((value, count));
    }
    Ok(ValueCounts {
        column: series.name().to_string(),
        total_categories: total,
        entries,
        hidden: total.saturating_sub(top),
    })
}

/// Occurrence counts per date, ascending by date.
pub fn date_counts(series: &Series) -> Result<Vec<(NaiveDate, usize)>> {
    let days = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    let ca = days.i32()?;
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for d in ca.iter().flatten() {
        *counts.entry(d).or_insert(0) += 1;
    }
    Ok(counts
        .into_iter()
        .map(|(d, c)| (date_from_days(d), c))
        .collect())
}

/// Equal-width histogram over the non-null values of a numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

pub fn histogram(series: &Series, bin_count: usize) -> Result<Histogram> {
    let values = numeric_values(series);
    if values.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "column '{}' has no numeric values to bin",
            series.name()
        ));
    }
    let bin_count = bin_count.max(1);
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    let mut counts = vec![0usize; bin_count];
    for v in &values {
        let idx = (((v - min) / range) * bin_count as f64) as usize;
        counts[idx.min(bin_count - 1)] += 1;
    }
    let width = range / bin_count as f64;
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect();
    Ok(Histogram {
        column: series.name().to_string(),
        bins,
    })
}

/// Five-number summary plus 1.5*IQR whiskers and the points beyond them.
#[derive(Debug, Clone, Serialize)]
pub struct BoxPlotSummary {
    pub column: String,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_plot_summary(series: &Series) -> Result<BoxPlotSummary> {
    let mut sorted = numeric_values(series);
    if sorted.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "column '{}' has no numeric values",
            series.name()
        ));
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q25 = percentile(&sorted, 25.0);
    let q75 = percentile(&sorted, 75.0);
    let iqr = q75 - q25;
    let lower_fence = q25 - 1.5 * iqr;
    let upper_fence = q75 + 1.5 * iqr;
    let whisker_low = sorted
        .iter()
        .cloned()
        .find(|v| *v >= lower_fence)
        .unwrap_or(sorted[0]);
    let whisker_high = sorted
        .iter()
        .rev()
        .cloned()
        .find(|v| *v <= upper_fence)
        .unwrap_or(sorted[sorted.len() - 1]);
    let outliers = sorted
        .iter()
        .cloned()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect();
    Ok(BoxPlotSummary {
        column: series.name().to_string(),
        min: sorted[0],
        q25,
        median: percentile(&sorted, 50.0),
        q75,
        max: sorted[sorted.len() - 1],
        whisker_low,
        whisker_high,
        outliers,
    })
}

/// Scatter points for two numeric columns; rows where either value is null
/// are dropped.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterData {
    pub x: String,
    pub y: String,
    pub points: Vec<(f64, f64)>,
}

pub fn scatter_data(df: &DataFrame, x: &str, y: &str) -> Result<ScatterData> {
    let col_x = df.column(x)?;
    let col_y = df.column(y)?;
    let mask = col_x.is_not_null() & col_y.is_not_null();
    let clean_x = col_x.filter(&mask)?;
    let clean_y = col_y.filter(&mask)?;
    let xs = numeric_values(clean_x.as_materialized_series());
    let ys = numeric_values(clean_y.as_materialized_series());
    Ok(ScatterData {
        x: x.to_string(),
        y: y.to_string(),
        points: xs.into_iter().zip(ys).collect(),
    })
}

/// Pearson correlation matrix over the numeric columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    /// Numeric column names, matrix order.
    pub columns: Vec<String>,
    /// Square, symmetric; diagonal is 1.0. NaN where a pair has fewer than
    /// 3 complete observations.
    pub correlations: Vec<Vec<f64>>,
    /// Complete observations per pair.
    pub sample_sizes: Vec<Vec<usize>>,
}

pub fn compute_correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let numeric_cols: Vec<String> = df
        .schema()
        .iter()
        .filter(|(_, dtype)| dtype.is_numeric())
        .map(|(name, _)| name.to_string())
        .collect();

    if numeric_cols.len() < 2 {
        return Err(color_eyre::eyre::eyre!(
            "Need at least 2 numeric columns for correlation matrix"
        ));
    }

    let n = numeric_cols.len();
    let mut correlations = vec![vec![1.0; n]; n];
    let mut sample_sizes = vec![vec![0; n]; n];
    for (i, sizes) in sample_sizes.iter_mut().enumerate() {
        sizes[i] = df.height();
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let col1 = df.column(&numeric_cols[i])?;
            let col2 = df.column(&numeric_cols[j])?;

            // Pairwise null-dropping
            let mask = col1.is_not_null() & col2.is_not_null();
            let col1_clean = col1.filter(&mask)?;
            let col2_clean = col2.filter(&mask)?;

            let sample_size = col1_clean.len();
            sample_sizes[i][j] = sample_size;
            sample_sizes[j][i] = sample_size;

            if sample_size < 3 {
                correlations[i][j] = f64::NAN;
                correlations[j][i] = f64::NAN;
                continue;
            }

            let correlation = pearson_correlation(
                &numeric_values(col1_clean.as_materialized_series()),
                &numeric_values(col2_clean.as_materialized_series()),
            );
            correlations[i][j] = correlation;
            correlations[j][i] = correlation;
        }
    }

    Ok(CorrelationMatrix {
        columns: numeric_cols,
        correlations,
        sample_sizes,
    })
}

fn pearson_correlation(values1: &[f64], values2: &[f64]) -> f64 {
    if values1.len() != values2.len() || values1.len() < 2 {
        return f64::NAN;
    }
    let mean1: f64 = values1.iter().sum::<f64>() / values1.len() as f64;
    let mean2: f64 = values2.iter().sum::<f64>() / values2.len() as f64;

    let numerator: f64 = values1
        .iter()
        .zip(values2.iter())
        .map(|(v1, v2)| (v1 - mean1) * (v2 - mean2))
        .sum();
    let var1: f64 = values1.iter().map(|v| (v - mean1).powi(2)).sum();
    let var2: f64 = values2.iter().map(|v| (v - mean2).powi(2)).sum();

    if var1 == 0.0 || var2 == 0.0 {
        return 0.0;
    }
    numerator / (var1.sqrt() * var2.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_summary_quartiles() {
        let df = df!("v" => [1.0f64, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let summaries = describe(&df).unwrap();
        let num = summaries[0].numeric.as_ref().unwrap();
        assert_eq!(num.min, 1.0);
        assert_eq!(num.median, 3.0);
        assert_eq!(num.max, 5.0);
        assert!((num.mean - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_describe_categorical_top() {
        let df = df!("c" => ["a", "b", "a", "a", "c"]).unwrap();
        let summaries = describe(&df).unwrap();
        let cat = summaries[0].categorical.as_ref().unwrap();
        assert_eq!(cat.unique, 3);
        assert_eq!(cat.top.as_deref(), Some("a"));
        assert_eq!(cat.freq, Some(3));
    }

    #[test]
    fn test_missing_report_counts_and_pct() {
        let df = df!(
            "a" => [Some(1i64), None, Some(3), None],
            "b" => [Some("x"), Some("y"), Some("z"), Some("w")]
        )
        .unwrap();
        let report = missing_report(&df);
        assert_eq!(report.total_nulls, 2);
        assert_eq!(report.columns.len(), 1);
        assert_eq!(report.columns[0].name, "a");
        assert_eq!(report.columns[0].count, 2);
        assert!((report.columns[0].pct - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_value_counts_truncation() {
        let values: Vec<String> = (0..30)
            .flat_map(|i| std::iter::repeat_n(format!("cat{:02}", i), 30 - i))
            .collect();
        let series = Series::new("c".into(), values);
        let vc = value_counts(&series, 20).unwrap();
        assert_eq!(vc.total_categories, 30);
        assert_eq!(vc.entries.len(), 20);
        assert_eq!(vc.hidden, 10);
        // descending by count
        assert_eq!(vc.entries[0], ("cat00".to_string(), 30));
        assert!(vc.entries.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_histogram_bins_cover_all_values() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let series = Series::new("v".into(), values);
        let hist = histogram(&series, 10).unwrap();
        assert_eq!(hist.bins.len(), 10);
        let total: usize = hist.bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_box_plot_outliers() {
        let mut values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        values.push(10_000.0);
        let series = Series::new("v".into(), values);
        let summary = box_plot_summary(&series).unwrap();
        assert_eq!(summary.max, 10_000.0);
        assert!(summary.whisker_high < 10_000.0);
        assert_eq!(summary.outliers, vec![10_000.0]);
    }

    #[test]
    fn test_correlation_matrix_symmetry_and_sign() {
        let n = 50;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| v * 2.0 + 5.0).collect();
        let z: Vec<f64> = x.iter().map(|&v| -v * 1.5 + 10.0).collect();
        let df = df!("x" => x, "y" => y, "z" => z).unwrap();

        let m = compute_correlation_matrix(&df).unwrap();
        assert_eq!(m.columns.len(), 3);
        assert!((m.correlations[0][0] - 1.0).abs() < 1e-9);
        assert!((m.correlations[0][1] - m.correlations[1][0]).abs() < 1e-9);
        assert!(m.correlations[0][1] > 0.99);
        assert!(m.correlations[0][2] < -0.99);
    }

    #[test]
    fn test_correlation_requires_two_numeric_columns() {
        let df = df!("x" => [1.0f64, 2.0], "c" => ["a", "b"]).unwrap();
        assert!(compute_correlation_matrix(&df).is_err());
    }

    #[test]
    fn test_date_counts_ascending() {
        let mut df = df!(
            "d" => ["2021-01-02", "2021-01-01", "2021-01-02", "2021-01-03"]
        )
        .unwrap();
        crate::loader::infer_datetime_columns(&mut df);
        let binding = df.column("d").unwrap().clone();
        let series = binding.as_materialized_series();
        let counts = date_counts(series).unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0].0, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(counts[1].1, 2);
    }

    #[test]
    fn test_scatter_drops_null_pairs() {
        let df = df!(
            "x" => [Some(1.0f64), None, Some(3.0)],
            "y" => [Some(2.0f64), Some(4.0), None]
        )
        .unwrap();
        let scatter = scatter_data(&df, "x", "y").unwrap();
        assert_eq!(scatter.points, vec![(1.0, 2.0)]);
    }
}
