//! Plain-text rendering of analysis results.
//!
//! The text half of what the original dashboard displayed per tab. Keeps
//! formatting concerns out of the handlers so the CLI and tests share it.

use std::fmt::Write;

use crate::session::{Overview, UnivariateAnalysis};
use crate::statistics::{CorrelationMatrix, MissingReport};

/// Format a statistic for display: integers stay integral, everything else
/// gets four significant decimals; NaN renders as a dash.
fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.4}", v)
    }
}

fn fmt_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

pub fn render_overview(overview: &Overview) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Dataset '{}' loaded with {} rows and {} columns.",
        overview.source_name, overview.rows, overview.columns
    );
    let _ = writeln!(
        out,
        "Numeric: {} | Categorical: {} | Datetime: {}",
        overview.numeric_columns.len(),
        overview.categorical_columns.len(),
        overview.datetime_columns.len()
    );

    let _ = writeln!(out, "\nSample (first {} rows):", overview.head.len());
    let _ = writeln!(out, "  {}", overview.header.join(" | "));
    for row in &overview.head {
        let _ = writeln!(out, "  {}", row.join(" | "));
    }

    let _ = writeln!(out, "\nColumn details:");
    for info in &overview.info.columns {
        let _ = writeln!(
            out,
            "  {:<24} {:>8} non-null  {}",
            info.name, info.non_null, info.dtype
        );
    }
    let _ = writeln!(
        out,
        "Memory usage: {} (estimated)",
        fmt_bytes(overview.info.estimated_bytes)
    );

    let _ = writeln!(out, "\nDescriptive statistics:");
    for summary in &overview.describe {
        let _ = write!(
            out,
            "  {:<24} [{}] count={} nulls={}",
            summary.name,
            summary.kind.as_str(),
            summary.count,
            summary.null_count
        );
        if let Some(num) = &summary.numeric {
            let _ = write!(
                out,
                " mean={} std={} min={} 25%={} 50%={} 75%={} max={}",
                fmt_stat(num.mean),
                fmt_stat(num.std),
                fmt_stat(num.min),
                fmt_stat(num.q25),
                fmt_stat(num.median),
                fmt_stat(num.q75),
                fmt_stat(num.max)
            );
        }
        if let Some(cat) = &summary.categorical {
            let _ = write!(out, " unique={}", cat.unique);
            if let (Some(top), Some(freq)) = (&cat.top, cat.freq) {
                let _ = write!(out, " top='{}' freq={}", top, freq);
            }
        }
        if let Some(dt) = &summary.datetime {
            if let (Some(min), Some(max)) = (dt.min, dt.max) {
                let _ = write!(out, " min={} max={}", min, max);
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_missing(report: &MissingReport) -> String {
    let mut out = String::new();
    if report.total_nulls == 0 {
        let _ = writeln!(out, "Good news: the dataset has no missing values.");
        return out;
    }
    let _ = writeln!(
        out,
        "Missing values: {} across {} rows.",
        report.total_nulls, report.total_rows
    );
    let _ = writeln!(out, "  {:<24} {:>8} {:>10}", "column", "count", "percent");
    for col in &report.columns {
        let _ = writeln!(out, "  {:<24} {:>8} {:>9.2}%", col.name, col.count, col.pct);
    }
    out
}

pub fn render_univariate(analysis: &UnivariateAnalysis) -> String {
    let mut out = String::new();
    match analysis {
        UnivariateAnalysis::Numeric {
            column,
            histogram,
            box_plot,
        } => {
            let _ = writeln!(out, "Column '{}' is numeric.", column);
            let _ = writeln!(
                out,
                "  min={} q25={} median={} q75={} max={}",
                fmt_stat(box_plot.min),
                fmt_stat(box_plot.q25),
                fmt_stat(box_plot.median),
                fmt_stat(box_plot.q75),
                fmt_stat(box_plot.max)
            );
            let _ = writeln!(out, "  {} outliers beyond 1.5*IQR", box_plot.outliers.len());
            let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(1);
            for bin in &histogram.bins {
                let bar_len = if max_count > 0 {
                    bin.count * 40 / max_count
                } else {
                    0
                };
                let _ = writeln!(
                    out,
                    "  [{:>12}, {:>12}) {:>6} {}",
                    fmt_stat(bin.lower),
                    fmt_stat(bin.upper),
                    bin.count,
                    "#".repeat(bar_len)
                );
            }
        }
        UnivariateAnalysis::Datetime { column, counts } => {
            let _ = writeln!(out, "Column '{}' is a date.", column);
            let _ = writeln!(out, "Occurrence counts per date:");
            for (date, count) in counts {
                let _ = writeln!(out, "  {}  {}", date, count);
            }
        }
        UnivariateAnalysis::Categorical { column, counts } => {
            let _ = writeln!(out, "Column '{}' is categorical.", column);
            if counts.hidden > 0 {
                let _ = writeln!(
                    out,
                    "The column has {} categories; showing the {} most frequent.",
                    counts.total_categories,
                    counts.entries.len()
                );
            }
            for (value, count) in &counts.entries {
                let _ = writeln!(out, "  {:<32} {}", value, count);
            }
        }
    }
    out
}

pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pearson correlation ({} columns):", matrix.columns.len());
    let _ = write!(out, "  {:<16}", "");
    for name in &matrix.columns {
        let _ = write!(out, "{:>10}", truncate(name, 9));
    }
    let _ = writeln!(out);
    for (i, name) in matrix.columns.iter().enumerate() {
        let _ = write!(out, "  {:<16}", truncate(name, 15));
        for value in &matrix.correlations[i] {
            if value.is_nan() {
                let _ = write!(out, "{:>10}", "-");
            } else {
                let _ = write!(out, "{:>10.2}", value);
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_sheet_list(names: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Worksheets:");
    for name in names {
        let _ = writeln!(out, "  {}", name);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
