//! Session-scoped state and the per-action request handlers.
//!
//! The original tool re-ran its whole script on every widget change; here
//! each user action is an explicit handler over a `Session` that owns the
//! loaded frame. The frame is read-only after construction: a new upload
//! (or changed delimiter/sheet) builds a new session.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::classify::{self, ColumnKind};
use crate::export::{self, DownloadArtifact};
use crate::statistics::{
    self, BoxPlotSummary, ColumnSummary, CorrelationMatrix, Histogram, MissingReport, ScatterData,
    TableInfo, ValueCounts,
};

/// Number of sample rows shown in the overview.
const HEAD_ROWS: usize = 5;

pub struct Session {
    source_name: String,
    df: DataFrame,
}

/// The overview tab: dimensions, column-kind counts, head sample, info
/// listing, and describe statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub source_name: String,
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub header: Vec<String>,
    /// First rows, stringified for display.
    pub head: Vec<Vec<String>>,
    pub info: TableInfo,
    pub describe: Vec<ColumnSummary>,
}

/// Result of the univariate handler; shape depends on the column kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UnivariateAnalysis {
    Numeric {
        column: String,
        histogram: Histogram,
        box_plot: BoxPlotSummary,
    },
    Datetime {
        column: String,
        counts: Vec<(chrono::NaiveDate, usize)>,
    },
    Categorical {
        column: String,
        counts: ValueCounts,
    },
}

impl Session {
    pub fn new(source_name: impl Into<String>, df: DataFrame) -> Self {
        Self {
            source_name: source_name.into(),
            df,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Classification of every column, recomputed on demand.
    pub fn column_kinds(&self) -> Vec<(String, ColumnKind)> {
        classify::column_kinds(&self.df)
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        classify::columns_of_kind(&self.df, ColumnKind::Numeric)
    }

    pub fn overview(&self) -> Result<Overview> {
        let header: Vec<String> = self
            .df
            .schema()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        let head_df = self.df.head(Some(HEAD_ROWS));
        let mut head = Vec::with_capacity(head_df.height());
        for i in 0..head_df.height() {
            if let Some(row) = head_df.get(i) {
                head.push(row.iter().map(format_cell).collect());
            }
        }
        Ok(Overview {
            source_name: self.source_name.clone(),
            rows: self.df.height(),
            columns: self.df.width(),
            numeric_columns: classify::columns_of_kind(&self.df, ColumnKind::Numeric),
            datetime_columns: classify::columns_of_kind(&self.df, ColumnKind::Datetime),
            categorical_columns: classify::columns_of_kind(&self.df, ColumnKind::Categorical),
            header,
            head,
            info: statistics::table_info(&self.df),
            describe: statistics::describe(&self.df)?,
        })
    }

    pub fn missing(&self) -> MissingReport {
        statistics::missing_report(&self.df)
    }

    /// Null mask for the missing-value heatmap.
    pub fn null_mask(&self) -> Vec<(String, Vec<bool>)> {
        statistics::null_mask(&self.df)
    }

    /// Univariate analysis of one column, dispatched on its classification.
    pub fn univariate(
        &self,
        column: &str,
        histogram_bins: usize,
        top_categories: usize,
    ) -> Result<UnivariateAnalysis> {
        let col = self.df.column(column)?;
        let series = col.as_materialized_series();
        match classify::classify(series.dtype()) {
            ColumnKind::Numeric => Ok(UnivariateAnalysis::Numeric {
                column: column.to_string(),
                histogram: statistics::histogram(series, histogram_bins)?,
                box_plot: statistics::box_plot_summary(series)?,
            }),
            ColumnKind::Datetime => Ok(UnivariateAnalysis::Datetime {
                column: column.to_string(),
                counts: statistics::date_counts(series)?,
            }),
            ColumnKind::Categorical => Ok(UnivariateAnalysis::Categorical {
                column: column.to_string(),
                counts: statistics::value_counts(series, top_categories)?,
            }),
        }
    }

    /// Scatter data for two numeric columns.
    pub fn bivariate(&self, x: &str, y: &str) -> Result<ScatterData> {
        if self.numeric_columns().len() < 2 {
            return Err(eyre!(
                "At least two numeric columns are required for bivariate analysis"
            ));
        }
        for name in [x, y] {
            let dtype = self.df.column(name)?.dtype().clone();
            if classify::classify(&dtype) != ColumnKind::Numeric {
                return Err(eyre!("column '{}' is not numeric", name));
            }
        }
        statistics::scatter_data(&self.df, x, y)
    }

    /// Pearson correlation matrix over the numeric columns.
    pub fn correlation(&self) -> Result<CorrelationMatrix> {
        if self.numeric_columns().len() < 2 {
            return Err(eyre!(
                "At least two numeric columns are required for correlation"
            ));
        }
        statistics::compute_correlation_matrix(&self.df)
    }

    /// CSV download artifact for the loaded frame.
    pub fn download(&self) -> Result<DownloadArtifact> {
        export::download_artifact(&self.df)
    }
}

fn format_cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        other => other.str_value().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;

    fn session() -> Session {
        let mut df = df!(
            "amount" => [10.0f64, 20.0, 30.0, 40.0],
            "label" => ["a", "b", "a", "c"],
            "when" => ["2021-01-01", "2021-01-02", "2021-01-02", "2021-01-03"]
        )
        .unwrap();
        loader::infer_datetime_columns(&mut df);
        Session::new("sample.csv", df)
    }

    #[test]
    fn test_overview_counts_kinds() {
        let s = session();
        let o = s.overview().unwrap();
        assert_eq!(o.rows, 4);
        assert_eq!(o.columns, 3);
        assert_eq!(o.numeric_columns, vec!["amount".to_string()]);
        assert_eq!(o.datetime_columns, vec!["when".to_string()]);
        assert_eq!(o.categorical_columns, vec!["label".to_string()]);
        assert_eq!(o.head.len(), 4);
        assert_eq!(o.header, vec!["amount", "label", "when"]);
        assert_eq!(o.describe.len(), 3);
    }

    #[test]
    fn test_univariate_dispatch() {
        let s = session();
        assert!(matches!(
            s.univariate("amount", 10, 20).unwrap(),
            UnivariateAnalysis::Numeric { .. }
        ));
        assert!(matches!(
            s.univariate("when", 10, 20).unwrap(),
            UnivariateAnalysis::Datetime { .. }
        ));
        assert!(matches!(
            s.univariate("label", 10, 20).unwrap(),
            UnivariateAnalysis::Categorical { .. }
        ));
    }

    #[test]
    fn test_univariate_unknown_column() {
        let s = session();
        assert!(s.univariate("nope", 10, 20).is_err());
    }

    #[test]
    fn test_bivariate_requires_two_numeric() {
        let s = session();
        // only one numeric column in the fixture
        let err = s.bivariate("amount", "amount").unwrap_err();
        assert!(err.to_string().contains("two numeric columns"));
    }

    #[test]
    fn test_bivariate_points() {
        let df = df!(
            "x" => [1.0f64, 2.0, 3.0],
            "y" => [2.0f64, 4.0, 6.0]
        )
        .unwrap();
        let s = Session::new("xy.csv", df);
        let scatter = s.bivariate("x", "y").unwrap();
        assert_eq!(scatter.points.len(), 3);
    }

    #[test]
    fn test_bivariate_rejects_non_numeric_column() {
        let df = df!(
            "x" => [1.0f64, 2.0],
            "y" => [3.0f64, 4.0],
            "c" => ["a", "b"]
        )
        .unwrap();
        let s = Session::new("xy.csv", df);
        assert!(s.bivariate("x", "c").is_err());
    }

    #[test]
    fn test_correlation_guard() {
        let s = session();
        assert!(s.correlation().is_err());
    }

    #[test]
    fn test_download_artifact() {
        let s = session();
        let artifact = s.download().unwrap();
        assert_eq!(artifact.file_name, "dataset_analisado.csv");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("amount,label,when"));
    }
}
