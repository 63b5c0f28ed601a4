//! On-demand column classification.
//!
//! Derived from the schema after loading, never stored: a reclassification
//! (e.g. after the datetime inference pass rewrites a column) is just a
//! recomputation.

use polars::prelude::*;
use serde::Serialize;

/// Analysis kind of a column. Every column is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Datetime,
    Categorical,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Datetime => "datetime",
            ColumnKind::Categorical => "categorical",
        }
    }
}

/// Classify a dtype. Uses Polars' own numeric predicate so every integer and
/// float width is covered; Date and Datetime count as datetime; everything
/// else (strings, booleans, nested) is categorical.
pub fn classify(dtype: &DataType) -> ColumnKind {
    if dtype.is_numeric() {
        ColumnKind::Numeric
    } else if matches!(dtype, DataType::Date | DataType::Datetime(_, _)) {
        ColumnKind::Datetime
    } else {
        ColumnKind::Categorical
    }
}

/// Classification for every column of a frame, in column order.
pub fn column_kinds(df: &DataFrame) -> Vec<(String, ColumnKind)> {
    df.schema()
        .iter()
        .map(|(name, dtype)| (name.to_string(), classify(dtype)))
        .collect()
}

/// Names of the columns with the given kind, in column order.
pub fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<String> {
    column_kinds(df)
        .into_iter()
        .filter(|(_, k)| *k == kind)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_dtypes() {
        assert_eq!(classify(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(classify(&DataType::Float64), ColumnKind::Numeric);
        assert_eq!(classify(&DataType::UInt8), ColumnKind::Numeric);
        assert_eq!(classify(&DataType::Date), ColumnKind::Datetime);
        assert_eq!(
            classify(&DataType::Datetime(TimeUnit::Microseconds, None)),
            ColumnKind::Datetime
        );
        assert_eq!(classify(&DataType::String), ColumnKind::Categorical);
        assert_eq!(classify(&DataType::Boolean), ColumnKind::Categorical);
    }

    #[test]
    fn test_column_kinds_order() {
        let df = df!(
            "amount" => [1.5f64, 2.0],
            "label" => ["a", "b"]
        )
        .unwrap();
        let kinds = column_kinds(&df);
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], ("amount".to_string(), ColumnKind::Numeric));
        assert_eq!(kinds[1], ("label".to_string(), ColumnKind::Categorical));
    }

    #[test]
    fn test_columns_of_kind() {
        let df = df!(
            "a" => [1i64, 2],
            "b" => ["x", "y"],
            "c" => [0.5f64, 1.5]
        )
        .unwrap();
        assert_eq!(
            columns_of_kind(&df, ColumnKind::Numeric),
            vec!["a".to_string(), "c".to_string()]
        );
        assert_eq!(
            columns_of_kind(&df, ColumnKind::Datetime),
            Vec::<String>::new()
        );
    }
}
