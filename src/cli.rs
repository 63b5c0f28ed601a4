//! Command-line definitions.

use clap::Parser;
use std::path::PathBuf;

use crate::loader::Delimiter;

/// Command-line arguments for analisador
#[derive(Clone, Parser, Debug)]
#[command(
    name = "analisador",
    version,
    about = "Exploratory analysis for CSV and Excel datasets"
)]
pub struct Args {
    /// Path to the dataset to analyze (.csv, .xls, .xlsx)
    #[arg(required_unless_present = "generate_config", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Field delimiter for delimited text (ignored for spreadsheets)
    #[arg(long, value_enum)]
    pub delimiter: Option<Delimiter>,

    /// Worksheet name for spreadsheets (ignored for delimited text)
    #[arg(long)]
    pub sheet: Option<String>,

    /// List the worksheets of a spreadsheet and exit
    #[arg(long = "list-sheets", action)]
    pub list_sheets: bool,

    /// Column to analyze individually (univariate)
    #[arg(long = "column")]
    pub column: Option<String>,

    /// X axis column for bivariate analysis (requires --y)
    #[arg(long, requires = "y")]
    pub x: Option<String>,

    /// Y axis column for bivariate analysis (requires --x)
    #[arg(long, requires = "x")]
    pub y: Option<String>,

    /// Heatmap palette: coolwarm, viridis, plasma, inferno, magma, cividis
    #[arg(long)]
    pub palette: Option<String>,

    /// Directory to write PNG charts into
    #[arg(long = "charts-dir", value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Write the analyzed dataset as CSV to this path
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Print results as JSON instead of text reports
    #[arg(long, action)]
    pub json: bool,

    /// Print the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,
}
