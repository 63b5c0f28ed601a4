use std::fs;
use std::path::Path;

use clap::Parser;
use color_eyre::Result;

use analisador::chart;
use analisador::cli::Args;
use analisador::color::Colormap;
use analisador::error::user_message_from_report;
use analisador::report;
use analisador::session::UnivariateAnalysis;
use analisador::{ConfigManager, LoadCache, LoadOptions, Session};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    if args.generate_config {
        print!("{}", ConfigManager::generate_default_config());
        return Ok(());
    }

    let config = match ConfigManager::new("analisador").and_then(|m| m.load()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", user_message_from_report(&e));
            Default::default()
        }
    };

    let path = args.path.as_deref().expect("clap enforces a path");
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!(
                "Error loading file: {}",
                analisador::error::user_message_from_io(&e)
            );
            std::process::exit(1);
        }
    };

    if args.list_sheets {
        match analisador::loader::sheet_names(&name, &bytes) {
            Ok(names) => print!("{}", report::render_sheet_list(&names)),
            Err(e) => eprintln!("{}", e.user_message()),
        }
        return Ok(());
    }

    let options = LoadOptions {
        delimiter: args.delimiter.unwrap_or(config.delimiter),
        sheet: args.sheet.clone(),
    };
    let mut cache = LoadCache::new();
    let df = match cache.get_or_load(&name, &bytes, &options) {
        Ok(df) => df,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };
    let session = Session::new(name, df);

    let palette = Colormap::by_name(args.palette.as_deref().unwrap_or(&config.palette));
    let chart_size = (config.chart_width, config.chart_height);
    let charts_dir = match &args.charts_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            Some(dir.as_path())
        }
        None => None,
    };

    let mut json_doc = serde_json::Map::new();

    // Overview and missing values always run; the rest is flag-driven.
    let overview = session.overview()?;
    let missing = session.missing();
    if args.json {
        json_doc.insert("overview".to_string(), serde_json::to_value(&overview)?);
        json_doc.insert("missing".to_string(), serde_json::to_value(&missing)?);
    } else {
        println!("{}", report::render_overview(&overview));
        println!("{}", report::render_missing(&missing));
    }
    if missing.total_nulls > 0 {
        if let Some(dir) = charts_dir {
            write_chart(dir.join("missing_heatmap.png"), |p| {
                chart::write_null_matrix_png(p, &session.null_mask(), chart_size)
            });
        }
    }

    if let Some(column) = &args.column {
        match session.univariate(column, config.histogram_bins, config.top_categories) {
            Ok(analysis) => {
                if args.json {
                    json_doc.insert("univariate".to_string(), serde_json::to_value(&analysis)?);
                } else {
                    println!("{}", report::render_univariate(&analysis));
                }
                if let Some(dir) = charts_dir {
                    write_univariate_charts(dir, &analysis, chart_size);
                }
            }
            Err(e) => eprintln!("{}", user_message_from_report(&e)),
        }
    }

    if let (Some(x), Some(y)) = (&args.x, &args.y) {
        match session.bivariate(x, y) {
            Ok(scatter) => {
                if args.json {
                    json_doc.insert("bivariate".to_string(), serde_json::to_value(&scatter)?);
                } else {
                    println!("Scatter: {} points for {} vs {}", scatter.points.len(), y, x);
                }
                if let Some(dir) = charts_dir {
                    write_chart(dir.join("scatter.png"), |p| {
                        chart::write_scatter_png(p, &scatter, chart_size)
                    });
                }
            }
            Err(e) => eprintln!("{}", user_message_from_report(&e)),
        }
    }

    match session.correlation() {
        Ok(matrix) => {
            if args.json {
                json_doc.insert("correlation".to_string(), serde_json::to_value(&matrix)?);
            } else {
                println!("{}", report::render_correlation(&matrix));
            }
            if let Some(dir) = charts_dir {
                write_chart(dir.join("correlation_heatmap.png"), |p| {
                    chart::write_correlation_heatmap_png(p, &matrix, palette, chart_size)
                });
            }
        }
        Err(e) => eprintln!("{}", user_message_from_report(&e)),
    }

    if let Some(export_path) = &args.export {
        let artifact = session.download()?;
        fs::write(export_path, &artifact.bytes)?;
        log::info!(
            "wrote {} ({} bytes, {})",
            export_path.display(),
            artifact.bytes.len(),
            artifact.mime_type
        );
    }

    if args.json {
        println!("{}", serde_json::Value::Object(json_doc));
    }
    Ok(())
}

fn write_univariate_charts(dir: &Path, analysis: &UnivariateAnalysis, size: (u32, u32)) {
    match analysis {
        UnivariateAnalysis::Numeric {
            column,
            histogram,
            box_plot,
        } => {
            write_chart(dir.join(format!("{}_histogram.png", column)), |p| {
                chart::write_histogram_png(p, histogram, size)
            });
            write_chart(dir.join(format!("{}_box.png", column)), |p| {
                chart::write_box_plot_png(p, box_plot, size)
            });
        }
        UnivariateAnalysis::Datetime { column, counts } => {
            write_chart(dir.join(format!("{}_dates.png", column)), |p| {
                chart::write_date_line_png(p, column, counts, size)
            });
        }
        UnivariateAnalysis::Categorical { column, counts } => {
            write_chart(dir.join(format!("{}_frequency.png", column)), |p| {
                chart::write_bar_png(p, counts, size)
            });
        }
    }
}

/// Render one chart, reporting failure without aborting the run.
fn write_chart(path: std::path::PathBuf, render: impl FnOnce(&Path) -> Result<()>) {
    match render(&path) {
        Ok(()) => log::info!("wrote {}", path.display()),
        Err(e) => eprintln!(
            "Could not render {}: {}",
            path.display(),
            user_message_from_report(&e)
        ),
    }
}
