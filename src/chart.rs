//! PNG chart rendering with the plotters bitmap backend.
//!
//! One writer per chart the analysis handlers feed: histogram, box plot,
//! category bars, date line, scatter, correlation heatmap, and the
//! null-matrix heatmap. All writers share the same framing: white
//! background, margin 30, labeled mesh, sans-serif caption.

use std::path::Path;

use color_eyre::Result;
use plotters::prelude::*;

use crate::color::Colormap;
use crate::loader::date_from_days;
use crate::statistics::{
    BoxPlotSummary, CorrelationMatrix, Histogram, ScatterData, ValueCounts,
};

const BAR_FILL: RGBColor = RGBColor(70, 130, 180);

/// Cap on row bins in the null-matrix heatmap; larger frames are binned.
const NULL_MATRIX_MAX_ROW_BINS: usize = 300;

pub fn write_histogram_png(
    path: &Path,
    histogram: &Histogram,
    (width, height): (u32, u32),
) -> Result<()> {
    if histogram.bins.is_empty() {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_min = histogram.bins[0].lower;
    let x_max = histogram.bins[histogram.bins.len() - 1].upper;
    let y_max = histogram.bins.iter().map(|b| b.count).max().unwrap_or(1) as f64;

    let caption = format!("Histogram of {}", histogram.column);
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max * 1.05)?;

    chart
        .configure_mesh()
        .x_desc(histogram.column.as_str())
        .y_desc("count")
        .draw()?;

    chart.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
            BAR_FILL.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

pub fn write_box_plot_png(
    path: &Path,
    summary: &BoxPlotSummary,
    (width, height): (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let span = (summary.max - summary.min).abs().max(f64::EPSILON);
    let y_min = summary.min - span * 0.05;
    let y_max = summary.max + span * 0.05;

    let caption = format!("Box Plot of {}", summary.column);
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-1.0..1.0, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc(summary.column.as_str())
        .draw()?;

    // box between the quartiles, median line across it
    chart.draw_series(std::iter::once(Rectangle::new(
        [(-0.4, summary.q25), (0.4, summary.q75)],
        BAR_FILL.mix(0.4).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(-0.4, summary.q25), (0.4, summary.q75)],
        BAR_FILL.stroke_width(2),
    )))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(-0.4, summary.median), (0.4, summary.median)],
        BLACK.stroke_width(2),
    )))?;

    // whiskers with end caps
    for whisker in [summary.whisker_low, summary.whisker_high] {
        let anchor = if whisker <= summary.q25 {
            summary.q25
        } else {
            summary.q75
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, anchor), (0.0, whisker)],
            BLACK.stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-0.2, whisker), (0.2, whisker)],
            BLACK.stroke_width(1),
        )))?;
    }

    chart.draw_series(
        summary
            .outliers
            .iter()
            .map(|&v| Circle::new((0.0, v), 3, BLACK.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Horizontal bar chart of category frequencies, most frequent at the top.
pub fn write_bar_png(
    path: &Path,
    counts: &ValueCounts,
    (width, height): (u32, u32),
) -> Result<()> {
    if counts.entries.is_empty() {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = counts.entries.len();
    let x_max = counts.entries.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64;

    let caption = format!("Frequency of {}", counts.column);
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(0.0..x_max * 1.05, 0.0..n as f64)?;

    let labels: Vec<String> = counts.entries.iter().map(|(v, _)| v.clone()).collect();
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .x_desc("count")
        .y_label_formatter(&move |v: &f64| {
            // entry 0 renders at the top
            let idx = n as f64 - 1.0 - v.floor();
            if idx >= 0.0 && (idx as usize) < labels.len() {
                labels[idx as usize].clone()
            } else {
                String::new()
            }
        })
        .draw()?;

    chart.draw_series(counts.entries.iter().enumerate().map(|(i, (_, count))| {
        let y0 = (n - 1 - i) as f64 + 0.1;
        let y1 = (n - i) as f64 - 0.1;
        Rectangle::new([(0.0, y0), (*count as f64, y1)], BAR_FILL.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Line chart of occurrence counts per date.
pub fn write_date_line_png(
    path: &Path,
    column: &str,
    counts: &[(chrono::NaiveDate, usize)],
    (width, height): (u32, u32),
) -> Result<()> {
    if counts.is_empty() {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let points: Vec<(f64, f64)> = counts
        .iter()
        .map(|(d, c)| {
            let days = (*d - chrono::NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date"))
                .num_days() as f64;
            (days, *c as f64)
        })
        .collect();
    let x_min = points[0].0;
    let x_max = points[points.len() - 1].0.max(x_min + 1.0);
    let y_max = points.iter().map(|(_, c)| *c).fold(0.0, f64::max);

    let caption = format!("Occurrences by date ({})", column);
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max * 1.05)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("count")
        .x_label_formatter(&|v: &f64| {
            date_from_days(*v as i32).format("%Y-%m-%d").to_string()
        })
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), BAR_FILL))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 2, BAR_FILL.filled())),
    )?;

    root.present()?;
    Ok(())
}

pub fn write_scatter_png(
    path: &Path,
    data: &ScatterData,
    (width, height): (u32, u32),
) -> Result<()> {
    if data.points.is_empty() {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_min = data.points.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let x_max = data
        .points
        .iter()
        .map(|(x, _)| *x)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_min = data.points.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let y_max = data
        .points
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);
    let x_pad = (x_max - x_min).abs().max(f64::EPSILON) * 0.05;
    let y_pad = (y_max - y_min).abs().max(f64::EPSILON) * 0.05;

    let caption = format!("{} vs {}", data.y, data.x);
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min - x_pad..x_max + x_pad, y_min - y_pad..y_max + y_pad)?;

    chart
        .configure_mesh()
        .x_desc(data.x.as_str())
        .y_desc(data.y.as_str())
        .draw()?;

    chart.draw_series(
        data.points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BAR_FILL.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Annotated correlation heatmap in the given palette. Cell color maps
/// correlation [-1, 1] onto the ramp; NaN cells (pairs with too few
/// observations) render gray without annotation.
pub fn write_correlation_heatmap_png(
    path: &Path,
    matrix: &CorrelationMatrix,
    colormap: Colormap,
    (width, height): (u32, u32),
) -> Result<()> {
    let n = matrix.columns.len();
    if n == 0 {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!("Correlation Heatmap ({})", colormap.name());
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption.as_str(), ("sans-serif", 20))
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

    // cells first, mesh and labels on top
    for (i, row) in matrix.correlations.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            let x0 = j as f64;
            let y0 = (n - 1 - i) as f64;
            let fill = if value.is_nan() {
                RGBColor(200, 200, 200)
            } else {
                colormap.sample((value + 1.0) / 2.0)
            };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                fill.filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x0, y0), (x0 + 1.0, y0 + 1.0)],
                WHITE.stroke_width(1),
            )))?;
            if !value.is_nan() {
                let text_color = if colormap.luminance((value + 1.0) / 2.0) > 0.5 {
                    BLACK
                } else {
                    WHITE
                };
                let style = ("sans-serif", 14).into_font().color(&text_color);
                chart.draw_series(std::iter::once(Text::new(
                    format!("{:.2}", value),
                    (x0 + 0.35, y0 + 0.45),
                    style,
                )))?;
            }
        }
    }

    let x_names = matrix.columns.clone();
    let y_names = matrix.columns.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&move |v: &f64| {
            let idx = v.floor() as usize;
            x_names.get(idx).cloned().unwrap_or_default()
        })
        .y_label_formatter(&move |v: &f64| {
            let idx = n as f64 - 1.0 - v.floor();
            if idx >= 0.0 {
                y_names.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()?;

    root.present()?;
    Ok(())
}

/// Null-matrix heatmap: one cell per (row bin, column); intensity is the
/// fraction of missing values in the bin. Rendered in the viridis ramp.
pub fn write_null_matrix_png(
    path: &Path,
    mask: &[(String, Vec<bool>)],
    (width, height): (u32, u32),
) -> Result<()> {
    let cols = mask.len();
    let rows = mask.first().map(|(_, m)| m.len()).unwrap_or(0);
    if cols == 0 || rows == 0 {
        return Err(color_eyre::eyre::eyre!("no data to plot"));
    }
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let colormap = Colormap::by_name("viridis");
    let row_bins = rows.min(NULL_MATRIX_MAX_ROW_BINS);
    let bin_size = rows.div_ceil(row_bins);
    let n_bins = rows.div_ceil(bin_size);

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption("Missing Value Heatmap", ("sans-serif", 20))
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..cols as f64, 0.0..n_bins as f64)?;

    for (j, (_, col_mask)) in mask.iter().enumerate() {
        for b in 0..n_bins {
            let start = b * bin_size;
            let end = (start + bin_size).min(rows);
            let nulls = col_mask[start..end].iter().filter(|&&m| m).count();
            let frac = nulls as f64 / (end - start).max(1) as f64;
            let y0 = (n_bins - 1 - b) as f64; // first rows at the top
            chart.draw_series(std::iter::once(Rectangle::new(
                [(j as f64, y0), (j as f64 + 1.0, y0 + 1.0)],
                colormap.sample(frac).filled(),
            )))?;
        }
    }

    let names: Vec<String> = mask.iter().map(|(name, _)| name.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(cols)
        .y_labels(0)
        .x_label_formatter(&move |v: &f64| {
            let idx = v.floor() as usize;
            names.get(idx).cloned().unwrap_or_default()
        })
        .draw()?;

    root.present()?;
    Ok(())
}
