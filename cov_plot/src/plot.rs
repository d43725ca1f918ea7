use std::collections::HashMap;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::{
    color::{parse_color, FALLBACK_COLOR},
    config::{ChartType, Config},
    coverage::CoverageTable,
};

/// Render the processed table as one or more SVG pages, each page split
/// into one panel per sample, in the table's sample order
pub fn render(tbl: &CoverageTable, cfg: &Config) -> anyhow::Result<()> {
    let samples = tbl.samples();
    if samples.is_empty() {
        warn!("Nothing to plot");
        return Ok(());
    }

    // Series and color per sample
    let mut series: HashMap<&str, Vec<(u32, f64)>> = HashMap::new();
    let mut colors: HashMap<&str, (u8, u8, u8)> = HashMap::new();
    for r in tbl.rows() {
        series.entry(r.sample.as_ref()).or_default().push((r.x, r.coverage));
        colors
            .entry(r.sample.as_ref())
            .or_insert_with(|| parse_color(r.color.as_deref().unwrap_or(FALLBACK_COLOR)));
    }

    let global_max = tbl.max_coverage();
    let n_pages = samples.len().div_ceil(cfg.samples_per_page());

    for (page_ix, page) in samples.chunks(cfg.samples_per_page()).enumerate() {
        let fname = page_file(cfg.output_prefix(), page_ix, n_pages);
        info!("Rendering {} sample panel(s) to {}", page.len(), fname);

        let size = (cfg.width(), cfg.panel_height() * page.len() as u32);
        let root = SVGBackend::new(&fname, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Error filling chart background: {}", e))?;

        let panels = root.split_evenly((page.len(), 1));
        for (panel, sample) in panels.iter().zip(page) {
            let pts = &series[sample.as_ref()];
            let y_max = if cfg.common_y_scale() {
                global_max
            } else {
                pts.iter().map(|p| p.1).fold(0.0, f64::max)
            };
            draw_panel(
                panel,
                sample,
                pts,
                colors[sample.as_ref()],
                y_max.max(1.0),
                cfg.chart_type(),
            )?;
        }
        root.present()
            .map_err(|e| anyhow!("Error writing {}: {}", fname, e))?;
    }
    Ok(())
}

fn page_file(prefix: &str, page_ix: usize, n_pages: usize) -> String {
    if n_pages > 1 {
        format!("{}_{}.svg", prefix, page_ix + 1)
    } else {
        format!("{}.svg", prefix)
    }
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    sample: &str,
    pts: &[(u32, f64)],
    rgb: (u8, u8, u8),
    y_max: f64,
    chart_type: ChartType,
) -> anyhow::Result<()> {
    let x_max = pts.last().map(|p| p.0).unwrap_or(0).max(1);
    let color = RGBColor(rgb.0, rgb.1, rgb.2);

    let mut chart = ChartBuilder::on(area)
        .caption(sample, ("sans-serif", 14))
        .margin(5)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 20)
        .build_cartesian_2d(0..x_max, 0.0..y_max)
        .map_err(|e| anyhow!("Error building chart for sample {}: {}", sample, e))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .draw()
        .map_err(|e| anyhow!("Error drawing axes for sample {}: {}", sample, e))?;

    match chart_type {
        ChartType::Area => chart
            .draw_series(
                AreaSeries::new(pts.iter().copied(), 0.0, color.mix(0.3)).border_style(&color),
            )
            .map(|_| ()),
        ChartType::Line => chart
            .draw_series(LineSeries::new(pts.iter().copied(), &color))
            .map(|_| ()),
    }
    .map_err(|e| anyhow!("Error drawing series for sample {}: {}", sample, e))
}
