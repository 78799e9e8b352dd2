use crate::{
    analysis::completion::{bar_width_days, CompletionTable},
    data::{events::Grouper, window::format_hour_minute, window::Window},
    plot::{
        color::{completed_palette, get_color_from_label, lost_palette, FONT_SIZE, TITLE_FONT_SIZE},
        draw_legend, split_legend,
    },
};
use anyhow::Result;
use plotters::{coord::Shift, prelude::*};
use std::collections::BTreeMap;

/// Legend of the completed/lost chart: every group as completed (green
/// shades) first, then every group as lost (red shades).
pub fn legend_entries(groups: &[String]) -> Result<Vec<(String, RGBColor)>> {
    let green = completed_palette(groups.len())?;
    let red = lost_palette(groups.len())?;

    let completed = groups
        .iter()
        .zip(green)
        .map(|(group, color)| (format!("{group} | Completed"), color));
    let lost = groups
        .iter()
        .zip(red)
        .map(|(group, color)| (format!("{group} | Lost"), color));

    Ok(completed.chain(lost).collect())
}

/// Stacked bar chart of completed and lost requests per bucket.
///
/// Bars are left-aligned on their bucket and span 80% of it.
pub fn draw_stacked_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &CompletionTable,
    window: &Window,
    grouper: Grouper,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let groups = table.groups();
    let shade: BTreeMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(idx, group)| (group.as_str(), idx))
        .collect();
    let green = completed_palette(groups.len())?;
    let red = lost_palette(groups.len())?;

    let width = bar_width_days(window);
    let x_min = table.buckets.first().map_or(0.0, |b| b.as_days()) - window.as_days() / 2.0;
    let x_max = table.buckets.last().map_or(0.0, |b| b.as_days()) + window.as_days() * 1.5;
    let y_max = match table.row_totals().into_iter().max() {
        Some(max) if max > 0 => max as f64 * 1.1,
        _ => 1.0,
    };

    let (plot_area, legend_area) = split_legend(area);
    let mut chart = ChartBuilder::on(&plot_area)
        .caption(title, ("sans-serif", TITLE_FONT_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(WHITE)
        .bold_line_style(get_color_from_label("grid")?.mix(0.7))
        .x_labels(8)
        .y_labels(8)
        .x_desc("Time")
        .y_desc("Number of Requests")
        .label_style(("sans-serif", FONT_SIZE).into_font())
        .x_label_formatter(&|x| format_hour_minute(*x))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()?;

    let segments = table.segments();
    chart.draw_series(segments.iter().filter(|s| s.top > s.bottom).map(|s| {
        let idx = shade.get(s.group.as_str()).copied().unwrap_or_default();
        let color = if s.finished { green[idx] } else { red[idx] };
        let x = s.bucket.as_days();
        Rectangle::new([(x, s.bottom), (x + width, s.top)], color.filled())
    }))?;

    draw_legend(
        &legend_area,
        &format!("{grouper} | Status"),
        &legend_entries(&groups)?,
    )?;

    Ok(())
}
