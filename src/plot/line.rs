use crate::{
    analysis::series::GroupedSeries,
    data::window::format_hour_minute,
    plot::{
        color::{categorical, get_color_from_label, FONT_SIZE, STROKE_WIDTH, TITLE_FONT_SIZE},
        draw_legend, draw_no_data, split_legend,
    },
};
use anyhow::Result;
use plotters::{coord::Shift, prelude::*};

/// Labels and decorations of a time line chart.
#[derive(Clone, Debug, Default)]
pub struct LineChartStyle {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub legend_title: String,
    pub markers: bool,
    /// Shade the confidence interval of each point, when present.
    pub band: bool,
}

/// One line per group over a `HH:MM` time axis.
///
/// An empty series draws the "no data" placeholder instead.
pub fn draw_line_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &GroupedSeries,
    style: &LineChartStyle,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let Some((first, last)) = series.x_range() else {
        return draw_no_data(area, &style.title);
    };

    let pad = series.window.as_days() / 2.0;
    let x_min = first.as_days() - pad;
    let x_max = last.as_days() + pad;
    let y_max = match series.y_max() {
        y if y > 0.0 => y * 1.1,
        _ => 1.0,
    };

    let (plot_area, legend_area) = split_legend(area);
    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&style.title, ("sans-serif", TITLE_FONT_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .bold_line_style(get_color_from_label("grid")?.mix(0.6))
        .x_labels(8)
        .y_labels(8)
        .x_desc(style.x_desc.as_str())
        .y_desc(style.y_desc.as_str())
        .label_style(("sans-serif", FONT_SIZE).into_font())
        .x_label_formatter(&|x| format_hour_minute(*x))
        .y_label_formatter(&|y| format!("{:.2}", y))
        .draw()?;

    let mut legend = Vec::with_capacity(series.lines.len());
    for (idx, (group, points)) in series.lines.iter().enumerate() {
        let color = categorical(idx);

        if style.band {
            let upper = points
                .iter()
                .filter_map(|p| p.ci.map(|(_, hi)| (p.bucket.as_days(), hi)));
            let lower = points
                .iter()
                .rev()
                .filter_map(|p| p.ci.map(|(lo, _)| (p.bucket.as_days(), lo)));
            let outline: Vec<(f64, f64)> = upper.chain(lower).collect();

            if outline.len() >= 3 {
                chart.draw_series(std::iter::once(Polygon::new(
                    outline,
                    color.mix(0.2).filled(),
                )))?;
            }
        }

        chart.draw_series(LineSeries::new(
            points.iter().map(|p| (p.bucket.as_days(), p.value)),
            color.stroke_width(STROKE_WIDTH),
        ))?;

        if style.markers {
            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p.bucket.as_days(), p.value), 4, color.filled())),
            )?;
        }

        legend.push((group.clone(), color));
    }

    draw_legend(&legend_area, &style.legend_title, &legend)?;

    Ok(())
}
