use crate::{
    data::traces::WorkloadTrace,
    plot::{
        color::{categorical, get_color_from_label, FONT_SIZE, TITLE_FONT_SIZE},
        draw_legend, draw_no_data, split_legend,
    },
};
use anyhow::Result;
use plotters::{coord::Shift, prelude::*};

pub const TRACES_TITLE: &str = "rps per application";

/// Requests per second of each trace over the selected time span, x in
/// seconds from the start of the span.
pub fn draw_traces<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    traces: &[WorkloadTrace],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x_max = traces.iter().map(|t| t.rps.len()).max().unwrap_or(0);
    if x_max == 0 {
        return draw_no_data(area, TRACES_TITLE);
    }
    let y_max = match traces.iter().map(WorkloadTrace::max_rps).fold(0.0, f64::max) {
        y if y > 0.0 => y * 1.1,
        _ => 1.0,
    };

    let (plot_area, legend_area) = split_legend(area);
    let mut chart = ChartBuilder::on(&plot_area)
        .caption(TRACES_TITLE, ("sans-serif", TITLE_FONT_SIZE).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .bold_line_style(get_color_from_label("grid")?.mix(0.6))
        .x_desc("seconds")
        .y_desc("rps")
        .label_style(("sans-serif", FONT_SIZE).into_font())
        .y_label_formatter(&|y| format!("{:.0}", y))
        .draw()?;

    let mut legend = Vec::with_capacity(traces.len());
    for (idx, trace) in traces.iter().enumerate() {
        let color = categorical(idx);
        chart.draw_series(LineSeries::new(
            trace.rps.iter().enumerate().map(|(x, y)| (x as f64, *y)),
            color.stroke_width(1),
        ))?;
        legend.push((trace.label.clone(), color));
    }

    draw_legend(&legend_area, "Application", &legend)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_traces() {
        let traces = vec![
            WorkloadTrace {
                label: "app0".to_string(),
                rps: vec![10.0, 12.0, 11.0],
            },
            WorkloadTrace {
                label: "app1".to_string(),
                rps: vec![3.0, 30.0],
            },
        ];

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (800, 400)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            draw_traces(&root, &traces).unwrap();
            root.present().unwrap();
        }

        assert!(svg.contains(TRACES_TITLE));
        assert!(svg.contains("app0"));
        assert!(svg.contains("app1"));
    }

    #[test]
    fn test_empty_traces_draw_placeholder() {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (800, 400)).into_drawing_area();
            draw_traces(&root, &[]).unwrap();
            root.present().unwrap();
        }
        assert!(svg.contains(crate::plot::NO_DATA_MESSAGE));
    }
}
