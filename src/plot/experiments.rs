use crate::{
    analysis::{
        completion::completion_table,
        select::ExperimentKey,
        series::{latency_view, rate_view},
    },
    data::{
        events::{EventTable, Grouper},
        window::Window,
    },
    plot::{
        bars::draw_stacked_bars,
        draw_no_data,
        line::{draw_line_chart, LineChartStyle},
    },
};
use anyhow::Result;
use clap::Args;
use log::info;
use plotters::{coord::Shift, prelude::*};

/// Termination policy, load balancer and queue size of the runs used to
/// show the injected workload.
pub const WORKLOAD_TERMINATION: &str = "hard";
pub const WORKLOAD_LB: &str = "SWRR";
pub const WORKLOAD_QUEUE_SIZE: &str = "q0";

#[derive(Clone, Debug, Args)]
pub struct ScenarioArgs {
    /// Workload distribution of the injector (e.g. `poisson`)
    #[arg(long)]
    pub distribution: String,
    /// Request termination policy (e.g. `hard`)
    #[arg(long)]
    pub termination: String,
    /// Load balancer (e.g. `SWRR`)
    #[arg(long)]
    pub lb: String,
    /// Queue size label (e.g. `q0`)
    #[arg(long)]
    pub queue_size: String,
    /// Only show the requests of this application
    #[arg(long)]
    pub app: Option<String>,
    /// Split the series per application or per container
    #[arg(long, value_enum, default_value_t = Grouper::App)]
    pub grouper: Grouper,
    /// Width of the time bins (e.g. `60s`, `5min`)
    #[arg(long, default_value = "60s")]
    pub avg_window: Window,
}

impl ScenarioArgs {
    pub fn key(&self) -> ExperimentKey {
        ExperimentKey::new(&self.distribution, &self.termination, &self.lb, &self.queue_size)
    }
}

/// Injected requests per second of each application for the `case`
/// distribution, averaged over `aggregate_time`.
pub fn plot_workloads<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &EventTable,
    case: &str,
    aggregate_time: &Window,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let key = ExperimentKey::new(case, WORKLOAD_TERMINATION, WORKLOAD_LB, WORKLOAD_QUEUE_SIZE);
    let selection = data.select(&key);
    let title =
        format!("Average workload for the '{case}' injector, window size of {aggregate_time}");

    match rate_view(&selection, aggregate_time) {
        Some(series) => {
            info!("plotting workload of {} apps for {key}", series.lines.len());
            draw_line_chart(
                area,
                &series,
                &LineChartStyle {
                    title,
                    x_desc: "Time".to_string(),
                    y_desc: "Requests".to_string(),
                    legend_title: Grouper::App.to_string(),
                    markers: false,
                    band: false,
                },
            )
        }
        None => draw_no_data(area, &title),
    }
}

/// Average response time per time bin of one experiment, one line per
/// group, with its 95% confidence band.
pub fn plot_response_time<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &EventTable,
    args: &ScenarioArgs,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let key = args.key();
    let selection = data.select(&key).restrict_app(args.app.as_deref());
    let title = format!(
        "Average response time {} for scenario {}",
        args.grouper.title_suffix(),
        key.scenario()
    );

    match latency_view(&selection, args.grouper, &args.avg_window) {
        Some(series) => draw_line_chart(
            area,
            &series,
            &LineChartStyle {
                title,
                x_desc: "Time".to_string(),
                y_desc: format!("Average Response Time ({} window)", args.avg_window),
                legend_title: args.grouper.legend_title().to_string(),
                markers: true,
                band: true,
            },
        ),
        None => draw_no_data(area, &title),
    }
}

/// Completed and lost requests per time bin of one experiment, stacked per
/// group.
pub fn plot_requests_success<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &EventTable,
    args: &ScenarioArgs,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let key = args.key();
    let selection = data.select(&key).restrict_app(args.app.as_deref());
    let title = format!(
        "Executed vs Lost Requests per {} for scenario {}",
        args.grouper,
        key.scenario()
    );

    match completion_table(&selection, args.grouper, &args.avg_window) {
        Some(table) => draw_stacked_bars(area, &table, &args.avg_window, args.grouper, &title),
        None => draw_no_data(area, &title),
    }
}
