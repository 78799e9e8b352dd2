use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::info;
use simplot::{
    allocation::{
        read_solution,
        summary::{
            allocated_ccs, allocated_ccs_table, allocated_vms, allocated_vms_table,
            allocation_rows, allocation_table, performance_matrix, workload_summary,
            workload_summary_table,
        },
    },
    data::{events::EventTable, traces::WorkloadTrace, units::UnitContext, window::Window},
    env::Env,
    plot::{
        experiments::{plot_requests_success, plot_response_time, plot_workloads, ScenarioArgs},
        svg_file,
        traces::draw_traces,
    },
    table::Table,
};
use std::{io, path::PathBuf};

#[derive(Parser)]
#[command(name = "simplot", about = "Plots and tables for simulation results")]
struct Cli {
    // The name of the task to execute
    #[clap(subcommand)]
    task: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plot the injected workload of each application
    Workload {
        /// Event log (CSV file, or directory of CSV files)
        #[arg(long)]
        data: PathBuf,
        /// Workload distribution of the injector
        #[arg(long)]
        case: String,
        /// Averaging window
        #[arg(long, default_value = "1s")]
        aggregate_time: Window,
        /// Output SVG path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Plot the average response time of one scenario
    ResponseTime {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Plot completed vs lost requests of one scenario
    RequestsSuccess {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Plot per-second workload traces
    Traces {
        /// Labelled trace files, as `<label>=<path>`
        #[arg(long = "trace", num_args = 1.., value_name = "LABEL=PATH", required = true)]
        traces: Vec<String>,
        /// Hour of the trace to start at
        #[arg(long, default_value = "9")]
        initial_hour: u32,
        /// Number of seconds to plot
        #[arg(long, default_value = "3600")]
        duration: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the tables summarizing an allocation solution
    Allocation {
        /// Solution file (JSON)
        #[arg(long)]
        solution: PathBuf,
        /// Print CSV instead of aligned text
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
}

const PLOT_SIZE: (u32, u32) = (1200, 600);
const BARS_PLOT_SIZE: (u32, u32) = (1500, 700);

fn out_path(out: &Option<PathBuf>, name: &str) -> Result<PathBuf> {
    match out {
        Some(path) => Ok(path.clone()),
        None => Env::plot_path(name),
    }
}

fn parse_trace_arg(arg: &str) -> Result<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((label, path)) if !label.is_empty() && !path.is_empty() => {
            Ok((label.to_string(), PathBuf::from(path)))
        }
        _ => anyhow::bail!("invalid trace argument, expected LABEL=PATH (arg={arg})"),
    }
}

fn print_tables(tables: &[Table], csv: bool) -> Result<()> {
    for table in tables {
        if csv {
            table.write_csv(io::stdout())?;
        } else {
            println!("{table}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize the logger.
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.init();

    let cli = Cli::parse();
    match &cli.task {
        Command::Workload {
            data,
            case,
            aggregate_time,
            out,
        } => {
            let table = EventTable::load(data)?;
            let path = out_path(out, &format!("workload_{case}"))?;
            svg_file(&path, PLOT_SIZE, |area| {
                plot_workloads(area, &table, case, aggregate_time)
            })?;
        }
        Command::ResponseTime {
            data,
            scenario,
            out,
        } => {
            let table = EventTable::load(data)?;
            let path = out_path(out, &format!("response_time_{}", scenario.key()))?;
            svg_file(&path, PLOT_SIZE, |area| {
                plot_response_time(area, &table, scenario)
            })?;
        }
        Command::RequestsSuccess {
            data,
            scenario,
            out,
        } => {
            let table = EventTable::load(data)?;
            let path = out_path(out, &format!("requests_success_{}", scenario.key()))?;
            svg_file(&path, BARS_PLOT_SIZE, |area| {
                plot_requests_success(area, &table, scenario)
            })?;
        }
        Command::Traces {
            traces,
            initial_hour,
            duration,
            out,
        } => {
            let mut workloads = Vec::with_capacity(traces.len());
            for arg in traces {
                let (label, path) = parse_trace_arg(arg)?;
                workloads.push(WorkloadTrace::from_path(
                    &label,
                    &path,
                    *initial_hour,
                    *duration,
                )?);
            }
            let path = out_path(out, "workload_traces")?;
            svg_file(&path, PLOT_SIZE, |area| draw_traces(area, &workloads))?;
        }
        Command::Allocation { solution, csv } => {
            let solution = read_solution(solution)?;
            let units = UnitContext::default();

            let rows = allocation_rows(&solution.allocation)?;
            let mut tables = vec![
                allocation_table(&rows),
                allocated_vms_table(&allocated_vms(&rows)),
                allocated_ccs_table(&allocated_ccs(&rows)),
            ];
            if !solution.workloads.is_empty() {
                tables.push(workload_summary_table(&workload_summary(
                    &solution.workloads,
                    &units,
                )?));
            }
            if !solution.performances.is_empty() {
                tables.push(performance_matrix(&solution.performances, &units)?.to_table());
            }
            info!("printing {} tables", tables.len());
            print_tables(&tables, *csv)?;
        }
    }

    Ok(())
}
