use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use clap::{Args, Command, FromArgMatches as _};

use crate::error::CocircError;
use crate::extract::{extract, DisplaySeries};
use crate::log::{info, set_log_level, set_module_filters, LevelFilter};
use crate::report::{check_outputs, write_compartments, write_display, ReportOptions};
use crate::scenario::Scenario;
use crate::series::TimeSeries;

/// Command line arguments of the scenario runner
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Path of the JSON scenario to run
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory for the CSV reports
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Prefix prepended to every report file name
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Overwrite reports that already exist
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Log level for one module, as MODULE=LEVEL (e.g. cocirc::integrator=debug). Repeatable
    #[arg(long = "log-filter", value_parser = parse_log_filter)]
    pub log_filters: Vec<(String, LevelFilter)>,

    /// Replace the horizon given in the scenario
    #[arg(long)]
    pub horizon: Option<f64>,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub series: TimeSeries,
    pub display: DisplaySeries,
    pub compartments_path: PathBuf,
    pub display_path: PathBuf,
}

/// Parses a `MODULE=LEVEL` pair given to `--log-filter`.
fn parse_log_filter(filter: &str) -> Result<(String, LevelFilter), String> {
    let (module, level) = filter
        .split_once('=')
        .ok_or_else(|| format!("expected MODULE=LEVEL, got '{filter}'"))?;
    if module.is_empty() {
        return Err(format!("missing module path in '{filter}'"));
    }
    let level =
        LevelFilter::from_str(level).map_err(|_| format!("unknown log level '{level}'"))?;
    Ok((module.to_string(), level))
}

fn create_cocirc_cli() -> Command {
    let cli = Command::new("cocirc")
        .about("Runs a two-disease SIRS scenario and writes the trajectories as CSV");
    BaseArgs::augment_args(cli)
}

/// Parses the command line and runs the scenario it names.
///
/// # Errors
/// Returns an error if argument parsing, loading the scenario, the run or writing the reports
/// fails
pub fn run_with_args() -> Result<RunOutput, Box<dyn std::error::Error>> {
    let matches = create_cocirc_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(args)?)
}

fn run_with_args_internal(args: BaseArgs) -> Result<RunOutput, CocircError> {
    if let Some(level) = &args.log_level {
        let level = LevelFilter::from_str(level)
            .map_err(|_| CocircError::ConfigError(format!("unknown log level '{level}'")))?;
        set_log_level(level);
    }
    if !args.log_filters.is_empty() {
        let filters: Vec<(&str, LevelFilter)> = args
            .log_filters
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
    }

    info!("Loading scenario from: {}", args.config.display());
    let mut scenario = Scenario::load(&args.config)?;
    if let Some(horizon) = args.horizon {
        scenario.horizon = horizon;
        scenario.validate()?;
    }

    let mut report_options = ReportOptions::new();
    report_options
        .directory(args.output_dir)
        .file_prefix(args.prefix)
        .overwrite(args.force_overwrite);
    check_outputs(&report_options)?;

    let started = Instant::now();
    let series = scenario
        .integrator()
        .run(&scenario.model(), scenario.initial_state(), scenario.horizon)?;
    let elapsed = started.elapsed();
    info!(
        "Integrated {} samples up to t = {} in {}",
        series.len(),
        scenario.horizon,
        humantime::format_duration(elapsed)
    );
    if let Some((index, compartment)) = series.first_out_of_range() {
        info!(
            "Trajectory left [0, 1] in {} at t = {}; consider a smaller step",
            compartment,
            series.time()[index]
        );
    }

    let display = extract(&series, &scenario.output)?;
    let compartments_path = write_compartments(&report_options, &series)?;
    let display_path = write_display(&report_options, &display)?;

    Ok(RunOutput {
        series,
        display,
        compartments_path,
        display_path,
    })
}
