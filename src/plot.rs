use super::chart::{LineChart, Scale};
use super::{Error, Table, EPSILON, PAYOFF, VERSION};
use clap::{App, Arg};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Column plotted and the vertical scale used for it, in output order.
pub const CHARTS: [(&str, Scale); 2] = [(EPSILON, Scale::Log), (PAYOFF, Scale::Linear)];

/// What to do with the remaining files once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    StopOnFirstError,
    ContinueAndReport,
}

impl BatchPolicy {
    pub fn from_name(name: &str) -> Option<BatchPolicy> {
        match name {
            "stop" => Some(BatchPolicy::StopOnFirstError),
            "continue" => Some(BatchPolicy::ContinueAndReport),
            _ => None,
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy::StopOnFirstError
    }
}

/// Outcome of a batch: the images written per input and the inputs that failed.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<(PathBuf, Vec<PathBuf>)>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `<input>.<column>.png`, appended to the full input name
pub fn output_path(csvin: &Path, column: &str) -> PathBuf {
    let mut name: OsString = csvin.as_os_str().to_os_string();
    name.push(format!(".{}.png", column));
    PathBuf::from(name)
}

/// Loads one csv and writes its charts, epsilon first.
/// Both required columns are checked before anything is drawn.
pub fn plot_file(csvin: &Path) -> Result<Vec<PathBuf>, Error> {
    info!("plotting {}", csvin.display());
    let required: Vec<&str> = CHARTS.iter().map(|(c, _)| *c).collect();
    let table = Table::from_csv(csvin, &required)?;
    let mut outputs = Vec::with_capacity(CHARTS.len());
    for ((column, values), &(_, scale)) in table.columns().zip(CHARTS.iter()) {
        let skipped = values.iter().filter(|v| !scale.accepts(**v)).count();
        if skipped > 0 {
            debug!(
                "{} of {} {} values cannot be drawn on a {:?} axis",
                skipped,
                values.len(),
                column,
                scale
            );
        }
        let pngout = output_path(csvin, column);
        LineChart::new(values, scale).save(&pngout)?;
        info!("wrote {}", pngout.display());
        outputs.push(pngout);
    }
    Ok(outputs)
}

/// Plots every file in order.
/// With `StopOnFirstError` the first failure is returned and later files are left untouched;
/// images of the files before it stay on disk.
pub fn process(files: &[PathBuf], policy: BatchPolicy) -> Result<BatchReport, Error> {
    let mut report = BatchReport::default();
    for csvin in files {
        match plot_file(csvin) {
            Ok(outputs) => report.written.push((csvin.clone(), outputs)),
            Err(e) => match policy {
                BatchPolicy::StopOnFirstError => return Err(e),
                BatchPolicy::ContinueAndReport => {
                    warn!("{}", e);
                    report.failed.push((csvin.clone(), e));
                }
            },
        }
    }
    Ok(report)
}

/// Takes the CLI arguments that control the plotting of the fictitious play csv files.
pub fn parse_cli() -> (Vec<PathBuf>, BatchPolicy, u64) {
    let arg_csvin = Arg::with_name("input_csvfiles")
        .help("csv files with epsilon and payoff columns")
        .multiple(true)
        .index(1);
    let arg_policy = Arg::with_name("on_error")
        .help("stop at the first failing file or keep going and report failures at the end")
        .long("on-error")
        .takes_value(true)
        .possible_values(&["stop", "continue"])
        .default_value("stop");
    let arg_verbose = Arg::with_name("verbose")
        .help("print progress, repeat for more detail")
        .short("v")
        .long("verbose")
        .multiple(true);
    let cli_args = App::new("blotto_fp_plot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot epsilon (log scale) and payoff of fictitious play runs to png")
        .arg(arg_csvin)
        .arg(arg_policy)
        .arg(arg_verbose)
        .get_matches();
    let csvin: Vec<PathBuf> = cli_args
        .values_of_os("input_csvfiles")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_default();
    let policy = cli_args
        .value_of("on_error")
        .and_then(BatchPolicy::from_name)
        .unwrap_or_default();
    let verbose = cli_args.occurrences_of("verbose");
    (csvin, policy, verbose)
}
