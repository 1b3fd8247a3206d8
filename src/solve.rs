use super::game::{exploitability, Game, MixedStrategy, MAX_BATTLEFIELDS};
use super::{Error, VERSION};
use chrono::prelude::*;
use clap::{App, Arg};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const CSV_HEADER: &str =
    "iteration,epsilon,payoff,attacker_best_response,defender_best_response";
pub const STRATEGY_HEADER: &str = "strategy,probability";

/// A solver run read from a config file:
/// `iterations attacker_resources defender_resources battlefields value...`
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub iterations: usize,
    pub game: Game,
}

impl GameConfig {
    pub fn from_file(fin: &Path) -> Result<GameConfig, Error> {
        let mut text = String::new();
        File::open(fin)
            .and_then(|mut f| f.read_to_string(&mut text))
            .map_err(|source| Error::Io {
                path: fin.to_path_buf(),
                source,
            })?;
        GameConfig::parse(&text, fin)
    }

    pub fn parse(text: &str, fin: &Path) -> Result<GameConfig, Error> {
        let mut tokens = text.split_whitespace();
        let mut next = |what: &str| -> Result<u64, Error> {
            let t = tokens
                .next()
                .ok_or_else(|| Error::config(fin, format!("missing {}", what)))?;
            t.parse()
                .map_err(|_| Error::config(fin, format!("{} {:?} is not a number", what, t)))
        };
        let iterations = next("iterations")? as usize;
        let attacker = next("attacker resources")? as usize;
        let defender = next("defender resources")? as usize;
        let n = next("number of battlefields")? as usize;
        if n == 0 || n > MAX_BATTLEFIELDS {
            return Err(Error::config(
                fin,
                format!("{} battlefields, expected 1 to {}", n, MAX_BATTLEFIELDS),
            ));
        }
        if attacker > n || defender > n {
            return Err(Error::config(
                fin,
                format!(
                    "resources ({} attacker, {} defender) exceed the {} battlefields",
                    attacker, defender, n
                ),
            ));
        }
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            let v = next(&format!("value of battlefield {}", i))?;
            if v > u32::MAX as u64 {
                return Err(Error::config(fin, format!("battlefield value {} too large", v)));
            }
            values.push(v as u32);
        }
        Ok(GameConfig {
            iterations,
            game: Game {
                values,
                attacker,
                defender,
            },
        })
    }
}

/// What a fictitious play run produced and how long it took.
#[derive(Debug)]
pub struct PlayOutcome {
    pub attacker: MixedStrategy,
    pub defender: MixedStrategy,
    pub completed: usize,
    pub interrupted: bool,
    pub total: chrono::Duration,
    pub computation: chrono::Duration,
}

/// Runs fictitious play from the uniform strategies, writing one csv row per iteration.
/// Stops early, keeping what was computed, when `stop` is raised.
pub fn fictitious_play(
    config: &GameConfig,
    csvout: &mut impl Write,
    stop: &AtomicBool,
) -> std::io::Result<PlayOutcome> {
    let game = &config.game;
    let n = game.battlefields();
    let mut msa = MixedStrategy::uniform(n, game.attacker);
    let mut msd = MixedStrategy::uniform(n, game.defender);
    writeln!(csvout, "{}", CSV_HEADER)?;

    let total_start = Local::now();
    let mut computation = chrono::Duration::zero();
    let print_step = (config.iterations / 100).max(1);
    let mut i = 0;
    while i < config.iterations && !stop.load(Ordering::SeqCst) {
        if i % print_step == 0 {
            debug!("{:.1}%", 100. * i as f64 / config.iterations as f64);
        }
        let start = Local::now();
        let current = game.expected_payoff(&msa, &msd);
        let (best_attacker, sa) = game.best_response_attacker(&msd);
        let (best_defender, sd) = game.best_response_defender(&msa);
        let epsilon = exploitability(current, best_attacker, best_defender);
        msa.add(sa);
        msd.add(sd);
        computation = computation + (Local::now() - start);

        writeln!(
            csvout,
            "{},{:.5},{:.5},{:.5},{:.5}",
            i + 1,
            epsilon,
            current,
            best_attacker,
            best_defender
        )?;
        i += 1;
    }
    csvout.flush()?;

    Ok(PlayOutcome {
        attacker: msa,
        defender: msd,
        completed: i,
        interrupted: i < config.iterations,
        total: Local::now() - total_start,
        computation,
    })
}

/// Writes the mixed strategy, most likely pure strategy first.
pub fn write_strategy(ms: &MixedStrategy, n: usize, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", STRATEGY_HEADER)?;
    for (s, p) in ms.distribution() {
        writeln!(out, "{},{:.10}", s.to_bits(n), p)?;
    }
    out.flush()
}

/// Output paths of a config: the iteration csv and the two strategy files,
/// each replacing the config extension.
pub fn output_paths(config: &Path) -> (PathBuf, PathBuf, PathBuf) {
    (
        config.with_extension("csv"),
        config.with_extension("attacker"),
        config.with_extension("defender"),
    )
}

fn create(path: &Path) -> Result<BufWriter<File>, Error> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads a config, runs fictitious play and writes the csv and strategy files.
pub fn solve_file(fin: &Path, stop: &AtomicBool) -> Result<PlayOutcome, Error> {
    let config = GameConfig::from_file(fin)?;
    let game = &config.game;
    let values: Vec<String> = game.values.iter().map(|v| v.to_string()).collect();
    info!(
        "{} ... BA = {}, BD = {}, battlefield = {}",
        fin.display(),
        game.attacker,
        game.defender,
        values.join(" ")
    );

    let (csvout, attout, defout) = output_paths(fin);
    let mut csv = create(&csvout)?;
    let outcome = fictitious_play(&config, &mut csv, stop).map_err(|source| Error::OutputWrite {
        path: csvout.clone(),
        source,
    })?;
    if outcome.interrupted {
        warn!(
            "interrupted, did {} out of {} iterations",
            outcome.completed, config.iterations
        );
    } else {
        info!("finished {} iterations", config.iterations);
    }
    info!(
        "fictitious play took {:.2} seconds ({:.2} computation, {:.2} io)",
        seconds(outcome.total),
        seconds(outcome.computation),
        seconds(outcome.total - outcome.computation)
    );

    let n = game.battlefields();
    for (ms, path) in [(&outcome.attacker, &attout), (&outcome.defender, &defout)].iter() {
        let mut out = create(path)?;
        write_strategy(ms, n, &mut out).map_err(|source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("wrote {}", path.display());
    }
    Ok(outcome)
}

fn seconds(d: chrono::Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.
}

/// Takes the CLI arguments of the fictitious play solver.
pub fn parse_cli_solve() -> (Vec<PathBuf>, u64, bool) {
    let arg_configs = Arg::with_name("configs")
        .help("game config files: iterations, attacker and defender resources, number of battlefields, battlefield values")
        .multiple(true)
        .required(true)
        .index(1);
    let arg_verbose = Arg::with_name("verbose")
        .help("print progress of every run")
        .short("v")
        .long("verbose")
        .multiple(true)
        .conflicts_with("quiet");
    let arg_quiet = Arg::with_name("quiet")
        .help("only print warnings and errors")
        .short("q")
        .long("quiet");
    let cli_args = App::new("blotto_fp_solve")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to solve attacker/defender battlefield games by fictitious play")
        .arg(arg_configs)
        .arg(arg_verbose)
        .arg(arg_quiet)
        .get_matches();
    let configs: Vec<PathBuf> = cli_args
        .values_of_os("configs")
        .map(|v| v.map(PathBuf::from).collect())
        .unwrap_or_default();
    (
        configs,
        cli_args.occurrences_of("verbose"),
        cli_args.is_present("quiet"),
    )
}
