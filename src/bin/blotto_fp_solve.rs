use blotto_fp::solve::{parse_cli_solve, solve_file};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, warn, Level};

fn main() {
    let (configs, verbose, quiet) = parse_cli_solve();
    let level = if quiet {
        Level::WARN
    } else if verbose > 0 {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // ctrl-c ends the running config early, its partial results are still written
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_for_ctrlc = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupted_for_ctrlc.store(true, Ordering::SeqCst);
    }) {
        warn!("could not set the ctrl-c handler, runs cannot be interrupted: {}", e);
    }

    for config in configs.iter() {
        if let Err(e) = solve_file(config, &interrupted) {
            error!("{}", e);
            std::process::exit(1);
        }
        interrupted.store(false, Ordering::SeqCst);
    }
}
