use blotto_fp::plot::{parse_cli, process};
use tracing::{error, Level};

fn main() {
    let (csvin, policy, verbose) = parse_cli();
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match process(&csvin, policy) {
        Ok(report) if report.is_success() => {}
        Ok(report) => {
            for (path, e) in report.failed.iter() {
                error!("{}: {}", path.display(), e);
            }
            error!(
                "{} of {} files could not be plotted",
                report.failed.len(),
                csvin.len()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
