use blotto_fp::plot::plot_file;
use blotto_fp::solve::{output_paths, solve_file, CSV_HEADER, STRATEGY_HEADER};
use blotto_fp::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

fn workdir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("solve_then_plot").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn solver_output_can_be_plotted() {
    let dir = workdir("pipeline");
    let config = dir.join("game.txt");
    fs::write(&config, "200\n2 2\n5\n1 2 3 4 5\n").unwrap();
    let outcome = solve_file(&config, &AtomicBool::new(false)).unwrap();
    assert_eq!(outcome.completed, 200);

    let (csv, attacker, defender) = output_paths(&config);
    let text = fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().next(), Some(CSV_HEADER));
    assert_eq!(text.lines().count(), 201);

    for p in [attacker, defender].iter() {
        let text = fs::read_to_string(p).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(STRATEGY_HEADER));
        let probabilities: Vec<f64> = lines
            .map(|l| {
                let mut parts = l.split(',');
                assert_eq!(parts.next().unwrap().len(), 5);
                parts.next().unwrap().parse().unwrap()
            })
            .collect();
        assert!(probabilities.windows(2).all(|w| w[0] >= w[1]));
        assert!((probabilities.iter().sum::<f64>() - 1.).abs() < 1e-6);
    }

    let images = plot_file(&csv).unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|p| fs::metadata(p).unwrap().len() > 0));
}

#[test]
fn epsilon_shrinks_over_the_run() {
    let dir = workdir("convergence");
    let config = dir.join("game.txt");
    fs::write(&config, "2000 1 1 3 1 2 3").unwrap();
    solve_file(&config, &AtomicBool::new(false)).unwrap();
    let (csv, _, _) = output_paths(&config);
    let text = fs::read_to_string(&csv).unwrap();
    let eps: Vec<f64> = text
        .lines()
        .skip(1)
        .map(|l| l.split(',').nth(1).unwrap().parse().unwrap())
        .collect();
    let early: f64 = eps[..100].iter().sum::<f64>() / 100.;
    let late: f64 = eps[eps.len() - 100..].iter().sum::<f64>() / 100.;
    assert!(late <= early);
}

#[test]
fn invalid_config_is_reported() {
    let dir = workdir("invalid");
    let config = dir.join("game.txt");
    fs::write(&config, "10 4 1 3 1 1 1").unwrap();
    match solve_file(&config, &AtomicBool::new(false)) {
        Err(Error::Config { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert!(!output_paths(&config).0.exists());
    match solve_file(&dir.join("absent.txt"), &AtomicBool::new(false)) {
        Err(Error::Io { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}
