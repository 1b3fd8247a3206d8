use blotto_fp::plot::{output_path, plot_file, process, BatchPolicy};
use blotto_fp::{Error, LoadFailure, EPSILON, PAYOFF};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

fn workdir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("plot_batch").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_csv(dir: &Path, name: &str, text: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, text).unwrap();
    p
}

/// decodes the whole png and returns (width, height, pixels per meter, rgb)
fn decode(p: &Path) -> (u32, u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(File::open(p).unwrap());
    let mut reader = decoder.read_info().unwrap();
    let ppm = reader.info().pixel_dims.map(|d| d.xppu).unwrap_or(0);
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).unwrap();
    buf.truncate(frame.buffer_size());
    (frame.width, frame.height, ppm, buf)
}

fn assert_valid_chart(p: &Path) {
    assert!(fs::metadata(p).unwrap().len() > 0, "{} is empty", p.display());
    let (w, h, ppm, rgb) = decode(p);
    assert_eq!((w, h), (1920, 1440));
    assert_eq!(ppm, 11811);
    assert!(rgb.iter().any(|&b| b != 255), "{} is blank", p.display());
}

const SCENARIO: &str = "epsilon,payoff\n1.0,10\n0.1,12\n0.01,9\n";

#[test]
fn valid_file_gives_epsilon_and_payoff_images() {
    let dir = workdir("valid");
    let a = write_csv(&dir, "a.csv", SCENARIO);
    let outputs = plot_file(&a).unwrap();
    assert_eq!(
        outputs,
        vec![dir.join("a.csv.epsilon.png"), dir.join("a.csv.payoff.png")]
    );
    for p in outputs.iter() {
        assert_valid_chart(p);
    }
}

#[test]
fn second_run_overwrites() {
    let dir = workdir("overwrite");
    let a = write_csv(&dir, "a.csv", SCENARIO);
    fs::write(output_path(&a, EPSILON), b"stale").unwrap();
    plot_file(&a).unwrap();
    plot_file(&a).unwrap();
    assert_valid_chart(&output_path(&a, EPSILON));
    assert_valid_chart(&output_path(&a, PAYOFF));
    let pngs = fs::read_dir(&dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension() == Some(std::ffi::OsStr::new("png")))
        .count();
    assert_eq!(pngs, 2);
}

#[test]
fn fictitious_play_output_with_zero_epsilon() {
    let dir = workdir("zero_epsilon");
    let a = write_csv(
        &dir,
        "run.csv",
        "iteration,epsilon,payoff,attacker_best_response,defender_best_response\n\
         1,0.00000,3.00000,3.00000,3.00000\n\
         2,0.50000,2.50000,3.00000,2.00000\n\
         3,0.25000,2.75000,3.00000,2.50000\n",
    );
    for p in plot_file(&a).unwrap().iter() {
        assert_valid_chart(p);
    }
}

#[test]
fn header_only_file_gives_empty_charts() {
    let dir = workdir("header_only");
    let a = write_csv(&dir, "a.csv", "epsilon,payoff\n");
    for p in plot_file(&a).unwrap().iter() {
        assert_valid_chart(p);
    }
}

#[test]
fn missing_column_writes_nothing() {
    let dir = workdir("missing_column");
    let a = write_csv(&dir, "a.csv", "epsilon,reward\n1,2\n");
    match plot_file(&a) {
        Err(Error::MissingColumn { column, .. }) => assert_eq!(column, PAYOFF),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!output_path(&a, EPSILON).exists());
    assert!(!output_path(&a, PAYOFF).exists());
}

#[test]
fn unparseable_files_are_load_errors() {
    let dir = workdir("unparseable");
    let empty = write_csv(&dir, "empty.csv", "");
    let garbage = dir.join("garbage.csv");
    fs::write(&garbage, [0xffu8, 0xfe, 0x00, 0x9c, 0x0a, 0x80, 0x81]).unwrap();
    let missing = dir.join("missing.csv");
    match plot_file(&empty) {
        Err(Error::DataLoad {
            failure: LoadFailure::Empty,
            ..
        }) => {}
        other => panic!("unexpected {:?}", other),
    }
    for p in [garbage, missing].iter() {
        match plot_file(p) {
            Err(Error::DataLoad {
                failure: LoadFailure::Io(_),
                ..
            }) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(!output_path(p, EPSILON).exists());
    }
}

#[test]
fn unwritable_destination_is_an_output_error() {
    let dir = workdir("unwritable");
    let a = write_csv(&dir, "a.csv", SCENARIO);
    // a directory where the epsilon image should go
    fs::create_dir(output_path(&a, EPSILON)).unwrap();
    match plot_file(&a) {
        Err(Error::OutputWrite { path, .. }) => assert_eq!(path, output_path(&a, EPSILON)),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!output_path(&a, PAYOFF).exists());
}

#[test]
fn two_files_give_four_images() {
    let dir = workdir("two_files");
    let a = write_csv(&dir, "a.csv", SCENARIO);
    let b = write_csv(&dir, "b.csv", "payoff,epsilon\n-1,0.5\n1,0.25\n");
    let report = process(&[a.clone(), b.clone()], BatchPolicy::StopOnFirstError).unwrap();
    assert!(report.is_success());
    assert_eq!(report.written.len(), 2);
    assert_eq!(report.written[0].0, a);
    assert_eq!(report.written[1].0, b);
    for (_, outputs) in report.written.iter() {
        assert_eq!(outputs.len(), 2);
        for p in outputs.iter() {
            assert_valid_chart(p);
        }
    }
}

fn batch_with_bad_second(dir: &Path) -> Vec<PathBuf> {
    vec![
        write_csv(dir, "1.csv", SCENARIO),
        write_csv(dir, "2.csv", "epsilon\n1\n"),
        write_csv(dir, "3.csv", SCENARIO),
    ]
}

#[test]
fn stop_policy_leaves_later_files_unprocessed() {
    let dir = workdir("stop");
    let files = batch_with_bad_second(&dir);
    match process(&files, BatchPolicy::StopOnFirstError) {
        Err(Error::MissingColumn { path, .. }) => assert_eq!(path, files[1]),
        other => panic!("unexpected {:?}", other),
    }
    assert_valid_chart(&output_path(&files[0], EPSILON));
    assert_valid_chart(&output_path(&files[0], PAYOFF));
    for f in files[1..].iter() {
        assert!(!output_path(f, EPSILON).exists());
        assert!(!output_path(f, PAYOFF).exists());
    }
}

#[test]
fn continue_policy_reports_failures() {
    let dir = workdir("continue");
    let files = batch_with_bad_second(&dir);
    let report = process(&files, BatchPolicy::ContinueAndReport).unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, files[1]);
    assert_eq!(report.written.len(), 2);
    assert_valid_chart(&output_path(&files[2], PAYOFF));
    assert!(!output_path(&files[1], EPSILON).exists());
}
