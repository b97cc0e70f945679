use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn log_text(steps: &[[f64; 4]]) -> String {
    let mut text = String::new();
    for (i, [w_min, w_max, u_min, u_max]) in steps.iter().enumerate() {
        text.push_str(&format!("Begin timestep {}\n", i));
        text.push_str(&format!("global min, max w {:.7E} {:.7E}\n", w_min, w_max));
        text.push_str(&format!("global min, max u {:.7E} {:.7E}\n", u_min, u_max));
    }
    text
}

const BASE: [[f64; 4]; 3] = [
    [-1.0, 1.0, -20.0, 20.0],
    [-1.1, 1.2, -21.0, 21.5],
    [-1.2, 1.3, -22.0, 23.0],
];

fn scaled(factor: f64) -> Vec<[f64; 4]> {
    BASE.iter()
        .map(|s| [s[0] * factor, s[1] * factor, s[2] * factor, s[3] * factor])
        .collect()
}

struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
    reference: PathBuf,
    out: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().join("logs");
        fs::create_dir_all(&root).expect("mkdir logs");
        let reference = tmp.path().join("reference.log");
        fs::write(&reference, log_text(&BASE)).expect("write reference");
        let out = tmp.path().join("out");
        Self {
            root,
            reference,
            out,
            _tmp: tmp,
        }
    }

    fn add_config(&self, name: &str, steps: &[[f64; 4]]) {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).expect("mkdir config");
        fs::write(dir.join("log.atmosphere.0000.out"), log_text(steps)).expect("write log");
    }
}

fn logcheck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logcheck"))
        .args(args)
        .arg("--no-color")
        .env_remove("LOGCHECK_SUMMARY_FILE")
        .env_remove("RUST_LOG")
        .output()
        .expect("run logcheck")
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn matching_run_exits_zero() {
    let fx = Fixture::new();
    fx.add_config("gnu-debug", &scaled(1.005));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference)]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("gnu-debug"));
    assert!(stdout.contains("MATCH"));
    assert!(stdout.contains("Summary: 1 match, 0 close, 0 differ, 0 no log, 0 failed, 0 error"));
}

#[test]
fn close_run_exits_zero() {
    let fx = Fixture::new();
    fx.add_config("intel", &scaled(1.03));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference)]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("0 match, 1 close"));
}

#[test]
fn differing_run_exits_one() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    fx.add_config("nvhpc", &scaled(1.06));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference)]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {}", stdout);
    assert!(stdout.contains("1 match, 0 close, 1 differ"));
}

#[test]
fn missing_root_exits_one() {
    let fx = Fixture::new();
    let missing = fx.root.join("does-not-exist");

    let output = logcheck(&[arg(&missing), arg(&fx.reference)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist"));
}

#[test]
fn omitted_reference_exits_one() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));

    let output = logcheck(&[arg(&fx.root)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("reference log is required"));
}

#[test]
fn missing_reference_exits_one() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    let missing = fx.root.join("nope.log");

    let output = logcheck(&[arg(&fx.root), arg(&missing)]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn expected_configuration_fails_unless_missing_allowed() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));

    let strict = logcheck(&[
        arg(&fx.root),
        arg(&fx.reference),
        "--expected",
        "gnu,intel",
    ]);
    let stdout = String::from_utf8_lossy(&strict.stdout);
    assert_eq!(strict.status.code(), Some(1), "stdout: {}", stdout);
    assert!(stdout.contains("intel"));
    assert!(stdout.contains("NO_LOG"));

    assert!(!stdout.contains("Note:"));

    let lenient = logcheck(&[
        arg(&fx.root),
        arg(&fx.reference),
        "--expected",
        "gnu,intel",
        "--allow-missing",
    ]);
    assert_eq!(lenient.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&lenient.stdout).contains(
        "Note: 1 configuration(s) had no log files (--allow-missing is set, not treated as failure)"
    ));
}

#[test]
fn summary_file_is_appended() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    fs::create_dir_all(&fx.out).expect("mkdir out");
    let summary = fx.out.join("summary.md");
    fs::write(&summary, "# Earlier step\n").expect("seed summary");

    let output = logcheck(&[
        arg(&fx.root),
        arg(&fx.reference),
        "--summary-file",
        arg(&summary),
    ]);
    assert_eq!(output.status.code(), Some(0));

    let text = fs::read_to_string(&summary).expect("read summary");
    assert!(text.starts_with("# Earlier step\n"));
    assert!(text.contains("## Reference Comparison\n"));
    assert!(text.contains("| gnu | ✅ MATCH | 3/3 |"));
    assert!(text.contains("**Summary: 1 match"));
}

#[test]
fn json_report_is_written() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    fx.add_config("empty", &[]);
    let report = fx.out.join("nested/report.json");

    let output = logcheck(&[
        arg(&fx.root),
        arg(&fx.reference),
        "--json-report",
        arg(&report),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report")).expect("json");
    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["mode"], "reference");
    assert_eq!(json["counts"]["match"], 1);
    assert_eq!(json["counts"]["failed"], 1);
    assert_eq!(json["results"][0]["name"], "empty");
    assert_eq!(json["results"][0]["status"], "FAILED");
    assert_eq!(json["results"][1]["status"], "MATCH");
    assert_eq!(
        json["reference_digest"].as_str().map(str::len),
        Some(64)
    );
}

#[test]
fn filter_limits_configurations() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    fx.add_config("nvhpc", &scaled(1.5));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference), "--filter", "gnu"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(!stdout.contains("nvhpc"));
}

#[test]
fn details_show_per_field_errors() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference), "--details"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Details:"));
    assert!(stdout.contains("w_min"));
    assert!(stdout.contains("u_max"));
}

#[test]
fn threshold_flag_widens_match_band() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.03));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference), "--threshold", "4"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("Thresholds: MATCH < 4%"));
    assert!(stdout.contains("1 match, 0 close"));
}

#[test]
fn threshold_above_close_bound_is_accepted() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));
    fx.add_config("intel", &scaled(1.07));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference), "--threshold", "10"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("Thresholds: MATCH < 10%, CLOSE < 10%"));
    assert!(stdout.contains("2 match, 0 close"));
}

#[test]
fn zero_threshold_is_accepted() {
    let fx = Fixture::new();
    fx.add_config("gnu", &scaled(1.0));

    let output = logcheck(&[arg(&fx.root), arg(&fx.reference), "--threshold", "0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout);
    assert!(stdout.contains("0 match, 1 close"));
}

#[test]
fn summary_sections_are_titled_by_mode() {
    let fx = Fixture::new();
    fx.add_config("logs-1proc-gnu", &scaled(1.0));
    fx.add_config("logs-2proc-gnu", &scaled(1.0));
    fs::create_dir_all(&fx.out).expect("mkdir out");
    let summary = fx.out.join("summary.md");

    let decomposition = logcheck(&[
        arg(&fx.root),
        "--decomposition-test",
        "--summary-file",
        arg(&summary),
    ]);
    assert_eq!(decomposition.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&decomposition.stdout)
        .contains("Decomposition Consistency Test"));

    let text = fs::read_to_string(&summary).expect("read summary");
    assert!(text.starts_with("## Decomposition Consistency Test\n"));
    assert!(text.contains("| 2proc vs 1proc: gnu | ✅ MATCH | 3/3 |"));
    assert!(!text.contains("## Reference Comparison"));
}

#[test]
fn decomposition_mode_compares_against_single_rank() {
    let fx = Fixture::new();
    fx.add_config("logs-1proc-gnu", &scaled(1.0));
    fx.add_config("logs-4proc-gnu", &scaled(1.0));
    fx.add_config("logs-1proc-intel", &scaled(1.0));
    fx.add_config("logs-2proc-intel", &scaled(1.2));

    let output = logcheck(&[arg(&fx.root), "--decomposition-test"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {}", stdout);
    assert!(stdout.contains("4proc vs 1proc: gnu"));
    assert!(stdout.contains("2proc vs 1proc: intel"));
    assert!(stdout.contains("1 match, 0 close, 1 differ"));
}

#[test]
fn decomposition_mode_without_multi_rank_runs_passes() {
    let fx = Fixture::new();
    fx.add_config("logs-1proc-gnu", &scaled(1.0));

    let output = logcheck(&[arg(&fx.root), "--decomposition-test"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("No multi-rank runs found"));
}
