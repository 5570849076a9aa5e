use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

const PAYLOAD: &str = r#"{
    "SiteA": [
        {"index": 0, "Date": "2024-01-01", "Production (kWh)": 10},
        {"index": 1, "Date": "2024-01-02", "Production (kWh)": 5}
    ],
    "SiteB": [
        {"index": 0, "Date": "2024-01-01", "Production (kWh)": 3}
    ]
}"#;

const DIRECTORY: &str = r#"[
    {"manufacturer_name": "Enphase", "sites": ["SiteA", "SiteB"]},
    {"manufacturer_name": "Fronius", "sites": ["Depot"]}
]"#;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write test file");
    path
}

fn solarview_bin() -> String {
    std::env::var("CARGO_BIN_EXE_solarview").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("solarview.exe");
        } else {
            path.push("solarview");
        }
        path.to_string_lossy().into_owned()
    })
}

fn solarview(home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(solarview_bin());
    // Keep any real user config out of the run
    cmd.args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

fn run_solarview(home: &Path, args: &[&str]) -> (bool, Vec<u8>, Vec<u8>) {
    let output = solarview(home, args).output().expect("run solarview");
    (output.status.success(), output.stdout, output.stderr)
}

fn run_solarview_with_stdin(home: &Path, args: &[&str], stdin: &str) -> (bool, Vec<u8>, Vec<u8>) {
    let mut child = solarview(home, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn solarview");
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for solarview");
    (output.status.success(), output.stdout, output.stderr)
}

struct Fixture {
    dir: TempDir,
    payload: String,
    directory: String,
}

impl Fixture {
    fn new(payload: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let payload = write_file(dir.path(), "payload.json", payload)
            .display()
            .to_string();
        let directory = write_file(dir.path(), "sites.json", DIRECTORY)
            .display()
            .to_string();
        Self {
            dir,
            payload,
            directory,
        }
    }

    fn args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = vec!["--input", self.payload.as_str(), "--timezone", "UTC"];
        full.extend_from_slice(args);
        full
    }

    fn run(&self, args: &[&str]) -> (bool, Vec<u8>, Vec<u8>) {
        run_solarview(self.dir.path(), &self.args(args))
    }

    fn run_with_stdin(&self, args: &[&str], stdin: &str) -> (bool, Vec<u8>, Vec<u8>) {
        run_solarview_with_stdin(self.dir.path(), &self.args(args), stdin)
    }
}

#[test]
fn export_stdout_matches_expected_rows() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) = fx.run(&[
        "export",
        "--stdout",
        "--site",
        "SiteA",
        "--site",
        "SiteB",
        "--since",
        "2024-01-01",
        "--until",
        "2024-01-02",
    ]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert_eq!(
        String::from_utf8_lossy(&stdout),
        "Date,SiteA (kWh),SiteB (kWh),All Sites (kWh)\n2024-01-01,10,3,13\n2024-01-02,5,0,5\n"
    );
}

#[test]
fn export_writes_production_file() {
    let fx = Fixture::new(PAYLOAD);
    let out_dir = fx.dir.path().join("out");
    fs::create_dir_all(&out_dir).expect("create out dir");
    let out = out_dir.display().to_string();

    let (ok, _stdout, stderr) = fx.run(&[
        "export",
        "--output",
        &out,
        "--directory",
        &fx.directory,
        "--manufacturer",
        "enphase",
    ]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let text = fs::read_to_string(out_dir.join("Production_data.csv")).expect("export file");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Date,SiteA (kWh),SiteB (kWh),All Sites (kWh)");
    assert_eq!(lines.len(), 3);
}

#[test]
fn export_without_sites_is_a_noop() {
    let fx = Fixture::new(PAYLOAD);
    let out = fx.dir.path().display().to_string();
    let (ok, stdout, _stderr) = fx.run(&["export", "--output", &out]);
    assert!(ok);
    assert!(stdout.is_empty());
    assert!(!fx.dir.path().join("Production_data.csv").exists());
}

#[test]
fn chart_json_has_shared_labels() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) = fx.run(&["chart", "--site", "SiteB", "--site", "SiteA"]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["labels"], serde_json::json!(["2024-01-01", "2024-01-02"]));
    let datasets = json["datasets"].as_array().expect("datasets");
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0]["label"], "SiteB");
    assert_eq!(datasets[1]["label"], "SiteA");
    assert_eq!(datasets[1]["data"].as_array().map(Vec::len), Some(2));
}

#[test]
fn chart_without_sites_is_empty() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, _stderr) = fx.run(&["chart"]);
    assert!(ok);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json, serde_json::json!({"labels": [], "datasets": []}));
}

#[test]
fn malformed_payload_degrades_to_empty_chart() {
    let fx = Fixture::new("<html>oops</html>");
    let (ok, stdout, _stderr) = fx.run(&["chart", "--site", "SiteA"]);
    assert!(ok);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["labels"], serde_json::json!([]));
    assert_eq!(json["datasets"].as_array().map(Vec::len), Some(1));
}

#[test]
fn metrics_json_as_of_date() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) = fx.run(&["metrics", "--today", "2024-01-05", "-j"]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let arr = json.as_array().expect("array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["site"], "SiteA");
    assert_eq!(arr[0]["last_7_days"].as_f64(), Some(15.0));
    assert_eq!(arr[1]["ytd"].as_f64(), Some(3.0));
}

#[test]
fn alerts_report_trailing_zero_days() {
    let fx = Fixture::new(
        r#"{
            "Barn": [
                {"Date": "2024-01-03", "Production (kWh)": 0},
                {"Date": "2024-01-01", "Production (kWh)": 4},
                {"Date": "2024-01-02", "Production (kWh)": 0}
            ],
            "School": [{"Date": "2024-01-03", "Production (kWh)": 2}]
        }"#,
    );
    let (ok, stdout, stderr) = fx.run(&["alerts", "--json"]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json, serde_json::json!([{"site": "Barn", "zero_days": 2}]));
}

#[test]
fn sites_lists_directory() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) = fx.run(&["sites", "--directory", &fx.directory, "--json"]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json[1]["manufacturer_name"], "Fronius");
    assert_eq!(json[1]["sites"], serde_json::json!(["Depot"]));
}

#[test]
fn watch_prints_after_refresh() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) = fx.run(&["watch", "--count", "1", "--no-color", "--site", "SiteA"]);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let text = String::from_utf8_lossy(&stdout);
    assert!(text.contains("SiteA"));
    assert!(text.contains("2024-01-02"));
    assert!(text.contains("5.00 kWh"));
}

#[test]
fn watch_refreshes_on_request() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, stdout, stderr) =
        fx.run_with_stdin(&["watch", "--count", "2", "--no-color", "--site", "SiteA"], "r\n");
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Daily ready #2"));
}

#[test]
fn watch_switches_interval_from_stdin() {
    let fx = Fixture::new(PAYLOAD);
    // The refresh guarantees a second applied fetch even if the first
    // daily result arrives after the switch and is discarded
    let (ok, stdout, stderr) = fx.run_with_stdin(
        &["watch", "--count", "2", "--no-color", "--site", "SiteA"],
        "15T\nr\n",
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let text = String::from_utf8_lossy(&stdout);
    assert!(text.contains("15 Min"), "stdout: {text}");
    assert!(text.contains("#2"), "stdout: {text}");
    assert!(text.contains("SiteA"));
}

#[test]
fn watch_quits_on_q() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, _stdout, stderr) = fx.run_with_stdin(&["watch", "--no-color"], "q\n");
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
}

#[test]
fn unknown_manufacturer_fails() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, _stdout, stderr) = fx.run(&["chart", "--directory", &fx.directory, "-m", "Tesla"]);
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Unknown manufacturer: Tesla"));
}

#[test]
fn inverted_range_fails() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, _stdout, stderr) = fx.run(&["export", "--since", "20240201", "--until", "20240101"]);
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Invalid date range"));
}

#[test]
fn invalid_interval_fails() {
    let fx = Fixture::new(PAYLOAD);
    let (ok, _stdout, stderr) = fx.run(&["chart", "--interval", "weekly"]);
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Invalid interval"));
}
