use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const VALID: &str = "5A030001000A0001000000FFFFFFFF2100C3";
const FIELD_1_HIGH: &str = "5B030001000A0001000000FFFFFFFF2100C3";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("framescope"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn layout(name: &str) -> std::path::PathBuf {
    repo_root().join("tests").join("layouts").join(name)
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("layout")));
}

#[test]
fn missing_layout_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(temp.path().join("missing.json"))
        .arg(VALID)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn no_frames_is_an_error() {
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .assert()
        .code(2)
        .stderr(contains("no frames to decode"));
}

#[test]
fn decode_prints_table() {
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg(VALID)
        .assert()
        .success()
        .stdout(
            contains("my_frame_1")
                .and(contains("ErrCnt"))
                .and(contains("0x5A"))
                .and(contains("$[4:7]MODE")),
        );
}

#[test]
fn decode_json_counts_errors_across_frames() {
    let assert = cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg(FIELD_1_HIGH)
        .arg(FIELD_1_HIGH)
        .arg("--json")
        .assert()
        .success();
    let reports = stdout_json(&assert);
    let reports = reports.as_array().expect("array");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1]["rows"][0]["label"], "FIELD_1");
    assert_eq!(reports[1]["rows"][0]["is_ok"], false);
    assert_eq!(reports[1]["rows"][0]["err_cnt"], 2);
}

#[test]
fn strict_fails_on_invalid_field() {
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg(FIELD_1_HIGH)
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("validation failures detected"));

    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg(VALID)
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn invalid_hex_is_reported() {
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg("5G")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("arg[0]")));
}

#[test]
fn input_glob_reads_hex_lines() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(
        temp.path().join("a.hex"),
        format!("# captured frames\n{VALID}\n\n{FIELD_1_HIGH}\n"),
    )
    .expect("write input");
    std::fs::write(temp.path().join("b.hex"), format!("{VALID}\n")).expect("write input");
    let pattern = temp.path().join("*.hex");

    let assert = cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg("-i")
        .arg(pattern.to_string_lossy().to_string())
        .arg("--json")
        .assert()
        .success();
    let reports = stdout_json(&assert);
    assert_eq!(reports.as_array().expect("array").len(), 3);
}

#[test]
fn input_pattern_without_matches_fails() {
    let temp = TempDir::new().expect("tempdir");
    let pattern = temp.path().join("*.hex");
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .arg("-i")
        .arg(pattern.to_string_lossy().to_string())
        .assert()
        .code(2)
        .stderr(contains("no files match pattern"));
}

#[test]
fn binary_input_decodes_raw_file() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("frame.bin");
    std::fs::write(&path, [0x01, 0x00, 0x10, 0x80, 0xFF, 0x9C, 0x80]).expect("write input");

    let assert = cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("sensors.json"))
        .arg("-i")
        .arg(&path)
        .arg("--binary")
        .arg("--json")
        .assert()
        .success();
    let reports = stdout_json(&assert);
    assert_eq!(reports[0]["header"][0], "Name");
    assert_eq!(reports[0]["rows"][1]["label"], "Sensor[0].TEMP");
    assert_eq!(reports[0]["rows"][1]["value"], "16");
}

#[test]
fn batch_json_excludes_fields() {
    let assert = cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("sensors.json"))
        .arg("02 00FA 80 FE70 80")
        .arg("02 0000 80 0001 80 AA")
        .arg("--batch")
        .arg("--exclude")
        .arg("TAIL")
        .arg("--json")
        .assert()
        .success();
    let table = stdout_json(&assert);
    let columns: Vec<&str> = table["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|c| c.as_str().expect("label"))
        .collect();
    assert_eq!(
        columns,
        vec![
            "COUNT",
            "Sensor[0].TEMP",
            "Sensor[0].STATE",
            "Sensor[1].TEMP",
            "Sensor[1].STATE"
        ]
    );
    assert_eq!(table["values"][0][3], "-400");
    assert_eq!(table["diagnostics"][0]["row"], 1);
}

#[test]
fn batch_rejects_unknown_exclude() {
    cmd()
        .arg("decode")
        .arg("-l")
        .arg(layout("sensors.json"))
        .arg("02 00FA 80 FE70 80")
        .arg("--batch")
        .arg("--exclude")
        .arg("NOPE")
        .assert()
        .code(2)
        .stderr(contains("unknown field label(s): NOPE").and(contains("hint:")));
}

#[test]
fn layout_prints_offsets() {
    cmd()
        .arg("layout")
        .arg("-l")
        .arg(layout("my_frame.json"))
        .assert()
        .success()
        .stdout(contains("STATUS").and(contains("Full size: 18")));
}

#[test]
fn layout_json_lists_entries() {
    let assert = cmd()
        .arg("layout")
        .arg("-l")
        .arg(layout("sensors.json"))
        .arg("--json")
        .assert()
        .success();
    let entries = stdout_json(&assert);
    assert_eq!(entries[3]["label"], "Sensor[1].TEMP");
    assert_eq!(entries[3]["offset"], 4);
}
