use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use similar::{ChangeTag, TextDiff};

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn fixture_dir() -> PathBuf {
    project_root().join("fixtures")
}

fn golden_dir() -> PathBuf {
    project_root().join("golden")
}

fn update_golden() -> bool {
    std::env::var("UPDATE_GOLDEN").is_ok()
}

fn diff_strings(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(&format!("{sign}{change}"));
    }
    out
}

/// Parse JSON-lines output into values so formatting differences don't matter.
fn parse_lines(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("Bad JSON {line:?}: {e}")))
        .collect()
}

fn pretty(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| serde_json::to_string_pretty(v).unwrap() + "\n")
        .collect()
}

/// Run the binary with one argument per fixture line, feeding `<stem>.stdin` if present.
fn run_fixture(fixture_path: &Path) -> std::process::Output {
    let args: Vec<String> = fs::read_to_string(fixture_path)
        .expect("Failed to read fixture")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    let stdin = fs::read(fixture_path.with_extension("stdin")).ok();

    let mut child = Command::new(env!("CARGO_BIN_EXE_calfield"))
        .args(&args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute calfield");
    if let Some(input) = stdin {
        let mut pipe = child.stdin.take().unwrap();
        pipe.write_all(&input).expect("Failed to write stdin");
    }
    child.wait_with_output().expect("Failed to wait for calfield")
}

#[test]
fn golden_json_output() {
    let fixtures = fixture_dir();
    let golden = golden_dir();

    let mut entries: Vec<_> = fs::read_dir(&fixtures)
        .expect("Failed to read fixtures directory")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    assert!(
        !entries.is_empty(),
        "No fixture files found in {fixtures:?}"
    );

    for entry in entries {
        let fixture_path = entry.path();
        let stem = fixture_path.file_stem().unwrap().to_str().unwrap();
        let golden_path = golden.join(format!("{stem}.json"));

        let output = run_fixture(&fixture_path);
        assert!(
            output.status.success(),
            "calfield failed for {}: {}",
            stem,
            String::from_utf8_lossy(&output.stderr)
        );

        let actual = String::from_utf8(output.stdout).expect("Output is not valid UTF-8");

        if update_golden() {
            fs::create_dir_all(&golden).ok();
            fs::write(&golden_path, pretty(&parse_lines(&actual)))
                .unwrap_or_else(|e| panic!("Failed to write golden file {golden_path:?}: {e}"));
            eprintln!("Updated golden file: {golden_path:?}");
            continue;
        }

        let expected = fs::read_to_string(&golden_path).unwrap_or_else(|e| {
            panic!(
                "Golden file {golden_path:?} not found: {e}\n\
                 Hint: Run with UPDATE_GOLDEN=1 to generate golden files"
            )
        });
        let expected: Vec<Value> = serde_json::Deserializer::from_str(&expected)
            .into_iter::<Value>()
            .collect::<Result<_, _>>()
            .unwrap_or_else(|e| panic!("Bad golden file {golden_path:?}: {e}"));
        let actual = parse_lines(&actual);

        if actual != expected {
            let diff = diff_strings(&pretty(&expected), &pretty(&actual));
            panic!(
                "Golden test mismatch for {stem}:\n\n\
                 {diff}\n\n\
                 Run with UPDATE_GOLDEN=1 to refresh snapshots"
            );
        }
    }
}

#[test]
fn strict_mismatch_reports_nonlenient() {
    let output = Command::new(env!("CARGO_BIN_EXE_calfield"))
        .args([
            "resolve",
            "--calendar",
            "gregorian",
            "--strict",
            "--set",
            "YEAR=2023",
            "--set",
            "MONTH=1",
            "--set",
            "DAY_OF_MONTH=30",
        ])
        .output()
        .expect("Failed to execute calfield");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    let json_start = stderr.find('{').expect("No JSON error envelope");
    let envelope: Value = serde_json::from_str(&stderr[json_start..]).unwrap();
    assert_eq!(envelope["status"], "nonlenient");
    assert_eq!(envelope["exit_code"], 2);
}

#[test]
fn unknown_field_is_input_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_calfield"))
        .args(["step", "--start", "0", "--field", "FORTNIGHT", "--amount", "1"])
        .output()
        .expect("Failed to execute calfield");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn invalid_timezone_is_input_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_calfield"))
        .args(["resolve", "--tz", "Mars/Olympus", "--set", "YEAR=2024"])
        .output()
        .expect("Failed to execute calfield");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid timezone"));
}
