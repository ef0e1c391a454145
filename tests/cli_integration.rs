//! Integration tests for the `tc` CLI.
//!
//! Each test creates a temp vault, runs `tc` as a subprocess against a fixed
//! day and clock, and verifies stdout and/or the log file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use pretty_assertions::assert_eq;

const DATE: &str = "2026-01-10";

/// Get the path to the built `tc` binary.
fn tc_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tc");
    path
}

/// Create a vault with the default config and an optional log for `DATE`.
fn create_test_vault(root: &Path, log: Option<&str>) {
    fs::write(
        root.join("chute.toml"),
        "# test vault\n[log]\nfolder = \"taskchute\"\n\n[cockpit]\nmust_limit = 3\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("taskchute")).unwrap();
    if let Some(text) = log {
        fs::write(log_path(root), text).unwrap();
    }
}

fn log_path(root: &Path) -> PathBuf {
    root.join("taskchute").join(format!("{}.md", DATE))
}

fn read_log(root: &Path) -> String {
    fs::read_to_string(log_path(root)).unwrap()
}

/// Run `tc -C <root> --date DATE --at <at> <args>`.
fn run_tc(root: &Path, at: &str, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(tc_bin())
        .arg("-C")
        .arg(root)
        .args(["--date", DATE, "--at", at])
        .args(args)
        .output()
        .expect("failed to run tc");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_tc_ok(root: &Path, at: &str, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tc(root, at, args);
    if !success {
        panic!(
            "tc {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

const DAY_LOG: &str = "\
# TaskChute 2026-01-10

## Morning
- Mail (10m) <!-- tc:id=a1b2c3 -->
  - ✅ 08:00–08:10 +10m
- Write report (30m) #must <!-- tc:id=d4e5f6 -->
  - ⌛ 09:00–
  - 📝 outline first
- 11:00 Read papers (15m)

## Afternoon
- Review PRs (20m)
";

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn test_init_writes_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().to_str().unwrap();
    let output = Command::new(tc_bin())
        .args(["-C", root, "init", "--folder", "logs"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config = fs::read_to_string(tmp.path().join("chute.toml")).unwrap();
    assert!(config.contains("folder = \"logs\""));
    assert!(tmp.path().join("logs").is_dir());

    // A second init refuses to clobber the file
    let again = Command::new(tc_bin())
        .args(["-C", root, "init"])
        .output()
        .unwrap();
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("--force"));
}

#[test]
fn test_open_creates_log_with_header() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), None);

    let stdout = run_tc_ok(tmp.path(), "08:00", &["open"]);
    assert!(stdout.trim().ends_with("taskchute/2026-01-10.md"));
    assert_eq!(read_log(tmp.path()), "# TaskChute 2026-01-10\n\n");

    let stdout = run_tc_ok(tmp.path(), "08:00", &["open", "--next", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["date"], "2026-01-11");
    assert_eq!(json["created"], true);
}

#[test]
fn test_status_does_not_create_log() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), None);

    let stdout = run_tc_ok(tmp.path(), "08:00", &["status"]);
    assert!(stdout.contains("NOW   READY"));
    assert!(!log_path(tmp.path()).exists());
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[test]
fn test_status_text() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["status"]);
    assert!(stdout.contains("2026-01-10 09:10  remaining 1h05m  eta 10:15"));
    assert!(stdout.contains("NOW   Write report"));
    assert!(stdout.contains("left 20:00  ends 09:30"));
    assert!(stdout.contains("NEXT  11:00 Read papers"));
    assert!(stdout.contains("MUST  · Write report"));
    assert!(stdout.contains("AT    11:00 11:00 Read papers"));
    assert!(stdout.contains("DONE  10m  running 10m  total 20m"));
}

#[test]
fn test_status_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:45", &["status", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["date"], DATE);
    assert_eq!(json["now"]["title"], "Write report");
    assert_eq!(json["now"]["line"], 6);
    assert_eq!(json["now"]["start"], "09:00");
    assert_eq!(json["now"]["remaining_seconds"], -900);
    assert_eq!(json["next"]["title"], "11:00 Read papers");
    assert_eq!(json["must"].as_array().unwrap().len(), 1);
    assert_eq!(json["remaining_minutes"], 65);
    assert_eq!(json["eta"], "10:50");
}

#[test]
fn test_list_open_tasks() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["list"]);
    assert!(!stdout.contains("Mail"));
    assert!(stdout.contains("   6  ⌛ Write report (30m) [must]"));
    assert!(stdout.contains("   9  · 11:00 Read papers (15m)"));
    assert!(stdout.contains("  12  · Review PRs (20m)"));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["list", "--all"]);
    assert!(stdout.contains("   4  ✅ Mail (10m)"));
}

#[test]
fn test_list_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["list", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tasks = json.as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0]["id"], "d4e5f6");
    assert_eq!(tasks[0]["running"], true);
    assert_eq!(tasks[1]["scheduled_at"], "11:00");
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

#[test]
fn test_add_start_end_cycle() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), None);

    let stdout = run_tc_ok(
        tmp.path(),
        "09:00",
        &["add", "Write report", "-e", "30", "--must"],
    );
    assert_eq!(stdout.trim(), "added line 2: - Write report (30m) #must");

    let stdout = run_tc_ok(tmp.path(), "09:05", &["start"]);
    assert_eq!(stdout.trim(), "started line 3: - ⌛ 09:05–");
    let log = read_log(tmp.path());
    assert!(log.contains("- Write report (30m) #must <!-- tc:id="));
    assert!(log.contains("\n  - ⌛ 09:05–\n"));

    let stdout = run_tc_ok(tmp.path(), "09:40", &["end"]);
    assert_eq!(stdout.trim(), "ended line 3: - ✅ 09:05–09:40 +35m");
    assert!(read_log(tmp.path()).contains("\n  - ✅ 09:05–09:40 +35m\n"));
}

#[test]
fn test_add_to_section() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["add", "Call bank", "--section", "Morning"]);
    assert_eq!(stdout.trim(), "added line 10: - Call bank");
    let log = read_log(tmp.path());
    assert!(log.contains("- 11:00 Read papers (15m)\n- Call bank\n\n## Afternoon"));

    let (_, stderr, success) = run_tc(tmp.path(), "09:10", &["add", "X", "--section", "Evening"]);
    assert!(!success);
    assert!(stderr.contains("section not found: Evening"));
}

#[test]
fn test_add_and_start_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), None);

    let stdout = run_tc_ok(tmp.path(), "10:15", &["add", "Hotfix", "--start", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["line"], 3);
    assert_eq!(json["text"], "  - ⌛ 10:15–");

    let log = read_log(tmp.path());
    assert!(log.contains("- Hotfix <!-- tc:id="));
}

#[test]
fn test_start_refuses_existing_start_time() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let (_, stderr, success) = run_tc(tmp.path(), "09:10", &["start", "7"]);
    assert!(!success);
    assert!(stderr.contains("already has a start time"));
    assert_eq!(read_log(tmp.path()), DAY_LOG);
}

#[test]
fn test_end_without_running_entry() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some("# TaskChute 2026-01-10\n\n- Mail\n"));

    let (_, stderr, success) = run_tc(tmp.path(), "09:10", &["end"]);
    assert!(!success);
    assert!(stderr.contains("no running ⌛ entry found"));
    assert_eq!(read_log(tmp.path()), "# TaskChute 2026-01-10\n\n- Mail\n");
}

#[test]
fn test_end_start_moves_to_next_task() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:40", &["end-start"]);
    assert_eq!(stdout.trim(), "ended line 10: - ⌛ 09:40–");

    let log = read_log(tmp.path());
    assert!(log.contains("  - ✅ 09:00–09:40 +40m\n"));
    assert!(log.contains("- 11:00 Read papers (15m) <!-- tc:id="));
    assert!(log.contains(" -->\n  - ⌛ 09:40–\n"));
}

#[test]
fn test_end_start_warns_when_nothing_left() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(
        tmp.path(),
        Some("# TaskChute 2026-01-10\n\n- Write <!-- tc:id=aaaaaa -->\n  - ⌛ 09:00–\n"),
    );

    let (stdout, stderr, success) = run_tc(tmp.path(), "09:30", &["end-start"]);
    assert!(success);
    assert!(stdout.contains("- ✅ 09:00–09:30 +30m"));
    assert!(stderr.contains("warning: no unprocessed task left to start"));
}

#[test]
fn test_resume_and_recalc() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(
        tmp.path(),
        Some("# TaskChute 2026-01-10\n\n- Mail <!-- tc:id=aaaaaa -->\n  - ✅ 08:00–08:25 +10m\n"),
    );

    let stdout = run_tc_ok(tmp.path(), "09:00", &["recalc"]);
    assert_eq!(stdout.trim(), "recalculated line 4: - ✅ 08:00–08:25 +25m");

    let (_, stderr, success) = run_tc(tmp.path(), "09:00", &["recalc", "4"]);
    assert!(!success);
    assert!(stderr.contains("no change"));

    let stdout = run_tc_ok(tmp.path(), "09:00", &["resume"]);
    assert_eq!(stdout.trim(), "resumed line 4: - ⌛ 08:00–");
}

#[test]
fn test_memo_goes_under_running_entry() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["memo", "draft sent"]);
    assert_eq!(stdout.trim(), "memo line 8: - 📝 draft sent");
    let log = read_log(tmp.path());
    assert!(log.contains("  - ⌛ 09:00–\n  - 📝 draft sent\n  - 📝 outline first\n"));

    let stdout = run_tc_ok(tmp.path(), "09:10", &["memo", "reply later", "--line", "4"]);
    assert_eq!(stdout.trim(), "memo line 5: - 📝 reply later");
}

#[test]
fn test_memo_follows_latest_running_entry() {
    let log = "\
# TaskChute 2026-01-10

- First <!-- tc:id=f1r570 -->
  - ⌛ 09:00–
- Second <!-- tc:id=5ec0d0 -->
  - ⌛ 09:30–
";
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(log));

    let stdout = run_tc_ok(tmp.path(), "09:40", &["status", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["now"]["title"], "Second");

    let stdout = run_tc_ok(tmp.path(), "09:40", &["memo", "for second"]);
    assert_eq!(stdout.trim(), "memo line 7: - 📝 for second");
    let expected = log.replace(
        "  - ⌛ 09:30–\n",
        "  - ⌛ 09:30–\n  - 📝 for second\n",
    );
    assert_eq!(read_log(tmp.path()), expected);
}

#[test]
fn test_line_zero_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let (_, stderr, success) = run_tc(tmp.path(), "09:10", &["start", "0"]);
    assert!(!success);
    assert!(stderr.contains("line numbers start at 1"));
}

#[test]
fn test_bad_clock_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let (_, stderr, success) = run_tc(tmp.path(), "25:99", &["status"]);
    assert!(!success);
    assert!(stderr.contains("invalid time"));
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

const DUPLICATE_LOG: &str = "\
# TaskChute 2026-01-10

- Mail <!-- tc:id=aaaaaa -->
  - ✅ 08:00–08:10 +10m
- Write <!-- tc:id=aaaaaa -->
  - ⌛
";

#[test]
fn test_check_reports_problems() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DUPLICATE_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:00", &["check"]);
    assert!(stdout.contains("id aaaaaa is used on lines 3, 5"));
    assert!(stdout.contains("line 6: ⌛ without start time under \"Write\""));
    assert!(stdout.contains("✗ log has errors"));
    assert_eq!(read_log(tmp.path()), DUPLICATE_LOG);
}

#[test]
fn test_check_fix_replaces_later_duplicates() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DUPLICATE_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:00", &["check", "--fix", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["fixed"][0]["line"], 5);
    assert_eq!(json["fixed"][0]["old_id"], "aaaaaa");

    let log = read_log(tmp.path());
    assert!(log.contains("- Mail <!-- tc:id=aaaaaa -->"));
    assert!(!log.contains("- Write <!-- tc:id=aaaaaa -->"));
}

#[test]
fn test_check_valid_log() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), Some(DAY_LOG));

    let stdout = run_tc_ok(tmp.path(), "09:00", &["check"]);
    assert!(stdout.contains("✓ log is valid"));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn test_config_get_and_set() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_vault(tmp.path(), None);

    assert_eq!(
        run_tc_ok(tmp.path(), "09:00", &["config", "get", "cockpit.must_limit"]).trim(),
        "3"
    );
    // Not in the file: falls back to the default
    assert_eq!(
        run_tc_ok(tmp.path(), "09:00", &["config", "get", "cockpit.task_list_limit"]).trim(),
        "30"
    );

    let stdout = run_tc_ok(tmp.path(), "09:00", &["config", "set", "cockpit.must_limit", "5"]);
    assert_eq!(stdout.trim(), "cockpit.must_limit = 5");

    let config = fs::read_to_string(tmp.path().join("chute.toml")).unwrap();
    assert!(config.starts_with("# test vault\n"));
    assert!(config.contains("must_limit = 5"));

    let (_, _, success) = run_tc(tmp.path(), "09:00", &["config", "set", "cockpit.must_limit", "many"]);
    assert!(!success);
}
