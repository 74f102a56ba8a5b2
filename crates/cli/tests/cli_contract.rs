// Contract tests for the `ledgerlink` binary: exit codes, --json stdout,
// and the account -> reconcile -> history flow.
//
// Every test runs in its own config and data directories, so nothing
// touches the real settings, auth token or database.
//
// Run with: cargo test -p ledgerlink-cli --test cli_contract -- --nocapture

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const PASSWORD: &str = "correct-horse";

struct Sandbox {
    config: TempDir,
    data: TempDir,
    files: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            config: tempfile::tempdir().unwrap(),
            data: tempfile::tempdir().unwrap(),
            files: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ledgerlink"));
        cmd.env("LEDGERLINK_CONFIG_DIR", self.config.path())
            .env("LEDGERLINK_DATA_DIR", self.data.path())
            .env_remove("LEDGERLINK_TOKEN")
            .env_remove("LEDGERLINK_PASSWORD")
            .env_remove("LEDGERLINK_OPENAI_KEY")
            .env_remove("LEDGERLINK_GEMINI_KEY")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().expect("run ledgerlink")
    }

    fn signup(&self) {
        let out = self
            .cmd()
            .args(["signup", "--email", "ada@example.com", "--name", "Ada Lovelace"])
            .env("LEDGERLINK_PASSWORD", PASSWORD)
            .output()
            .unwrap();
        assert_success(&out);
    }

    fn write_settings(&self, settings: Value) {
        std::fs::write(self.config.path().join("settings.json"), settings.to_string()).unwrap();
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.files.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "exit code: {:?}\nstderr: {}",
        out.status,
        String::from_utf8_lossy(&out.stderr)
    );
}

fn assert_exit(out: &Output, code: i32) {
    assert_eq!(
        out.status.code(),
        Some(code),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

/// Stdout must be exactly one JSON value.
fn stdout_json(out: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&out.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {}\n{}", e, stdout))
}

fn path_arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

// ===========================================================================
// Accounts
// ===========================================================================

#[test]
fn signup_whoami_logout() {
    let sb = Sandbox::new();
    sb.signup();
    assert!(sb.config.path().join("auth.json").exists());

    let out = sb.run(&["whoami", "--json"]);
    assert_success(&out);
    let account = stdout_json(&out);
    assert_eq!(account["email"], "ada@example.com");
    assert_eq!(account["full_name"], "Ada Lovelace");

    assert_success(&sb.run(&["logout"]));
    assert!(!sb.config.path().join("auth.json").exists());
    assert_exit(&sb.run(&["whoami"]), 20);
}

#[test]
fn signup_reads_password_and_confirmation_from_stdin() {
    let sb = Sandbox::new();
    let mut child = sb
        .cmd()
        .args(["signup", "--email", "grace@example.com", "--name", "Grace"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"password1\npassword2\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert_exit(&out, 21);
    assert!(String::from_utf8_lossy(&out.stderr).contains("passwords do not match"));
}

#[test]
fn duplicate_email_is_account_error() {
    let sb = Sandbox::new();
    sb.signup();
    let out = sb
        .cmd()
        .args(["signup", "--email", "ADA@example.com", "--name", "Other"])
        .env("LEDGERLINK_PASSWORD", PASSWORD)
        .output()
        .unwrap();
    assert_exit(&out, 21);
}

#[test]
fn login_with_wrong_password() {
    let sb = Sandbox::new();
    sb.signup();
    assert_success(&sb.run(&["logout"]));

    let out = sb
        .cmd()
        .args(["login", "--email", "ada@example.com", "--password", "not-the-password"])
        .output()
        .unwrap();
    assert_exit(&out, 21);

    let out = sb
        .cmd()
        .args(["login", "--email", "ada@example.com", "--json"])
        .env("LEDGERLINK_PASSWORD", PASSWORD)
        .output()
        .unwrap();
    assert_success(&out);
    assert_eq!(stdout_json(&out)["email"], "ada@example.com");
}

#[test]
fn token_env_overrides_saved_session() {
    let sb = Sandbox::new();
    sb.signup();
    let out = sb.cmd().arg("whoami").env("LEDGERLINK_TOKEN", "bogus").output().unwrap();
    assert_exit(&out, 20);
}

// ===========================================================================
// Reconcile: failures before any AI call
// ===========================================================================

#[test]
fn reconcile_requires_login() {
    let sb = Sandbox::new();
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n");
    let out = sb.run(&["reconcile", path_arg(&a), path_arg(&a)]);
    assert_exit(&out, 20);
}

#[test]
fn reconcile_with_ai_disabled() {
    let sb = Sandbox::new();
    sb.signup();
    sb.write_settings(json!({"ai": {"provider": "none"}}));
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n");

    let out = sb.run(&["reconcile", path_arg(&a), path_arg(&a)]);
    assert_exit(&out, 10);
}

#[test]
fn reconcile_with_missing_key() {
    let sb = Sandbox::new();
    sb.signup();
    sb.write_settings(json!({"ai": {"provider": "openai"}}));
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n");

    let out = sb.run(&["reconcile", path_arg(&a), path_arg(&a)]);
    assert_exit(&out, 11);
}

#[test]
fn reconcile_unsupported_input() {
    let sb = Sandbox::new();
    sb.signup();
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n");
    let pdf = sb.file("statement.pdf", "%PDF-1.4");

    let out = sb.run(&["reconcile", path_arg(&a), path_arg(&pdf)]);
    assert_exit(&out, 3);
}

#[test]
fn reconcile_rejects_zero_window() {
    let sb = Sandbox::new();
    sb.signup();
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n");
    let out = sb.run(&["reconcile", path_arg(&a), path_arg(&a), "--window", "0"]);
    assert_exit(&out, 2);
}

// ===========================================================================
// Reconcile against a mock OpenAI-compatible server
// ===========================================================================

fn openai_sandbox(server: &MockServer) -> Sandbox {
    let sb = Sandbox::new();
    sb.signup();
    sb.write_settings(json!({
        "ai": {"provider": "openai", "endpoint": server.base_url(), "timeout_secs": 10}
    }));
    sb
}

fn reconcile_with_key(sb: &Sandbox, args: &[&str]) -> Output {
    sb.cmd()
        .arg("reconcile")
        .args(args)
        .env("LEDGERLINK_OPENAI_KEY", "sk-test")
        .output()
        .unwrap()
}

#[test]
fn reconcile_end_to_end() {
    let server = MockServer::start();
    let content = json!({
        "matches": [{
            "file_a_entry": {"Date": "01/02/2024", "Amount": "100.00", "Ref": "INV-1"},
            "file_b_entry": {"Posted": "02/02/2024", "Value": "100.00", "Memo": "Payment INV-1"},
            "confidence_score": 0.92,
            "match_reason": "Same amount and invoice number"
        }]
    })
    .to_string();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("Authorization", "Bearer sk-test")
            .body_includes("INV-2");
        then.status(200)
            .json_body(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}));
    });

    let sb = openai_sandbox(&server);
    let a = sb.file("bank.csv", "Date,Amount,Ref\n01/02/2024,100.00,INV-1\n03/02/2024,55.10,INV-2\n");
    let b = sb.file("ledger.csv", "Posted,Value,Memo\n02/02/2024,100.00,Payment INV-1\n");
    let report_path = sb.files.path().join("report.json");

    let out = reconcile_with_key(&sb, &[path_arg(&a), path_arg(&b), "--json", "--output", path_arg(&report_path)]);
    assert_success(&out);
    mock.assert();

    let report = stdout_json(&out);
    assert_eq!(report["summary"]["matches"], 1);
    assert_eq!(report["summary"]["unmatched_a"], 1);
    assert_eq!(report["summary"]["unmatched_b"], 0);
    assert_eq!(report["result"]["unmatched_file_a_entries"][0]["Ref"], "INV-2");
    assert_eq!(report["meta"]["units"]["planned"], 1);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written, report);

    // Saved to history
    let out = sb.run(&["history", "--json"]);
    assert_success(&out);
    let history = stdout_json(&out);
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["result"]["summary"]["matches"], 1);
    assert!(entries[0].get("dataset_a").is_none());

    let id = entries[0]["id"].as_str().unwrap().to_string();
    let out = sb.run(&["history", "--show", &id, "--json"]);
    assert_success(&out);
    let record = stdout_json(&out);
    assert_eq!(record["dataset_a"].as_array().unwrap().len(), 2);
    assert_eq!(record["dataset_b"][0]["Memo"], "Payment INV-1");

    // --no-save leaves history alone
    let out = reconcile_with_key(&sb, &[path_arg(&a), path_arg(&b), "--no-save"]);
    assert_success(&out);
    assert_eq!(stdout_json(&sb.run(&["history", "--json"])).as_array().unwrap().len(), 1);
}

#[test]
fn every_call_failing_exits_40_but_still_reports() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST);
        then.status(500).json_body(json!({"error": {"message": "upstream exploded"}}));
    });

    let sb = openai_sandbox(&server);
    let a = sb.file("a.csv", "Date,Amount\n01/01/2024,10\n02/01/2024,20\n");
    let b = sb.file("b.csv", "Date,Amount\n01/01/2024,10\n");

    let out = reconcile_with_key(&sb, &[path_arg(&a), path_arg(&b), "--json"]);
    assert_exit(&out, 40);

    let report = stdout_json(&out);
    assert_eq!(report["summary"]["matches"], 0);
    assert_eq!(report["summary"]["unmatched_a"], 2);
    assert_eq!(report["summary"]["unmatched_b"], 1);
    assert_eq!(report["meta"]["units"]["failed"], 1);

    let history = stdout_json(&sb.run(&["history", "--json"]));
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn history_show_unknown_id() {
    let sb = Sandbox::new();
    sb.signup();
    assert_exit(&sb.run(&["history", "--show", "nope"]), 2);
}

#[test]
fn history_human_output_lists_and_shows_a_run() {
    let server = MockServer::start();
    let content = json!({
        "matches": [{
            "file_a_entry": {"Date": "01/02/2024", "Amount": "100.00", "Ref": "INV-1"},
            "file_b_entry": {"Posted": "02/02/2024", "Value": "100.00", "Memo": "Payment INV-1"},
            "confidence_score": 0.92,
            "match_reason": "Same amount and invoice number"
        }]
    })
    .to_string();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}));
    });

    let sb = openai_sandbox(&server);
    let a = sb.file("bank.csv", "Date,Amount,Ref\n01/02/2024,100.00,INV-1\n03/02/2024,55.10,INV-2\n");
    let b = sb.file("ledger.csv", "Posted,Value,Memo\n02/02/2024,100.00,Payment INV-1\n");
    assert_success(&reconcile_with_key(&sb, &[path_arg(&a), path_arg(&b)]));

    let out = sb.run(&["history"]);
    assert_success(&out);
    let listing = String::from_utf8_lossy(&out.stdout).to_string();
    let id = listing.split_whitespace().next().unwrap().to_string();
    assert!(listing.contains("A:2 B:1"), "{}", listing);
    assert!(listing.contains("matched:1"), "{}", listing);

    let out = sb.run(&["history", "--show", &id]);
    assert_success(&out);
    let shown = String::from_utf8_lossy(&out.stdout);
    assert!(shown.starts_with(&id), "{}", shown);
    assert!(shown.contains("2 x 1 records, 1 match(es)"), "{}", shown);
    assert!(shown.contains("0.92  Same amount and invoice number"), "{}", shown);
}

// ===========================================================================
// ai doctor
// ===========================================================================

#[test]
fn ai_doctor_disabled_json() {
    let sb = Sandbox::new();
    sb.write_settings(json!({"ai": {"provider": "none"}}));
    let out = sb.run(&["ai", "doctor", "--json"]);
    assert_exit(&out, 10);
    let diag = stdout_json(&out);
    assert_eq!(diag["status"], "disabled");
    assert_eq!(diag["schema_version"], 1);
}

#[test]
fn ai_doctor_ready_with_env_key() {
    let sb = Sandbox::new();
    let out = sb
        .cmd()
        .args(["ai", "doctor", "--json"])
        .env("LEDGERLINK_GEMINI_KEY", "g-test")
        .output()
        .unwrap();
    assert_success(&out);
    let diag = stdout_json(&out);
    assert_eq!(diag["provider"], "gemini");
    assert_eq!(diag["model"], "gemini-1.5-flash");
    assert_eq!(diag["key"], "present");

    // First run writes the commented default settings file
    assert!(sb.config.path().join("settings.json").exists());
}
