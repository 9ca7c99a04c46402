use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use changeorder_cli::commands::run::RunArgs;
use changeorder_cli::commands::{config, migrate, run};
use changeorder_core::config::LoadOptions;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    let url = sqlite_url(&dir);
    with_env(&[("CHANGEORDER_DRAFTS_URL", url.as_str())], || {
        let result = migrate::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("CHANGEORDER_DRAFTS_URL", "postgres://localhost/drafts")], || {
        let result = migrate::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_env_and_default_sources() {
    with_env(&[("CHANGEORDER_MAX_OPPORTUNITIES", "4"), ("CHANGEORDER_LOG_LEVEL", "debug")], || {
        let result = config::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let output = result.output;
        assert!(output.starts_with("effective config (source precedence: env > file > default):"));
        assert!(output.contains(
            "- wizard.max_opportunities = 4 (source: env (CHANGEORDER_MAX_OPPORTUNITIES))"
        ));
        assert!(output.contains("- logging.level = debug (source: env (CHANGEORDER_LOG_LEVEL))"));
        assert!(output.contains(
            "- wizard.line_item_change_types = changeProduct,changePrice (source: default)"
        ));
    });
}

#[test]
fn config_reports_file_source() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("changeorder.toml");
    fs::write(&path, "[wizard]\nheader_text = \"Amend Contract\"\n").expect("write config");

    with_env(&[], || {
        let options = LoadOptions { config_path: Some(path.clone()), ..LoadOptions::default() };
        let result = config::run(&options);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains(&format!(
            "- wizard.header_text = Amend Contract (source: file ({}))",
            path.display()
        )));
    });
}

#[test]
fn run_replays_sample_script_and_submits() {
    let dir = TempDir::new().expect("temp dir");
    let url = sqlite_url(&dir);
    with_env(&[("CHANGEORDER_DRAFTS_URL", url.as_str())], || {
        let args = RunArgs {
            fixture: fixture_path("sample_fixture.json"),
            script: Some(fixture_path("sample_script.json")),
            record_id: None,
            account_id: None,
            preselected: Vec::new(),
        };
        let result = run::run(&LoadOptions::default(), &args);
        let payload = parse_payload(&result.output);
        assert_eq!(result.exit_code, 0, "unexpected report: {payload}");

        assert_eq!(payload["command"], "run");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["contractId"], "a00000000000001AAA");
        assert_eq!(payload["wizardStatus"], "submitted");
        assert_eq!(payload["navigations"][0]["kind"], "viewRecord");
        assert_eq!(payload["navigations"][0]["recordId"], "a00000000000001AAA");

        let audit_events = payload["auditEvents"].as_array().expect("audit events");
        assert!(audit_events.iter().any(|event| event == "wizard.draft_saved"));
        assert!(audit_events.iter().any(|event| event == "wizard.draft_discarded"));
    });
}

#[test]
fn run_reports_wizard_failures_with_exit_code() {
    let dir = TempDir::new().expect("temp dir");
    let url = sqlite_url(&dir);
    let script = dir.path().join("script.json");
    fs::write(
        &script,
        r#"[
            {"action": "toggleOpportunity", "id": "006000000000001AAA"},
            {"action": "toggleChangeType", "changeType": "changeTerm"},
            {"action": "next"},
            {"action": "confirm"},
            {"action": "submit"}
        ]"#,
    )
    .expect("write script");

    with_env(&[("CHANGEORDER_DRAFTS_URL", url.as_str())], || {
        let args = RunArgs {
            fixture: fixture_path("sample_fixture.json"),
            script: Some(script.clone()),
            record_id: Some("001000000000001AAA".to_owned()),
            account_id: None,
            preselected: Vec::new(),
        };
        let result = run::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["finalStep"], 3);
        assert_eq!(payload["actions"][2]["ok"], true);
        let last = &payload["actions"][4];
        assert_eq!(last["action"], "submit");
        assert_eq!(last["ok"], false);
        assert!(last["message"].as_str().unwrap_or_default().contains("Term Length is required"));
    });
}

#[test]
fn run_rejects_missing_fixture() {
    with_env(&[], || {
        let args = RunArgs {
            fixture: PathBuf::from("does/not/exist.json"),
            script: None,
            record_id: None,
            account_id: None,
            preselected: Vec::new(),
        };
        let result = run::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 6);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
        assert!(payload["message"].as_str().unwrap_or_default().contains("could not read fixture"));
    });
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("drafts.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CHANGEORDER_PRODUCT_GRID_ENABLED",
        "CHANGEORDER_EMBEDDED_IN_HOST",
        "CHANGEORDER_MAX_OPPORTUNITIES",
        "CHANGEORDER_LINE_ITEM_CHANGE_TYPES",
        "CHANGEORDER_PRICE_CHANGE_WARNING_PCT",
        "CHANGEORDER_HEADER_TEXT",
        "CHANGEORDER_DRAFTS_URL",
        "CHANGEORDER_DRAFTS_MAX_CONNECTIONS",
        "CHANGEORDER_DRAFTS_TIMEOUT_SECS",
        "CHANGEORDER_LOGGING_LEVEL",
        "CHANGEORDER_LOGGING_FORMAT",
        "CHANGEORDER_LOG_LEVEL",
        "CHANGEORDER_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
