//! Integration tests for the gate controller: envelopes, exit contract,
//! audit trail and configuration loading

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use safety_gate::audit::EventType;
use safety_gate::output::{EXIT_BLOCK, EXIT_ERROR, EXIT_OK};
use safety_gate::{
    HookOutput, InputError, JsonlAuditLog, MemoryAudit, PatternStore, RuleConfig, SafetyGate,
};
use tempfile::TempDir;

fn gate_from(store: PatternStore) -> (SafetyGate, Arc<MemoryAudit>) {
    let audit = Arc::new(MemoryAudit::new());
    (SafetyGate::new(store, Box::new(Arc::clone(&audit))), audit)
}

fn gate(toml: &str) -> (SafetyGate, Arc<MemoryAudit>) {
    gate_from(PatternStore::from_config(RuleConfig::from_toml_str(toml).unwrap()))
}

fn emit(output: &HookOutput) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    output.emit(&mut out, &mut err).unwrap();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Exit contract
// ============================================================================

#[test]
fn test_allow_is_silent_exit_zero() {
    let (gate, _) = gate("");
    let output = gate
        .handle_json(r#"{"tool":{"name":"Write","params":{"file_path":"/tmp/x","content":"hi"}}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_OK);
    assert_eq!(emit(&output), (String::new(), String::new()));
}

#[test]
fn test_block_writes_stderr_exit_two() {
    let (gate, _) = gate(
        r#"
        [[dangerousBashPatterns]]
        pattern = "rm -rf /"
        action = "block"
        message = "🚫 BLOCKED: wiping the root filesystem"
        "#,
    );
    let output = gate
        .handle_json(r#"{"tool":{"name":"Bash","params":{"command":"rm -rf / --no-preserve-root"}}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_BLOCK);

    let (out, err) = emit(&output);
    assert!(out.is_empty());
    assert_eq!(err, "🚫 BLOCKED: wiping the root filesystem\n");
}

#[test]
fn test_ask_writes_json_exit_zero() {
    let (gate, _) = gate(
        r#"
        [fileSizeLimits]
        maxWriteSize = 1000
        warnOnLargeWrite = 500
        "#,
    );
    let json = format!(
        r#"{{"tool":{{"name":"Write","params":{{"file_path":"/tmp/y","content":"{}"}}}}}}"#,
        "a".repeat(700)
    );
    let output = gate.handle_json(&json).unwrap();
    assert_eq!(output.exit_code(), EXIT_OK);

    let (out, err) = emit(&output);
    assert!(err.is_empty());
    let payload: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(payload["action"], "ask");
    assert_eq!(payload["file"], "/tmp/y");
    assert_eq!(payload["rule"], "large-write");
    assert_eq!(
        payload["message"],
        "⚠️  Large file warning: Writing 700 bytes. Are you sure?"
    );
}

#[test]
fn test_malformed_envelope_is_an_error_not_a_verdict() {
    let (gate, audit) = gate(r#"zeroAccessPaths = ["~/.ssh/*"]"#);

    for input in ["", "   ", "{\"tool\":", "[]", "null"] {
        let err = gate.handle_json(input).unwrap_err();
        let output = HookOutput::Error(format!("Error: {}", err));
        assert_eq!(output.exit_code(), EXIT_ERROR, "input {:?}", input);
    }
    assert!(matches!(gate.handle_json(""), Err(InputError::Empty)));
    assert!(audit.records().is_empty());
}

#[test]
fn test_foreign_tools_pass_through() {
    let (gate, audit) = gate(r#"zeroAccessPaths = ["~/.ssh/*"]"#);
    let output = gate
        .handle_json(r#"{"tool":{"name":"Glob","params":{"pattern":"~/.ssh/*"}}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_OK);
    assert!(audit.records().is_empty());
}

// ============================================================================
// Zero-access across every operation kind
// ============================================================================

#[test]
fn test_zero_access_blocks_every_kind() {
    let (gate, audit) = gate(r#"zeroAccessPaths = ["~/.ssh/*"]"#);
    let envelopes = [
        r#"{"tool":{"name":"Bash","params":{"command":"cat ~/.ssh/id_rsa"}}}"#,
        r#"{"tool":{"name":"Edit","params":{"file_path":"~/.ssh/id_rsa","new_string":"x"}}}"#,
        r#"{"tool":{"name":"Write","params":{"file_path":"~/.ssh/id_rsa","content":"x"}}}"#,
        r#"{"tool_name":"Read","tool_input":{"file_path":"~/.ssh/id_rsa"}}"#,
    ];

    for envelope in envelopes {
        let output = gate.handle_json(envelope).unwrap();
        assert_eq!(output.exit_code(), EXIT_BLOCK, "{}", envelope);
        let (_, err) = emit(&output);
        assert!(err.contains("credentials/secrets"), "{}", err);
    }

    let events: Vec<EventType> = audit.records().iter().map(|r| r.event).collect();
    assert_eq!(events, vec![EventType::BlockedPath; 4]);
}

#[test]
fn test_same_request_same_verdict() {
    let (gate, _) = gate(
        r#"
        readOnlyPaths = ["/etc/*"]

        [[dangerousBashPatterns]]
        pattern = "sudo"
        action = "ask"
        "#,
    );
    let json = r#"{"tool":{"name":"Bash","params":{"command":"sudo tee /etc/gate-test"}}}"#;
    let first = emit(&gate.handle_json(json).unwrap());
    let second = emit(&gate.handle_json(json).unwrap());
    assert_eq!(first, second);
}

// ============================================================================
// Configuration loading
// ============================================================================

#[test]
fn test_missing_config_fails_open() {
    let dir = TempDir::new().unwrap();
    let store = PatternStore::open(Some(dir.path().join("absent.toml")));
    let (gate, audit) = gate_from(store);

    let output = gate
        .handle_json(r#"{"tool":{"name":"Write","params":{"file_path":"/tmp/x","content":"hi"}}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_OK);

    // Defaults keep logging on, so the allow is still recorded.
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file.as_deref(), Some("/tmp/x"));
}

#[test]
fn test_corrupt_config_fails_open() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "patterns.toml", "zeroAccessPaths = [unterminated");
    let (gate, _) = gate_from(PatternStore::open(Some(path)));

    let output = gate
        .handle_json(r#"{"tool":{"name":"Bash","params":{"command":"cat ~/.ssh/id_rsa"}}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_OK);
}

#[test]
fn test_yaml_patterns_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "patterns.yaml",
        r#"
zeroAccessPaths:
  - "~/.ssh/*"
dangerousBashPatterns:
  - pattern: 'git\s+reset\s+--hard'
    action: ask
    description: Discards local changes
fileSizeLimits:
  maxWriteSize: 2000
  warnOnLargeWrite: 1000
"#,
    );
    let (gate, _) = gate_from(PatternStore::open(Some(path)));

    let output = gate
        .handle_json(r#"{"tool":{"name":"Bash","params":{"command":"git reset --hard HEAD~1"}}}"#)
        .unwrap();
    let (out, _) = emit(&output);
    let payload: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(payload["pattern"], "Discards local changes");
    assert_eq!(payload["command"], "git reset --hard HEAD~1");
}

#[test]
fn test_reload_swaps_whole_config() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "patterns.toml", r#"readOnlyPaths = ["/etc/*"]"#);
    let store = PatternStore::open(Some(path.clone()));
    let before = store.snapshot();
    assert_eq!(before.read_only_paths, vec!["/etc/*".to_string()]);

    fs::write(&path, r#"zeroAccessPaths = ["/vault/*"]"#).unwrap();
    store.reload().unwrap();
    let after = store.snapshot();
    assert!(after.read_only_paths.is_empty());
    assert_eq!(after.zero_access_paths, vec!["/vault/*".to_string()]);

    // Snapshots taken earlier are unaffected.
    assert_eq!(before.read_only_paths.len(), 1);

    // The gate picks up the new snapshot on its next evaluation.
    let (gate, _) = gate_from(store);
    let output = gate
        .handle_json(r#"{"tool_name":"Read","tool_input":{"file_path":"/vault/token"}}"#)
        .unwrap();
    assert_eq!(output.exit_code(), EXIT_BLOCK);
    let store = gate.store();

    // A broken file keeps the last good configuration.
    fs::write(&path, "zeroAccessPaths = 3").unwrap();
    assert!(store.reload().is_err());
    assert_eq!(store.snapshot().zero_access_paths, vec!["/vault/*".to_string()]);
}

// ============================================================================
// Audit log
// ============================================================================

#[test]
fn test_jsonl_audit_trail() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs/safety.log");
    let store = PatternStore::from_config(
        RuleConfig::from_toml_str(r#"zeroAccessPaths = ["~/.ssh/*"]"#).unwrap(),
    );
    let gate = SafetyGate::new(store, Box::new(JsonlAuditLog::new(&log_path)));

    gate.handle_json(r#"{"tool":{"name":"Bash","params":{"command":"ls"}}}"#)
        .unwrap();
    gate.handle_json(r#"{"tool":{"name":"Edit","params":{"file_path":"~/.ssh/config","new_string":"x"}}}"#)
        .unwrap();

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["type"], "ALLOWED");
    assert_eq!(lines[0]["command"], "ls");
    assert_eq!(lines[0]["action"], "allow");

    assert_eq!(lines[1]["type"], "BLOCKED_PATH");
    assert_eq!(lines[1]["file"], "~/.ssh/config");
    assert_eq!(lines[1]["action"], "block");
    assert!(lines[1]["timestamp"].is_string());
}

#[test]
fn test_unwritable_log_never_changes_verdict() {
    let dir = TempDir::new().unwrap();
    // The log path is an existing directory; appends fail.
    let store = PatternStore::from_config(
        RuleConfig::from_toml_str(r#"zeroAccessPaths = ["~/.ssh/*"]"#).unwrap(),
    );
    let gate = SafetyGate::new(store, Box::new(JsonlAuditLog::new(dir.path())));

    let blocked = gate
        .handle_json(r#"{"tool":{"name":"Bash","params":{"command":"cat ~/.ssh/id_rsa"}}}"#)
        .unwrap();
    assert_eq!(blocked.exit_code(), EXIT_BLOCK);

    let allowed = gate
        .handle_json(r#"{"tool":{"name":"Bash","params":{"command":"ls"}}}"#)
        .unwrap();
    assert_eq!(allowed.exit_code(), EXIT_OK);
}

#[test]
fn test_ask_is_recorded_even_without_logging() {
    let (gate, audit) = gate(
        r#"
        [[dangerousEditPatterns]]
        pattern = "DROP TABLE"
        action = "ask"

        [safetySettings]
        enableLogging = false
        "#,
    );
    gate.handle_json(r#"{"tool":{"name":"Edit","params":{"file_path":"/tmp/m.sql","new_string":"drop table users;"}}}"#)
        .unwrap();
    gate.handle_json(r#"{"tool":{"name":"Edit","params":{"file_path":"/tmp/m.sql","new_string":"select 1;"}}}"#)
        .unwrap();

    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, EventType::AskUser);
}
