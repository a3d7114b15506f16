use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todosync-{nanos}-{file_name}"))
}

fn run_interactive(input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_todosync");

    let mut child = Command::new(exe)
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_ANON_KEY", "anon")
        .env("TODOSYNC_CONFIG_PATH", temp_path("missing-config.json"))
        .env("TODOSYNC_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

#[test]
fn interactive_startup_shows_loading_then_error_banner() {
    let output = run_interactive("exit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let loading = stdout.find("Loading tasks...").expect("loading line");
    let banner = stdout.find("Error: network error").expect("error banner");
    assert!(loading < banner);
    assert!(!stdout.contains("No tasks yet"));
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_question_mark_shows_usage() {
    let output = run_interactive("?\nquit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let output = run_interactive("nope\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_toggle_of_unknown_task_is_rejected() {
    let output = run_interactive("toggle 42\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - task not found"));
}

#[test]
fn interactive_failed_add_keeps_session_alive() {
    let output = run_interactive("add \"clean house\"\nadd \"   \"\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Added task"));
    assert!(stdout.matches("Error: network error").count() >= 2);
}

#[test]
fn interactive_session_ends_at_eof() {
    let output = run_interactive("");
    assert!(output.status.success());
}

#[test]
fn interactive_rejects_startup_only_flags() {
    let output = run_interactive("list --verbose\nlist --config-override table=other\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr
            .matches("ERROR: invalid_input - --verbose and --config-override only apply")
            .count(),
        2
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Loading tasks...").count(), 1);
}
