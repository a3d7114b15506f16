use std::process::Command;

#[test]
fn cli_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_todosync");
    let output = Command::new(exe)
        .arg("--help")
        .env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .output()
        .expect("failed to run todosync --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("toggle"));
}

#[test]
fn unknown_subcommand_is_invalid_input() {
    let exe = env!("CARGO_BIN_EXE_todosync");
    let output = Command::new(exe)
        .arg("nope")
        .output()
        .expect("failed to run todosync nope");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
