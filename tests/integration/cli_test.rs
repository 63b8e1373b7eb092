use std::process::Command;

fn run_opcheck(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_opcheck"))
        .args(args)
        .output()
        .expect("failed to execute opcheck")
}

#[test]
fn test_list_shows_catalog() {
    let output = run_opcheck(&["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("combine_byte_shl"));
    assert!(stdout.contains("shl_past_width"));
}

#[test]
fn test_run_proves_whole_catalog() {
    let output = run_opcheck(&["run", "--timeout", "120"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("0 disproved"));
    assert!(stdout.contains("0 inconclusive"));
}

#[test]
fn test_run_single_rule() {
    let output = run_opcheck(&["run", "combine_byte_shl"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("combine_byte_shl"));
    assert!(stdout.contains("1 proved"));
}

#[test]
fn test_run_unknown_rule_fails() {
    let output = run_opcheck(&["run", "no_such_rule"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown rule"));
}

#[test]
fn test_run_verbose_prints_preconditions() {
    let output = run_opcheck(&["run", "--verbose", "combine_byte_shl"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("require"));
    assert!(stdout.contains("ult(A, 0x20)"));
}

#[test]
fn test_run_quick_still_proves() {
    // The quick tier cannot refute a sound rule, so the solver still proves it
    let output = run_opcheck(&["run", "--quick", "mask_lowest_byte"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 proved"));
}
