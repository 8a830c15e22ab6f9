use std::{
    path::Path,
    process::{Command, Output},
};

/// Runs the binary from `dir`, isolated from any config the caller's env points at.
fn school_result(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_school-result"))
        .current_dir(dir)
        .env_remove("DEPLOYER_CONFIG")
        .env_remove("NETWORK")
        .env_remove("ARTIFACTS_DIR")
        .env("LOG_FILTER", "info")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_unknown_network_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();

    let output = school_result(dir.path(), &["--network", "nope", "deploy"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown network 'nope'"), "stderr: {stderr}");
}

#[test]
fn test_missing_artifact_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = dir.path().join("artifacts");
    std::fs::create_dir(&artifacts).unwrap();

    // the local network's chain id and accounts are known, so no node is contacted
    let output = school_result(
        dir.path(),
        &["--artifacts", artifacts.to_str().unwrap(), "deploy"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Artifact for contract 'SchoolResult' not found"),
        "stderr: {stderr}"
    );
}
