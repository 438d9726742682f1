/// Tests for the command-line entry point.
///
/// These run in their own test binary because they change the process's
/// working directory to exercise local configuration lookup.
use extsort::cli::{OrganizeCommand, run_cli};
use extsort::config::LOCAL_CONFIG_FILE;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_organize_current_directory_keeps_local_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root = temp_dir.path();
    fs::write(root.join(LOCAL_CONFIG_FILE), "[categories]\nCODE = [\"rs\"]\n").unwrap();
    fs::write(root.join("lib.rs"), "pub fn lib() {}").unwrap();

    let original_dir = env::current_dir().expect("Failed to read current directory");
    env::set_current_dir(root).expect("Failed to change directory");

    let first = run_cli(
        OrganizeCommand::Organize {
            dir: PathBuf::from("."),
            dry_run: false,
        },
        None,
    );
    fs::write(root.join("main.rs"), "fn main() {}").unwrap();
    let second = run_cli(
        OrganizeCommand::Organize {
            dir: PathBuf::from("."),
            dry_run: false,
        },
        None,
    );

    env::set_current_dir(original_dir).expect("Failed to restore directory");

    first.expect("First run should succeed");
    second.expect("Second run should succeed");
    assert!(root.join(LOCAL_CONFIG_FILE).is_file());
    assert!(!root.join("OTHER").exists());
    assert!(root.join("CODE/RS/lib.rs").is_file());
    // The second run still sees the local table
    assert!(root.join("CODE/RS/main.rs").is_file());
}
