use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn pawnpkg(home: &Path, project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pawnpkg"))
        .args(args)
        .env("PAWNPKG_HOME", home)
        .env("PAWNPKG_PROJECT", project)
        .env_remove("PAWNPKG_MIRRORS")
        .env_remove("PAWNPKG_API_URL")
        .output()
        .expect("failed to run pawnpkg")
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempdir().unwrap();
    let out = pawnpkg(dir.path(), dir.path(), &["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for sub in ["install", "sweep", "list", "completions"] {
        assert!(stdout.contains(sub), "missing {sub} in help");
    }
}

#[test]
fn test_version() {
    let dir = tempdir().unwrap();
    let out = pawnpkg(dir.path(), dir.path(), &["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_list_empty_home() {
    let dir = tempdir().unwrap();
    let out = pawnpkg(&dir.path().join("home"), dir.path(), &["list"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("No packages installed"));
}

#[test]
fn test_invalid_identifier_fails_without_side_effects() {
    let dir = tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir(&project).unwrap();

    let out = pawnpkg(&dir.path().join("home"), &project, &["install", "owner//"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid identifier"));
    assert!(!project.join("pawn-package.json").exists());
    assert!(!project.join("plugins").exists());
}

#[test]
fn test_sweep_moves_loose_files() {
    let dir = tempdir().unwrap();
    let project = dir.path().join("project");
    let downloads = dir.path().join("downloads");
    std::fs::create_dir_all(downloads.join("nested")).unwrap();
    std::fs::write(downloads.join("nested/a_samp.inc"), "native x();").unwrap();
    std::fs::write(downloads.join("streamer.so"), "elf").unwrap();
    std::fs::write(downloads.join("notes.txt"), "keep").unwrap();

    let out = pawnpkg(
        &dir.path().join("home"),
        &project,
        &["sweep", downloads.to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    assert!(project.join("qawno/include/a_samp.inc").exists());
    assert!(project.join("plugins/streamer.so").exists());
    assert!(downloads.join("notes.txt").exists());
    assert!(!downloads.join("nested").exists());
}

#[test]
fn test_completions_bash() {
    let dir = tempdir().unwrap();
    let out = pawnpkg(dir.path(), dir.path(), &["completions", "bash"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("pawnpkg"));
}
