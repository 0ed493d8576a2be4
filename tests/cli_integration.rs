//! End-to-end tests for the `luna` binary.
//!
//! Each test runs the binary in a fresh assert_fs temp directory with HOME
//! pointed at a second temp directory, so no real user config is read.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A working directory plus an isolated home directory.
struct Sandbox {
    work: TempDir,
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            work: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        }
    }

    fn luna(&self) -> Command {
        let mut cmd = Command::cargo_bin("luna").unwrap();
        cmd.current_dir(self.work.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join("xdg"))
            .env_remove("LUNA_CONFIG");
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.luna().args(args).assert().success();
    }
}

#[test]
fn help_lists_commands() {
    Sandbox::new()
        .luna()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("commit"))
        .stdout(predicate::str::contains("diff"));
}

#[test]
fn init_and_reinit() {
    let sb = Sandbox::new();
    sb.luna()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("init luna repo at "));
    sb.work.child(".luna/metadata.json").assert(predicate::path::is_file());
    sb.work.child(".luna/versions").assert(predicate::path::is_dir());

    sb.luna()
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: already a luna repo"));
}

#[test]
fn commands_outside_repository_fail() {
    let sb = Sandbox::new();
    for args in [
        vec!["commit", "x"],
        vec!["log"],
        vec!["diff"],
        vec!["discard"],
    ] {
        sb.luna()
            .args(&args)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::starts_with("error: not a luna directory: "));
    }
}

#[test]
fn full_session() {
    let sb = Sandbox::new();
    sb.run(&["init"]);

    sb.luna()
        .arg("log")
        .assert()
        .success()
        .stdout("no commits, empty log\n");

    sb.work.child("notes.txt").write_str("line1\n").unwrap();
    sb.luna()
        .args(["commit", "first"])
        .assert()
        .success()
        .stdout("commit version 1\n");

    sb.work.child("notes.txt").write_str("line1\nline2\n").unwrap();
    sb.luna()
        .args(["commit", "second"])
        .assert()
        .success()
        .stdout("commit version 2\n");

    sb.luna()
        .args(["diff", "1", "2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Comparing version 1 and version 2\n"))
        .stdout(predicate::str::contains("+ line2"));

    sb.luna()
        .args(["revise", "1", "the very first"])
        .assert()
        .success()
        .stdout("revise version 1\n");

    sb.luna()
        .args(["view", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("message: the very first"));

    sb.luna()
        .args(["reset", "1"])
        .assert()
        .success()
        .stdout("reset to version 1\n");
    sb.work.child("notes.txt").assert("line1\n");

    sb.luna()
        .args(["delete", "2"])
        .assert()
        .success()
        .stdout("delete version 2\n");
    sb.work.child(".luna/versions/2").assert(predicate::path::missing());

    sb.luna()
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("version 1 (current)"))
        .stdout(predicate::str::contains("version 2").not());

    sb.luna()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("| delete version 2"));

    sb.luna()
        .args(["info", "num_versions"])
        .assert()
        .success()
        .stdout("\"2\"\n");

    sb.luna()
        .arg("discard")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("discard luna repo at "));
    sb.work.child(".luna").assert(predicate::path::missing());
    sb.work.child("notes.txt").assert(predicate::path::exists());
}

#[test]
fn unknown_versions_are_reported() {
    let sb = Sandbox::new();
    sb.run(&["init"]);
    sb.run(&["commit", "first"]);

    for args in [
        vec!["view", "7"],
        vec!["reset", "7"],
        vec!["delete", "7"],
        vec!["revise", "7", "msg"],
        vec!["diff", "1", "7"],
    ] {
        sb.luna()
            .args(&args)
            .assert()
            .failure()
            .stderr("error: unknown version: 7\n");
    }

    sb.luna()
        .args(["view", "abc"])
        .assert()
        .failure()
        .stderr("error: unknown version: abc\n");
}

#[test]
fn diff_single_file_modes() {
    let sb = Sandbox::new();
    sb.run(&["init"]);
    sb.work.child("a.txt").write_str("old\n").unwrap();
    sb.run(&["commit", "first"]);
    sb.work.child("a.txt").write_str("new\n").unwrap();
    sb.work.child("b.txt").write_str("fresh\n").unwrap();

    sb.luna()
        .args(["diff", "a.txt"])
        .assert()
        .success()
        .stdout(
            "diff file a.txt (version 1 (current version) -> working tree)\n- old\n+ new\n  \n",
        );

    sb.luna()
        .args(["diff", "-", "b.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "unique file b.txt (only in working tree)\n",
        ));

    sb.luna()
        .args(["diff", "--file", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found in either side: missing.txt"));
}

#[test]
fn quiet_suppresses_output() {
    let sb = Sandbox::new();
    sb.luna().args(["init", "--quiet"]).assert().success().stdout("");
    sb.luna()
        .args(["-q", "commit", "x"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn cwd_flag_selects_root() {
    let sb = Sandbox::new();
    let other = TempDir::new().unwrap();
    let other_path = other.path().to_string_lossy().into_owned();

    sb.run(&["--cwd", &other_path, "init"]);
    other.child(".luna/metadata.json").assert(predicate::path::is_file());
    sb.work.child(".luna").assert(predicate::path::missing());
}

#[test]
fn config_set_get_and_exclude() {
    let sb = Sandbox::new();
    sb.run(&["init"]);

    sb.luna()
        .args(["config", "set", "exclude", "build,dist"])
        .assert()
        .success()
        .stdout("Set exclude = build,dist\n");
    sb.luna()
        .args(["config", "get", "exclude"])
        .assert()
        .success()
        .stdout("build,dist\n");

    sb.work.child("src.txt").write_str("s").unwrap();
    sb.work.child("build/out.o").write_str("o").unwrap();
    sb.run(&["commit", "first"]);
    sb.work.child(".luna/versions/1/src.txt").assert(predicate::path::is_file());
    sb.work.child(".luna/versions/1/build").assert(predicate::path::missing());

    sb.luna()
        .args(["config", "set", "user", "alice", "--global"])
        .assert()
        .success();
    sb.luna()
        .args(["config", "get", "user"])
        .assert()
        .success()
        .stdout("alice\n");
    assert!(sb.home.path().join(".lunarc.toml").is_file());

    sb.luna()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("diff.hint_cutoff = 0.75"));
}

#[test]
fn config_rejects_bad_input() {
    let sb = Sandbox::new();

    // repository config needs a repository
    sb.luna()
        .args(["config", "set", "user", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a luna directory"));

    sb.run(&["init"]);
    sb.luna()
        .args(["config", "set", "trunk", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key: trunk"));
    sb.luna()
        .args(["config", "set", "diff.hint_cutoff", "7"])
        .assert()
        .failure();
    sb.luna()
        .args(["config", "set", "exclude", "x", "--global"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("can only be set in repository config"));
}

#[test]
fn completion_scripts() {
    let sb = Sandbox::new();
    for shell in ["bash", "zsh", "fish", "power-shell"] {
        sb.luna()
            .args(["completion", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("luna"));
    }
}
