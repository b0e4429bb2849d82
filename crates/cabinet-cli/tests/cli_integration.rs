use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

struct CliFixture {
    tmp: TempDir,
    home_dir: PathBuf,
    store_dir: PathBuf,
}

impl CliFixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let home_dir = tmp.path().join("home");
        let store_dir = tmp.path().join("store");
        std::fs::create_dir_all(&home_dir).unwrap();
        Self {
            tmp,
            home_dir,
            store_dir,
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cabinet"));
        cmd.arg("--root").arg(&self.store_dir);
        cmd.args(args);
        cmd.current_dir(self.tmp.path());
        cmd.env("HOME", &self.home_dir);
        cmd.env("XDG_CONFIG_HOME", self.home_dir.join(".config"));
        cmd.env_remove("CABINET_CONFIG");
        cmd.env("NO_COLOR", "1");
        cmd.output().unwrap()
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "command failed: {:?}\nstdout:\n{}\nstderr:\n{}",
                args,
                stdout(&output),
                stderr(&output)
            );
        }
        stdout(&output)
    }

    fn run_err(&self, args: &[&str]) -> (String, String) {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "command unexpectedly succeeded: {:?}\nstdout:\n{}\nstderr:\n{}",
            args,
            stdout(&output),
            stderr(&output)
        );
        (stdout(&output), stderr(&output))
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_game(dir: &Path, name: &str, author: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("game.json"),
        format!(r#"{{"name": "{name}", "author": "{author}", "language": "python"}}"#),
    )
    .unwrap();
    std::fs::write(dir.join("main.py"), "print('hi')\n").unwrap();
}

#[test]
fn install_list_and_info() {
    let fx = CliFixture::new();
    write_game(&fx.path("src/tetris"), "Tetris", "Ann");

    let out = fx.run_ok(&["install", fx.path("src/tetris").to_str().unwrap()]);
    assert!(out.contains("tetris-ann"), "{out}");

    let list = fx.run_ok(&["list"]);
    assert!(list.contains("tetris-ann"), "{list}");
    assert!(list.contains("Tetris"), "{list}");

    let info = fx.run_ok(&["info"]);
    assert!(info.contains("Games"), "{info}");
    assert!(fx.store_dir.join("index.json").is_file());
    assert!(fx.store_dir.join("backups/tetris-ann.tar.gz").is_file());
}

#[test]
fn collections_require_flag() {
    let fx = CliFixture::new();
    write_game(&fx.path("bundle/a"), "Alpha", "Ann");
    write_game(&fx.path("bundle/b"), "Beta", "Bo");
    let bundle = fx.path("bundle");

    let (_, err) = fx.run_err(&["install", bundle.to_str().unwrap()]);
    assert!(err.contains("--collection"), "{err}");

    let out = fx.run_ok(&["install", "--collection", bundle.to_str().unwrap()]);
    assert!(out.contains("alpha-ann"), "{out}");
    assert!(out.contains("beta-bo"), "{out}");
}

#[test]
fn uninstall_needs_confirmation_and_restore_brings_it_back() {
    let fx = CliFixture::new();
    write_game(&fx.path("src/snake"), "Snake", "Ann");
    fx.run_ok(&["install", fx.path("src/snake").to_str().unwrap()]);

    let (_, err) = fx.run_err(&["uninstall", "snake"]);
    assert!(err.contains("--yes"), "{err}");
    assert!(fx.store_dir.join("live/snake-ann").is_dir());

    fx.run_ok(&["uninstall", "snake", "--keep-backup", "--yes"]);
    assert!(!fx.store_dir.join("live/snake-ann").exists());

    let backups = fx.run_ok(&["backups"]);
    assert!(backups.contains("snake-ann"), "{backups}");

    let out = fx.run_ok(&["restore", "1"]);
    assert!(out.contains("snake-ann"), "{out}");
    assert!(fx.store_dir.join("live/snake-ann/main.py").is_file());

    let (_, err) = fx.run_err(&["restore", "snake-ann"]);
    assert!(err.contains("already installed"), "{err}");
}

#[test]
fn export_and_sync() {
    let fx = CliFixture::new();
    write_game(&fx.path("src/pong"), "Pong", "Cy");
    fx.run_ok(&[
        "install",
        "--no-backup",
        fx.path("src/pong").to_str().unwrap(),
    ]);

    let out = fx.run_ok(&["sync"]);
    assert!(out.contains("1 created"), "{out}");
    let out = fx.run_ok(&["sync"]);
    assert!(out.contains("up to date"), "{out}");

    let dest = fx.path("exports");
    fx.run_ok(&["batch-export", dest.to_str().unwrap()]);
    assert!(dest.join("pong-cy.tar.gz").is_file());

    fx.run_ok(&["export", "pong", "--dir", "-o", dest.to_str().unwrap()]);
    assert!(dest.join("pong-cy/main.py").is_file());
}

#[test]
fn init_scaffolds_a_manifest() {
    let fx = CliFixture::new();
    let dir = fx.path("fresh");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("game.lua"), "print(1)\n").unwrap();

    fx.run_ok(&["init", dir.to_str().unwrap(), "--name", "Fresh", "--author", "Di"]);
    let manifest = std::fs::read_to_string(dir.join("game.json")).unwrap();
    assert!(manifest.contains("\"language\": \"lua\""), "{manifest}");

    let (_, err) = fx.run_err(&["init", dir.to_str().unwrap(), "--name", "Again"]);
    assert!(err.contains("already exists"), "{err}");

    let out = fx.run_ok(&["install", dir.to_str().unwrap()]);
    assert!(out.contains("fresh-di"), "{out}");
}

#[test]
fn dedupe_removes_identical_games() {
    let fx = CliFixture::new();
    write_game(&fx.path("one"), "Maze", "Ed");
    write_game(&fx.path("two"), "Maze", "Ed");
    fx.run_ok(&["install", fx.path("one").to_str().unwrap()]);
    fx.run_ok(&["install", fx.path("two").to_str().unwrap()]);

    let out = fx.run_ok(&["dedupe", "--yes"]);
    assert!(out.contains("Removed 1"), "{out}");
    let list = fx.run_ok(&["list"]);
    assert!(list.contains("maze-ed"), "{list}");
    assert!(!list.contains("maze-ed-1"), "{list}");
}

#[test]
fn config_file_is_generated_and_validated() {
    let fx = CliFixture::new();
    let path = fx.path("conf/cabinet.yaml");
    fx.run_ok(&["config", "--dest", path.to_str().unwrap()]);
    assert!(path.is_file());
    fx.run_ok(&["-c", path.to_str().unwrap(), "list"]);

    let bad = fx.path("bad.yaml");
    std::fs::write(&bad, "store:\n  rooot: /tmp\n").unwrap();
    let (_, err) = fx.run_err(&["-c", bad.to_str().unwrap(), "list"]);
    assert!(err.starts_with("Error:"), "{err}");
}

#[test]
fn unknown_unit_is_an_error() {
    let fx = CliFixture::new();
    let (_, err) = fx.run_err(&["play", "nothing"]);
    assert!(err.contains("not found"), "{err}");
}
