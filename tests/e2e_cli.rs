//! CLI end-to-end tests
//!
//! Tests for the thumbforge command-line interface.

mod common;

use assert_cmd::prelude::*;
use image::ImageFormat;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the thumbforge binary
#[allow(deprecated)]
fn thumbforge_cmd() -> Command {
    Command::cargo_bin("thumbforge").unwrap()
}

/// A scratch directory with a config pointing storage and database into it.
struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with_model_section("")
    }

    fn with_model_section(model: &str) -> Self {
        let dir = tempdir().unwrap();
        let config = dir.path().join("thumbforge.toml");
        let content = format!(
            "[storage]\nroot = {:?}\nbase_url = \"/media/\"\n\n[database]\npath = {:?}\n\n[model]\n{}\n",
            dir.path().join("media"),
            dir.path().join("thumbforge.db"),
            model
        );
        fs::write(&config, content).unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn image(&self, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, common::gradient(width, height, format)).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = thumbforge_cmd();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    /// Run `add` and return the new record id.
    fn add(&self, image: &Path) -> String {
        let output = self.cmd().arg("add").arg(image).output().unwrap();
        assert!(
            output.status.success(),
            "add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = thumbforge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = thumbforge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("thumbforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = thumbforge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_specs_lists_builtin_specs() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("specs")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin_thumbnail"))
        .stdout(predicate::str::contains("thumbnail  quality=70"))
        .stdout(predicate::str::contains("pre_cache"));
}

#[test]
fn test_cli_add_pre_caches_thumbnail() {
    let ws = Workspace::new();
    let image = ws.image("beach.png", 64, 48, ImageFormat::Png);

    let id = ws.add(&image);
    assert_eq!(id.len(), 36, "unexpected id output: {}", id);

    let media = ws.path().join("media");
    assert!(media.join("images/beach.png").is_file());
    assert!(media.join("cache/images/beach_thumbnail.png").is_file());
    assert!(!media.join("cache/images/beach_display.png").exists());
}

#[test]
fn test_cli_url_generates_lazily() {
    let ws = Workspace::new();
    let id = ws.add(&ws.image("beach.png", 64, 48, ImageFormat::Png));

    ws.cmd()
        .args(["url", &id, "display"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/media/cache/images/beach_display.png\n"));
    assert!(ws
        .path()
        .join("media/cache/images/beach_display.png")
        .is_file());

    ws.cmd()
        .args(["url", &id, "nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("image spec nonexistent"));
}

#[test]
fn test_cli_show_json() {
    let ws = Workspace::new();
    let id = ws.add(&ws.image("beach.jpg", 64, 48, ImageFormat::Jpeg));

    let output = ws.cmd().args(["show", &id, "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["record"]["image"], "images/beach.jpg");
    assert_eq!(value["source_url"], "/media/images/beach.jpg");
    let specs = value["specs"].as_array().unwrap();
    let thumb = specs.iter().find(|s| s["spec"] == "thumbnail").unwrap();
    assert_eq!(thumb["cached"], true);
    assert_eq!(thumb["artifact"], "cache/images/beach_thumbnail.jpg");
    assert!(value["admin_thumbnail"]
        .as_str()
        .unwrap()
        .contains("beach_admin_thumbnail.jpg"));
}

#[test]
fn test_cli_clear_cache_and_regenerate() {
    let ws = Workspace::new();
    let id = ws.add(&ws.image("beach.png", 64, 48, ImageFormat::Png));
    let thumb = ws.path().join("media/cache/images/beach_thumbnail.png");

    ws.cmd()
        .args(["clear-cache", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cached image(s)"));
    assert!(!thumb.exists());

    ws.cmd()
        .arg("regenerate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));
    assert!(thumb.is_file());
}

#[test]
fn test_cli_replace_invalidates_cache() {
    let ws = Workspace::new();
    let id = ws.add(&ws.image("beach.png", 64, 48, ImageFormat::Png));
    ws.cmd().args(["url", &id, "display"]).assert().success();

    let forest = ws.image("forest.png", 40, 40, ImageFormat::Png);
    ws.cmd()
        .args(["replace", &id])
        .arg(&forest)
        .assert()
        .success()
        .stdout(predicate::str::contains("images/forest.png"));

    let cache = ws.path().join("media/cache/images");
    assert!(!cache.join("beach_display.png").exists());
    assert!(!cache.join("beach_thumbnail.png").exists());
    assert!(cache.join("forest_thumbnail.png").is_file());
}

#[test]
fn test_cli_delete_removes_record_and_cache() {
    let ws = Workspace::new();
    let id = ws.add(&ws.image("beach.png", 64, 48, ImageFormat::Png));

    ws.cmd()
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));
    assert!(!ws
        .path()
        .join("media/cache/images/beach_thumbnail.png")
        .exists());

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 0 record(s)"));

    ws.cmd()
        .args(["show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_cli_list_records() {
    let ws = Workspace::new();
    ws.add(&ws.image("a.png", 8, 8, ImageFormat::Png));
    ws.add(&ws.image("b.png", 8, 8, ImageFormat::Png));

    ws.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("images/a.png"))
        .stdout(predicate::str::contains("images/b.png"))
        .stdout(predicate::str::contains("2 of 2 record(s)"));
}

#[test]
fn test_cli_add_rejects_non_image() {
    let ws = Workspace::new();
    let notes = ws.path().join("notes.txt");
    fs::write(&notes, "not an image").unwrap();

    ws.cmd()
        .arg("add")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Image error"));
}

#[test]
fn test_cli_missing_spec_module_fails() {
    let ws = Workspace::with_model_section("spec_module = \"missing-specs.toml\"");
    ws.cmd()
        .arg("specs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load image specs"));
}

#[test]
fn test_cli_custom_spec_module() {
    let ws = Workspace::with_model_section(
        "spec_module = \"specs.toml\"\nadmin_thumbnail_spec = \"tiny\"",
    );
    fs::write(
        ws.path().join("specs.toml"),
        r#"
[[spec]]
name = "Tiny"
pre_cache = true
processors = [{ type = "resize", width = 4, height = 4, crop = true }]
"#,
    )
    .unwrap();

    ws.cmd()
        .arg("specs")
        .assert()
        .success()
        .stdout(predicate::str::contains("tiny"))
        .stdout(predicate::str::contains("admin_thumbnail"));

    ws.add(&ws.image("beach.png", 16, 16, ImageFormat::Png));
    assert!(ws.path().join("media/cache/images/beach_tiny.png").is_file());
}

#[test]
fn test_cli_validate_config() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("built-in defaults"));
}

#[test]
fn test_cli_validate_rejects_bad_filename_format() {
    let ws = Workspace::with_model_section("cache_filename_format = \"{filename}.{extension}\"");
    ws.cmd().arg("validate").assert().failure();
}

#[test]
fn test_cli_init_writes_default_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("thumbforge.toml");

    thumbforge_cmd()
        .arg("init")
        .arg(&path)
        .assert()
        .success();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[storage]"));
    assert!(content.contains("[model]"));

    thumbforge_cmd()
        .arg("init")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    thumbforge_cmd()
        .args(["validate"])
        .arg(&path)
        .assert()
        .success();
}
