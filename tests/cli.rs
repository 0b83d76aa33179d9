//! Binary tests: exit codes, output streams and subcommands.
//!
//! Run with: `cargo test --test cli`

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn sitedata(root: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_sitedata");
    Command::new(bin)
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sitedata")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn math_art() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "content/site.json", r#"{"name": "Math Art"}"#);
    write(
        tmp.path(),
        "content/sections/01-fractals/meta.json",
        r#"{"title": "Fractals", "pieces": [{"image": "mandelbrot.png", "title": "Mandelbrot Set"}]}"#,
    );
    write(tmp.path(), "content/sections/01-fractals/mandelbrot.png", "png");
    tmp
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

#[test]
fn bare_invocation_builds() {
    let tmp = math_art();
    let output = sitedata(tmp.path(), &[]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("001 Fractals (1 pieces, no paper)"));
    assert!(stdout(&output).contains("Wrote src/generated/site-data.json"));
    assert!(tmp.path().join("src/generated/site-data.json").is_file());
    assert!(tmp.path().join("public/content/01-fractals/mandelbrot.png").is_file());
}

#[test]
fn second_build_reports_up_to_date() {
    let tmp = math_art();
    assert!(sitedata(tmp.path(), &["build"]).status.success());

    let output = sitedata(tmp.path(), &["build"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Content up to date: src/generated/site-data.json\n"
    );
}

#[test]
fn force_rebuilds() {
    let tmp = math_art();
    assert!(sitedata(tmp.path(), &["build"]).status.success());

    let output = sitedata(tmp.path(), &["build", "--force"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Wrote "));
}

#[test]
fn missing_site_exits_nonzero() {
    let tmp = math_art();
    fs::remove_file(tmp.path().join("content/site.json")).unwrap();

    let output = sitedata(tmp.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: Missing site descriptor"), "{}", stderr(&output));
    assert!(!tmp.path().join("src/generated/site-data.json").exists());
}

#[test]
fn missing_sections_dir_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "content/site.json", r#"{"name": "Empty"}"#);

    let output = sitedata(tmp.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: "));
}

#[test]
fn missing_image_warns_on_stderr_and_succeeds() {
    let tmp = math_art();
    fs::remove_file(tmp.path().join("content/sections/01-fractals/mandelbrot.png")).unwrap();

    let output = sitedata(tmp.path(), &["build"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("image \"mandelbrot.png\" not found"));
    assert!(stdout(&output).contains("1 warning"));
}

#[test]
fn strict_flag_fails_on_missing_image() {
    let tmp = math_art();
    fs::remove_file(tmp.path().join("content/sections/01-fractals/mandelbrot.png")).unwrap();

    let output = sitedata(tmp.path(), &["build", "--strict"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Image not found"));
}

#[test]
fn quiet_hides_warnings() {
    let tmp = math_art();
    write(tmp.path(), "content/sections/02-drafts/sketch.png", "png");

    let output = sitedata(tmp.path(), &["-q", "build"]);
    assert!(output.status.success());
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_file_moves_outputs() {
    let tmp = math_art();
    write(
        tmp.path(),
        "sitedata.toml",
        "[paths]\nmanifest = \"data/site.json\"\npublic = \"static/media\"\n\n[publish]\nurl_prefix = \"/media\"\n",
    );

    let output = sitedata(tmp.path(), &["build"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let manifest = fs::read_to_string(tmp.path().join("data/site.json")).unwrap();
    assert!(manifest.contains("\"/media/01-fractals/mandelbrot.png\""));
    assert!(tmp.path().join("static/media/01-fractals/mandelbrot.png").is_file());
}

#[test]
fn invalid_config_exits_nonzero() {
    let tmp = math_art();
    write(tmp.path(), "sitedata.toml", "[svg]\nprecison = 2\n");

    let output = sitedata(tmp.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("precison"), "{}", stderr(&output));
}

#[test]
fn explicit_missing_config_exits_nonzero() {
    let tmp = math_art();
    let output = sitedata(tmp.path(), &["--config", "/nonexistent/sitedata.toml", "build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("config file not found"));
}

// ---------------------------------------------------------------------------
// check / gen-config
// ---------------------------------------------------------------------------

#[test]
fn check_validates_without_writing() {
    let tmp = math_art();
    let output = sitedata(tmp.path(), &["check"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Content is valid: 1 sections, 1 pieces"));
    assert!(!tmp.path().join("src/generated").exists());
    assert!(!tmp.path().join("public").exists());
}

#[test]
fn gen_config_prints_stock_toml() {
    let tmp = TempDir::new().unwrap();
    let output = sitedata(tmp.path(), &["gen-config"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[paths]"));
    assert!(text.contains("url_prefix = \"/content\""));
    let parsed: toml::Value = toml::from_str(&text).unwrap();
    assert!(parsed.get("svg").is_some());
}
