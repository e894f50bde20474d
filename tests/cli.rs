//! Runs the `ora-site` binary against a copy of the fixture site.
//!
//! Run with: `cargo test --test cli`

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    for entry in WalkDir::new(&src) {
        let entry = entry.unwrap();
        let dest = tmp.path().join(entry.path().strip_prefix(&src).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

fn ora_site(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ora-site"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ora-site")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn build_logs_each_copy_and_page() {
    let tmp = fixture_site();
    let out = ora_site(tmp.path(), &["build"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let lines: Vec<String> = stdout(&out).lines().map(String::from).collect();
    assert_eq!(
        lines,
        [
            "Copied: assets/ (2 files)",
            "Copied: favicon.ico",
            "Copied: robots.txt",
            "Copied: sitemap.xml",
            "Built: dist/about/index.html",
            "Built: dist/index.html",
            "Built: dist/personalisation.html",
            "Built: dist/work/index.html",
            "Build complete: 4 pages, 4 static items",
        ]
    );
}

#[test]
fn output_flag_overrides_config() {
    let tmp = fixture_site();
    let out = ora_site(tmp.path(), &["--output", "public", "build"]);
    assert!(out.status.success());

    assert!(tmp.path().join("public/index.html").exists());
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn site_toml_changes_routing() {
    let tmp = fixture_site();
    fs::write(
        tmp.path().join("site.toml"),
        "[routing]\nflat_pages = [\"personalisation\", \"work\"]\n",
    )
    .unwrap();

    let out = ora_site(tmp.path(), &["build"]);
    assert!(out.status.success());
    assert!(tmp.path().join("dist/work.html").exists());
    assert!(tmp.path().join("dist/about/index.html").exists());
}

#[test]
fn failure_prints_error_and_exits_nonzero() {
    let tmp = fixture_site();
    fs::remove_file(tmp.path().join("templates/partials/header.html")).unwrap();

    let out = ora_site(tmp.path(), &["build"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&out.stderr)
            .contains("Error: Required file missing: templates/partials/header.html")
    );
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn invalid_config_is_rejected() {
    let tmp = fixture_site();
    fs::write(tmp.path().join("site.toml"), "[paths]\noutput = \".\"\n").unwrap();

    let out = ora_site(tmp.path(), &["build"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("paths.output"));
}

#[test]
fn output_flag_cannot_point_at_the_project() {
    let tmp = fixture_site();
    for output in ["./", "../", "templates"] {
        let out = ora_site(tmp.path(), &["--output", output, "build"]);

        assert_eq!(out.status.code(), Some(1), "{output:?} was accepted");
        assert!(String::from_utf8_lossy(&out.stderr).contains("paths.output"));
        assert!(tmp.path().join("templates/partials/footer.html").exists());
    }
}

#[test]
fn check_does_not_write_output() {
    let tmp = fixture_site();
    let out = ora_site(tmp.path(), &["check"]);
    assert!(out.status.success());

    let text = stdout(&out);
    assert!(text.contains("004 work \u{2192} dist/work/index.html"));
    assert!(text.contains("    CNAME (missing)"));
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn gen_config_round_trips_through_loader() {
    let tmp = TempDir::new().unwrap();
    let out = ora_site(tmp.path(), &["gen-config"]);
    assert!(out.status.success());

    fs::write(tmp.path().join("site.toml"), out.stdout).unwrap();
    let config = ora_site::config::load_config(tmp.path()).unwrap();
    assert_eq!(config.paths.output, "dist");
    assert_eq!(config.routing.flat_pages, ["personalisation"]);
}
