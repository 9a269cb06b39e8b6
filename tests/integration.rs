use std::path::Path;
use std::process::{Command, Output};

fn folio_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_folio"));
    cmd.arg("--quiet").arg("--root").arg(root);
    cmd
}

fn fixture() -> &'static Path {
    Path::new("tests/fixtures/site")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn render_fills_every_section() {
    let output = folio_cmd(fixture()).arg("render").output().unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let html = stdout(&output);

    assert!(html.contains("Systems engineer who likes <strong>small tools</strong>"));
    assert!(html.contains("Directory of C:\\RUST"));
    assert!(html.contains("Directory of C:\\WEB_DEV"));
    assert!(html.contains("data-skill-id=\"Rust_TOKIO\""));
    assert!(html.contains("<span class=\"tui-panel-title blue-255-text\">folio</span>"));
    assert_eq!(html.matches("class=\"content-footer\"").count(), 4);
    assert!(!html.contains("Failed to load content"));
}

#[test]
fn render_resolves_contact_tokens_after_directory_loads() {
    let output = folio_cmd(fixture()).arg("render").output().unwrap();
    let html = stdout(&output);

    assert!(html.contains("Click to reveal email"));
    assert!(!html.contains("Email unavailable"));
    assert!(!html.contains("wmontes@example.com"), "email must stay hidden until revealed");
    assert!(html.contains(
        "<a href=\"https://github.com/wmontes\" target=\"_blank\" rel=\"noopener noreferrer\">wmontes</a>"
    ));
    assert!(html.contains("<a href=\"/files/cv.pdf\">Download</a>"));
}

#[test]
fn render_points_shell_anchors_at_contact_links() {
    let output = folio_cmd(fixture()).arg("render").output().unwrap();
    let html = stdout(&output);

    assert!(html.contains("data-link-type=\"github\" href=\"https://github.com/wmontes\""));
    assert!(html.contains("data-link-type=\"mastodon\" href=\"#\""));
}

#[test]
fn render_writes_out_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("page.html");
    let output = folio_cmd(fixture()).args(["render", "--out"]).arg(&out).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
}

#[test]
fn render_exits_one_when_a_section_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "content/about.txt", "# Only about\n");

    let output = folio_cmd(dir.path()).arg("render").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let html = stdout(&output);
    assert!(html.contains("Only about"));
    assert_eq!(html.matches("Failed to load content").count(), 3);
}

#[test]
fn missing_root_is_a_runtime_error() {
    let output = folio_cmd(Path::new("tests/fixtures/absent")).arg("render").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: File Not Found"));
}

#[test]
fn check_passes_on_clean_content() {
    let output = folio_cmd(fixture()).arg("check").output().unwrap();
    assert!(output.status.success(), "check failed: {}", stdout(&output));
    assert!(stdout(&output).contains("All 5 content files clean"));
}

#[test]
fn check_reports_discards_and_unknown_links() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "contact-info.json", r#"{"links": {"github": "https://github.com/wm"}}"#);
    write(
        dir.path(),
        "content/about.txt",
        "# About\n[gh]({{link:github}})\n[blog]({{link:blog}})\n@skill:Rust:lots:green\n@panel:Open\nnever closed\n",
    );

    let output = folio_cmd(dir.path()).arg("check").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report = stdout(&output);
    assert!(report.contains("DISCARD     content/about.txt:4 (malformed @skill line)"), "{report}");
    assert!(report.contains("DISCARD     content/about.txt:5 (unclosed @panel)"), "{report}");
    assert!(report.contains("UNRESOLVED  content/about.txt:3 (link `blog`)"), "{report}");
    assert!(!report.contains("link `github`"));
    assert!(report.contains("3 problems in 1 files"));
}

#[test]
fn reveal_prints_dossier_from_skills_text() {
    let output = folio_cmd(fixture()).args(["reveal", "Rust", "Tokio"]).output().unwrap();
    assert!(output.status.success());

    let well = stdout(&output);
    assert!(well.contains("Async runtime work across <strong>three</strong> services."));
    assert!(well.contains("<div class=\"cyan-168-text\">Favourite crate.</div>"));
}

#[test]
fn reveal_falls_back_to_dossier_file() {
    let output = folio_cmd(fixture()).args(["reveal", "Rust", "Rayon"]).output().unwrap();
    assert!(output.status.success());

    let well = stdout(&output);
    assert!(well.contains("Data-parallel batch jobs."));
    assert!(well.contains("href=\"https://github.com/wmontes\""));
}

#[test]
fn reveal_matches_multi_word_skill_names() {
    let output = folio_cmd(fixture()).args(["reveal", "Web Dev", "Node.js"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Built REST APIs and a few CLIs."));
}

#[test]
fn reveal_without_dossier_shows_placeholder() {
    let output = folio_cmd(fixture()).args(["reveal", "Rust", "Serde"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let well = stdout(&output);
    assert!(well.contains("Detailed information about Serde within Rust."));
    assert!(well.contains("@subskill:Rust:Serde"));

    let untiled = folio_cmd(fixture()).args(["reveal", "Go", "Generics"]).output().unwrap();
    assert_eq!(untiled.status.code(), Some(1));
    assert!(stdout(&untiled).contains("Detailed information about Generics within Go."));
}

#[test]
fn info_json_describes_site() {
    let output = folio_cmd(fixture()).args(["info", "--json"]).output().unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let state = &info["current_state"];
    assert_eq!(state["config_found"], false);
    assert_eq!(state["config_error"], serde_json::Value::Null);
    assert_eq!(state["shell_found"], true);
    assert_eq!(state["contact_links"], serde_json::json!(["cv", "github"]));
    assert_eq!(state["sections"][2]["path"], "content/experience.txt");
    assert_eq!(state["sections"][2]["exists"], true);
}

#[test]
fn info_markdown_lists_sections() {
    let output = folio_cmd(fixture()).arg("info").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("# folio "));
    assert!(text.contains("  projects -> content/experience.txt"));
}

#[test]
fn info_reports_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "folio.toml", "colour = \"green\"\n");

    let output = folio_cmd(dir.path()).args(["info", "--json"]).output().unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let state = &info["current_state"];
    assert_eq!(state["config_found"], true);
    assert!(state["config_error"].as_str().is_some_and(|e| e.contains("colour")), "{state}");

    let markdown = stdout(&folio_cmd(dir.path()).arg("info").output().unwrap());
    assert!(markdown.contains("Config:   folio.toml (invalid, showing defaults:"), "{markdown}");
    assert!(!markdown.contains("Config:   folio.toml (found)"));
}
