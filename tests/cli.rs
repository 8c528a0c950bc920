use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("vid2article").unwrap();
    cmd.env_remove("VID2ARTICLE_BACKEND_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn resolve_prints_video_id_for_each_shape() {
    for input in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "dQw4w9WgXcQ",
    ] {
        cmd()
            .args(["resolve", input])
            .assert()
            .success()
            .stdout("dQw4w9WgXcQ\n");
    }
}

#[test]
fn resolve_rejects_invalid_input() {
    cmd()
        .args(["resolve", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid YouTube link"));
}

#[test]
fn convert_with_invalid_reference_fails_without_network() {
    // Port 9 is discard; if the pipeline tried the backend this would report an acquisition error
    cmd()
        .args([
            "convert",
            "not a url",
            "--quiet",
            "--backend-url",
            "http://127.0.0.1:9",
        ])
        .env("ANTHROPIC_API_KEY", "")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid YouTube link"))
        .stderr(predicate::str::contains("transcript").not());
}

#[test]
fn render_html_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("article.md");
    fs_err::write(&file, "## Intro\nHello **world**\n").unwrap();

    cmd()
        .arg("render")
        .arg(&file)
        .arg("--html")
        .assert()
        .success()
        .stdout("<h2>Intro</h2>\n<p>Hello <strong>world</strong></p>\n");
}

#[test]
fn render_missing_file_fails() {
    cmd()
        .args(["render", "definitely-missing-article.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File does not exist"));
}

#[test]
fn manual_with_blank_file_reports_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("transcript.txt");
    fs_err::write(&file, "  \n\n").unwrap();

    cmd()
        .arg("manual")
        .arg("--file")
        .arg(&file)
        .arg("--quiet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please paste a transcript"));
}

#[test]
fn config_path_points_to_yaml() {
    cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("config.yaml\n"));
}

#[test]
fn rejects_invalid_backend_url() {
    cmd()
        .args(["health", "--backend-url", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP or HTTPS"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("manual"))
        .stdout(predicate::str::contains("resolve"));
}
