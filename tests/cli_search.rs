mod util;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use util::{BlogFixture, three_post_fixture};

fn base_cmd(fixture: &BlogFixture) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("blogsearch"));
    cmd.env("NO_COLOR", "1")
        .env("RUST_LOG", "warn")
        .env_remove("BLOG_SEARCH_MODEL")
        .env_remove("BLOG_SEARCH_DOCS")
        .env_remove("BLOG_SEARCH_EXTENSION")
        .env_remove("BLOG_SEARCH_TOP_K")
        .current_dir(fixture.dir.path())
        .arg("--model")
        .arg(fixture.model_path())
        .arg("--docs")
        .arg(fixture.docs_dir());
    cmd
}

#[test]
fn search_json_is_clean_on_stdout() {
    let fixture = three_post_fixture();
    let output = base_cmd(&fixture)
        .args(["search", "technology", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["query"], "technology");
    assert_eq!(json["search_path"], "semantic");
    assert_eq!(json["total_found"], 2);
    assert_eq!(json["results"][0]["identifier"], "a.txt");
    assert_eq!(json["results"][1]["identifier"], "b.txt");
}

#[test]
fn search_joins_words_and_honors_top_k() {
    let fixture = three_post_fixture();
    let output = base_cmd(&fixture)
        .args(["search", "cooking", "food", "-k", "1", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["query"], "cooking food");
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["results"][0]["identifier"], "b.txt");
}

#[test]
fn search_prints_human_readable_results() {
    let fixture = three_post_fixture();
    base_cmd(&fixture)
        .args(["search", "technology"])
        .assert()
        .success()
        .stdout(contains("a.txt"))
        .stdout(contains("https://example.org/a"))
        .stdout(contains("semantic"));
}

#[test]
fn missing_model_fails_with_message() {
    let fixture = BlogFixture::new();
    base_cmd(&fixture)
        .args(["search", "technology"])
        .assert()
        .failure()
        .stderr(contains("embedding table not found"));
}

#[test]
fn stats_json_reports_counts() {
    let fixture = three_post_fixture();
    let output = base_cmd(&fixture)
        .args(["stats", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["document_count"], 3);
    assert_eq!(json["vocabulary_size"], 6);
}

#[test]
fn vocab_and_suggest_respect_limit() {
    let fixture = three_post_fixture();
    base_cmd(&fixture)
        .args(["vocab", "--limit", "2"])
        .assert()
        .success()
        .stdout("technology\ninnovation\n");
    base_cmd(&fixture)
        .args(["suggest", "--limit", "1"])
        .assert()
        .success()
        .stdout("technology\n");
}

#[test]
fn interactive_reads_until_quit() {
    let fixture = three_post_fixture();
    base_cmd(&fixture)
        .arg("interactive")
        .write_stdin("\ncooking\nvocab\nquit\ntechnology\n")
        .assert()
        .success()
        .stdout(contains("Results for \"cooking\""))
        .stdout(contains("b.txt"))
        .stdout(contains("technology, innovation"))
        .stdout(contains("Results for \"technology\"").not());
}

#[test]
fn demo_runs_every_query() {
    let fixture = three_post_fixture();
    base_cmd(&fixture)
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("\"technology\""))
        .stdout(contains("\"artificial intelligence\""))
        .stdout(contains("\"development\""));
}

#[test]
fn completions_do_not_need_an_index() {
    let fixture = BlogFixture::new();
    base_cmd(&fixture)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(contains("blogsearch"));
}
