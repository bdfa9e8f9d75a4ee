//! CLI integration tests using assert_cmd.
//!
//! Help and argument validation need no services and always run.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn crawlwatch() -> Command {
    let mut cmd = Command::cargo_bin("crawlwatch").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("REDIS_URL")
        .env_remove("CRAWLWATCH_CONFIG");
    cmd
}

#[test]
fn help_shows_all_subcommands() {
    crawlwatch().arg("--help").assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("snapshot"))
            .and(predicate::str::contains("queues")),
    );
}

#[test]
fn help_shows_global_options() {
    crawlwatch().arg("--help").assert().success().stdout(
        predicate::str::contains("--config")
            .and(predicate::str::contains("--database-url"))
            .and(predicate::str::contains("--redis-url"))
            .and(predicate::str::contains("--query-timeout-ms")),
    );
}

#[test]
fn help_serve_shows_args() {
    crawlwatch()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port").and(predicate::str::contains("--in-memory")));
}

#[test]
fn missing_subcommand_fails() {
    crawlwatch().assert().failure();
}

#[test]
fn invalid_port_is_rejected() {
    crawlwatch()
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn snapshot_without_database_url_fails() {
    crawlwatch()
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn missing_config_file_is_reported() {
    crawlwatch()
        .args(["--config", "/nonexistent/crawlwatch.toml", "queues"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading config"));
}

#[test]
fn zero_query_timeout_is_rejected() {
    crawlwatch()
        .args(["--query-timeout-ms", "0", "queues"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("query_timeout_ms"));
}
