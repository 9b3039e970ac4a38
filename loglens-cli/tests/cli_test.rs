use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

fn write_log(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> Result<std::path::PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(path)
}

fn loglens() -> Command {
    Command::cargo_bin("loglens-cli").unwrap()
}

#[test]
fn test_filter_single_file_by_keyword() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(
        &dir,
        "app.log",
        &[
            "2024-01-01 10:00:00 [ERROR] disk full",
            "2024-01-01 10:00:01 [INFO] all good",
        ],
    )?;

    loglens()
        .args(["filter", "--no-progress", "-f"])
        .arg(&path)
        .args(["-k", "disk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disk full"))
        .stdout(predicate::str::contains("all good").not());
    Ok(())
}

#[test]
fn test_exclude_keywords() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(
        &dir,
        "app.log",
        &[
            "2024-01-01 10:00:00 [ERROR] disk full",
            "2024-01-01 10:00:01 [INFO] all good",
        ],
    )?;

    loglens()
        .args(["filter", "--no-progress", "-f"])
        .arg(&path)
        .args(["-x", "ERROR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all good"))
        .stdout(predicate::str::contains("disk full").not());
    Ok(())
}

#[test]
fn test_multiple_files_concurrently() -> Result<()> {
    let dir = tempdir()?;
    let a = write_log(&dir, "a.log", &["[ERROR] from a", "[INFO] from a"])?;
    let b = write_log(&dir, "b.log", &["[ERROR] from b"])?;

    loglens()
        .args(["filter", "--no-progress", "-c", "2", "-l", "ERROR"])
        .arg(format!("--files={},{}", a.display(), b.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("[ERROR] from a"))
        .stdout(predicate::str::contains("[ERROR] from b"))
        .stdout(predicate::str::contains("[INFO]").not());
    Ok(())
}

#[test]
fn test_log_dir_walk() -> Result<()> {
    let dir = tempdir()?;
    write_log(&dir, "a.log", &["match one"])?;
    write_log(&dir, "b.log", &["match two"])?;

    loglens()
        .args(["filter", "--no-progress", "-k", "match", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("match one"))
        .stdout(predicate::str::contains("match two"));
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(&dir, "app.log", &["hello world"])?;

    loglens()
        .args(["filter", "--no-progress", "-j", "-f"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"log":"hello world"}"#));
    Ok(())
}

#[test]
fn test_output_file() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(&dir, "app.log", &["keep this", "drop that"])?;
    let out = dir.path().join("filtered.log");

    loglens()
        .args(["filter", "--no-progress", "-k", "keep", "-f"])
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let written = std::fs::read_to_string(&out)?;
    assert_eq!(written, "keep this\n");
    Ok(())
}

#[test]
fn test_time_window() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(
        &dir,
        "app.log",
        &[
            "2024-01-01 09:00:00 [INFO] too early",
            "2024-01-01 10:00:00 [INFO] in window",
            "2024-01-01 11:00:00 [INFO] too late",
        ],
    )?;

    loglens()
        .args(["filter", "--no-progress", "-f"])
        .arg(&path)
        .args(["-s", "2024-01-01 10:00:00", "-e", "2024-01-01 10:30:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in window"))
        .stdout(predicate::str::contains("too early").not())
        .stdout(predicate::str::contains("too late").not());
    Ok(())
}

#[test]
fn test_invalid_regex_fails_before_reading() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(&dir, "app.log", &["anything"])?;

    loglens()
        .args(["filter", "--no-progress", "-r", "[unclosed", "-f"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern"));
    Ok(())
}

#[test]
fn test_missing_file_single_mode_is_fatal() -> Result<()> {
    loglens()
        .args(["filter", "--no-progress", "-f", "does-not-exist.log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
    Ok(())
}

#[test]
fn test_missing_file_concurrent_mode_is_reported_not_fatal() -> Result<()> {
    let dir = tempdir()?;
    let a = write_log(&dir, "a.log", &["still delivered"])?;
    let missing = dir.path().join("missing.log");

    loglens()
        .args(["filter", "--no-progress"])
        .arg(format!("--files={},{}", a.display(), missing.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("still delivered"))
        .stderr(predicate::str::contains("Skipped"));
    Ok(())
}

#[test]
fn test_missing_config_file_is_fatal() -> Result<()> {
    let dir = tempdir()?;
    let path = write_log(&dir, "app.log", &["anything"])?;

    loglens()
        .args(["filter", "--no-progress", "--config", "no-such-config.yaml", "-f"])
        .arg(&path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_config_file_values_apply_when_flags_unset() -> Result<()> {
    let dir = tempdir()?;
    let a = write_log(&dir, "a.log", &["payment accepted", "healthcheck ok"])?;
    let b = write_log(&dir, "b.log", &["payment refunded"])?;
    let config = dir.path().join("loglens.yaml");
    std::fs::write(
        &config,
        "include_keywords: [\"payment\"]\nconcurrency: 1\n",
    )?;

    loglens()
        .args(["filter", "--no-progress", "--config"])
        .arg(&config)
        .arg(format!("--files={},{}", a.display(), b.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("payment accepted"))
        .stdout(predicate::str::contains("payment refunded"))
        .stdout(predicate::str::contains("healthcheck").not());
    Ok(())
}

#[test]
fn test_no_input_is_an_error() -> Result<()> {
    loglens()
        .args(["filter", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--file"));
    Ok(())
}

#[test]
fn test_generate_creates_files() -> Result<()> {
    let dir = tempdir()?;

    loglens()
        .args(["generate", "--files", "2", "--lines", "10", "--out"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Logs generated in directory"));

    // One timestamped subdirectory holding the generated files
    let sub: Vec<_> = std::fs::read_dir(dir.path())?.collect::<std::io::Result<_>>()?;
    assert_eq!(sub.len(), 1);
    let files: Vec<_> = std::fs::read_dir(sub[0].path())?.collect::<std::io::Result<_>>()?;
    assert_eq!(files.len(), 2);

    for file in files {
        let content = std::fs::read_to_string(file.path())?;
        assert_eq!(content.lines().count(), 10);
    }
    Ok(())
}

#[test]
fn test_generated_logs_are_filterable() -> Result<()> {
    let dir = tempdir()?;

    loglens()
        .args(["generate", "--files", "3", "--lines", "50", "--out"])
        .arg(dir.path())
        .assert()
        .success();

    let sub: Vec<_> = std::fs::read_dir(dir.path())?.collect::<std::io::Result<_>>()?;

    loglens()
        .args(["filter", "--no-progress", "-l", "ERROR,WARNING", "-d"])
        .arg(sub[0].path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[INFO]").not())
        .stdout(predicate::str::contains("[DEBUG]").not());
    Ok(())
}
