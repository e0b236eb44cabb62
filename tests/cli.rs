#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sluzby-cli").unwrap();
    cmd.current_dir(dir)
        .arg("--ledger")
        .arg(dir.join("ledger.json"))
        .arg("--staff")
        .arg(dir.join("staff.csv"));
    cmd
}

#[test]
fn create_generate_and_list() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("staff.csv"),
        "id,full_name,active,rotating,sunday\n7,Jana,true,false,false\n9,Petr,true,false,false\n",
    )
    .unwrap();

    let out = cli(dir.path())
        .args([
            "create-fixed",
            "--department",
            "adults",
            "--weekday",
            "4",
            "--start",
            "08:00",
            "--end",
            "16:00",
            "--assignee",
            "7",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let template = stdout.trim().strip_prefix("template ").unwrap().to_string();

    cli(dir.path())
        .args([
            "generate",
            "--template",
            &template,
            "--from",
            "2026-01-01",
            "--to",
            "2026-01-31",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("created 5 instance(s), skipped 0"));

    cli(dir.path())
        .args(["list", "--from", "2026-01-01", "--to", "2026-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== 2026-01"))
        .stdout(predicate::str::contains("2026-01-30"))
        .stdout(predicate::str::contains("2026-01-06").not());

    cli(dir.path())
        .args(["stats", "--employee", "7", "--year", "2026"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Statistiques 2026 pour Jana (#7)"));
}

#[test]
fn tuesday_template_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("staff.csv"),
        "id,full_name\n7,Jana\n",
    )
    .unwrap();

    cli(dir.path())
        .args([
            "create-fixed",
            "--department",
            "children",
            "--weekday",
            "1",
            "--start",
            "08:00",
            "--end",
            "12:00",
            "--assignee",
            "7",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tuesday"));
    assert!(!dir.path().join("ledger.json").exists());
}
