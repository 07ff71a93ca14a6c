mod common;

use std::fs;

use assert_cmd::Command;
use tempfile::TempDir;

use common::observation_archive;

fn slitcube() -> Command {
    Command::cargo_bin("slitcube").unwrap()
}

#[test]
fn assemble_command_writes_one_cube_per_dataset() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    let out = tmp.path().join("assembled");
    fs::create_dir_all(&raw).unwrap();
    observation_archive(&raw.join("obs.zip"), "20230615120000", 4);

    slitcube()
        .args(["-q", "assemble", "--archive", "obs.zip", "--archive-dir"])
        .arg(&raw)
        .arg("--output")
        .arg(&out)
        .args(["--steps", "2", "--cleanup"])
        .assert()
        .success();

    assert!(out.join("a.c.n.stacked.20230615120000.fits").is_file());
    assert!(!raw.join("temp").exists());
}

#[test]
fn assemble_command_fails_for_garbage_archive() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("obs.zip"), "nope").unwrap();

    slitcube()
        .args(["-q", "assemble", "--archive", "obs.zip", "--archive-dir"])
        .arg(tmp.path())
        .arg("--output")
        .arg(tmp.path().join("out"))
        .assert()
        .failure();
}

#[test]
fn unstack_command_tolerates_missing_cube() {
    let tmp = TempDir::new().unwrap();

    slitcube()
        .arg("unstack")
        .arg(tmp.path().join("a.stacked.absent.fits"))
        .assert()
        .success();
}

#[test]
fn inspect_command_reports_time_steps() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    let out = tmp.path().join("assembled");
    fs::create_dir_all(&raw).unwrap();
    observation_archive(&raw.join("obs.zip"), "20230615120000", 3);

    slitcube()
        .args(["-q", "assemble", "--archive", "obs.zip", "--archive-dir"])
        .arg(&raw)
        .arg("--output")
        .arg(&out)
        .args(["--steps", "2"])
        .assert()
        .success();

    let output = slitcube()
        .arg("inspect")
        .arg(out.join("a.c.n.stacked.20230615120000.fits"))
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("time series: 2 scans of 2 slit positions"), "{stdout}");
    assert!(stdout.contains("scan 1"), "{stdout}");
}

#[test]
fn cleanup_leaves_explicit_staging_alone() {
    let tmp = TempDir::new().unwrap();
    let raw = tmp.path().join("raw");
    let staging = tmp.path().join("work");
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("notes.txt"), "keep me").unwrap();
    fs::create_dir_all(&raw).unwrap();
    observation_archive(&raw.join("obs.zip"), "20230615120000", 2);

    slitcube()
        .args(["-q", "assemble", "--archive", "obs.zip", "--archive-dir"])
        .arg(&raw)
        .arg("--output")
        .arg(tmp.path().join("assembled"))
        .arg("--staging")
        .arg(&staging)
        .arg("--cleanup")
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(staging.join("notes.txt")).unwrap(), "keep me");
}
