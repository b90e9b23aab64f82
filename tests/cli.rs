use std::process::Command;

use assert_cmd::prelude::*;
use image::GenericImageView;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn renders_an_image_of_the_requested_size() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("mandel.png");
    for strategy in &["block", "cyclic", "dynamic"] {
        Command::cargo_bin("mandelfarm")
            .unwrap()
            .args(&["-o", out.to_str().unwrap(), "-s", "32x24", "-w", "3", "-p", *strategy])
            .assert()
            .success();
        let img = image::open(&out).unwrap();
        assert_eq!(img.dimensions(), (32, 24));
    }
}

#[test]
fn accepts_negative_corners_and_integer_counts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("corner.pgm");
    Command::cargo_bin("mandelfarm")
        .unwrap()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "-s",
            "16x16",
            "-l",
            "-1.5,-1",
            "-r",
            "0.5,1",
            "-i",
            "100",
            "--no-smooth",
        ])
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn output_is_required() {
    Command::cargo_bin("mandelfarm")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn rejects_unknown_strategies() {
    Command::cargo_bin("mandelfarm")
        .unwrap()
        .args(&["-o", "never.png", "-p", "round-robin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("round-robin"));
}

#[test]
fn rejects_zero_workers() {
    Command::cargo_bin("mandelfarm")
        .unwrap()
        .args(&["-o", "never.png", "-w", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Worker count"));
}

#[test]
fn reports_inverted_corners() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("inverted.png");
    Command::cargo_bin("mandelfarm")
        .unwrap()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "-s",
            "8x8",
            "-l",
            "1,1",
            "-r",
            "-1,-1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
    assert!(!out.exists());
}
