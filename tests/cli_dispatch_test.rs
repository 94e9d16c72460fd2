// tests/cli_dispatch_test.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use tempfile::tempdir;

// 辅助函数，避免重复
fn main_command() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

// --- 测试基本 CLI 行为 ---

#[test]
fn test_help_flag() {
    let mut cmd = main_command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("显示此帮助信息并退出"));
}

#[test]
fn test_missing_mode_shows_help() {
    let mut cmd = main_command();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_modes_are_mutually_exclusive() {
    let mut cmd = main_command();
    cmd.arg("--url")
        .arg("https://example.com/playlist.m3u8")
        .arg("--direct")
        .arg("https://example.com/video.mp4");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// --- 测试核心分发逻辑 ---

#[test]
fn test_invalid_url_is_reported() {
    let mut cmd = main_command();
    cmd.arg("--url").arg("不是一个链接");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("程序执行出错"));
}

#[test]
fn test_unreachable_manifest_is_reported() {
    let dir = tempdir().unwrap();
    let mut cmd = main_command();
    // 9 端口 (discard) 基本不会有服务监听，连接会快速失败
    cmd.arg("--url")
        .arg("http://127.0.0.1:9/playlist.m3u8")
        .arg("-o")
        .arg(dir.path().join("out.mp4"))
        .arg("--timeout")
        .arg("2");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("程序执行出错"));
}

#[test]
fn test_batch_mode_reports_failed_tasks() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("links.txt");
    let mut file = File::create(&file_path).unwrap();
    writeln!(file, "http://127.0.0.1:9/a/playlist.m3u8").unwrap();
    writeln!(file, "# 注释行会被忽略").unwrap();

    let mut cmd = main_command();
    cmd.arg("-b")
        .arg(&file_path)
        .arg("-o")
        .arg(dir.path())
        .arg("--timeout")
        .arg("2");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("个批量任务执行失败"));
}

#[test]
fn test_empty_batch_file_is_not_an_error() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("links.txt");
    File::create(&file_path).unwrap();

    let mut cmd = main_command();
    cmd.arg("-b").arg(&file_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("为空"));
}
