// src/ui.rs

use crate::constants;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

/// 按任务数显示的进度条 (分片模式)。
pub fn new_tasks_progress_bar(len: u64, action: &str) -> ProgressBar {
    let pbar = ProgressBar::new(len);
    pbar.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("=>-"),
    );
    pbar.set_prefix(action.to_string());
    pbar
}

/// 按字节数显示的进度条 (直链模式)。
pub fn new_bytes_progress_bar(total: u64, action: &str) -> ProgressBar {
    let pbar = ProgressBar::new(total);
    pbar.set_style(
        ProgressStyle::with_template(
            "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )
        .unwrap()
        .progress_chars("=>-"),
    );
    pbar.set_prefix(action.to_string());
    pbar
}
