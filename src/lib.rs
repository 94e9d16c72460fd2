// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    cli::Cli,
    client::HttpClient,
    config::AppConfig,
    downloader::{DirectDownloader, M3u8Job},
    error::{AppError, AppResult},
    progress::BarProgress,
};
use anyhow::anyhow;
use colored::*;
use log::debug;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use url::Url;

/// 核心的执行上下文，包含所有任务所需的状态和工具
#[derive(Clone)]
pub struct DownloadJobContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<HttpClient>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);
    let http_client = Arc::new(HttpClient::new(&config)?);

    let context = DownloadJobContext {
        config,
        http_client,
        args: args.clone(),
        cancellation_token,
    };

    if let Some(batch_file) = &args.batch_file {
        process_batch_tasks(batch_file, context).await
    } else if let Some(url) = &args.url {
        let output = resolve_output_path(&args.output, url, false);
        run_m3u8_task(url, &output, &context).await
    } else if let Some(url) = &args.direct {
        let output = resolve_output_path(&args.output, url, true);
        run_direct_task(url, &output, &context).await
    } else {
        Ok(())
    }
}

/// 单任务模式: -o 给了就用，否则从链接推导文件名
fn resolve_output_path(output: &Option<PathBuf>, url: &str, keep_extension: bool) -> PathBuf {
    match output {
        Some(path) => path.clone(),
        None => PathBuf::from(utils::filename_from_url(url, keep_extension)),
    }
}

async fn run_m3u8_task(url: &str, output: &Path, context: &DownloadJobContext) -> AppResult<()> {
    println!("{} 正在解析 m3u8 清单: {}", *symbols::INFO, url);
    let bar = BarProgress::new(ui::new_tasks_progress_bar(0, "下载分片"));
    let result = M3u8Job::new(context.clone()).run(url, output, &bar).await;
    bar.finish();
    match &result {
        Ok(_) => println!("{} 视频下载完成: {}", *symbols::OK, output.display()),
        Err(e) => log::error!("m3u8 任务 '{}' 失败: {}", url, e),
    }
    result
}

async fn run_direct_task(url: &str, output: &Path, context: &DownloadJobContext) -> AppResult<()> {
    println!("{} 正在下载视频: {}", *symbols::INFO, url);
    let bar = BarProgress::new(ui::new_bytes_progress_bar(0, "下载"));
    let result = DirectDownloader::new(context.clone())
        .download(url, output, &bar)
        .await;
    bar.finish();
    match &result {
        Ok(_) => println!("{} 视频下载完成: {}", *symbols::OK, output.display()),
        Err(e) => log::error!("直链任务 '{}' 失败: {}", url, e),
    }
    result
}

async fn process_batch_tasks(batch_file: &Path, base_context: DownloadJobContext) -> AppResult<()> {
    let content = std::fs::read_to_string(batch_file).map_err(|e| {
        log::error!("读取批量文件 '{}' 失败: {}", batch_file.display(), e);
        AppError::from(e)
    })?;

    let tasks: Vec<String> = content
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect();
    if tasks.is_empty() {
        log::warn!("批量文件 '{}' 为空或不含有效行。", batch_file.display());
        println!(
            "{} 批量文件 '{}' 为空。",
            *symbols::WARN,
            batch_file.display()
        );
        return Ok(());
    }

    let output_dir = base_context
        .args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut success = 0;
    let mut failed = 0;
    ui::print_header(&format!(
        "开始批量处理任务 (按 {} 可随时退出)",
        *symbols::CTRL_C
    ));
    for (i, task) in tasks.iter().enumerate() {
        if base_context.cancellation_token.load(Ordering::Relaxed) {
            return Err(AppError::UserInterrupt);
        }
        ui::print_sub_header(&format!(
            "批量任务 {}/{} - {}",
            i + 1,
            tasks.len(),
            utils::truncate_text(task, 60)
        ));

        if Url::parse(task).is_err() {
            log::warn!("跳过无效条目: {}", task);
            eprintln!("{} 跳过无效条目: {}", *symbols::WARN, task);
            continue;
        }

        // 以路径部分的扩展名区分分片流和直链 (查询串不参与判断)
        let is_m3u8 = task
            .split('?')
            .next()
            .unwrap_or(task)
            .ends_with(".m3u8");
        let output = output_dir.join(utils::filename_from_url(task, !is_m3u8));

        let context = base_context.clone();
        let result = if is_m3u8 {
            run_m3u8_task(task, &output, &context).await
        } else {
            run_direct_task(task, &output, &context).await
        };
        match result {
            Ok(_) => success += 1,
            Err(AppError::UserInterrupt) => return Err(AppError::UserInterrupt),
            Err(e) => {
                failed += 1;
                log::error!("批量任务 '{}' 失败: {}", task, e);
                eprintln!("\n{} 处理任务时发生错误: {}", *symbols::ERROR, e);
            }
        }
    }

    ui::print_header("批量任务报告");
    println!(
        "{} | {} | 总计: {}",
        format!("成功任务: {}", success).green(),
        format!("失败任务: {}", failed).red(),
        tasks.len()
    );
    if failed > 0 {
        Err(AppError::Other(anyhow!("{} 个批量任务执行失败。", failed)))
    } else {
        Ok(())
    }
}
