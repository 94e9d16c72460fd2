// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use log::warn;
use std::{
    env,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use ts_dl::{
    cli::{Cli, LogLevel},
    constants, run_from_cli,
};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持。
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let token_for_signal = cancellation_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        token_for_signal.store(true, Ordering::Relaxed);
        println!(
            "\n{} 用户请求中断，等待进行中的请求结束...",
            "[!]".yellow()
        );
        // 优雅退出的兜底: 在途请求迟迟不结束时强制退出
        tokio::time::sleep(Duration::from_secs(5)).await;
        std::process::exit(130);
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "ts-dl".to_string());

    let after_help = format!(
        "示例:\n  # 下载 m3u8 视频流并合并为单个 mp4\n  {bin} --url \"https://example.com/playlist.m3u8\" -o video.mp4\n\n  # 直接下载视频直链\n  {bin} --direct \"https://example.com/video.mp4\"\n\n  # 批量下载到指定目录\n  {bin} -b my_links.txt -o downloads/",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);

    let args = Arc::new(Cli::from_arg_matches(&cmd.get_matches()).unwrap());

    setup_logging(args.log_level);

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}

fn setup_logging(level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }

    let filter = match level {
        LogLevel::Off => log::LevelFilter::Off,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Trace => log::LevelFilter::Trace,
    };

    let app_name = clap::crate_name!();

    // 优先使用标准配置目录，拿不到主目录时回退到临时目录
    let log_file_path = match dirs::home_dir() {
        Some(home) => home
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::LOG_FILE_NAME),
        None => {
            eprintln!("警告: 无法获取用户主目录，日志将写入临时目录。");
            env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME)
        }
    };

    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
    }

    let file_appender = match fern::log_file(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "警告: 无法打开主日志文件 {:?} : {}。将尝试使用备用日志文件。",
                log_file_path, e
            );
            let fallback_path = env::temp_dir().join(format!(
                "{}-{}",
                app_name,
                constants::LOG_FALLBACK_FILE_NAME
            ));
            match fern::log_file(&fallback_path) {
                Ok(fb_file) => {
                    warn!("日志将写入备用文件: {:?}", fallback_path);
                    fb_file
                }
                Err(e_fb) => {
                    eprintln!(
                        "错误: 无法创建日志文件 {:?}: {}。日志将不会被记录。",
                        fallback_path, e_fb
                    );
                    return;
                }
            }
        }
    };

    let result = fern::Dispatch::new()
        .level(filter)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    if let Err(e) = result {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}
