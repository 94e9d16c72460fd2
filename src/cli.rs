// src/cli.rs

use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["url", "direct", "batch_file"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 指定要下载的 m3u8 播放列表链接
    #[arg(long, help_heading = "Mode")]
    pub url: Option<String>,
    /// 直接下载单个视频文件 (mp4 等直链)
    #[arg(long, value_name = "URL", help_heading = "Mode")]
    pub direct: Option<String>,
    /// 从文本文件批量下载多个链接 (每行一个，# 开头的行忽略)
    #[arg(short, long, value_name = "FILE", help_heading = "Mode")]
    pub batch_file: Option<PathBuf>,

    // --- 下载选项 (Options) ---
    /// 输出文件路径 (批量模式下为输出目录)
    #[arg(short, long, value_name = "PATH", help_heading = "Options")]
    pub output: Option<PathBuf>,
    /// 分片临时目录 (默认在输出文件旁自动创建；下载失败时保留以便诊断)
    #[arg(long, value_name = "DIR", help_heading = "Options")]
    pub temp_dir: Option<PathBuf>,
    /// 设置最大并发下载数
    #[arg(short, long, value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub workers: Option<usize>,
    /// 单个请求的超时时间 (秒)
    #[arg(long, value_name = "SECS", help_heading = "Options")]
    pub timeout: Option<u64>,
    /// 合并成功后仍保留分片临时目录
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub keep_temp: bool,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
