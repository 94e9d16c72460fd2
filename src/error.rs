// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("M3U8 解析错误: {0}")]
    ManifestParse(String),
    #[error("分片 {index} 下载失败: {source}")]
    SegmentFetch {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error(
        "分片集合不完整，拒绝合并: 缺失 {} 个分片 {:?} (临时目录保留在 {})",
        .missing.len(),
        .missing,
        .temp_dir.display()
    )]
    IncompleteAssembly {
        missing: Vec<usize>,
        temp_dir: PathBuf,
    },
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("用户中断")]
    UserInterrupt,
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
