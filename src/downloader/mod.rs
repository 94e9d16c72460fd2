// src/downloader/mod.rs

mod assembler;
mod direct;
mod job;
mod pool;

pub use assembler::assemble;
pub use direct::DirectDownloader;
pub use job::M3u8Job;
pub use pool::{FetchReport, SegmentFetcherPool};

use std::path::{Path, PathBuf};

/// 分片临时文件的命名规则。索引即键，彼此互不冲突，
/// 因此多个下载任务可以无锁共享同一个临时目录。
pub fn segment_path(temp_dir: &Path, index: usize) -> PathBuf {
    temp_dir.join(format!("{:05}.ts", index))
}
