// src/downloader/job.rs

use super::{assemble, pool::SegmentFetcherPool, segment_path};
use crate::{
    DownloadJobContext, constants, error::*, manifest::Manifest, progress::Progress, symbols,
};
use log::{info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

/// 一次完整的 m3u8 下载任务: 解析清单 → 并发抓取 → 顺序合并 → 清理。
pub struct M3u8Job {
    context: DownloadJobContext,
}

impl M3u8Job {
    pub fn new(context: DownloadJobContext) -> Self {
        Self { context }
    }

    pub async fn run(
        &self,
        m3u8_url: &str,
        output_path: &Path,
        progress: &dyn Progress,
    ) -> AppResult<()> {
        let url = Url::parse(m3u8_url)?;
        info!("解析 m3u8 清单: {}", url);
        let playlist_text = self.context.http_client.get(url.clone()).await?.text().await?;
        let manifest = Manifest::parse(&playlist_text, &url)?;

        println!(
            "{} 找到 {} 个分片 (并发数: {})",
            *symbols::INFO,
            manifest.len(),
            self.context.config.max_workers
        );
        progress.set_total(manifest.len() as u64);

        let temp_dir = self.resolve_temp_dir(output_path)?;

        let pool = SegmentFetcherPool::new(
            self.context.http_client.clone(),
            self.context.config.max_workers,
            self.context.cancellation_token.clone(),
        );
        let report = pool.fetch_all(&manifest, &temp_dir, progress).await?;

        // 集合不完整则整体拒绝合并，临时目录原样保留供人工诊断
        if !report.is_complete() {
            let missing = report.missing_indices();
            warn!(
                "{} 个分片下载失败，临时目录保留在 {:?}",
                missing.len(),
                temp_dir
            );
            eprintln!(
                "{} 部分分片下载失败，临时文件保留在 {} 以便诊断。",
                *symbols::WARN,
                temp_dir.display()
            );
            return Err(AppError::IncompleteAssembly { missing, temp_dir });
        }

        assemble(&temp_dir, manifest.len(), output_path)?;
        self.cleanup(&temp_dir, manifest.len())?;
        info!("视频下载完成: {:?}", output_path);
        Ok(())
    }

    /// 用户用 --temp-dir 指定了就用指定目录，否则在输出文件旁创建一个。
    /// 目录不随进程退出自动删除，失败的残留分片才能留得下来。
    fn resolve_temp_dir(&self, output_path: &Path) -> AppResult<PathBuf> {
        if let Some(dir) = &self.context.args.temp_dir {
            fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }
        let parent = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(constants::TEMP_DIR_PREFIX)
            .tempdir_in(parent)?
            .keep();
        Ok(dir)
    }

    /// 合并成功后移除分片临时目录；--keep-temp 时只提示位置。
    fn cleanup(&self, temp_dir: &Path, num_segments: usize) -> AppResult<()> {
        if self.context.config.keep_temp {
            println!(
                "{} 按要求保留分片临时目录: {}",
                *symbols::INFO,
                temp_dir.display()
            );
            return Ok(());
        }
        for i in 0..num_segments {
            let ts_path = segment_path(temp_dir, i);
            if ts_path.exists() {
                fs::remove_file(ts_path)?;
            }
        }
        // 用户指定的目录里可能有无关文件，目录移除失败降级为告警
        if let Err(e) = fs::remove_dir(temp_dir) {
            warn!("无法移除临时目录 {:?}: {}", temp_dir, e);
        }
        Ok(())
    }
}
