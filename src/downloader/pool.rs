// src/downloader/pool.rs

use super::segment_path;
use crate::{
    client::HttpClient,
    error::{AppError, AppResult},
    manifest::{Manifest, Segment},
    progress::Progress,
};
use futures::{StreamExt, stream};
use log::{debug, warn};
use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// 一轮并发抓取的结果。清单中的每个索引要么成功落盘，要么带着错误记录在案。
#[derive(Debug, Default)]
pub struct FetchReport {
    pub completed: Vec<usize>,
    pub failed: Vec<(usize, AppError)>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn missing_indices(&self) -> Vec<usize> {
        let mut missing: Vec<usize> = self.failed.iter().map(|(i, _)| *i).collect();
        missing.sort_unstable();
        missing
    }
}

/// 有界并发的分片抓取池。同一时刻在途请求数不超过 `max_workers`。
pub struct SegmentFetcherPool {
    client: Arc<HttpClient>,
    max_workers: usize,
    cancellation_token: Arc<AtomicBool>,
}

impl SegmentFetcherPool {
    pub fn new(
        client: Arc<HttpClient>,
        max_workers: usize,
        cancellation_token: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            max_workers,
            cancellation_token,
        }
    }

    /// 并发抓取清单中的全部分片，写入 `temp_dir` 下以索引命名的临时文件。
    /// 单个分片失败不影响其余分片，也不自动重试；失败索引记入报告由调用方裁决。
    /// 每个分片开始前检查取消标志，已在途的请求会自然结束。
    pub async fn fetch_all(
        &self,
        manifest: &Manifest,
        temp_dir: &Path,
        progress: &dyn Progress,
    ) -> AppResult<FetchReport> {
        fs::create_dir_all(temp_dir)?;

        let results: Vec<(usize, Option<AppError>)> = stream::iter(manifest.segments().to_vec())
            .map(|segment| {
                let client = self.client.clone();
                let token = self.cancellation_token.clone();
                let ts_path = segment_path(temp_dir, segment.index);
                async move {
                    if token.load(Ordering::Relaxed) {
                        return (segment.index, Some(AppError::UserInterrupt));
                    }
                    progress.segment_started();
                    let result = Self::fetch_one(&client, &segment, &ts_path).await;
                    progress.segment_finished(result.is_ok());
                    (segment.index, result.err())
                }
            })
            .buffer_unordered(self.max_workers.max(1))
            .collect()
            .await;

        if self.cancellation_token.load(Ordering::Relaxed) {
            return Err(AppError::UserInterrupt);
        }

        let mut report = FetchReport::default();
        for (index, err) in results {
            match err {
                None => report.completed.push(index),
                Some(e) => {
                    warn!("{}", e);
                    report.failed.push((index, e));
                }
            }
        }
        report.completed.sort_unstable();
        debug!(
            "抓取完成: {} 成功, {} 失败",
            report.completed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// 获取单个分片。响应体完整到手后才写入目标文件，
    /// 失败的分片不会在磁盘上留下半截内容。
    async fn fetch_one(
        client: &HttpClient,
        segment: &Segment,
        ts_path: &Path,
    ) -> AppResult<()> {
        let fetch = async {
            let data = client.get(segment.url.clone()).await?.bytes().await?;
            fs::write(ts_path, &data)?;
            Ok::<_, AppError>(())
        };
        fetch.await.map_err(|e| AppError::SegmentFetch {
            index: segment.index,
            source: anyhow::Error::new(e),
        })
    }
}
