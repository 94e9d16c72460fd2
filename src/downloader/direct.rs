// src/downloader/direct.rs

use crate::{DownloadJobContext, error::*, progress::Progress};
use futures::StreamExt;
use log::info;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
    sync::atomic::Ordering,
};

/// 直链文件下载 (mp4 等非分片资源)，边收边写并上报字节进度。
pub struct DirectDownloader {
    context: DownloadJobContext,
}

impl DirectDownloader {
    pub fn new(context: DownloadJobContext) -> Self {
        Self { context }
    }

    pub async fn download(
        &self,
        url: &str,
        output_path: &Path,
        progress: &dyn Progress,
    ) -> AppResult<()> {
        info!("正在下载直链视频: {}", url);
        let res = self.context.http_client.get(url).await?;
        if let Some(total) = res.content_length() {
            progress.set_total(total);
        }

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let temp_output_path = output_path.with_extension("tmp");
        let mut file = File::create(&temp_output_path)?;
        let mut stream = res.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            if self.context.cancellation_token.load(Ordering::Relaxed) {
                drop(file);
                let _ = fs::remove_file(&temp_output_path);
                return Err(AppError::UserInterrupt);
            }
            let chunk = chunk_result?;
            file.write_all(&chunk)?;
            progress.bytes_received(chunk.len() as u64);
        }
        file.flush()?;
        fs::rename(&temp_output_path, output_path)?;
        info!("直链下载完成: {:?}", output_path);
        Ok(())
    }
}
