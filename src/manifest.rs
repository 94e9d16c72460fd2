// src/manifest.rs

use crate::error::{AppError, AppResult};
use url::Url;

/// 播放列表中的一个分片。索引为 0 起始、连续且唯一，即声明顺序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub url: Url,
}

/// 解析后的播放列表。声明顺序即最终的合并顺序，解析完成后不可变。
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    segments: Vec<Segment>,
}

impl Manifest {
    /// 解析 m3u8 文本，将相对地址按 `base_url` 解析为绝对地址。
    /// 解析器本身不做任何网络请求；语法错误直接报错，不猜测恢复。
    pub fn parse(text: &str, base_url: &Url) -> AppResult<Self> {
        let playlist = m3u8_rs::parse_playlist_res(text.as_bytes())
            .map_err(|e| AppError::ManifestParse(e.to_string()))?;

        let media = match playlist {
            m3u8_rs::Playlist::MediaPlaylist(media) => media,
            m3u8_rs::Playlist::MasterPlaylist(_) => {
                return Err(AppError::ManifestParse(
                    "预期媒体播放列表，但得到主播放列表 (master playlist)".to_string(),
                ));
            }
        };

        let mut segments = Vec::with_capacity(media.segments.len());
        for (index, seg) in media.segments.iter().enumerate() {
            let url = base_url.join(&seg.uri).map_err(|e| {
                AppError::ManifestParse(format!(
                    "分片 {} 的地址 '{}' 无效: {}",
                    index, seg.uri, e
                ))
            })?;
            segments.push(Segment { index, url });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 空清单是合法输入，合并结果为空文件。
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
