// src/client.rs

use crate::{config::AppConfig, error::*};
use anyhow::anyhow;
use reqwest::{IntoUrl, Response, header};

/// 共享的 HTTP 客户端，统一携带 UA/Referer 与超时设置。
/// 不做任何自动重试：单个分片的失败由调用方记录并汇总。
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(referer) = &config.referer {
            let value = header::HeaderValue::from_str(referer)
                .map_err(|e| anyhow!("无效的 Referer '{}': {}", referer, e))?;
            headers.insert(header::REFERER, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_workers * 3)
            .build()?;

        Ok(Self { client })
    }

    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.client.get(url).send().await?;
        Ok(res.error_for_status()?)
    }
}
