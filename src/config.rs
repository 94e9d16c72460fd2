// src/config.rs

use crate::{cli::Cli, constants, error::AppResult};
use anyhow::{Context, anyhow};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    constants::DEFAULT_WORKERS
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        // 为网络参数提供一组稳健的默认值
        Self {
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(30),
                user_agent: Some(constants::USER_AGENT.into()),
                referer: Some(constants::DEFAULT_REFERER.into()),
            },
            max_workers: constants::DEFAULT_WORKERS,
        }
    }
}

fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| anyhow!("无法获取用户主目录"))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(Into::into)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default_app_config();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json_content)?;

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub user_agent: String,
    pub referer: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub keep_temp: bool,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external = load_or_create_external_config()?;

        Ok(Self {
            // 命令行参数优先于配置文件；并发数下限为 1
            max_workers: args.workers.unwrap_or(external.max_workers).max(1),
            user_agent: external
                .network
                .user_agent
                .unwrap_or_else(|| constants::USER_AGENT.into()),
            referer: external.network.referer,
            connect_timeout: Duration::from_secs(
                external.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(
                args.timeout.or(external.network.timeout_secs).unwrap_or(30),
            ),
            keep_temp: args.keep_temp,
        })
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            user_agent: "test-agent/1.0".to_string(),
            referer: None,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            keep_temp: false,
        }
    }
}
