// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";

pub const DEFAULT_OUTPUT_FILE: &str = "video.mp4";
pub const DEFAULT_WORKERS: usize = 5;
pub const TEMP_DIR_PREFIX: &str = "ts_dl_seg_";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_REFERER: &str = "https://www.example.com/";
