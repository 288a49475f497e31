use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 地址
    pub api_base_url: String,
    /// 单次请求超时（毫秒）
    pub request_timeout_ms: u64,
    /// 判定"读完一章"的滚动比例
    pub progress_threshold: f64,
    /// 搜索输入防抖间隔（毫秒）
    pub search_debounce_ms: u64,
    /// 本地键值存储文件（保存 token 与用户资料）
    pub store_path: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://192.168.111.30:3000".to_string(),
            request_timeout_ms: 15_000,
            progress_threshold: 0.80,
            search_debounce_ms: 500,
            store_path: "reader_store.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺失或无法解析的项使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，文件中缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;

        Ok(config)
    }

    /// 加载配置：`READER_CONFIG` 指向的 TOML 文件（可选），再叠加环境变量
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("READER_CONFIG") {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(self.api_base_url),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS").unwrap_or(self.request_timeout_ms),
            progress_threshold: env_parse("PROGRESS_THRESHOLD").unwrap_or(self.progress_threshold),
            search_debounce_ms: env_parse("SEARCH_DEBOUNCE_MS").unwrap_or(self.search_debounce_ms),
            store_path: std::env::var("STORE_PATH").unwrap_or(self.store_path),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
