use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（低到高）：
    /// 1. 内置默认值
    /// 2. ./penwatch.toml（或 PENWATCH_CONFIG 指定的文件）
    /// 3. PENWATCH_ 前缀环境变量，`__` 分隔层级
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var("PENWATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("PENWATCH_").split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.polling.interval_secs == 0 {
            return Err(ConfigValidationError::InvalidInterval);
        }

        if config.reddit.limit == 0 || config.reddit.limit > 100 {
            return Err(ConfigValidationError::InvalidLimit(config.reddit.limit));
        }

        if config.reddit.subreddit.trim().is_empty() {
            return Err(ConfigValidationError::MissingSubreddit);
        }

        let threshold = config.resolver.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidThreshold(threshold));
        }

        if config.polling.enabled
            && (config.discord.bot_token.is_empty() || config.discord.channel_id.is_empty())
        {
            return Err(ConfigValidationError::MissingDiscordCredentials);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("server port must be greater than 0")]
    InvalidPort,

    #[error("polling interval must be greater than 0 seconds")]
    InvalidInterval,

    #[error("reddit fetch limit must be between 1 and 100, got {0}")]
    InvalidLimit(u32),

    #[error("no subreddit configured")]
    MissingSubreddit,

    #[error("resolver threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("polling is enabled but discord.bot_token or discord.channel_id is missing")]
    MissingDiscordCredentials,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("penwatch.toml")
}
