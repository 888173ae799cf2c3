use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 别名文件路径
    pub alias_file: PathBuf,
    /// 监控列表文件路径
    pub monitoring_file: PathBuf,
    /// 已读帖子数据库路径
    pub seen_posts_db: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            alias_file: PathBuf::from("pen_aliases.txt"),
            monitoring_file: PathBuf::from("monitoring.txt"),
            seen_posts_db: PathBuf::from("seen_posts.db"),
        }
    }
}

/// Reddit 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// OAuth client id; empty means anonymous public endpoints
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// 监控的子版块
    pub subreddit: String,
    /// 帖子 flair 过滤
    pub flair: String,
    /// 每次抓取数量
    pub limit: u32,
    /// OAuth token endpoint host
    pub auth_base: String,
    /// API host used with a token
    pub oauth_api_base: String,
    /// API host used without a token
    pub public_api_base: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: format!("penwatch/{}", env!("CARGO_PKG_VERSION")),
            subreddit: "Pen_Swap".into(),
            flair: "WTS-OPEN".into(),
            limit: 10,
            auth_base: "https://www.reddit.com".into(),
            oauth_api_base: "https://oauth.reddit.com".into(),
            public_api_base: "https://www.reddit.com".into(),
            timeout_secs: 30,
        }
    }
}

impl RedditConfig {
    /// Lucene query restricting results to the configured flair
    pub fn query(&self) -> String {
        format!("flair_name:\"{}\"", self.flair)
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Discord 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token
    pub bot_token: String,
    /// 通知频道 ID
    pub channel_id: String,
    /// API 地址
    pub api_base: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            api_base: "https://discord.com/api/v10".into(),
            timeout_secs: 30,
        }
    }
}

/// 轮询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// 是否启用后台轮询
    pub enabled: bool,
    /// 轮询间隔（秒）
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

/// 模糊匹配配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 最低相似度 (0.0-1.0]
    pub threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { threshold: 0.6 }
    }
}

/// 目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 别名文件不存在时写入默认笔款
    pub seed_defaults: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { seed_defaults: true }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 存储配置
    pub storage: StorageConfig,
    /// Reddit 配置
    pub reddit: RedditConfig,
    /// Discord 配置
    pub discord: DiscordConfig,
    /// 轮询配置
    pub polling: PollingConfig,
    /// 模糊匹配配置
    pub resolver: ResolverConfig,
    /// 目录配置
    pub catalog: CatalogConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            storage: StorageConfig {
                alias_file: PathBuf::from("./data/pen_aliases.txt"),
                monitoring_file: PathBuf::from("./data/monitoring.txt"),
                seen_posts_db: PathBuf::from("./data/seen_posts.db"),
            },
            polling: PollingConfig {
                enabled: false,
                interval_secs: 10,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: Some(PathBuf::from("./logs")),
            },
            ..Self::default()
        }
    }
}
