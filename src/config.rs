use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::features::og::{CardStyle, FontStyle};

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 控制全量预渲染的环境变量
pub const PRERENDER_ENV: &str = "PRERENDER_ALL";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3939,
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// JSON API 路由前缀
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// CORS 配置（仅作用于只读的公开路由；OG 图片端点自行写入 `*`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default)]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            max_age_secs: None,
        }
    }
}

/// 站点元信息：默认分享卡片与 RSS 频道均取自这里
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    /// 站点根地址（不带结尾斜杠），用于 RSS 链接
    pub url: String,
    pub author: String,
    pub language: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Steve Kinney".to_string(),
            description: "Personal site and course notes".to_string(),
            url: "https://stevekinney.com".to_string(),
            author: "Steve Kinney".to_string(),
            language: "en-us".to_string(),
        }
    }
}

/// 单个字体资源的来源描述
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FontSourceConfig {
    /// 字体族名（需与模板中引用的 family 一致）
    pub name: String,
    pub weight: u16,
    #[serde(default)]
    pub style: FontStyle,
    /// 本地路径或 http(s) URL
    pub source: String,
}

/// 默认字体：正文无衬线两个字重 + 一个展示字体（随仓库分发于 resources/fonts）
pub fn default_fonts() -> Vec<FontSourceConfig> {
    vec![
        FontSourceConfig {
            name: "DejaVu Sans".to_string(),
            weight: 400,
            style: FontStyle::Normal,
            source: "resources/fonts/DejaVuSans.ttf".to_string(),
        },
        FontSourceConfig {
            name: "DejaVu Sans".to_string(),
            weight: 700,
            style: FontStyle::Normal,
            source: "resources/fonts/DejaVuSans-Bold.ttf".to_string(),
        },
        FontSourceConfig {
            name: "DejaVu Serif".to_string(),
            weight: 700,
            style: FontStyle::Normal,
            source: "resources/fonts/DejaVuSerif-Bold.ttf".to_string(),
        },
    ]
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderConfig {
    /// JPEG 质量（1-100）
    #[serde(default = "ImageRenderConfig::default_quality")]
    pub quality: u8,
    /// 是否优先速度渲染（OptimizeSpeed），提升栅格化性能，可能略降画质
    #[serde(default)]
    pub optimize_speed: bool,
    /// 是否在进程内缓存字体字节（不改变输出，仅减少重复读取/下载）
    #[serde(default = "ImageRenderConfig::default_font_cache_enabled")]
    pub font_cache_enabled: bool,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
    /// 是否附带基于内容摘要的 ETag
    #[serde(default)]
    pub emit_etag: bool,
    /// 远程字体请求超时（秒）
    #[serde(default = "ImageRenderConfig::default_font_timeout")]
    pub font_timeout_secs: u64,
}

impl ImageRenderConfig {
    fn default_quality() -> u8 {
        85
    }
    fn default_font_cache_enabled() -> bool {
        true
    }
    fn default_font_timeout() -> u64 {
        30
    }

    /// 实际并发许可数
    pub fn effective_parallelism(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get()
        } else {
            self.max_parallel as usize
        }
    }
}

impl Default for ImageRenderConfig {
    fn default() -> Self {
        Self {
            quality: Self::default_quality(),
            optimize_speed: false,
            font_cache_enabled: Self::default_font_cache_enabled(),
            max_parallel: 0,
            emit_etag: false,
            font_timeout_secs: Self::default_font_timeout(),
        }
    }
}

/// 内容目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// 文章 Markdown 目录
    pub posts_dir: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_dir: "./content/posts".to_string(),
        }
    }
}

/// 运行环境
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Production,
    Development,
}

/// 访问分析配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyticsConfig {
    /// 显式开关；缺省时按运行环境决定（开发环境仅 debug 级别记录）
    #[serde(default)]
    pub enabled: Option<bool>,
    /// 客户端 IP 的 HMAC 盐；未配置（或为空）时事件不包含客户端字段
    #[serde(default)]
    pub ip_salt: Option<String>,
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 预渲染模式（构建期行为，不影响在线管线）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrerenderMode {
    /// 站点卡片 + 全部文章卡片
    All,
    /// 仅站点卡片
    Default,
}

impl PrerenderMode {
    /// 由 `PRERENDER_ALL` 的取值决定：仅 "1" 开启全量预渲染
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => PrerenderMode::All,
            _ => PrerenderMode::Default,
        }
    }

    pub fn from_env() -> Self {
        Self::from_flag(std::env::var(PRERENDER_ENV).ok().as_deref())
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    /// 卡片所需字体（默认三项）
    #[serde(default = "default_fonts")]
    pub fonts: Vec<FontSourceConfig>,
    #[serde(default)]
    pub image: ImageRenderConfig,
    /// 卡片品牌样式
    #[serde(default)]
    pub template: CardStyle,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从 `config.toml`（可选）加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path())
    }

    /// 从指定文件加载；文件不存在时使用默认值，仍叠加环境变量
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("正在从 {:?} 加载配置文件", path);

        let builder = ConfigBuilder::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            // 支持环境变量覆盖，例如：APP_SERVER__PORT
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fonts.is_empty() {
            return Err(ConfigError::Message("fonts 不能为空".to_string()));
        }
        if !(1..=100).contains(&self.image.quality) {
            return Err(ConfigError::Message(format!(
                "image.quality 必须在 1-100 范围内，当前为 {}",
                self.image.quality
            )));
        }
        Ok(())
    }

    /// 获取全局配置单例
    ///
    /// 未调用 `init_global()` 时回退到默认配置。
    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(AppConfig::default)
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取文章目录
    pub fn posts_path(&self) -> PathBuf {
        PathBuf::from(&self.content.posts_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            cors: CorsConfig::default(),
            site: SiteConfig::default(),
            fonts: default_fonts(),
            image: ImageRenderConfig::default(),
            template: CardStyle::default(),
            content: ContentConfig::default(),
            analytics: AnalyticsConfig::default(),
            environment: RuntimeEnvironment::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}
