//! 访问分析：进程启动时初始化一次，之后只读。

mod middleware;

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::{AnalyticsConfig, RuntimeEnvironment};

pub use middleware::analytics_middleware;

static MODE: OnceCell<AnalyticsMode> = OnceCell::new();

/// 分析上报模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMode {
    /// 正式上报（info 级别事件）
    Production,
    /// 开发环境：事件降为 debug 级别，便于本地观察而不污染日志
    Development,
    Disabled,
}

impl AnalyticsMode {
    /// 显式开关优先；未配置时跟随运行环境
    pub fn decide(cfg: &AnalyticsConfig, env: RuntimeEnvironment) -> Self {
        match (cfg.enabled, env) {
            (Some(false), _) => AnalyticsMode::Disabled,
            (_, RuntimeEnvironment::Production) => AnalyticsMode::Production,
            (_, RuntimeEnvironment::Development) => AnalyticsMode::Development,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != AnalyticsMode::Disabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalyticsMode::Production => "production",
            AnalyticsMode::Development => "development",
            AnalyticsMode::Disabled => "disabled",
        }
    }
}

/// 中间件状态：模式 + 客户端 IP 的 HMAC 盐
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    pub mode: AnalyticsMode,
    ip_salt: Option<Arc<str>>,
}

impl AnalyticsState {
    pub fn new(mode: AnalyticsMode, ip_salt: Option<&str>) -> Self {
        let ip_salt = ip_salt
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Arc::from);
        if mode.is_enabled() && ip_salt.is_none() {
            tracing::info!("未配置 analytics.ip_salt，访问事件不记录客户端标识");
        }
        Self { mode, ip_salt }
    }

    pub fn disabled() -> Self {
        Self {
            mode: AnalyticsMode::Disabled,
            ip_salt: None,
        }
    }

    pub(crate) fn ip_salt(&self) -> Option<&str> {
        self.ip_salt.as_deref()
    }
}

/// 初始化分析模式；重复调用不会改变首次的结果
pub fn init(cfg: &AnalyticsConfig, env: RuntimeEnvironment) -> AnalyticsMode {
    let wanted = AnalyticsMode::decide(cfg, env);
    let mode = *MODE.get_or_init(|| {
        tracing::info!("访问分析已初始化: {}", wanted.as_str());
        wanted
    });
    if mode != wanted {
        tracing::debug!("访问分析已初始化为 {}，忽略 {}", mode.as_str(), wanted.as_str());
    }
    mode
}

/// 当前模式（未初始化视为关闭）
pub fn mode() -> AnalyticsMode {
    MODE.get().copied().unwrap_or(AnalyticsMode::Disabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_flag_then_environment() {
        let unset = AnalyticsConfig::default();
        let off = AnalyticsConfig {
            enabled: Some(false),
            ..Default::default()
        };
        let on = AnalyticsConfig {
            enabled: Some(true),
            ..Default::default()
        };
        assert_eq!(
            AnalyticsMode::decide(&unset, RuntimeEnvironment::Production),
            AnalyticsMode::Production
        );
        assert_eq!(
            AnalyticsMode::decide(&unset, RuntimeEnvironment::Development),
            AnalyticsMode::Development
        );
        assert_eq!(
            AnalyticsMode::decide(&off, RuntimeEnvironment::Production),
            AnalyticsMode::Disabled
        );
        assert_eq!(
            AnalyticsMode::decide(&on, RuntimeEnvironment::Development),
            AnalyticsMode::Development
        );
    }

    #[test]
    fn init_runs_once() {
        let first = init(&AnalyticsConfig::default(), RuntimeEnvironment::Development);
        let second = init(
            &AnalyticsConfig {
                enabled: Some(false),
                ..Default::default()
            },
            RuntimeEnvironment::Production,
        );
        assert_eq!(first, second);
        assert_eq!(mode(), first);
    }

    #[test]
    fn blank_salt_counts_as_unset() {
        let state = AnalyticsState::new(AnalyticsMode::Production, Some("   "));
        assert_eq!(state.ip_salt(), None);
        let state = AnalyticsState::new(AnalyticsMode::Production, Some("pepper"));
        assert_eq!(state.ip_salt(), Some("pepper"));
    }
}
