use crate::config::AppConfig;
use crate::features::og::FontSource;
use crate::state::AppState;

/// 执行启动检查（只告警，不阻断启动）
///
/// 1. 检查文章目录
/// 2. 检查本地字体文件
/// 3. 预热字体缓存
pub async fn run_startup_checks(config: &AppConfig, state: &AppState) {
    tracing::info!("🔍 开始执行启动检查...");

    check_posts_dir(config);
    let missing = missing_local_fonts(state);
    for path in &missing {
        tracing::warn!("⚠️ 字体文件不存在: {}，卡片请求将返回 500", path);
    }

    if config.image.font_cache_enabled && missing.is_empty() {
        let t_prewarm = std::time::Instant::now();
        match state.og.prewarm().await {
            Ok(n) => tracing::info!(
                "字体缓存预热完成: {} 个字体, {}ms",
                n,
                t_prewarm.elapsed().as_millis()
            ),
            Err(e) => tracing::warn!("字体缓存预热失败: {}", e),
        }
    }

    tracing::info!("✅ 启动检查完成");
}

fn check_posts_dir(config: &AppConfig) {
    let dir = config.posts_path();
    if dir.is_dir() {
        tracing::info!("✅ 文章目录: {:?}", dir);
    } else {
        tracing::warn!("📁 文章目录不存在: {:?}，文章列表与 RSS 将为空", dir);
    }
}

/// 返回缺失的本地字体路径（远程字体不在此检查）
fn missing_local_fonts(state: &AppState) -> Vec<String> {
    state
        .og
        .fonts()
        .sources()
        .filter_map(|s| match s {
            FontSource::File(p) if !p.is_file() => Some(p.display().to_string()),
            _ => None,
        })
        .collect()
}
