//! 构建期预渲染：把卡片与 RSS 写成静态文件，交给 CDN 直接分发。

use std::path::{Path, PathBuf};

use crate::config::PrerenderMode;
use crate::error::AppError;
use crate::features::og::PageMetadata;
use crate::features::posts::render_rss;
use crate::state::AppState;

/// 预渲染结果（写出的文件列表，按写出顺序）
#[derive(Debug, Default)]
pub struct PrerenderReport {
    pub files: Vec<PathBuf>,
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("创建目录 {:?} 失败: {e}", parent)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::Internal(format!("写入 {:?} 失败: {e}", path)))
}

/// 按模式写出静态产物。
///
/// - 始终写出 `og.jpg` 与 `rss.xml`；
/// - `PrerenderMode::All` 额外写出 `og/posts/<slug>.jpg`。
pub async fn prerender(
    state: &AppState,
    mode: PrerenderMode,
    out_dir: &Path,
) -> Result<PrerenderReport, AppError> {
    let mut report = PrerenderReport::default();

    let site = PageMetadata::new(state.site.title.clone(), state.site.description.clone());
    let image = state.og.render(&site).await?;
    let path = out_dir.join("og.jpg");
    write_file(&path, &image.bytes).await?;
    report.files.push(path);

    if mode == PrerenderMode::All {
        for post in state.posts.iter() {
            let image = state.og.render(&post.metadata()).await?;
            let path = out_dir
                .join("og")
                .join("posts")
                .join(format!("{}.jpg", post.slug));
            write_file(&path, &image.bytes).await?;
            report.files.push(path);
        }
    }

    let rss = render_rss(&state.site, &state.posts)?;
    let path = out_dir.join("rss.xml");
    write_file(&path, rss.as_bytes()).await?;
    report.files.push(path);

    tracing::info!(
        "预渲染完成: 模式={:?}, 文件数={}, 输出目录={:?}",
        mode,
        report.files.len(),
        out_dir
    );
    Ok(report)
}
