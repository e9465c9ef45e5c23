use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::AppError;

use super::models::{FrontMatter, PostIndex, PostRecord};

/// 目录型文章的入口文件（按优先级）
const DIR_ENTRY_FILES: [&str; 2] = ["index.md", "README.md"];

/// 扫描文章目录，解析 front matter，构建有序索引。
///
/// - 目录不存在时返回空索引（仅告警），站点卡片不依赖文章；
/// - 无法读取（含非 UTF-8）、无 front matter 或缺少 title 的文件跳过并告警，
///   只有文章目录本身读取失败才返回错误；
/// - `published: false` 的文章不进入索引。
pub fn load_post_index(dir: &Path) -> Result<PostIndex, AppError> {
    if !dir.exists() {
        tracing::warn!("文章目录不存在，使用空索引: {:?}", dir);
        return Ok(PostIndex::default());
    }

    let mut candidates = collect_candidates(dir)?;
    // 保证遍历顺序稳定，slug 冲突时结果可复现
    candidates.sort();

    let mut seen = HashSet::new();
    let mut posts = Vec::new();
    for (slug, path) in candidates {
        if !seen.insert(slug.clone()) {
            tracing::warn!("重复的文章 slug `{}`，忽略 {:?}", slug, path);
            continue;
        }
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("读取文章失败，跳过 {:?}: {}", path, e);
                continue;
            }
        };
        match parse_post(&slug, &source) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => tracing::debug!("文章未发布，跳过: {}", slug),
            Err(reason) => tracing::warn!("跳过文章 {:?}: {}", path, reason),
        }
    }

    let index = PostIndex::new(posts);
    tracing::info!("文章索引加载完成，共 {} 篇", index.len());
    Ok(index)
}

fn collect_candidates(dir: &Path) -> Result<Vec<(String, PathBuf)>, AppError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::Content(format!("读取文章目录失败 {:?}: {}", dir, e)))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("读取目录项失败，跳过 {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }

        if path.is_dir() {
            if let Some(file) = DIR_ENTRY_FILES
                .iter()
                .map(|f| path.join(f))
                .find(|p| p.is_file())
            {
                out.push((name.to_string(), file));
            }
        } else if path.extension().is_some_and(|ext| ext == "md")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            out.push((stem.to_string(), path.clone()));
        }
    }
    Ok(out)
}

/// 解析单篇文章；`Ok(None)` 表示未发布
pub(super) fn parse_post(slug: &str, source: &str) -> Result<Option<PostRecord>, String> {
    let raw = split_front_matter(source).ok_or_else(|| "缺少 front matter".to_string())?;
    let fm: FrontMatter =
        serde_yaml::from_str(raw).map_err(|e| format!("front matter 解析失败: {e}"))?;

    if fm.published == Some(false) {
        return Ok(None);
    }

    let title = fm
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "缺少 title".to_string())?;

    let date = match fm.date {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(parse_date(&s)?),
        Some(other) => return Err(format!("无法识别的 date: {other:?}")),
    };

    Ok(Some(PostRecord {
        slug: slug.to_string(),
        title,
        description: fm.description.unwrap_or_default().trim().to_string(),
        date,
    }))
}

/// 取 `YYYY-MM-DD` 前缀，允许其后带时间部分
fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|e| format!("date `{raw}` 无效: {e}"))
}

/// 提取首行 `---` 与下一个 `---` 之间的 YAML
fn split_front_matter(source: &str) -> Option<&str> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == "---" {
            return Some(&source[start..offset]);
        }
        offset += line.len();
    }
    None
}
