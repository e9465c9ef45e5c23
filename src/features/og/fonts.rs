use std::path::PathBuf;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::future::try_join_all;
use moka::future::Cache;

use crate::config::FontSourceConfig;
use crate::error::AppError;

use super::types::{FontAsset, FontStyle};

/// 字体来源：本地文件或远程 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Url(String),
}

impl FontSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            FontSource::Url(raw.to_string())
        } else {
            FontSource::File(PathBuf::from(raw))
        }
    }

    fn cache_key(&self) -> String {
        match self {
            FontSource::File(p) => format!("file:{}", p.display()),
            FontSource::Url(u) => format!("url:{u}"),
        }
    }
}

impl std::fmt::Display for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontSource::File(p) => write!(f, "{}", p.display()),
            FontSource::Url(u) => f.write_str(u),
        }
    }
}

#[derive(Debug, Clone)]
struct FontEntry {
    name: String,
    weight: u16,
    style: FontStyle,
    source: FontSource,
}

/// 字体加载器。
///
/// 每次调用 `load_all` 并发获取全部字体；启用缓存时仅缓存成功结果，
/// 失败永远不会被缓存，下一次请求会重新尝试。
#[derive(Clone)]
pub struct FontLoader {
    entries: Vec<FontEntry>,
    cache: Option<Cache<String, Bytes>>,
    timeout: Duration,
}

impl FontLoader {
    pub fn new(fonts: &[FontSourceConfig], cache_enabled: bool, timeout: Duration) -> Self {
        let entries = fonts
            .iter()
            .map(|f| FontEntry {
                name: f.name.clone(),
                weight: f.weight,
                style: f.style,
                source: FontSource::parse(&f.source),
            })
            .collect();
        let cache = cache_enabled.then(|| Cache::builder().max_capacity(64).build());
        Self {
            entries,
            cache,
            timeout,
        }
    }

    /// 所有已配置来源（启动检查使用）
    pub fn sources(&self) -> impl Iterator<Item = &FontSource> {
        self.entries.iter().map(|s| &s.source)
    }

    /// 并发获取全部字体；任一失败即整体失败
    pub async fn load_all(&self) -> Result<Vec<FontAsset>, AppError> {
        try_join_all(self.entries.iter().map(|entry| self.load_one(entry))).await
    }

    async fn load_one(&self, entry: &FontEntry) -> Result<FontAsset, AppError> {
        let data = self.fetch_cached(&entry.source).await.map_err(|e| {
            tracing::warn!(
                "字体获取失败 `{} {}` ({}): {}",
                entry.name,
                entry.weight,
                entry.source,
                e
            );
            e
        })?;
        Ok(FontAsset {
            name: entry.name.clone(),
            weight: entry.weight,
            style: entry.style,
            data,
        })
    }

    async fn fetch_cached(&self, source: &FontSource) -> Result<Bytes, AppError> {
        let Some(cache) = self.cache.as_ref() else {
            return self.fetch(source).await;
        };
        let key = source.cache_key();
        if let Some(hit) = cache.get(&key).await {
            return Ok(hit);
        }
        let data = self.fetch(source).await?;
        cache.insert(key, data.clone()).await;
        Ok(data)
    }

    async fn fetch(&self, source: &FontSource) -> Result<Bytes, AppError> {
        let data = match source {
            FontSource::File(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| AppError::FontFetch(format!("读取 {} 失败: {e}", path.display())))?,
            FontSource::Url(url) => {
                let client = crate::http::client_with_timeout(self.timeout)?;
                let resp = client.get(url).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(AppError::FontFetch(format!("{url} 返回 {status}")));
                }
                resp.bytes().await?
            }
        };
        if data.is_empty() {
            return Err(AppError::FontFetch(format!("{source} 内容为空")));
        }
        Ok(data)
    }
}
