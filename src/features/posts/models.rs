use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::og::PageMetadata;

/// 文章索引中的一条记录（只包含 front matter 元信息，不含正文）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PostRecord {
    /// URL 中使用的短名（文件名或目录名）
    #[schema(example = "rust-ownership")]
    pub slug: String,
    #[schema(example = "Ownership in Rust")]
    pub title: String,
    pub description: String,
    /// 发布日期（YYYY-MM-DD），缺失时为 null
    #[schema(value_type = Option<String>, example = "2024-05-01")]
    pub date: Option<NaiveDate>,
}

impl PostRecord {
    /// 文章卡片的文字输入
    pub fn metadata(&self) -> PageMetadata {
        PageMetadata::new(self.title.clone(), self.description.clone())
    }
}

/// front matter 原始结构
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct FrontMatter {
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// 兼容 YAML 中写成日期或字符串的两种情况，统一在加载时解析
    #[serde(default)]
    pub date: Option<serde_yaml::Value>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// 有序文章索引：日期倒序，同日按 slug 升序
#[derive(Debug, Clone, Default)]
pub struct PostIndex {
    posts: Vec<PostRecord>,
}

impl PostIndex {
    pub fn new(mut posts: Vec<PostRecord>) -> Self {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Self { posts }
    }

    pub fn get(&self, slug: &str) -> Option<&PostRecord> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostRecord> {
        self.posts.iter()
    }

    pub fn as_slice(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// `GET {prefix}/posts` 响应
#[derive(Debug, Serialize, ToSchema)]
pub struct PostListResponse {
    pub total: usize,
    pub items: Vec<PostRecord>,
}
