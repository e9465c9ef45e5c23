use minijinja::{AutoEscape, Environment};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::SiteConfig;
use crate::error::AppError;

use super::models::{PostIndex, PostRecord};

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

const RSS_TEMPLATE_NAME: &str = "rss.xml";
const RSS_TEMPLATE: &str = include_str!("../../../resources/templates/feed/rss.xml.jinja");

static FEED_ENV: OnceCell<Environment<'static>> = OnceCell::new();

fn feed_env() -> Result<&'static Environment<'static>, AppError> {
    FEED_ENV.get_or_try_init(|| {
        let mut env = Environment::new();
        // 转义统一交给 `xml` 过滤器，HTML 转义会把 `/` 也编码掉
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("xml", escape_xml);
        env.add_template(RSS_TEMPLATE_NAME, RSS_TEMPLATE)?;
        Ok(env)
    })
}

fn escape_xml(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Serialize)]
struct FeedItem {
    title: String,
    link: String,
    description: String,
    pub_date: Option<String>,
}

#[derive(Serialize)]
struct FeedSite<'a> {
    title: &'a str,
    description: &'a str,
    url: &'a str,
    author: &'a str,
    language: &'a str,
}

/// 文章发布日按 UTC 零点输出 RFC 2822
fn rfc2822(post: &PostRecord) -> Option<String> {
    post.date
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc2822())
}

/// 生成 RSS 2.0 文档。
///
/// `lastBuildDate` 取最新文章日期而非当前时间，相同索引输出一致。
pub fn render_rss(site: &SiteConfig, posts: &PostIndex) -> Result<String, AppError> {
    let base = site.url.trim_end_matches('/');
    let items: Vec<FeedItem> = posts
        .iter()
        .map(|p| FeedItem {
            title: p.title.clone(),
            link: format!("{base}/{}", p.slug),
            description: p.description.clone(),
            pub_date: rfc2822(p),
        })
        .collect();
    let last_build_date = posts.iter().find_map(rfc2822);

    let ctx = minijinja::context! {
        site => FeedSite {
            title: &site.title,
            description: &site.description,
            url: base,
            author: &site.author,
            language: &site.language,
        },
        items => items,
        last_build_date => last_build_date,
    };
    let tpl = feed_env()?.get_template(RSS_TEMPLATE_NAME)?;
    Ok(tpl.render(ctx)?)
}
