//! 构建期预渲染工具：写出 `og.jpg`、`rss.xml`，
//! `PRERENDER_ALL=1`（或 `--all`）时额外写出全部文章卡片。

use std::path::PathBuf;

use og_backend::config::PrerenderMode;
use og_backend::features::posts::load_post_index;
use og_backend::prerender::prerender;
use og_backend::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "og_backend=info".into()),
        )
        .try_init();

    let args = Args::parse(std::env::args().skip(1).collect());
    if args.help {
        print_help();
        return Ok(());
    }

    let config = match args.config_path.as_deref() {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let mode = if args.all {
        PrerenderMode::All
    } else {
        PrerenderMode::from_env()
    };

    let posts = load_post_index(&config.posts_path())?;
    let state = AppState::new(&config, posts);
    let report = prerender(&state, mode, &args.out_dir).await?;

    for file in &report.files {
        println!("已写入: {}", file.display());
    }
    Ok(())
}

struct Args {
    help: bool,
    all: bool,
    out_dir: PathBuf,
    config_path: Option<PathBuf>,
}

impl Args {
    fn parse(argv: Vec<String>) -> Self {
        let mut args = Self {
            help: false,
            all: false,
            out_dir: PathBuf::from("dist"),
            config_path: None,
        };

        let mut it = argv.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "-h" | "--help" => args.help = true,
                "--all" => args.all = true,
                "--out" => {
                    if let Some(v) = it.next() {
                        args.out_dir = PathBuf::from(v);
                    }
                }
                "--config" => {
                    args.config_path = it.next().map(PathBuf::from);
                }
                _ => {}
            }
        }
        args
    }
}

fn print_help() {
    println!(
        r#"og_prerender（构建期预渲染）

用法：
  PRERENDER_ALL=1 cargo run --bin og_prerender -- --out dist

参数：
  --out DIR         输出目录（默认 dist）
  --all             等同于 PRERENDER_ALL=1：同时写出全部文章卡片
  --config PATH     配置文件（默认 ./config.toml，可缺省）
"#
    );
}
