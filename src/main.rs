use og_backend::features::{analytics, posts};
use og_backend::startup::run_startup_checks;
use og_backend::{AppConfig, AppState, ShutdownManager, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "og_backend=info,tower_http=info,analytics=info".into()),
        )
        .init();

    let shutdown_manager = ShutdownManager::new();

    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // 进程级初始化，只执行一次
    let analytics_mode = analytics::init(&config.analytics, config.environment);

    let post_index = match posts::load_post_index(&config.posts_path()) {
        Ok(index) => index,
        Err(e) => {
            tracing::error!("文章索引加载失败: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, post_index);
    run_startup_checks(config, &app_state).await;

    let app = build_router(config, app_state, analytics_mode);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("OG image: http://{}/og.jpg", addr);
    tracing::info!("RSS: http://{}/rss.xml", addr);
    tracing::info!("Posts API: http://{}{}/posts", addr, config.api.prefix);
    tracing::info!("Docs: http://{}/docs", addr);

    let signal = shutdown_manager.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = signal.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，停止接收新连接...", reason);
    });
    let mut server = std::pin::pin!(server.into_future());

    // 先正常运行；收到信号后，剩余的连接必须在超时时间内处理完
    let result = tokio::select! {
        res = &mut server => Some(res),
        _ = shutdown_manager.wait_for_shutdown() => None,
    };
    let result = match result {
        Some(res) => res,
        None => {
            let timeout = config.shutdown.timeout_duration();
            match shutdown_manager.drain_with_timeout(&mut server, timeout).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!("仍有请求未完成，强制退出");
                    std::process::exit(1);
                }
            }
        }
    };

    if let Err(e) = result {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }
    tracing::info!("服务器已优雅关闭");
}
