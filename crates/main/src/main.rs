//! 主应用程序入口
//!
//! 加载配置、连接数据库并启动 Axum Web API 服务。

use std::{net::SocketAddr, sync::Arc};

use application::{
    AnalyticsService, AnalyticsServiceDependencies, BlogService, BlogServiceDependencies,
    ClientRateLimiter, Clock, EntityListConfig, JobApplicationService,
    JobApplicationServiceDependencies, ProfileService, ProfileServiceDependencies,
    RateLimitSettings, SystemClock, SystemMonotonicClock, APPLICATION_LIST, POST_LIST,
};
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use web_api::{cors_layer, router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    info!(config = %config.sanitize(), "configuration loaded");

    let infrastructure = Infrastructure::connect(InfrastructureConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        run_migrations: config.database.run_migrations,
    })
    .await?;
    let storage = infrastructure.storage;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let page_sizes = |list: EntityListConfig| {
        list.with_page_sizes(
            config.listing.default_page_size,
            config.listing.max_page_size,
        )
    };

    // 创建应用层服务
    let application_service = JobApplicationService::new(JobApplicationServiceDependencies {
        repository: storage.application_repository.clone(),
        note_repository: storage.application_repository.clone(),
        clock: clock.clone(),
        list_config: page_sizes(APPLICATION_LIST),
    });

    let analytics_service = AnalyticsService::new(AnalyticsServiceDependencies {
        repository: storage.application_repository.clone(),
    });

    let blog_service = BlogService::new(BlogServiceDependencies {
        post_repository: storage.post_repository.clone(),
        comment_repository: storage.comment_repository.clone(),
        like_repository: storage.like_repository.clone(),
        clock: clock.clone(),
        list_config: page_sizes(POST_LIST),
        max_comment_depth: config.comments.max_depth,
    });

    let profile_service = ProfileService::new(ProfileServiceDependencies {
        follow_repository: storage.follow_repository.clone(),
        post_repository: storage.post_repository.clone(),
        clock,
        list_config: page_sizes(POST_LIST),
    });

    let rate_limiter = ClientRateLimiter::start(
        RateLimitSettings {
            rate_per_second: config.rate_limit.rate_per_second,
            burst: config.rate_limit.burst,
            idle_eviction_threshold: config.rate_limit.idle_eviction_threshold(),
            sweep_interval: config.rate_limit.sweep_interval(),
        },
        Arc::new(SystemMonotonicClock),
    );

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(
        Arc::new(application_service),
        Arc::new(analytics_service),
        Arc::new(blog_service),
        Arc::new(profile_service),
        rate_limiter.clone(),
        jwt_service,
    );

    // 启动 Web 服务器
    let app = router(state).layer(cors_layer(&config.server.cors_origins));
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!("服务器启动在 http://{}", address);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    rate_limiter.shutdown().await;
    info!("服务器已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
