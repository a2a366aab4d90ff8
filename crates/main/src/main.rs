//! 主应用程序入口
//!
//! 组装聊天核心并启动 Axum Web API 服务。

use std::sync::Arc;

use application::{Dispatcher, DispatcherDependencies, SystemClock};
use config::AppConfig;
use infrastructure::{create_pg_pool, JwtIdentityVerifier, PgMessageStore};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置
    let app_config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        app_config.database.url.split('@').last().unwrap_or("unknown")
    );

    // 创建 PostgreSQL 连接池并运行迁移
    let pg_pool = create_pg_pool(
        &app_config.database.url,
        app_config.database.max_connections,
    )
    .await?;
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 基础设施适配器
    let store = Arc::new(PgMessageStore::new(pg_pool));
    let verifier = Arc::new(JwtIdentityVerifier::new(&app_config.jwt));

    // 聊天核心：协议状态机 + 房间注册表
    let dispatcher = Arc::new(Dispatcher::new(DispatcherDependencies {
        verifier: verifier.clone(),
        store: store.clone(),
        clock: Arc::new(SystemClock),
    }));

    let state = AppState::new(dispatcher, verifier, store, app_config.chat.clone());

    // 启动 Web 服务器
    let app = router(state);
    let bind_addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("聊天服务器启动在 http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
