/*
 * Responsibility
 * - Config 読み込み → tracing 初期化 → Router 組み立て
 * - Middleware の適用 (HTTP 共通 / Bearer)
 * - axum::serve() で起動
 */
use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{api, config::Config, middleware};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.app_env.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        addr = %config.addr,
        production = config.app_env.is_production(),
        "bearer-gate starting"
    );

    let app = build_router(&config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(config: &Config) -> Router {
    let auth = middleware::BearerAuth::secret(config.bearer_secret.clone());

    let router = Router::new().nest("/api/v1", api::v1::routes(auth));
    middleware::http::apply(router, config.request_timeout)
}
