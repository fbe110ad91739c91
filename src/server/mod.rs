//! HTTP API: scenario routes plus mapping listing and health endpoints.

mod handlers;
mod router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;

use crate::core::etl::EtlEngine;
use crate::core::ScenarioSource;
use crate::utils::error::{EtlError, Result};

/// 路由共用的狀態；來源以 trait object 形式共享
pub type SharedEngine = Arc<EtlEngine<Arc<dyn ScenarioSource>>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub engine: SharedEngine,
    pub started_at: Instant,
}

/// 建立路由，供伺服器或測試（`tower::ServiceExt::oneshot`）使用
pub fn app(engine: SharedEngine) -> Router {
    router::build_router(AppState {
        engine,
        started_at: Instant::now(),
    })
}

pub struct ApiServer {
    addr: SocketAddr,
    engine: SharedEngine,
}

impl ApiServer {
    pub fn new(bind: &str, port: u16, engine: SharedEngine) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("🔶 Binding to 0.0.0.0, the API is reachable from other hosts");
        }

        Self { addr, engine }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// 啟動 HTTP 伺服器，收到 Ctrl-C 時優雅關閉
    pub async fn serve(self) -> Result<()> {
        let router = app(self.engine);

        let listener = tokio::net::TcpListener::bind(self.addr).await.map_err(|e| {
            EtlError::ConfigError {
                message: format!("failed to bind {}: {}", self.addr, e),
            }
        })?;
        tracing::info!("🚀 API listening on http://{}", self.addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
                tracing::info!("👋 Shutting down API server");
            })
            .await?;

        Ok(())
    }
}
