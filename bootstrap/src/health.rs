//! 健康检查模块
//!
//! 提供 /health、/ready 和 /metrics 端点

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sentinel_adapter_postgres::check_connection;
use serde::Serialize;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::shutdown_signal;

/// 健康检查状态
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub checks: Vec<ComponentHealth>,
}

/// 组件健康状态
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            checks: vec![],
        }
    }

    pub fn add_check(&mut self, check: ComponentHealth) {
        if check.status != "healthy" {
            self.status = "unhealthy";
        }
        self.checks.push(check);
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl ComponentHealth {
    pub fn healthy(name: &'static str) -> Self {
        Self {
            name,
            status: "healthy",
            message: None,
        }
    }

    pub fn unhealthy(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: "unhealthy",
            message: Some(message.into()),
        }
    }
}

#[derive(Clone)]
struct HealthState {
    pool: PgPool,
    metrics: PrometheusHandle,
}

/// 构建健康检查路由
pub fn health_router(pool: PgPool, metrics: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(HealthState { pool, metrics })
}

/// HTTP 健康检查服务器
pub struct HealthServer {
    router: Router,
    addr: SocketAddr,
}

impl HealthServer {
    pub fn new(pool: PgPool, metrics: PrometheusHandle, addr: SocketAddr) -> Self {
        Self {
            router: health_router(pool, metrics),
            addr,
        }
    }

    /// 启动服务器，收到关闭信号后优雅退出
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Health check HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Liveness：只说明进程在运行
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::healthy()))
}

/// Readiness：检查数据库连接
async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut status = HealthStatus::healthy();
    status.add_check(match check_connection(&state.pool).await {
        Ok(()) => ComponentHealth::healthy("postgres"),
        Err(e) => ComponentHealth::unhealthy("postgres", e.to_string()),
    });

    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
