//! 可观测性模块
//!
//! Prometheus 文本格式的计数器、组件健康状态与日志初始化。

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

// ===== Metrics =====

/// 简单应用指标
#[derive(Clone, Default)]
pub struct AppMetrics {
    pub http_requests_total: Arc<AtomicU64>,
    pub http_request_duration_sum: Arc<AtomicU64>,
    pub cycles_total: Arc<AtomicU64>,
    pub cycles_failed_total: Arc<AtomicU64>,
    pub posts_fetched_total: Arc<AtomicU64>,
    pub posts_notified_total: Arc<AtomicU64>,
    pub notify_failures_total: Arc<AtomicU64>,
    pub catalog_mutations_total: Arc<AtomicU64>,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::SeqCst);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::SeqCst);
    }

    /// 记录一次轮询周期
    pub fn record_cycle(&self, fetched: usize, succeeded: bool) {
        self.cycles_total.fetch_add(1, Ordering::SeqCst);
        self.posts_fetched_total
            .fetch_add(fetched as u64, Ordering::SeqCst);
        if !succeeded {
            self.cycles_failed_total.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 记录通知结果
    pub fn record_notification(&self, delivered: bool) {
        if delivered {
            self.posts_notified_total.fetch_add(1, Ordering::SeqCst);
        } else {
            self.notify_failures_total.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 记录目录变更
    pub fn record_catalog_mutation(&self) {
        self.catalog_mutations_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds histogram
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP penwatch_cycles_total Monitoring cycles run
# TYPE penwatch_cycles_total counter
penwatch_cycles_total {}
# HELP penwatch_cycles_failed_total Monitoring cycles that failed
# TYPE penwatch_cycles_failed_total counter
penwatch_cycles_failed_total {}
# HELP penwatch_posts_fetched_total Posts fetched from the content source
# TYPE penwatch_posts_fetched_total counter
penwatch_posts_fetched_total {}
# HELP penwatch_posts_notified_total Matches delivered to the notifier
# TYPE penwatch_posts_notified_total counter
penwatch_posts_notified_total {}
# HELP penwatch_notify_failures_total Matches the notifier failed to deliver
# TYPE penwatch_notify_failures_total counter
penwatch_notify_failures_total {}
# HELP penwatch_catalog_mutations_total Successful pen or monitoring changes
# TYPE penwatch_catalog_mutations_total counter
penwatch_catalog_mutations_total {}
"#,
            self.http_requests_total.load(Ordering::SeqCst),
            self.http_request_duration_sum.load(Ordering::SeqCst) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::SeqCst),
            self.cycles_total.load(Ordering::SeqCst),
            self.cycles_failed_total.load(Ordering::SeqCst),
            self.posts_fetched_total.load(Ordering::SeqCst),
            self.posts_notified_total.load(Ordering::SeqCst),
            self.notify_failures_total.load(Ordering::SeqCst),
            self.catalog_mutations_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Component Health =====

/// 组件健康状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub healthy: bool,
    pub detail: String,
    pub checked_at: DateTime<Utc>,
}

impl ComponentHealth {
    pub fn healthy(name: &str, detail: impl Into<String>) -> Self {
        Self::new(name, true, detail)
    }

    pub fn unhealthy(name: &str, detail: impl Into<String>) -> Self {
        Self::new(name, false, detail)
    }

    fn new(name: &str, healthy: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            healthy,
            detail: detail.into(),
            checked_at: Utc::now(),
        }
    }
}

/// `/health` 响应
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: i64,
    pub components: Vec<ComponentHealth>,
}

/// 指标与组件状态，由处理器与轮询器共享
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    components: RwLock<BTreeMap<String, ComponentHealth>>,
    started_at: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String) -> Self {
        Self {
            metrics: Arc::new(AppMetrics::default()),
            components: RwLock::new(BTreeMap::new()),
            started_at: Utc::now(),
            version,
        }
    }

    /// 记录组件状态；同名组件的旧状态被替换
    pub fn report(&self, component: ComponentHealth) {
        if !component.healthy {
            tracing::warn!("{} unhealthy: {}", component.name, component.detail);
        }
        self.components
            .write()
            .insert(component.name.clone(), component);
    }

    pub fn components(&self) -> Vec<ComponentHealth> {
        self.components.read().values().cloned().collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.components.read().values().all(|c| c.healthy)
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

// ===== Handlers =====

/// Aggregate component health; 503 once any component reports unhealthy
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let healthy = state.is_healthy();
    let report = HealthReport {
        status: if healthy { "healthy" } else { "degraded" },
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        components: state.components(),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(report))
}

pub async fn liveness() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> String {
    state.metrics.gather()
}

pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// 可观测性路由：/health, /health/live, /metrics, /version
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化结构化日志
///
/// `RUST_LOG` overrides `logging.level`. When `log_dir` is set a daily
/// rolling file is written as well; keep the returned guard alive until
/// shutdown or buffered lines are lost.
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let json_layer = config
        .structured
        .then(|| fmt::layer().json().with_target(true));
    let text_layer = (!config.structured).then(|| {
        fmt::layer()
            .with_target(true)
            .with_line_number(true)
    });

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "penwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {e}");
    }

    guard
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(state): State<Arc<ObservabilityState>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    state
        .metrics
        .record_http_request(start.elapsed().as_millis() as u64);
    response
}
