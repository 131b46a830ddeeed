//! Health endpoints: a status summary plus liveness and readiness probes for
//! orchestration and load balancers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use actix_web::{HttpResponse, get, http::header, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::DeploymentRegime;

/// Whether the request-protection collaborator has credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionStatus {
    Configured,
    Missing,
}

impl ProtectionStatus {
    /// Status for an optional collaborator key; the key itself is discarded.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some(key) if !key.trim().is_empty() => Self::Configured,
            _ => Self::Missing,
        }
    }
}

/// Shared health state for the status summary and probes.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    started: Instant,
    regime: DeploymentRegime,
    protection: ProtectionStatus,
}

impl HealthState {
    /// Create a state that starts live but not ready.
    pub fn new(regime: DeploymentRegime, protection: ProtectionStatus) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            started: Instant::now(),
            regime,
            protection,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503 to trigger restarts.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    #[schema(example = "OK")]
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the process started serving.
    #[schema(example = 12.5)]
    pub uptime: f64,
    #[schema(example = "production")]
    pub environment: &'static str,
    pub protection: ProtectionStatus,
}

/// Process status summary.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process status", body = HealthReport),
        (status = 429, description = "Rate limit exceeded")
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> web::Json<HealthReport> {
    web::Json(HealthReport {
        status: "OK",
        timestamp: Utc::now(),
        uptime: state.started.elapsed().as_secs_f64(),
        environment: state.regime.environment(),
        protection: state.protection,
    })
}

/// Readiness probe. Return 200 when dependencies are initialised and the server can handle traffic; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}
