//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, ServerSettings};

use actix_web::HttpServer;
use actix_web::dev::Server;
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::info;

use warden::inbound::http::app::build_app;

use state_builders::{build_dependencies, build_user_repository};

/// Construct the HTTP server for `config`.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener. Readiness is
/// flagged once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when the database pool cannot be built or
/// binding the socket fails.
pub async fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig { app, bind_addr } = config;
    let users = build_user_repository(&app, Arc::new(DefaultClock)).await?;
    let deps = build_dependencies(&app, users);
    let health_state = deps.health.clone();

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    info!(
        %bind_addr,
        regime = %app.regime,
        secret_fingerprint = %app.secret_fingerprint(),
        "server listening"
    );
    Ok(server)
}
