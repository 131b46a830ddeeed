//! Service entry-point: reads configuration and runs the HTTP server.

mod server;

use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, create_server};
use warden::config::app_config_from_env;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let app = app_config_from_env(&DefaultEnv::new()).map_err(|err| {
        error!(error = %err, "invalid configuration");
        std::io::Error::other(err.to_string())
    })?;
    let settings = ServerSettings::load().map_err(|err| {
        error!(error = %err, "invalid server settings");
        std::io::Error::other(err.to_string())
    })?;

    let server = create_server(ServerConfig::new(app, settings.bind_addr())).await?;
    server.await
}
