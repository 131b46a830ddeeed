//! Listener settings loaded via OrthoConfig, and the server configuration
//! assembled from them.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use warden::config::AppConfig;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 3000;

/// Listener settings read from `WARDEN_*` variables, files and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WARDEN")]
pub struct ServerSettings {
    /// Interface to bind; defaults to all interfaces.
    #[ortho_config(default = DEFAULT_HOST)]
    pub host: IpAddr,
    /// TCP port; defaults to 3000.
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: u16,
}

impl ServerSettings {
    /// Address the listener binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Everything needed to start the HTTP server.
pub struct ServerConfig {
    pub(crate) app: AppConfig,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Combine application settings with a listener address.
    #[must_use]
    pub fn new(app: AppConfig, bind_addr: SocketAddr) -> Self {
        Self { app, bind_addr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("warden")]).expect("config should load")
    }

    #[rstest]
    fn defaults_bind_all_interfaces_on_3000() {
        let _guard = lock_env([
            ("WARDEN_HOST", None::<String>),
            ("WARDEN_PORT", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "0.0.0.0:3000".parse().expect("addr"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("WARDEN_HOST", Some("127.0.0.1".to_owned())),
            ("WARDEN_PORT", Some("8081".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8081".parse().expect("addr"));
    }

    #[rstest]
    fn port_alone_keeps_default_host() {
        let _guard = lock_env([
            ("WARDEN_HOST", None::<String>),
            ("WARDEN_PORT", Some("9000".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.port, 9000);
    }
}
