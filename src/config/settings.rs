use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use super::Result;

/// Environment variable that overrides the configured port for a single send.
pub const SERIAL_PORT_ENV: &str = "SERIAL_PORT";

/// HTTP listener settings, taken from `PORT` and `BIND_ADDRESS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn load() -> Result<Self> {
        Self::figment().extract().map_err(|e| Box::new(e).into())
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(&["port", "bind_address"]))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Read the per-send port override, ignoring an empty value.
pub fn serial_port_override() -> Option<String> {
    std::env::var(SERIAL_PORT_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
