use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:9797";

// Server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Where the sled database lives. Events are kept in memory when unset.
    pub data_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("DOCKET_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()).parse().with_context(|| "parse DOCKET_BIND")?;
        let data_dir = std::env::var_os("DOCKET_DATA_DIR").filter(|dir| !dir.is_empty()).map(PathBuf::from);
        Ok(Self { bind_addr, data_dir })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: SocketAddr::from(([0, 0, 0, 0], 9797)), data_dir: None }
    }
}
