use anyhow::Result;
use tracing_subscriber::EnvFilter;

use docket_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    let server = Server::from_config(&config)?;
    server.run().await?;

    Ok(())
}
