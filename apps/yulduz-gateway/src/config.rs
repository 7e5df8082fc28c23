use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub database_url: String,
    pub listen_port: u16,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let listen_port = match std::env::var("LISTEN_PORT") {
            Ok(raw) => raw
                .parse()
                .context("LISTEN_PORT must be a valid port number")?,
            Err(_) => 8080,
        };
        Ok(Self {
            database_url,
            listen_port,
        })
    }
}
