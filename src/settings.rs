use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl Settings {
    /// Defaults, then the optional config file, then `TRIVIA_*` environment variables.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:trivia.db")?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("TRIVIA"))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}
