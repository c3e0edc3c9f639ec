use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub const PLACEHOLDER_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("CONNECTX_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("CONNECTX_PORT is not a valid port: {raw:?}"))?,
            None => 5000,
        };

        Ok(Self {
            host: lookup("CONNECTX_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: PathBuf::from(lookup("CONNECTX_DB_PATH").unwrap_or_else(|| "connectx.db".into())),
            jwt_secret: lookup("CONNECTX_JWT_SECRET").unwrap_or_else(|| PLACEHOLDER_SECRET.into()),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// True when tokens would be signed with a guessable key.
    pub fn insecure_secret(&self) -> bool {
        self.jwt_secret.trim().is_empty() || self.jwt_secret == PLACEHOLDER_SECRET
    }
}
