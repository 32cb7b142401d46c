use std::env;

use anyhow::{bail, Result};
use tracing::warn;

use crate::constants::{DEFAULT_PORT, DEFAULT_STATIC_DIR};

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) port: u16,
    /// Backend base URL baked into the pages. `None` lets the browser pick.
    pub(crate) api_base: Option<String>,
    pub(crate) static_dir: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => match value.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!("invalid PORT {:?}; defaulting to {}", value, DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            Err(_) => DEFAULT_PORT,
        };

        let api_base = read_env_first(&["API_BASE_URL", "SCORE_API_URL"]);
        if let Some(base) = api_base.as_deref() {
            if url::Url::parse(base).is_err() {
                bail!("API_BASE_URL is not a valid URL: {}", base);
            }
        }

        let static_dir =
            read_env_first(&["STATIC_DIR"]).unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());

        Ok(Self {
            port,
            api_base,
            static_dir,
        })
    }
}

pub(crate) fn read_env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}
