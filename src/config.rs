use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use crate::args::Args;

const STORE_DIR: &str = "brandwatch";
const STORE_FILE: &str = "session.db";

/// Runtime settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub endpoint: String,
    pub store_path: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let api_url = Url::parse(&args.api_url)
            .with_context(|| format!("Invalid API URL '{}'", args.api_url))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            anyhow::bail!("API URL must use http or https, got '{}'", api_url.scheme());
        }

        let store_path = args.store.clone().unwrap_or_else(default_store_path);

        let config = Self {
            api_url,
            endpoint: args.endpoint.clone(),
            store_path,
            timeout: Duration::from_secs(args.timeout_secs),
        };

        info!(
            action = "resolve",
            component = "config",
            api_url = %config.api_url,
            endpoint = %config.endpoint,
            store_path = ?config.store_path,
            timeout_secs = args.timeout_secs,
            "Configuration resolved"
        );
        Ok(config)
    }
}

pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_DIR)
        .join(STORE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Command;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["brandwatch", "--api-url", "http://localhost:8080", "--endpoint", "/analyze", "reset"]).unwrap();
        let config = Config::from_args(&Args {
            store: None,
            ..args
        })
        .unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.endpoint, "/analyze");
        assert!(config.store_path.ends_with("brandwatch/session.db"));
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let args = Args {
            api_url: "ftp://example.com".to_string(),
            endpoint: "/analyze".to_string(),
            store: None,
            timeout_secs: 5,
            verbose: false,
            command: Command::Reset,
        };
        assert!(Config::from_args(&args).is_err());

        let args = Args {
            api_url: "not a url".to_string(),
            ..args
        };
        assert!(Config::from_args(&args).is_err());
    }
}
