use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap_serde_derive::ClapSerde;
use serde::Deserialize;

use crate::analysis::{AnalyzerSettings, DEFAULT_MODEL};
use crate::upstream::ApiKey;

pub const DEFAULT_CONFIG_FILE: &str = "ScamRadar.toml";
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Deployments that predate the rename still export this variable.
pub const LEGACY_API_KEY_ENV: &str = "LOVABLE_API_KEY";

#[derive(ClapSerde, Deserialize, Debug)]
pub struct Config {
    /// The address the listener binds to
    #[default(String::from("0.0.0.0"))]
    #[arg(short, long, env)]
    pub address: String,

    /// The port the listener binds to
    #[default(25566)]
    #[arg(short, long, env)]
    pub port: u16,

    /// API key for the AI gateway
    #[arg(long, env = "AI_GATEWAY_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Chat completions endpoint of the AI gateway
    #[default(String::from(DEFAULT_GATEWAY_URL))]
    #[arg(long, env = "AI_GATEWAY_URL")]
    pub gateway_url: String,

    /// Model identifier sent with every completion request
    #[default(String::from(DEFAULT_MODEL))]
    #[arg(long, env = "AI_GATEWAY_MODEL")]
    pub model: String,

    /// Timeout for gateway requests in seconds, 0 disables it
    #[default(0)]
    #[arg(long, env)]
    pub upstream_timeout_secs: u64,

    /// OTLP collector endpoint, leave empty to only log to the console
    #[arg(long, env)]
    pub otel_endpoint: String,

    /// Keep console logging when exporting to an OTLP collector
    #[arg(long, env)]
    pub console: bool,

    /// PEM certificate to serve over TLS
    #[arg(long, env)]
    pub tls_cert: String,

    /// PEM private key to serve over TLS
    #[arg(long, env)]
    pub tls_key: String,
}

impl Config {
    pub fn from_toml_str(str: &str) -> Result<Self> {
        let opt: <Config as ClapSerde>::Opt = toml::from_str(str)?;
        Ok(Config::from(opt))
    }

    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&str)
    }

    /// Reads `path`, falling back to defaults when the default file is
    /// absent. Any other missing or unreadable file is an error.
    pub fn load(path: &str) -> Result<Self> {
        match Self::from_toml(path) {
            Ok(config) => Ok(config),
            Err(_) if path == DEFAULT_CONFIG_FILE && !std::path::Path::new(path).exists() => {
                Ok(Config::default())
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read configuration file {path}"))
            }
        }
    }

    /// Picks up the key from the legacy variable when nothing else set one.
    pub fn with_legacy_api_key(mut self) -> Self {
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(LEGACY_API_KEY_ENV) {
                self.api_key = key;
            }
        }
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.address, self.port))
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        (self.upstream_timeout_secs > 0).then(|| Duration::from_secs(self.upstream_timeout_secs))
    }

    pub fn otel_endpoint(&self) -> Option<&str> {
        non_empty(&self.otel_endpoint)
    }

    pub fn tls_files(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.tls_cert)?, non_empty(&self.tls_key)?))
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            api_key: ApiKey::new(self.api_key.as_str()),
            model: self.model.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
