//! Daemon configuration from environment variables
//!
//! Variables are read once at startup, validated with actionable error
//! messages, then converted into a [`FailoverConfig`] for the engine.

use crate::dns_check::DEFAULT_DOH_URL;
use anyhow::{Context, Result};
use failover_core::config::validate_record_name;
use failover_core::model::MIN_TTL;
use failover_core::{
    EngineConfig, FailoverConfig, NotifierConfig, ProviderConfig, StateStoreConfig,
};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::Level;

const DEFAULT_STATE_PATH: &str = "./failover-state.json";
const DEFAULT_LISTEN: &str = "0.0.0.0:5000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Application configuration
pub struct Config {
    pub target1_ip: String,
    pub target2_ip: String,
    pub api_token: String,
    pub zone_id: String,
    pub records: Vec<String>,
    pub state_path: String,
    pub ttl: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub listen: String,
    pub admin_token: Option<String>,
    pub http_timeout_secs: Option<String>,
    pub mode: String,
    pub log_level: String,
    pub doh_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("target1_ip", &self.target1_ip)
            .field("target2_ip", &self.target2_ip)
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("records", &self.records)
            .field("state_path", &self.state_path)
            .field("listen", &self.listen)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<REDACTED>"))
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .field("doh_url", &self.doh_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            target1_ip: required("FAILOVER_TARGET1_IP")?,
            target2_ip: required("FAILOVER_TARGET2_IP")?,
            api_token: required("FAILOVER_CLOUDFLARE_API_TOKEN")?,
            zone_id: required("FAILOVER_CLOUDFLARE_ZONE_ID")?,
            records: optional("FAILOVER_RECORDS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            state_path: optional("FAILOVER_STATE_PATH")
                .unwrap_or_else(|| DEFAULT_STATE_PATH.to_string()),
            ttl: optional("FAILOVER_TTL"),
            telegram_bot_token: optional("FAILOVER_TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: optional("FAILOVER_TELEGRAM_CHAT_ID"),
            listen: optional("FAILOVER_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            admin_token: optional("FAILOVER_ADMIN_TOKEN"),
            http_timeout_secs: optional("FAILOVER_HTTP_TIMEOUT_SECS"),
            mode: optional("FAILOVER_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: optional("FAILOVER_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            doh_url: optional("FAILOVER_DOH_URL").unwrap_or_else(|| DEFAULT_DOH_URL.to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks value formats and ranges, then runs the core validation on
    /// the converted [`FailoverConfig`].
    pub fn validate(&self) -> Result<()> {
        self.target_ips()?;
        self.listen_addr()?;
        self.initial_ttl()?;
        self.http_timeout()?;
        self.dry_run()?;
        self.log_level()?;
        self.doh_url()?;

        for record in &self.records {
            validate_record_name(record)
                .with_context(|| format!("FAILOVER_RECORDS contains an invalid name: '{}'", record))?;
        }

        if self.state_path.is_empty() {
            anyhow::bail!("FAILOVER_STATE_PATH cannot be empty");
        }

        if let Some(parent) = std::path::Path::new(&self.state_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "FAILOVER_STATE_PATH parent directory does not exist: {}. \
                Create it first: mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        if self.telegram_bot_token.is_some() != self.telegram_chat_id.is_some() {
            eprintln!(
                "WARNING: only one of FAILOVER_TELEGRAM_BOT_TOKEN and \
                FAILOVER_TELEGRAM_CHAT_ID is set. Notifications are disabled."
            );
        }

        self.to_failover_config()?
            .validate()
            .context("Invalid failover configuration")?;

        Ok(())
    }

    /// Parse both target addresses
    pub fn target_ips(&self) -> Result<(IpAddr, IpAddr)> {
        let parse = |key: &str, value: &str| -> Result<IpAddr> {
            value
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid IP address. Got: {}", key, value))
        };

        Ok((
            parse("FAILOVER_TARGET1_IP", &self.target1_ip)?,
            parse("FAILOVER_TARGET2_IP", &self.target2_ip)?,
        ))
    }

    /// Address the HTTP shell binds to
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("FAILOVER_LISTEN must be host:port. Got: {}", self.listen))
    }

    /// TTL used when no state file exists yet
    pub fn initial_ttl(&self) -> Result<u32> {
        let Some(raw) = &self.ttl else {
            return Ok(failover_core::model::DEFAULT_TTL);
        };

        let ttl: u32 = raw
            .parse()
            .with_context(|| format!("FAILOVER_TTL must be a number of seconds. Got: {}", raw))?;

        if ttl < MIN_TTL {
            anyhow::bail!("FAILOVER_TTL must be at least {} seconds. Got: {}", MIN_TTL, ttl);
        }

        Ok(ttl)
    }

    /// Timeout for outbound registrar calls
    pub fn http_timeout(&self) -> Result<Duration> {
        let Some(raw) = &self.http_timeout_secs else {
            return Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        };

        let secs: u64 = raw.parse().with_context(|| {
            format!("FAILOVER_HTTP_TIMEOUT_SECS must be a number. Got: {}", raw)
        })?;

        if !(1..=120).contains(&secs) {
            anyhow::bail!(
                "FAILOVER_HTTP_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                secs
            );
        }

        Ok(Duration::from_secs(secs))
    }

    /// Whether registrar writes are only logged
    pub fn dry_run(&self) -> Result<bool> {
        match self.mode.to_lowercase().as_str() {
            "live" => Ok(false),
            "dry-run" | "dry_run" | "dryrun" => Ok(true),
            _ => anyhow::bail!(
                "FAILOVER_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }
    }

    /// Max tracing level
    pub fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "FAILOVER_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// DoH endpoint for diagnostics, `None` when set to `off`
    pub fn doh_url(&self) -> Result<Option<&str>> {
        let url = self.doh_url.trim();
        if url.eq_ignore_ascii_case("off") {
            return Ok(None);
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            anyhow::bail!(
                "FAILOVER_DOH_URL must be an http(s) URL or 'off'. Got: {}",
                self.doh_url
            );
        }
        Ok(Some(url))
    }

    /// Convert into the engine configuration
    pub fn to_failover_config(&self) -> Result<FailoverConfig> {
        let (target1, target2) = self.target_ips()?;

        let mut config = FailoverConfig::new(target1, target2);
        config.provider = ProviderConfig::Cloudflare {
            api_token: self.api_token.clone(),
            zone_id: self.zone_id.clone(),
            dry_run: self.dry_run()?,
        };
        config.state_store = StateStoreConfig::File {
            path: self.state_path.clone(),
        };
        config.records = self.records.clone();
        config.notifier = NotifierConfig::from_credentials(
            self.telegram_bot_token.clone(),
            self.telegram_chat_id.clone(),
        );
        config.engine = EngineConfig {
            initial_ttl: self.initial_ttl()?,
            ..EngineConfig::default()
        };

        Ok(config)
    }
}
