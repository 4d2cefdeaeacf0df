//! Configuration types for the failover system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::model::{DEFAULT_TTL, MIN_TTL, Targets};

/// Main failover configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// The two candidate targets
    pub targets: Targets,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Allow-list of managed record names (empty = every address record in the zone)
    #[serde(default)]
    pub records: Vec<String>,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl FailoverConfig {
    /// Create a configuration with defaults for everything but the targets
    pub fn new(target1: IpAddr, target2: IpAddr) -> Self {
        Self {
            targets: Targets::new(target1, target2),
            provider: ProviderConfig::default(),
            state_store: StateStoreConfig::default(),
            records: Vec::new(),
            notifier: NotifierConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.targets.target1 == self.targets.target2 {
            return Err(crate::Error::config(format!(
                "Target 1 and target 2 must differ (both are {})",
                self.targets.target1
            )));
        }

        for record in &self.records {
            validate_record_name(record)?;
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token with Zone:DNS:Edit permission
        api_token: String,
        /// Zone holding the managed records
        zone_id: String,
        /// Log writes instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token, zone_id, ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if zone_id.is_empty() {
                    return Err(crate::Error::config("Cloudflare zone ID cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

// Tokens never reach logs through Debug
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                zone_id, dry_run, ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("zone_id", zone_id)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Cloudflare {
            api_token: String::new(),
            zone_id: String::new(),
            dry_run: false,
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

/// Notifier configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Telegram bot message to a fixed chat
    Telegram {
        /// Bot token
        bot_token: String,
        /// Destination chat ID
        chat_id: String,
    },

    /// Notifications disabled
    #[default]
    Disabled,
}

impl NotifierConfig {
    /// Build from optional credentials; missing or empty values disable notifications
    pub fn from_credentials(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                NotifierConfig::Telegram { bot_token, chat_id }
            }
            _ => NotifierConfig::Disabled,
        }
    }

    /// Whether a real notifier is configured
    pub fn is_enabled(&self) -> bool {
        !matches!(self, NotifierConfig::Disabled)
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierConfig::Telegram { chat_id, .. } => f
                .debug_struct("Telegram")
                .field("bot_token", &"<REDACTED>")
                .field("chat_id", chat_id)
                .finish(),
            NotifierConfig::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TTL written into a fresh state on first run
    ///
    /// Later changes go through the operator API and are persisted with the
    /// state, so this only matters until the first save.
    #[serde(default = "default_initial_ttl")]
    pub initial_ttl: u32,

    /// Upper bound on a single notifier call (in seconds)
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.initial_ttl < MIN_TTL {
            return Err(crate::Error::config(format!(
                "TTL must be at least {} seconds. Got: {}",
                MIN_TTL, self.initial_ttl
            )));
        }
        if self.notify_timeout_secs == 0 {
            return Err(crate::Error::config("Notifier timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_ttl: default_initial_ttl(),
            notify_timeout_secs: default_notify_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_initial_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_notify_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Validate that a string is a valid DNS record name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors. A leading `*` label
/// is accepted for wildcard records.
pub fn validate_record_name(name: &str) -> Result<(), crate::Error> {
    if name.is_empty() {
        return Err(crate::Error::config("Record name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if name.len() > 253 {
        return Err(crate::Error::config(format!(
            "Record name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        )));
    }

    for (index, label) in name.split('.').enumerate() {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Record name has empty label: '{}'",
                name
            )));
        }

        if index == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Record label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::config(format!(
                "Record label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Record label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
