//! Service state model
//!
//! [`ServiceState`] is the single durable record of the failover service:
//! health flags, hysteresis counters, tuning knobs and the currently
//! published target. It is owned by the engine and written whole by a
//! [`StateStore`](crate::traits::StateStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Lowest TTL the engine will apply to managed records
pub const MIN_TTL: u32 = 30;

/// TTL used for a fresh state when nothing else is configured
pub const DEFAULT_TTL: u32 = 60;

/// Placeholder shown wherever the webhook secret would be exported
pub const REDACTED: &str = "***";

/// One of the two candidate upstream targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetId {
    /// Primary target, preferred whenever it is eligible
    Target1,
    /// Fallback target, used only while target 1 is down
    Target2,
}

impl TargetId {
    /// Short label used in log lines and notifications
    pub fn label(&self) -> &'static str {
        match self {
            TargetId::Target1 => "S1",
            TargetId::Target2 => "S2",
        }
    }

    /// Parse an operator-facing target name (`server1`/`target1`, `server2`/`target2`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "server1" | "target1" | "1" => Some(TargetId::Target1),
            "server2" | "target2" | "2" => Some(TargetId::Target2),
            _ => None,
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two configured target addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    /// Primary target IP
    pub target1: IpAddr,
    /// Fallback target IP
    pub target2: IpAddr,
}

impl Targets {
    /// Create a target pair
    pub fn new(target1: IpAddr, target2: IpAddr) -> Self {
        Self { target1, target2 }
    }

    /// IP address of the given target
    pub fn ip(&self, target: TargetId) -> IpAddr {
        match target {
            TargetId::Target1 => self.target1,
            TargetId::Target2 => self.target2,
        }
    }

    /// Which target, if any, owns the given address
    pub fn owner_of(&self, ip: IpAddr) -> Option<TargetId> {
        if ip == self.target1 {
            Some(TargetId::Target1)
        } else if ip == self.target2 {
            Some(TargetId::Target2)
        } else {
            None
        }
    }
}

/// Durable service state
///
/// Streak counters are internal: they are persisted so hysteresis survives
/// a restart, but never exported through [`PublicState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    /// Health flag of target 1
    #[serde(default = "default_true")]
    pub target1_up: bool,

    /// Health flag of target 2
    #[serde(default = "default_true")]
    pub target2_up: bool,

    /// IP currently published in DNS
    pub current_target: IpAddr,

    /// Time of the last DNS change
    #[serde(default)]
    pub last_switch_at: Option<DateTime<Utc>>,

    /// Operator freeze: decisions are suspended while set
    #[serde(default)]
    pub freeze: bool,

    /// TTL applied to records on update
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Token required on inbound heartbeat calls
    #[serde(default)]
    pub webhook_shared_secret: Option<String>,

    /// Consecutive up reports required before a target may be promoted
    #[serde(default = "default_threshold")]
    pub up_threshold: u32,

    /// Accepted and persisted, not consulted by the decision logic
    #[serde(default = "default_threshold")]
    pub down_threshold: u32,

    /// Minimum seconds between DNS switches
    #[serde(default)]
    pub cooldown_seconds: u64,

    #[serde(default)]
    pub s1_up_streak: u32,
    #[serde(default)]
    pub s1_down_streak: u32,
    #[serde(default)]
    pub s2_up_streak: u32,
    #[serde(default)]
    pub s2_down_streak: u32,
}

fn default_true() -> bool {
    true
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_threshold() -> u32 {
    1
}

impl ServiceState {
    /// Fresh state for a first run: both targets up, DNS on target 1,
    /// a newly generated webhook secret.
    pub fn initial(target1: IpAddr, ttl: u32) -> Self {
        Self {
            target1_up: true,
            target2_up: true,
            current_target: target1,
            last_switch_at: None,
            freeze: false,
            ttl: ttl.max(MIN_TTL),
            webhook_shared_secret: Some(generate_secret()),
            up_threshold: 1,
            down_threshold: 1,
            cooldown_seconds: 0,
            s1_up_streak: 0,
            s1_down_streak: 0,
            s2_up_streak: 0,
            s2_down_streak: 0,
        }
    }

    /// Generate a webhook secret if none is present.
    ///
    /// Returns `true` when a new secret was created and the state needs saving.
    pub fn ensure_webhook_secret(&mut self) -> bool {
        match self.webhook_shared_secret.as_deref() {
            Some(secret) if !secret.is_empty() => false,
            _ => {
                self.webhook_shared_secret = Some(generate_secret());
                true
            }
        }
    }

    /// Health flag of a target
    pub fn is_up(&self, target: TargetId) -> bool {
        match target {
            TargetId::Target1 => self.target1_up,
            TargetId::Target2 => self.target2_up,
        }
    }

    /// Current consecutive up reports of a target
    pub fn up_streak(&self, target: TargetId) -> u32 {
        match target {
            TargetId::Target1 => self.s1_up_streak,
            TargetId::Target2 => self.s2_up_streak,
        }
    }

    /// Current consecutive down reports of a target
    pub fn down_streak(&self, target: TargetId) -> u32 {
        match target {
            TargetId::Target1 => self.s1_down_streak,
            TargetId::Target2 => self.s2_down_streak,
        }
    }

    /// "UP" or "DOWN" for log lines and notifications
    pub fn health_label(&self, target: TargetId) -> &'static str {
        if self.is_up(target) { "UP" } else { "DOWN" }
    }

    /// One-line summary of both targets, e.g. `S1=UP, S2=DOWN`
    pub fn health_summary(&self) -> String {
        format!(
            "{}={}, {}={}",
            TargetId::Target1.label(),
            self.health_label(TargetId::Target1),
            TargetId::Target2.label(),
            self.health_label(TargetId::Target2)
        )
    }

    /// Exported view: secret redacted, streak counters omitted
    pub fn to_public(&self) -> PublicState {
        PublicState {
            target1_up: self.target1_up,
            target2_up: self.target2_up,
            current_target: self.current_target,
            last_switch_at: self.last_switch_at,
            freeze: self.freeze,
            ttl: self.ttl,
            webhook_shared_secret: self
                .webhook_shared_secret
                .as_ref()
                .map(|_| REDACTED.to_string()),
            up_threshold: self.up_threshold,
            down_threshold: self.down_threshold,
            cooldown_seconds: self.cooldown_seconds,
        }
    }
}

/// Exported copy of [`ServiceState`]
///
/// This is the only shape that leaves the process through the HTTP shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicState {
    pub target1_up: bool,
    pub target2_up: bool,
    pub current_target: IpAddr,
    pub last_switch_at: Option<DateTime<Utc>>,
    pub freeze: bool,
    pub ttl: u32,
    pub webhook_shared_secret: Option<String>,
    pub up_threshold: u32,
    pub down_threshold: u32,
    pub cooldown_seconds: u64,
}

/// Generate a new random webhook secret
pub fn generate_secret() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Compare two secrets without short-circuiting on the first difference
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}
