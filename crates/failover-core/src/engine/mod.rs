//! Core failover engine
//!
//! The FailoverEngine is responsible for:
//! - Applying heartbeats to the service state
//! - Deciding which target should be published
//! - Updating every managed DNS record via DnsProvider
//! - Persisting state after every decision
//! - Relaying switches to the Notifier
//!
//! ## Architecture
//!
//! ```text
//!   heartbeat / operator call
//!              │
//!              ▼
//!      ┌───────────────┐   lock held    ┌──────────────┐
//!      │ FailoverEngine│───────────────▶│ ServiceState │
//!      └───────────────┘                │ RecordCache  │
//!              │                        └──────────────┘
//!              │ lock released
//!   ┌──────────┼──────────────┬───────────────┐
//!   ▼          ▼              ▼               ▼
//! ┌──────────┐ ┌───────────┐ ┌────────────┐ ┌────────┐
//! │DnsProvider│ │ Notifier │ │ StateStore │ │ Events │
//! └──────────┘ └───────────┘ └────────────┘ └────────┘
//! ```
//!
//! ## Locking
//!
//! One `tokio::sync::Mutex` guards the state and the record cache. Health
//! updates and the decision run in a single critical section. Registrar
//! and notifier calls happen with the lock released; the outcome is
//! committed after re-acquiring it. Two concurrent switches may race;
//! the last commit wins and the next heartbeat re-converges.

pub mod decision;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{debug, error, info, warn};

use crate::cache::RecordCache;
use crate::config::FailoverConfig;
use crate::error::{Error, Result};
use crate::health;
use crate::model::{
    MIN_TTL, PublicState, ServiceState, TargetId, Targets, constant_time_eq, generate_secret,
};
use crate::traits::{Clock, DnsProvider, DnsRecord, Notifier, StateStore, UpdateResult};

pub use decision::{HoldReason, Verdict};

/// Events emitted by the FailoverEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A heartbeat was applied to the health state
    HeartbeatApplied {
        target: TargetId,
        is_up: bool,
        source: String,
    },

    /// A decision held DNS at its current value
    Held {
        reason: HoldReason,
        current: IpAddr,
    },

    /// DNS was switched to a new target
    Switched {
        from: IpAddr,
        to: IpAddr,
        source: String,
        updated: usize,
        failed: usize,
    },

    /// A decision found the desired target already published
    Unchanged { current: IpAddr },

    /// One record was written
    RecordUpdated {
        record_name: String,
        new_ip: IpAddr,
    },

    /// One record could not be written
    RecordUpdateFailed { record_name: String, error: String },

    /// The record cache was rebuilt
    RecordsRefreshed { count: usize },

    /// Saving the state failed; the in-memory copy stays authoritative
    PersistFailed { error: String },
}

/// Failure to write a single record during a publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a publish
///
/// `current_target` is committed even when `failed` covers every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Value of `current_target` before the publish
    pub previous: IpAddr,
    /// Address written to every record
    pub new_ip: IpAddr,
    /// Names of records that accepted the update
    pub updated: Vec<String>,
    /// Records the registrar rejected
    pub failed: Vec<RecordFailure>,
}

impl PublishReport {
    /// Whether no record accepted the update
    pub fn all_failed(&self) -> bool {
        self.updated.is_empty() && !self.failed.is_empty()
    }
}

/// What a decision did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Freeze or cooldown prevented recomputation
    Held { hold: HoldReason, current: IpAddr },
    /// The published target is already the desired one
    Unchanged { current: IpAddr },
    /// Records were rewritten
    Switched { report: PublishReport },
    /// The switch could not start (no records, refresh failure)
    SwitchFailed { desired: IpAddr, error: String },
}

/// Result of one decision, with the health flags it was based on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub source: String,
    pub target1_up: bool,
    pub target2_up: bool,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Decision {
    /// Whether DNS was rewritten
    pub fn switched(&self) -> bool {
        matches!(self.outcome, Outcome::Switched { .. })
    }

    /// One-line human readable summary, used in logs and notifications
    pub fn summary(&self) -> String {
        let health = health_line(self.target1_up, self.target2_up);
        match &self.outcome {
            Outcome::Held { hold, current } => {
                format!("Holding DNS at {} ({}). {}", current, hold, health)
            }
            Outcome::Unchanged { current } => {
                format!("No DNS change. {} | Current: {}", health, current)
            }
            Outcome::Switched { report } => {
                let mut line = format!(
                    "DNS switched to {} by {}. {}",
                    report.new_ip, self.source, health
                );
                if !report.failed.is_empty() {
                    line.push_str(&format!(
                        " ({} of {} records failed)",
                        report.failed.len(),
                        report.failed.len() + report.updated.len()
                    ));
                }
                line
            }
            Outcome::SwitchFailed { desired, error } => {
                format!("DNS switch to {} failed: {}. {}", desired, error, health)
            }
        }
    }
}

fn health_line(target1_up: bool, target2_up: bool) -> String {
    let label = |up: bool| if up { "UP" } else { "DOWN" };
    format!(
        "{}={}, {}={}",
        TargetId::Target1.label(),
        label(target1_up),
        TargetId::Target2.label(),
        label(target2_up)
    )
}

/// Partial update of the operator tuning knobs
///
/// Values are clamped rather than rejected: `ttl` to at least 30 seconds,
/// `up_threshold` to at least 1, the others to at least 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningUpdate {
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub cooldown_seconds: Option<i64>,
    #[serde(default)]
    pub up_threshold: Option<i64>,
    #[serde(default)]
    pub down_threshold: Option<i64>,
}

impl TuningUpdate {
    fn apply(&self, state: &mut ServiceState) {
        if let Some(ttl) = self.ttl {
            state.ttl = clamp_u32(ttl, MIN_TTL);
        }
        if let Some(cooldown) = self.cooldown_seconds {
            state.cooldown_seconds = cooldown.max(0) as u64;
        }
        if let Some(threshold) = self.up_threshold {
            state.up_threshold = clamp_u32(threshold, 1);
        }
        if let Some(threshold) = self.down_threshold {
            state.down_threshold = clamp_u32(threshold, 0);
        }
    }
}

fn clamp_u32(value: i64, floor: u32) -> u32 {
    value.clamp(i64::from(floor), i64::from(u32::MAX)) as u32
}

/// Read-only view for the status surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: PublicState,
    pub targets: Targets,
    /// Which target `current_target` belongs to, if any
    pub active: Option<TargetId>,
    pub records: Vec<DnsRecord>,
}

/// State guarded by the engine lock
struct Shared {
    state: ServiceState,
    cache: RecordCache,
}

/// Core failover engine
///
/// All mutation of the service state funnels through this type. It is
/// `Send + Sync` and meant to be shared behind an `Arc`.
///
/// ## Lifecycle
///
/// 1. Create with [`FailoverEngine::new()`] (loads or initializes state)
/// 2. Optionally [`refresh()`](Self::refresh) the record cache
/// 3. Feed heartbeats and operator calls
/// 4. [`flush()`](Self::flush) on shutdown
pub struct FailoverEngine {
    /// DNS provider for updating records
    provider: Arc<dyn DnsProvider>,

    /// Durable state
    state_store: Box<dyn StateStore>,

    /// Best-effort alerts
    notifier: Arc<dyn Notifier>,

    /// Time source for cooldown and switch timestamps
    clock: Arc<dyn Clock>,

    /// Configured target pair
    targets: Targets,

    /// Allow-list of record names (empty = all)
    record_names: Vec<String>,

    /// Bound on a single notifier call
    notify_timeout: Duration,

    shared: Mutex<Shared>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl FailoverEngine {
    /// Create a new failover engine
    ///
    /// Loads the durable state (falling back to a fresh one), generates and
    /// persists a webhook secret if none exists, and starts with an empty
    /// record cache.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub async fn new(
        provider: Arc<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &FailoverConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let targets = config.targets;

        // The secret is generated below so a first run is always saved.
        let mut defaults = ServiceState::initial(targets.target1, config.engine.initial_ttl);
        defaults.webhook_shared_secret = None;

        let mut state = state_store.load_or_default(defaults).await;

        let mut dirty = false;
        if state.ttl < MIN_TTL {
            warn!(
                "Stored TTL {}s is below the {}s floor; raising it",
                state.ttl, MIN_TTL
            );
            state.ttl = MIN_TTL;
            dirty = true;
        }

        if targets.owner_of(state.current_target).is_none() {
            warn!(
                "Stored current target {} matches neither {} nor {}; it will be replaced on the next decision",
                state.current_target, targets.target1, targets.target2
            );
        }

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            provider,
            state_store,
            notifier,
            clock,
            targets,
            record_names: config.records.clone(),
            notify_timeout: Duration::from_secs(config.engine.notify_timeout_secs),
            shared: Mutex::new(Shared {
                state: state.clone(),
                cache: RecordCache::new(),
            }),
            event_tx: tx,
        };

        if state.ensure_webhook_secret() {
            info!("Generated a new webhook secret");
            dirty = true;
        }

        if dirty {
            let mut shared = engine.shared.lock().await;
            shared.state = state;
            engine.save_state(&shared.state).await;
        }

        info!(
            "Failover engine ready: target1={}, target2={}, current={}, provider={}, notifier={}",
            targets.target1,
            targets.target2,
            engine.shared.lock().await.state.current_target,
            engine.provider.provider_name(),
            engine.notifier.notifier_name()
        );

        Ok((engine, rx))
    }

    /// Configured targets
    pub fn targets(&self) -> Targets {
        self.targets
    }

    /// Configured record allow-list
    pub fn record_names(&self) -> &[String] {
        &self.record_names
    }

    /// Name of the DNS provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Name of the notifier
    pub fn notifier_name(&self) -> &'static str {
        self.notifier.notifier_name()
    }

    /// Where the state is stored
    pub fn state_location(&self) -> String {
        self.state_store.describe()
    }

    /// Apply a heartbeat without running a decision
    pub async fn report(&self, target: TargetId, is_up: bool) {
        let mut shared = self.shared.lock().await;
        self.apply_heartbeat(&mut shared.state, target, is_up, "report");
    }

    /// Apply a heartbeat and decide, in one critical section
    pub async fn heartbeat(&self, target: TargetId, is_up: bool, source: &str) -> Decision {
        let mut shared = self.shared.lock().await;
        self.apply_heartbeat(&mut shared.state, target, is_up, source);
        self.decide_locked(shared, source).await
    }

    /// Run the failover policy against the current state
    pub async fn decide(&self, source: &str) -> Decision {
        let shared = self.shared.lock().await;
        self.decide_locked(shared, source).await
    }

    fn apply_heartbeat(&self, state: &mut ServiceState, target: TargetId, is_up: bool, source: &str) {
        health::report(state, target, is_up);
        debug!(
            "Heartbeat {} {} from {} (up streak {}, down streak {})",
            target,
            state.health_label(target),
            source,
            state.up_streak(target),
            state.down_streak(target)
        );
        self.emit_event(EngineEvent::HeartbeatApplied {
            target,
            is_up,
            source: source.to_string(),
        });
    }

    async fn decide_locked(&self, shared: MutexGuard<'_, Shared>, source: &str) -> Decision {
        let now = self.clock.now();
        let verdict = decision::evaluate(&shared.state, &self.targets, now);
        let target1_up = shared.state.target1_up;
        let target2_up = shared.state.target2_up;
        let current = shared.state.current_target;

        let outcome = match verdict {
            Verdict::Hold(hold) => {
                self.save_state(&shared.state).await;
                drop(shared);
                self.emit_event(EngineEvent::Held {
                    reason: hold,
                    current,
                });
                Outcome::Held { hold, current }
            }
            Verdict::Keep => {
                self.save_state(&shared.state).await;
                drop(shared);
                self.emit_event(EngineEvent::Unchanged { current });
                Outcome::Unchanged { current }
            }
            Verdict::Switch(desired) => {
                drop(shared);
                match self.publish(desired, source).await {
                    Ok(report) => Outcome::Switched { report },
                    Err(e) => Outcome::SwitchFailed {
                        desired,
                        error: e.to_string(),
                    },
                }
            }
        };

        let decision = Decision {
            source: source.to_string(),
            target1_up,
            target2_up,
            outcome,
        };

        match &decision.outcome {
            Outcome::Switched { .. } => {
                let summary = decision.summary();
                info!("{}", summary);
                self.notify(&summary).await;
            }
            Outcome::SwitchFailed { .. } => error!("{}", decision.summary()),
            _ => info!("{}", decision.summary()),
        }

        decision
    }

    /// Write `new_ip` to every managed record
    ///
    /// Refreshes the cache first when it is empty. Per-record failures are
    /// logged and reported but do not stop the remaining records, and
    /// `current_target`/`last_switch_at` are committed regardless.
    ///
    /// # Errors
    ///
    /// - `Error::NoManagedRecords` when the registrar has nothing to update
    /// - Refresh errors when the cache was empty and could not be filled
    pub async fn publish(&self, new_ip: IpAddr, source: &str) -> Result<PublishReport> {
        let (mut records, ttl) = {
            let shared = self.shared.lock().await;
            (shared.cache.to_vec(), shared.state.ttl)
        };

        if records.is_empty() {
            debug!("Record cache empty, refreshing before publish");
            self.refresh().await?;
            records = self.shared.lock().await.cache.to_vec();
        }

        if records.is_empty() {
            warn!("No managed DNS records; not publishing {}", new_ip);
            return Err(Error::NoManagedRecords);
        }

        info!(
            "Publishing {} to {} record(s) (source: {})",
            new_ip,
            records.len(),
            source
        );

        let mut updated = Vec::new();
        let mut failed = Vec::new();

        for record in &records {
            match self.provider.update_record(record, new_ip, ttl).await {
                Ok(UpdateResult::Updated { previous_content, .. }) => {
                    info!("Updated {} {} -> {}", record.name, previous_content, new_ip);
                    updated.push(record.name.clone());
                    self.emit_event(EngineEvent::RecordUpdated {
                        record_name: record.name.clone(),
                        new_ip,
                    });
                }
                Ok(UpdateResult::Simulated { .. }) => {
                    info!("[dry-run] Would update {} -> {}", record.name, new_ip);
                    updated.push(record.name.clone());
                    self.emit_event(EngineEvent::RecordUpdated {
                        record_name: record.name.clone(),
                        new_ip,
                    });
                }
                Err(e) => {
                    error!("Failed to update record {}: {}", record.name, e);
                    self.emit_event(EngineEvent::RecordUpdateFailed {
                        record_name: record.name.clone(),
                        error: e.to_string(),
                    });
                    failed.push(RecordFailure {
                        name: record.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut shared = self.shared.lock().await;
        let previous = shared.state.current_target;
        let now = self.clock.now();

        shared.state.current_target = new_ip;
        shared.state.last_switch_at = Some(monotonic(shared.state.last_switch_at, now));
        for name in &updated {
            shared.cache.set_content(name, new_ip.to_string(), ttl);
        }
        self.save_state(&shared.state).await;
        drop(shared);

        let report = PublishReport {
            previous,
            new_ip,
            updated,
            failed,
        };

        if report.all_failed() {
            warn!(
                "Every record update to {} failed; current target advanced anyway",
                new_ip
            );
        }

        self.emit_event(EngineEvent::Switched {
            from: previous,
            to: new_ip,
            source: source.to_string(),
            updated: report.updated.len(),
            failed: report.failed.len(),
        });

        Ok(report)
    }

    /// Re-fetch the managed records and replace the cache
    ///
    /// Returns the number of cached records.
    pub async fn refresh(&self) -> Result<usize> {
        let records = self.provider.list_records(&self.record_names).await?;

        let count = {
            let mut shared = self.shared.lock().await;
            shared.cache.replace(records);
            shared.cache.len()
        };

        info!("Cached {} DNS record(s)", count);
        self.emit_event(EngineEvent::RecordsRefreshed { count });

        Ok(count)
    }

    /// Operator-forced publish of a target's address
    ///
    /// Bypasses freeze and cooldown.
    pub async fn manual_switch(&self, target: TargetId) -> Result<PublishReport> {
        let ip = self.targets.ip(target);
        info!("Manual switch to {} ({})", target, ip);

        let report = self.publish(ip, "manual").await?;

        let health = {
            let shared = self.shared.lock().await;
            shared.state.health_summary()
        };
        self.notify(&format!("DNS manually switched to {} ({}). {}", ip, target, health))
            .await;

        Ok(report)
    }

    /// Enable or disable the operator freeze
    pub async fn set_freeze(&self, enabled: bool) {
        let mut shared = self.shared.lock().await;
        if shared.state.freeze != enabled {
            info!("Freeze {}", if enabled { "enabled" } else { "disabled" });
        }
        shared.state.freeze = enabled;
        self.save_state(&shared.state).await;
    }

    /// Apply a partial tuning update and persist it
    pub async fn update_tuning(&self, update: TuningUpdate) -> PublicState {
        let mut shared = self.shared.lock().await;
        update.apply(&mut shared.state);
        info!(
            "Tuning updated: ttl={}, cooldown={}s, up_threshold={}, down_threshold={}",
            shared.state.ttl,
            shared.state.cooldown_seconds,
            shared.state.up_threshold,
            shared.state.down_threshold
        );
        self.save_state(&shared.state).await;
        shared.state.to_public()
    }

    /// Replace the webhook secret with a new random one
    ///
    /// The new value is persisted and never returned.
    pub async fn rotate_webhook_secret(&self) {
        let mut shared = self.shared.lock().await;
        shared.state.webhook_shared_secret = Some(generate_secret());
        info!("Webhook secret rotated");
        self.save_state(&shared.state).await;
    }

    /// Check a presented webhook credential
    pub async fn verify_webhook_secret(&self, candidate: &str) -> bool {
        let shared = self.shared.lock().await;
        match shared.state.webhook_shared_secret.as_deref() {
            Some(expected) if !expected.is_empty() => constant_time_eq(expected, candidate),
            _ => false,
        }
    }

    /// Read-only copy of the state, targets and cached records
    pub async fn snapshot(&self) -> StatusSnapshot {
        let shared = self.shared.lock().await;
        StatusSnapshot {
            state: shared.state.to_public(),
            targets: self.targets,
            active: self.targets.owner_of(shared.state.current_target),
            records: shared.cache.to_vec(),
        }
    }

    /// Cached records
    pub async fn records(&self) -> Vec<DnsRecord> {
        self.shared.lock().await.cache.to_vec()
    }

    /// Send a fixed message through the notifier, surfacing the result
    pub async fn send_test_notification(&self) -> Result<()> {
        let text = {
            let shared = self.shared.lock().await;
            format!(
                "Test notification. {} | Current: {}",
                shared.state.health_summary(),
                shared.state.current_target
            )
        };

        match tokio::time::timeout(self.notify_timeout, self.notifier.notify(&text)).await {
            Ok(result) => result,
            Err(_) => Err(Error::notifier(format!(
                "timed out after {}s",
                self.notify_timeout.as_secs()
            ))),
        }
    }

    /// Check that the registrar accepts our credentials
    pub async fn check_provider(&self) -> Result<()> {
        self.provider.check_access().await
    }

    /// Save the current state
    ///
    /// Unlike the saves made during decisions, failures are returned.
    pub async fn flush(&self) -> Result<()> {
        let shared = self.shared.lock().await;
        self.state_store.save(&shared.state).await?;
        debug!("State flushed to {}", self.state_store.describe());
        Ok(())
    }

    /// Persist state, logging failures
    ///
    /// The in-memory state remains authoritative until the next
    /// successful save.
    async fn save_state(&self, state: &ServiceState) {
        if let Err(e) = self.state_store.save(state).await {
            error!(
                "Failed to persist service state to {}: {}",
                self.state_store.describe(),
                e
            );
            self.emit_event(EngineEvent::PersistFailed {
                error: e.to_string(),
            });
        }
    }

    /// Bounded, best-effort notification
    async fn notify(&self, text: &str) {
        match tokio::time::timeout(self.notify_timeout, self.notifier.notify(text)).await {
            Ok(Ok(())) => debug!("Notification sent via {}", self.notifier.notifier_name()),
            Ok(Err(e)) => warn!(
                "Notifier {} failed: {}",
                self.notifier.notifier_name(),
                e
            ),
            Err(_) => warn!(
                "Notifier {} timed out after {}s",
                self.notifier.notifier_name(),
                self.notify_timeout.as_secs()
            ),
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // A full channel means the consumer is behind; drop rather than block.
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}

/// Never move a switch timestamp backwards
fn monotonic(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn tuning_update_clamps() {
        let mut state = ServiceState::initial("192.0.2.1".parse().unwrap(), 60);
        TuningUpdate {
            ttl: Some(5),
            cooldown_seconds: Some(-10),
            up_threshold: Some(0),
            down_threshold: Some(-1),
        }
        .apply(&mut state);

        assert_eq!(state.ttl, MIN_TTL);
        assert_eq!(state.cooldown_seconds, 0);
        assert_eq!(state.up_threshold, 1);
        assert_eq!(state.down_threshold, 0);
    }

    #[test]
    fn tuning_update_leaves_unset_fields() {
        let mut state = ServiceState::initial("192.0.2.1".parse().unwrap(), 120);
        state.cooldown_seconds = 30;
        TuningUpdate {
            up_threshold: Some(3),
            ..Default::default()
        }
        .apply(&mut state);

        assert_eq!(state.ttl, 120);
        assert_eq!(state.cooldown_seconds, 30);
        assert_eq!(state.up_threshold, 3);
    }

    #[test]
    fn switch_timestamp_never_moves_back() {
        let now = Utc::now();
        let later = now + ChronoDuration::seconds(60);
        assert_eq!(monotonic(None, now), now);
        assert_eq!(monotonic(Some(later), now), later);
        assert_eq!(monotonic(Some(now), later), later);
    }

    #[test]
    fn secret_comparison() {
        assert!(constant_time_eq("abc123", "abc123"));
        assert!(!constant_time_eq("abc123", "abc124"));
        assert!(!constant_time_eq("abc", "abc123"));
    }

    #[test]
    fn decision_summary_mentions_both_targets() {
        let decision = Decision {
            source: "server1-webhook".to_string(),
            target1_up: false,
            target2_up: true,
            outcome: Outcome::Switched {
                report: PublishReport {
                    previous: "192.0.2.1".parse().unwrap(),
                    new_ip: "192.0.2.2".parse().unwrap(),
                    updated: vec!["a.example.com".to_string()],
                    failed: vec![RecordFailure {
                        name: "b.example.com".to_string(),
                        error: "boom".to_string(),
                    }],
                },
            },
        };

        let summary = decision.summary();
        assert!(summary.contains("192.0.2.2"));
        assert!(summary.contains("S1=DOWN, S2=UP"));
        assert!(summary.contains("1 of 2 records failed"));
        assert!(decision.switched());
    }
}
