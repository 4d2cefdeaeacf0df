// # State Store Trait
//
// Defines the interface for persisting the service state.
//
// ## Purpose
//
// The state store lets the service survive a restart without spurious
// switches. It keeps exactly one record, the whole `ServiceState`:
// - Health flags and hysteresis streaks
// - The currently published target and last switch time
// - Operator settings (freeze, TTL, thresholds, cooldown)
// - The webhook shared secret (only ever written here, never exported)
//
// ## Implementations
//
// - File-based: JSON file with atomic write-then-rename
// - In-memory: for tests and ephemeral deployments

use async_trait::async_trait;

use crate::model::ServiceState;

/// Trait for state store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// The engine serializes its own saves, so implementations only need to
/// guarantee that a single save is atomic.
///
/// # Trust Level: Trusted (Core Component)
///
/// - ✅ Perform I/O for persistent storage
/// - ✅ Recover from corrupt files (backup, defaults)
/// - ❌ Implement business logic (owned by `FailoverEngine`)
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the durable state
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: A stored state was found
    /// - `Ok(None)`: Nothing stored yet (first run)
    /// - `Err(Error)`: The stored state is unreadable
    async fn load(&self) -> Result<Option<ServiceState>, crate::Error>;

    /// Overwrite the durable state
    ///
    /// Must never leave a half-written record behind if the process is
    /// interrupted mid-write.
    async fn save(&self, state: &ServiceState) -> Result<(), crate::Error>;

    /// Short description of where state lives (for logging)
    fn describe(&self) -> String;

    /// Read the durable state, falling back to `defaults`
    ///
    /// Missing, corrupt or mismatched state is a recoverable condition:
    /// it is logged and never fatal to startup.
    async fn load_or_default(&self, defaults: ServiceState) -> ServiceState {
        match self.load().await {
            Ok(Some(state)) => {
                tracing::info!("Loaded service state from {}", self.describe());
                state
            }
            Ok(None) => {
                tracing::info!(
                    "No stored service state at {}; starting from defaults",
                    self.describe()
                );
                defaults
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load service state from {}, using defaults: {}",
                    self.describe(),
                    e
                );
                defaults
            }
        }
    }
}
