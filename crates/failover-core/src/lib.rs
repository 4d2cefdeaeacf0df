// # failover-core
//
// Core library for the two-target DNS failover service.
//
// ## Architecture Overview
//
// This library decides which of two targets should be published in DNS
// and keeps the registrar in line with that decision:
// - **Health tracking**: heartbeats update per-target flags and streaks
// - **FailoverEngine**: applies freeze, cooldown and hysteresis, then
//   publishes the chosen address to every managed record
// - **DnsProvider**: trait for listing and updating records at a registrar
// - **StateStore**: trait for durable service state (atomic file, memory)
// - **Notifier**: trait for best-effort alerts on switches
//
// ## Design Principles
//
// 1. **Single owner**: all state mutation goes through the engine lock
// 2. **Fail fast, recover slow**: down reports act at once, recovery is gated
// 3. **Best-effort I/O**: registrar and notifier failures never crash the process
// 4. **Library-First**: the HTTP daemon is a thin shell over this crate

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod heartbeat;
pub mod model;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, FailoverConfig, NotifierConfig, ProviderConfig, StateStoreConfig};
pub use engine::{
    Decision, EngineEvent, FailoverEngine, HoldReason, Outcome, PublishReport, RecordFailure,
    StatusSnapshot, TuningUpdate,
};
pub use error::{Error, Result};
pub use heartbeat::parse_heartbeat;
pub use model::{PublicState, ServiceState, TargetId, Targets};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{
    Clock, DnsProvider, DnsRecord, NoopNotifier, Notifier, RecordType, StateStore, SystemClock,
    UpdateResult,
};
