//! Core traits for the failover system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: List and update managed records at the registrar
//! - [`StateStore`]: Persist the service state across restarts
//! - [`Notifier`]: Best-effort alerts on state changes
//! - [`Clock`]: Time source for cooldown and switch timestamps

pub mod clock;
pub mod dns_provider;
pub mod notifier;
pub mod state_store;

pub use clock::{Clock, SystemClock};
pub use dns_provider::{DnsProvider, DnsRecord, RecordType, UpdateResult};
pub use notifier::{NoopNotifier, Notifier};
pub use state_store::StateStore;
