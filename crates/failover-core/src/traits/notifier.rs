// # Notifier Trait
//
// Best-effort outbound alerts on state changes.
//
// ## Implementations
//
// - Telegram: `failover-notify-telegram` crate
// - `NoopNotifier`: used when no credentials are configured
//
// Failures never reach the decision path: the engine bounds every call
// with a timeout and logs whatever comes back.

use async_trait::async_trait;

/// Trait for notifier implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to the configured destination
    async fn notify(&self, text: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Notifier that drops every message
///
/// Absence of credentials is a silent no-op, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, text: &str) -> Result<(), crate::Error> {
        tracing::trace!("Notifier disabled, dropping message: {}", text);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "noop"
    }
}
