// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Provides a simple, fast state store that doesn't persist across restarts.
// Useful for testing, or deployments where starting from defaults after a
// restart is acceptable.
//
// ## Crash Behavior
//
// - All state is lost on restart/crash
// - First run after a crash starts on target 1 and re-decides from there

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::model::ServiceState;
use crate::traits::state_store::StateStore;

/// In-memory state store implementation
///
/// Clones share the same underlying slot, so a test can keep a handle and
/// inspect what the engine saved.
///
/// # Example
///
/// ```rust,no_run
/// use failover_core::state::MemoryStateStore;
/// use failover_core::traits::StateStore;
/// use failover_core::ServiceState;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     let state = ServiceState::initial("192.0.2.1".parse()?, 60);
///
///     store.save(&state).await?;
///     assert_eq!(store.load().await?, Some(state));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<ServiceState>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a state (simulates a restart)
    pub fn with_state(state: ServiceState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(state))),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last saved state, if any
    pub async fn current(&self) -> Option<ServiceState> {
        self.inner.read().await.clone()
    }

    /// Forget the stored state
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<ServiceState>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, state: &ServiceState) -> Result<(), Error> {
        *self.inner.write().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
