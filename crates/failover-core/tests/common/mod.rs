//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that record what the engine
//! asks of its collaborators without talking to any network.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use failover_core::config::{FailoverConfig, ProviderConfig};
use failover_core::engine::{EngineEvent, FailoverEngine};
use failover_core::error::{Error, Result};
use failover_core::model::TargetId;
use failover_core::state::MemoryStateStore;
use failover_core::traits::{
    Clock, DnsProvider, DnsRecord, Notifier, RecordType, StateStore, UpdateResult,
};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub fn ip1() -> IpAddr {
    IpAddr::from([192, 0, 2, 1])
}

pub fn ip2() -> IpAddr {
    IpAddr::from([192, 0, 2, 2])
}

/// An A record currently pointing at target 1
pub fn record(id: &str, name: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: RecordType::A,
        content: ip1().to_string(),
        ttl: 300,
        proxied: false,
    }
}

/// Three managed records, one of them proxied
pub fn three_records() -> Vec<DnsRecord> {
    let mut records = vec![
        record("id-app", "app.example.com"),
        record("id-api", "api.example.com"),
        record("id-www", "www.example.com"),
    ];
    records[2].proxied = true;
    records
}

/// Configuration accepted by `FailoverConfig::validate`
pub fn test_config() -> FailoverConfig {
    let mut config = FailoverConfig::new(ip1(), ip2());
    config.provider = ProviderConfig::Cloudflare {
        api_token: "test-token".to_string(),
        zone_id: "test-zone".to_string(),
        dry_run: false,
    };
    config
}

/// One call to `update_record`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub name: String,
    pub record_type: RecordType,
    pub proxied: bool,
    pub content: IpAddr,
    pub ttl: u32,
}

/// A mock DnsProvider that tracks calls
///
/// Clones share their records and counters, so a test can keep one
/// handle while the engine owns another.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    updates: Arc<Mutex<Vec<UpdateCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    list_call_count: Arc<AtomicUsize>,
    fail_listing: Arc<AtomicBool>,
}

impl MockDnsProvider {
    pub fn with_records(records: Vec<DnsRecord>) -> Self {
        let provider = Self::default();
        *provider.records.lock().unwrap() = records;
        provider
    }

    /// Make every update to `name` fail
    pub fn fail_updates_for(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Make `list_records` fail
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_records(&self, records: Vec<DnsRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Content currently held by the fake registrar
    pub fn content_of(&self, name: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, names: &[String]) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::http("mock registrar unavailable"));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| names.is_empty() || names.contains(&r.name))
            .cloned()
            .collect())
    }

    async fn update_record(
        &self,
        record: &DnsRecord,
        new_ip: IpAddr,
        ttl: u32,
    ) -> Result<UpdateResult> {
        self.updates.lock().unwrap().push(UpdateCall {
            name: record.name.clone(),
            record_type: record.record_type,
            proxied: record.proxied,
            content: new_ip,
            ttl,
        });

        if self.failing.lock().unwrap().contains(&record.name) {
            return Err(Error::provider("mock", format!("rejected {}", record.name)));
        }

        let mut records = self.records.lock().unwrap();
        let previous_content = match records.iter_mut().find(|r| r.id == record.id) {
            Some(stored) => std::mem::replace(&mut stored.content, new_ip.to_string()),
            None => return Err(Error::not_found(record.id.clone())),
        };

        Ok(UpdateResult::Updated {
            previous_content,
            new_ip,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier that remembers every message
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Make `notify` return an error (after recording the message)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notifier("mock notifier down"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// A clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(
                Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            )),
        }
    }

    pub fn advance(&self, seconds: i64) {
        *self.now.lock().unwrap() += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Engine wired to test doubles, with handles to inspect them
pub struct Harness {
    pub engine: FailoverEngine,
    pub events: mpsc::Receiver<EngineEvent>,
    pub provider: MockDnsProvider,
    pub store: MemoryStateStore,
    pub notifier: RecordingNotifier,
    pub clock: ManualClock,
}

impl Harness {
    /// Engine with three managed records and a fresh state
    pub async fn new() -> Self {
        Self::with(
            MockDnsProvider::with_records(three_records()),
            MemoryStateStore::new(),
            test_config(),
        )
        .await
    }

    pub async fn with(
        provider: MockDnsProvider,
        store: MemoryStateStore,
        config: FailoverConfig,
    ) -> Self {
        Self::with_store(provider, Box::new(store.clone()), store, config).await
    }

    /// Variant for tests that persist through a different store
    pub async fn with_store(
        provider: MockDnsProvider,
        state_store: Box<dyn StateStore>,
        store: MemoryStateStore,
        config: FailoverConfig,
    ) -> Self {
        let notifier = RecordingNotifier::default();
        let clock = ManualClock::new();

        let (engine, events) = FailoverEngine::new(
            Arc::new(provider.clone()),
            state_store,
            Arc::new(notifier.clone()),
            Arc::new(clock.clone()),
            &config,
        )
        .await
        .expect("engine construction succeeds");

        Self {
            engine,
            events,
            provider,
            store,
            notifier,
            clock,
        }
    }

    /// Send `count` identical heartbeats for `target`
    pub async fn beat(&self, target: TargetId, is_up: bool, count: usize) {
        for _ in 0..count {
            self.engine.heartbeat(target, is_up, "test").await;
        }
    }

    pub async fn current_target(&self) -> IpAddr {
        self.engine.snapshot().await.state.current_target
    }

    /// Drain every event emitted so far
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
