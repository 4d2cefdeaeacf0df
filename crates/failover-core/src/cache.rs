//! DNS record cache
//!
//! Holds the managed records as last fetched from the registrar, keyed by
//! record name. The cache is the source of record identifiers, types and
//! proxy flags for updates; it is never consulted to decide which address
//! is correct.
//!
//! Entries are replaced wholesale on refresh, never patched one by one.

use std::collections::BTreeMap;

use crate::traits::DnsRecord;

/// Name-keyed set of managed records
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    records: BTreeMap<String, DnsRecord>,
}

impl RecordCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with `records`
    ///
    /// If the registrar returns several records with the same name, the
    /// last one wins.
    pub fn replace(&mut self, records: Vec<DnsRecord>) {
        let mut next = BTreeMap::new();
        for record in records {
            if let Some(previous) = next.insert(record.name.clone(), record) {
                tracing::debug!(
                    "Duplicate record name {} from registrar; keeping the later entry",
                    previous.name
                );
            }
        }
        self.records = next;
    }

    /// Record the content that was just written, so snapshots reflect it
    pub fn set_content(&mut self, name: &str, content: String, ttl: u32) {
        if let Some(record) = self.records.get_mut(name) {
            record.content = content;
            record.ttl = ttl;
        }
    }

    /// Whether the cache holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of cached records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Look up a record by name
    pub fn get(&self, name: &str) -> Option<&DnsRecord> {
        self.records.get(name)
    }

    /// Cached record names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    /// Owned copy of every cached record, for use outside the lock
    pub fn to_vec(&self) -> Vec<DnsRecord> {
        self.records.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RecordType;

    fn record(id: &str, name: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: name.to_string(),
            record_type: RecordType::A,
            content: content.to_string(),
            ttl: 60,
            proxied: false,
        }
    }

    #[test]
    fn replace_is_wholesale() {
        let mut cache = RecordCache::new();
        cache.replace(vec![
            record("1", "a.example.com", "192.0.2.1"),
            record("2", "b.example.com", "192.0.2.1"),
        ]);
        assert_eq!(cache.len(), 2);

        cache.replace(vec![record("3", "c.example.com", "192.0.2.1")]);
        assert_eq!(cache.names(), vec!["c.example.com".to_string()]);
        assert!(cache.get("a.example.com").is_none());
    }

    #[test]
    fn duplicate_names_keep_last() {
        let mut cache = RecordCache::new();
        cache.replace(vec![
            record("1", "a.example.com", "192.0.2.1"),
            record("2", "a.example.com", "192.0.2.2"),
        ]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a.example.com").unwrap().id, "2");
    }

    #[test]
    fn set_content_touches_known_records_only() {
        let mut cache = RecordCache::new();
        cache.replace(vec![record("1", "a.example.com", "192.0.2.1")]);

        cache.set_content("a.example.com", "192.0.2.9".to_string(), 120);
        cache.set_content("missing.example.com", "192.0.2.9".to_string(), 120);

        let a = cache.get("a.example.com").unwrap();
        assert_eq!(a.content, "192.0.2.9");
        assert_eq!(a.ttl, 120);
        assert_eq!(cache.len(), 1);
    }
}
