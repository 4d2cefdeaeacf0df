// # DNS Provider Trait
//
// Defines the interface to the registrar that publishes the managed records.
//
// ## Implementations
//
// - Cloudflare: `failover-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use failover_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let provider = /* DnsProvider implementation */;
//
//     // Fetch the managed record set
//     let records = provider.list_records(&["app.example.com".to_string()]).await?;
//
//     // Point each record at the new target
//     for record in &records {
//         provider.update_record(record, "203.0.113.7".parse()?, 60).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address record type of a managed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire representation used by registrar APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a registrar record type; anything but A/AAAA yields `None`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// Whether an address of this family can be written into the record
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        matches!(
            (self, ip),
            (RecordType::A, IpAddr::V4(_)) | (RecordType::Aaaa, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed DNS record as last seen at the registrar
///
/// `id`, `record_type` and `proxied` are carried verbatim into updates;
/// `content` is only ever overwritten, never used to decide the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Registrar-assigned record identifier
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record type (A or AAAA)
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Currently published value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Registrar proxy flag
    pub proxied: bool,
}

/// Result of a single record update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The registrar accepted the new content
    Updated {
        /// Content before the update, as cached
        previous_content: String,
        /// The new IP address
        new_ip: IpAddr,
    },
    /// Dry-run mode: the request was logged but not sent
    Simulated {
        /// The IP address that would have been written
        new_ip: IpAddr,
    },
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// Providers are isolated, stateless, single-shot API clients:
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the engine decides what happens next)
/// - ❌ Retry or back off (a failed record is picked up on the next decision)
/// - ❌ Cache records (owned by the engine's record cache)
/// - ❌ Touch service state (owned by `FailoverEngine`)
/// - ❌ Decide which target should be published
///
/// Every outbound request must carry a bounded timeout so a hung registrar
/// cannot stall the decision path.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch the complete record set, following pagination
    ///
    /// # Parameters
    ///
    /// - `names`: Allow-list of record names. Empty means "every address
    ///   record the registrar returns".
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: All A/AAAA records matching the allow-list
    /// - `Err(Error)`: If any page could not be fetched
    async fn list_records(&self, names: &[String]) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Overwrite one record's content
    ///
    /// The request carries the record's existing `type`, `name` and
    /// `proxied` flag together with `new_ip` and `ttl`.
    ///
    /// # Idempotency
    ///
    /// Writing the same IP twice must be safe; the second call simply
    /// rewrites the same value.
    async fn update_record(
        &self,
        record: &DnsRecord,
        new_ip: IpAddr,
        ttl: u32,
    ) -> Result<UpdateResult, crate::Error>;

    /// Verify that the configured credentials can reach the zone
    ///
    /// Used by operator diagnostics only.
    async fn check_access(&self) -> Result<(), crate::Error> {
        Ok(())
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
