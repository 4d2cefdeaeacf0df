//! Public resolver lookups for operator diagnostics
//!
//! Queries a DNS-over-HTTPS JSON endpoint (`application/dns-json`) to show
//! what the outside world currently resolves for the managed records.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare's public DoH JSON endpoint
pub const DEFAULT_DOH_URL: &str = "https://cloudflare-dns.com/dns-query";

/// Diagnostics look at no more than this many records
pub const MAX_CHECKS: usize = 3;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of resolving one record name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsCheck {
    pub name: String,
    pub ok: bool,
    /// Addresses returned by the resolver
    pub answers: Vec<String>,
    /// Whether the published target is among the answers
    pub matches_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status", default)]
    status: i64,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

/// DNS-over-HTTPS client
#[derive(Debug, Clone)]
pub struct DohResolver {
    endpoint: String,
    client: reqwest::Client,
}

impl DohResolver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .context("Failed to build DoH client")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Resolve `name` for the family of `expected` and compare
    pub async fn check(&self, name: &str, expected: IpAddr) -> DnsCheck {
        let (query_type, wire_type) = if expected.is_ipv4() { ("A", 1) } else { ("AAAA", 28) };

        match self.lookup(name, query_type, wire_type).await {
            Ok(answers) => DnsCheck {
                name: name.to_string(),
                ok: true,
                matches_current: answers
                    .iter()
                    .any(|a| a.parse::<IpAddr>().is_ok_and(|ip| ip == expected)),
                answers,
                error: None,
            },
            Err(e) => {
                tracing::debug!("DoH lookup of {} failed: {:#}", name, e);
                DnsCheck {
                    name: name.to_string(),
                    ok: false,
                    answers: Vec::new(),
                    matches_current: false,
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    }

    async fn lookup(&self, name: &str, query_type: &str, wire_type: u16) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", name), ("type", query_type)])
            .header("accept", "application/dns-json")
            .send()
            .await
            .context("resolver unreachable")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("resolver returned {}", status);
        }

        let body: DohResponse = response.json().await.context("unexpected resolver reply")?;
        if body.status != 0 {
            anyhow::bail!("resolver status {}", body.status);
        }

        // CNAME hops appear in the answer section too.
        Ok(body
            .answer
            .into_iter()
            .filter(|a| a.record_type == wire_type)
            .map(|a| a.data)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn dns_query(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        let name = query.get("name").cloned().unwrap_or_default();
        match (name.as_str(), query.get("type").map(String::as_str)) {
            ("app.example.com", Some("A")) => Json(json!({
                "Status": 0,
                "Answer": [
                    {"name": "app.example.com", "type": 5, "TTL": 60, "data": "edge.example.net."},
                    {"name": "edge.example.net", "type": 1, "TTL": 60, "data": "192.0.2.2"}
                ]
            })),
            _ => Json(json!({"Status": 3})),
        }
    }

    async fn spawn_resolver() -> String {
        let app = Router::new().route("/dns-query", get(dns_query));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/dns-query", addr)
    }

    #[tokio::test]
    async fn answers_are_compared_with_published_target() {
        let resolver = DohResolver::new(spawn_resolver().await).unwrap();

        let check = resolver
            .check("app.example.com", "192.0.2.2".parse().unwrap())
            .await;
        assert!(check.ok);
        assert_eq!(check.answers, vec!["192.0.2.2"]);
        assert!(check.matches_current);

        let check = resolver
            .check("app.example.com", "192.0.2.1".parse().unwrap())
            .await;
        assert!(check.ok);
        assert!(!check.matches_current);
    }

    #[tokio::test]
    async fn nxdomain_is_reported_as_failure() {
        let resolver = DohResolver::new(spawn_resolver().await).unwrap();

        let check = resolver
            .check("gone.example.com", "192.0.2.1".parse().unwrap())
            .await;
        assert!(!check.ok);
        assert!(check.error.unwrap().contains("status 3"));
    }

    #[tokio::test]
    async fn unreachable_resolver_is_reported_as_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolver = DohResolver::new(format!("http://{}/dns-query", addr)).unwrap();
        let check = resolver
            .check("app.example.com", "192.0.2.1".parse().unwrap())
            .await;
        assert!(!check.ok);
        assert!(check.error.is_some());
    }
}
