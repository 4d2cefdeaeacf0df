//! Heartbeat payload decoding
//!
//! Monitors push a JSON body with a nested health indicator:
//!
//! ```json
//! { "heartbeat": { "status": 1 } }
//! ```
//!
//! `status == 1` means up, any other integer means down. Anything that does
//! not match this shape is rejected before it can touch service state.

use serde_json::Value;

use crate::error::{Error, Result};

/// Decode a heartbeat body into an up/down flag
pub fn parse_heartbeat(body: &[u8]) -> Result<bool> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::invalid_input(format!("heartbeat body is not valid JSON: {}", e)))?;

    heartbeat_status(&value)
}

/// Decode an already-parsed heartbeat document
pub fn heartbeat_status(value: &Value) -> Result<bool> {
    let heartbeat = value
        .get("heartbeat")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::invalid_input("missing or non-object `heartbeat` field"))?;

    let status = heartbeat
        .get("status")
        .ok_or_else(|| Error::invalid_input("missing `heartbeat.status` field"))?;

    let code = status
        .as_i64()
        .ok_or_else(|| Error::invalid_input(format!("non-integer `heartbeat.status`: {}", status)))?;

    Ok(code == 1)
}
