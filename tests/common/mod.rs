//! Shared test utilities for content-check integration tests

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_content_check::CheckRequest;
use serde_json::{Map, Value, json};
use wiremock::MockServer;

/// Monitor id used across tests, as the monitoring pipeline sends it
pub const MONITOR_ID: i64 = 123123;

/// Base64 marker for `text`
pub fn marker(text: &str) -> String {
    STANDARD.encode(text)
}

/// Params pointing at `path` on the mock server, merged with `extra`
pub fn target_params(server: &MockServer, path: &str, extra: Value) -> Value {
    let address = server.address();
    let mut params = Map::new();
    params.insert(
        "host".to_string(),
        json!(format!("{}{}", address.ip(), path)),
    );
    params.insert("port".to_string(), json!(address.port()));
    if let Value::Object(extra) = extra {
        params.extend(extra);
    }
    Value::Object(params)
}

/// Check request with JSON-encoded params, like the queue delivers it
pub fn check_request(params: Value) -> CheckRequest {
    serde_json::from_value(json!({
        "monitor_id": MONITOR_ID,
        "locations": ["eu-1"],
        "current_location": "eu-1",
        "frequency": 60,
        "transaction_id": "tx-42",
        "cycle_id": 7,
        "type": "http",
        "date": null,
        "params": params.to_string(),
    }))
    .expect("Failed to build check request")
}
