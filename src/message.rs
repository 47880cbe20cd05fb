//! Input and output messages of a check.
//!
//! Identifying fields are opaque to the checker and are echoed into the result
//! untouched, as is any extra top-level field.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Timestamp layout of `CheckResult::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub monitor_id: Value,
    #[serde(default)]
    pub locations: Value,
    #[serde(default)]
    pub current_location: Value,
    #[serde(default)]
    pub frequency: Value,
    #[serde(default)]
    pub transaction_id: Value,
    #[serde(default)]
    pub cycle_id: Value,
    #[serde(default, rename = "type")]
    pub kind: Value,
    #[serde(default)]
    pub date: Value,
    /// JSON-encoded params object. A bare object is accepted as well.
    #[serde(default)]
    pub params: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckRequest {
    /// Decode `params` into a loosely-typed mapping.
    ///
    /// Anything that is not a JSON object yields an empty mapping, leaving every
    /// field at its default.
    pub fn decode_params(&self) -> Map<String, Value> {
        let decoded = match &self.params {
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(value) => value,
                Err(err) => {
                    warn!(monitor_id = %self.monitor_id, %err, "params are not valid JSON");
                    return Map::new();
                }
            },
            other => other.clone(),
        };

        match decoded {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                warn!(
                    monitor_id = %self.monitor_id,
                    kind = json_kind(&other),
                    "params are not a JSON object"
                );
                Map::new()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome sentinel: `"down"` or the total time in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MainResult {
    #[default]
    Down,
    Up(u64),
}

impl MainResult {
    pub fn is_up(&self) -> bool {
        matches!(self, MainResult::Up(_))
    }
}

impl fmt::Display for MainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainResult::Down => write!(f, "down"),
            MainResult::Up(ms) => write!(f, "{}", ms),
        }
    }
}

impl Serialize for MainResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MainResult::Down => serializer.serialize_str("down"),
            MainResult::Up(ms) => serializer.serialize_u64(*ms),
        }
    }
}

impl<'de> Deserialize<'de> for MainResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MainResultVisitor;

        impl Visitor<'_> for MainResultVisitor {
            type Value = MainResult;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"down\" or a non-negative integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MainResult, E> {
                Ok(MainResult::Up(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MainResult, E> {
                u64::try_from(v)
                    .map(MainResult::Up)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MainResult, E> {
                match v {
                    "down" => Ok(MainResult::Down),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(MainResultVisitor)
    }
}

/// Keys the checker computes. Same-named request keys never pass through.
const COMPUTED_FIELDS: [&str; 10] = [
    "main_result",
    "content_position",
    "maintenance_position",
    "http_code",
    "total_time",
    "namelookup_time",
    "connect_time",
    "pretransfer_time",
    "starttransfer_time",
    "error",
];

/// Result of one check: the echoed request fields plus computed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub monitor_id: Value,
    pub locations: Value,
    pub current_location: Value,
    pub frequency: Value,
    pub transaction_id: Value,
    pub cycle_id: Value,
    #[serde(rename = "type")]
    pub kind: Value,
    /// Completion time, local clock.
    pub date: String,
    /// Raw params exactly as received.
    pub params: Value,
    pub main_result: MainResult,
    pub content_position: i64,
    pub maintenance_position: i64,
    /// 0 when no response was obtained.
    pub http_code: u16,
    pub total_time: u64,
    pub namelookup_time: u64,
    pub connect_time: u64,
    pub pretransfer_time: u64,
    pub starttransfer_time: u64,
    /// Empty on success.
    pub error: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CheckResult {
    /// Fresh result echoing the request, before anything is measured.
    pub fn from_request(request: CheckRequest) -> Self {
        let CheckRequest {
            monitor_id,
            locations,
            current_location,
            frequency,
            transaction_id,
            cycle_id,
            kind,
            date: _,
            params,
            mut extra,
        } = request;
        extra.retain(|key, _| !COMPUTED_FIELDS.contains(&key.as_str()));

        Self {
            monitor_id,
            locations,
            current_location,
            frequency,
            transaction_id,
            cycle_id,
            kind,
            date: String::new(),
            params,
            main_result: MainResult::Down,
            content_position: -1,
            maintenance_position: -1,
            http_code: 0,
            total_time: 0,
            namelookup_time: 0,
            connect_time: 0,
            pretransfer_time: 0,
            starttransfer_time: 0,
            error: String::new(),
            extra,
        }
    }

    pub fn is_up(&self) -> bool {
        self.error.is_empty() && self.main_result.is_up()
    }
}
