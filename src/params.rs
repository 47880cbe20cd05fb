//! Check parameters.
//!
//! Caller-supplied params arrive as loosely-typed JSON. Each allow-listed key is
//! run through its own validator; a key that fails is dropped whole so the
//! instance default applies instead. Accepted values are merged over the
//! defaults to produce the [`CheckParams`] used for one check.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Keys a caller may set. Anything else is discarded before validation.
pub const ALLOWED_PARAMS: [&str; 14] = [
    "host",
    "protocol",
    "port",
    "type",
    "auth",
    "header",
    "form",
    "content",
    "include_exclude",
    "ipv6",
    "maintenance",
    "allow_redirects",
    "http_codes",
    "timeout",
];

pub const DEFAULT_HTTP_CODES: [u16; 6] = [200, 301, 302, 304, 307, 308];
pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            _ => None,
        }
    }
}

/// How the content marker decides the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Up when the content marker is present.
    #[default]
    Include,
    /// Up when the content marker is absent.
    Exclude,
}

impl MatchMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "include" => Some(MatchMode::Include),
            "exclude" => Some(MatchMode::Exclude),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// One `{name, value}` entry of the `header` or `form` lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

impl NameValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Fully resolved configuration for one check.
///
/// Also the shape of a checker's instance defaults, so it deserializes from the
/// `[defaults]` table of the config file with every field optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckParams {
    /// Hostname, optionally followed by a path (`example.com/status`).
    pub host: String,
    pub protocol: Protocol,
    pub port: u16,
    #[serde(rename = "type")]
    pub method: HttpMethod,
    /// Base64 of the content marker; empty disables it.
    pub content: String,
    pub include_exclude: MatchMode,
    /// Accepted but not applied to the transport.
    pub ipv6: bool,
    /// Base64 of the maintenance marker; empty disables it.
    pub maintenance: String,
    pub allow_redirects: bool,
    pub http_codes: Vec<u16>,
    /// Seconds.
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,
    #[serde(rename = "header")]
    pub headers: Vec<NameValue>,
    pub form: Vec<NameValue>,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            host: String::new(),
            protocol: Protocol::Http,
            port: DEFAULT_PORT,
            method: HttpMethod::Get,
            content: String::new(),
            include_exclude: MatchMode::Include,
            ipv6: false,
            maintenance: String::new(),
            allow_redirects: true,
            http_codes: DEFAULT_HTTP_CODES.to_vec(),
            timeout: DEFAULT_TIMEOUT_SECS,
            auth: None,
            headers: Vec::new(),
            form: Vec::new(),
        }
    }
}

impl CheckParams {
    /// Validate raw caller params and merge the accepted ones over `self`.
    pub fn resolve(&self, raw: &Map<String, Value>) -> Self {
        self.merged(&validate(raw))
    }

    /// Copy of `self` with every accepted override applied.
    pub fn merged(&self, overrides: &ParamOverrides) -> Self {
        let mut params = self.clone();
        if let Some(host) = &overrides.host {
            params.host.clone_from(host);
        }
        if let Some(protocol) = overrides.protocol {
            params.protocol = protocol;
        }
        if let Some(port) = overrides.port {
            params.port = port;
        }
        if let Some(method) = overrides.method {
            params.method = method;
        }
        if let Some(auth) = &overrides.auth {
            params.auth = Some(auth.clone());
        }
        if let Some(headers) = &overrides.headers {
            params.headers.clone_from(headers);
        }
        if let Some(form) = &overrides.form {
            params.form.clone_from(form);
        }
        if let Some(content) = &overrides.content {
            params.content.clone_from(content);
        }
        if let Some(mode) = overrides.include_exclude {
            params.include_exclude = mode;
        }
        if let Some(ipv6) = overrides.ipv6 {
            params.ipv6 = ipv6;
        }
        if let Some(maintenance) = &overrides.maintenance {
            params.maintenance.clone_from(maintenance);
        }
        if let Some(allow) = overrides.allow_redirects {
            params.allow_redirects = allow;
        }
        if let Some(codes) = &overrides.http_codes {
            params.http_codes.clone_from(codes);
        }
        if let Some(timeout) = overrides.timeout {
            params.timeout = timeout;
        }
        params
    }
}

/// Fields that survived validation. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub host: Option<String>,
    pub protocol: Option<Protocol>,
    pub port: Option<u16>,
    pub method: Option<HttpMethod>,
    pub auth: Option<Credentials>,
    pub headers: Option<Vec<NameValue>>,
    pub form: Option<Vec<NameValue>>,
    pub content: Option<String>,
    pub include_exclude: Option<MatchMode>,
    pub ipv6: Option<bool>,
    pub maintenance: Option<String>,
    pub allow_redirects: Option<bool>,
    pub http_codes: Option<Vec<u16>>,
    pub timeout: Option<u64>,
}

/// Why a single param was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Dropped {
    #[error("expected {0}")]
    Type(&'static str),

    #[error("expected exactly the keys {0}")]
    Shape(&'static str),

    #[error("unsupported value '{0}'")]
    Literal(String),
}

/// Run every allow-listed key through its validator.
///
/// Never fails: unknown keys and invalid values are logged and left out.
pub fn validate(raw: &Map<String, Value>) -> ParamOverrides {
    let mut accepted = ParamOverrides::default();

    for (key, value) in raw {
        let outcome = match key.as_str() {
            "host" => string(value).map(|v| accepted.host = Some(v)),
            "protocol" => literal(value, Protocol::parse).map(|v| accepted.protocol = Some(v)),
            "port" => port(value).map(|v| accepted.port = Some(v)),
            "type" => literal(value, HttpMethod::parse).map(|v| accepted.method = Some(v)),
            "auth" => auth(value).map(|v| accepted.auth = Some(v)),
            "header" => pairs(value).map(|v| accepted.headers = Some(v)),
            "form" => pairs(value).map(|v| accepted.form = Some(v)),
            "content" => string(value).map(|v| accepted.content = Some(v)),
            "include_exclude" => {
                literal(value, MatchMode::parse).map(|v| accepted.include_exclude = Some(v))
            }
            "ipv6" => boolean(value).map(|v| accepted.ipv6 = Some(v)),
            "maintenance" => string(value).map(|v| accepted.maintenance = Some(v)),
            "allow_redirects" => boolean(value).map(|v| accepted.allow_redirects = Some(v)),
            "http_codes" => http_codes(value).map(|v| accepted.http_codes = Some(v)),
            "timeout" => timeout(value).map(|v| accepted.timeout = Some(v)),
            _ => {
                debug!(param = %key, "dropping param outside the allow-list");
                continue;
            }
        };

        if let Err(reason) = outcome {
            debug!(param = %key, %reason, "dropping invalid param, default applies");
        }
    }

    accepted
}

fn string(value: &Value) -> Result<String, Dropped> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(Dropped::Type("string"))
}

fn literal<T>(value: &Value, parse: fn(&str) -> Option<T>) -> Result<T, Dropped> {
    let s = value.as_str().ok_or(Dropped::Type("string"))?;
    parse(s).ok_or_else(|| Dropped::Literal(s.to_string()))
}

fn boolean(value: &Value) -> Result<bool, Dropped> {
    value.as_bool().ok_or(Dropped::Type("boolean"))
}

fn port(value: &Value) -> Result<u16, Dropped> {
    value
        .as_u64()
        .filter(|p| *p > 0)
        .and_then(|p| u16::try_from(p).ok())
        .ok_or(Dropped::Type("port number between 1 and 65535"))
}

fn timeout(value: &Value) -> Result<u64, Dropped> {
    value
        .as_u64()
        .filter(|t| *t > 0)
        .ok_or(Dropped::Type("positive integer"))
}

/// Elements are not validated individually: integers and numeric strings are
/// kept, anything else is ignored without rejecting the list.
fn http_codes(value: &Value) -> Result<Vec<u16>, Dropped> {
    let items = value.as_array().ok_or(Dropped::Type("array"))?;
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect())
}

fn auth(value: &Value) -> Result<Credentials, Dropped> {
    let object = value.as_object().ok_or(Dropped::Type("object"))?;
    let [login, password] = exact_keys(object, ["login", "password"])
        .ok_or(Dropped::Shape("{login, password}"))?;
    Ok(Credentials { login, password })
}

/// A list of `{name, value}` objects. One bad entry rejects the whole list.
fn pairs(value: &Value) -> Result<Vec<NameValue>, Dropped> {
    let items = value.as_array().ok_or(Dropped::Type("array"))?;
    items
        .iter()
        .map(|item| -> Result<NameValue, Dropped> {
            let object = item.as_object().ok_or(Dropped::Shape("{name, value}"))?;
            let [name, value] =
                exact_keys(object, ["name", "value"]).ok_or(Dropped::Shape("{name, value}"))?;
            Ok(NameValue { name, value })
        })
        .collect()
}

/// Values of `keys` when the object has exactly those keys and each is a scalar.
fn exact_keys<const N: usize>(
    object: &Map<String, Value>,
    keys: [&str; N],
) -> Option<[String; N]> {
    let wanted: BTreeSet<&str> = keys.iter().copied().collect();
    let present: BTreeSet<&str> = object.keys().map(String::as_str).collect();
    if wanted != present {
        return None;
    }

    let mut values = Vec::with_capacity(N);
    for key in keys {
        values.push(scalar(object.get(key)?)?);
    }
    values.try_into().ok()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
