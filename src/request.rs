//! Turns resolved params into the method, URI and transport options of a check.

use crate::error::CheckError;
use crate::params::{CheckParams, HttpMethod, NameValue};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Transport options derived from params.
///
/// `ipv6` has no counterpart here: the flag is accepted in params but never
/// forces address resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// `(login, password)` for Basic auth.
    pub auth: Option<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub allow_redirects: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub options: RequestOptions,
}

/// Build the full request for `params`.
pub fn build(params: &CheckParams) -> Result<PreparedRequest, CheckError> {
    let url = build_uri(params)?;
    debug!(%url, method = params.method.as_str(), "built check request");

    Ok(PreparedRequest {
        method: params.method,
        url,
        options: build_options(params),
    })
}

/// Split `host` on the first `/` into authority and path and assemble the URI.
///
/// The port is always set; it only shows up in the rendered URI when it is not
/// the scheme's default.
pub fn build_uri(params: &CheckParams) -> Result<Url, CheckError> {
    let (authority, path) = params
        .host
        .split_once('/')
        .unwrap_or((params.host.as_str(), ""));

    if authority.is_empty() {
        return Err(CheckError::InvalidInput);
    }

    let mut url = Url::parse(&format!("{}://{}", params.protocol.as_str(), authority))
        .map_err(|err| {
            debug!(host = %params.host, %err, "host does not form a valid URI");
            CheckError::InvalidInput
        })?;

    url.set_port(Some(params.port))
        .map_err(|()| CheckError::InvalidInput)?;

    if !path.is_empty() {
        url.set_path(&format!("/{path}"));
    }

    Ok(url)
}

pub fn build_options(params: &CheckParams) -> RequestOptions {
    RequestOptions {
        auth: params
            .auth
            .as_ref()
            .map(|creds| (creds.login.clone(), creds.password.clone())),
        headers: project(&params.headers),
        form: project(&params.form),
        allow_redirects: params.allow_redirects,
        timeout: Duration::from_secs(params.timeout),
    }
}

/// Project `{name, value}` pairs into a name to value mapping.
///
/// A repeated name keeps its first position and takes the last value.
fn project(pairs: &[NameValue]) -> Vec<(String, String)> {
    let mut mapping: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        match mapping.iter_mut().find(|(name, _)| *name == pair.name) {
            Some((_, value)) => value.clone_from(&pair.value),
            None => mapping.push((pair.name.clone(), pair.value.clone())),
        }
    }
    mapping
}
