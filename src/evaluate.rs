//! Response evaluation: status acceptance, marker search and the up/down rule.

use crate::error::CheckError;
use crate::params::{CheckParams, MatchMode};
use crate::transport::HttpResponse;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Markers are accepted with or without trailing padding.
const MARKER_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Position reported for a disabled or missing marker.
pub const NOT_FOUND: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub content_position: i64,
    pub maintenance_position: i64,
    /// The expected condition was met; the check counts as up.
    pub up: bool,
}

/// Evaluate a response against the resolved params.
///
/// Fails with [`CheckError::UnexpectedStatus`] when the status is not one of
/// `http_codes`; markers are not searched in that case.
pub fn evaluate(response: &HttpResponse, params: &CheckParams) -> Result<Evaluation, CheckError> {
    if !params.http_codes.contains(&response.status) {
        return Err(CheckError::UnexpectedStatus(response.status));
    }

    let content_position = find_position(&response.body, &params.content);
    let maintenance_position = find_position(&response.body, &params.maintenance);
    let in_maintenance = maintenance_position > NOT_FOUND;

    // Maintenance counts as up in both modes.
    let up = match params.include_exclude {
        MatchMode::Include => content_position > NOT_FOUND || in_maintenance,
        MatchMode::Exclude => content_position == NOT_FOUND || in_maintenance,
    };

    Ok(Evaluation {
        content_position,
        maintenance_position,
        up,
    })
}

/// Decode a base64 marker. Empty or undecodable markers are disabled.
pub fn decode_marker(encoded: &str) -> Option<Vec<u8>> {
    if encoded.is_empty() {
        return None;
    }
    MARKER_ENGINE
        .decode(encoded)
        .ok()
        .filter(|needle| !needle.is_empty())
}

/// Byte offset of the first occurrence of the decoded marker in `body`, or -1.
pub fn find_position(body: &[u8], encoded_marker: &str) -> i64 {
    let Some(needle) = decode_marker(encoded_marker) else {
        return NOT_FOUND;
    };
    if needle.len() > body.len() {
        return NOT_FOUND;
    }

    body.windows(needle.len())
        .position(|window| window == needle.as_slice())
        .and_then(|pos| i64::try_from(pos).ok())
        .unwrap_or(NOT_FOUND)
}
