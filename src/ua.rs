//! Default `User-Agent` for check requests.
//!
//! A `User-Agent` entry in the check's header params replaces it.

use reqwest::header::HeaderValue;

/// Product token, used on its own if the platform suffix is not a valid header.
pub const PRODUCT: &str = concat!("content-check/", env!("CARGO_PKG_VERSION"));

/// `content-check/{version} ({os}; {arch})`
pub fn user_agent() -> String {
    format!(
        "{} ({}; {})",
        PRODUCT,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

pub fn user_agent_header() -> HeaderValue {
    HeaderValue::from_str(&user_agent()).unwrap_or(HeaderValue::from_static(PRODUCT))
}
