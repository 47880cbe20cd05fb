//! Single-shot HTTP/HTTPS uptime and content check.
//!
//! A [`Checker`](checker::Checker) takes one check request, resolves its params
//! over instance defaults, sends exactly one request and reports timing, status
//! code and content-marker outcome. It never returns an error: every failure is
//! described in the result's `error` field.

pub mod checker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod executor;
pub mod exit_codes;
pub mod logging;
pub mod message;
pub mod output;
pub mod params;
pub mod request;
pub mod transport;
pub mod ua;

pub use checker::Checker;
pub use error::CheckError;
pub use message::{CheckRequest, CheckResult, MainResult};
pub use params::CheckParams;
