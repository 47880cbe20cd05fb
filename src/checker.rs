//! The checker: one linear pass per `check` call.
//!
//! params resolved -> request built -> response received -> evaluated.
//! Any phase may fail; the failure ends the pass and is written to the result's
//! `error` field. `check` itself always returns a result.

use crate::error::CheckError;
use crate::evaluate::evaluate;
use crate::executor::{Exchange, Executor, RequestSnapshot};
use crate::message::{CheckRequest, CheckResult, DATE_FORMAT, MainResult};
use crate::params::{CheckParams, validate};
use crate::request;
use crate::transport::{HttpClient, ReqwestClient, Timings};
use chrono::Local;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Runs single HTTP checks against instance defaults.
///
/// Defaults and history are owned by the instance and mutated through
/// `&mut self`; concurrent checks need separate instances.
pub struct Checker<C = ReqwestClient> {
    defaults: CheckParams,
    executor: Executor<C>,
}

impl Checker<ReqwestClient> {
    pub fn new() -> Self {
        Self::with_defaults(CheckParams::default())
    }

    pub fn with_defaults(defaults: CheckParams) -> Self {
        Self::with_client(ReqwestClient::new(), defaults)
    }
}

impl Default for Checker<ReqwestClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HttpClient> Checker<C> {
    pub fn with_client(client: C, defaults: CheckParams) -> Self {
        Self {
            defaults,
            executor: Executor::new(client),
        }
    }

    pub fn defaults(&self) -> &CheckParams {
        &self.defaults
    }

    /// Merge validated overrides into the instance defaults.
    ///
    /// Uses the same validator as request params, so a rejected field leaves
    /// the current default in place.
    pub fn set_defaults(&mut self, overrides: &Map<String, Value>) -> &CheckParams {
        self.defaults = self.defaults.merged(&validate(overrides));
        &self.defaults
    }

    /// Run one check. Never fails; problems end up in `CheckResult::error`.
    pub async fn check(&mut self, request: CheckRequest) -> CheckResult {
        let params = self.defaults.resolve(&request.decode_params());
        let mut result = CheckResult::from_request(request);

        if let Err(err) = self.run(&params, &mut result).await {
            result.error = err.caller_message(&result.monitor_id);
            warn!(monitor_id = %result.monitor_id, error = %result.error, "check failed");
        }

        result.date = Local::now().format(DATE_FORMAT).to_string();
        info!(
            monitor_id = %result.monitor_id,
            http_code = result.http_code,
            total_time = result.total_time,
            main_result = %result.main_result,
            "check finished"
        );
        result
    }

    async fn run(
        &mut self,
        params: &CheckParams,
        result: &mut CheckResult,
    ) -> Result<(), CheckError> {
        let prepared = request::build(params)?;

        let mut timings = Timings::default();
        let outcome = self.executor.execute(&prepared, &mut timings).await;
        record_timings(result, &timings);
        let response = outcome?;

        result.http_code = response.status;
        let evaluation = evaluate(&response, params)?;

        result.content_position = evaluation.content_position;
        result.maintenance_position = evaluation.maintenance_position;
        if evaluation.up {
            result.main_result = MainResult::Up(result.total_time);
        }
        Ok(())
    }

    /// Recent exchanges, most recent last.
    ///
    /// Bounded by [`HISTORY_LIMIT`](crate::executor::HISTORY_LIMIT).
    pub fn history(&self) -> &[Exchange] {
        self.executor.history()
    }

    pub fn clear_history(&mut self) {
        self.executor.clear_history();
    }

    /// URI, headers and body of the most recent request.
    pub fn last_request(&self) -> RequestSnapshot {
        self.executor.last_request()
    }
}

fn record_timings(result: &mut CheckResult, timings: &Timings) {
    result.total_time = Timings::millis(timings.total);
    result.namelookup_time = Timings::millis(timings.namelookup);
    result.connect_time = Timings::millis(timings.connect);
    result.pretransfer_time = Timings::millis(timings.pretransfer);
    result.starttransfer_time = Timings::millis(timings.starttransfer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MatchMode, Protocol};
    use crate::transport::{HttpResponse, OutgoingRequest};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    /// Serves a canned outcome with fixed timings.
    struct StubClient {
        outcome: Result<HttpResponse, CheckError>,
    }

    impl StubClient {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                outcome: Ok(HttpResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                outcome: Err(CheckError::transport(msg)),
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for StubClient {
        async fn send(
            &self,
            _request: &OutgoingRequest,
            timings: &mut Timings,
        ) -> Result<HttpResponse, CheckError> {
            timings.namelookup = Some(Duration::from_micros(4_200));
            timings.starttransfer = Some(Duration::from_millis(90));
            timings.total = Some(Duration::from_micros(120_700));
            self.outcome.clone()
        }
    }

    fn request(monitor_id: Value, params: Value) -> CheckRequest {
        CheckRequest {
            monitor_id,
            params: Value::String(params.to_string()),
            ..Default::default()
        }
    }

    fn marker(text: &str) -> String {
        STANDARD.encode(text)
    }

    #[tokio::test]
    async fn test_include_match_reports_total_time() {
        let mut checker = Checker::with_client(
            StubClient::ok(200, "<h1>Shop is open</h1>"),
            CheckParams::default(),
        );

        let result = checker
            .check(request(
                json!(123123),
                json!({"host": "shop.example/", "content": marker("open")}),
            ))
            .await;

        assert_eq!(result.error, "");
        assert_eq!(result.http_code, 200);
        assert_eq!(result.content_position, 12);
        assert_eq!(result.maintenance_position, -1);
        assert_eq!(result.total_time, 120);
        assert_eq!(result.main_result, MainResult::Up(120));
        assert_eq!(result.namelookup_time, 4);
        assert_eq!(result.starttransfer_time, 90);
        assert_eq!(result.connect_time, 0);
        assert!(result.is_up());
    }

    #[tokio::test]
    async fn test_include_without_match_is_down() {
        let mut checker =
            Checker::with_client(StubClient::ok(200, "nothing here"), CheckParams::default());

        let result = checker
            .check(request(
                json!(1),
                json!({"host": "shop.example", "content": marker("open")}),
            ))
            .await;

        assert_eq!(result.main_result, MainResult::Down);
        assert_eq!(result.error, "");
        assert_eq!(result.total_time, 120);
    }

    #[tokio::test]
    async fn test_exclude_absent_is_up() {
        let mut checker =
            Checker::with_client(StubClient::ok(200, "all fine"), CheckParams::default());

        let result = checker
            .check(request(
                json!(1),
                json!({
                    "host": "shop.example",
                    "content": marker("Fatal error"),
                    "include_exclude": "exclude"
                }),
            ))
            .await;

        assert_eq!(result.content_position, -1);
        assert_eq!(result.maintenance_position, -1);
        assert_eq!(result.main_result, MainResult::Up(120));
    }

    #[tokio::test]
    async fn test_empty_host_is_input_error() {
        let mut checker = Checker::with_client(StubClient::ok(200, ""), CheckParams::default());

        let result = checker.check(request(json!(123123), json!({}))).await;

        assert_eq!(
            result.error,
            "Error code: input-data-incorrect object_id: 123123"
        );
        assert_eq!(result.main_result, MainResult::Down);
        assert_eq!(result.http_code, 0);
        assert!(checker.history().is_empty());
    }

    #[tokio::test]
    async fn test_status_outside_http_codes() {
        let mut checker =
            Checker::with_client(StubClient::ok(404, "Not Found"), CheckParams::default());

        let result = checker
            .check(request(
                json!(123123),
                json!({"host": "shop.example", "content": marker("Not")}),
            ))
            .await;

        assert_eq!(
            result.error,
            "Error code: http-code-incorrect object_id: 123123"
        );
        assert_eq!(result.http_code, 404);
        assert_eq!(result.main_result, MainResult::Down);
        assert_eq!(result.content_position, -1);
    }

    #[tokio::test]
    async fn test_transport_error_is_raw_and_keeps_timings() {
        let mut checker = Checker::with_client(
            StubClient::failing("error sending request for url (http://shop.example/)"),
            CheckParams::default(),
        );

        let result = checker
            .check(request(json!(5), json!({"host": "shop.example"})))
            .await;

        assert_eq!(
            result.error,
            "error sending request for url (http://shop.example/)"
        );
        assert_eq!(result.total_time, 120);
        assert_eq!(result.http_code, 0);
        assert_eq!(result.main_result, MainResult::Down);
    }

    #[tokio::test]
    async fn test_date_is_stamped_on_every_path() {
        let mut checker = Checker::with_client(StubClient::ok(200, ""), CheckParams::default());

        let failed = checker.check(request(json!(1), json!({}))).await;
        let passed = checker
            .check(request(json!(1), json!({"host": "shop.example"})))
            .await;

        for result in [failed, passed] {
            assert!(NaiveDateTime::parse_from_str(&result.date, DATE_FORMAT).is_ok());
        }
    }

    #[tokio::test]
    async fn test_instance_defaults_apply() {
        let defaults = CheckParams {
            host: "status.example/health".to_string(),
            protocol: Protocol::Https,
            port: 443,
            ..Default::default()
        };
        let mut checker = Checker::with_client(StubClient::ok(200, ""), defaults);

        checker.check(request(json!(1), json!({}))).await;

        assert_eq!(checker.last_request().uri, "https://status.example/health");
    }

    #[tokio::test]
    async fn test_set_defaults_validates_overrides() {
        let mut checker = Checker::with_client(StubClient::ok(200, ""), CheckParams::default());

        let overrides = json!({
            "timeout": 3,
            "include_exclude": "exclude",
            "port": "eighty",
            "cycle_id": 4
        });
        let defaults = checker
            .set_defaults(overrides.as_object().unwrap())
            .clone();

        assert_eq!(defaults.timeout, 3);
        assert_eq!(defaults.include_exclude, MatchMode::Exclude);
        assert_eq!(defaults.port, 80);
        assert_eq!(checker.defaults(), &defaults);
    }

    #[tokio::test]
    async fn test_request_params_do_not_leak_into_defaults() {
        let mut checker = Checker::with_client(StubClient::ok(200, ""), CheckParams::default());

        checker
            .check(request(json!(1), json!({"host": "one.example", "port": 8080})))
            .await;

        assert_eq!(checker.defaults(), &CheckParams::default());
    }

    #[tokio::test]
    async fn test_pass_through_fields_survive() {
        let mut checker = Checker::with_client(StubClient::ok(200, ""), CheckParams::default());
        let mut input = request(json!("m-1"), json!({"host": "shop.example"}));
        input.cycle_id = json!(77);
        input.extra.insert("queue".to_string(), json!("checks"));
        let raw_params = input.params.clone();

        let result = checker.check(input).await;

        assert_eq!(result.monitor_id, json!("m-1"));
        assert_eq!(result.cycle_id, json!(77));
        assert_eq!(result.extra.get("queue"), Some(&json!("checks")));
        assert_eq!(result.params, raw_params);
    }
}
