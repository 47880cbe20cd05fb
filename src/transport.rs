//! HTTP client capability used by the executor.
//!
//! The checker materializes everything it sends into an [`OutgoingRequest`] and
//! hands it to an [`HttpClient`] together with a [`Timings`] sink. The default
//! client is backed by reqwest.

use crate::error::{CheckError, error_chain};
use crate::params::HttpMethod;
use crate::request::PreparedRequest;
use crate::ua::user_agent_header;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url, redirect};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Redirect hops followed when redirects are allowed.
const MAX_REDIRECTS: usize = 5;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request exactly as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub follow_redirects: bool,
    pub timeout: Duration,
}

impl OutgoingRequest {
    /// Materialize options into concrete headers and body.
    ///
    /// Credentials become a Basic `Authorization` header replacing any caller
    /// header of that name. A non-empty form is urlencoded into the body and
    /// sets `Content-Type` unless the caller already did.
    pub fn from_prepared(prepared: &PreparedRequest) -> Self {
        let options = &prepared.options;
        let mut headers = options.headers.clone();

        if let Some((login, password)) = &options.auth {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            let token = STANDARD.encode(format!("{login}:{password}"));
            headers.push(("Authorization".to_string(), format!("Basic {token}")));
        }

        let mut body = Vec::new();
        if !options.form.is_empty() {
            body = encode_form(&options.form).into_bytes();
            if !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            }
        }

        Self {
            method: prepared.method,
            url: prepared.url.clone(),
            headers,
            body,
            follow_redirects: options.allow_redirects,
            timeout: options.timeout,
        }
    }
}

fn encode_form(form: &[(String, String)]) -> String {
    form.iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Low-level timing stats of one exchange, each measured from the start of the
/// request. `None` means the transport could not observe that stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub namelookup: Option<Duration>,
    pub connect: Option<Duration>,
    pub pretransfer: Option<Duration>,
    pub starttransfer: Option<Duration>,
    pub total: Option<Duration>,
}

impl Timings {
    /// Whole milliseconds, zero when unavailable.
    pub fn millis(stage: Option<Duration>) -> u64 {
        stage
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Capability the checker issues its single request through.
///
/// Error statuses are ordinary responses; only failures to obtain a response
/// are errors. Implementations fill `timings` before returning, on failure too.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        request: &OutgoingRequest,
        timings: &mut Timings,
    ) -> Result<HttpResponse, CheckError>;
}

/// reqwest-backed client.
///
/// A fresh reqwest client is built per send so the redirect policy and the DNS
/// timing resolver belong to that one exchange.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient;

impl ReqwestClient {
    pub fn new() -> Self {
        Self
    }

    fn build_client(
        request: &OutgoingRequest,
        resolver: TimedResolver,
    ) -> Result<Client, CheckError> {
        let policy = if request.follow_redirects {
            redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            redirect::Policy::none()
        };

        Client::builder()
            .user_agent(user_agent_header())
            .redirect(policy)
            .timeout(request.timeout)
            .dns_resolver(Arc::new(resolver))
            .build()
            .map_err(|err| CheckError::unknown(error_chain(&err)))
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, CheckError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| CheckError::unknown(format!("invalid header name '{name}'")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| CheckError::unknown(format!("invalid value for header '{name}'")))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn send(
        &self,
        request: &OutgoingRequest,
        timings: &mut Timings,
    ) -> Result<HttpResponse, CheckError> {
        let resolver = TimedResolver::default();
        let client = Self::build_client(request, resolver.clone())?;

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };
        let mut builder = client
            .request(method, request.url.clone())
            .headers(Self::header_map(&request.headers)?);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let started = Instant::now();
        let outcome = builder.send().await;
        timings.namelookup = resolver.elapsed();

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                timings.total = Some(started.elapsed());
                return Err(map_send_error(&err));
            }
        };
        timings.starttransfer = Some(started.elapsed());

        let status = response.status().as_u16();
        let body = response.bytes().await;
        timings.total = Some(started.elapsed());

        let body = body.map_err(|err| map_send_error(&err))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_send_error(err: &reqwest::Error) -> CheckError {
    if err.is_builder() {
        CheckError::unknown(error_chain(err))
    } else {
        CheckError::transport(error_chain(err))
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// DNS resolver that records how long the lookup took.
#[derive(Debug, Clone, Default)]
struct TimedResolver {
    elapsed: Arc<Mutex<Option<Duration>>>,
}

impl TimedResolver {
    fn elapsed(&self) -> Option<Duration> {
        self.elapsed.lock().ok().and_then(|slot| *slot)
    }
}

impl Resolve for TimedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let elapsed = Arc::clone(&self.elapsed);
        Box::pin(async move {
            let started = Instant::now();
            let found = tokio::net::lookup_host((name.as_str(), 0)).await;
            if let Ok(mut slot) = elapsed.lock() {
                *slot = Some(started.elapsed());
            }

            let addrs: Vec<SocketAddr> = match found {
                Ok(addrs) => addrs.collect(),
                Err(err) => return Err(Box::new(err) as BoxError),
            };
            Ok::<Addrs, BoxError>(Box::new(addrs.into_iter()))
        })
    }
}
