//! Executes a prepared request through the HTTP client and keeps a history of
//! every exchange for diagnostics.

use crate::error::CheckError;
use crate::request::PreparedRequest;
use crate::transport::{HttpClient, HttpResponse, OutgoingRequest, Timings};
use serde::Serialize;
use tracing::debug;

/// Exchanges kept per executor; the oldest is dropped past this.
pub const HISTORY_LIMIT: usize = 64;

/// One request and what came back for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub request: OutgoingRequest,
    pub response: Result<HttpResponse, CheckError>,
}

/// The URI, headers and body of a sent request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl From<&OutgoingRequest> for RequestSnapshot {
    fn from(request: &OutgoingRequest) -> Self {
        Self {
            uri: request.url.to_string(),
            headers: request.headers.clone(),
            body: String::from_utf8_lossy(&request.body).into_owned(),
        }
    }
}

pub struct Executor<C> {
    client: C,
    history: Vec<Exchange>,
}

impl<C: HttpClient> Executor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    /// Send `prepared` and record the exchange.
    ///
    /// Error statuses come back as `Ok`; `timings` is filled either way.
    pub async fn execute(
        &mut self,
        prepared: &PreparedRequest,
        timings: &mut Timings,
    ) -> Result<HttpResponse, CheckError> {
        let request = OutgoingRequest::from_prepared(prepared);
        let response = self.client.send(&request, timings).await;

        match &response {
            Ok(resp) => debug!(
                url = %request.url,
                status = resp.status,
                bytes = resp.body.len(),
                "received response"
            ),
            Err(err) => debug!(url = %request.url, %err, "request failed"),
        }

        if self.history.len() >= HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(Exchange {
            request,
            response: response.clone(),
        });
        response
    }

    /// The last [`HISTORY_LIMIT`] exchanges, most recent last.
    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Snapshot of the most recent request, empty if nothing was sent yet.
    pub fn last_request(&self) -> RequestSnapshot {
        self.history
            .last()
            .map(|exchange| RequestSnapshot::from(&exchange.request))
            .unwrap_or_default()
    }
}
