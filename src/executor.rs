use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime},
};

use reqwest::Method;
use serde_json::Value;
use tokio::time::timeout;

use crate::{
    error::AttemptError,
    host::{HostsCollection, RegisteredHost},
    options::Timeouts,
    retry::{classify_status, should_retry, ErrorKind},
    MonitoringError, Result,
};

/// HTTP verb of a logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// Whether the verb mutates remote state, selecting the write timeout.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }

    fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

/// Everything about a logical call that stays the same from host to host.
#[derive(Debug)]
pub(crate) struct Request<'a> {
    pub verb: Verb,
    pub path: &'a str,
    pub payload: Option<&'a Value>,
    pub headers: &'a [(String, String)],
    pub query: &'a [(String, String)],
}

/// Why one attempt did not produce a payload.
#[derive(Debug)]
pub(crate) enum Failure {
    Connectivity { message: String, timed_out: bool },
    Status { status: u16, body: String },
}

impl Failure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Status { status, .. } => classify_status(*status),
        }
    }

    pub fn into_attempt_error(self) -> AttemptError {
        match self {
            Self::Connectivity { message, timed_out } => {
                AttemptError::Connectivity { message, timed_out }
            }
            Self::Status { status, body } => AttemptError::Server { status, body },
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        Self::Connectivity {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

/// Result of one physical attempt.
#[derive(Debug)]
pub(crate) enum Outcome {
    Success(Value),
    Failed(Failure),
    /// Not attributable to the host: bad request setup or undecodable body.
    Fatal(MonitoringError),
}

/// Clients beyond this many timeout pairs are built per call and not kept.
const MAX_CACHED_CLIENTS: usize = 16;

/// Issues single attempts against single hosts.
#[derive(Clone, Debug, Default)]
pub(crate) struct RequestExecutor {
    clients: Arc<Mutex<HashMap<(Duration, Duration), reqwest::Client>>>,
}

impl RequestExecutor {
    /// Builds the clients for the configured read and write budgets up front.
    pub fn new(timeouts: &Timeouts) -> Result<Self> {
        let executor = Self::default();
        executor.client_for(timeouts.connect, timeouts.read)?;
        executor.client_for(timeouts.connect, timeouts.write)?;
        Ok(executor)
    }

    /// HTTP client enforcing `connect` on connection setup and `exchange` on
    /// every wait for response data once connected.
    ///
    /// Both budgets live on the client, so each distinct pair gets its own.
    pub fn client_for(&self, connect: Duration, exchange: Duration) -> Result<reqwest::Client> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(http) = clients.get(&(connect, exchange)) {
            return Ok(http.clone());
        }
        let http = build_http(connect, exchange)?;
        if clients.len() < MAX_CACHED_CLIENTS {
            clients.insert((connect, exchange), http.clone());
        }
        Ok(http)
    }

    /// Performs one attempt and feeds its health signal back into `hosts`.
    ///
    /// `http` must come from [`client_for`](Self::client_for) with the same
    /// `exchange`. `budget` is what remains of the call deadline; the attempt
    /// never outlives it.
    pub async fn attempt(
        &self,
        http: &reqwest::Client,
        hosts: &HostsCollection,
        host: &RegisteredHost,
        request: &Request<'_>,
        exchange: Duration,
        budget: Duration,
    ) -> Outcome {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            host = host.name(),
            path = request.path,
            "attempting {:?} with {:?} exchange timeout, {:?} left",
            request.verb,
            exchange,
            budget
        );

        let outcome = send(http, host, request, exchange, budget).await;
        match &outcome {
            Outcome::Success(_) => {
                let recovered = hosts.mark_up(host);
                #[cfg(feature = "tracing")]
                if recovered {
                    tracing::debug!(host = host.name(), "host recovered");
                }
                #[cfg(not(feature = "tracing"))]
                let _ = recovered;
            }
            Outcome::Failed(failure) if should_retry(failure.kind()) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(host = host.name(), "marking host down: {:?}", failure);
                hosts.mark_down(host, SystemTime::now());
            }
            Outcome::Failed(_) | Outcome::Fatal(_) => {}
        }
        outcome
    }
}

fn build_http(connect: Duration, exchange: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect)
        .read_timeout(exchange)
        .build()
        .map_err(|err| MonitoringError::Configuration(format!("cannot build HTTP client: {err}")))
}

async fn send(
    http: &reqwest::Client,
    host: &RegisteredHost,
    request: &Request<'_>,
    exchange: Duration,
    budget: Duration,
) -> Outcome {
    // the client enforces connect and exchange; this only clamps to the deadline
    let mut builder = http
        .request(request.verb.method(), host.host().url(request.path))
        .timeout(budget);
    for (name, value) in request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !request.query.is_empty() {
        builder = builder.query(request.query);
    }
    if let Some(payload) = request.payload {
        builder = builder.json(payload);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) if err.is_builder() => {
            return Outcome::Fatal(MonitoringError::Configuration(format!(
                "invalid request for {}: {err}",
                host.name()
            )))
        }
        Err(err) => return Outcome::Failed(err.into()),
    };

    let status = response.status();
    let body = match timeout(exchange, response.text()).await {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => return Outcome::Failed(err.into()),
        Err(_) => {
            return Outcome::Failed(Failure::Connectivity {
                message: format!("response body not received within {exchange:?}"),
                timed_out: true,
            })
        }
    };

    if !status.is_success() {
        return Outcome::Failed(Failure::Status {
            status: status.as_u16(),
            body,
        });
    }

    match decode_body(&body) {
        Ok(value) => Outcome::Success(value),
        Err(err) => Outcome::Fatal(err),
    }
}

/// Decodes a successful response body; an empty body decodes to `null`.
pub(crate) fn decode_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| {
        MonitoringError::Decode(format!("invalid response JSON: {err}; body: {body}"))
    })
}
