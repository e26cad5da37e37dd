use std::{fmt, sync::Arc, time::Duration};

use crate::{
    host::{CallKind, Host, HostsCollection},
    options::{Timeouts, LONGEST_TIMEOUT},
    CallOptions, MonitoringError, Result,
};

/// Header carrying the application identifier.
pub const APPLICATION_ID_HEADER: &str = "X-Validandgo-Application-Id";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Validandgo-API-Key";

/// Builds the default host set derived from an application identifier.
///
/// Example: `"abc"` gives `abc-dsn.validandgo.net` for reads,
/// `abc.validandgo.net` for writes, and three shared fallbacks
/// `abc-{1,2,3}.validandgonet.com`.
pub fn default_hosts(app_id: &str) -> Vec<Host> {
    let app_id = app_id.trim();
    let mut hosts = vec![
        Host::new(format!("{app_id}-dsn.validandgo.net"))
            .with_priority(10)
            .with_call_kind(CallKind::Read),
        Host::new(format!("{app_id}.validandgo.net"))
            .with_priority(10)
            .with_call_kind(CallKind::Write),
    ];
    hosts.extend((1..=3).map(|n| Host::new(format!("{app_id}-{n}.validandgonet.com"))));
    hosts
}

fn default_user_agent() -> String {
    format!("Valid&GO for Rust ({})", env!("CARGO_PKG_VERSION"))
}

/// Process-wide transport configuration: credentials, hosts and timeouts.
#[derive(Clone)]
pub struct MonitoringConfig {
    pub app_id: String,
    api_key: String,
    pub hosts: Arc<HostsCollection>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Pause between a failed attempt and the next one.
    pub wait_before_retry: Duration,
    /// Overall deadline of one logical call.
    pub call_timeout: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl fmt::Debug for MonitoringConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoringConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("hosts", &self.hosts)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("wait_before_retry", &self.wait_before_retry)
            .field("call_timeout", &self.call_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl MonitoringConfig {
    /// Creates a configuration using the hosts derived from `app_id`.
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(MonitoringError::Configuration(
                "app_id cannot be empty".to_owned(),
            ));
        }
        let hosts = HostsCollection::new(default_hosts(&app_id))?;
        Ok(Self {
            app_id,
            api_key: api_key.into(),
            hosts: Arc::new(hosts),
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(30),
            wait_before_retry: Duration::from_micros(100_000),
            call_timeout: Duration::from_secs(60),
            user_agent: default_user_agent(),
            headers: Vec::new(),
        })
    }

    /// Creates a configuration from environment variables.
    ///
    /// Reads:
    /// - `VALIDANDGO_APP_ID` — application identifier
    /// - `VALIDANDGO_API_KEY` — API key
    ///
    /// Returns a configuration error if either variable is missing or empty.
    pub fn from_env() -> Result<Self> {
        let app_id = std::env::var("VALIDANDGO_APP_ID").map_err(|_| {
            MonitoringError::Configuration(
                "missing VALIDANDGO_APP_ID environment variable".to_owned(),
            )
        })?;
        let api_key = std::env::var("VALIDANDGO_API_KEY").map_err(|_| {
            MonitoringError::Configuration(
                "missing VALIDANDGO_API_KEY environment variable".to_owned(),
            )
        })?;
        if api_key.trim().is_empty() {
            return Err(MonitoringError::Configuration(
                "VALIDANDGO_API_KEY is set but empty".to_owned(),
            ));
        }
        Self::new(app_id, api_key)
    }

    /// Replaces the derived hosts with an explicit registry.
    ///
    /// Passing an `Arc` lets the caller keep a handle for health inspection.
    pub fn with_hosts(mut self, hosts: impl Into<Arc<HostsCollection>>) -> Self {
        self.hosts = hosts.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_wait_before_retry(mut self, wait: Duration) -> Self {
        self.wait_before_retry = wait;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Adds a static header sent with every attempt.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Appends `; <segment> (<version>)` to the user agent.
    pub fn add_user_agent(&mut self, segment: &str, version: &str) {
        self.user_agent.push_str(&format!("; {segment} ({version})"));
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Checks invariants that builders cannot enforce on their own.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(MonitoringError::Configuration(
                "app_id cannot be empty".to_owned(),
            ));
        }
        if self.hosts.is_empty() {
            return Err(MonitoringError::Configuration(
                "host list cannot be empty".to_owned(),
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(MonitoringError::Configuration(
                "call_timeout must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Headers merged into every attempt, static ones first.
    pub(crate) fn static_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            (APPLICATION_ID_HEADER.to_owned(), self.app_id.clone()),
            (API_KEY_HEADER.to_owned(), self.api_key.clone()),
            ("User-Agent".to_owned(), self.user_agent.clone()),
            ("Content-Type".to_owned(), "application/json".to_owned()),
        ];
        headers.extend(self.headers.iter().cloned());
        headers
    }

    pub(crate) fn timeouts(&self, options: &CallOptions) -> Timeouts {
        let resolve = |call: Option<Duration>, default: Duration| {
            call.unwrap_or(default).min(LONGEST_TIMEOUT)
        };
        Timeouts {
            connect: resolve(options.connect_timeout, self.connect_timeout),
            read: resolve(options.read_timeout, self.read_timeout),
            write: resolve(options.write_timeout, self.write_timeout),
            wait_before_retry: resolve(options.wait_before_retry, self.wait_before_retry),
            call: resolve(options.call_timeout, self.call_timeout),
        }
    }
}
