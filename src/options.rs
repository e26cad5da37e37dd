use std::time::Duration;

use crate::Verb;

/// Ceiling applied to every configured budget, keeping deadline arithmetic
/// far from `Instant` overflow.
pub(crate) const LONGEST_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Per-call overrides of the configured timeouts and request decorations.
///
/// Unset fields fall back to [`MonitoringConfig`](crate::MonitoringConfig).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallOptions {
    /// Ceiling for establishing a connection to one host.
    pub connect_timeout: Option<Duration>,
    /// Ceiling for the exchange of a GET attempt once connected.
    pub read_timeout: Option<Duration>,
    /// Ceiling for the exchange of a mutating attempt once connected.
    pub write_timeout: Option<Duration>,
    /// Minimum pause between a failed attempt and the next one.
    pub wait_before_retry: Option<Duration>,
    /// Overall budget of the logical call, across every attempt.
    pub call_timeout: Option<Duration>,
    /// Extra headers, overriding static ones with the same name.
    pub headers: Vec<(String, String)>,
    /// Extra query string parameters.
    pub query_parameters: Vec<(String, String)>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn wait_before_retry(mut self, wait: Duration) -> Self {
        self.wait_before_retry = Some(wait);
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.push((name.into(), value.into()));
        self
    }

    /// Layers these options over `defaults`.
    ///
    /// Set timeouts win. Headers replace default headers of the same name,
    /// compared case-insensitively. Query parameters are appended.
    pub fn merged_over(&self, defaults: &CallOptions) -> CallOptions {
        let mut headers: Vec<_> = defaults
            .headers
            .iter()
            .filter(|(name, _)| {
                !self
                    .headers
                    .iter()
                    .any(|(other, _)| other.eq_ignore_ascii_case(name))
            })
            .cloned()
            .collect();
        headers.extend(self.headers.iter().cloned());

        CallOptions {
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            read_timeout: self.read_timeout.or(defaults.read_timeout),
            write_timeout: self.write_timeout.or(defaults.write_timeout),
            wait_before_retry: self.wait_before_retry.or(defaults.wait_before_retry),
            call_timeout: self.call_timeout.or(defaults.call_timeout),
            headers,
            query_parameters: defaults
                .query_parameters
                .iter()
                .chain(&self.query_parameters)
                .cloned()
                .collect(),
        }
    }
}

/// Fully resolved per-attempt budgets for one logical call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
    pub wait_before_retry: Duration,
    pub call: Duration,
}

impl Timeouts {
    /// Exchange budget of an attempt: read for GET, write for the rest.
    pub fn exchange(&self, verb: Verb) -> Duration {
        if verb.is_mutating() {
            self.write
        } else {
            self.read
        }
    }
}
