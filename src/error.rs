use std::fmt;

/// Failure of a single physical attempt that allowed failover to continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptError {
    /// DNS, connect refusal, broken exchange or attempt timeout.
    Connectivity {
        /// Human-readable cause reported by the HTTP stack.
        message: String,
        /// Whether the attempt ran out of its timeout budget.
        timed_out: bool,
    },
    /// The host answered with a server-side fault status.
    Server {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity {
                message,
                timed_out: true,
            } => write!(f, "timed out: {message}"),
            Self::Connectivity { message, .. } => write!(f, "unreachable: {message}"),
            Self::Server { status, body } => write!(f, "server error {status}: {body}"),
        }
    }
}

/// One entry of the attempt history carried by aggregate failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostFailure {
    /// Name of the host the attempt was issued against.
    pub host: String,
    /// What went wrong.
    pub error: AttemptError,
}

impl fmt::Display for HostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.error)
    }
}

struct History<'a>(&'a [HostFailure]);

impl fmt::Display for History<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    /// Invalid client setup, such as an empty host pool. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The service rejected the request itself (bad auth, malformed payload,
    /// not found). Returned on first occurrence without trying other hosts.
    #[error("client error {status} from {host}: {body}")]
    Client {
        /// Host that rejected the request.
        host: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The overall call deadline elapsed before any host succeeded.
    #[error("call timed out after {} attempt(s): {}", .attempts.len(), History(.attempts))]
    CallTimeout {
        /// Attempts made before the deadline, in order.
        attempts: Vec<HostFailure>,
    },
    /// Every candidate host was attempted and failed retryably.
    #[error("all {} host(s) failed: {}", .attempts.len(), History(.attempts))]
    ExhaustedHosts {
        /// One entry per attempted host, in order.
        attempts: Vec<HostFailure>,
    },
    /// A successful response carried a body that is not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),
}

impl MonitoringError {
    /// Per-host attempt history of an aggregate failure.
    pub fn attempts(&self) -> &[HostFailure] {
        match self {
            Self::CallTimeout { attempts } | Self::ExhaustedHosts { attempts } => attempts,
            _ => &[],
        }
    }

    /// HTTP status of a client rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller may reasonably repeat the whole logical call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CallTimeout { .. } | Self::ExhaustedHosts { .. })
    }
}
