use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{
    error::HostFailure,
    executor::{Failure, Outcome, Request, RequestExecutor, Verb},
    host::CallKind,
    retry::{build_plan, classify_status, next_host, pause_before_retry, should_retry},
    CallOptions, MonitoringConfig, MonitoringError, Result,
};

/// Single call surface for every domain object.
///
/// Each logical call is planned against the pool of its [`CallKind`], then
/// attempted host by host, strictly sequentially, until one succeeds, the
/// request is rejected, the pool is exhausted or the call deadline passes.
#[derive(Clone)]
pub struct Transporter {
    config: Arc<MonitoringConfig>,
    executor: RequestExecutor,
}

impl fmt::Debug for Transporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transporter")
            .field("config", &self.config)
            .finish()
    }
}

impl Transporter {
    pub fn new(config: MonitoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: RequestExecutor::new(&config.timeouts(&CallOptions::default()))?,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Issues a call against the read pool.
    pub async fn read(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        options: &CallOptions,
    ) -> Result<Value> {
        self.call(CallKind::Read, verb, path, payload, options).await
    }

    /// Issues a call against the write pool.
    pub async fn write(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        options: &CallOptions,
    ) -> Result<Value> {
        self.call(CallKind::Write, verb, path, payload, options).await
    }

    async fn call(
        &self,
        kind: CallKind,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
        options: &CallOptions,
    ) -> Result<Value> {
        let timeouts = self.config.timeouts(options);
        let exchange = timeouts.exchange(verb);
        let http = self.executor.client_for(timeouts.connect, exchange)?;
        let mut state = build_plan(&self.config.hosts, kind, timeouts.call)?;

        let headers = merge_headers(self.config.static_headers(), &options.headers);
        let request = Request {
            verb,
            path,
            payload,
            headers: &headers,
            query: &options.query_parameters,
        };
        let mut attempts: Vec<HostFailure> = Vec::new();

        while let Some(host) = next_host(&mut state) {
            let Some(budget) = state.remaining_time() else {
                return Err(call_timeout(attempts));
            };

            let failure = match self
                .executor
                .attempt(&http, &self.config.hosts, &host, &request, exchange, budget)
                .await
            {
                Outcome::Success(value) => return Ok(value),
                Outcome::Fatal(err) => return Err(err),
                Outcome::Failed(failure) => failure,
            };

            // another host cannot make an invalid request valid
            let failure = match failure {
                Failure::Status { status, body } if !should_retry(classify_status(status)) => {
                    return Err(MonitoringError::Client {
                        host: host.name().to_owned(),
                        status,
                        body,
                    });
                }
                failure => failure,
            };

            attempts.push(HostFailure {
                host: host.name().to_owned(),
                error: failure.into_attempt_error(),
            });

            if state.remaining_hosts().next().is_none() {
                break;
            }
            if !pause_before_retry(&state, timeouts.wait_before_retry).await {
                return Err(call_timeout(attempts));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = state.attempt_count(),
                "retrying {} on next host",
                path
            );
        }

        #[cfg(feature = "tracing")]
        tracing::warn!("every host failed for {}", path);

        Err(MonitoringError::ExhaustedHosts { attempts })
    }
}

fn call_timeout(attempts: Vec<HostFailure>) -> MonitoringError {
    #[cfg(feature = "tracing")]
    tracing::warn!("call deadline elapsed after {} attempt(s)", attempts.len());

    MonitoringError::CallTimeout { attempts }
}

/// Per-call headers replace static headers of the same name.
fn merge_headers(
    mut headers: Vec<(String, String)>,
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    headers.retain(|(name, _)| {
        !overrides
            .iter()
            .any(|(other, _)| other.eq_ignore_ascii_case(name))
    });
    headers.extend(overrides.iter().cloned());
    headers
}
