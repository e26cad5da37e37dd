use std::{collections::VecDeque, sync::Arc, time::Duration};

use tokio::time::{sleep, Instant};

use crate::{
    host::{kind_label, CallKind, HostsCollection, RegisteredHost},
    options::LONGEST_TIMEOUT,
    MonitoringError, Result,
};

/// Classification of one attempt's failure, as far as failover is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, connect or timeout failure.
    Connectivity,
    /// Server-side fault status.
    Server,
    /// The request was rejected as invalid.
    Client,
}

/// Whether a failure of this kind should move on to the next host.
pub fn should_retry(kind: ErrorKind) -> bool {
    match kind {
        ErrorKind::Connectivity | ErrorKind::Server => true,
        ErrorKind::Client => false,
    }
}

/// Maps a non-success HTTP status to its failure class.
///
/// Every 4xx is a client rejection except `408 Request Timeout` and
/// `429 Too Many Requests`, which describe the host's condition rather than
/// the request's validity. Anything else that is not 2xx is a server fault.
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        408 | 429 => ErrorKind::Server,
        400..=499 => ErrorKind::Client,
        _ => ErrorKind::Server,
    }
}

/// Per-call attempt plan: which hosts remain and when to give up.
#[derive(Debug)]
pub struct RetryState {
    remaining_hosts: VecDeque<Arc<RegisteredHost>>,
    attempt_count: usize,
    max_attempts: usize,
    deadline: Instant,
}

impl RetryState {
    /// Hosts not yet attempted, in attempt order.
    pub fn remaining_hosts(&self) -> impl Iterator<Item = &RegisteredHost> {
        self.remaining_hosts.iter().map(Arc::as_ref)
    }

    pub fn attempt_count(&self) -> usize {
        self.attempt_count
    }

    /// Equal to the pool size: no host is attempted twice within a call.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, `None` once it has passed.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }
}

/// Snapshots the pool for `kind`: live hosts first, then down hosts, each
/// group keeping priority order.
pub fn build_plan(
    hosts: &HostsCollection,
    kind: CallKind,
    call_timeout: Duration,
) -> Result<RetryState> {
    let (up, down): (Vec<_>, Vec<_>) = hosts
        .pool_for(kind)
        .into_iter()
        .partition(|host| host.status().is_up());

    let remaining_hosts: VecDeque<_> = up.into_iter().chain(down).collect();
    if remaining_hosts.is_empty() {
        return Err(MonitoringError::Configuration(format!(
            "no host available for {} calls",
            kind_label(kind)
        )));
    }

    Ok(RetryState {
        max_attempts: remaining_hosts.len(),
        remaining_hosts,
        attempt_count: 0,
        deadline: deadline_after(call_timeout),
    })
}

/// `now + timeout`, or a point a year out when that does not fit in an
/// `Instant`.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(LONGEST_TIMEOUT))
        .unwrap_or(now)
}

/// Pops the next host to attempt, or `None` when the plan is exhausted.
pub fn next_host(state: &mut RetryState) -> Option<Arc<RegisteredHost>> {
    if state.attempt_count >= state.max_attempts {
        return None;
    }
    let host = state.remaining_hosts.pop_front()?;
    state.attempt_count += 1;
    Some(host)
}

/// Waits `wait` before the next attempt. Returns `false` when the deadline
/// would pass first, in which case no further attempt may start.
pub async fn pause_before_retry(state: &RetryState, wait: Duration) -> bool {
    let Some(left) = state.remaining_time() else {
        return false;
    };
    if wait >= left {
        return false;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("waiting {:?} before next host", wait);

    sleep(wait).await;
    true
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use tokio::time::Instant;

    use super::{
        build_plan, classify_status, next_host, pause_before_retry, should_retry, ErrorKind,
    };
    use crate::{CallKind, Host, HostsCollection};

    fn pool() -> HostsCollection {
        HostsCollection::new([
            Host::new("a").with_priority(1),
            Host::new("b").with_priority(2),
            Host::new("c").with_priority(3),
        ])
        .expect("valid hosts")
    }

    fn plan_names(hosts: &HostsCollection) -> Vec<String> {
        let state = build_plan(hosts, CallKind::Read, Duration::from_secs(5)).expect("plan");
        state.remaining_hosts().map(|h| h.name().to_owned()).collect()
    }

    #[test]
    fn status_classes() {
        assert_eq!(classify_status(400), ErrorKind::Client);
        assert_eq!(classify_status(403), ErrorKind::Client);
        assert_eq!(classify_status(404), ErrorKind::Client);
        assert_eq!(classify_status(408), ErrorKind::Server);
        assert_eq!(classify_status(429), ErrorKind::Server);
        assert_eq!(classify_status(500), ErrorKind::Server);
        assert_eq!(classify_status(503), ErrorKind::Server);
        assert_eq!(classify_status(302), ErrorKind::Server);
    }

    #[test]
    fn only_client_errors_stop_failover() {
        assert!(should_retry(ErrorKind::Connectivity));
        assert!(should_retry(ErrorKind::Server));
        assert!(!should_retry(ErrorKind::Client));
    }

    #[test]
    fn down_hosts_are_planned_after_up_hosts() {
        let hosts = pool();
        let read = hosts.pool_for(CallKind::Read);
        hosts.mark_down(&read[0], SystemTime::now());

        assert_eq!(plan_names(&hosts), ["b", "c", "a"]);
    }

    #[test]
    fn all_down_still_yields_every_host_in_priority_order() {
        let hosts = pool();
        for host in hosts.pool_for(CallKind::Read) {
            hosts.mark_down(&host, SystemTime::now());
        }

        assert_eq!(plan_names(&hosts), ["a", "b", "c"]);
    }

    #[test]
    fn recovered_host_returns_to_head_of_its_group() {
        let hosts = pool();
        let read = hosts.pool_for(CallKind::Read);
        hosts.mark_down(&read[0], SystemTime::now());
        hosts.mark_up(&read[0]);

        assert_eq!(plan_names(&hosts), ["a", "b", "c"]);
    }

    #[test]
    fn next_host_never_repeats_and_counts_attempts() {
        let hosts = pool();
        let mut state = build_plan(&hosts, CallKind::Write, Duration::from_secs(5)).expect("plan");
        assert_eq!(state.max_attempts(), 3);

        let mut seen = Vec::new();
        while let Some(host) = next_host(&mut state) {
            seen.push(host.name().to_owned());
        }
        assert_eq!(seen, ["a", "b", "c"]);
        assert_eq!(state.attempt_count(), 3);
        assert!(next_host(&mut state).is_none());
    }

    #[tokio::test]
    async fn pause_refuses_to_cross_the_deadline() {
        let hosts = pool();
        let state = build_plan(&hosts, CallKind::Read, Duration::from_secs(2)).expect("plan");

        assert!(pause_before_retry(&state, Duration::from_millis(1)).await);

        let started = Instant::now();
        assert!(!pause_before_retry(&state, Duration::from_secs(5)).await);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(state.remaining_time().is_some());
    }

    #[tokio::test]
    async fn pause_after_the_deadline_returns_at_once() {
        let hosts = pool();
        let state = build_plan(&hosts, CallKind::Read, Duration::from_millis(10)).expect("plan");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!pause_before_retry(&state, Duration::ZERO).await);
    }

    #[test]
    fn unbounded_call_timeout_does_not_overflow() {
        let hosts = pool();
        let state = build_plan(&hosts, CallKind::Read, Duration::MAX).expect("plan");

        let left = state.remaining_time().expect("deadline in the future");
        assert!(left > Duration::from_secs(24 * 60 * 60));
    }
}
