use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use crate::{MonitoringError, Result};

/// Whether a logical operation reads or mutates, used to pick a host pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Read,
    Write,
    /// Host membership only: the host serves both pools.
    Both,
}

impl CallKind {
    fn accepts(self, kind: CallKind) -> bool {
        self == CallKind::Both || self == kind
    }
}

/// A candidate host as declared in configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    /// Network address, e.g. `app-dsn.validandgo.net` or `127.0.0.1:8080`.
    pub name: String,
    /// Lower values are tried first.
    pub priority: u32,
    pub call_kind: CallKind,
    /// URL scheme used to reach the host.
    pub protocol: String,
}

impl Host {
    /// Priority given to hosts declared without one: tried after every
    /// explicitly prioritized host.
    pub const DEFAULT_PRIORITY: u32 = 100;

    /// Declares a host serving both pools with the default priority.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Self::DEFAULT_PRIORITY,
            call_kind: CallKind::Both,
            protocol: "https".to_owned(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_call_kind(mut self, call_kind: CallKind) -> Self {
        self.call_kind = call_kind;
        self
    }

    /// Overrides the URL scheme (`https` by default).
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}://{}/{}",
            self.protocol,
            self.name,
            path.trim_start_matches('/')
        )
    }
}

/// Health of a registered host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostStatus {
    Up,
    Down {
        /// When the most recent retryable failure was observed.
        last_failure_time: SystemTime,
    },
}

impl HostStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

/// A host owned by a [`HostsCollection`], carrying its mutable health.
pub struct RegisteredHost {
    host: Host,
    status: Mutex<HostStatus>,
}

impl RegisteredHost {
    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn name(&self) -> &str {
        &self.host.name
    }

    pub fn status(&self) -> HostStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: HostStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

impl fmt::Debug for RegisteredHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHost")
            .field("name", &self.host.name)
            .field("priority", &self.host.priority)
            .field("call_kind", &self.host.call_kind)
            .field("status", &self.status())
            .finish()
    }
}

/// Ordered, weighted set of candidate hosts shared by every call of a client.
///
/// Status changes made through [`mark_down`](Self::mark_down) and
/// [`mark_up`](Self::mark_up) are visible to the next call that plans its
/// attempts. A host declared with [`CallKind::Both`] is a single entry seen by
/// both pools, so its health is shared between them.
#[derive(Debug)]
pub struct HostsCollection {
    hosts: Vec<Arc<RegisteredHost>>,
}

impl HostsCollection {
    /// Registers hosts, keeping declaration order for equal priorities.
    ///
    /// Fails when either the read or the write pool would be empty, or a host
    /// has an empty name.
    pub fn new(hosts: impl IntoIterator<Item = Host>) -> Result<Self> {
        let mut hosts: Vec<Host> = hosts.into_iter().collect();
        if let Some(host) = hosts.iter().find(|host| host.name.trim().is_empty()) {
            return Err(MonitoringError::Configuration(format!(
                "host name cannot be empty (priority {})",
                host.priority
            )));
        }
        // stable: ties keep declaration order
        hosts.sort_by_key(|host| host.priority);

        let collection = Self {
            hosts: hosts
                .into_iter()
                .map(|host| {
                    Arc::new(RegisteredHost {
                        host,
                        status: Mutex::new(HostStatus::Up),
                    })
                })
                .collect(),
        };

        for kind in [CallKind::Read, CallKind::Write] {
            if collection.pool_for(kind).is_empty() {
                return Err(MonitoringError::Configuration(format!(
                    "no host accepts {} calls",
                    kind_label(kind)
                )));
            }
        }
        Ok(collection)
    }

    /// Hosts eligible for `kind`, by ascending priority then declaration order.
    ///
    /// Down hosts are included; ordering them after live ones is the retry
    /// plan's job.
    pub fn pool_for(&self, kind: CallKind) -> Vec<Arc<RegisteredHost>> {
        self.hosts
            .iter()
            .filter(|entry| entry.host.call_kind.accepts(kind))
            .cloned()
            .collect()
    }

    pub fn mark_down(&self, host: &RegisteredHost, at: SystemTime) {
        host.set_status(HostStatus::Down {
            last_failure_time: at,
        });
    }

    /// Clears the down flag. Returns whether the host was down.
    pub fn mark_up(&self, host: &RegisteredHost) -> bool {
        let mut status = host.status.lock().unwrap_or_else(PoisonError::into_inner);
        let was_down = !status.is_up();
        *status = HostStatus::Up;
        was_down
    }

    /// Current status of the host registered under `name`.
    pub fn status_of(&self, name: &str) -> Option<HostStatus> {
        self.hosts
            .iter()
            .find(|entry| entry.host.name == name)
            .map(|entry| entry.status())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

pub(crate) fn kind_label(kind: CallKind) -> &'static str {
    match kind {
        CallKind::Read => "read",
        CallKind::Write => "write",
        CallKind::Both => "read/write",
    }
}
