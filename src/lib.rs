//! `validandgo-monitoring` is an async client for the Valid&GO model
//! monitoring service.
//!
//! Every call goes through a [`Transporter`] that spreads it over a pool of
//! candidate hosts:
//! - [`Transporter::read`] and [`Transporter::write`] pick the read or write
//!   pool of the shared [`HostsCollection`]
//! - live hosts are tried before hosts marked down, by ascending priority
//! - client rejections stop immediately, other failures fail over to the next
//!   host until the pool or the call deadline runs out
//!
//! [`MonitoringClient`], [`Application`] and [`Session`] are thin wrappers
//! issuing their requests through the transporter.

mod application;
mod client;
mod config;
mod error;
mod executor;
mod host;
mod options;
pub mod retry;
mod session;
mod transporter;
mod wire;

pub use application::Application;
pub use client::MonitoringClient;
pub use config::{default_hosts, MonitoringConfig, API_KEY_HEADER, APPLICATION_ID_HEADER};
pub use error::{AttemptError, HostFailure, MonitoringError};
pub use executor::Verb;
pub use host::{CallKind, Host, HostStatus, HostsCollection, RegisteredHost};
pub use options::CallOptions;
pub use session::Session;
pub use transporter::Transporter;
pub use wire::{ApiKeyParams, ApplicationSpec, Feature, ModelSpec};

pub type Result<T> = std::result::Result<T, MonitoringError>;
