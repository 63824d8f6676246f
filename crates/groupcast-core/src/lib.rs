//! Groupcast Core
//!
//! This crate provides the group fan-out engine: the registry boundary,
//! the fan-out aggregator, the health prober and the group dispatcher
//! that ties them together.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fanout;
pub mod health;
pub mod registry;

pub use config::{DEFAULT_HEALTH_PATH, DispatchConfig, GROUP_HEADER, validate_endpoint_url};
pub use dispatcher::{GroupDispatcher, forwarded_headers};
pub use error::CoreError;
pub use fanout::{EndpointOutcome, FanoutResult, fanout, fanout_detailed};
pub use health::{HealthMap, HealthStatus, probe_health};
pub use registry::{EndpointList, GroupRegistry, InMemoryRegistry, validate_groups};
