//! Group registry boundary
//!
//! The registry maps a group name to its ordered endpoint list. Lookups
//! hand out `Arc` snapshots, so a reload that replaces the groups never
//! touches a list an in-flight dispatch is still iterating.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::validate_endpoint_url;
use crate::error::CoreError;

/// Ordered endpoint base addresses of one group
pub type EndpointList = Arc<[String]>;

/// Trait for resolving group names to endpoint lists
/// This allows the groups to be owned externally (e.g., by the config loader)
/// while the dispatcher only reads them
pub trait GroupRegistry: Send + Sync {
    /// Look up the endpoints of a group
    fn lookup(&self, group: &str) -> Option<EndpointList>;

    /// Names of all configured groups, sorted
    fn group_names(&self) -> Vec<String>;
}

/// Registry held in memory and replaced wholesale on reload
#[derive(Default)]
pub struct InMemoryRegistry {
    groups: RwLock<HashMap<String, EndpointList>>,
}

impl InMemoryRegistry {
    pub fn new(groups: HashMap<String, Vec<String>>) -> Self {
        Self {
            groups: RwLock::new(Self::freeze(groups)),
        }
    }

    fn freeze(groups: HashMap<String, Vec<String>>) -> HashMap<String, EndpointList> {
        groups
            .into_iter()
            .map(|(name, endpoints)| (name, EndpointList::from(endpoints)))
            .collect()
    }

    /// Replace every group at once
    pub fn replace(&self, groups: HashMap<String, Vec<String>>) {
        let frozen = Self::freeze(groups);
        let count = frozen.len();
        *self.groups.write() = frozen;
        info!("Group registry replaced ({} groups)", count);
    }

    /// Number of configured groups
    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl GroupRegistry for InMemoryRegistry {
    fn lookup(&self, group: &str) -> Option<EndpointList> {
        self.groups.read().get(group).cloned()
    }

    fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Validate every endpoint address of every group
pub fn validate_groups(groups: &HashMap<String, Vec<String>>) -> Result<(), CoreError> {
    for (group, endpoints) in groups {
        for endpoint in endpoints {
            validate_endpoint_url(endpoint).map_err(|reason| CoreError::InvalidEndpoint {
                group: group.clone(),
                endpoint: endpoint.clone(),
                reason,
            })?;
        }
    }
    Ok(())
}
