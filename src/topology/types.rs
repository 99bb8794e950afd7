//! Rank to role mapping.
//!
//! Rank 0 is always the dispatcher. Ranks `1..=N` serve the registered genres
//! in registry order, so the group size is always `1 + N`.

use crate::error::{ClusterError, Result};
use crate::transform::TransformRegistry;
use crate::unit::Tag;

use std::fmt;

pub const DISPATCHER_RANK: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Dispatcher,
    Worker { tag: Tag, name: String },
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Dispatcher => f.write_str("Master"),
            Role::Worker { name, .. } => f.write_str(name),
        }
    }
}

/// Validated, immutable assignment of every rank in the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    roles: Vec<Role>,
}

impl RoleTable {
    pub fn from_registry(registry: &TransformRegistry) -> Self {
        let mut roles = Vec::with_capacity(registry.len() + 1);
        roles.push(Role::Dispatcher);
        roles.extend(registry.entries().iter().map(|entry| Role::Worker {
            tag: entry.tag.clone(),
            name: entry.role.clone(),
        }));

        Self { roles }
    }

    pub fn group_size(&self) -> usize {
        self.roles.len()
    }

    /// Rejects a launch whose process count does not match the registry.
    pub fn validate_group_size(&self, size: usize) -> Result<()> {
        if size != self.group_size() {
            return Err(ClusterError::Startup(format!(
                "group of {} processes cannot host 1 dispatcher and {} workers",
                size,
                self.group_size() - 1
            )));
        }
        Ok(())
    }

    pub fn role(&self, rank: usize) -> Result<&Role> {
        self.roles.get(rank).ok_or_else(|| {
            ClusterError::Startup(format!(
                "rank {} is outside the group (size {})",
                rank,
                self.group_size()
            ))
        })
    }

    pub fn rank_of(&self, tag: &Tag) -> Option<usize> {
        self.roles.iter().position(|role| match role {
            Role::Worker { tag: worker_tag, .. } => worker_tag == tag,
            Role::Dispatcher => false,
        })
    }

    /// Worker ranks paired with the genre they serve.
    pub fn workers(&self) -> impl Iterator<Item = (usize, &Tag)> {
        self.roles
            .iter()
            .enumerate()
            .filter_map(|(rank, role)| match role {
                Role::Worker { tag, .. } => Some((rank, tag)),
                Role::Dispatcher => None,
            })
    }
}
