//! Named group membership.

use serde::{Deserialize, Serialize};

use crate::ecs::component::record_component;

/// Membership in a named world group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupComponent {
    pub group: String,
}

impl GroupComponent {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
        }
    }
}

record_component!(GroupComponent, Group);
