//! Effect - A single side effect a Plan will perform

use crate::resource::{Resource, ResourceId, State};

/// An operation against the remote API, described as a value
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read the current state of a resource
    Read(ResourceId),
    /// Create a new resource
    Create(Resource),
    /// Update a resource in place
    Update {
        id: ResourceId,
        from: Box<State>,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete the remote object and create it again (a force-new attribute changed)
    Replace {
        id: ResourceId,
        from: Box<State>,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete a resource
    Delete { id: ResourceId, identifier: String },
}

impl Effect {
    /// Whether this effect changes the remote API
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) => id,
            Effect::Create(resource) => &resource.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } | Effect::Delete { id, .. } => {
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_not_mutating() {
        let id = ResourceId::new("gridscale_mariadb", "db");
        assert!(!Effect::Read(id.clone()).is_mutating());
        assert!(
            Effect::Delete {
                id: id.clone(),
                identifier: "uuid".to_string()
            }
            .is_mutating()
        );
        assert_eq!(Effect::Read(id.clone()).resource_id(), &id);
    }
}
