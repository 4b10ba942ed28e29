//! Collaborators permission logic.

use std::collections::BTreeSet;

use super::ownership::Ownership;
use super::{ActionFlags, PermissionCheck, PermissionLogic};
use crate::config::PermissionSettings;
use crate::Result;

/// Grants permissions to the members of a to-many relation, by default
/// `collaborators`.
///
/// Same rules as [`AuthorPermissionLogic`](super::AuthorPermissionLogic),
/// with more conservative defaults: collaborators may change an object but
/// not delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorsPermissionLogic {
    ownership: Ownership,
}

impl CollaboratorsPermissionLogic {
    /// Create a new collaborators logic with the default settings.
    pub fn new() -> Self {
        Self::from_settings(&PermissionSettings::default())
    }

    /// Create a new collaborators logic from application settings.
    pub fn from_settings(settings: &PermissionSettings) -> Self {
        let section = &settings.collaborators;
        Self {
            ownership: Ownership {
                field_name: section.field_name.clone(),
                flags: ActionFlags {
                    any: section.any_permission,
                    add: false,
                    change: section.change_permission,
                    delete: section.delete_permission,
                    extra: BTreeSet::new(),
                },
            },
        }
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.ownership.field_name = field_name.into();
        self
    }

    pub fn with_any_permission(mut self, any_permission: bool) -> Self {
        self.ownership.flags.any = any_permission;
        self
    }

    pub fn with_change_permission(mut self, change_permission: bool) -> Self {
        self.ownership.flags.change = change_permission;
        self
    }

    pub fn with_delete_permission(mut self, delete_permission: bool) -> Self {
        self.ownership.flags.delete = delete_permission;
        self
    }

    pub fn with_extra_action(mut self, action: impl Into<String>) -> Self {
        self.ownership.flags.extra.insert(action.into());
        self
    }

    pub fn field_name(&self) -> &str {
        &self.ownership.field_name
    }
}

impl Default for CollaboratorsPermissionLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionLogic for CollaboratorsPermissionLogic {
    fn name(&self) -> &str {
        "collaborators"
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        self.ownership.evaluate(self.name(), check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Record, RecordSet};
    use crate::model::ModelType;
    use crate::permission::Permission;
    use crate::subject::User;
    use std::sync::Arc;

    #[test]
    fn test_collaborators() {
        let model = ModelType::new("docs", "page");
        let alice = User::new("alice");
        let bob = User::new("bob");
        let collaborators = RecordSet::new();
        collaborators.add(Arc::new(alice.clone()));
        let page = Record::new(model.clone()).with_related("collaborators", collaborators);

        let logic = CollaboratorsPermissionLogic::new();
        let decide = |user: &User, permission: &str| {
            let permission = Permission::parse(permission).unwrap();
            let check = PermissionCheck::new(user, &permission, Some(&page)).bound_to(Some(&model));
            logic.has_perm(&check).unwrap()
        };

        assert!(decide(&alice, "docs.change_page"));
        assert!(!decide(&alice, "docs.delete_page"));
        assert!(!decide(&bob, "docs.change_page"));
    }

    #[test]
    fn test_collaborators_through_nested_relation() {
        let model = ModelType::new("docs", "page");
        let alice = User::new("alice");
        let team = RecordSet::new();
        team.add(Arc::new(alice.clone()));
        let group = Record::new(ModelType::new("docs", "team")).with_related("members", team);
        let teams = RecordSet::new();
        teams.add(Arc::new(group));
        let page = Record::new(model.clone()).with_related("teams", teams);

        let logic = CollaboratorsPermissionLogic::new().with_field_name("teams__members");
        let permission = Permission::parse("docs.change_page").unwrap();
        let check = PermissionCheck::new(&alice, &permission, Some(&page)).bound_to(Some(&model));
        assert!(logic.has_perm(&check).unwrap());
    }
}
