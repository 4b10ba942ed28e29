//! Author permission logic.
//!
//! Grants permissions on an object to the user its author field points to.

use std::collections::BTreeSet;

use super::ownership::Ownership;
use super::{ActionFlags, PermissionCheck, PermissionLogic};
use crate::config::{AuthorSettings, PermissionSettings};
use crate::Result;

/// Grants permissions to the author of an object.
///
/// The author is found by resolving `field_name` (a lookup path, default
/// `author`) on the object. When it resolves to a to-many relation, every
/// member counts as an author.
///
/// * Anonymous users are always denied.
/// * Without an object, `add` is granted, and so is everything else when
///   `any_permission` is set; otherwise only the actions enabled by
///   `change_permission`, `delete_permission` and the extra actions.
/// * With an object, the same action rules apply once the user is found
///   to be the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorPermissionLogic {
    ownership: Ownership,
}

impl AuthorPermissionLogic {
    /// Create a new author logic with the default settings.
    pub fn new() -> Self {
        Self::from_settings(&PermissionSettings::default())
    }

    /// Create a new author logic from application settings.
    pub fn from_settings(settings: &PermissionSettings) -> Self {
        Self::from_section(&settings.author)
    }

    fn from_section(section: &AuthorSettings) -> Self {
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

    /// Use a different lookup path for the author.
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.ownership.field_name = field_name.into();
        self
    }

    /// Grant every action to the author.
    pub fn with_any_permission(mut self, any_permission: bool) -> Self {
        self.ownership.flags.any = any_permission;
        self
    }

    /// Grant `change` to the author.
    pub fn with_change_permission(mut self, change_permission: bool) -> Self {
        self.ownership.flags.change = change_permission;
        self
    }

    /// Grant `delete` to the author.
    pub fn with_delete_permission(mut self, delete_permission: bool) -> Self {
        self.ownership.flags.delete = delete_permission;
        self
    }

    /// Grant a custom action, e.g. `publish`, to the author.
    pub fn with_extra_action(mut self, action: impl Into<String>) -> Self {
        self.ownership.flags.extra.insert(action.into());
        self
    }

    pub fn field_name(&self) -> &str {
        &self.ownership.field_name
    }

    pub fn any_permission(&self) -> bool {
        self.ownership.flags.any
    }

    pub fn change_permission(&self) -> bool {
        self.ownership.flags.change
    }

    pub fn delete_permission(&self) -> bool {
        self.ownership.flags.delete
    }
}

impl Default for AuthorPermissionLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionLogic for AuthorPermissionLogic {
    fn name(&self) -> &str {
        "author"
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        self.ownership.evaluate(self.name(), check)
    }
}
