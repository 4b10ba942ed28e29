//! Role logics: group membership and staff status.

use std::collections::BTreeSet;

use super::{ActionFlags, PermissionCheck, PermissionLogic};
use crate::config::{PermissionSettings, RoleSettings};
use crate::error::Error;
use crate::Result;

fn flags_from(section: &RoleSettings) -> ActionFlags {
    ActionFlags {
        any: section.any_permission,
        add: section.add_permission,
        change: section.change_permission,
        delete: section.delete_permission,
        extra: BTreeSet::new(),
    }
}

/// Grants permissions to members of any of the configured groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInPermissionLogic {
    groups: BTreeSet<String>,
    flags: ActionFlags,
}

impl GroupInPermissionLogic {
    /// Create a new group logic with the default settings.
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_settings(groups, &PermissionSettings::default())
    }

    /// Create a new group logic from application settings.
    pub fn from_settings<I, S>(groups: I, settings: &PermissionSettings) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            flags: flags_from(&settings.group_in),
        }
    }

    pub fn with_any_permission(mut self, any_permission: bool) -> Self {
        self.flags.any = any_permission;
        self
    }

    pub fn with_add_permission(mut self, add_permission: bool) -> Self {
        self.flags.add = add_permission;
        self
    }

    pub fn with_change_permission(mut self, change_permission: bool) -> Self {
        self.flags.change = change_permission;
        self
    }

    pub fn with_delete_permission(mut self, delete_permission: bool) -> Self {
        self.flags.delete = delete_permission;
        self
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }
}

impl PermissionLogic for GroupInPermissionLogic {
    fn name(&self) -> &str {
        "group_in"
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        let subject = check.subject;
        if !subject.is_authenticated() {
            return Ok(false);
        }
        if self.groups.is_empty() {
            return Err(Error::Configuration(
                "group_in logic needs at least one group name".to_string(),
            ));
        }
        if !self.groups.iter().any(|group| subject.in_group(group)) {
            return Ok(false);
        }
        Ok(self.flags.grants(check.permission.action()))
    }
}

/// Grants permissions to staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffPermissionLogic {
    flags: ActionFlags,
}

impl StaffPermissionLogic {
    /// Create a new staff logic with the default settings.
    pub fn new() -> Self {
        Self::from_settings(&PermissionSettings::default())
    }

    /// Create a new staff logic from application settings.
    pub fn from_settings(settings: &PermissionSettings) -> Self {
        Self {
            flags: flags_from(&settings.staff),
        }
    }

    pub fn with_any_permission(mut self, any_permission: bool) -> Self {
        self.flags.any = any_permission;
        self
    }

    pub fn with_add_permission(mut self, add_permission: bool) -> Self {
        self.flags.add = add_permission;
        self
    }

    pub fn with_change_permission(mut self, change_permission: bool) -> Self {
        self.flags.change = change_permission;
        self
    }

    pub fn with_delete_permission(mut self, delete_permission: bool) -> Self {
        self.flags.delete = delete_permission;
        self
    }
}

impl Default for StaffPermissionLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionLogic for StaffPermissionLogic {
    fn name(&self) -> &str {
        "staff"
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        let subject = check.subject;
        if !subject.is_authenticated() || !subject.is_staff() {
            return Ok(false);
        }
        Ok(self.flags.grants(check.permission.action()))
    }
}
