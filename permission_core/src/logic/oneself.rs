//! Oneself permission logic.

use super::{ActionFlags, PermissionCheck, PermissionLogic};
use crate::config::PermissionSettings;
use crate::Result;

/// Grants users permissions on their own user object, e.g. to edit their
/// profile. Register it on the user model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneselfPermissionLogic {
    flags: ActionFlags,
}

impl OneselfPermissionLogic {
    /// Create a new oneself logic with the default settings.
    pub fn new() -> Self {
        Self::from_settings(&PermissionSettings::default())
    }

    /// Create a new oneself logic from application settings.
    pub fn from_settings(settings: &PermissionSettings) -> Self {
        let section = &settings.oneself;
        Self {
            flags: ActionFlags {
                any: section.any_permission,
                change: section.change_permission,
                delete: section.delete_permission,
                ..ActionFlags::default()
            },
        }
    }

    pub fn with_any_permission(mut self, any_permission: bool) -> Self {
        self.flags.any = any_permission;
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

impl Default for OneselfPermissionLogic {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionLogic for OneselfPermissionLogic {
    fn name(&self) -> &str {
        "oneself"
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        let subject = check.subject;
        if !subject.is_authenticated() {
            return Ok(false);
        }

        let action = check.permission.action();
        match check.object {
            None => Ok(self.flags.grants(action)),
            Some(object) => {
                Ok(subject.is_active() && object.key() == subject.key() && self.flags.grants(action))
            }
        }
    }
}
