//! Permission settings.
//!
//! Defaults for the built-in logics, loadable from TOML:
//!
//! ```toml
//! check_permission_presence = true
//! registration_policy = "merge"
//!
//! [author]
//! field_name = "owner"
//! any_permission = false
//! ```
//!
//! Sections that are absent, and keys missing from a section, keep their
//! defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::lookup::LOOKUP_SEP;
use crate::registry::RegistrationPolicy;

/// Defaults for [`AuthorPermissionLogic`](crate::AuthorPermissionLogic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorSettings {
    pub field_name: String,
    pub any_permission: bool,
    pub change_permission: bool,
    pub delete_permission: bool,
}

impl Default for AuthorSettings {
    fn default() -> Self {
        Self {
            field_name: "author".to_string(),
            any_permission: true,
            change_permission: true,
            delete_permission: true,
        }
    }
}

/// Defaults for [`CollaboratorsPermissionLogic`](crate::CollaboratorsPermissionLogic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorsSettings {
    pub field_name: String,
    pub any_permission: bool,
    pub change_permission: bool,
    pub delete_permission: bool,
}

impl Default for CollaboratorsSettings {
    fn default() -> Self {
        Self {
            field_name: "collaborators".to_string(),
            any_permission: false,
            change_permission: true,
            delete_permission: false,
        }
    }
}

/// Defaults for the role logics: [`GroupInPermissionLogic`](crate::GroupInPermissionLogic)
/// and [`StaffPermissionLogic`](crate::StaffPermissionLogic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    pub any_permission: bool,
    pub add_permission: bool,
    pub change_permission: bool,
    pub delete_permission: bool,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            any_permission: false,
            add_permission: true,
            change_permission: true,
            delete_permission: true,
        }
    }
}

/// Defaults for [`OneselfPermissionLogic`](crate::OneselfPermissionLogic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneselfSettings {
    pub any_permission: bool,
    pub change_permission: bool,
    pub delete_permission: bool,
}

impl Default for OneselfSettings {
    fn default() -> Self {
        Self {
            any_permission: false,
            change_permission: true,
            delete_permission: true,
        }
    }
}

/// Application-level permission settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSettings {
    /// Treat malformed or unknown permission strings as configuration
    /// errors instead of plain denials.
    pub check_permission_presence: bool,

    /// What registering a second handler for a type does.
    pub registration_policy: RegistrationPolicy,

    pub author: AuthorSettings,
    pub collaborators: CollaboratorsSettings,
    pub group_in: RoleSettings,
    pub staff: RoleSettings,
    pub oneself: OneselfSettings,
}

impl PermissionSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check that the settings can be used to build logics.
    pub fn validate(&self) -> Result<(), Error> {
        validate_field_name("author.field_name", &self.author.field_name)?;
        validate_field_name("collaborators.field_name", &self.collaborators.field_name)?;
        Ok(())
    }
}

/// Check that a lookup path used as a field name is well formed.
pub(crate) fn validate_field_name(setting: &str, field_name: &str) -> Result<(), Error> {
    if field_name.is_empty() || field_name.split(LOOKUP_SEP).any(str::is_empty) {
        return Err(Error::Configuration(format!(
            "{} must be a non-empty lookup path, got {:?}",
            setting, field_name
        )));
    }
    Ok(())
}
