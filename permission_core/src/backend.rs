//! Permission backend.
//!
//! The entry point an authorization dispatcher calls. It short-circuits
//! superusers and inactive accounts, resolves the handler for the checked
//! object's type (or, for type-level checks, the permission's target type)
//! and delegates to it.

use std::sync::Arc;

use tracing::debug;

use crate::config::PermissionSettings;
use crate::error::Error;
use crate::handler::PermissionHandler;
use crate::model::{Model, ModelType};
use crate::permission::{Permission, DEFAULT_ACTIONS};
use crate::registry::{self, HandlerRegistry};
use crate::subject::Subject;
use crate::Result;

/// Resolves permission checks against a handler registry.
#[derive(Debug, Clone)]
pub struct PermissionBackend {
    /// The registry handlers are resolved from.
    registry: Arc<HandlerRegistry>,

    /// Whether unknown or malformed permissions are configuration errors.
    check_permission_presence: bool,
}

impl PermissionBackend {
    /// Create a new backend over a registry.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            check_permission_presence: false,
        }
    }

    /// Create a new backend over a registry, configured from settings.
    pub fn with_settings(registry: Arc<HandlerRegistry>, settings: &PermissionSettings) -> Self {
        Self {
            registry,
            check_permission_presence: settings.check_permission_presence,
        }
    }

    /// Create a new backend over the process-wide registry.
    pub fn global() -> Self {
        Self::new(registry::global())
    }

    /// Turn presence checking on or off.
    pub fn with_permission_presence_check(mut self, enabled: bool) -> Self {
        self.check_permission_presence = enabled;
        self
    }

    /// The registry handlers are resolved from.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Check whether a subject has a permission, optionally on an object.
    ///
    /// * Superusers are granted everything.
    /// * Inactive subjects are denied everything else.
    /// * With no permission but an object, the subject is granted when it
    ///   has *any* of the permissions the object's handler supports.
    /// * With neither, the check is denied.
    pub fn has_perm(
        &self,
        subject: &dyn Subject,
        permission: Option<&str>,
        object: Option<&dyn Model>,
    ) -> Result<bool> {
        if subject.is_superuser() {
            debug!("Granted {:?} to superuser {}", permission, subject.key());
            return Ok(true);
        }
        if !subject.is_active() {
            debug!("Denied {:?} to inactive {}", permission, subject.key());
            return Ok(false);
        }

        let allowed = match (permission, object) {
            (None, None) => false,
            (None, Some(object)) => self.has_any_perm(subject, object)?,
            (Some(permission), object) => match self.parse(permission)? {
                Some(permission) => {
                    let target = match object {
                        Some(object) => object.model_type().clone(),
                        None => permission.target(),
                    };
                    let handler = self.registry.get_handler(&target);
                    handler.has_perm(subject, &permission, object)?
                }
                None => false,
            },
        };

        debug!(
            "{} {:?} on {:?} for {}",
            if allowed { "Granted" } else { "Denied" },
            permission,
            object.map(|object| object.key().to_string()),
            subject.key()
        );
        Ok(allowed)
    }

    /// Check whether a subject has any permission in an application.
    pub fn has_module_perms(&self, subject: &dyn Subject, app_label: &str) -> Result<bool> {
        if subject.is_superuser() {
            return Ok(true);
        }
        if !subject.is_active() {
            return Ok(false);
        }

        for model in self.registry.registered_types() {
            if model.app_label() != app_label {
                continue;
            }
            let handler = self.registry.get_handler(&model);
            for permission in self.supported_permissions(&handler, &model) {
                if handler.has_perm(subject, &permission, None)? {
                    debug!("Granted module {} to {} through {}", app_label, subject.key(), permission);
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn has_any_perm(&self, subject: &dyn Subject, object: &dyn Model) -> Result<bool> {
        let target = object.model_type();
        let mut handler = self.registry.get_handler(target);
        if handler.is_empty() {
            // Nothing to enumerate; fall back to the default handler.
            handler = self.registry.default_handler();
        }

        for permission in self.supported_permissions(&handler, target) {
            if handler.has_perm(subject, &permission, Some(object))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn supported_permissions(
        &self,
        handler: &PermissionHandler,
        target: &ModelType,
    ) -> Vec<Permission> {
        let mut permissions = handler.supported_permissions(target);
        permissions.extend(self.registry.declared_permissions(target));
        permissions.into_iter().collect()
    }

    /// Parse a permission string. `Ok(None)` means "deny": the string is
    /// malformed and presence checking is off.
    fn parse(&self, permission: &str) -> Result<Option<Permission>> {
        let parsed = match Permission::parse(permission) {
            Ok(parsed) => parsed,
            Err(error) if self.check_permission_presence => {
                return Err(Error::Configuration(format!("{}", error)));
            }
            Err(error) => {
                debug!("Denied malformed permission: {}", error);
                return Ok(None);
            }
        };

        if self.check_permission_presence && !self.is_present(&parsed) {
            return Err(Error::Configuration(format!(
                "Permission {} does not exist",
                parsed
            )));
        }

        Ok(Some(parsed))
    }

    fn is_present(&self, permission: &Permission) -> bool {
        let target = permission.target();
        if !self.registry.knows(&target) {
            return false;
        }
        DEFAULT_ACTIONS.contains(&permission.action())
            || self.registry.declared_permissions(&target).contains(permission)
    }
}

impl Default for PermissionBackend {
    fn default() -> Self {
        Self::global()
    }
}
