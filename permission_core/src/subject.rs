//! Authenticating principals.
//!
//! The authentication system is external. The core only reads the flags a
//! [`Subject`] exposes; [`User`] is the in-memory implementation used by
//! tests and by applications that keep their users in memory.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;
use uuid::Uuid;

use crate::error::LookupError;
use crate::model::{Attribute, Model, ModelType, ObjectKey};

/// An authenticating principal.
pub trait Subject: fmt::Debug + Send + Sync {
    /// The identity of the principal, comparable with related objects.
    fn key(&self) -> &ObjectKey;

    /// Whether the principal is authenticated (not anonymous).
    fn is_authenticated(&self) -> bool;

    /// Whether the account is active.
    fn is_active(&self) -> bool;

    /// Whether the principal is staff.
    fn is_staff(&self) -> bool;

    /// Whether the principal is a superuser.
    fn is_superuser(&self) -> bool;

    /// Whether the principal belongs to the named group.
    fn in_group(&self, group: &str) -> bool;

    /// Whether the principal holds a permission globally, independent of
    /// any object.
    fn has_global_perm(&self, permission: &str) -> bool;
}

/// An in-memory user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    key: ObjectKey,
    username: String,
    authenticated: bool,
    active: bool,
    staff: bool,
    superuser: bool,
    groups: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

impl User {
    /// The model type of users.
    pub fn model() -> ModelType {
        ModelType::new("auth", "user")
    }

    /// Create a new active, authenticated user with a random primary key.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_pk(Uuid::new_v4().to_string(), username)
    }

    /// Create a new active, authenticated user with the given primary key.
    pub fn with_pk(pk: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            key: ObjectKey::new(Self::model(), pk),
            username: username.into(),
            authenticated: true,
            active: true,
            staff: false,
            superuser: false,
            groups: BTreeSet::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// Create the anonymous user.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            ..Self::with_pk("anonymous", "")
        }
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Mark the user as a superuser.
    pub fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    /// Mark the user as staff.
    pub fn with_staff(mut self, staff: bool) -> Self {
        self.staff = staff;
        self
    }

    /// Mark the user as active or inactive.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Add the user to a group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Grant the user a global permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }
}

impl Subject for User {
    fn key(&self) -> &ObjectKey {
        &self.key
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_staff(&self) -> bool {
        self.staff
    }

    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    fn has_global_perm(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

impl Model for User {
    fn key(&self) -> &ObjectKey {
        &self.key
    }

    fn get(&self, attribute: &str) -> Result<Attribute, LookupError> {
        let value = match attribute {
            "pk" | "id" => Value::from(self.key.pk()),
            "username" => Value::from(self.username.as_str()),
            "is_active" => Value::from(self.active),
            "is_staff" => Value::from(self.staff),
            "is_superuser" => Value::from(self.superuser),
            _ => {
                return Err(LookupError::AttributeResolution {
                    target: self.key.model().to_string(),
                    attribute: attribute.to_string(),
                })
            }
        };
        Ok(Attribute::Value(value))
    }
}
