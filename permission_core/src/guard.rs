//! View-level permission guards.
//!
//! A [`Guard`] wraps a list of required permissions and checks them through
//! a [`PermissionBackend`] before an operation runs. Denials either surface
//! as `Ok(false)` or, when the guard raises, as
//! [`Error::PermissionDenied`].

use tracing::debug;

use crate::backend::PermissionBackend;
use crate::error::Error;
use crate::model::{Model, ObjectKey, ObjectSource};
use crate::subject::Subject;
use crate::Result;

/// A set of permissions required before an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    permissions: Vec<String>,
    raise_exception: bool,
}

impl Guard {
    /// Create a new guard requiring every listed permission.
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            raise_exception: false,
        }
    }

    /// Return [`Error::PermissionDenied`] instead of `Ok(false)` on denial.
    pub fn raise_exception(mut self, raise_exception: bool) -> Self {
        self.raise_exception = raise_exception;
        self
    }

    /// The required permissions.
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Check every required permission, optionally on an object.
    pub fn check(
        &self,
        backend: &PermissionBackend,
        subject: &dyn Subject,
        object: Option<&dyn Model>,
    ) -> Result<bool> {
        for permission in &self.permissions {
            if backend.has_perm(subject, Some(permission), object)? {
                continue;
            }

            debug!("Guard denied {} to {}", permission, subject.key());
            if self.raise_exception {
                return Err(Error::PermissionDenied {
                    permission: permission.clone(),
                });
            }
            return Ok(false);
        }
        Ok(true)
    }

    /// Fetch an object from a source and check against it.
    ///
    /// A missing object is [`Error::ObjectNotFound`] regardless of
    /// `raise_exception`.
    pub fn check_key(
        &self,
        backend: &PermissionBackend,
        subject: &dyn Subject,
        source: &dyn ObjectSource,
        key: &ObjectKey,
    ) -> Result<bool> {
        let object = source
            .get_object(key)?
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))?;
        self.check(backend, subject, Some(object.as_ref()))
    }
}

/// Require a single permission, failing with [`Error::PermissionDenied`].
pub fn permission_required(
    backend: &PermissionBackend,
    subject: &dyn Subject,
    permission: &str,
    object: Option<&dyn Model>,
) -> Result<()> {
    Guard::new([permission])
        .raise_exception(true)
        .check(backend, subject, object)
        .map(|_| ())
}
