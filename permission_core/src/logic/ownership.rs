//! Relation ownership, shared by the author and collaborators logics.

use tracing::trace;

use super::{ActionFlags, PermissionCheck};
use crate::config::validate_field_name;
use crate::lookup::field_lookup;
use crate::permission::ADD;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ownership {
    pub(crate) field_name: String,
    pub(crate) flags: ActionFlags,
}

impl Ownership {
    pub(crate) fn evaluate(&self, logic: &str, check: &PermissionCheck<'_>) -> Result<bool> {
        let subject = check.subject;
        if !subject.is_authenticated() {
            return Ok(false);
        }

        let model = check.require_model(logic)?;
        validate_field_name(logic, &self.field_name)?;

        let action = check.permission.action();
        let Some(object) = check.object else {
            // Ownership cannot be checked before the object exists.
            return Ok(action == ADD || self.flags.grants(action));
        };

        if !subject.is_active() {
            return Ok(false);
        }

        let related = field_lookup(object, &self.field_name)?;
        if !related.contains_object(subject.key())? {
            trace!(
                "{}: {} is not related to {} through {:?} on {}",
                logic,
                subject.key(),
                object.key(),
                self.field_name,
                model
            );
            return Ok(false);
        }

        Ok(self.flags.grants(action))
    }
}
