//! Delegation to globally held permissions.

use super::{PermissionCheck, PermissionLogic, PermissionScope};
use crate::Result;

/// Grants a permission when the subject already holds it globally, e.g.
/// through its groups.
///
/// Registering this logic lets object-level logics compose with static
/// grants instead of replacing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalPermissionLogic;

impl GlobalPermissionLogic {
    /// Create a new global permission logic.
    pub fn new() -> Self {
        Self
    }
}

impl PermissionLogic for GlobalPermissionLogic {
    fn name(&self) -> &str {
        "global"
    }

    fn scope(&self) -> PermissionScope {
        PermissionScope::All
    }

    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool> {
        let subject = check.subject;
        Ok(subject.is_authenticated()
            && subject.is_active()
            && subject.has_global_perm(&check.permission.to_string()))
    }
}
