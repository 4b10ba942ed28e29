//! Permission handlers.
//!
//! A handler owns the ordered logics registered for one model type and
//! combines their answers: the first logic that grants wins.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::logic::{PermissionCheck, PermissionLogic, PermissionScope};
use crate::model::{Model, ModelType};
use crate::permission::Permission;
use crate::subject::Subject;
use crate::Result;

/// The ordered permission logics of one model type.
#[derive(Debug, Clone, Default)]
pub struct PermissionHandler {
    /// The model type this handler is registered for, `None` for the
    /// default handler.
    model: Option<ModelType>,

    /// Logics in registration order.
    logics: Vec<Arc<dyn PermissionLogic>>,
}

impl PermissionHandler {
    /// Create a new, empty handler not bound to any model type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new, empty handler for a model type.
    pub fn for_model(model: ModelType) -> Self {
        Self {
            model: Some(model),
            logics: Vec::new(),
        }
    }

    /// Add a logic. Logics are evaluated in the order they were added;
    /// duplicates are kept.
    pub fn add(&mut self, logic: Arc<dyn PermissionLogic>) {
        self.logics.push(logic);
    }

    /// Add a logic, builder style.
    pub fn with_logic(mut self, logic: impl PermissionLogic + 'static) -> Self {
        self.add(Arc::new(logic));
        self
    }

    /// Append all logics of another handler.
    pub fn merge(&mut self, other: &PermissionHandler) {
        self.logics.extend(other.logics.iter().cloned());
    }

    /// The model type this handler is registered for.
    pub fn model(&self) -> Option<&ModelType> {
        self.model.as_ref()
    }

    pub(crate) fn bind(&mut self, model: ModelType) {
        self.model = Some(model);
    }

    /// The logics, in evaluation order.
    pub fn logics(&self) -> &[Arc<dyn PermissionLogic>] {
        &self.logics
    }

    /// Number of logics.
    pub fn len(&self) -> usize {
        self.logics.len()
    }

    /// Whether the handler has no logics.
    pub fn is_empty(&self) -> bool {
        self.logics.is_empty()
    }

    /// The permissions this handler can be asked about for a target type:
    /// the default permissions of the type plus every permission named by
    /// an explicit logic scope.
    pub fn supported_permissions(&self, target: &ModelType) -> BTreeSet<Permission> {
        let mut permissions: BTreeSet<Permission> = Permission::defaults_for(target).into_iter().collect();
        for logic in &self.logics {
            if let PermissionScope::Only(only) = logic.scope() {
                permissions.extend(only);
            }
        }
        permissions
    }

    /// Check a permission, optionally on an object.
    ///
    /// Returns `true` as soon as one applicable logic grants, `false` when
    /// every applicable logic denies or none applies. Errors raised by a
    /// logic stop the evaluation.
    pub fn has_perm(
        &self,
        subject: &dyn Subject,
        permission: &Permission,
        object: Option<&dyn Model>,
    ) -> Result<bool> {
        let check = PermissionCheck::new(subject, permission, object).bound_to(self.model.as_ref());

        for logic in &self.logics {
            if !logic.scope().covers(&check) {
                trace!("Logic {} does not cover {}", logic.name(), permission);
                continue;
            }

            if logic.has_perm(&check)? {
                trace!("Logic {} granted {} to {}", logic.name(), permission, subject.key());
                return Ok(true);
            }
        }

        Ok(false)
    }
}
