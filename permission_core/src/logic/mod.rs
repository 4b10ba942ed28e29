//! Permission logics.
//!
//! A permission logic decides one question: may this subject exercise this
//! permission, optionally on this object? Logics are registered on a model
//! type through the [`HandlerRegistry`](crate::HandlerRegistry) and evaluated
//! in registration order by a [`PermissionHandler`](crate::PermissionHandler).

mod author;
mod collaborators;
mod global;
mod oneself;
mod ownership;
mod role;

pub use author::AuthorPermissionLogic;
pub use collaborators::CollaboratorsPermissionLogic;
pub use global::GlobalPermissionLogic;
pub use oneself::OneselfPermissionLogic;
pub use role::{GroupInPermissionLogic, StaffPermissionLogic};

use std::collections::BTreeSet;
use std::fmt;

use crate::error::Error;
use crate::model::{Model, ModelType};
use crate::permission::{Permission, ADD, CHANGE, DELETE};
use crate::subject::Subject;
use crate::Result;

/// Interface for permission logics.
///
/// Implementations must be stateless across calls: the answer depends only
/// on the [`PermissionCheck`].
pub trait PermissionLogic: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Which permissions this logic adjudicates.
    fn scope(&self) -> PermissionScope {
        PermissionScope::Model
    }

    /// Decide the check.
    fn has_perm(&self, check: &PermissionCheck<'_>) -> Result<bool>;
}

/// The set of permissions a logic claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionScope {
    /// Every permission.
    All,

    /// Permissions about the checked object's own type. Without an object,
    /// every permission routed to the handler.
    Model,

    /// An explicit set of permissions.
    Only(BTreeSet<Permission>),
}

impl PermissionScope {
    /// Build an explicit scope from permission strings.
    pub fn only<I, S>(permissions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissions = permissions
            .into_iter()
            .map(|permission| Permission::parse(permission.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self::Only(permissions))
    }

    /// Whether a check falls inside this scope.
    pub fn covers(&self, check: &PermissionCheck<'_>) -> bool {
        match self {
            Self::All => true,
            Self::Model => check.targets_object_type(),
            Self::Only(permissions) => permissions.contains(check.permission),
        }
    }
}

/// One permission question, as handed to a logic.
#[derive(Debug, Clone, Copy)]
pub struct PermissionCheck<'a> {
    /// Who is asking.
    pub subject: &'a dyn Subject,

    /// What they are asking for.
    pub permission: &'a Permission,

    /// The object the permission applies to, `None` for a type-level check.
    pub object: Option<&'a dyn Model>,

    /// The model type of the handler evaluating the check, `None` on the
    /// default handler.
    pub model: Option<&'a ModelType>,
}

impl<'a> PermissionCheck<'a> {
    /// Create a new, unbound check.
    pub fn new(
        subject: &'a dyn Subject,
        permission: &'a Permission,
        object: Option<&'a dyn Model>,
    ) -> Self {
        Self {
            subject,
            permission,
            object,
            model: None,
        }
    }

    /// Bind the check to a handler's model type.
    pub fn bound_to(mut self, model: Option<&'a ModelType>) -> Self {
        self.model = model;
        self
    }

    /// The model type the check is about: the object's type, or the
    /// permission's target type for type-level checks.
    pub fn target(&self) -> ModelType {
        match self.object {
            Some(object) => object.model_type().clone(),
            None => self.permission.target(),
        }
    }

    /// Whether the permission is about the object's own type. Always true
    /// for type-level checks.
    pub fn targets_object_type(&self) -> bool {
        match self.object {
            Some(object) => self.permission.targets(object.model_type()),
            None => true,
        }
    }

    /// The bound model type, or a configuration error naming the logic.
    pub(crate) fn require_model(&self, logic: &str) -> Result<&'a ModelType> {
        self.model.ok_or_else(|| {
            Error::Configuration(format!(
                "{} must be registered for a model type, but was evaluated on the default handler",
                logic
            ))
        })
    }
}

/// Which actions a logic grants once its membership test passes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionFlags {
    /// Grant every action.
    pub any: bool,
    pub add: bool,
    pub change: bool,
    pub delete: bool,
    /// Custom action verbs, e.g. `publish`.
    pub extra: BTreeSet<String>,
}

impl ActionFlags {
    /// Whether the flags grant an action.
    pub fn grants(&self, action: &str) -> bool {
        if self.any {
            return true;
        }
        match action {
            ADD => self.add,
            CHANGE => self.change,
            DELETE => self.delete,
            other => self.extra.contains(other),
        }
    }
}
