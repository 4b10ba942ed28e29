//! The object-store seam.
//!
//! The core never owns application objects. It reads them through the
//! [`Model`] trait, one attribute at a time, and iterates to-many relations
//! through [`Relation`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LookupError;

/// A model type, identified by its application label and model name.
///
/// Both parts are stored lower-cased, matching the way permission strings
/// spell them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelType {
    app_label: String,
    model_name: String,
}

impl ModelType {
    /// Create a new model type.
    pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into().to_lowercase(),
            model_name: model_name.into().to_lowercase(),
        }
    }

    /// The application label, e.g. `blog`.
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// The model name, e.g. `article`.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

/// Identity of a stored object: its model type plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    model: ModelType,
    pk: String,
}

impl ObjectKey {
    /// Create a new object key.
    pub fn new(model: ModelType, pk: impl Into<String>) -> Self {
        Self { model, pk: pk.into() }
    }

    /// The model type of the object.
    pub fn model(&self) -> &ModelType {
        &self.model
    }

    /// The primary key of the object.
    pub fn pk(&self) -> &str {
        &self.pk
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.model, self.pk)
    }
}

/// Shared handle to a stored object.
pub type ObjectRef = Arc<dyn Model>;

/// Shared handle to a to-many relation.
pub type RelationRef = Arc<dyn Relation>;

/// The result of reading one attribute of a [`Model`].
#[derive(Debug, Clone)]
pub enum Attribute {
    /// The attribute exists but holds nothing (a null foreign key).
    Null,

    /// A plain value.
    Value(Value),

    /// A single related object.
    Object(ObjectRef),

    /// A to-many relation, not yet materialized.
    Related(RelationRef),
}

/// An application object, as seen by the object store.
pub trait Model: fmt::Debug + Send + Sync {
    /// The identity of this object.
    fn key(&self) -> &ObjectKey;

    /// Read an attribute or relation by name.
    ///
    /// Unknown names must fail with [`LookupError::AttributeResolution`].
    fn get(&self, attribute: &str) -> Result<Attribute, LookupError>;

    /// The model type of this object.
    fn model_type(&self) -> &ModelType {
        self.key().model()
    }
}

/// A to-many relation manager.
pub trait Relation: fmt::Debug + Send + Sync {
    /// Materialize the related objects, in the relation's iteration order.
    fn objects(&self) -> Result<Vec<ObjectRef>, LookupError>;

    /// Whether an object with the given key is a member of the relation.
    fn contains(&self, key: &ObjectKey) -> Result<bool, LookupError> {
        Ok(self.objects()?.iter().any(|object| object.key() == key))
    }
}

/// Fetches objects by key, the way a view fetches the object it guards.
pub trait ObjectSource: Send + Sync {
    /// Get an object, or `None` when no such object exists.
    fn get_object(&self, key: &ObjectKey) -> Result<Option<ObjectRef>, LookupError>;
}
