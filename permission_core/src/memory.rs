//! In-memory object store.
//!
//! [`Record`] is a generic object with named fields, [`RecordSet`] a
//! to-many relation manager, and [`MemoryStore`] a keyed collection of
//! objects. Together they stand in for an object-relational layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::error::LookupError;
use crate::model::{Attribute, Model, ModelType, ObjectKey, ObjectRef, ObjectSource, Relation};

#[derive(Debug, Clone)]
enum Field {
    Value(Value),
    Object(Option<ObjectRef>),
    Related(RecordSet),
}

/// An in-memory object with named fields.
#[derive(Debug, Clone)]
pub struct Record {
    key: ObjectKey,
    fields: BTreeMap<String, Field>,
}

impl Record {
    /// Create a new record with a random primary key.
    pub fn new(model: ModelType) -> Self {
        Self::with_pk(model, Uuid::new_v4().to_string())
    }

    /// Create a new record with the given primary key.
    pub fn with_pk(model: ModelType, pk: impl Into<String>) -> Self {
        Self {
            key: ObjectKey::new(model, pk),
            fields: BTreeMap::new(),
        }
    }

    /// Set a plain value field.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::Value(value.into()));
        self
    }

    /// Set a single-valued relation.
    pub fn with_object(mut self, name: impl Into<String>, object: ObjectRef) -> Self {
        self.fields.insert(name.into(), Field::Object(Some(object)));
        self
    }

    /// Declare a single-valued relation that currently holds nothing.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Field::Object(None));
        self
    }

    /// Set a to-many relation. The set is shared, so objects added to it
    /// later are visible through the record.
    pub fn with_related(mut self, name: impl Into<String>, related: RecordSet) -> Self {
        self.fields.insert(name.into(), Field::Related(related));
        self
    }

    /// Get a to-many relation by name.
    pub fn related(&self, name: &str) -> Option<&RecordSet> {
        match self.fields.get(name) {
            Some(Field::Related(related)) => Some(related),
            _ => None,
        }
    }
}

impl Model for Record {
    fn key(&self) -> &ObjectKey {
        &self.key
    }

    fn get(&self, attribute: &str) -> Result<Attribute, LookupError> {
        if attribute == "pk" {
            return Ok(Attribute::Value(Value::from(self.key.pk())));
        }

        match self.fields.get(attribute) {
            Some(Field::Value(value)) => Ok(Attribute::Value(value.clone())),
            Some(Field::Object(Some(object))) => Ok(Attribute::Object(object.clone())),
            Some(Field::Object(None)) => Ok(Attribute::Null),
            Some(Field::Related(related)) => Ok(Attribute::Related(Arc::new(related.clone()))),
            None => Err(LookupError::AttributeResolution {
                target: self.key.model().to_string(),
                attribute: attribute.to_string(),
            }),
        }
    }
}

/// An ordered to-many relation. Clones share the same members.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    members: Arc<RwLock<Vec<ObjectRef>>>,
}

impl RecordSet {
    /// Create a new, empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. Adding an object that is already a member is a no-op.
    pub fn add(&self, object: ObjectRef) {
        let mut members = self.members.write();
        if !members.iter().any(|member| member.key() == object.key()) {
            members.push(object);
        }
    }

    /// Remove the object with the given key.
    pub fn remove(&self, key: &ObjectKey) {
        self.members.write().retain(|member| member.key() != key);
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether the relation has no members.
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

impl Relation for RecordSet {
    fn objects(&self) -> Result<Vec<ObjectRef>, LookupError> {
        Ok(self.members.read().clone())
    }

    fn contains(&self, key: &ObjectKey) -> Result<bool, LookupError> {
        Ok(self.members.read().iter().any(|member| member.key() == key))
    }
}

/// A keyed collection of objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<DashMap<ObjectKey, ObjectRef>>,
}

impl MemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, replacing any object with the same key.
    pub fn insert(&self, object: ObjectRef) {
        self.objects.insert(object.key().clone(), object);
    }

    /// Remove an object.
    pub fn remove(&self, key: &ObjectKey) -> Option<ObjectRef> {
        self.objects.remove(key).map(|(_, object)| object)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectSource for MemoryStore {
    fn get_object(&self, key: &ObjectKey) -> Result<Option<ObjectRef>, LookupError> {
        Ok(self.objects.get(key).map(|entry| entry.value().clone()))
    }
}
