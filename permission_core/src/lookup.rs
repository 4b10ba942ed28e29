//! Field lookup traversal.
//!
//! Resolves a `__`-delimited path such as `multiple_bridge__editors__username`
//! against an object. Each segment is an attribute access; a to-many
//! relation in the middle of the path fans out, resolving the rest of the
//! path once per related object.

use serde_json::Value;

use crate::error::LookupError;
use crate::model::{Attribute, Model, ObjectKey, ObjectRef, RelationRef};

/// Separator between path segments.
pub const LOOKUP_SEP: &str = "__";

/// What a lookup path resolved to.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// A null attribute was reached.
    Null,

    /// A plain value.
    Scalar(Value),

    /// A single related object.
    Single(ObjectRef),

    /// The path ended on a to-many relation. It is not materialized.
    Many(RelationRef),

    /// The path fanned out over a to-many relation. One entry per related
    /// object, in iteration order; entries may themselves be `Many` or
    /// `Sequence` when the path crosses more than one to-many relation.
    Sequence(Vec<Lookup>),
}

impl Lookup {
    /// Whether the lookup hit a null attribute.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the object with the given key appears anywhere in the result.
    ///
    /// Relations reached by the lookup are iterated, which may touch the
    /// object store.
    pub fn contains_object(&self, key: &ObjectKey) -> Result<bool, LookupError> {
        match self {
            Self::Null | Self::Scalar(_) => Ok(false),
            Self::Single(object) => Ok(object.key() == key),
            Self::Many(relation) => relation.contains(key),
            Self::Sequence(items) => {
                for item in items {
                    if item.contains_object(key)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// The plain values reached by the lookup, flattened in order.
    pub fn scalars(&self) -> Vec<Value> {
        let mut values = Vec::new();
        self.collect_scalars(&mut values);
        values
    }

    fn collect_scalars(&self, values: &mut Vec<Value>) {
        match self {
            Self::Scalar(value) => values.push(value.clone()),
            Self::Sequence(items) => items.iter().for_each(|item| item.collect_scalars(values)),
            Self::Null | Self::Single(_) | Self::Many(_) => {}
        }
    }
}

/// Resolve a `__`-delimited path against an object.
pub fn field_lookup(object: &dyn Model, path: &str) -> Result<Lookup, LookupError> {
    if path.is_empty() {
        return Err(LookupError::EmptyPath);
    }

    let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(LookupError::EmptySegment(path.to_string()));
    }

    match segments.split_first() {
        Some((head, rest)) => resolve(object, head, rest),
        None => Err(LookupError::EmptyPath),
    }
}

fn resolve(object: &dyn Model, segment: &str, rest: &[&str]) -> Result<Lookup, LookupError> {
    let attribute = object.get(segment)?;

    match (attribute, rest.split_first()) {
        (Attribute::Null, _) | (Attribute::Value(Value::Null), _) => Ok(Lookup::Null),
        (Attribute::Value(value), None) => Ok(Lookup::Scalar(value)),
        (Attribute::Value(_), Some((next, _))) => Err(LookupError::AttributeResolution {
            target: format!("{}.{}", object.model_type(), segment),
            attribute: next.to_string(),
        }),
        (Attribute::Object(related), None) => Ok(Lookup::Single(related)),
        (Attribute::Object(related), Some((next, rest))) => resolve(related.as_ref(), next, rest),
        (Attribute::Related(relation), None) => Ok(Lookup::Many(relation)),
        (Attribute::Related(relation), Some((next, rest))) => {
            let mut items = Vec::new();
            for related in relation.objects()? {
                items.push(resolve(related.as_ref(), next, rest)?);
            }
            Ok(Lookup::Sequence(items))
        }
    }
}
