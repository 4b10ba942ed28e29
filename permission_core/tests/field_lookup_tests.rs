//! Integration tests for field lookups over in-memory records.

use std::sync::Arc;

use permission_core::*;
use serde_json::json;

fn article() -> ModelType {
    ModelType::new("app", "article")
}

fn bridge() -> ModelType {
    ModelType::new("app", "bridge")
}

fn user(pk: &str) -> ObjectRef {
    Arc::new(User::with_pk(pk, pk))
}

fn editors(pks: &[&str]) -> RecordSet {
    let set = RecordSet::new();
    for pk in pks {
        set.add(user(pk));
    }
    set
}

#[test]
fn test_single_relation() {
    let record = Record::new(article()).with_object("author", user("tony"));

    match field_lookup(&record, "author").unwrap() {
        Lookup::Single(object) => assert_eq!(object.key().pk(), "tony"),
        other => panic!("Expected a single object, got {:?}", other),
    }

    let username = field_lookup(&record, "author__username").unwrap();
    assert_eq!(username.scalars(), vec![json!("tony")]);
}

#[test]
fn test_many_relation_values_keep_order() {
    let record = Record::new(article()).with_related("editors", editors(&["e1", "e2"]));

    let usernames = field_lookup(&record, "editors__username").unwrap();
    assert!(matches!(usernames, Lookup::Sequence(ref items) if items.len() == 2));
    assert_eq!(usernames.scalars(), vec![json!("e1"), json!("e2")]);
}

#[test]
fn test_terminal_many_relation() {
    let record = Record::new(article()).with_related("editors", editors(&["e1"]));
    let lookup = field_lookup(&record, "editors").unwrap();

    assert!(matches!(lookup, Lookup::Many(_)));
    assert!(lookup.contains_object(&ObjectKey::new(User::model(), "e1")).unwrap());
    assert!(!lookup.contains_object(&ObjectKey::new(User::model(), "e2")).unwrap());
}

#[test]
fn test_nested_many_relations() {
    let first = Record::new(bridge())
        .with_object("author", user("a1"))
        .with_related("editors", editors(&["e1", "e2"]));
    let second = Record::new(bridge())
        .with_object("author", user("a2"))
        .with_related("editors", editors(&["e3"]));
    let bridges = RecordSet::new();
    bridges.add(Arc::new(first));
    bridges.add(Arc::new(second));
    let record = Record::new(article()).with_related("multiple_bridge", bridges);

    let lookup = field_lookup(&record, "multiple_bridge__editors").unwrap();
    match &lookup {
        Lookup::Sequence(items) => {
            assert_eq!(items.len(), 2);
            assert!(items.iter().all(|item| matches!(item, Lookup::Many(_))));
        }
        other => panic!("Expected a sequence, got {:?}", other),
    }
    assert!(lookup.contains_object(&ObjectKey::new(User::model(), "e3")).unwrap());

    // One inner sequence per bridge, each in that bridge's own order.
    let usernames = field_lookup(&record, "multiple_bridge__editors__username").unwrap();
    let Lookup::Sequence(per_bridge) = &usernames else {
        panic!("Expected a sequence, got {:?}", usernames);
    };
    let nested: Vec<Vec<serde_json::Value>> = per_bridge
        .iter()
        .map(|item| {
            assert!(matches!(item, Lookup::Sequence(_)));
            item.scalars()
        })
        .collect();
    assert_eq!(nested, vec![vec![json!("e1"), json!("e2")], vec![json!("e3")]]);

    let authors = field_lookup(&record, "multiple_bridge__author").unwrap();
    match &authors {
        Lookup::Sequence(items) => {
            let pks: Vec<&str> = items
                .iter()
                .map(|item| match item {
                    Lookup::Single(object) => object.key().pk(),
                    other => panic!("Expected a single object, got {:?}", other),
                })
                .collect();
            assert_eq!(pks, vec!["a1", "a2"]);
        }
        other => panic!("Expected a sequence, got {:?}", other),
    }
}

#[test]
fn test_null_and_missing_attributes() {
    let record = Record::new(article()).with_null("author");

    assert!(field_lookup(&record, "author__username").unwrap().is_null());

    let error = field_lookup(&record, "publisher__username").unwrap_err();
    assert!(matches!(error, LookupError::AttributeResolution { .. }));
}
