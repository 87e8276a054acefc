//! Message container behavior against the fixture kinds

mod common;

use chrono::{TimeZone, Utc};
use familiar_messages::{
    DynamicField, DynamicValue, FieldValue, MessageKind, MessageRef, SchemaError, Value,
};

use common::{priority, provider, valid_email, valid_nested, EmailMessage, MapsMessage, NestedMessage};

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_create_applies_defaults() {
    let message = EmailMessage::create().unwrap();

    assert_eq!(
        message.get_single("_schema").unwrap(),
        Some(&Value::from("acme:tests:fixtures:email-message:1-0-0.0"))
    );
    match message.get_single("id").unwrap() {
        Some(Value::Uuid(id)) => assert_eq!(id.get_version_num(), 1),
        other => panic!("Expected a time uuid, got {:?}", other),
    }
    assert_eq!(
        message.get_single("priority").unwrap(),
        Some(&Value::from(priority().by_name("NORMAL").unwrap()))
    );
    assert_eq!(
        message.get_single("provider").unwrap(),
        Some(&Value::from(provider().by_name("GMAIL").unwrap()))
    );
    assert_eq!(message.get_single("sent").unwrap(), Some(&Value::Bool(false)));
    assert!(!message.has("microtime_sent"));
    assert!(!message.has("from_email"));
    assert!(!message.has("labels"));
}

#[test]
fn test_default_can_read_the_message() {
    let mut message = valid_email();
    message.add_to_set("labels", ["donuts", "mmmm"]).unwrap();
    message.clear("subject").unwrap();

    assert!(message.has_cleared_field("subject"));
    assert_eq!(
        message.get_single("subject").unwrap(),
        Some(&Value::from("donuts,mmmm test"))
    );
}

#[test]
fn test_clear_without_default_leaves_field_absent() {
    let mut message = valid_email();
    message.set("from_name", "Homer").unwrap();
    message.clear("from_name").unwrap();
    assert!(!message.has("from_name"));
    assert!(message.has_cleared_field("from_name"));
    assert_eq!(message.cleared_fields().collect::<Vec<_>>(), vec!["from_name"]);
}

// =============================================================================
// Cardinality
// =============================================================================

#[test]
fn test_set_is_case_insensitive() {
    let mut message = valid_email();
    message.add_to_set("labels", ["DONUTS", "Donuts", "donuts"]).unwrap();

    let labels = message.get_many("labels").unwrap();
    assert_eq!(labels.len(), 1);
    let stored = labels[0].as_str().unwrap();
    assert!(["DONUTS", "Donuts", "donuts"].contains(&stored));
}

#[test]
fn test_set_rejects_invalid_format() {
    let mut message = valid_email();
    let err = message.add_to_set("labels", ["ok", "not a hashtag"]).unwrap_err();
    assert!(err.is_validation());
    assert!(!message.has("labels"));
}

#[test]
fn test_enum_set_and_list() {
    let mut message = valid_email();
    let aol = Value::from(provider().value("aol").unwrap());
    let gmail = Value::from(provider().value("gmail").unwrap());

    message.add_to_set("enum_in_set", [aol.clone(), aol.clone(), gmail.clone()]).unwrap();
    assert_eq!(message.get_many("enum_in_set").unwrap().len(), 2);

    message.add_to_list("enum_in_list", [aol.clone(), aol.clone(), gmail]).unwrap();
    assert_eq!(message.get_many("enum_in_list").unwrap().len(), 3);

    message.remove_from_list("enum_in_list", [aol]).unwrap();
    assert_eq!(message.get_many("enum_in_list").unwrap().len(), 1);
}

#[test]
fn test_enum_from_wrong_class_is_rejected() {
    let mut message = valid_email();
    let err = message
        .set("provider", priority().by_name("HIGH").unwrap())
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_get_materializes_sets() {
    let mut message = valid_email();
    message.add_to_set("labels", ["a", "b"]).unwrap();
    match message.get("labels").unwrap() {
        Some(FieldValue::Many(values)) => assert_eq!(values.len(), 2),
        other => panic!("Expected Many, got {:?}", other),
    }
    assert_eq!(message.get("body").unwrap(), None);
}

#[test]
fn test_maps() {
    let mut message = MapsMessage::create().unwrap();
    message.add_to_map("ints", "a", Some(Value::Int(-5))).unwrap();
    message.add_to_map("flags", "on", Some(Value::Bool(true))).unwrap();
    message.add_to_map("children", "first", Some(valid_nested().into())).unwrap();

    assert!(message.add_to_map("ints", "b", Some(Value::from("nope"))).is_err());
    assert_eq!(message.get_map("ints").unwrap().map(|m| m.len()), Some(1));

    message.add_to_map("flags", "on", None).unwrap();
    assert!(!message.has("flags"));
    assert!(message.has_cleared_field("flags"));
}

#[test]
fn test_dynamic_fields_and_refs() {
    let mut message = valid_email();
    message
        .add_to_list(
            "dynamic_fields",
            [
                DynamicField::new("age", DynamicValue::Int(39)).unwrap(),
                DynamicField::new("bio", DynamicValue::Text("Nuclear safety".into())).unwrap(),
            ],
        )
        .unwrap();
    assert_eq!(message.get_many("dynamic_fields").unwrap().len(), 2);

    let a = MessageRef::parse("acme:tests:fixtures:nested-message:abc#Tag").unwrap();
    let b = MessageRef::parse("acme:tests:fixtures:nested-message:ABC#tag").unwrap();
    message.add_to_set("links", [a, b]).unwrap();
    assert_eq!(message.get_many("links").unwrap().len(), 1);
}

// =============================================================================
// Nested messages, freeze and clone
// =============================================================================

#[test]
fn test_nested_message_restriction() {
    let mut message = valid_email();
    message.set("nested", valid_nested()).unwrap();

    let err = message.set("nested", valid_email()).unwrap_err();
    assert!(err.is_validation());

    message.add_to_list("any_of_message", [valid_email(), valid_nested()]).unwrap();
    assert_eq!(message.get_many("any_of_message").unwrap().len(), 2);
}

#[test]
fn test_freeze_cascades_to_nested_messages() {
    let mut message = valid_email();
    message.set("nested", valid_nested()).unwrap();
    message.add_to_list("any_of_message", [valid_nested()]).unwrap();
    message.freeze().unwrap();

    let nested = message.get_single("nested").unwrap().and_then(Value::as_message).unwrap();
    assert!(nested.is_frozen());
    let listed = message.get_many("any_of_message").unwrap();
    assert!(listed.iter().filter_map(|v| v.as_message()).all(|m| m.is_frozen()));
}

#[test]
fn test_frozen_message_rejects_every_mutation() {
    let mut message = valid_email();
    message.freeze().unwrap();

    let frozen = |r: familiar_messages::Result<_>| matches!(r, Err(SchemaError::FrozenMessageIsImmutable { .. }));
    assert!(frozen(message.set("from_name", "Bart").map(|_| ())));
    assert!(frozen(message.set_single("from_name", None).map(|_| ())));
    assert!(frozen(message.clear("from_name").map(|_| ())));
    assert!(frozen(message.add_to_set("labels", ["x"]).map(|_| ())));
    assert!(frozen(message.remove_from_set("labels", ["x"]).map(|_| ())));
    assert!(frozen(message.add_to_list("enum_in_list", Vec::<Value>::new()).map(|_| ())));
    assert!(frozen(message.populate_defaults(None).map(|_| ())));
}

#[test]
fn test_freeze_requires_required_fields() {
    let mut message = EmailMessage::create().unwrap();
    let err = message.freeze().unwrap_err();
    assert!(matches!(err, SchemaError::RequiredFieldNotSet { ref field, .. } if field == "from_email"));
    assert!(!message.is_frozen());

    let mut nested_missing = valid_email();
    nested_missing.set("nested", NestedMessage::create().unwrap()).unwrap();
    assert!(nested_missing.freeze().is_err());
}

#[test]
fn test_freeze_is_idempotent() {
    let mut message = valid_email();
    message.freeze().unwrap();
    let before = message.clone();
    message.freeze().unwrap();
    assert!(message.is_frozen());
    assert_eq!(message, before);
}

#[test]
fn test_clone_of_frozen_message_is_independent() {
    let mut message = valid_email();
    message.set("nested", valid_nested()).unwrap();
    message.freeze().unwrap();

    let mut copy = message.clone();
    assert!(!copy.is_frozen());
    copy.set("from_name", "Marge").unwrap();

    let nested = copy.nested_mut("nested").unwrap().unwrap();
    assert!(!nested.is_frozen());
    nested.set("test1", "changed").unwrap();

    let original = message.get_single("nested").unwrap().and_then(Value::as_message).unwrap();
    assert!(original.is_frozen());
    assert!(!original.has("test1"));
    assert!(!message.has("from_name"));
}

#[test]
fn test_replay_freezes() {
    let mut message = valid_email();
    message.set("date_sent", Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()).unwrap();
    message.set_replay(true).unwrap();
    assert!(message.is_replay());
    assert!(message.is_frozen());

    let err = message.set_replay(true).unwrap_err();
    assert!(matches!(err, SchemaError::Logic(_)));
}
