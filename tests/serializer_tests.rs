//! Array form round trips through the shipped serializer

mod common;

use chrono::{TimeZone, Utc};
use familiar_messages::{
    ArraySerializer, CodecConfig, DynamicField, DynamicValue, Message, MessageKind, MessageRef, Microtime,
    SchemaError, Value,
};
use serde_json::{json, Value as Json};

use common::{provider, valid_email, valid_nested, EmailMessage, MapsMessage};

fn populated() -> Message {
    let mut message = valid_email();
    message.set("from_name", "Homer").unwrap();
    message.set("subject", "Donuts").unwrap();
    message
        .set("date_sent", Utc.with_ymd_and_hms(2014, 12, 25, 12, 13, 14).unwrap())
        .unwrap();
    message
        .set("microtime_sent", Microtime::new(1419509594, 123456).unwrap())
        .unwrap();
    message.set("sent", true).unwrap();
    message.add_to_set("labels", ["donuts", "beer"]).unwrap();
    message.add_to_list("enum_in_list", [Value::from(provider().value("aol").unwrap())]).unwrap();
    message.set("nested", valid_nested()).unwrap();
    message
        .add_to_list("dynamic_fields", [DynamicField::new("age", DynamicValue::Int(39)).unwrap()])
        .unwrap();
    message
        .add_to_set("links", [MessageRef::parse("acme:tests:fixtures:nested-message:n-1").unwrap()])
        .unwrap();
    message
}

#[test]
fn test_array_form_shape() {
    let array = populated().to_array().unwrap();

    assert_eq!(array["_schema"], json!("acme:tests:fixtures:email-message:1-0-0.0"));
    assert_eq!(array["from_email"], json!("homer@simpsons.com"));
    assert_eq!(array["date_sent"], json!("2014-12-25T12:13:14.000000+00:00"));
    assert_eq!(array["microtime_sent"], json!("1419509594123456"));
    assert_eq!(array["priority"], json!(2));
    assert_eq!(array["provider"], json!("gmail"));
    assert_eq!(array["enum_in_list"], json!(["aol"]));
    assert_eq!(array["nested"]["_schema"], json!("acme:tests:fixtures:nested-message:1-0-0.0"));
    assert_eq!(array["nested"]["code"], json!("N-1"));
    assert_eq!(array["dynamic_fields"], json!([{"name": "age", "int_val": 39}]));
    assert_eq!(
        array["links"],
        json!([{"curie": "acme:tests:fixtures:nested-message", "id": "n-1"}])
    );

    assert!(!array.contains_key("body"));
}

#[test]
fn test_round_trip_through_schema_resolution() {
    let original = populated();
    let array = Json::Object(original.to_array().unwrap());

    let decoded = ArraySerializer::default().deserialize(&array).unwrap();
    assert_eq!(decoded, original);
    assert!(!decoded.is_frozen());

    let nested = decoded.get_single("nested").unwrap().and_then(Value::as_message).unwrap();
    assert_eq!(nested.schema().class_name(), "NestedMessage");
}

#[test]
fn test_frozen_source_round_trips_to_mutable_copy() {
    let mut original = populated();
    original.freeze().unwrap();

    let decoded = Message::from_array(EmailMessage::schema().unwrap(), &original.to_array().unwrap()).unwrap();
    assert!(!decoded.is_frozen());
    assert_eq!(decoded, original);
}

#[test]
fn test_freeze_on_decode() {
    let serializer = ArraySerializer::new(CodecConfig {
        include_cleared_fields: true,
        freeze_on_decode: true,
    });
    let array = Json::Object(populated().to_array().unwrap());
    let decoded = serializer.deserialize(&array).unwrap();
    assert!(decoded.is_frozen());
    let nested = decoded.get_single("nested").unwrap().and_then(Value::as_message).unwrap();
    assert!(nested.is_frozen());
}

#[test]
fn test_missing_schema_entry() {
    EmailMessage::schema().unwrap();
    let err = ArraySerializer::default().deserialize(&json!({"from_email": "x@y.com"})).unwrap_err();
    assert!(matches!(err, SchemaError::SchemaNotDefined(_)));

    let err = ArraySerializer::default()
        .deserialize(&json!({"_schema": "acme:tests:fixtures:unknown:1-0-0.0"}))
        .unwrap_err();
    assert!(matches!(err, SchemaError::SchemaNotDefined(_)));
}

#[test]
fn test_decode_errors_are_not_validation_errors() {
    let schema = EmailMessage::schema().unwrap();

    let data = json!({"from_email": "homer@simpsons.com", "date_sent": "last tuesday"});
    let err = Message::from_array(schema.clone(), data.as_object().unwrap()).unwrap_err();
    assert!(err.is_decode_failure());

    let data = json!({"from_email": "not-an-email"});
    let err = Message::from_array(schema.clone(), data.as_object().unwrap()).unwrap_err();
    assert!(err.is_validation());

    let data = json!({"provider": "compuserve"});
    let err = Message::from_array(schema, data.as_object().unwrap()).unwrap_err();
    assert!(err.is_decode_failure());
}

#[test]
fn test_empty_enum_falls_back_to_default() {
    let schema = EmailMessage::schema().unwrap();
    let data = json!({"provider": ""});
    let message = Message::from_array(schema, data.as_object().unwrap()).unwrap();
    assert_eq!(
        message.get_single("provider").unwrap(),
        Some(&Value::from(provider().by_name("GMAIL").unwrap()))
    );
}

#[test]
fn test_maps_round_trip() {
    let mut message = MapsMessage::create().unwrap();
    message.add_to_map("strings", "a", Some(Value::from("x"))).unwrap();
    message.add_to_map("ints", "b", Some(Value::Int(-7))).unwrap();
    message.add_to_map("dates", "c", Some(Value::Date(chrono::NaiveDate::from_ymd_opt(2015, 2, 28).unwrap()))).unwrap();
    message.add_to_map("children", "d", Some(valid_nested().into())).unwrap();

    let array = message.to_array().unwrap();
    assert_eq!(array["ints"], json!({"b": -7}));
    assert_eq!(array["dates"], json!({"c": "2015-02-28"}));

    let decoded = Message::from_array(MapsMessage::schema().unwrap(), &array).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_cleared_field_with_default_keeps_its_mark() {
    let mut message = valid_email();
    message.add_to_set("labels", ["donuts", "mmmm"]).unwrap();
    message.set("subject", "Donuts").unwrap();
    message.clear("subject").unwrap();
    assert!(message.has("subject"));
    assert!(message.has_cleared_field("subject"));

    let array = message.to_array().unwrap();
    assert_eq!(array["subject"], Json::Null);

    let decoded = Message::from_array(EmailMessage::schema().unwrap(), &array).unwrap();
    assert!(decoded.has_cleared_field("subject"));
    assert_eq!(
        decoded.get_single("subject").unwrap(),
        Some(&Value::from("donuts,mmmm test"))
    );
    assert_eq!(decoded, message);

    let quiet = ArraySerializer::new(CodecConfig {
        include_cleared_fields: false,
        freeze_on_decode: false,
    });
    assert_eq!(quiet.serialize(&message).unwrap()["subject"], json!("donuts,mmmm test"));
}

#[test]
fn test_cleared_field_without_default_stays_absent() {
    let mut message = valid_email();
    message.set("from_name", "Homer").unwrap();
    message.clear("from_name").unwrap();

    let array = message.to_array().unwrap();
    assert_eq!(array["from_name"], Json::Null);

    let decoded = Message::from_array(EmailMessage::schema().unwrap(), &array).unwrap();
    assert!(!decoded.has("from_name"));
    assert!(decoded.has_cleared_field("from_name"));
}
