//! Property-based tests for field types and identities.
//!
//! Every valid value must survive encode then decode unchanged, and absent
//! values must never encode to a zero value.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat};
use familiar_messages::{
    Field, FieldBuilder, Message, MessageRef, Microtime, Schema, SchemaCurie, SchemaId, Type, Value,
};
use proptest::prelude::*;
use serde_json::Value as Json;

fn field(kind: Type) -> Field {
    FieldBuilder::new("value", kind).build().unwrap()
}

fn round_trip(kind: Type, value: Value) -> Option<Value> {
    let f = field(kind);
    kind.guard(&value, &f).unwrap();
    let encoded = kind.encode(Some(&value), &f, None).unwrap();
    kind.decode(&encoded, &f, None).unwrap()
}

// =============================================================================
// Round Trip Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_int_round_trip(x in 0i64..=4_294_967_295) {
        prop_assert_eq!(round_trip(Type::Int, Value::Int(x)), Some(Value::Int(x)));
    }

    #[test]
    fn prop_signed_big_int_round_trip(x: i64) {
        prop_assert_eq!(round_trip(Type::SignedBigInt, Value::Int(x)), Some(Value::Int(x)));
    }

    #[test]
    fn prop_big_int_round_trip(x: u64) {
        let value = Value::BigInt(x as u128);
        prop_assert_eq!(round_trip(Type::BigInt, value.clone()), Some(value));
    }

    #[test]
    fn prop_float_round_trip(x in -1.0e12f64..1.0e12f64) {
        prop_assert_eq!(round_trip(Type::Float, Value::Float(x)), Some(Value::Float(x)));
    }

    #[test]
    fn prop_binary_round_trip(bytes in proptest::collection::vec(any::<u8>(), 1..=255)) {
        let value = Value::Binary(bytes);
        prop_assert_eq!(round_trip(Type::Binary, value.clone()), Some(value));
    }

    #[test]
    fn prop_date_round_trip(days in 0i64..100_000) {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Duration::days(days);
        prop_assert_eq!(round_trip(Type::Date, Value::Date(date)), Some(Value::Date(date)));
    }

    #[test]
    fn prop_date_time_keeps_only_microseconds(secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
        let f = field(Type::DateTime);
        let dt = DateTime::from_timestamp(secs, nanos).unwrap();
        let value = Value::DateTime(dt);

        if nanos % 1_000 == 0 {
            prop_assert_eq!(round_trip(Type::DateTime, value.clone()), Some(value));
        } else {
            prop_assert!(Type::DateTime.guard(&value, &f).unwrap_err().is_validation());
        }

        let text = Json::String(dt.to_rfc3339_opts(SecondsFormat::Nanos, true));
        let decoded = Type::DateTime.decode(&text, &f, None).unwrap().unwrap();
        prop_assert!(Type::DateTime.guard(&decoded, &f).is_ok());
    }

    #[test]
    fn prop_date_time_round_trip(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
        let dt = DateTime::from_timestamp(secs, micros * 1_000).unwrap();
        prop_assert_eq!(round_trip(Type::DateTime, Value::DateTime(dt)), Some(Value::DateTime(dt)));
    }

    #[test]
    fn prop_microtime_round_trip(sec in 1i64..4_000_000_000, usec in 0u32..1_000_000) {
        let value = Value::Microtime(Microtime::new(sec, usec).unwrap());
        prop_assert_eq!(round_trip(Type::Microtime, value.clone()), Some(value));
    }

    #[test]
    fn prop_string_round_trip(s in "[a-zA-Z0-9 ]{0,50}") {
        let f = field(Type::String);
        let encoded = Type::String.encode(Some(&Value::from(s.as_str())), &f, None).unwrap();
        let decoded = Type::String.decode(&encoded, &f, None).unwrap();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            prop_assert_eq!(encoded, Json::Null);
            prop_assert_eq!(decoded, None);
        } else {
            prop_assert_eq!(decoded, Some(Value::from(trimmed)));
        }
    }
}

// =============================================================================
// Range Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_int_rejects_out_of_range(x in 4_294_967_296i64..i64::MAX) {
        let f = field(Type::Int);
        prop_assert!(Type::Int.guard(&Value::Int(x), &f).unwrap_err().is_validation());
    }

    #[test]
    fn prop_tiny_int_range(x in -1_000i64..1_000) {
        let f = field(Type::TinyInt);
        prop_assert_eq!(Type::TinyInt.guard(&Value::Int(x), &f).is_ok(), (0..=255).contains(&x));
    }

    #[test]
    fn prop_signed_small_int_range(x in -100_000i64..100_000) {
        let f = field(Type::SignedSmallInt);
        prop_assert_eq!(
            Type::SignedSmallInt.guard(&Value::Int(x), &f).is_ok(),
            (-32_768..=32_767).contains(&x)
        );
    }
}

// =============================================================================
// Set Deduplication
// =============================================================================

fn tag_schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(
            "acme:tests:fixtures:tagged:1-0-0.0",
            "Tagged",
            vec![FieldBuilder::new("tags", Type::String).set().build().unwrap()],
            vec![],
        )
        .unwrap(),
    )
}

proptest! {
    #[test]
    fn prop_set_collapses_case_variants(s in "[a-z]{1,20}") {
        let mut message = Message::create(tag_schema()).unwrap();
        let upper = s.to_uppercase();
        let padded = format!("  {}  ", s);
        message.add_to_set("tags", [s.as_str(), upper.as_str(), padded.as_str()]).unwrap();

        let tags = message.get_many("tags").unwrap();
        prop_assert_eq!(tags.len(), 1);
        let stored = tags[0].as_str().unwrap();
        prop_assert!(stored == s || stored == upper || stored == padded);
    }
}

// =============================================================================
// Identity Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_schema_id_round_trip(
        vendor in "[a-z0-9-]{1,20}",
        package in "[a-z0-9.-]{1,20}",
        category in "([a-z0-9-]{1,10})?",
        message in "[a-z0-9-]{1,20}",
        major in 0u64..100,
        minor in 0u64..100,
        patch in 0u64..100,
        revision in 0u64..100,
    ) {
        let raw = format!("{}:{}:{}:{}:{}-{}-{}.{}", vendor, package, category, message, major, minor, patch, revision);
        let id = SchemaId::parse(&raw).unwrap();
        prop_assert_eq!(id.to_string(), raw);
        prop_assert_eq!(id.version().major(), major);
        prop_assert_eq!(id.version().revision, revision);
    }

    #[test]
    fn prop_message_ref_tag_is_normalized(tag in "[ -~]{0,30}") {
        let curie = SchemaCurie::parse("acme:videos:event:video-uploaded").unwrap();
        let r = MessageRef::new(curie, "abc", Some(&tag)).unwrap();

        if let Some(normalized) = r.tag() {
            prop_assert!(!normalized.is_empty());
            prop_assert!(normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_.-".contains(c)));
            let reparsed = MessageRef::parse(&r.to_string()).unwrap();
            prop_assert_eq!(reparsed, r);
        } else {
            prop_assert!(tag.is_empty());
        }
    }
}
