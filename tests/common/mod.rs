//! Fixture message kinds shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use familiar_messages::{
    EnumClass, FieldBuilder, FieldValue, Format, Message, MessageKind, Result, Schema, Type, Value,
};

static PROVIDER: LazyLock<Arc<EnumClass>> = LazyLock::new(|| {
    EnumClass::strings(
        "Provider",
        [("AOL", "aol"), ("GMAIL", "gmail"), ("HOTMAIL", "hotmail")],
    )
});

static PRIORITY: LazyLock<Arc<EnumClass>> =
    LazyLock::new(|| EnumClass::ints("Priority", [("LOW", 1), ("NORMAL", 2), ("HIGH", 3)]));

pub fn provider() -> Arc<EnumClass> {
    Arc::clone(&PROVIDER)
}

pub fn priority() -> Arc<EnumClass> {
    Arc::clone(&PRIORITY)
}

pub struct EmailMessage;

impl MessageKind for EmailMessage {
    const CLASS_NAME: &'static str = "EmailMessage";

    fn define_schema() -> Result<Schema> {
        // nested messages are resolved by their _schema when decoding
        NestedMessage::schema()?;

        Schema::new(
            "acme:tests:fixtures:email-message:1-0-0.0",
            Self::CLASS_NAME,
            vec![
                FieldBuilder::new("id", Type::TimeUuid).required().build()?,
                FieldBuilder::new("from_name", Type::String).build()?,
                FieldBuilder::new("from_email", Type::String)
                    .required()
                    .format(Format::Email)
                    .build()?,
                FieldBuilder::new("subject", Type::String)
                    .default_fn(|message: Option<&Message>| {
                        let labels = message?.get_many("labels").ok()?;
                        let joined: Vec<String> = labels.iter().map(|v| v.to_string()).collect();
                        Some(FieldValue::Single(Value::from(format!("{} test", joined.join(",")))))
                    })
                    .build()?,
                FieldBuilder::new("body", Type::Text).build()?,
                FieldBuilder::new("priority", Type::IntEnum)
                    .required()
                    .enum_class(priority())
                    .with_default(Value::from(priority().by_name("NORMAL")?))
                    .build()?,
                FieldBuilder::new("sent", Type::Boolean).build()?,
                FieldBuilder::new("date_sent", Type::DateTime).build()?,
                FieldBuilder::new("microtime_sent", Type::Microtime)
                    .without_type_default()
                    .build()?,
                FieldBuilder::new("provider", Type::StringEnum)
                    .enum_class(provider())
                    .with_default(Value::from(provider().by_name("GMAIL")?))
                    .build()?,
                FieldBuilder::new("labels", Type::String)
                    .format(Format::Hashtag)
                    .set()
                    .build()?,
                FieldBuilder::new("nested", Type::Message)
                    .any_of([NestedMessage::CLASS_NAME])
                    .build()?,
                FieldBuilder::new("enum_in_set", Type::StringEnum)
                    .enum_class(provider())
                    .set()
                    .build()?,
                FieldBuilder::new("enum_in_list", Type::StringEnum)
                    .enum_class(provider())
                    .list()
                    .build()?,
                FieldBuilder::new("any_of_message", Type::Message).list().build()?,
                FieldBuilder::new("dynamic_fields", Type::DynamicField).list().build()?,
                FieldBuilder::new("links", Type::MessageRef).set().build()?,
            ],
            vec![],
        )
    }
}

pub struct NestedMessage;

impl MessageKind for NestedMessage {
    const CLASS_NAME: &'static str = "NestedMessage";

    fn define_schema() -> Result<Schema> {
        Schema::new(
            "acme:tests:fixtures:nested-message:1-0-0.0",
            Self::CLASS_NAME,
            vec![
                FieldBuilder::new("test1", Type::String).build()?,
                FieldBuilder::new("test2", Type::Int).list().build()?,
                FieldBuilder::new("code", Type::String).required().build()?,
            ],
            vec![],
        )
    }
}

pub struct MapsMessage;

impl MessageKind for MapsMessage {
    const CLASS_NAME: &'static str = "MapsMessage";

    fn define_schema() -> Result<Schema> {
        Schema::new(
            "acme:tests:fixtures:maps-message:1-0-0.0",
            Self::CLASS_NAME,
            vec![
                FieldBuilder::new("strings", Type::String).map().build()?,
                FieldBuilder::new("ints", Type::SignedInt).map().build()?,
                FieldBuilder::new("flags", Type::Boolean).map().build()?,
                FieldBuilder::new("dates", Type::Date).map().build()?,
                FieldBuilder::new("children", Type::Message).map().build()?,
            ],
            vec![],
        )
    }
}

/// An email message that passes validation
pub fn valid_email() -> Message {
    let mut message = EmailMessage::create().unwrap();
    message.set("from_email", "homer@simpsons.com").unwrap();
    message
}

/// A nested message that passes validation
pub fn valid_nested() -> Message {
    let mut message = NestedMessage::create().unwrap();
    message.set("code", "N-1").unwrap();
    message
}
