//! The boundary between the type system and a wire format
//!
//! Scalar types encode themselves. Nested messages, message refs and dynamic
//! fields are structural, so their shape belongs to the serializer in use and
//! the type system hands them to a [`Codec`].

use crate::error::Result;
use crate::field::Field;
use crate::message::Message;
use crate::message_ref::MessageRef;
use crate::types::dynamic::DynamicField;

/// An encoded field value
pub type Encoded = serde_json::Value;

/// Encodes and decodes the structural value kinds
pub trait Codec {
    fn encode_message(&self, message: &Message, field: &Field) -> Result<Encoded>;

    fn decode_message(&self, value: &Encoded, field: &Field) -> Result<Message>;

    fn encode_message_ref(&self, message_ref: &MessageRef, field: &Field) -> Result<Encoded>;

    fn decode_message_ref(&self, value: &Encoded, field: &Field) -> Result<MessageRef>;

    fn encode_dynamic_field(&self, dynamic_field: &DynamicField, field: &Field) -> Result<Encoded>;

    fn decode_dynamic_field(&self, value: &Encoded, field: &Field) -> Result<DynamicField>;
}
