//! Familiar Messages
//!
//! Schema-driven, typed message containers for the Familiar platform.
//!
//! ## Features
//!
//! - **Typed Fields**: A closed set of field types, each with its own guard, encode and decode rules
//! - **Cardinality**: Single values, case-insensitive sets, ordered lists and string-keyed maps
//! - **Immutability**: Freezing validates a message and locks it and every nested message
//! - **Versioned Identity**: `vendor:package:category:message:version` schema ids and message refs
//! - **Array Codec**: Round-trips messages through `serde_json` maps
//!
//! ## Architecture
//!
//! ```text
//! SchemaId ─┐
//!           ├─► Schema ──► Message ◄──► ArraySerializer (Codec)
//! Field ────┘      ▲          │
//!   └─ Type        │          └─ Value (scalars, nested Message, MessageRef, DynamicField)
//!            registry (MessageKind → Arc<Schema>, cached per process)
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod field;
pub mod message;
pub mod message_ref;
pub mod registry;
pub mod schema;
pub mod schema_id;
pub mod serializer;
pub mod types;
pub mod version;

pub use codec::{Codec, Encoded};
pub use config::{CodecConfig, MessagesConfig, OutputFormat};
pub use error::{Result, SchemaError};
pub use field::{ClassRestriction, Field, FieldBuilder, FieldRule, FieldValue};
pub use message::{Message, StoredValue};
pub use message_ref::MessageRef;
pub use registry::{register_schema, reset_schema_cache, resolve, schema_for, MessageKind};
pub use schema::{Mixin, Schema, SCHEMA_FIELD_NAME};
pub use schema_id::{SchemaCurie, SchemaId};
pub use serializer::ArraySerializer;
pub use types::dynamic::{DynamicField, DynamicValue};
pub use types::enums::{EnumClass, EnumScalar, EnumValue};
pub use types::format::Format;
pub use types::identifier::Identifier;
pub use types::microtime::Microtime;
pub use types::value::Value;
pub use types::Type;
pub use version::SchemaVersion;
