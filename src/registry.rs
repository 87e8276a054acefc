//! Schema Registry
//!
//! Computes each message kind's schema once and keeps it in process-wide
//! caches: one keyed by the kind's `TypeId`, one keyed by schema id and curie
//! so nested messages can be rebuilt from the `_schema` value they carry.
//!
//! Concurrent first computations may race; the first schema inserted wins and
//! every caller gets that same instance.

use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::message::Message;
use crate::schema::Schema;
use crate::schema_id::SchemaId;

static SCHEMAS_BY_KIND: LazyLock<RwLock<HashMap<TypeId, Arc<Schema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static SCHEMAS_BY_ID: LazyLock<RwLock<HashMap<String, Arc<Schema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A concrete message kind
///
/// ```ignore
/// struct UserRegistered;
///
/// impl MessageKind for UserRegistered {
///     const CLASS_NAME: &'static str = "UserRegistered";
///
///     fn define_schema() -> Result<Schema> {
///         Schema::new("acme:users:event:user-registered:1-0-0.0", Self::CLASS_NAME, fields, vec![])
///     }
/// }
///
/// let message = UserRegistered::create()?;
/// ```
pub trait MessageKind: Sized + 'static {
    /// Name the kind's schema must declare as its class name
    const CLASS_NAME: &'static str;

    /// Build the schema; called at most once per process unless the cache is reset
    fn define_schema() -> Result<Schema>;

    fn schema() -> Result<Arc<Schema>> {
        schema_for::<Self>()
    }

    /// New message with defaults populated
    fn create() -> Result<Message> {
        Message::create(Self::schema()?)
    }
}

/// The cached schema for `K`, computing it on first use
pub fn schema_for<K: MessageKind>() -> Result<Arc<Schema>> {
    let kind = TypeId::of::<K>();

    {
        let cache = SCHEMAS_BY_KIND.read().unwrap_or_else(|e| e.into_inner());
        if let Some(schema) = cache.get(&kind) {
            return Ok(Arc::clone(schema));
        }
    }

    let schema = K::define_schema()?;
    if schema.class_name() != K::CLASS_NAME {
        return Err(SchemaError::SchemaNotDefined(format!(
            "schema [{}] returned from define_schema must be for class [{}], not [{}]",
            schema.id(),
            K::CLASS_NAME,
            schema.class_name()
        )));
    }
    debug!(schema = %schema.id(), class = K::CLASS_NAME, "Computed schema");

    let schema = {
        let mut cache = SCHEMAS_BY_KIND.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cache.entry(kind).or_insert_with(|| Arc::new(schema)))
    };

    register_schema(Arc::clone(&schema));
    Ok(schema)
}

/// Make a schema resolvable by its id and curie
///
/// The first schema registered under a key keeps it. A later schema of a
/// different class under the same key is logged and ignored.
pub fn register_schema(schema: Arc<Schema>) {
    let mut by_id = SCHEMAS_BY_ID.write().unwrap_or_else(|e| e.into_inner());
    for key in [schema.id().to_string(), schema.curie().to_string()] {
        match by_id.entry(key) {
            Entry::Occupied(existing) => {
                if existing.get().class_name() != schema.class_name() {
                    warn!(
                        key = %existing.key(),
                        kept = existing.get().class_name(),
                        ignored = schema.class_name(),
                        "Schema key already registered to another class"
                    );
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&schema));
            }
        }
    }
    debug!(schema = %schema.id(), "Registered schema");
}

/// Find the schema for an id, falling back to any version of its curie
pub fn resolve(id: &SchemaId) -> Result<Arc<Schema>> {
    let by_id = SCHEMAS_BY_ID.read().unwrap_or_else(|e| e.into_inner());
    by_id
        .get(id.as_str())
        .or_else(|| by_id.get(&id.curie().to_string()))
        .cloned()
        .ok_or_else(|| SchemaError::SchemaNotDefined(format!("no schema registered for [{}]", id)))
}

/// Parse a schema id string and resolve it
pub fn resolve_str(id: &str) -> Result<Arc<Schema>> {
    let id = SchemaId::parse(id)?;
    resolve(&id)
}

/// Drop every cached schema
///
/// Meant for test isolation; schemas handed out earlier remain valid.
pub fn reset_schema_cache() {
    SCHEMAS_BY_KIND.write().unwrap_or_else(|e| e.into_inner()).clear();
    SCHEMAS_BY_ID.write().unwrap_or_else(|e| e.into_inner()).clear();
    debug!("Schema cache reset");
}
