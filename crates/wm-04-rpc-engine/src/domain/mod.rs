//! Engine domain: method declarations, schemas, registry and cache.

pub mod cache;
pub mod config;
pub mod errors;
pub mod method;
pub mod registry;
pub mod schema;

pub use cache::{CacheLookup, TtlCache};
pub use config::{EngineConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_PRIMARY_NETWORK};
pub use errors::EngineError;
pub use method::{Access, CacheKey, CachePolicy, Caller, MethodSpec};
pub use registry::{Method, MethodRegistry};
pub use schema::{Field, ParamSchema, SchemaViolation, BLOCK_TAGS};
