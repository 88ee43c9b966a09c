//! # Eventwire Schema Model
//!
//! ## Purpose
//!
//! This crate contains the "single source of truth" layer of the eventwire
//! system: the in-memory representation of every event record declared in the
//! schema document, the primitive type catalog with exact byte widths, and the
//! cosmetic category classifier used to group generated enumerations.
//!
//! ## Architecture Role
//!
//! ```text
//! schema document (JSON) → [schema] → libs/codec → codegen targets
//!          ↑                   ↓            ↓            ↓
//!      Authored           Validated      Layout      Generated
//!      Records            EventSchema    Compiler    Source
//! ```
//!
//! ## What This Crate Contains
//! - **EventSchema / EventRecord / Member**: the immutable schema model
//! - **PrimitiveType**: fixed-width type catalog with codec format codes
//! - **Category**: pure identifier-range → grouping-label function
//! - **SchemaError**: load-time validation failures (fail fast, before any
//!   target-specific code is generated)
//!
//! ## What This Crate Does NOT Contain
//! - Layout computation or codec tables (belongs in libs/codec)
//! - Code emission for any target (belongs in codegen)
//!
//! The model is read once at compile time and never mutated afterwards; none
//! of these types exist at the engine/script runtime boundary.

use thiserror::Error;

pub mod category;
pub mod model;
pub mod types;

pub use category::Category;
pub use model::{EventRecord, EventSchema, Member};
pub use types::PrimitiveType;

/// Reserved prefix marking a member as padding.
///
/// Padding members serialize as zero bytes and are excluded from the decoded
/// key set exposed to callers. Covers `_padding`, `_padding1`, `_unused`, etc.
pub const PADDING_PREFIX: &str = "_";

/// Suffix identifying the length field of a dynamic record's variable blob.
///
/// A member named `fontPathLength` declares that a variable-length `fontPath`
/// blob follows the fixed payload.
pub const LENGTH_FIELD_SUFFIX: &str = "Length";

/// Schema-source validation errors.
///
/// All of these are fatal: a malformed schema aborts compilation entirely,
/// because a half-generated multi-target protocol is worse than none.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event {name}: unknown primitive type '{type_spec}'")]
    UnknownType { name: String, type_spec: String },

    #[error("event {name}: array member '{member}' is missing an element count")]
    MissingCount { name: String, member: String },

    #[error("event {name}: member '{member}' declares a repeat count but '{type_spec}' is not an array type")]
    UnexpectedCount {
        name: String,
        member: String,
        type_spec: String,
    },

    #[error("duplicate event identifier {type_id} ('{first}' and '{second}')")]
    DuplicateId {
        type_id: u32,
        first: String,
        second: String,
    },

    #[error("duplicate event name '{name}'")]
    DuplicateName { name: String },

    #[error("schema contains no events")]
    Empty,
}
