//! Error types for layout compilation and the runtime codec.
//!
//! Layout errors are compile-time and fatal. Encode/decode errors are
//! runtime and frame-local: they are reported and the current frame (or the
//! offending `add` call) is dropped, never the process.

use thiserror::Error;

/// Fatal schema-structure failures detected while compiling layouts.
///
/// Any of these aborts code generation for all targets — a half-generated
/// multi-target protocol is worse than none.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Two events declare the same struct name with different member lists.
    /// Deduplication is by struct name assuming identical members; divergent
    /// definitions must be rejected rather than silently picking one.
    #[error("struct '{struct_name}' declared by '{first}' and '{second}' with divergent members")]
    StructConflict {
        struct_name: String,
        first: String,
        second: String,
    },

    /// An event is flagged dynamic but carries no `<X>Length` member.
    #[error("dynamic event '{event}' has no length field for its variable tail")]
    MissingLengthField { event: String },

    /// A `<X>Length` member on a dynamic event is not a fixed-width unsigned
    /// integer and therefore cannot carry a blob length.
    #[error("event '{event}': length field '{field}' must be an unsigned integer, got {type_spec}")]
    BadLengthField {
        event: String,
        field: String,
        type_spec: &'static str,
    },
}

/// Per-call encoding failures.
///
/// An invalid `add` is reported and dropped; previously buffered records are
/// never corrupted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("unknown event type {type_id}")]
    UnknownType { type_id: u32 },

    #[error("event type {type_id}: expected {expected} field values, got {got}")]
    ArityMismatch {
        type_id: u32,
        expected: usize,
        got: usize,
    },

    #[error("event type {type_id}: field '{field}' expects {expected}, got {got}")]
    ValueMismatch {
        type_id: u32,
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("event type {type_id}: buffer '{field}' is {len} bytes but holds at most {max}")]
    BufferOverflow {
        type_id: u32,
        field: String,
        len: usize,
        max: usize,
    },

    #[error("event type {type_id}: blob '{field}' length {len} does not fit its length field")]
    BlobTooLong {
        type_id: u32,
        field: String,
        len: usize,
    },
}

/// Frame-local decoding failures.
///
/// Decoding stops at the first error and returns every record already
/// emitted; the caller decides whether a partial frame is fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated stream: {got} bytes is too short for the record count")]
    TruncatedCount { got: usize },

    #[error("truncated header for record {index} at offset {offset}")]
    TruncatedHeader { index: u32, offset: usize },

    #[error("unknown event type {type_id} at offset {offset}")]
    UnknownType { type_id: u32, offset: usize },

    #[error("truncated payload for event type {type_id}: need {need} bytes, {got} remain")]
    TruncatedPayload {
        type_id: u32,
        need: usize,
        got: usize,
    },

    #[error("truncated blob '{field}' for event type {type_id}: need {need} bytes, {got} remain")]
    TruncatedBlob {
        type_id: u32,
        field: String,
        need: usize,
        got: usize,
    },
}
