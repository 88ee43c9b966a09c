//! # Eventwire Protocol Codec
//!
//! ## Purpose
//!
//! This crate contains the "rules" layer of the eventwire system:
//! - **Layout compilation**: member byte offsets, fixed-size footprints and
//!   dynamic-tail detection for every schema record
//! - **Codec tables**: per-identifier descriptors memoizing layout for O(1)
//!   encode/decode dispatch
//! - **The wire protocol runtime**: the unified stream encoder and decoder
//!   honoring the shared byte-level contract every generated target must
//!   also honor
//!
//! ## Wire contract
//!
//! A stream is `[u32 LE event_count][event_count records]`. Every record is
//! `[u32 LE type_id][u64 LE timestamp][fixed payload][variable blobs]`, where
//! the variable blobs exist only for dynamic records and their lengths are
//! carried inside the fixed payload. All multi-byte values are little-endian
//! regardless of host endianness, and nothing is ever aligned or padded
//! beyond what the schema declares.
//!
//! ## Architecture Role
//!
//! ```text
//! libs/schema → [codec] → codegen targets
//!      ↑           ↓            ↓
//!   Validated   Layouts +   Generated
//!   Records     Runtime     Encoders/Decoders
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Transport (sockets, pipes, frame hand-off) — a collaborator concern;
//!   the codec is handed one contiguous buffer per frame
//! - Source emission for any target (belongs in codegen)
//!
//! ## Failure model
//!
//! Compile-time failures ([`LayoutError`]) are fatal and abort generation for
//! all targets. Runtime decode failures terminate the current frame only:
//! [`decode_stream`] logs the error and returns every record decoded before
//! it — a dropped frame must never crash a running simulation.

pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod layout;

pub use decoder::{decode_stream, DecodedEvent, DecodedStream, Value};
pub use descriptor::{CodecDescriptor, CodecTable, FieldOp};
pub use encoder::StreamEncoder;
pub use error::{DecodeError, EncodeError, LayoutError};
pub use layout::{compile, compile_all, DynamicTail, LayoutRecord, MemberLayout};

/// Size of the stream's leading record-count field.
pub const STREAM_COUNT_SIZE: usize = 4;

/// Size of every record header: u32 type_id + u64 timestamp.
pub const RECORD_HEADER_SIZE: usize = 12;
