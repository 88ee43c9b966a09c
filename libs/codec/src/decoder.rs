//! Stream decoder: one contiguous frame in, typed records out.
//!
//! The decoder is a forward-only walk over the buffer. It stops at the first
//! structural error, reports it, and returns every record it had already
//! decoded. Truncated or hostile input must never panic or read out of
//! bounds; every access is bounds-checked before the byteorder read.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use schema::PrimitiveType;

use crate::descriptor::{CodecDescriptor, CodecTable};
use crate::error::DecodeError;
use crate::{RECORD_HEADER_SIZE, STREAM_COUNT_SIZE};

/// A decoded field value.
///
/// Scalars stay in their declared width; fixed buffers, character buffers
/// and dynamic blobs all decode to [`Value::Bytes`]. A zero-length dynamic
/// blob decodes to empty bytes, not to an absent field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
}

impl Value {
    /// Human-readable variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I8(_) => "i8",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Widen any unsigned integer variant to u64.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(u64::from(v)),
            Value::U16(v) => Some(u64::from(v)),
            Value::U32(v) => Some(u64::from(v)),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Widen any signed integer variant to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(i64::from(v)),
            Value::I16(v) => Some(i64::from(v)),
            Value::I32(v) => Some(i64::from(v)),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Widen either float variant to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(f64::from(v)),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// One record lifted off the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub type_id: u32,
    /// Header timestamp slot. Writers currently always emit zero.
    pub timestamp: u64,
    /// (field name, value) in declaration order, padding excluded.
    pub fields: Vec<(String, Value)>,
}

impl DecodedEvent {
    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// The outcome of decoding one frame.
///
/// `events` holds everything decoded before the frame ended or broke;
/// `error` is set when the frame was cut short. Both can be non-empty at
/// once: a frame truncated after its second record yields two events and a
/// truncation error.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    pub events: Vec<DecodedEvent>,
    pub error: Option<DecodeError>,
}

impl DecodedStream {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode a complete frame against a compiled codec table.
///
/// An empty buffer is the canonical zero-event frame and decodes cleanly to
/// no records. Any other buffer must start with the u32 record count.
pub fn decode_stream(table: &CodecTable, bytes: &[u8]) -> DecodedStream {
    if bytes.is_empty() {
        return DecodedStream {
            events: Vec::new(),
            error: None,
        };
    }
    if bytes.len() < STREAM_COUNT_SIZE {
        let error = DecodeError::TruncatedCount { got: bytes.len() };
        warn!(%error, "dropping frame");
        return DecodedStream {
            events: Vec::new(),
            error: Some(error),
        };
    }

    let declared = LittleEndian::read_u32(&bytes[..STREAM_COUNT_SIZE]);
    let mut offset = STREAM_COUNT_SIZE;
    let mut events = Vec::with_capacity(declared.min(1024) as usize);

    for index in 0..declared {
        match decode_record(table, bytes, offset, index) {
            Ok((event, next)) => {
                events.push(event);
                offset = next;
            }
            Err(error) => {
                warn!(%error, decoded = events.len(), declared, "frame cut short");
                return DecodedStream {
                    events,
                    error: Some(error),
                };
            }
        }
    }

    DecodedStream {
        events,
        error: None,
    }
}

/// Decode one record starting at `offset`; returns the event and the offset
/// of the next record.
fn decode_record(
    table: &CodecTable,
    bytes: &[u8],
    offset: usize,
    index: u32,
) -> Result<(DecodedEvent, usize), DecodeError> {
    if bytes.len() - offset < RECORD_HEADER_SIZE {
        return Err(DecodeError::TruncatedHeader { index, offset });
    }
    let type_id = LittleEndian::read_u32(&bytes[offset..offset + 4]);
    let timestamp = LittleEndian::read_u64(&bytes[offset + 4..offset + 12]);
    let payload_start = offset + RECORD_HEADER_SIZE;

    let descriptor = table.get(type_id).ok_or(DecodeError::UnknownType {
        type_id,
        offset,
    })?;

    if bytes.len() - payload_start < descriptor.fixed_size {
        return Err(DecodeError::TruncatedPayload {
            type_id,
            need: descriptor.fixed_size,
            got: bytes.len() - payload_start,
        });
    }
    let payload = &bytes[payload_start..payload_start + descriptor.fixed_size];

    let mut fields = Vec::with_capacity(descriptor.keys.len() + descriptor.dynamic_tails.len());
    let mut cursor = 0usize;
    for op in &descriptor.ops {
        let size = op.byte_len();
        if !op.padding {
            let value = if op.is_buffer() {
                Value::Bytes(payload[cursor..cursor + size].to_vec())
            } else {
                read_scalar(op.ty, &payload[cursor..cursor + size])
            };
            fields.push((op.name.clone(), value));
        }
        cursor += size;
    }

    // Variable blobs follow the fixed payload, in declared tail order.
    let mut next = payload_start + descriptor.fixed_size;
    for tail in &descriptor.dynamic_tails {
        let len = blob_length(descriptor, &fields, &tail.length_field);
        if bytes.len() - next < len {
            return Err(DecodeError::TruncatedBlob {
                type_id,
                field: tail.payload_field.clone(),
                need: len,
                got: bytes.len() - next,
            });
        }
        fields.push((
            tail.payload_field.clone(),
            Value::Bytes(bytes[next..next + len].to_vec()),
        ));
        next += len;
    }

    Ok((
        DecodedEvent {
            type_id,
            timestamp,
            fields,
        },
        next,
    ))
}

fn read_scalar(ty: PrimitiveType, bytes: &[u8]) -> Value {
    match ty {
        PrimitiveType::I8 => Value::I8(bytes[0] as i8),
        PrimitiveType::U8 => Value::U8(bytes[0]),
        PrimitiveType::I16 => Value::I16(LittleEndian::read_i16(bytes)),
        PrimitiveType::U16 => Value::U16(LittleEndian::read_u16(bytes)),
        PrimitiveType::I32 => Value::I32(LittleEndian::read_i32(bytes)),
        PrimitiveType::U32 => Value::U32(LittleEndian::read_u32(bytes)),
        PrimitiveType::I64 => Value::I64(LittleEndian::read_i64(bytes)),
        PrimitiveType::U64 => Value::U64(LittleEndian::read_u64(bytes)),
        PrimitiveType::F32 => Value::F32(LittleEndian::read_f32(bytes)),
        PrimitiveType::F64 => Value::F64(LittleEndian::read_f64(bytes)),
        // Buffers are handled by the caller; a 1-element char buf is one byte.
        PrimitiveType::CharBuf => Value::Bytes(bytes.to_vec()),
    }
}

/// Length of a blob, read from its already-decoded length field. The length
/// field is an unsigned integer by layout-compiler guarantee.
fn blob_length(
    descriptor: &CodecDescriptor,
    fields: &[(String, Value)],
    length_field: &str,
) -> usize {
    fields
        .iter()
        .find(|(name, _)| name == length_field)
        .and_then(|(_, value)| value.as_u64())
        .map(|len| len as usize)
        .unwrap_or_else(|| {
            // Unreachable for tables built by CodecTable::compile.
            warn!(
                type_id = descriptor.type_id,
                length_field, "length field missing from decoded payload"
            );
            0
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::EventSchema;

    fn table() -> CodecTable {
        let json = r#"{"structs": [
            {"eventId": 104, "enumName": "INPUT_MOUSEMOTION", "name": "PackedMouseMotionEvent",
             "members": [
                {"name": "x", "type": "f32"}, {"name": "y", "type": "f32"},
                {"name": "dx", "type": "f32"}, {"name": "dy", "type": "f32"}
             ]},
            {"eventId": 301, "enumName": "TEXT_SET_STRING", "name": "PackedTextSetStringEvent",
             "isDynamic": true,
             "members": [
                {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                {"name": "textLength", "type": "u32"},
                {"name": "_padding", "type": "u32"}
             ]}
        ]}"#;
        CodecTable::compile(&EventSchema::from_json_str(json).unwrap()).unwrap()
    }

    fn frame(records: &[&[u8]]) -> Vec<u8> {
        let mut out = (records.len() as u32).to_le_bytes().to_vec();
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    fn mouse_motion(x: f32, y: f32, dx: f32, dy: f32) -> Vec<u8> {
        let mut r = 104u32.to_le_bytes().to_vec();
        r.extend_from_slice(&0u64.to_le_bytes());
        for v in [x, y, dx, dy] {
            r.extend_from_slice(&v.to_le_bytes());
        }
        r
    }

    #[test]
    fn empty_buffer_is_the_zero_event_frame() {
        let out = decode_stream(&table(), b"");
        assert!(out.is_complete());
        assert!(out.events.is_empty());
    }

    #[test]
    fn short_count_prefix_is_reported() {
        let out = decode_stream(&table(), &[1, 0]);
        assert_eq!(out.error, Some(DecodeError::TruncatedCount { got: 2 }));
        assert!(out.events.is_empty());
    }

    #[test]
    fn fixed_record_decodes_field_by_field() {
        let bytes = frame(&[&mouse_motion(1.5, -2.25, 0.0, 4.0)]);
        let out = decode_stream(&table(), &bytes);
        assert!(out.is_complete());
        let event = &out.events[0];
        assert_eq!(event.type_id, 104);
        assert_eq!(event.timestamp, 0);
        assert_eq!(event.get("x"), Some(&Value::F32(1.5)));
        assert_eq!(event.get("y"), Some(&Value::F32(-2.25)));
        assert_eq!(event.get("dy"), Some(&Value::F32(4.0)));
    }

    #[test]
    fn dynamic_record_reads_blob_after_fixed_payload() {
        let mut record = 301u32.to_le_bytes().to_vec();
        record.extend_from_slice(&0u64.to_le_bytes());
        record.extend_from_slice(&7i64.to_le_bytes());
        record.extend_from_slice(&9i64.to_le_bytes());
        record.extend_from_slice(&5u32.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        record.extend_from_slice(b"hello");
        let out = decode_stream(&table(), &frame(&[&record]));
        assert!(out.is_complete());
        let event = &out.events[0];
        assert_eq!(event.get("textLength"), Some(&Value::U32(5)));
        assert_eq!(event.get("text").unwrap().as_bytes(), Some(&b"hello"[..]));
        // Padding never surfaces.
        assert!(event.get("_padding").is_none());
    }

    #[test]
    fn zero_length_blob_decodes_to_empty_bytes() {
        let mut record = 301u32.to_le_bytes().to_vec();
        record.extend_from_slice(&0u64.to_le_bytes());
        record.extend_from_slice(&1i64.to_le_bytes());
        record.extend_from_slice(&2i64.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        let out = decode_stream(&table(), &frame(&[&record]));
        assert!(out.is_complete());
        assert_eq!(
            out.events[0].get("text"),
            Some(&Value::Bytes(Vec::new()))
        );
    }

    #[test]
    fn missing_second_record_returns_partial_frame() {
        let mut bytes = 2u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&mouse_motion(0.5, 0.5, 0.0, 0.0));
        let out = decode_stream(&table(), &bytes);
        assert_eq!(out.events.len(), 1);
        assert!(matches!(
            out.error,
            Some(DecodeError::TruncatedHeader { index: 1, .. })
        ));
    }

    #[test]
    fn unknown_type_stops_the_frame() {
        let mut record = 9999u32.to_le_bytes().to_vec();
        record.extend_from_slice(&0u64.to_le_bytes());
        let out = decode_stream(&table(), &frame(&[&record]));
        assert!(out.events.is_empty());
        assert!(matches!(
            out.error,
            Some(DecodeError::UnknownType { type_id: 9999, .. })
        ));
    }

    #[test]
    fn truncation_at_every_boundary_never_panics() {
        let bytes = frame(&[&mouse_motion(1.0, 2.0, 3.0, 4.0)]);
        for cut in 0..bytes.len() {
            let out = decode_stream(&table(), &bytes[..cut]);
            if cut == 0 {
                assert!(out.is_complete());
            } else {
                assert!(out.error.is_some());
            }
        }
    }
}
