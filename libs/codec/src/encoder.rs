//! Stream encoder: typed field values in, one contiguous frame out.
//!
//! Validation happens inside `add`, not at finalize: a bad call is rejected
//! before a single byte lands in the stream, so earlier records are never
//! corrupted by a later mistake. Blob length fields are computed by the
//! encoder from the blobs themselves and cannot be supplied by the caller.

use schema::PrimitiveType;

use crate::decoder::Value;
use crate::descriptor::{CodecDescriptor, CodecTable};
use crate::error::EncodeError;
use crate::STREAM_COUNT_SIZE;

/// Progress callback for batched encoding, called on each flush with the
/// number of records in the chunk and the running total.
pub type BatchCallback<'a> = Box<dyn FnMut(usize, u32) + 'a>;

/// Accumulates records and produces one wire frame.
///
/// Call order per record: one `add` with every queryable non-length field in
/// declaration order, followed by one raw blob per dynamic tail in tail
/// order. `finalize` consumes the encoder and yields the frame; a frame with
/// zero records is the empty buffer, not a four-byte zero count.
///
/// Batching is a progress knob only: all records land in the same stream and
/// the finalized bytes are identical with or without it.
pub struct StreamEncoder<'a> {
    table: &'a CodecTable,
    /// Encoded records, without the leading count.
    stream: Vec<u8>,
    total: u32,
    /// Records added since the last flush.
    buffered: u32,
    batch_size: Option<u32>,
    on_batch: Option<BatchCallback<'a>>,
}

impl<'a> StreamEncoder<'a> {
    pub fn new(table: &'a CodecTable) -> Self {
        Self {
            table,
            stream: Vec::new(),
            total: 0,
            buffered: 0,
            batch_size: None,
            on_batch: None,
        }
    }

    /// Encoder that reports progress through `on_batch` every `batch_size`
    /// records. [`StreamEncoder::finalize`] still yields the single frame
    /// holding every record.
    pub fn with_batching(
        table: &'a CodecTable,
        batch_size: u32,
        on_batch: BatchCallback<'a>,
    ) -> Self {
        Self {
            table,
            stream: Vec::new(),
            total: 0,
            buffered: 0,
            batch_size: Some(batch_size.max(1)),
            on_batch: Some(on_batch),
        }
    }

    /// Total records encoded so far, flushed or not.
    pub fn event_count(&self) -> u32 {
        self.total
    }

    /// Records added since the last flush.
    pub fn buffered_count(&self) -> u32 {
        self.buffered
    }

    /// Validate and append one record.
    ///
    /// On error nothing is appended and the encoder stays usable; the failed
    /// record is simply dropped.
    pub fn add(&mut self, type_id: u32, values: Vec<Value>) -> Result<(), EncodeError> {
        let descriptor = self
            .table
            .get(type_id)
            .ok_or(EncodeError::UnknownType { type_id })?;

        let expected = descriptor.expected_values();
        if values.len() != expected {
            return Err(EncodeError::ArityMismatch {
                type_id,
                expected,
                got: values.len(),
            });
        }

        let record = pack_record(descriptor, &values)?;
        self.stream.extend_from_slice(&record);
        self.total += 1;
        self.buffered += 1;

        if let Some(batch_size) = self.batch_size {
            if self.buffered >= batch_size {
                self.flush();
            }
        }
        Ok(())
    }

    /// Report the buffered records through the batch callback and reset the
    /// buffered counter. The records stay in the stream; flushing never
    /// drops data. No-op when nothing is buffered.
    pub fn flush(&mut self) {
        if self.buffered == 0 {
            return;
        }
        let chunk = self.buffered as usize;
        self.buffered = 0;
        if let Some(callback) = self.on_batch.as_mut() {
            callback(chunk, self.total);
        }
    }

    /// Consume the encoder and return the frame holding every record.
    ///
    /// Zero records yield the canonical empty frame: an empty buffer, never
    /// a count-only header.
    pub fn finalize(mut self) -> Vec<u8> {
        self.flush();
        if self.total == 0 {
            return Vec::new();
        }
        let mut frame = Vec::with_capacity(STREAM_COUNT_SIZE + self.stream.len());
        frame.extend_from_slice(&self.total.to_le_bytes());
        frame.extend_from_slice(&self.stream);
        frame
    }
}

/// Pack one record (header + fixed payload + blobs) into a scratch buffer.
fn pack_record(descriptor: &CodecDescriptor, values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    let tails = descriptor.dynamic_tails.len();
    let fixed_values = &values[..values.len() - tails];
    let blobs = &values[values.len() - tails..];

    // Blob lengths first, so length fields can be filled during the walk.
    let mut blob_bytes: Vec<&[u8]> = Vec::with_capacity(tails);
    for (tail, blob) in descriptor.dynamic_tails.iter().zip(blobs) {
        let Value::Bytes(bytes) = blob else {
            return Err(EncodeError::ValueMismatch {
                type_id: descriptor.type_id,
                field: tail.payload_field.clone(),
                expected: "bytes",
                got: blob.type_name(),
            });
        };
        if !length_fits(tail.length_type, bytes.len()) {
            return Err(EncodeError::BlobTooLong {
                type_id: descriptor.type_id,
                field: tail.payload_field.clone(),
                len: bytes.len(),
            });
        }
        blob_bytes.push(bytes);
    }

    let mut record = Vec::with_capacity(12 + descriptor.fixed_size);
    record.extend_from_slice(&descriptor.type_id.to_le_bytes());
    // Timestamp slot, reserved. Always zero on the wire today.
    record.extend_from_slice(&0u64.to_le_bytes());

    let mut next_value = fixed_values.iter();
    for op in &descriptor.ops {
        if op.padding {
            record.resize(record.len() + op.byte_len(), 0);
            continue;
        }
        if let Some(tail_index) = descriptor
            .dynamic_tails
            .iter()
            .position(|t| t.length_field == op.name)
        {
            pack_unsigned(&mut record, op.ty, blob_bytes[tail_index].len() as u64);
            continue;
        }
        let Some(value) = next_value.next() else {
            return Err(EncodeError::ArityMismatch {
                type_id: descriptor.type_id,
                expected: descriptor.expected_values(),
                got: values.len(),
            });
        };
        if op.is_buffer() {
            pack_buffer(&mut record, descriptor, op.byte_len(), &op.name, value)?;
        } else {
            pack_scalar(&mut record, descriptor, op.ty, &op.name, value)?;
        }
    }

    for bytes in blob_bytes {
        record.extend_from_slice(bytes);
    }
    Ok(record)
}

fn length_fits(length_type: PrimitiveType, len: usize) -> bool {
    match length_type.unsigned_max() {
        Some(max) => len as u64 <= max,
        None => false,
    }
}

fn pack_unsigned(out: &mut Vec<u8>, ty: PrimitiveType, value: u64) {
    match ty {
        PrimitiveType::U8 => out.push(value as u8),
        PrimitiveType::U16 => out.extend_from_slice(&(value as u16).to_le_bytes()),
        PrimitiveType::U32 => out.extend_from_slice(&(value as u32).to_le_bytes()),
        PrimitiveType::U64 => out.extend_from_slice(&value.to_le_bytes()),
        // Length fields are unsigned by layout-compiler guarantee.
        _ => out.extend_from_slice(&(value as u32).to_le_bytes()),
    }
}

/// Fixed buffer: shorter input is zero-padded to the declared width, longer
/// input is rejected.
fn pack_buffer(
    out: &mut Vec<u8>,
    descriptor: &CodecDescriptor,
    width: usize,
    field: &str,
    value: &Value,
) -> Result<(), EncodeError> {
    let Value::Bytes(bytes) = value else {
        return Err(EncodeError::ValueMismatch {
            type_id: descriptor.type_id,
            field: field.to_string(),
            expected: "bytes",
            got: value.type_name(),
        });
    };
    if bytes.len() > width {
        return Err(EncodeError::BufferOverflow {
            type_id: descriptor.type_id,
            field: field.to_string(),
            len: bytes.len(),
            max: width,
        });
    }
    out.extend_from_slice(bytes);
    out.resize(out.len() + (width - bytes.len()), 0);
    Ok(())
}

fn pack_scalar(
    out: &mut Vec<u8>,
    descriptor: &CodecDescriptor,
    ty: PrimitiveType,
    field: &str,
    value: &Value,
) -> Result<(), EncodeError> {
    let mismatch = |got: &'static str| EncodeError::ValueMismatch {
        type_id: descriptor.type_id,
        field: field.to_string(),
        expected: ty.as_str(),
        got,
    };
    match (ty, value) {
        (PrimitiveType::I8, Value::I8(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::U8, Value::U8(v)) => out.push(*v),
        (PrimitiveType::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::I32, Value::I32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::I64, Value::I64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::U64, Value::U64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::F32, Value::F32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (PrimitiveType::F64, Value::F64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (_, other) => return Err(mismatch(other.type_name())),
    }
    Ok(())
}
