//! Rust target: a self-contained `events.rs` with the event enum, packed
//! record structs and byte-level read/write helpers.

use std::fmt::{self, Write};

use crate::emit::{banner, pascal_case, rust_type, EmitContext, Target};

pub struct RustTarget;

impl Target for RustTarget {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_name(&self) -> &'static str {
        "events.rs"
    }

    fn emit_prelude(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        banner(out, "//")?;
        writeln!(out, "#![allow(dead_code)]")?;
        writeln!(out, "#![allow(non_snake_case)]")?;
        writeln!(out)
    }

    fn emit_enum(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "#[repr(u32)]")?;
        writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]")?;
        writeln!(out, "pub enum Event {{")?;
        let groups = ctx.grouped();
        for (i, (category, descriptors)) in groups.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "    // {category}")?;
            for d in descriptors {
                writeln!(out, "    {} = {},", pascal_case(&d.event_name), d.type_id)?;
            }
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "impl Event {{")?;
        writeln!(out, "    pub fn from_u32(id: u32) -> Option<Self> {{")?;
        writeln!(out, "        match id {{")?;
        for d in ctx.table.iter() {
            writeln!(
                out,
                "            {} => Some(Self::{}),",
                d.type_id,
                pascal_case(&d.event_name)
            )?;
        }
        writeln!(out, "            _ => None,")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn emit_structs(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        for d in ctx.struct_descriptors() {
            writeln!(out, "/// Fixed payload of {} ({} bytes).", d.event_name, d.fixed_size)?;
            writeln!(out, "#[repr(C, packed)]")?;
            writeln!(out, "#[derive(Debug, Clone, Copy)]")?;
            writeln!(out, "pub struct {} {{", d.struct_name)?;
            for op in &d.ops {
                let field_ty = if op.is_buffer() || (op.padding && op.byte_len() > 1) {
                    format!("[u8; {}]", op.byte_len())
                } else {
                    rust_type(op.ty).to_string()
                };
                writeln!(out, "    pub {}: {},", op.name, field_ty)?;
            }
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn emit_codec_table(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "/// Fixed payload size in bytes, by event identifier.")?;
        writeln!(out, "pub fn fixed_payload_size(id: u32) -> Option<usize> {{")?;
        writeln!(out, "    match id {{")?;
        for d in ctx.table.iter() {
            writeln!(out, "        {} => Some({}),", d.type_id, d.fixed_size)?;
        }
        writeln!(out, "        _ => None,")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(
            out,
            "/// (length field, blob field) pairs for dynamic events, declared order."
        )?;
        writeln!(
            out,
            "pub fn dynamic_tails(id: u32) -> &'static [(&'static str, &'static str)] {{"
        )?;
        writeln!(out, "    match id {{")?;
        for d in ctx.table.iter().filter(|d| d.is_dynamic()) {
            let pairs: Vec<String> = d
                .dynamic_tails
                .iter()
                .map(|t| format!("(\"{}\", \"{}\")", t.length_field, t.payload_field))
                .collect();
            writeln!(out, "        {} => &[{}],", d.type_id, pairs.join(", "))?;
        }
        writeln!(out, "        _ => &[],")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn emit_encoder(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "{PACKER_SOURCE}")?;

        for d in ctx.struct_descriptors() {
            writeln!(out, "impl {} {{", d.struct_name)?;
            writeln!(out, "    pub fn write_to(&self, out: &mut Vec<u8>) {{")?;
            for op in &d.ops {
                if op.padding {
                    writeln!(out, "        out.extend_from_slice(&[0u8; {}]);", op.byte_len())?;
                } else if op.is_buffer() {
                    writeln!(out, "        out.extend_from_slice(&self.{});", op.name)?;
                } else {
                    writeln!(
                        out,
                        "        out.extend_from_slice(&self.{}.to_le_bytes());",
                        op.name
                    )?;
                }
            }
            writeln!(out, "    }}")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn emit_decoder(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        for d in ctx.struct_descriptors() {
            writeln!(out, "impl {} {{", d.struct_name)?;
            writeln!(
                out,
                "    pub fn read_from(bytes: &[u8]) -> Option<Self> {{"
            )?;
            writeln!(out, "        if bytes.len() < {} {{", d.fixed_size)?;
            writeln!(out, "            return None;")?;
            writeln!(out, "        }}")?;
            writeln!(out, "        Some(Self {{")?;
            let mut offset = 0usize;
            for op in &d.ops {
                let size = op.byte_len();
                if op.is_buffer() || (op.padding && size > 1) {
                    writeln!(
                        out,
                        "            {}: bytes[{}..{}].try_into().ok()?,",
                        op.name,
                        offset,
                        offset + size
                    )?;
                } else if op.padding {
                    writeln!(out, "            {}: 0,", op.name)?;
                } else {
                    writeln!(
                        out,
                        "            {}: {}::from_le_bytes(bytes[{}..{}].try_into().ok()?),",
                        op.name,
                        rust_type(op.ty),
                        offset,
                        offset + size
                    )?;
                }
                offset += size;
            }
            writeln!(out, "        }})")?;
            writeln!(out, "    }}")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
        }

        emit_tail_lengths(ctx, out)?;
        writeln!(out, "{READER_SOURCE}")
    }
}

/// Per-event blob lengths read straight off the fixed payload, for the
/// generated stream reader.
fn emit_tail_lengths(ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
    writeln!(
        out,
        "/// Blob lengths of a dynamic record, in tail order, read from its"
    )?;
    writeln!(out, "/// fixed payload. Fixed records yield an empty list.")?;
    writeln!(
        out,
        "pub fn tail_lengths(id: u32, payload: &[u8]) -> Option<Vec<usize>> {{"
    )?;
    writeln!(out, "    match id {{")?;
    for d in ctx.table.iter().filter(|d| d.is_dynamic()) {
        let mut reads = Vec::with_capacity(d.dynamic_tails.len());
        for tail in &d.dynamic_tails {
            let mut offset = 0usize;
            for op in &d.ops {
                if op.name == tail.length_field {
                    break;
                }
                offset += op.byte_len();
            }
            let width = tail.length_type.width();
            let read = if width == 1 {
                format!("*payload.get({offset})? as usize")
            } else {
                format!(
                    "{}::from_le_bytes(payload.get({}..{})?.try_into().ok()?) as usize",
                    rust_type(tail.length_type),
                    offset,
                    offset + width
                )
            };
            reads.push(read);
        }
        writeln!(out, "        {} => Some(vec![{}]),", d.type_id, reads.join(", "))?;
    }
    writeln!(out, "        _ => Some(Vec::new()),")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)
}

const PACKER_SOURCE: &str = r#"/// Accumulates records and finalizes the count-prefixed frame.
pub struct CommandPacker {
    stream: Vec<u8>,
    count: u32,
}

impl CommandPacker {
    pub fn new() -> Self {
        Self {
            stream: Vec::new(),
            count: 0,
        }
    }

    pub fn command_count(&self) -> u32 {
        self.count
    }

    /// Append one record: fixed payload, then one blob per dynamic tail.
    pub fn pack(&mut self, event: Event, payload: &[u8], blobs: &[&[u8]]) {
        self.stream.extend_from_slice(&(event as u32).to_le_bytes());
        self.stream.extend_from_slice(&0u64.to_le_bytes());
        self.stream.extend_from_slice(payload);
        for blob in blobs {
            self.stream.extend_from_slice(blob);
        }
        self.count += 1;
    }

    /// Zero records yield the empty frame, not a count-only header.
    pub fn finalize(self) -> Vec<u8> {
        if self.count == 0 {
            return Vec::new();
        }
        let mut frame = Vec::with_capacity(4 + self.stream.len());
        frame.extend_from_slice(&self.count.to_le_bytes());
        frame.extend_from_slice(&self.stream);
        frame
    }
}

impl Default for CommandPacker {
    fn default() -> Self {
        Self::new()
    }
}
"#;

const READER_SOURCE: &str = r#"pub struct RecordHeader {
    pub event: Event,
    pub timestamp: u64,
}

/// Forward-only frame reader.
///
/// `next_record` yields the header, the fixed payload slice and the
/// variable blobs in tail order; `None` means end of frame or malformed
/// input. An empty buffer is the zero-record frame.
pub struct CommandReader<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u32,
}

impl<'a> CommandReader<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.is_empty() {
            return Some(Self {
                data,
                offset: 0,
                remaining: 0,
            });
        }
        let remaining = u32::from_le_bytes(data.get(0..4)?.try_into().ok()?);
        Some(Self {
            data,
            offset: 4,
            remaining,
        })
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn next_record(&mut self) -> Option<(RecordHeader, &'a [u8], Vec<&'a [u8]>)> {
        if self.remaining == 0 {
            return None;
        }
        let type_id = u32::from_le_bytes(self.data.get(self.offset..self.offset + 4)?.try_into().ok()?);
        let timestamp = u64::from_le_bytes(self.data.get(self.offset + 4..self.offset + 12)?.try_into().ok()?);
        let event = Event::from_u32(type_id)?;
        let size = fixed_payload_size(type_id)?;
        let start = self.offset + 12;
        let payload = self.data.get(start..start + size)?;
        let mut cursor = start + size;
        let lengths = tail_lengths(type_id, payload)?;
        let mut blobs = Vec::with_capacity(lengths.len());
        for (_tail, len) in dynamic_tails(type_id).iter().zip(lengths) {
            let blob = self.data.get(cursor..cursor + len)?;
            blobs.push(blob);
            cursor += len;
        }
        self.offset = cursor;
        self.remaining -= 1;
        Some((RecordHeader { event, timestamp }, payload, blobs))
    }
}
"#;
