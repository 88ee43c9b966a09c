//! Python target: a single module with the event enum, per-category pack
//! formats, the identifier-keyed dispatch maps and a generic packer and
//! stream unpacker built on `struct`.

use std::fmt::{self, Write};

use schema::Category;

use crate::emit::{banner, EmitContext, Target};

pub struct PythonTarget;

fn formats_class(category: Category) -> String {
    let name = category.as_str();
    let mut out = String::with_capacity(name.len() + 7);
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
        out.extend(chars);
    }
    out.push_str("Formats");
    out
}

impl Target for PythonTarget {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_name(&self) -> &'static str {
        "events.py"
    }

    fn emit_prelude(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        banner(out, "#")?;
        writeln!(out, "import struct")?;
        writeln!(out, "from enum import IntEnum")?;
        writeln!(out)?;
        writeln!(out)
    }

    fn emit_enum(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "class Event(IntEnum):")?;
        let groups = ctx.grouped();
        for (i, (category, descriptors)) in groups.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "    # {category}")?;
            for d in descriptors {
                writeln!(out, "    {} = {}", d.event_name, d.type_id)?;
            }
        }
        writeln!(out)?;
        writeln!(out)
    }

    fn emit_structs(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        for (category, descriptors) in ctx.grouped() {
            writeln!(out, "class {}:", formats_class(category))?;
            writeln!(out, "    # (pack format, fixed payload size)")?;
            for d in descriptors {
                writeln!(
                    out,
                    "    {} = (\"{}\", {})",
                    d.event_name, d.format, d.fixed_size
                )?;
            }
            writeln!(out)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn emit_codec_table(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "_EVENT_FORMAT_MAP = {{")?;
        for d in ctx.table.iter() {
            let class = formats_class(Category::of(d.type_id));
            writeln!(out, "    Event.{}: {}.{},", d.event_name, class, d.event_name)?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "_EVENT_KEY_MAP = {{")?;
        for d in ctx.table.iter() {
            let keys: Vec<String> = d.keys.iter().map(|k| format!("\"{k}\"")).collect();
            writeln!(
                out,
                "    Event.{}: [{}],",
                d.event_name,
                keys.join(", ")
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(out, "# (length field, blob field) pairs for dynamic events.")?;
        writeln!(out, "_EVENT_DYNAMIC_TAILS = {{")?;
        for d in ctx.table.iter().filter(|d| d.is_dynamic()) {
            let pairs: Vec<String> = d
                .dynamic_tails
                .iter()
                .map(|t| format!("(\"{}\", \"{}\")", t.length_field, t.payload_field))
                .collect();
            writeln!(
                out,
                "    Event.{}: [{}],",
                d.event_name,
                pairs.join(", ")
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out)
    }

    fn emit_encoder(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        let source = r#"class CommandPacker:
    """Accumulates records into one stream and emits a single wire frame.

    Pass every non-length field in declaration order, then one bytes blob
    per dynamic tail. Length fields are computed from the blobs. The chunk
    callback is progress-only (chunk record count, running total); the
    finalized bytes are identical with or without chunking.
    """

    def __init__(self, chunk_size=0, chunk_callback=None):
        self._records = bytearray()
        self._total = 0
        self._buffered = 0
        self._chunk_size = chunk_size
        self._chunk_callback = chunk_callback

    def get_buffer_count(self):
        return self._buffered

    def get_total_event_count(self):
        return self._total

    def add(self, event, *values):
        fmt, _size = _EVENT_FORMAT_MAP[event]
        tails = _EVENT_DYNAMIC_TAILS.get(event, [])
        if tails:
            split = len(values) - len(tails)
            fixed, blobs = values[:split], [bytes(b) for b in values[split:]]
            lengths = {key: len(blob) for (key, _), blob in zip(tails, blobs)}
            args, fixed_iter = [], iter(fixed)
            for key in _EVENT_KEY_MAP[event]:
                args.append(lengths[key] if key in lengths else next(fixed_iter))
            payload = struct.pack(fmt, *args) + b"".join(blobs)
        else:
            payload = struct.pack(fmt, *values)
        self._records += struct.pack("<IQ", int(event), 0) + payload
        self._total += 1
        self._buffered += 1
        if self._chunk_size and self._buffered >= self._chunk_size:
            self.flush()

    def flush(self):
        # Progress report only; the records stay in the stream.
        if self._buffered == 0:
            return
        chunk = self._buffered
        self._buffered = 0
        if self._chunk_callback is not None:
            self._chunk_callback(chunk, self._total)

    def finalize(self):
        # Zero records encode as the empty frame, not a bare count.
        self.flush()
        if self._total == 0:
            return b""
        return struct.pack("<I", self._total) + bytes(self._records)
"#;
        writeln!(out, "{source}")?;
        writeln!(out)
    }

    fn emit_decoder(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        let source = r#"def unpack_stream(data):
    """Decode one frame into (Event, field dict) pairs.

    Raises struct.error or ValueError on truncated or unknown input; the
    caller owns the drop-the-frame policy.
    """
    events = []
    if not data:
        return events
    (count,) = struct.unpack_from("<I", data, 0)
    offset = 4
    for _ in range(count):
        event_id, _timestamp = struct.unpack_from("<IQ", data, offset)
        offset += 12
        event = Event(event_id)
        fmt, size = _EVENT_FORMAT_MAP[event]
        values = struct.unpack_from(fmt, data, offset)
        offset += size
        fields = dict(zip(_EVENT_KEY_MAP[event], values))
        for length_key, blob_key in _EVENT_DYNAMIC_TAILS.get(event, []):
            n = fields[length_key]
            if offset + n > len(data):
                raise ValueError("truncated blob for %s" % event.name)
            fields[blob_key] = bytes(data[offset:offset + n])
            offset += n
        events.append((event, fields))
    return events
"#;
        write!(out, "{source}")
    }
}
