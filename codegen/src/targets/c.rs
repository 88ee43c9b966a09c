//! C target: a single header with the event enum, byte-packed record
//! structs and a static codec table for linear lookup.

use std::fmt::{self, Write};

use crate::emit::{banner, c_type, EmitContext, Target};

pub struct CTarget;

impl Target for CTarget {
    fn name(&self) -> &'static str {
        "c"
    }

    fn file_name(&self) -> &'static str {
        "events.h"
    }

    fn emit_prelude(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        banner(out, "//")?;
        writeln!(out, "#pragma once")?;
        writeln!(out)?;
        writeln!(out, "#include <stddef.h>")?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out, "#include <string.h>")?;
        writeln!(out)
    }

    fn emit_enum(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "typedef enum {{")?;
        let groups = ctx.grouped();
        for (i, (category, descriptors)) in groups.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "    /* {category} */")?;
            for d in descriptors {
                writeln!(out, "    EVENT_{} = {},", d.event_name, d.type_id)?;
            }
        }
        writeln!(out, "}} event_type_t;")?;
        writeln!(out)
    }

    fn emit_structs(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "#pragma pack(push, 1)")?;
        writeln!(out)?;
        for d in ctx.struct_descriptors() {
            writeln!(out, "/* {} fixed payload, {} bytes */", d.event_name, d.fixed_size)?;
            writeln!(out, "typedef struct {{")?;
            for op in &d.ops {
                if op.padding && op.byte_len() > 1 {
                    writeln!(out, "    uint8_t {}[{}];", op.name, op.byte_len())?;
                } else if op.is_buffer() {
                    writeln!(out, "    {} {}[{}];", c_type(op.ty), op.name, op.repeat)?;
                } else {
                    writeln!(out, "    {} {};", c_type(op.ty), op.name)?;
                }
            }
            writeln!(out, "}} {};", d.struct_name)?;
            writeln!(out)?;
        }
        writeln!(out, "#pragma pack(pop)")?;
        writeln!(out)
    }

    fn emit_codec_table(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "typedef struct {{")?;
        writeln!(out, "    uint32_t type_id;")?;
        writeln!(out, "    size_t fixed_size;")?;
        writeln!(out, "    uint8_t is_dynamic;")?;
        writeln!(out, "}} event_codec_entry_t;")?;
        writeln!(out)?;
        writeln!(out, "static const event_codec_entry_t EVENT_CODEC_TABLE[] = {{")?;
        for d in ctx.table.iter() {
            writeln!(
                out,
                "    {{{}, {}, {}}},",
                d.type_id,
                d.fixed_size,
                u8::from(d.is_dynamic())
            )?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
        writeln!(
            out,
            "#define EVENT_CODEC_TABLE_LEN (sizeof(EVENT_CODEC_TABLE) / sizeof(EVENT_CODEC_TABLE[0]))"
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "static inline const event_codec_entry_t *event_codec_lookup(uint32_t type_id) {{"
        )?;
        writeln!(out, "    for (size_t i = 0; i < EVENT_CODEC_TABLE_LEN; i++) {{")?;
        writeln!(out, "        if (EVENT_CODEC_TABLE[i].type_id == type_id) {{")?;
        writeln!(out, "            return &EVENT_CODEC_TABLE[i];")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "    return NULL;")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn emit_encoder(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(out, "#define EVENT_RECORD_HEADER_SIZE 12u")?;
        writeln!(out)?;
        writeln!(
            out,
            "/* Writes identifier plus zero timestamp; returns bytes written. */"
        )?;
        writeln!(
            out,
            "static inline size_t event_write_header(uint8_t *out, uint32_t type_id) {{"
        )?;
        writeln!(out, "    uint64_t timestamp = 0;")?;
        writeln!(out, "    memcpy(out, &type_id, 4);")?;
        writeln!(out, "    memcpy(out + 4, &timestamp, 8);")?;
        writeln!(out, "    return EVENT_RECORD_HEADER_SIZE;")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn emit_decoder(&self, _ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "/* Reads the record header; returns 0 on truncated input. */"
        )?;
        writeln!(
            out,
            "static inline size_t event_read_header(const uint8_t *data, size_t len, uint32_t *type_id) {{"
        )?;
        writeln!(out, "    if (len < EVENT_RECORD_HEADER_SIZE) {{")?;
        writeln!(out, "        return 0;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "    memcpy(type_id, data, 4);")?;
        writeln!(out, "    return EVENT_RECORD_HEADER_SIZE;")?;
        writeln!(out, "}}")?;
        Ok(())
    }
}
