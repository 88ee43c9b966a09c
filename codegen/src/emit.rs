//! The emitter engine: one compiled schema in, one source file per target
//! out.
//!
//! All targets render fully in memory before a single file touches disk. A
//! failure in any target aborts the whole run with nothing written, so a
//! build can never pick up a half-regenerated protocol where Rust and Python
//! disagree about the wire format.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use codec::{CodecDescriptor, CodecTable, LayoutError};
use schema::{Category, EventSchema, PrimitiveType};

/// Emission failures. Layout errors surface here because table compilation
/// is the first step of every emit run.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("target rendering failed")]
    Format(#[from] fmt::Error),

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },
}

/// Everything a target needs to render: the validated schema plus its
/// compiled codec table.
pub struct EmitContext<'a> {
    pub event_schema: &'a EventSchema,
    pub table: &'a CodecTable,
}

impl<'a> EmitContext<'a> {
    pub fn new(event_schema: &'a EventSchema, table: &'a CodecTable) -> Self {
        Self {
            event_schema,
            table,
        }
    }

    /// Descriptors grouped by category, groups and members both in
    /// ascending identifier order.
    pub fn grouped(&self) -> Vec<(Category, Vec<&CodecDescriptor>)> {
        let mut groups: Vec<(Category, Vec<&CodecDescriptor>)> = Vec::new();
        for descriptor in self.table.iter() {
            let category = Category::of(descriptor.type_id);
            match groups.last_mut() {
                Some((current, members)) if *current == category => members.push(descriptor),
                _ => groups.push((category, vec![descriptor])),
            }
        }
        groups
    }

    /// One descriptor per unique struct name, in identifier order. Events
    /// sharing a struct have identical members, so any of them can stand in
    /// for the shape.
    pub fn struct_descriptors(&self) -> Vec<&CodecDescriptor> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for descriptor in self.table.iter() {
            if seen.contains(&descriptor.struct_name.as_str()) {
                continue;
            }
            seen.push(descriptor.struct_name.as_str());
            out.push(descriptor);
        }
        out
    }
}

/// One emission backend.
///
/// The engine calls the stages in a fixed order (prelude, enum, structs,
/// codec table, encoder, decoder); a target that has nothing to say for a
/// stage writes nothing. Stages append to a shared buffer, so every target
/// produces exactly one file.
pub trait Target {
    /// Short name used on the command line, e.g. `rust`.
    fn name(&self) -> &'static str;

    /// File name of the generated artifact, e.g. `events.rs`.
    fn file_name(&self) -> &'static str;

    fn emit_prelude(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
    fn emit_enum(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
    fn emit_structs(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
    fn emit_codec_table(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
    fn emit_encoder(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
    fn emit_decoder(&self, ctx: &EmitContext<'_>, out: &mut String) -> fmt::Result;
}

/// Render one target to a string.
pub fn render(target: &dyn Target, ctx: &EmitContext<'_>) -> Result<String, EmitError> {
    let mut out = String::new();
    target.emit_prelude(ctx, &mut out)?;
    target.emit_enum(ctx, &mut out)?;
    target.emit_structs(ctx, &mut out)?;
    target.emit_codec_table(ctx, &mut out)?;
    target.emit_encoder(ctx, &mut out)?;
    target.emit_decoder(ctx, &mut out)?;
    Ok(out)
}

/// Drives a set of targets over one schema.
pub struct Emitter {
    targets: Vec<Box<dyn Target>>,
}

impl Emitter {
    pub fn new(targets: Vec<Box<dyn Target>>) -> Self {
        Self { targets }
    }

    /// Compile the codec table, render every target, then write every file.
    ///
    /// Rendering happens for all targets before any write. Returns the paths
    /// written, in target order.
    pub fn emit_all(
        &self,
        event_schema: &EventSchema,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, EmitError> {
        let table = CodecTable::compile(event_schema)?;
        let ctx = EmitContext::new(event_schema, &table);

        let mut rendered = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let source = render(target.as_ref(), &ctx)?;
            info!(
                target_name = target.name(),
                bytes = source.len(),
                "rendered"
            );
            rendered.push((out_dir.join(target.file_name()), source));
        }

        fs::create_dir_all(out_dir).map_err(|source| EmitError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let mut written = Vec::with_capacity(rendered.len());
        for (path, source) in rendered {
            fs::write(&path, source).map_err(|source| EmitError::Io {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

/// `SPRITE_TEXTURE_LOAD` → `SpriteTextureLoad`.
pub fn pascal_case(screaming: &str) -> String {
    let mut out = String::with_capacity(screaming.len());
    for part in screaming.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            for c in chars {
                out.push(c.to_ascii_lowercase());
            }
        }
    }
    out
}

/// Scalar type name for generated Rust sources.
pub fn rust_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::I8 => "i8",
        PrimitiveType::U8 | PrimitiveType::CharBuf => "u8",
        PrimitiveType::I16 => "i16",
        PrimitiveType::U16 => "u16",
        PrimitiveType::I32 => "i32",
        PrimitiveType::U32 => "u32",
        PrimitiveType::I64 => "i64",
        PrimitiveType::U64 => "u64",
        PrimitiveType::F32 => "f32",
        PrimitiveType::F64 => "f64",
    }
}

/// Fixed-width type name for generated C headers.
pub fn c_type(ty: PrimitiveType) -> &'static str {
    match ty {
        PrimitiveType::I8 => "int8_t",
        PrimitiveType::U8 => "uint8_t",
        PrimitiveType::CharBuf => "char",
        PrimitiveType::I16 => "int16_t",
        PrimitiveType::U16 => "uint16_t",
        PrimitiveType::I32 => "int32_t",
        PrimitiveType::U32 => "uint32_t",
        PrimitiveType::I64 => "int64_t",
        PrimitiveType::U64 => "uint64_t",
        PrimitiveType::F32 => "float",
        PrimitiveType::F64 => "double",
    }
}

/// Shared generated-file banner.
pub fn banner(out: &mut String, comment: &str) -> fmt::Result {
    writeln!(out, "{comment} @generated by eventgen. Do not edit.")?;
    writeln!(
        out,
        "{comment} Regenerate with: eventgen --schema <schema.json> --out-dir <dir>"
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_folds_separators() {
        assert_eq!(pascal_case("SPRITE_ADD"), "SpriteAdd");
        assert_eq!(pascal_case("AUDIO_STOP_ALL"), "AudioStopAll");
        assert_eq!(pascal_case("PLUGIN"), "Plugin");
    }
}
