//! Codec descriptors: per-identifier memoization of compiled layouts.
//!
//! The table is precomputed once per schema, so encode/decode are O(1)
//! dispatch on the event identifier followed by an O(fixed_size) copy —
//! never O(schema size) at call time. Descriptors are keyed directly by
//! identifier; the rendered format string is kept only as a human-readable
//! aid for generated output and is never used as a cache key.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use schema::{EventRecord, EventSchema, PrimitiveType};

use crate::error::LayoutError;
use crate::layout::{compile_all, DynamicTail, LayoutRecord};

/// One member of a record as the runtime codec sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOp {
    pub name: String,
    pub ty: PrimitiveType,
    /// Element count; 1 for scalars.
    pub repeat: u32,
    /// Padding ops serialize as zero bytes and never surface to callers.
    pub padding: bool,
}

impl FieldOp {
    /// Serialized size of this op in bytes.
    pub fn byte_len(&self) -> usize {
        self.ty.width() * self.repeat as usize
    }

    /// Whether this op decodes to a byte buffer rather than a scalar.
    pub fn is_buffer(&self) -> bool {
        self.repeat > 1 || self.ty == PrimitiveType::CharBuf
    }

    /// Codec symbol: the type's format code, or `x` for padding runs.
    pub fn code(&self) -> char {
        if self.padding {
            'x'
        } else if self.is_buffer() {
            's'
        } else {
            self.ty.format_code()
        }
    }
}

/// Precomputed (format, fixed size) contract for one event identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub type_id: u32,
    pub event_name: String,
    pub struct_name: String,
    /// Members in declaration order, padding included.
    pub ops: Vec<FieldOp>,
    pub fixed_size: usize,
    /// Queryable field names in order (padding excluded).
    pub keys: Vec<String>,
    /// (length field, blob field) pairs for dynamic records, declared order.
    pub dynamic_tails: Vec<DynamicTail>,
    /// Compact pack-format rendering, e.g. `<qqI4x`. Cosmetic only.
    pub format: String,
}

impl CodecDescriptor {
    pub fn is_dynamic(&self) -> bool {
        !self.dynamic_tails.is_empty()
    }

    /// Whether `field` is the length field of one of this record's tails.
    pub fn is_length_field(&self, field: &str) -> bool {
        self.dynamic_tails.iter().any(|t| t.length_field == field)
    }

    /// Number of values the encoder expects per `add` call: every queryable
    /// non-length field, plus one raw blob per dynamic tail. Each length
    /// field is replaced by exactly one blob, so the total equals the key
    /// count.
    pub fn expected_values(&self) -> usize {
        self.keys.len()
    }

    fn build(event: &EventRecord, layout: &LayoutRecord) -> Self {
        let mut ops = Vec::with_capacity(event.members.len());
        let mut keys = Vec::new();
        for member in &event.members {
            let padding = member.is_padding();
            if !padding {
                keys.push(member.name.clone());
            }
            ops.push(FieldOp {
                name: member.name.clone(),
                ty: member.ty,
                repeat: member.repeat.unwrap_or(1),
                padding,
            });
        }

        let format = render_format(&ops);
        Self {
            type_id: event.type_id,
            event_name: event.name.clone(),
            struct_name: event.struct_name.clone(),
            ops,
            fixed_size: layout.fixed_size,
            keys,
            dynamic_tails: layout.dynamic_tails.clone(),
            format,
        }
    }
}

/// Render the classic little-endian pack-format string for a member list.
fn render_format(ops: &[FieldOp]) -> String {
    let mut format = String::from("<");
    for op in ops {
        if op.padding {
            let bytes = op.byte_len();
            if bytes == 1 {
                format.push('x');
            } else {
                let _ = write!(format, "{bytes}x");
            }
        } else if op.is_buffer() {
            let _ = write!(format, "{}s", op.byte_len());
        } else {
            format.push(op.ty.format_code());
        }
    }
    format
}

/// The full identifier-keyed codec table for one schema.
///
/// Owns every descriptor plus the unique layout records the emitters
/// translate. Building the table runs the layout compiler with its
/// structural-conflict check, so a `CodecTable` existing at all implies the
/// schema is layout-sound.
#[derive(Debug, Clone)]
pub struct CodecTable {
    descriptors: HashMap<u32, CodecDescriptor>,
    /// Identifiers in ascending order, for deterministic emission.
    ids: Vec<u32>,
    /// Unique layouts keyed by struct name.
    layouts: BTreeMap<String, LayoutRecord>,
}

impl CodecTable {
    /// Compile the codec table for a whole schema.
    pub fn compile(event_schema: &EventSchema) -> Result<Self, LayoutError> {
        let layout_by_id = compile_all(event_schema)?;

        let mut descriptors = HashMap::with_capacity(layout_by_id.len());
        let mut ids = Vec::with_capacity(layout_by_id.len());
        let mut layouts = BTreeMap::new();
        for event in event_schema.events() {
            // compile_all returned a layout for every event in the schema
            let layout = &layout_by_id[&event.type_id];
            layouts
                .entry(event.struct_name.clone())
                .or_insert_with(|| layout.clone());
            descriptors.insert(event.type_id, CodecDescriptor::build(event, layout));
            ids.push(event.type_id);
        }

        Ok(Self {
            descriptors,
            ids,
            layouts,
        })
    }

    /// O(1) descriptor lookup by event identifier.
    pub fn get(&self, type_id: u32) -> Option<&CodecDescriptor> {
        self.descriptors.get(&type_id)
    }

    /// Descriptors in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CodecDescriptor> {
        self.ids.iter().map(|id| &self.descriptors[id])
    }

    /// Unique layout records keyed by struct name.
    pub fn layouts(&self) -> &BTreeMap<String, LayoutRecord> {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::EventSchema;

    fn table(json: &str) -> CodecTable {
        CodecTable::compile(&EventSchema::from_json_str(json).unwrap()).unwrap()
    }

    #[test]
    fn format_rendering_matches_pack_convention() {
        let t = table(
            r#"{"structs": [
                {"eventId": 8, "enumName": "SPRITE_TEXTURE_LOAD", "name": "PackedTextureLoadHeaderEvent",
                 "isDynamic": true,
                 "members": [
                    {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                    {"name": "filenameLength", "type": "u32"},
                    {"name": "_padding", "type": "u32"}
                 ]},
                {"eventId": 200, "enumName": "WINDOW_TITLE", "name": "PackedWindowTitleEvent",
                 "members": [{"name": "title", "type": "char[256]"}]}
            ]}"#,
        );

        let texture = t.get(8).unwrap();
        assert_eq!(texture.format, "<qqI4x");
        assert_eq!(texture.fixed_size, 24);
        assert_eq!(texture.keys, vec!["id1", "id2", "filenameLength"]);
        assert!(texture.is_dynamic());

        let title = t.get(200).unwrap();
        assert_eq!(title.format, "<256s");
        assert_eq!(title.fixed_size, 256);
    }

    #[test]
    fn single_byte_padding_renders_bare_x() {
        let t = table(
            r#"{"structs": [
                {"eventId": 100, "enumName": "INPUT_KEYUP", "name": "PackedKeyEvent",
                 "members": [
                    {"name": "scancode", "type": "i32"}, {"name": "keycode", "type": "u32"},
                    {"name": "mod", "type": "u16"}, {"name": "isRepeat", "type": "u8"},
                    {"name": "_padding", "type": "u8"}
                 ]}
            ]}"#,
        );
        let key = t.get(100).unwrap();
        assert_eq!(key.format, "<iIHBx");
        assert_eq!(key.fixed_size, 12);
        assert_eq!(key.keys.len(), 4);
    }

    #[test]
    fn expected_values_counts_blobs_not_lengths() {
        let t = table(
            r#"{"structs": [
                {"eventId": 301, "enumName": "TEXT_SET_STRING", "name": "PackedTextSetStringEvent",
                 "isDynamic": true,
                 "members": [
                    {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                    {"name": "textLength", "type": "u32"},
                    {"name": "_padding", "type": "u32"}
                 ]}
            ]}"#,
        );
        // id1, id2, then the raw text blob; textLength is encoder-computed.
        assert_eq!(t.get(301).unwrap().expected_values(), 3);
    }

    #[test]
    fn iteration_is_identifier_ordered() {
        let t = table(
            r#"{"structs": [
                {"eventId": 2000, "enumName": "CAMERA_SET_POSITION", "name": "PackedCameraSetPositionEvent",
                 "members": [{"name": "positionX", "type": "f64"}, {"name": "positionY", "type": "f64"}]},
                {"eventId": 1, "enumName": "SPRITE_REMOVE", "name": "PackedSpriteRemoveEvent",
                 "members": [{"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"}]}
            ]}"#,
        );
        let ids: Vec<u32> = t.iter().map(|d| d.type_id).collect();
        assert_eq!(ids, vec![1, 2000]);
        assert_eq!(t.len(), 2);
    }
}
