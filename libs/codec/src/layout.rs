//! Layout compilation: schema records → byte-exact layout contracts.
//!
//! The walk is deterministic and referentially transparent on struct name:
//! compiling the same record twice always yields the same offsets, and two
//! events sharing a struct name must compile to the identical layout (a
//! divergence is a schema error, detected by [`compile_all`]).

use std::collections::BTreeMap;

use schema::{EventRecord, EventSchema, PrimitiveType};

use crate::error::LayoutError;

/// Byte placement of one member inside a record's fixed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLayout {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    /// Padding members occupy bytes but are excluded from queryable fields.
    pub padding: bool,
}

/// One (length field, variable blob) pair of a dynamic record, in declared
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicTail {
    pub length_field: String,
    /// Width of the length field, needed to bound encoded blob lengths.
    pub length_type: PrimitiveType,
    pub payload_field: String,
}

/// Derived layout contract for one record shape.
///
/// `fixed_size` covers every declared member and excludes the variable
/// blobs: a dynamic record's blob begins at `fixed_size` and is not counted
/// toward it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRecord {
    pub struct_name: String,
    pub fixed_size: usize,
    pub members: Vec<MemberLayout>,
    pub dynamic_tails: Vec<DynamicTail>,
}

impl LayoutRecord {
    /// Whether this record carries a variable-length tail.
    pub fn is_dynamic(&self) -> bool {
        !self.dynamic_tails.is_empty()
    }
}

/// Compile one event record into its layout contract.
///
/// Offsets are tight: each member adds `width × repeat` to the running
/// offset, with no alignment padding anywhere. Dynamic tails are recognized
/// only on records the schema explicitly flags; a flagged record without a
/// single `<X>Length` member is malformed.
pub fn compile(event: &EventRecord) -> Result<LayoutRecord, LayoutError> {
    let mut members = Vec::with_capacity(event.members.len());
    let mut offset = 0usize;
    for member in &event.members {
        let size = member.byte_len();
        members.push(MemberLayout {
            name: member.name.clone(),
            offset,
            size,
            padding: member.is_padding(),
        });
        offset += size;
    }

    let mut dynamic_tails = Vec::new();
    if event.is_dynamic {
        for member in &event.members {
            let Some(target) = member.length_field_target() else {
                continue;
            };
            if !member.ty.is_unsigned_int() {
                return Err(LayoutError::BadLengthField {
                    event: event.name.clone(),
                    field: member.name.clone(),
                    type_spec: member.ty.as_str(),
                });
            }
            dynamic_tails.push(DynamicTail {
                length_field: member.name.clone(),
                length_type: member.ty,
                payload_field: target.to_string(),
            });
        }
        if dynamic_tails.is_empty() {
            return Err(LayoutError::MissingLengthField {
                event: event.name.clone(),
            });
        }
    }

    Ok(LayoutRecord {
        struct_name: event.struct_name.clone(),
        fixed_size: offset,
        members,
        dynamic_tails,
    })
}

/// Compile every record in the schema, verifying struct-name referential
/// transparency along the way.
///
/// Returns layouts keyed by event identifier. If two events declare the same
/// struct name with different member lists, compilation fails with
/// [`LayoutError::StructConflict`] and no layouts are produced.
pub fn compile_all(event_schema: &EventSchema) -> Result<BTreeMap<u32, LayoutRecord>, LayoutError> {
    let mut layouts = BTreeMap::new();
    let mut by_struct: BTreeMap<String, (String, LayoutRecord)> = BTreeMap::new();

    for event in event_schema.events() {
        let layout = compile(event)?;
        match by_struct.get(&event.struct_name) {
            None => {
                by_struct.insert(
                    event.struct_name.clone(),
                    (event.name.clone(), layout.clone()),
                );
            }
            Some((first_event, first_layout)) => {
                if first_layout.members != layout.members {
                    return Err(LayoutError::StructConflict {
                        struct_name: event.struct_name.clone(),
                        first: first_event.clone(),
                        second: event.name.clone(),
                    });
                }
            }
        }
        layouts.insert(event.type_id, layout);
    }

    Ok(layouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::EventSchema;

    fn schema(json: &str) -> EventSchema {
        EventSchema::from_json_str(json).unwrap()
    }

    #[test]
    fn tight_offsets_no_padding_inserted() {
        // i64 i64 u8 u8 u8 u8 _padding:u32 → 24 bytes, byte-tight.
        let s = schema(
            r#"{"structs": [
                {"eventId": 6, "enumName": "SPRITE_COLOR", "name": "PackedSpriteColorEvent",
                 "members": [
                    {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                    {"name": "r", "type": "u8"}, {"name": "g", "type": "u8"},
                    {"name": "b", "type": "u8"}, {"name": "a", "type": "u8"},
                    {"name": "_padding", "type": "u32"}
                 ]}
            ]}"#,
        );
        let layout = compile(&s.events()[0]).unwrap();
        assert_eq!(layout.fixed_size, 24);
        let offsets: Vec<usize> = layout.members.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 17, 18, 19, 20]);
        assert!(layout.members[6].padding);
        assert!(!layout.is_dynamic());
    }

    #[test]
    fn odd_fixed_sizes_are_legal() {
        // The format is byte-tight even when the total is unaligned.
        let s = schema(
            r#"{"structs": [
                {"eventId": 54, "enumName": "GEOM_ADD_PACKED", "name": "PackedGeomAddPackedHeaderEvent",
                 "members": [
                    {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                    {"name": "z", "type": "f64"},
                    {"name": "r", "type": "u8"}, {"name": "g", "type": "u8"},
                    {"name": "b", "type": "u8"}, {"name": "a", "type": "u8"},
                    {"name": "isScreenSpace", "type": "u8"},
                    {"name": "_padding", "type": "u16"},
                    {"name": "primitiveType", "type": "u32"},
                    {"name": "count", "type": "u32"}
                 ]}
            ]}"#,
        );
        let layout = compile(&s.events()[0]).unwrap();
        assert_eq!(layout.fixed_size, 39);
    }

    #[test]
    fn dynamic_tails_in_declared_order() {
        let s = schema(
            r#"{"structs": [
                {"eventId": 300, "enumName": "TEXT_ADD", "name": "PackedTextAddEvent", "isDynamic": true,
                 "members": [
                    {"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"},
                    {"name": "fontSize", "type": "f32"},
                    {"name": "fontPathLength", "type": "u32"},
                    {"name": "textLength", "type": "u32"},
                    {"name": "_padding2", "type": "u32"}
                 ]}
            ]}"#,
        );
        let layout = compile(&s.events()[0]).unwrap();
        // The blob begins at fixed_size; the trailing padding still counts.
        assert_eq!(layout.fixed_size, 32);
        assert_eq!(layout.dynamic_tails.len(), 2);
        assert_eq!(layout.dynamic_tails[0].payload_field, "fontPath");
        assert_eq!(layout.dynamic_tails[1].payload_field, "text");
    }

    #[test]
    fn flagged_dynamic_without_length_field_rejected() {
        let s = schema(
            r#"{"structs": [
                {"eventId": 1, "enumName": "BROKEN", "name": "PackedBrokenEvent", "isDynamic": true,
                 "members": [{"name": "id1", "type": "i64"}]}
            ]}"#,
        );
        let err = compile(&s.events()[0]).unwrap_err();
        assert!(matches!(err, LayoutError::MissingLengthField { .. }));
    }

    #[test]
    fn signed_length_field_rejected() {
        let s = schema(
            r#"{"structs": [
                {"eventId": 1, "enumName": "BROKEN", "name": "PackedBrokenEvent", "isDynamic": true,
                 "members": [{"name": "pathLength", "type": "i32"}]}
            ]}"#,
        );
        let err = compile(&s.events()[0]).unwrap_err();
        assert!(matches!(err, LayoutError::BadLengthField { .. }));
    }

    #[test]
    fn divergent_struct_names_rejected() {
        let s = schema(
            r#"{"structs": [
                {"eventId": 100, "enumName": "INPUT_KEYUP", "name": "PackedKeyEvent",
                 "members": [{"name": "scancode", "type": "i32"}]},
                {"eventId": 101, "enumName": "INPUT_KEYDOWN", "name": "PackedKeyEvent",
                 "members": [{"name": "scancode", "type": "i64"}]}
            ]}"#,
        );
        let err = compile_all(&s).unwrap_err();
        assert_eq!(
            err,
            LayoutError::StructConflict {
                struct_name: "PackedKeyEvent".to_string(),
                first: "INPUT_KEYUP".to_string(),
                second: "INPUT_KEYDOWN".to_string(),
            }
        );
    }

    #[test]
    fn identical_shared_structs_accepted() {
        let s = schema(
            r#"{"structs": [
                {"eventId": 550, "enumName": "PHYSICS_COLLISION_BEGIN", "name": "PackedPhysicsCollisionEvent",
                 "members": [{"name": "id1_A", "type": "i64"}, {"name": "id2_A", "type": "i64"},
                             {"name": "id1_B", "type": "i64"}, {"name": "id2_B", "type": "i64"}]},
                {"eventId": 551, "enumName": "PHYSICS_COLLISION_SEPARATE", "name": "PackedPhysicsCollisionEvent",
                 "members": [{"name": "id1_A", "type": "i64"}, {"name": "id2_A", "type": "i64"},
                             {"name": "id1_B", "type": "i64"}, {"name": "id2_B", "type": "i64"}]}
            ]}"#,
        );
        let layouts = compile_all(&s).unwrap();
        assert_eq!(layouts[&550], layouts[&551]);
        assert_eq!(layouts[&550].fixed_size, 32);
    }
}
