//! The schema model: event records, members, and schema-source loading.
//!
//! The schema document is the compiler's only input. It is deserialized from
//! JSON into raw records, validated once (fail fast — a malformed schema must
//! never reach any emitter), and frozen into an [`EventSchema`].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::types::PrimitiveType;
use crate::{SchemaError, LENGTH_FIELD_SUFFIX, PADDING_PREFIX};

/// One member of an event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Field name as authored (camelCase by convention).
    pub name: String,
    pub ty: PrimitiveType,
    /// Element count for byte/char arrays; `None` for scalars.
    pub repeat: Option<u32>,
    /// Free-text documentation carried into generated output.
    pub doc: String,
}

impl Member {
    /// Serialized size: `repeat × element width`, byte-tight, no padding.
    pub fn byte_len(&self) -> usize {
        self.ty.width() * self.repeat.unwrap_or(1) as usize
    }

    /// Padding members serialize as zero bytes and are excluded from the
    /// queryable key set.
    pub fn is_padding(&self) -> bool {
        self.name.starts_with(PADDING_PREFIX)
    }

    /// If this member follows the `<X>Length` convention, the name of the
    /// variable blob it describes (`"fontPathLength"` → `"fontPath"`).
    pub fn length_field_target(&self) -> Option<&str> {
        let stem = self.name.strip_suffix(LENGTH_FIELD_SUFFIX)?;
        if stem.is_empty() {
            return None;
        }
        Some(stem)
    }
}

/// One schema-declared message shape.
///
/// `struct_name` names the underlying layout record and is deliberately not
/// unique: several identifiers may share one layout (e.g. key-up and key-down
/// both map to the same key-event struct).
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub type_id: u32,
    /// Symbolic identifier, unique within the schema (UPPER_SNAKE).
    pub name: String,
    pub struct_name: String,
    pub members: Vec<Member>,
    /// Schema-authored marker for records with a variable-length tail.
    pub is_dynamic: bool,
    pub doc: String,
}

/// The validated, immutable schema model.
#[derive(Debug, Clone)]
pub struct EventSchema {
    events: Vec<EventRecord>,
}

impl EventSchema {
    /// Load and validate a schema document from a JSON string.
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_json::from_str(source)?;
        Self::from_raw(raw)
    }

    /// Load and validate a schema document from a file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// All events, sorted by identifier.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Look up one event by identifier.
    pub fn get(&self, type_id: u32) -> Option<&EventRecord> {
        self.events
            .binary_search_by_key(&type_id, |e| e.type_id)
            .ok()
            .map(|i| &self.events[i])
    }

    /// Unique layout records, deduplicated by struct name and sorted by it.
    ///
    /// When several identifiers share a struct name, the first declaration
    /// wins here; whether the duplicates actually agree is the layout
    /// compiler's job to verify.
    pub fn unique_structs(&self) -> Vec<&EventRecord> {
        let mut seen: HashMap<&str, &EventRecord> = HashMap::new();
        for event in &self.events {
            seen.entry(&event.struct_name).or_insert(event);
        }
        let mut unique: Vec<&EventRecord> = seen.into_values().collect();
        unique.sort_by(|a, b| a.struct_name.cmp(&b.struct_name));
        unique
    }

    fn from_raw(raw: RawSchema) -> Result<Self, SchemaError> {
        if raw.structs.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut events = Vec::with_capacity(raw.structs.len());
        for raw_event in raw.structs {
            events.push(resolve_event(raw_event)?);
        }
        events.sort_by_key(|e: &EventRecord| e.type_id);

        // Identifiers and symbolic names must be unique across the schema.
        for pair in events.windows(2) {
            if pair[0].type_id == pair[1].type_id {
                return Err(SchemaError::DuplicateId {
                    type_id: pair[0].type_id,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        let mut names: HashMap<&str, ()> = HashMap::new();
        for event in &events {
            if names.insert(&event.name, ()).is_some() {
                return Err(SchemaError::DuplicateName {
                    name: event.name.clone(),
                });
            }
        }

        Ok(Self { events })
    }
}

fn resolve_event(raw: RawEvent) -> Result<EventRecord, SchemaError> {
    let mut members = Vec::with_capacity(raw.members.len());
    for raw_member in raw.members {
        members.push(resolve_member(&raw.enum_name, raw_member)?);
    }
    Ok(EventRecord {
        type_id: raw.event_id,
        name: raw.enum_name,
        struct_name: raw.name,
        members,
        is_dynamic: raw.is_dynamic,
        doc: raw.comment.unwrap_or_default(),
    })
}

fn resolve_member(event_name: &str, raw: RawMember) -> Result<Member, SchemaError> {
    let (ty, repeat) = match PrimitiveType::parse(&raw.type_spec) {
        Some((ty, Some(inline_count))) => {
            if raw.count.is_some() {
                return Err(SchemaError::UnexpectedCount {
                    name: event_name.to_string(),
                    member: raw.name,
                    type_spec: raw.type_spec,
                });
            }
            (ty, Some(inline_count))
        }
        Some((ty, None)) => match raw.count {
            // A separate count key is the alternate array spelling, valid
            // only for byte arrays.
            Some(count) if ty == PrimitiveType::U8 && count > 0 => (ty, Some(count)),
            Some(_) => {
                return Err(SchemaError::UnexpectedCount {
                    name: event_name.to_string(),
                    member: raw.name,
                    type_spec: raw.type_spec,
                })
            }
            None => (ty, None),
        },
        None if raw.type_spec == "char" => match raw.count {
            Some(count) if count > 0 => (PrimitiveType::CharBuf, Some(count)),
            _ => {
                return Err(SchemaError::MissingCount {
                    name: event_name.to_string(),
                    member: raw.name,
                })
            }
        },
        None => {
            return Err(SchemaError::UnknownType {
                name: event_name.to_string(),
                type_spec: raw.type_spec,
            })
        }
    };

    Ok(Member {
        name: raw.name,
        ty,
        repeat,
        doc: raw.comment.unwrap_or_default(),
    })
}

// Raw shapes mirroring the schema document. Field names follow the authored
// camelCase JSON keys.

#[derive(Debug, Deserialize)]
struct RawSchema {
    structs: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    event_id: u32,
    enum_name: String,
    /// Layout struct name (shared across identifiers with identical shape).
    name: String,
    #[serde(default)]
    is_dynamic: bool,
    comment: Option<String>,
    #[serde(default)]
    members: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    name: String,
    #[serde(rename = "type")]
    type_spec: String,
    count: Option<u32>,
    comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(json: &str) -> Result<EventSchema, SchemaError> {
        EventSchema::from_json_str(json)
    }

    #[test]
    fn loads_and_sorts_events() {
        let schema = minimal(
            r#"{"structs": [
                {"eventId": 201, "enumName": "WINDOW_RESIZE", "name": "PackedWindowResizeEvent",
                 "members": [{"name": "w", "type": "i32"}, {"name": "h", "type": "i32"}]},
                {"eventId": 1, "enumName": "SPRITE_REMOVE", "name": "PackedSpriteRemoveEvent",
                 "members": [{"name": "id1", "type": "i64"}, {"name": "id2", "type": "i64"}]}
            ]}"#,
        )
        .unwrap();

        let ids: Vec<u32> = schema.events().iter().map(|e| e.type_id).collect();
        assert_eq!(ids, vec![1, 201]);
        assert_eq!(schema.get(201).unwrap().name, "WINDOW_RESIZE");
        assert!(schema.get(7).is_none());
    }

    #[test]
    fn char_buffer_requires_count() {
        let err = minimal(
            r#"{"structs": [
                {"eventId": 200, "enumName": "WINDOW_TITLE", "name": "PackedWindowTitleEvent",
                 "members": [{"name": "title", "type": "char"}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::MissingCount { .. }));
    }

    #[test]
    fn inline_array_spec_is_accepted() {
        let schema = minimal(
            r#"{"structs": [
                {"eventId": 200, "enumName": "WINDOW_TITLE", "name": "PackedWindowTitleEvent",
                 "members": [{"name": "title", "type": "char[256]"}]}
            ]}"#,
        )
        .unwrap();
        let member = &schema.get(200).unwrap().members[0];
        assert_eq!(member.ty, PrimitiveType::CharBuf);
        assert_eq!(member.repeat, Some(256));
        assert_eq!(member.byte_len(), 256);
    }

    #[test]
    fn duplicate_identifiers_rejected() {
        let err = minimal(
            r#"{"structs": [
                {"eventId": 1, "enumName": "A", "name": "SA", "members": []},
                {"eventId": 1, "enumName": "B", "name": "SB", "members": []}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateId { type_id: 1, .. }));
    }

    #[test]
    fn unknown_type_rejected() {
        let err = minimal(
            r#"{"structs": [
                {"eventId": 1, "enumName": "A", "name": "SA",
                 "members": [{"name": "ptr", "type": "usize"}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
    }

    #[test]
    fn padding_and_length_conventions() {
        let member = Member {
            name: "_padding1".to_string(),
            ty: PrimitiveType::U32,
            repeat: None,
            doc: String::new(),
        };
        assert!(member.is_padding());
        assert_eq!(member.length_field_target(), None);

        let member = Member {
            name: "fontPathLength".to_string(),
            ty: PrimitiveType::U32,
            repeat: None,
            doc: String::new(),
        };
        assert_eq!(member.length_field_target(), Some("fontPath"));

        // A bare "Length" has an empty stem and is a plain field.
        let member = Member {
            name: "Length".to_string(),
            ty: PrimitiveType::U32,
            repeat: None,
            doc: String::new(),
        };
        assert_eq!(member.length_field_target(), None);
    }

    #[test]
    fn shared_struct_names_deduplicate() {
        let schema = minimal(
            r#"{"structs": [
                {"eventId": 100, "enumName": "INPUT_KEYUP", "name": "PackedKeyEvent",
                 "members": [{"name": "scancode", "type": "i32"}]},
                {"eventId": 101, "enumName": "INPUT_KEYDOWN", "name": "PackedKeyEvent",
                 "members": [{"name": "scancode", "type": "i32"}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(schema.events().len(), 2);
        assert_eq!(schema.unique_structs().len(), 1);
    }
}
