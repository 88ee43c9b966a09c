//! The shipped reference schema must compile and reproduce the known wire
//! contract for every record shape.

use codec::CodecTable;
use schema::{Category, EventSchema};

fn reference() -> EventSchema {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../schemas/events.json");
    EventSchema::from_json_file(path).unwrap()
}

#[test]
fn reference_schema_compiles() {
    let table = CodecTable::compile(&reference()).unwrap();
    assert!(table.len() >= 30);
}

#[test]
fn known_formats_and_sizes_hold() {
    let table = CodecTable::compile(&reference()).unwrap();
    let cases: &[(u32, &str, usize)] = &[
        (0, "<qqdddddddddddBBBB4xdd", 128),
        (1, "<qq", 16),
        (2, "<qqddd", 40),
        (6, "<qqBBBB4x", 24),
        (8, "<qqI4x", 24),
        (10, "<qqffff", 32),
        (50, "<qqdBBBBB3xff", 40),
        (52, "<qqdBBBBB3xffff", 48),
        (100, "<iIHBx", 12),
        (102, "<ffBB2x", 12),
        (104, "<ffff", 16),
        (200, "<256s", 256),
        (201, "<ii", 8),
        (300, "<qqdddBBBB4xfII4x", 64),
        (301, "<qqI4x", 24),
        (400, "<I", 4),
        (403, "<x", 1),
        (408, "<Qf4x", 16),
        (500, "<qqddBBB5xddddd", 80),
        (550, "<qqqq", 32),
        (552, "<qqddddddB7x", 72),
        (1001, "<II", 8),
        (1005, "<B3xI", 8),
        (2000, "<dd", 16),
        (3000, "<I4x", 8),
    ];
    for (id, format, size) in cases {
        let d = table.get(*id).unwrap();
        assert_eq!(&d.format, format, "event {id}");
        assert_eq!(d.fixed_size, *size, "event {id}");
    }
}

#[test]
fn dynamic_events_are_exactly_the_header_records() {
    let table = CodecTable::compile(&reference()).unwrap();
    let dynamic: Vec<u32> = table
        .iter()
        .filter(|d| d.is_dynamic())
        .map(|d| d.type_id)
        .collect();
    assert_eq!(dynamic, vec![8, 300, 301, 400, 1001]);

    let text_add = table.get(300).unwrap();
    let tails: Vec<(&str, &str)> = text_add
        .dynamic_tails
        .iter()
        .map(|t| (t.length_field.as_str(), t.payload_field.as_str()))
        .collect();
    assert_eq!(
        tails,
        vec![("fontPathLength", "fontPath"), ("textLength", "text")]
    );
}

#[test]
fn shared_structs_deduplicate() {
    let table = CodecTable::compile(&reference()).unwrap();
    assert_eq!(
        table.get(550).unwrap().struct_name,
        table.get(551).unwrap().struct_name
    );
    assert_eq!(
        table.get(52).unwrap().struct_name,
        table.get(53).unwrap().struct_name
    );
    // Four event pairs share a struct, so four fewer unique layouts.
    assert_eq!(table.layouts().len(), table.len() - 4);
}

#[test]
fn every_identifier_maps_to_a_named_category() {
    for event in reference().events() {
        assert_ne!(
            Category::of(event.type_id),
            Category::Unknown,
            "event {} ({}) fell outside the category ranges",
            event.name,
            event.type_id
        );
    }
}
