mod common;

use common::{ADDITIONAL_MAGIC, Collect, DATA_MAGIC, ENTRY_LIST, NODE_MAGIC, Val, Writer};
use landmark::{
    Document, Kind, Options, Payload,
    avec::{self, ContainerNode, Error},
    sans::{Diagnostics, Log},
};

fn decode_with(data: &[u8], options: &Options, d: &mut dyn Diagnostics) -> Result<Document, Error> {
    avec::decode_slice(data, Kind::Container, "maps/trip.ldk", options, d)
}

fn decode(data: &[u8]) -> Result<Document, Error> {
    decode_with(data, &Options::default(), &mut Log)
}

fn root(document: &Document) -> &ContainerNode {
    match &document.payload {
        Payload::Container(root) => root,
        _ => panic!("expected a container"),
    }
}

#[test]
fn chained_blocks_are_concatenated() {
    let main = [0x01, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    let additional = [10, 11, 12, 13, 14];

    let mut w = Writer::default();
    w.archive();
    let data = w.data_block(&main, &[&additional]);
    let child = w.node(Some("Peaks"), &[], &[(data, 0xABCD)]);
    let top = w.node(None, &[(child, 0x10)], &[]);
    w.set_root(top);

    let document = decode(&w.0).unwrap();
    let root = root(&document);

    assert_eq!(document.kind(), Kind::Container);
    assert_eq!(root.path, "/");
    assert_eq!(root.uid, None);
    assert!(root.data.is_empty());

    let [child] = root.children.as_slice() else {
        panic!("expected one child");
    };
    assert_eq!(child.path, "/Peaks");
    assert_eq!(child.uid, Some(0x10));
    assert_eq!(child.metadata.name(), Some("Peaks"));

    let [entry] = child.data.as_slice() else {
        panic!("expected one data entry");
    };
    assert_eq!(entry.payload, [&main[..], &additional[..]].concat());
    assert_eq!(entry.kind, None);
    assert_eq!(entry.content(), &entry.payload[1..]);
    assert_eq!(entry.name, "trip_Peaks_0000ABCD.bin");
}

#[test]
fn entries_follow_table_order_not_offsets() {
    let mut w = Writer::default();
    w.archive();
    let late = w.data_block(&[0x01, b'b'], &[]);
    let early = w.data_block(&[0x01, b'a'], &[]);
    let second = w.node(Some("Second"), &[], &[]);
    let first = w.node(Some("First"), &[], &[]);
    let top = w.node(
        Some("Root"),
        &[(first, 1), (second, 2)],
        &[(early, 3), (late, 4)],
    );
    w.set_root(top);

    assert!(early > late && first > second);

    let document = decode(&w.0).unwrap();
    let root = root(&document);

    let children: Vec<_> = root.children.iter().map(|c| (c.index, c.path.as_str())).collect();
    assert_eq!(children, [(0, "/First"), (1, "/Second")]);

    let data: Vec<_> = root.data.iter().map(|e| (e.index, e.payload[1])).collect();
    assert_eq!(data, [(0, b'a'), (1, b'b')]);
}

#[test]
fn unnamed_nodes_use_uid() {
    let mut w = Writer::default();
    w.archive();
    let data = w.data_block(&[0x68], &[]);
    let inner = w.node(None, &[], &[(data, 0x42)]);
    let outer = w.node(Some("Trips"), &[(inner, 0xBEEF)], &[]);
    let top = w.node(None, &[(outer, 1)], &[]);
    w.set_root(top);

    let document = decode(&w.0).unwrap();
    let entry = &root(&document).children[0].children[0].data[0];

    assert_eq!(entry.kind, Some(Kind::Track));
    assert_eq!(entry.name, "trip_Trips_UID0000BEEF_00000042.trk");
}

#[test]
fn embedded_files_decode_independently() {
    let mut point = vec![0x65];
    point.extend(common::legacy_point());

    let mut broken = vec![0x66];
    broken.extend([0, 0, 0, 9]);

    let mut w = Writer::default();
    w.archive();
    let good = w.data_block(&point[..8], &[&point[8..]]);
    let bad = w.data_block(&broken, &[]);
    let opaque = w.data_block(&[0x7F, 0], &[]);
    let top = w.node(None, &[], &[(good, 1), (bad, 2), (opaque, 3)]);
    w.set_root(top);

    let document = decode(&w.0).unwrap();
    let documents = root(&document).documents(&mut Log);

    assert_eq!(documents.len(), 2);

    let (name, point) = &documents[0];
    assert_eq!(*name, "trip_00000001.wpt");
    let point = point.as_ref().unwrap();
    assert_eq!(point.source, "trip_00000001.wpt");
    assert_eq!(point.metadata.name(), Some("Summit"));

    let (name, broken) = &documents[1];
    assert_eq!(*name, "trip_00000002.set");
    assert!(matches!(broken, Err(Error::Version { found: 9, .. })));
}

#[test]
fn walk_is_depth_first_in_entry_order() {
    let mut w = Writer::default();
    w.archive();
    let c = w.node(Some("c"), &[], &[]);
    let b = w.node(Some("b"), &[], &[]);
    let a = w.node(Some("a"), &[(b, 2)], &[]);
    let top = w.node(None, &[(a, 1), (c, 3)], &[]);
    w.set_root(top);

    let document = decode(&w.0).unwrap();
    let paths: Vec<_> = root(&document).walk().map(|n| n.path.as_str()).collect();

    assert_eq!(paths, ["/", "/a", "/a/b", "/c"]);
}

#[test]
fn wrong_archive_magic_fails() {
    let mut w = Writer::default();
    w.i32(0x1234_5678).i32(1).zeros(40);

    let err = decode(&w.0).unwrap_err();

    assert!(matches!(
        err,
        Error::Magic {
            what: "archive",
            found: 0x1234_5678,
            expected: 0x4C44_4B3A,
        }
    ));
    assert_eq!(
        err.to_string(),
        "Incorrect archive magic (0x12345678, expected 0x4c444b3a)."
    );
}

#[test]
fn wrong_archive_version_fails() {
    let mut w = Writer::default();
    w.i32(0x4C44_4B3A).i32(2).zeros(40);

    assert!(matches!(
        decode(&w.0),
        Err(Error::ArchiveVersion {
            found: 2,
            expected: 1
        })
    ));
}

#[test]
fn wrong_block_magic_fails() {
    let mut w = Writer::default();
    w.archive();
    let data = w.pos() as u64;
    w.i32(NODE_MAGIC).i32(0).i64(1).i64(1).u64(0).u8(0x65);
    let top = w.node(None, &[], &[(data, 1)]);
    w.set_root(top);

    assert!(matches!(
        decode(&w.0),
        Err(Error::Magic {
            what: "data block",
            expected: DATA_MAGIC,
            ..
        })
    ));
}

#[test]
fn node_cycle_fails() {
    let mut w = Writer::default();
    w.archive();
    let top = w.node(None, &[(0, 1)], &[]);
    w.patch_u64(top as usize + 36, top);
    w.set_root(top);

    assert!(matches!(decode(&w.0), Err(Error::Cycle { pointer }) if pointer == top));
}

#[test]
fn additional_block_cycle_fails() {
    let mut w = Writer::default();
    w.archive();
    let additional = w.pos() as u64;
    w.i32(ADDITIONAL_MAGIC).i64(1).u64(additional).u8(0);
    let data = w.pos() as u64;
    w.i32(DATA_MAGIC).i32(0).i64(2).i64(1).u64(additional).u8(0x01);
    let top = w.node(None, &[], &[(data, 1)]);
    w.set_root(top);

    assert!(matches!(
        decode(&w.0),
        Err(Error::Cycle { pointer }) if pointer == additional
    ));
}

#[test]
fn shared_child_fails() {
    let mut w = Writer::default();
    w.archive();
    let mut child = w.node(None, &[], &[]);
    for _ in 0..32 {
        child = w.node(None, &[(child, 1), (child, 2)], &[]);
    }
    w.set_root(child);

    assert!(matches!(decode(&w.0), Err(Error::Shared { .. })));
}

#[test]
fn shared_data_block_fails() {
    let mut w = Writer::default();
    w.archive();
    let data = w.data_block(&[0x01; 64], &[]);
    let top = w.node(None, &[], &[(data, 1), (data, 2)]);
    w.set_root(top);

    let err = decode(&w.0).unwrap_err();

    assert!(matches!(err, Error::Shared { pointer } if pointer == data));
}

#[test]
fn shared_additional_block_fails() {
    let mut w = Writer::default();
    w.archive();
    let additional = w.pos() as u64;
    w.i32(ADDITIONAL_MAGIC).i64(1).u64(0).u8(0);
    let first = w.pos() as u64;
    w.i32(DATA_MAGIC).i32(0).i64(2).i64(1).u64(additional).u8(0x01);
    let second = w.pos() as u64;
    w.i32(DATA_MAGIC).i32(0).i64(2).i64(1).u64(additional).u8(0x01);
    let top = w.node(None, &[], &[(first, 1), (second, 2)]);
    w.set_root(top);

    assert!(matches!(
        decode(&w.0),
        Err(Error::Shared { pointer }) if pointer == additional
    ));
}

#[test]
fn unknown_entry_form_fails() {
    let mut w = Writer::default();
    w.archive();
    let metadata = w.pos() as u64;
    w.zeros(0x20).metadata(&[], 2);
    let top = w.pos() as u64;
    w.i32(NODE_MAGIC).i32(0).u64(metadata).u64(0);
    w.i32(0x0008_5555).i32(0).i32(0);
    w.set_root(top);

    let err = decode(&w.0).unwrap_err();

    assert!(matches!(err, Error::EntryForm { found: 0x0008_5555 }));
    assert_eq!(
        err.to_string(),
        "Unknown entry table form (0x00085555, expected 0x00025555 or 0x00045555)."
    );
}

#[test]
fn depth_is_bounded() {
    let mut w = Writer::default();
    w.archive();
    let grandchild = w.node(None, &[], &[]);
    let child = w.node(None, &[(grandchild, 2)], &[]);
    let top = w.node(None, &[(child, 1)], &[]);
    w.set_root(top);

    let shallow = Options { max_depth: 1 };
    assert!(matches!(
        decode_with(&w.0, &shallow, &mut Log),
        Err(Error::Depth { limit: 1 })
    ));

    let deep = Options { max_depth: 2 };
    assert!(decode_with(&w.0, &deep, &mut Log).is_ok());
}

#[test]
fn list_form_entries_and_overflow_block() {
    let mut w = Writer::default();
    w.archive();
    let data = w.data_block(&[0x69], &[]);

    let metadata = w.pos() as u64;
    w.zeros(0x20).metadata(&[("name", Val::Str("Root"))], 2);

    let top = w.pos() as u64;
    w.i32(NODE_MAGIC).i32(0).u64(metadata).u64(0);
    w.i32(ENTRY_LIST).i32(3).i32(0).i32(1).u64(0x9999);
    w.u64(data).u32(7);
    w.zeros(24);
    w.set_root(top);

    let mut diagnostics = Collect::default();
    let document = decode_with(&w.0, &Options::default(), &mut diagnostics).unwrap();
    let root = root(&document);

    assert_eq!(document.metadata.name(), Some("Root"));
    assert_eq!(root.data.len(), 1);
    assert_eq!(root.data[0].kind, Some(Kind::Area));
    assert_eq!(root.data[0].name, "trip_00000007.are");
    assert_eq!(diagnostics.0.len(), 1);
    assert!(diagnostics.0[0].contains("0x9999"));
}

#[test]
fn size_mismatch_is_reported() {
    let mut w = Writer::default();
    w.archive();
    let data = w.pos() as u64;
    w.i32(DATA_MAGIC).i32(0).i64(5).i64(2).u64(0).bytes(&[0x65, 0]);
    let top = w.node(None, &[], &[(data, 1)]);
    w.set_root(top);

    let mut diagnostics = Collect::default();
    let document = decode_with(&w.0, &Options::default(), &mut diagnostics).unwrap();

    assert_eq!(root(&document).data[0].payload.len(), 2);
    assert_eq!(
        diagnostics.0,
        [format!("{data:#x}: data block declares 5 bytes but holds 2")]
    );
}
