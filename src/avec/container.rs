//! Decoder for LDK container files.
//!
//! A container is a tree of nodes stored in a flat buffer. Structures refer to
//! each other by pointer, an absolute byte offset into the buffer:
//!
//! - The archive header, at offset zero, points to the root node.
//! - A node points to its metadata, and is followed by an entry table pointing
//! to its child nodes and data blocks.
//! - A data block holds the start of an embedded file, and points to a chain
//! of additional blocks holding the rest.
//!
//! The first byte of an embedded file is a tag giving its [`Kind`], and the
//! remainder is a landmark file in its own right.
//!
//! Nothing in the format prevents a pointer from referring back to an
//! enclosing node, or two entries from sharing a target. The decoder rejects
//! cycles, decodes each node and block at most once, and bounds nesting depth.
//!
//! Two limitations are inherited from the format's known producers:
//!
//! - The list form of an entry table may point to a block of further entries.
//! This block is not followed; a diagnostic is emitted when it is present.
//! - Node metadata is located at a fixed offset (`0x20`) past its pointer,
//! skipping a sub-header that is not otherwise decoded.

use alloc::{
    collections::BTreeSet,
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use either::Either::{self, Left, Right};
use zerocopy::{
    FromBytes,
    byteorder::big_endian::{I32, I64, U32, U64},
};

use crate::sans::{Diagnostics, cursor::Cursor, metadata::Metadata};

use super::{Document, Error, Kind, Options, Payload, record};

const ARCHIVE_MAGIC: i32 = 0x4C44_4B3A;
const ARCHIVE_VERSION: i32 = 1;
const NODE_MAGIC: i32 = 0x0001_5555;
const ENTRY_LIST: i32 = 0x0002_5555;
const ENTRY_TABLE: i32 = 0x0004_5555;
const DATA_MAGIC: i32 = 0x0010_5555;
const ADDITIONAL_MAGIC: i32 = 0x0020_5555;

/// Offset of node metadata past the node's metadata pointer.
const METADATA_OFFSET: u64 = 0x20;
/// Metadata revision used by container nodes.
const METADATA_REVISION: u8 = 2;

#[repr(C)]
#[derive(FromBytes)]
struct ArchiveHeader {
    magic: I32,
    version: I32,
    root: U64,
    _reserved: [U64; 4],
}

#[repr(C)]
#[derive(FromBytes)]
struct NodeHeader {
    magic: I32,
    _flags: I32,
    metadata: U64,
    _reserved: U64,
}

#[repr(C)]
#[derive(FromBytes)]
struct EntryList {
    _total: I32,
    children: I32,
    data: I32,
    additional: U64,
}

#[repr(C)]
#[derive(FromBytes)]
struct EntryTable {
    children: I32,
    data: I32,
}

#[repr(C)]
#[derive(FromBytes)]
struct EntryPointer {
    pointer: U64,
    uid: U32,
}

#[repr(C)]
#[derive(FromBytes)]
struct DataHeader {
    magic: I32,
    _flags: I32,
    total: I64,
    main: I64,
    next: U64,
}

#[repr(C)]
#[derive(FromBytes)]
struct AdditionalHeader {
    magic: I32,
    size: I64,
    next: U64,
}

/// A node of a container tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContainerNode {
    /// Absolute path of the node, `/` for the root.
    pub path: String,
    /// Identifier from the parent's entry table, absent for the root.
    pub uid: Option<u32>,
    /// Position in the parent's child entries.
    pub index: usize,
    pub metadata: Metadata,
    /// Child nodes, in entry order.
    pub children: Vec<ContainerNode>,
    /// Embedded files, in entry order.
    pub data: Vec<DataEntry>,
}

impl ContainerNode {
    /// Iterate over this node and its descendants, depth-first in entry order.
    pub fn walk(&self) -> impl Iterator<Item = &ContainerNode> {
        let mut stack = vec![self];

        core::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Decode every typed embedded file in this subtree.
    ///
    /// A failure decoding one file does not affect the others.
    pub fn documents(&self, d: &mut dyn Diagnostics) -> Vec<(&str, Result<Document, Error>)> {
        let mut documents = Vec::new();

        for entry in self.walk().flat_map(|n| &n.data) {
            if let Some(document) = entry.decode(d) {
                documents.push((entry.name.as_str(), document));
            }
        }

        documents
    }
}

/// A file embedded in a container node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataEntry {
    /// File name synthesized from the container name, node path and uid.
    pub name: String,
    pub uid: u32,
    /// Position in the node's data entries.
    pub index: usize,
    /// Kind given by the type tag, absent for untyped binary data.
    pub kind: Option<Kind>,
    /// The assembled blocks, including the type tag.
    pub payload: Vec<u8>,
}

impl DataEntry {
    /// The embedded file, without its type tag.
    pub fn content(&self) -> &[u8] {
        self.payload.get(1..).unwrap_or_default()
    }

    /// Decode the embedded file, if it is typed.
    pub fn decode(&self, d: &mut dyn Diagnostics) -> Option<Result<Document, Error>> {
        let kind = self.kind?;
        let mut r = Cursor::new(self.content());
        Some(record::decode(&mut r, kind, &self.name, d))
    }
}

/// Decode a container file, labelled with its source.
///
/// The source's file name, without its extension, prefixes the names of
/// embedded files.
pub fn decode(
    r: &mut Cursor,
    source: &str,
    options: &Options,
    d: &mut dyn Diagnostics,
) -> Result<Document, Error> {
    r.seek(0);

    let ArchiveHeader {
        magic,
        version,
        root,
        ..
    } = zerocopy::transmute!(r.take::<48>()?);

    expect_magic("archive", magic.get(), ARCHIVE_MAGIC)?;

    if version.get() != ARCHIVE_VERSION {
        Err(Error::ArchiveVersion {
            found: version.get(),
            expected: ARCHIVE_VERSION,
        })?;
    }

    let mut tree = Tree {
        r: r.clone(),
        base: base_name(source),
        options,
        d,
        active: BTreeSet::new(),
        visited: BTreeSet::new(),
    };

    let root = tree.node(root.get(), "/".to_string(), None, 0, 0)?;
    *r = tree.r;

    Ok(Document {
        source: String::from(source),
        version: ARCHIVE_VERSION,
        timestamp: None,
        metadata: root.metadata.clone(),
        payload: Payload::Container(root),
    })
}

/// Entry table targets, as (pointer, uid) pairs.
type Pointers = Vec<(u64, u32)>;

/// State of a tree traversal.
struct Tree<'a, 'o> {
    r: Cursor<'a>,
    base: &'o str,
    options: &'o Options,
    d: &'o mut dyn Diagnostics,
    /// Nodes on the path from the root to the node being decoded.
    active: BTreeSet<u64>,
    /// Every node and block decoded so far.
    visited: BTreeSet<u64>,
}

impl Tree<'_, '_> {
    /// Decode the node at a pointer and its subtree.
    ///
    /// The path is that of the parent for child nodes, or `/` for the root.
    fn node(
        &mut self,
        pointer: u64,
        parent: String,
        uid: Option<u32>,
        index: usize,
        depth: usize,
    ) -> Result<ContainerNode, Error> {
        if depth > self.options.max_depth {
            Err(Error::Depth {
                limit: self.options.max_depth,
            })?;
        }

        if !self.active.insert(pointer) {
            Err(Error::Cycle { pointer })?;
        }
        self.visit(pointer)?;

        self.seek(pointer);

        let NodeHeader {
            magic, metadata, ..
        } = zerocopy::transmute!(self.r.take::<24>()?);

        expect_magic("node", magic.get(), NODE_MAGIC)?;

        let resume = self.r.position();
        self.seek(metadata.get().saturating_add(METADATA_OFFSET));
        let metadata = Metadata::decode(&mut self.r, METADATA_REVISION, self.d)?;
        self.r.seek(resume);

        let path = match uid {
            None => parent,
            Some(uid) => {
                let name = match metadata.name() {
                    Some(name) => name.to_string(),
                    None => format!("UID{uid:08X}"),
                };
                join(&parent, &name)
            }
        };

        self.d.trace(pointer as usize, format_args!("decoding node {path:?}"));

        let (children, data) = self.entries()?;

        let mut node = ContainerNode {
            path,
            uid,
            index,
            metadata,
            children: Vec::with_capacity(children.len()),
            data: Vec::with_capacity(data.len()),
        };

        for (index, (pointer, uid)) in data.into_iter().enumerate() {
            let entry = self.data(pointer, uid, index, &node.path)?;
            node.data.push(entry);
        }

        for (index, (pointer, uid)) in children.into_iter().enumerate() {
            let child = self.node(pointer, node.path.clone(), Some(uid), index, depth + 1)?;
            node.children.push(child);
        }

        self.active.remove(&pointer);

        Ok(node)
    }

    /// Decode an entry table at the cursor.
    ///
    /// Returns the (pointer, uid) pairs of child nodes and of data blocks.
    fn entries(&mut self) -> Result<(Pointers, Pointers), Error> {
        let at = self.r.position();

        let header: Either<EntryList, EntryTable> = match self.r.i32()? {
            ENTRY_LIST => Left(zerocopy::transmute!(self.r.take::<20>()?)),
            ENTRY_TABLE => Right(zerocopy::transmute!(self.r.take::<8>()?)),
            found => Err(Error::EntryForm { found })?,
        };

        if let Left(EntryList { additional, .. }) = &header
            && additional.get() != 0
        {
            self.d.warn(
                at,
                format_args!(
                    "not following additional entry block at {:#x}",
                    additional.get()
                ),
            );
        }

        let (children, data) = either::for_both!(&header, h => (h.children.get(), h.data.get()));

        let children = self.pointers(count("child entry count", children)?)?;
        let data = self.pointers(count("data entry count", data)?)?;

        Ok((children, data))
    }

    fn pointers(&mut self, count: usize) -> Result<Pointers, Error> {
        let mut pointers = Vec::new();

        for _ in 0..count {
            let EntryPointer { pointer, uid } = zerocopy::transmute!(self.r.take::<12>()?);
            pointers.push((pointer.get(), uid.get()));
        }

        Ok(pointers)
    }

    /// Decode the data block at a pointer, following its additional blocks.
    fn data(&mut self, pointer: u64, uid: u32, index: usize, path: &str) -> Result<DataEntry, Error> {
        self.visit(pointer)?;
        self.seek(pointer);

        let DataHeader {
            magic,
            total,
            main,
            mut next,
            ..
        } = zerocopy::transmute!(self.r.take::<32>()?);

        expect_magic("data block", magic.get(), DATA_MAGIC)?;

        let main = size("data block size", main.get())?;
        let mut payload = self.r.read(main)?.to_vec();

        let mut chain = BTreeSet::from([pointer]);

        while next.get() != 0 {
            let at = next.get();
            if !chain.insert(at) {
                Err(Error::Cycle { pointer: at })?;
            }
            self.visit(at)?;

            self.seek(at);

            let AdditionalHeader {
                magic,
                size: block,
                next: successor,
            } = zerocopy::transmute!(self.r.take::<20>()?);

            expect_magic("additional block", magic.get(), ADDITIONAL_MAGIC)?;

            let block = size("additional block size", block.get())?;
            payload.extend_from_slice(self.r.read(block)?);

            next = successor;
        }

        if total.get() != payload.len() as i64 {
            self.d.warn(
                pointer as usize,
                format_args!(
                    "data block declares {} bytes but holds {}",
                    total.get(),
                    payload.len()
                ),
            );
        }

        let kind = payload.first().copied().and_then(Kind::from_tag);

        let extension = kind.map_or("bin", Kind::extension);
        let mut prefix = path.replace('/', "_");
        if !path.ends_with('/') {
            prefix.push('_');
        }

        Ok(DataEntry {
            name: format!("{}{prefix}{uid:08X}.{extension}", self.base),
            uid,
            index,
            kind,
            payload,
        })
    }

    /// Record a node or block as decoded, failing if it already was.
    fn visit(&mut self, pointer: u64) -> Result<(), Error> {
        if !self.visited.insert(pointer) {
            Err(Error::Shared { pointer })?;
        }

        Ok(())
    }

    fn seek(&mut self, pointer: u64) {
        self.r.seek(usize::try_from(pointer).unwrap_or(usize::MAX));
    }
}

fn expect_magic(what: &'static str, found: i32, expected: i32) -> Result<(), Error> {
    if found != expected {
        Err(Error::Magic {
            what,
            found,
            expected,
        })?;
    }

    Ok(())
}

fn count(what: &'static str, value: i32) -> Result<usize, Error> {
    size(what, value.into())
}

fn size(what: &'static str, value: i64) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| crate::sans::Error::Length { what, value }.into())
}

/// Path of a child named `name` under `parent`.
fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// File name of a source label, without directories or extension.
fn base_name(source: &str) -> &str {
    let name = source.rsplit(['/', '\\']).next().unwrap_or(source);

    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
