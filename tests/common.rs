#![allow(dead_code)]

use std::fmt::Arguments;

use landmark::sans::Diagnostics;

pub const NODE_MAGIC: i32 = 0x0001_5555;
pub const ENTRY_LIST: i32 = 0x0002_5555;
pub const ENTRY_TABLE: i32 = 0x0004_5555;
pub const DATA_MAGIC: i32 = 0x0010_5555;
pub const ADDITIONAL_MAGIC: i32 = 0x0020_5555;

/// A metadata value to encode.
pub enum Val<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(&'a [u8]),
    Str(&'a str),
}

/// Big-endian writer for building fixtures.
#[derive(Default)]
pub struct Writer(pub Vec<u8>);

impl Writer {
    pub fn pos(&self) -> usize {
        self.0.len()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.bytes(&v.to_be_bytes())
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    pub fn patch_u64(&mut self, at: usize, v: u64) -> &mut Self {
        self.0[at..at + 8].copy_from_slice(&v.to_be_bytes());
        self
    }

    /// Metadata of a format revision.
    pub fn metadata(&mut self, entries: &[(&str, Val)], revision: u8) -> &mut Self {
        self.i32(entries.len() as i32);

        for (name, value) in entries {
            self.i32(name.len() as i32).bytes(name.as_bytes());
            match value {
                Val::Bool(v) => self.i32(-1).u8(*v as u8),
                Val::Int(v) => self.i32(-2).i64(*v),
                Val::Float(v) => self.i32(-3).f64(*v),
                Val::Bytes(v) => self.i32(-4).i32(v.len() as i32).bytes(v),
                Val::Str(v) => self.i32(v.len() as i32).bytes(v.as_bytes()),
            };
        }

        if revision >= 3 {
            self.i32(0);
        }
        if revision >= 2 {
            self.i32(-1);
        }

        self
    }

    /// Legacy location holding elevation and time only.
    pub fn legacy_location(&mut self, lon: i32, lat: i32, elevation: i32, time: i64) -> &mut Self {
        self.i32(20).i32(lon).i32(lat).i32(elevation).i64(time)
    }

    /// Modern location with raw tagged fields.
    pub fn modern_location(&mut self, lon: i32, lat: i32, fields: &[u8]) -> &mut Self {
        self.i32(8 + fields.len() as i32)
            .i32(lon)
            .i32(lat)
            .bytes(fields)
    }

    /// Archive header pointing to a root node patched in later.
    pub fn archive(&mut self) -> &mut Self {
        self.i32(0x4C44_4B3A).i32(1).u64(0).zeros(32)
    }

    pub fn set_root(&mut self, root: u64) -> &mut Self {
        self.patch_u64(8, root)
    }

    /// Node metadata followed by a node in table form.
    ///
    /// Returns the node's offset.
    pub fn node(&mut self, name: Option<&str>, children: &[(u64, u32)], data: &[(u64, u32)]) -> u64 {
        let metadata = self.pos() as u64;
        self.zeros(0x20);
        match name {
            Some(name) => self.metadata(&[("name", Val::Str(name))], 2),
            None => self.metadata(&[], 2),
        };

        let at = self.pos() as u64;
        self.i32(NODE_MAGIC).i32(0).u64(metadata).u64(0);
        self.i32(ENTRY_TABLE)
            .i32(children.len() as i32)
            .i32(data.len() as i32);
        for (pointer, uid) in children.iter().chain(data) {
            self.u64(*pointer).u32(*uid);
        }

        at
    }

    /// Data block followed by its chain of additional blocks.
    ///
    /// Returns the block's offset.
    pub fn data_block(&mut self, main: &[u8], additional: &[&[u8]]) -> u64 {
        let mut next = 0;
        for block in additional.iter().rev() {
            let at = self.pos() as u64;
            self.i32(ADDITIONAL_MAGIC)
                .i64(block.len() as i64)
                .u64(next)
                .bytes(block);
            next = at;
        }

        let total = main.len() + additional.iter().map(|b| b.len()).sum::<usize>();

        let at = self.pos() as u64;
        self.i32(DATA_MAGIC)
            .i32(0)
            .i64(total as i64)
            .i64(main.len() as i64)
            .u64(next)
            .bytes(main);

        at
    }
}

/// A legacy waypoint file named "Summit".
pub fn legacy_point() -> Vec<u8> {
    let mut w = Writer::default();
    w.i32(2).i32(4).bytes(&[0xAA; 4]);
    w.metadata(&[("name", Val::Str("Summit"))], 1);
    w.legacy_location(123_456_789, 467_891_234, 1_234_567, 1_600_000_000_123);
    w.0
}

/// Diagnostics receiver collecting warnings.
#[derive(Default)]
pub struct Collect(pub Vec<String>);

impl Diagnostics for Collect {
    fn warn(&mut self, offset: usize, message: Arguments<'_>) {
        self.0.push(format!("{offset:#x}: {message}"));
    }
}
