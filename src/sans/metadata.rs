//! Ordered, named, typed key/value entries.
//!
//! Metadata is stored as an entry count followed by entries, each a
//! length-prefixed name and a type discriminator. Non-negative discriminators
//! are the byte length of a string value; negative ones select a fixed type.
//!
//! Later revisions of the format append fields after the entries:
//!
//! - Revision 2 adds an extended metadata count, which must not be positive.
//! - Revision 3 adds an unused integer before it, unless the entry count was
//! the "no entries" marker (`-1`).

use alloc::{string::String, vec::Vec};
use core::slice;

use super::{Diagnostics, Error, cursor::Cursor};

const BOOL: i32 = -1;
const INT: i32 = -2;
const FLOAT: i32 = -3;
const BYTES: i32 = -4;

/// Entry count marking metadata with no entries.
const NONE: i32 = -1;

/// A typed metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A named metadata value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entry {
    pub name: String,
    pub value: Value,
}

/// Metadata entries with unique names, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Metadata(Vec<Entry>);

impl Metadata {
    /// Decode metadata of a format revision.
    pub fn decode(
        r: &mut Cursor,
        revision: u8,
        d: &mut dyn Diagnostics,
    ) -> Result<Self, Error> {
        let mut metadata = Self::default();

        let count = r.i32()?;
        let entries = match count {
            NONE => 0,
            n => usize::try_from(n).map_err(|_| Error::Length {
                what: "metadata entry count",
                value: n.into(),
            })?,
        };

        for _ in 0..entries {
            let at = r.position();

            let len = r.length("metadata name length")?;
            let name = r.string(len)?;

            let value = match r.i32()? {
                BOOL => Value::Bool(r.bool()?),
                INT => Value::Int(r.i64()?),
                FLOAT => Value::Float(r.f64()?),
                BYTES => {
                    let len = r.length("metadata blob length")?;
                    Value::Bytes(r.bytes(len)?)
                }
                len @ 0..=i32::MAX => Value::String(r.string(len as usize)?),
                other => Err(Error::MetadataType(other))?,
            };

            if metadata.get(&name).is_some() {
                d.warn(at, format_args!("replacing duplicate metadata entry {name:?}"));
            }

            metadata.insert(name, value);
        }

        if revision >= 3 && count != NONE {
            r.i32()?;
        }

        if revision >= 2 {
            let extended = r.i32()?;
            if extended > 0 {
                Err(Error::ExtendedMetadata(extended))?;
            }
        }

        Ok(metadata)
    }

    /// Insert a value, replacing (in place) any entry of the same name.
    ///
    /// Returns the replaced value.
    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        match self.0.iter_mut().find(|e| e.name == name) {
            Some(entry) => Some(core::mem::replace(&mut entry.value, value)),
            None => {
                self.0.push(Entry { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    /// The `name` entry, if it holds a string.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    pub fn iter(&self) -> slice::Iter<'_, Entry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = &'a Entry;
    type IntoIter = slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
