//! Document model and decoders for whole landmark files.
//!
//! The functions in this module decode a buffer of a known [`Kind`] into a
//! [`Document`]. Decoding either succeeds completely or fails with an
//! [`Error`]; no partial document is ever returned.
//!
//! Each decode call is independent and shares no state, so independent files
//! may be decoded concurrently. See the `batch` module (_requires Cargo
//! feature `rayon`_) for a ready-made parallel decoder.

#[cfg(feature = "rayon")]
pub mod batch;
pub mod container;
#[cfg(feature = "std")]
pub mod reader;
pub mod record;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::{decode as decode_reader, decode_file};
pub use slice::decode as decode_slice;

pub use container::{ContainerNode, DataEntry};

use alloc::{string::String, vec::Vec};
use core::fmt;

use thiserror::Error;

use crate::sans::{self, location::Location, metadata::Metadata};

/// Errors occurring while decoding a document.
#[derive(Debug, Error)]
pub enum Error {
    /// An error decoding a building block.
    #[error(transparent)]
    Decode(#[from] sans::Error),
    /// Incorrect magic number.
    #[error("Incorrect {what} magic ({found:#010x}, expected {expected:#010x}).")]
    Magic {
        what: &'static str,
        found: i32,
        expected: i32,
    },
    /// Unsupported container archive version.
    #[error("Unsupported archive version ({found}, expected {expected}).")]
    ArchiveVersion { found: i32, expected: i32 },
    /// Unsupported file version for a kind.
    #[error("Unsupported {kind} version ({found}, accepted {accepted:?}).")]
    Version {
        kind: Kind,
        found: i32,
        accepted: &'static [i32],
    },
    /// A container node or block refers back to itself.
    #[error("Found a cycle through the structure at {pointer:#x}.")]
    Cycle { pointer: u64 },
    /// Two container entries refer to the same node or block.
    #[error("Found more than one reference to the structure at {pointer:#x}.")]
    Shared { pointer: u64 },
    /// Unknown entry table form.
    #[error("Unknown entry table form ({found:#010x}, expected 0x00025555 or 0x00045555).")]
    EntryForm { found: i32 },
    /// Container nodes nest deeper than allowed.
    #[error("Container nodes nest deeper than {limit} levels.")]
    Depth { limit: usize },
    /// Unknown file extension.
    #[cfg(feature = "std")]
    #[error("Unknown landmark file extension ({0:?}).")]
    Extension(String),
    /// An error from the supplied reader.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Decoding limits.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Maximum nesting of container nodes below the root.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// One of the landmark file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Kind {
    /// A single waypoint (`.wpt`).
    Point,
    /// A set of waypoints (`.set`).
    Set,
    /// A route through waypoints (`.rte`).
    Route,
    /// A closed area (`.are`).
    Area,
    /// A recorded track (`.trk`).
    Track,
    /// A tree of landmark files (`.ldk`).
    Container,
}

impl Kind {
    /// The kind of a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        [
            Self::Point,
            Self::Set,
            Self::Route,
            Self::Area,
            Self::Track,
            Self::Container,
        ]
        .into_iter()
        .find(|k| k.extension().eq_ignore_ascii_case(ext))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Point => "wpt",
            Self::Set => "set",
            Self::Route => "rte",
            Self::Area => "are",
            Self::Track => "trk",
            Self::Container => "ldk",
        }
    }

    /// The kind of a file embedded in a container, from its type tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0x65 => Self::Point,
            0x66 => Self::Set,
            0x67 => Self::Route,
            0x68 => Self::Track,
            0x69 => Self::Area,
            _ => None?,
        })
    }

    /// File versions a record decoder accepts for this kind.
    pub fn record_versions(self) -> &'static [i32] {
        match self {
            Self::Point | Self::Set | Self::Route | Self::Area => &[2, 101, 102, 103],
            Self::Track => &[2, 3, 101, 102, 103],
            Self::Container => &[],
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Point => "waypoint",
            Self::Set => "waypoint set",
            Self::Route => "route",
            Self::Area => "area",
            Self::Track => "track",
            Self::Container => "container",
        })
    }
}

/// A decoded landmark file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Label of the input, usually its path.
    pub source: String,
    /// File version, after remapping modern version markers.
    pub version: i32,
    /// Time of the first timed location, in seconds since the Unix epoch.
    pub timestamp: Option<f64>,
    /// User metadata. For containers, that of the root node.
    pub metadata: Metadata,
    pub payload: Payload,
}

impl Document {
    pub fn kind(&self) -> Kind {
        match self.payload {
            Payload::Point(_) => Kind::Point,
            Payload::Set(_) => Kind::Set,
            Payload::Route(_) => Kind::Route,
            Payload::Area(_) => Kind::Area,
            Payload::Track { .. } => Kind::Track,
            Payload::Container(_) => Kind::Container,
        }
    }
}

/// Geometry of a document, by kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Payload {
    Point(Location),
    Set(Vec<Waypoint>),
    Route(Vec<Waypoint>),
    Area(Vec<Location>),
    Track {
        waypoints: Vec<Waypoint>,
        segments: Vec<Segment>,
    },
    Container(ContainerNode),
}

impl Payload {
    /// Time of the first timed location, in geometry order.
    fn first_time(&self) -> Option<f64> {
        fn first<'a>(mut locations: impl Iterator<Item = &'a Location>) -> Option<f64> {
            locations.find_map(|l| l.time)
        }

        match self {
            Self::Point(location) => location.time,
            Self::Set(waypoints) | Self::Route(waypoints) => {
                first(waypoints.iter().map(|w| &w.location))
            }
            Self::Area(locations) => first(locations.iter()),
            Self::Track {
                waypoints,
                segments,
            } => first(segments.iter().flat_map(|s| &s.locations))
                .or_else(|| first(waypoints.iter().map(|w| &w.location))),
            Self::Container(_) => None,
        }
    }
}

/// A location with its own metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Waypoint {
    pub metadata: Metadata,
    pub location: Location,
}

/// A continuous stretch of a track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    /// Segment metadata, present in modern files only.
    pub metadata: Option<Metadata>,
    pub locations: Vec<Location>,
}
