//! Cursor-level decoders for the building blocks of landmark files.
//!
//! This module is intended for applications that need fine control over
//! decoding. See [`crate::avec`] for the record and container decoders built on
//! top of it.
//!
//! # Architecture
//!
//! Every decoder reads from a [`Cursor`](cursor::Cursor) positioned at the
//! start of its structure, and leaves it positioned immediately after. All
//! integers are big-endian. Values the format marks absent with a sentinel are
//! decoded into `None` at this layer, so nothing above it ever compares against
//! a sentinel.
//!
//! Recoverable anomalies are reported to a [`Diagnostics`] receiver passed
//! into each call rather than to a global logger. Anything else ends decoding
//! with an [`Error`].

use thiserror::Error;

pub mod cursor;
pub mod diagnostics;
pub mod location;
pub mod metadata;
pub mod scalar;

pub use diagnostics::{Diagnostics, Log};

/// Errors occurring while decoding a building block.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Unexpectedly reached the end of the buffer.
    #[error("Unexpectedly reached the end of the buffer ({needed} bytes needed at {offset:#x}, {remaining} remaining).")]
    EndOfBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// Found a negative length or count.
    #[error("Found a negative {what} ({value}).")]
    Length { what: &'static str, value: i64 },
    /// Found an unknown metadata entry type.
    #[error("Found an unknown metadata entry type ({0}).")]
    MetadataType(i32),
    /// Found unsupported extended metadata.
    #[error("Found unsupported extended metadata ({0} segments).")]
    ExtendedMetadata(i32),
    /// Location structure too small for the fields it holds.
    #[error("Location structure size ({size}) cannot hold its fields ({needed} bytes).")]
    LocationSize { size: i32, needed: i32 },
}
