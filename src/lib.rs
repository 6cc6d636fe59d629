#![no_std]

//! A decoder for AlpineQuest landmark files.
//!
//! Landmark provides a document model for the six landmark formats (waypoint,
//! waypoint set, route, area, track, and the hierarchical LDK container), and
//! exposes the cursor-level building blocks it is made of for applications
//! needing finer control over decoding.
//!
//! Most users should begin with the functions in the [`avec`] module. If these
//! prove insufficient, the metadata and location decoders in the [`sans`]
//! module can be driven directly over a [`sans::cursor::Cursor`].
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader and file based decoding (default).
//! - `serde`: derive `Serialize` for the document model.
//! - `rayon`: enable parallel decoding of independent inputs.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod sans;

pub use avec::{Document, Kind, Options, Payload};
