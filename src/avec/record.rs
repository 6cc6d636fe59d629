//! Decoders for waypoint, set, route, area and track files.
//!
//! Every record file begins with a version and a header size. Legacy files
//! follow these with a technical block of that size; modern files follow them
//! with a technical metadata block instead. User metadata comes next, then
//! geometry specific to the kind.

use alloc::{string::String, vec::Vec};

use tartan_bitfield::bitfield;

use crate::sans::{
    Diagnostics,
    cursor::Cursor,
    location::{Layout, Location},
    metadata::Metadata,
};

use super::{Document, Error, Kind, Payload, Segment, Waypoint};

/// Marker in the top bits of a modern version header.
const MODERN_MARKER: u16 = 0x505;

/// Decode a raw version header.
///
/// Modern headers carry a marker in their top bits and a revision in their low
/// byte, and decode to the revision plus 100. Anything else is a legacy
/// version, used as is.
pub fn version(raw: i32) -> i32 {
    bitfield! {
        struct VersionHeader(u32) {
            [0..8] revision: u8,
            [20..32] marker: u16,
        }
    }

    let header = VersionHeader(raw as u32);

    if header.marker() == MODERN_MARKER {
        100 + i32::from(header.revision())
    } else {
        raw
    }
}

/// Structure choices implied by a file version.
#[derive(Debug, Clone, Copy)]
struct Format {
    version: i32,
}

impl Format {
    fn is_modern(self) -> bool {
        self.version > 100
    }

    fn metadata_revision(self) -> u8 {
        if self.is_modern() {
            (self.version - 100) as u8
        } else {
            1
        }
    }

    fn layout(self) -> Layout {
        if self.is_modern() {
            Layout::Modern
        } else {
            Layout::Legacy
        }
    }
}

/// Decode a record file of a kind, labelled with its source.
pub fn decode(
    r: &mut Cursor,
    kind: Kind,
    source: &str,
    d: &mut dyn Diagnostics,
) -> Result<Document, Error> {
    let version = version(r.i32()?);

    let accepted = kind.record_versions();
    if !accepted.contains(&version) {
        Err(Error::Version {
            kind,
            found: version,
            accepted,
        })?;
    }

    let format = Format { version };
    let header_size = r.length("header size")?;

    d.trace(
        r.position(),
        format_args!("decoding {kind} version {version}"),
    );

    if format.is_modern() {
        Metadata::decode(r, format.metadata_revision(), d)?;
    } else {
        r.skip(header_size)?;
    }

    let metadata = Metadata::decode(r, format.metadata_revision(), d)?;

    let payload = match kind {
        Kind::Point => Payload::Point(Location::decode(r, format.layout(), d)?),
        Kind::Set => Payload::Set(waypoints(r, format, d)?),
        Kind::Route => Payload::Route(waypoints(r, format, d)?),
        Kind::Area => Payload::Area(locations(r, format, d)?),
        Kind::Track => {
            let waypoints = waypoints(r, format, d)?;

            let count = r.length("segment count")?;
            let mut segments = Vec::new();
            for _ in 0..count {
                segments.push(segment(r, format, d)?);
            }

            Payload::Track {
                waypoints,
                segments,
            }
        }
        Kind::Container => Err(Error::Version {
            kind,
            found: version,
            accepted,
        })?,
    };

    Ok(Document {
        source: String::from(source),
        version,
        timestamp: payload.first_time(),
        metadata,
        payload,
    })
}

fn waypoints(
    r: &mut Cursor,
    format: Format,
    d: &mut dyn Diagnostics,
) -> Result<Vec<Waypoint>, Error> {
    let count = r.length("waypoint count")?;

    let mut waypoints = Vec::new();
    for _ in 0..count {
        let metadata = Metadata::decode(r, format.metadata_revision(), d)?;
        let location = Location::decode(r, format.layout(), d)?;
        waypoints.push(Waypoint { metadata, location });
    }

    Ok(waypoints)
}

fn locations(
    r: &mut Cursor,
    format: Format,
    d: &mut dyn Diagnostics,
) -> Result<Vec<Location>, Error> {
    let count = r.length("location count")?;

    let mut locations = Vec::new();
    for _ in 0..count {
        locations.push(Location::decode(r, format.layout(), d)?);
    }

    Ok(locations)
}

fn segment(r: &mut Cursor, format: Format, d: &mut dyn Diagnostics) -> Result<Segment, Error> {
    let metadata = if format.is_modern() {
        Some(Metadata::decode(r, format.metadata_revision(), d)?)
    } else {
        // Legacy segment marker.
        r.i32()?;
        None
    };

    let locations = locations(r, format, d)?;

    Ok(Segment {
        metadata,
        locations,
    })
}
