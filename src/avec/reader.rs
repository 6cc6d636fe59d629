//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{fs, io::Read, path::Path, vec::Vec};

use crate::sans::Diagnostics;

use super::{Document, Error, Kind, Options, slice};

/// Decode a document of a kind from a reader, labelled with its source.
///
/// The reader is read to its end before decoding begins.
///
/// This method is also re-exported as `landmark::avec::decode_reader`.
pub fn decode(
    r: &mut impl Read,
    kind: Kind,
    source: &str,
    options: &Options,
    d: &mut dyn Diagnostics,
) -> Result<Document, Error> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;

    slice::decode(&buf, kind, source, options, d)
}

/// Decode the document in a file, choosing its kind by extension.
///
/// The path is used as the document's source.
pub fn decode_file(
    path: impl AsRef<Path>,
    options: &Options,
    d: &mut dyn Diagnostics,
) -> Result<Document, Error> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_default();
    let kind = Kind::from_extension(&extension).ok_or_else(|| Error::Extension(extension.into()))?;

    let buf = fs::read(path)?;

    slice::decode(&buf, kind, &path.to_string_lossy(), options, d)
}
