//! Slice-based decoder implementation.

use crate::sans::{Diagnostics, cursor::Cursor};

use super::{Document, Error, Kind, Options, container, record};

/// Decode a document of a kind from a slice, labelled with its source.
///
/// This method is also re-exported as `landmark::avec::decode_slice`.
pub fn decode(
    r: &[u8],
    kind: Kind,
    source: &str,
    options: &Options,
    d: &mut dyn Diagnostics,
) -> Result<Document, Error> {
    let mut cursor = Cursor::new(r);

    match kind {
        Kind::Container => container::decode(&mut cursor, source, options, d),
        kind => record::decode(&mut cursor, kind, source, d),
    }
}
