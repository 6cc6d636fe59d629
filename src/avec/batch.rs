//! Parallel decoding of independent inputs.
//!
//! _Requires Cargo feature `rayon`._
//!
//! Each input is decoded on its own with a [`Log`] diagnostics receiver, and
//! yields its own result: one failing input does not affect the others.

use std::{path::Path, vec::Vec};

use rayon::prelude::*;

use crate::sans::Log;

use super::{Document, Error, Kind, Options, reader, slice};

/// An input held in memory.
#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    pub kind: Kind,
    pub source: &'a str,
    pub bytes: &'a [u8],
}

/// Decode inputs in parallel, returning results in input order.
pub fn decode_all(inputs: &[Input<'_>], options: &Options) -> Vec<Result<Document, Error>> {
    inputs
        .par_iter()
        .map(|i| slice::decode(i.bytes, i.kind, i.source, options, &mut Log))
        .collect()
}

/// Decode files in parallel, returning results in input order.
pub fn decode_files<P>(paths: &[P], options: &Options) -> Vec<Result<Document, Error>>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|p| reader::decode_file(p, options, &mut Log))
        .collect()
}
