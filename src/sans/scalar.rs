//! Fixed-width primitives and the scaled domain types built from them.
//!
//! Absent values are encoded with a per-type sentinel. The conversion functions
//! here map each sentinel to `None`; the raw integer is never exposed.

use alloc::{string::String, vec::Vec};

use super::{Error, cursor::Cursor};

/// Raw elevation marking an absent value.
pub const ELEVATION_ABSENT: i32 = -999_999_999;
/// Raw pressure marking an absent value.
pub const PRESSURE_ABSENT: i32 = 999_999_999;

/// Degrees from a coordinate in units of 1e-7 degrees.
pub fn coordinate(raw: i32) -> f64 {
    raw as f64 / 1e7
}

/// Meters from an elevation in millimeters.
pub fn elevation(raw: i32) -> Option<f64> {
    (raw != ELEVATION_ABSENT).then(|| raw as f64 / 1e3)
}

/// Seconds since the epoch from a timestamp in milliseconds.
pub fn timestamp(raw: i64) -> Option<f64> {
    (raw != 0).then(|| raw as f64 / 1e3)
}

/// Meters from a coarse accuracy in meters.
pub fn accuracy(raw: i32) -> Option<f64> {
    (raw != 0).then_some(raw as f64)
}

/// Meters from a fine accuracy in centimeters.
pub fn fine_accuracy(raw: i32) -> Option<f64> {
    (raw != 0).then(|| raw as f64 / 1e2)
}

/// Kilopascals from a pressure in pascals.
pub fn pressure(raw: i32) -> Option<f64> {
    (raw != PRESSURE_ABSENT).then(|| raw as f64 / 1e3)
}

macro_rules! primitive {
    ($name:ident, $t:ty, $(#[$attr:meta])*) => {
        $(#[$attr])*
        pub fn $name(&mut self) -> Result<$t, Error> {
            Ok(<$t>::from_be_bytes(self.take()?))
        }
    };
}

impl Cursor<'_> {
    primitive!(u8, u8, /** Read an unsigned byte. */);
    primitive!(i8, i8, /** Read a signed byte. */);
    primitive!(i32, i32, /** Read a 4-byte signed integer. */);
    primitive!(i64, i64, /** Read an 8-byte signed integer. */);
    primitive!(f64, f64, /** Read an 8-byte float. */);
    primitive!(pointer, u64, /** Read an absolute offset into the buffer. */);

    /// Read a boolean stored as a single byte.
    pub fn bool(&mut self) -> Result<bool, Error> {
        Ok(self.i8()? != 0)
    }

    /// Read a 4-byte length, failing if it is negative.
    pub fn length(&mut self, what: &'static str) -> Result<usize, Error> {
        let value = self.i32()?;
        usize::try_from(value).map_err(|_| Error::Length {
            what,
            value: value.into(),
        })
    }

    /// Read a string of a given byte length, replacing invalid UTF-8.
    pub fn string(&mut self, len: usize) -> Result<String, Error> {
        Ok(String::from_utf8_lossy(self.read(len)?).into_owned())
    }

    /// Read a blob of a given byte length.
    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        Ok(self.read(len)?.to_vec())
    }

    pub fn coordinate(&mut self) -> Result<f64, Error> {
        Ok(coordinate(self.i32()?))
    }

    pub fn elevation(&mut self) -> Result<Option<f64>, Error> {
        Ok(elevation(self.i32()?))
    }

    pub fn timestamp(&mut self) -> Result<Option<f64>, Error> {
        Ok(timestamp(self.i64()?))
    }

    pub fn accuracy(&mut self) -> Result<Option<f64>, Error> {
        Ok(accuracy(self.i32()?))
    }

    pub fn fine_accuracy(&mut self) -> Result<Option<f64>, Error> {
        Ok(fine_accuracy(self.i32()?))
    }

    pub fn pressure(&mut self) -> Result<Option<f64>, Error> {
        Ok(pressure(self.i32()?))
    }
}
