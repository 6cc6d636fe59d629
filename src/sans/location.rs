//! Geographic position records.
//!
//! A location starts with its structure size (excluding the size field
//! itself), then longitude and latitude. What follows depends on the layout:
//!
//! - The legacy layout holds elevation and time, then accuracy and pressure
//! only if the structure size is large enough to contain them.
//! - The modern layout holds a sequence of tagged fields, each a one-byte tag
//! followed by a value of a size fixed per tag. Decoding stops at the first
//! unknown tag; the rest of the structure is skipped.

use zerocopy::FromBytes;

use super::{Diagnostics, Error, cursor::Cursor};

const FINE_ACCURACY: u8 = 0x61;
const BATTERY: u8 = 0x62;
const ELEVATION: u8 = 0x65;
const CELLULAR: u8 = 0x6e;
const PRESSURE: u8 = 0x70;
const SATELLITES: u8 = 0x73;
const TIME: u8 = 0x74;
const VERTICAL_ACCURACY: u8 = 0x76;

/// Size of longitude and latitude.
const POSITION_SIZE: i32 = 8;

/// Field layout of a location record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed fields, used by legacy files.
    Legacy,
    /// Tagged fields, used by modern files.
    Modern,
}

/// A geographic position and the measurements taken with it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Location {
    /// Degrees east.
    pub longitude: f64,
    /// Degrees north.
    pub latitude: f64,
    /// Meters.
    pub elevation: Option<f64>,
    /// Seconds since the Unix epoch.
    pub time: Option<f64>,
    /// Horizontal accuracy in meters.
    pub accuracy: Option<f64>,
    /// Vertical accuracy in meters.
    pub vertical_accuracy: Option<f64>,
    /// Barometric pressure in kilopascals.
    pub pressure: Option<f64>,
    /// Battery charge in percent.
    pub battery: Option<u8>,
    pub cellular: Option<Cellular>,
    pub satellites: Option<Satellites>,
}

/// Cellular network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cellular {
    /// Network generation (2 for 2G, and so on).
    pub generation: u8,
    pub protocol: u8,
    pub signal: u8,
}

/// Satellites in view, per constellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Satellites {
    pub unknown: u8,
    pub gps: u8,
    pub glonass: u8,
    pub galileo: u8,
    pub beidou: u8,
    pub qzss: u8,
    pub sbas: u8,
    /// Sum of all counts.
    pub total: u16,
}

impl Location {
    /// Decode a location of a layout.
    pub fn decode(r: &mut Cursor, layout: Layout, d: &mut dyn Diagnostics) -> Result<Self, Error> {
        let size = r.i32()?;

        let longitude = r.coordinate()?;
        let latitude = r.coordinate()?;

        let mut location = Self {
            longitude,
            latitude,
            ..Self::default()
        };

        let leftover = match layout {
            Layout::Legacy => location.decode_fixed(r, size)?,
            Layout::Modern => location.decode_tags(r, size)?,
        };

        if leftover != 0 {
            d.warn(
                r.position(),
                format_args!("skipping {leftover} unrecognized location bytes"),
            );
            r.skip(leftover)?;
        }

        Ok(location)
    }

    /// Decode the fixed fields following the position.
    ///
    /// Returns the number of bytes of the structure left unread.
    fn decode_fixed(&mut self, r: &mut Cursor, size: i32) -> Result<usize, Error> {
        const BASE: i32 = POSITION_SIZE + 4 + 8;
        const WITH_ACCURACY: i32 = BASE + 4;
        const WITH_PRESSURE: i32 = WITH_ACCURACY + 4;

        if size < BASE {
            Err(Error::LocationSize { size, needed: BASE })?;
        }

        self.elevation = r.elevation()?;
        self.time = r.timestamp()?;

        if size > BASE {
            if size < WITH_ACCURACY {
                Err(Error::LocationSize {
                    size,
                    needed: WITH_ACCURACY,
                })?;
            }
            self.accuracy = r.accuracy()?;
        }

        if size > WITH_ACCURACY {
            if size < WITH_PRESSURE {
                Err(Error::LocationSize {
                    size,
                    needed: WITH_PRESSURE,
                })?;
            }
            self.pressure = r.pressure()?;
        }

        Ok((size - size.min(WITH_PRESSURE)) as usize)
    }

    /// Decode tagged fields following the position, for a structure of a
    /// declared size.
    ///
    /// Stops before the first unknown tag, leaving it unread. Returns the
    /// number of bytes of the structure left unread.
    pub fn decode_tags(&mut self, r: &mut Cursor, size: i32) -> Result<usize, Error> {
        if size < POSITION_SIZE {
            Err(Error::LocationSize {
                size,
                needed: POSITION_SIZE,
            })?;
        }

        let mut budget = (size - POSITION_SIZE) as usize;

        while budget > 0 {
            let at = r.position();
            let tag = r.u8()?;

            let Some(len) = field_size(tag) else {
                r.seek(at);
                break;
            };

            if 1 + len > budget {
                Err(Error::LocationSize {
                    size,
                    needed: size - budget as i32 + 1 + len as i32,
                })?;
            }

            match tag {
                BATTERY => self.battery = Some(r.u8()?),
                CELLULAR => {
                    let [network, signal] = r.take()?;
                    self.cellular = Some(Cellular {
                        generation: network / 10,
                        protocol: network % 10,
                        signal,
                    });
                }
                FINE_ACCURACY => self.accuracy = r.fine_accuracy()?,
                ELEVATION => self.elevation = r.elevation()?,
                PRESSURE => self.pressure = r.pressure()?,
                VERTICAL_ACCURACY => self.vertical_accuracy = r.fine_accuracy()?,
                TIME => self.time = r.timestamp()?,
                SATELLITES => self.satellites = Some(Satellites::from(r.take::<8>()?)),
                _ => {}
            }

            budget -= 1 + len;
        }

        Ok(budget)
    }
}

/// Size of the value following a tag, if the tag is known.
fn field_size(tag: u8) -> Option<usize> {
    Some(match tag {
        BATTERY => 1,
        CELLULAR => 2,
        FINE_ACCURACY | ELEVATION | PRESSURE | VERTICAL_ACCURACY => 4,
        TIME | SATELLITES => 8,
        _ => None?,
    })
}

impl From<[u8; 8]> for Satellites {
    fn from(r: [u8; 8]) -> Self {
        #[repr(C)]
        #[derive(FromBytes)]
        struct SatelliteCounts {
            unknown: u8,
            gps: u8,
            glonass: u8,
            galileo: u8,
            beidou: u8,
            qzss: u8,
            sbas: u8,
            _reserved: u8,
        }

        let SatelliteCounts {
            unknown,
            gps,
            glonass,
            galileo,
            beidou,
            qzss,
            sbas,
            ..
        } = zerocopy::transmute!(r);

        let total = [unknown, gps, glonass, galileo, beidou, qzss, sbas]
            .iter()
            .map(|&c| u16::from(c))
            .sum();

        Self {
            unknown,
            gps,
            glonass,
            galileo,
            beidou,
            qzss,
            sbas,
            total,
        }
    }
}
