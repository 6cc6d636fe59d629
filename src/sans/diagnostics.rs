//! Receiver for recoverable anomalies and decoding progress.

use core::fmt::Arguments;

/// Receive diagnostics emitted while decoding.
///
/// Offsets are absolute positions in the buffer being decoded. The default
/// implementation of each method forwards to the [`log`] facade, so a receiver
/// only needs to override the methods it wants to capture.
pub trait Diagnostics {
    /// Report an anomaly that decoding recovered from.
    fn warn(&mut self, offset: usize, message: Arguments<'_>) {
        log::warn!("{offset:#x}: {message}");
    }

    /// Report structural progress.
    fn trace(&mut self, offset: usize, message: Arguments<'_>) {
        log::trace!("{offset:#x}: {message}");
    }
}

/// Diagnostics receiver forwarding everything to the [`log`] facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct Log;

impl Diagnostics for Log {}
