//! Device link port — the single serial channel to the microcontroller.
//!
//! A link frames outgoing [`Command`]s and classifies the reply into an
//! [`Acknowledgement`]. It holds no LED state: what the device is believed to
//! show is owned by the synchronizer and its state cache.

use std::future::Future;

use ledbridge_domain::error::DeviceError;
use ledbridge_domain::protocol::{Acknowledgement, Command};

/// Exclusive, request/response channel to the device.
///
/// Methods take `&mut self`: callers must serialize access themselves, which
/// the synchronizer does by owning the link behind its lock.
pub trait DeviceLink: Send + 'static {
    /// Human-readable channel identifier (e.g. `/dev/ttyUSB0`).
    fn endpoint(&self) -> &str;

    /// Whether a channel is currently held.
    fn is_open(&self) -> bool;

    /// Open the channel and wait for the device to settle.
    ///
    /// Fails with [`DeviceError::Unavailable`] when the channel cannot be
    /// opened.
    fn open(&mut self) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Transmit one command and wait for its acknowledgement.
    ///
    /// `Rejected`, `Timeout` and `Malformed` are returned as `Ok` values: they
    /// are per-command outcomes and leave the channel open.
    /// [`DeviceError::Unavailable`] is returned when the channel is not open
    /// or was lost during the round-trip.
    fn send(
        &mut self,
        command: Command,
    ) -> impl Future<Output = Result<Acknowledgement, DeviceError>> + Send;

    /// Release the channel. Idempotent.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
