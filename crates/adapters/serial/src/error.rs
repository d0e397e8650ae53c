//! Serial adapter error types.

use ledbridge_domain::error::{BridgeError, DeviceError};

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The port could not be opened.
    #[error("failed to open serial port {port}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// A read or write on the open port failed.
    #[error("serial I/O error")]
    Io(#[from] std::io::Error),

    /// The device closed the stream.
    #[error("serial stream closed by the device")]
    Disconnected,
}

impl SerialError {
    /// Every serial failure means the channel is not usable; the detail is
    /// for logs only.
    #[must_use]
    pub fn into_device(self) -> DeviceError {
        DeviceError::Unavailable
    }
}

impl From<SerialError> for DeviceError {
    fn from(err: SerialError) -> Self {
        err.into_device()
    }
}

impl From<SerialError> for BridgeError {
    fn from(err: SerialError) -> Self {
        BridgeError::Device(err.into_device())
    }
}
