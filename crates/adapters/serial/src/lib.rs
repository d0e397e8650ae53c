//! # ledbridge-adapter-serial
//!
//! Serial adapter — the [`DeviceLink`](ledbridge_app::ports::DeviceLink)
//! implementation that talks to the LED microcontroller.
//!
//! ## Wire protocol
//! One ASCII command per line (`ON:5\n`, `OFF:7\n`), answered by one line
//! starting with `OK` or `ERROR`. The board resets when the port opens and
//! prints a banner while it boots; the link waits out that window before it
//! accepts commands.
//!
//! ## Dependency rule
//! Depends on `ledbridge-app` (for the port trait) and `ledbridge-domain`.

pub mod config;
pub mod error;
pub mod link;

pub use config::SerialConfig;
pub use error::SerialError;
pub use link::SerialDeviceLink;
