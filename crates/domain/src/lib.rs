//! # ledbridge-domain
//!
//! Pure domain model for the ledbridge output synchronizer.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Outputs** (addressable LEDs: id, label, physical line)
//! - Define the binary **line state** (`on` / `off`)
//! - Define the **wire protocol** values: commands sent to the
//!   microcontroller and the classified acknowledgements it returns
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod output;
pub mod protocol;
