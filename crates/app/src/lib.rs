//! # ledbridge-app
//!
//! Application layer — the synchronization engine and **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceLink` — exclusive serial channel to the microcontroller
//!   - `DesiredStateSource` — periodic source of the desired-state set
//! - Hold the static **output registry** and the **state cache**
//! - Provide the **synchronizer**, the single authority that decides whether
//!   a device write is needed and advances the cache only on confirmation
//! - Provide the **reconciler**, the poll-driven loop feeding the synchronizer
//!
//! ## Dependency rule
//! Depends on `ledbridge-domain` only (plus `tokio` for locking and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod registry;
pub mod services;
pub mod state_cache;
