//! # ledbridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for reading outputs and requesting state changes
//!   (`/api/leds`, `/api/leds/{id}`, `/api/device/reopen`)
//! - Normalize the state spellings clients send into
//!   [`LineState`](ledbridge_domain::output::LineState)
//! - Map synchronizer results into HTTP responses, with one status code per
//!   failure kind
//!
//! ## Dependency rule
//! Depends on `ledbridge-app` (for the synchronizer and port traits) and
//! `ledbridge-domain` (for the types used in request/response mapping).
//! Never leaks axum types into the core.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod state_value;
