//! # ledbridge-adapter-storage-sqlite-sqlx
//!
//! `SQLite` desired-state store using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`DesiredStateSource`](ledbridge_app::ports::DesiredStateSource)
//!   port polled by the reconciler
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations), which also
//!   seed the default twelve-LED catalogue
//! - Normalize the spellings found in the `state` column
//!
//! ## Dependency rule
//! Depends on `ledbridge-app` (for port traits) and `ledbridge-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod desired_state_source;
pub mod error;
pub mod pool;
pub mod state_value;

pub use desired_state_source::SqliteDesiredStateSource;
pub use pool::{Config, Database};
