//! Shared application state for axum handlers.

use std::sync::Arc;

use ledbridge_app::ports::DeviceLink;
use ledbridge_app::services::synchronizer::Synchronizer;

/// Application state shared across all axum handlers.
///
/// Generic over the device link to avoid dynamic dispatch. `Clone` is
/// implemented manually so the link itself does not need to be `Clone`.
pub struct AppState<L> {
    /// The only way handlers reach the device.
    pub synchronizer: Arc<Synchronizer<L>>,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            synchronizer: Arc::clone(&self.synchronizer),
        }
    }
}

impl<L: DeviceLink> AppState<L> {
    /// Create a new application state that owns the synchronizer.
    pub fn new(synchronizer: Synchronizer<L>) -> Self {
        Self {
            synchronizer: Arc::new(synchronizer),
        }
    }

    /// Create a new application state from a synchronizer that is also shared
    /// with background tasks (the reconciler).
    pub fn from_arc(synchronizer: Arc<Synchronizer<L>>) -> Self {
        Self { synchronizer }
    }
}
