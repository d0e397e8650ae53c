//! Where the poll-driven path reads its targets.

use std::future::Future;

use ledbridge_domain::error::BridgeError;
use ledbridge_domain::output::DesiredState;

/// A control-plane store that can report the full desired-state set.
pub trait DesiredStateSource {
    /// Fetch the current desired state of every output the store knows.
    ///
    /// Values are already normalized to [`LineState`](ledbridge_domain::output::LineState);
    /// spelling variants are the adapter's concern.
    fn desired_states(&self) -> impl Future<Output = Result<Vec<DesiredState>, BridgeError>> + Send;
}

impl<T: DesiredStateSource + Send + Sync> DesiredStateSource for std::sync::Arc<T> {
    fn desired_states(&self) -> impl Future<Output = Result<Vec<DesiredState>, BridgeError>> + Send {
        (**self).desired_states()
    }
}
