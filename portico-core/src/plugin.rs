//! Lifecycle-only bundles.

use crate::{component::Component, context::Context, error::BoxError};

/// A bundle that only takes part in engine start and stop.
///
/// Plugins never see dispatches and are never topic-filtered.
pub trait Plugin: Component {
    /// Called when the engine starts, in registration order.
    fn on_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called when the engine stops.
    fn on_stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }
}
