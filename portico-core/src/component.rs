//! Capabilities shared by every bundle.

use crate::{config::Config, error::BoxError};
use std::{future::Future, pin::Pin};

/// A boxed, sendable future, used by the object-safe `Dyn*` traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receives the nested `InitArgs` table of a component's configuration entry.
pub trait Initialize {
    /// Apply initialization arguments. Called once, during assembly.
    fn on_init(&mut self, args: &Config) -> Result<(), BoxError>;
}

/// The base of every constructible component (driver, interceptor, device,
/// plugin).
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Portico component",
    label = "missing `Component` implementation",
    note = "Components must be `Send + Sync + 'static`; an empty `impl Component for T {}` is enough."
)]
pub trait Component: Send + Sync + 'static {
    /// A diagnostic name for logs.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The initialization capability, if the component has one.
    fn as_initialize(&mut self) -> Option<&mut dyn Initialize> {
        None
    }
}
