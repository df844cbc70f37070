//! Frame dispatch over a frozen [`Registration`](crate::registration::Registration).
//!
//! - [`Dispatcher`] runs the decode → intercept → drive pipeline.
//! - [`OutputRouter`] is the [`OutputDeliverer`](portico_core::OutputDeliverer)
//!   handed to drivers.
//! - [`DispatchDeliverer`] is the [`InputDeliverer`](portico_core::InputDeliverer)
//!   handed to input devices.

mod deliverer;
mod dispatcher;
mod router;

pub use deliverer::DispatchDeliverer;
pub use dispatcher::{DispatchOutcome, DispatchReport, Dispatcher, DriverFailure, DriverReply};
pub use router::OutputRouter;
