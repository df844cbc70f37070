//! Component registration and assembly.
//!
//! Assembly happens on a mutable [`RegistrationBuilder`], either by direct
//! `add_*` calls or from a configuration document through
//! [`RegistrationBuilder::assemble`]. [`RegistrationBuilder::build`] freezes
//! the result into a [`Registration`], which is shared as
//! `Arc<Registration>` and never mutated again.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut builder = RegistrationBuilder::new();
//! builder.add_decoder("json", Arc::new(JsonDecoder))?;
//! builder.add_bundle_factory("door-driver", || Bundle::driver(DoorDriver::default()));
//! builder.assemble(&config, |target, args| target.on_init(args))?;
//! let registration = Arc::new(builder.build());
//! ```

mod assembly;
mod builder;
mod entry;
mod lifecycle;

pub use assembly::{SECTIONS, init_with_args};
pub use builder::{BundleFactory, RegistrationBuilder};
pub use entry::{DriverEntry, InterceptorEntry, PluginEntry};
pub use lifecycle::{LifecycleHook, LifecyclePhase};

use entry::OutputSlot;
use lifecycle::LifecycleHooks;
use portico_core::{
    BoxError, Bundle, Context, Decoder, DynInputDevice, DynOutputDevice, Encoder, TopicSyntax,
};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

/// The assembled, read-only component registry.
pub struct Registration {
    syntax: TopicSyntax,
    factories: HashMap<String, BundleFactory>,
    encoders: HashMap<String, Arc<dyn Encoder>>,
    decoders: HashMap<String, Arc<dyn Decoder>>,
    inputs: Vec<Arc<dyn DynInputDevice>>,
    input_index: HashMap<String, usize>,
    outputs: Vec<OutputSlot>,
    output_index: HashMap<String, usize>,
    drivers: Vec<DriverEntry>,
    interceptors: Vec<InterceptorEntry>,
    plugins: Vec<PluginEntry>,
    hooks: LifecycleHooks,
}

impl Registration {
    /// The topic syntax patterns were compiled with.
    pub fn topic_syntax(&self) -> &TopicSyntax {
        &self.syntax
    }

    /// Construct a fresh bundle from a registered factory.
    pub fn create(&self, type_name: &str) -> Option<Bundle> {
        self.factories.get(type_name).map(|factory| factory())
    }

    /// A registered encoder.
    pub fn encoder(&self, name: &str) -> Option<&Arc<dyn Encoder>> {
        self.encoders.get(name)
    }

    /// A registered decoder.
    pub fn decoder(&self, name: &str) -> Option<&Arc<dyn Decoder>> {
        self.decoders.get(name)
    }

    /// The input device registered under `uuid`.
    pub fn input_device(&self, uuid: &str) -> Option<&Arc<dyn DynInputDevice>> {
        self.input_index.get(uuid).map(|&i| &self.inputs[i])
    }

    /// The output device registered under `uuid`.
    pub fn output_device(&self, uuid: &str) -> Option<&Arc<dyn DynOutputDevice>> {
        self.output_index.get(uuid).map(|&i| &self.outputs[i].device)
    }

    /// Input devices in registration order.
    pub fn input_devices(&self) -> impl Iterator<Item = &Arc<dyn DynInputDevice>> {
        self.inputs.iter()
    }

    /// Output devices in registration order.
    pub fn output_devices(&self) -> impl Iterator<Item = &Arc<dyn DynOutputDevice>> {
        self.outputs.iter().map(|slot| &slot.device)
    }

    /// Output devices whose topic pattern matches `topic`, in registration
    /// order. Devices without a pattern never match.
    pub fn outputs_matching<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn DynOutputDevice>> + 'a {
        self.outputs
            .iter()
            .filter(move |slot| slot.pattern.as_ref().is_some_and(|p| p.matches(topic)))
            .map(|slot| &slot.device)
    }

    /// Drivers in registration order.
    pub fn drivers(&self) -> &[DriverEntry] {
        &self.drivers
    }

    /// Interceptors in execution order (ascending priority).
    pub fn interceptors(&self) -> &[InterceptorEntry] {
        &self.interceptors
    }

    /// Plugins in registration order.
    pub fn plugins(&self) -> &[PluginEntry] {
        &self.plugins
    }

    /// Run the lifecycle hooks of one phase in registration order.
    ///
    /// Stops at, and returns, the first failure.
    pub fn run_hooks(&self, phase: LifecyclePhase, ctx: &Context) -> Result<(), BoxError> {
        self.hooks.run(phase, ctx)
    }

    /// Log what was assembled.
    pub fn log_summary(&self) {
        info!(
            plugins = self.plugins.len(),
            interceptors = self.interceptors.len(),
            drivers = self.drivers.len(),
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            encoders = self.encoders.len(),
            decoders = self.decoders.len(),
            "registration assembled"
        );
        for entry in &self.plugins {
            info!(name = entry.name(), kind = entry.plugin().type_name(), "plugin");
        }
        for entry in &self.interceptors {
            info!(
                name = entry.name(),
                priority = entry.priority(),
                kind = entry.interceptor().type_name(),
                "interceptor"
            );
        }
        for entry in &self.drivers {
            let topics: Vec<&str> = entry.filter().exprs().iter().map(|e| e.pattern()).collect();
            info!(name = entry.name(), ?topics, kind = entry.driver().type_name(), "driver");
        }
        for device in &self.inputs {
            let base = device.base();
            info!(
                name = base.name(),
                uuid = %base.address().uuid,
                topic = base.topic(),
                kind = device.type_name(),
                "input device"
            );
        }
        for slot in &self.outputs {
            let base = slot.device.base();
            info!(
                name = base.name(),
                uuid = %base.address().uuid,
                kind = slot.device.type_name(),
                "output device"
            );
        }
    }
}
