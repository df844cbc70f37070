//! Factory products.
//!
//! A bundle factory returns a [`Bundle`]: one component tagged with the role
//! it plays. Registration branches on the tag once, at assembly time, and
//! stores the component in the matching typed collection.

use crate::{
    component::Initialize,
    device::{DynInputDevice, DynOutputDevice, InputDevice, OutputDevice},
    driver::{Driver, DynDriver},
    interceptor::{DynInterceptor, Interceptor},
    plugin::Plugin,
};
use std::fmt;

/// A constructed component, tagged by role.
pub enum Bundle {
    /// A topic-routed driver.
    Driver(Box<dyn DynDriver>),
    /// A prioritized interceptor.
    Interceptor(Box<dyn DynInterceptor>),
    /// A frame-producing device.
    InputDevice(Box<dyn DynInputDevice>),
    /// A command-accepting device.
    OutputDevice(Box<dyn DynOutputDevice>),
    /// A lifecycle-only plugin.
    Plugin(Box<dyn Plugin>),
}

/// The role tag of a [`Bundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    /// See [`Bundle::Driver`].
    Driver,
    /// See [`Bundle::Interceptor`].
    Interceptor,
    /// See [`Bundle::InputDevice`].
    InputDevice,
    /// See [`Bundle::OutputDevice`].
    OutputDevice,
    /// See [`Bundle::Plugin`].
    Plugin,
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BundleKind::Driver => "driver",
            BundleKind::Interceptor => "interceptor",
            BundleKind::InputDevice => "input device",
            BundleKind::OutputDevice => "output device",
            BundleKind::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

impl Bundle {
    /// Wrap a driver.
    pub fn driver(driver: impl Driver) -> Self {
        Bundle::Driver(Box::new(driver))
    }

    /// Wrap an interceptor.
    pub fn interceptor(interceptor: impl Interceptor) -> Self {
        Bundle::Interceptor(Box::new(interceptor))
    }

    /// Wrap an input device.
    pub fn input_device(device: impl InputDevice) -> Self {
        Bundle::InputDevice(Box::new(device))
    }

    /// Wrap an output device.
    pub fn output_device(device: impl OutputDevice) -> Self {
        Bundle::OutputDevice(Box::new(device))
    }

    /// Wrap a plugin.
    pub fn plugin(plugin: impl Plugin) -> Self {
        Bundle::Plugin(Box::new(plugin))
    }

    /// The role tag.
    pub fn kind(&self) -> BundleKind {
        match self {
            Bundle::Driver(_) => BundleKind::Driver,
            Bundle::Interceptor(_) => BundleKind::Interceptor,
            Bundle::InputDevice(_) => BundleKind::InputDevice,
            Bundle::OutputDevice(_) => BundleKind::OutputDevice,
            Bundle::Plugin(_) => BundleKind::Plugin,
        }
    }

    /// The concrete component type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Bundle::Driver(c) => c.type_name(),
            Bundle::Interceptor(c) => c.type_name(),
            Bundle::InputDevice(c) => c.type_name(),
            Bundle::OutputDevice(c) => c.type_name(),
            Bundle::Plugin(c) => c.type_name(),
        }
    }

    /// Whether the component needs a topic filter from configuration.
    pub fn filters_topics(&self) -> bool {
        match self {
            Bundle::Driver(c) => c.filters_topics(),
            Bundle::Interceptor(c) => c.filters_topics(),
            _ => false,
        }
    }

    /// The component's initialization capability, if any.
    pub fn as_initialize(&mut self) -> Option<&mut dyn Initialize> {
        match self {
            Bundle::Driver(c) => c.as_initialize(),
            Bundle::Interceptor(c) => c.as_initialize(),
            Bundle::InputDevice(c) => c.as_initialize(),
            Bundle::OutputDevice(c) => c.as_initialize(),
            Bundle::Plugin(c) => c.as_initialize(),
        }
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("kind", &self.kind())
            .field("type", &self.type_name())
            .finish()
    }
}
