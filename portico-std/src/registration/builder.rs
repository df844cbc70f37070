//! Mutable, single-threaded assembly of a [`Registration`].

use super::{
    DriverEntry, InterceptorEntry, LifecycleHook, LifecyclePhase, PluginEntry, Registration,
    entry::OutputSlot, lifecycle::LifecycleHooks,
};
use portico_core::{
    AssemblyError, BoxError, Bundle, CodecProvider, Context, Decoder, DeviceRole, DynInputDevice,
    DynOutputDevice, Encoder, TopicExpr, TopicSyntax,
};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

/// Produces a fresh component for a configuration type name.
pub type BundleFactory = Box<dyn Fn() -> Bundle + Send + Sync>;

/// Builder for a [`Registration`].
///
/// Every `add_*` method validates its input and returns an
/// [`AssemblyError`] instead of inserting anything when validation fails.
pub struct RegistrationBuilder {
    pub(super) syntax: TopicSyntax,
    pub(super) factories: HashMap<String, BundleFactory>,
    pub(super) encoders: HashMap<String, Arc<dyn Encoder>>,
    pub(super) decoders: HashMap<String, Arc<dyn Decoder>>,
    inputs: Vec<Arc<dyn DynInputDevice>>,
    input_index: HashMap<String, usize>,
    outputs: Vec<OutputSlot>,
    output_index: HashMap<String, usize>,
    drivers: Vec<DriverEntry>,
    interceptors: Vec<InterceptorEntry>,
    plugins: Vec<PluginEntry>,
    hooks: LifecycleHooks,
}

impl Default for RegistrationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationBuilder {
    /// Create an empty builder using the default topic syntax.
    pub fn new() -> Self {
        Self::with_topic_syntax(TopicSyntax::default())
    }

    /// Create an empty builder compiling patterns with `syntax`.
    pub fn with_topic_syntax(syntax: TopicSyntax) -> Self {
        Self {
            syntax,
            factories: HashMap::new(),
            encoders: HashMap::new(),
            decoders: HashMap::new(),
            inputs: Vec::new(),
            input_index: HashMap::new(),
            outputs: Vec::new(),
            output_index: HashMap::new(),
            drivers: Vec::new(),
            interceptors: Vec::new(),
            plugins: Vec::new(),
            hooks: LifecycleHooks::default(),
        }
    }

    /// The topic syntax in use.
    pub fn topic_syntax(&self) -> &TopicSyntax {
        &self.syntax
    }

    /// Register a named encoder.
    pub fn add_encoder(
        &mut self,
        name: impl Into<String>,
        encoder: Arc<dyn Encoder>,
    ) -> Result<(), AssemblyError> {
        let name = name.into();
        if self.encoders.contains_key(&name) {
            return Err(AssemblyError::DuplicateEncoder(name));
        }
        self.encoders.insert(name, encoder);
        Ok(())
    }

    /// Register a named decoder.
    pub fn add_decoder(
        &mut self,
        name: impl Into<String>,
        decoder: Arc<dyn Decoder>,
    ) -> Result<(), AssemblyError> {
        let name = name.into();
        if self.decoders.contains_key(&name) {
            return Err(AssemblyError::DuplicateDecoder(name));
        }
        self.decoders.insert(name, decoder);
        Ok(())
    }

    /// Register the factory for a configuration type name.
    ///
    /// A later registration for the same name replaces the earlier one.
    pub fn add_bundle_factory<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Bundle + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            warn!(type_name = %type_name, "bundle factory replaced");
        }
        self.factories.insert(type_name, Box::new(factory));
    }

    /// Invoke a codec factory once and register its product as an encoder or
    /// a decoder under `type_name`.
    pub fn add_codec_factory<P, F>(
        &mut self,
        type_name: impl Into<String>,
        factory: F,
    ) -> Result<(), AssemblyError>
    where
        P: CodecProvider,
        F: FnOnce() -> P,
    {
        let type_name = type_name.into();
        let product = factory();
        match (product.encoder(), product.decoder()) {
            (Some(encoder), None) => self.add_encoder(type_name, encoder),
            (None, Some(decoder)) => self.add_decoder(type_name, decoder),
            (None, None) => Err(AssemblyError::UnknownCodec(type_name)),
            (Some(_), Some(_)) => Err(AssemblyError::AmbiguousCodec(type_name)),
        }
    }

    /// Register an input device. Its address and topic must already be set.
    pub fn add_input_device(
        &mut self,
        device: Box<dyn DynInputDevice>,
    ) -> Result<(), AssemblyError> {
        let uuid = device.base().address().uuid.clone();
        if uuid.is_empty() {
            return Err(AssemblyError::InvalidAddress {
                entry: device.base().name().to_string(),
            });
        }
        self.ensure_unique_uuid(&uuid)?;
        self.input_index.insert(uuid, self.inputs.len());
        self.inputs.push(Arc::from(device));
        Ok(())
    }

    /// Register an output device. A non-empty base topic is compiled as the
    /// device's broadcast pattern.
    pub fn add_output_device(
        &mut self,
        device: Box<dyn DynOutputDevice>,
    ) -> Result<(), AssemblyError> {
        let uuid = device.base().address().uuid.clone();
        if uuid.is_empty() {
            return Err(AssemblyError::InvalidAddress {
                entry: device.base().name().to_string(),
            });
        }
        let pattern = match device.base().topic() {
            "" => None,
            topic => Some(TopicExpr::compile_with(topic, &self.syntax).map_err(|source| {
                AssemblyError::InvalidPattern {
                    entry: uuid.clone(),
                    source,
                }
            })?),
        };
        self.insert_output(device, pattern)
    }

    pub(super) fn insert_output(
        &mut self,
        device: Box<dyn DynOutputDevice>,
        pattern: Option<TopicExpr>,
    ) -> Result<(), AssemblyError> {
        let uuid = device.base().address().uuid.clone();
        self.ensure_unique_uuid(&uuid)?;
        self.output_index.insert(uuid, self.outputs.len());
        self.outputs.push(OutputSlot {
            device: Arc::from(device),
            pattern,
        });
        Ok(())
    }

    /// Append a driver.
    pub fn add_driver(&mut self, entry: DriverEntry) {
        debug!(name = entry.name(), "driver added");
        self.drivers.push(entry);
    }

    /// Append an interceptor. Execution order is fixed by [`build`](Self::build).
    pub fn add_interceptor(&mut self, entry: InterceptorEntry) {
        debug!(name = entry.name(), priority = entry.priority(), "interceptor added");
        self.interceptors.push(entry);
    }

    /// Append a plugin.
    pub fn add_plugin(&mut self, entry: PluginEntry) {
        debug!(name = entry.name(), "plugin added");
        self.plugins.push(entry);
    }

    /// Append a lifecycle hook to `phase`.
    pub fn add_lifecycle_hook<F>(&mut self, phase: LifecyclePhase, hook: F)
    where
        F: Fn(&Context) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let hook: LifecycleHook = Box::new(hook);
        self.hooks.push(phase, hook);
    }

    /// Fail if `uuid` is already taken by any input or output device.
    pub(super) fn ensure_unique_uuid(&self, uuid: &str) -> Result<(), AssemblyError> {
        let existing = if self.input_index.contains_key(uuid) {
            DeviceRole::Input
        } else if self.output_index.contains_key(uuid) {
            DeviceRole::Output
        } else {
            return Ok(());
        };
        Err(AssemblyError::DuplicateUuid {
            uuid: uuid.to_string(),
            existing,
        })
    }

    /// Number of registered input devices.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of registered output devices.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Freeze the registry.
    ///
    /// Interceptors are stable-sorted by ascending priority, so equal
    /// priorities keep registration order.
    pub fn build(mut self) -> Registration {
        self.interceptors.sort_by_key(InterceptorEntry::priority);
        Registration {
            syntax: self.syntax,
            factories: self.factories,
            encoders: self.encoders,
            decoders: self.decoders,
            inputs: self.inputs,
            input_index: self.input_index,
            outputs: self.outputs,
            output_index: self.output_index,
            drivers: self.drivers,
            interceptors: self.interceptors,
            plugins: self.plugins,
            hooks: self.hooks,
        }
    }
}
