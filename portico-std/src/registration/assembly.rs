//! Configuration-driven assembly.
//!
//! A configuration section is an ordered table of named entries. Each entry
//! is handled in this order:
//!
//! 1. skipped when `disable = true`
//! 2. type resolved from `type`, falling back to the entry key
//! 3. factory lookup and construction
//! 4. role-specific configuration (names, priority, device identity, codecs)
//! 5. topic filter from `topics`, when the component asks for one
//! 6. initialization with the `InitArgs` sub-table
//! 7. insertion
//!
//! Any failure aborts before step 7, so a rejected entry leaves nothing
//! behind.

use super::{DriverEntry, InterceptorEntry, PluginEntry, RegistrationBuilder};
use portico_core::{
    AssemblyError, BoxError, Bundle, Config, ConfigError, DeviceAddress, DeviceBase, Initialize,
    TopicExpr, TopicFilter,
};
use serde_json::Value;
use tracing::info;

/// Configuration sections processed by [`RegistrationBuilder::assemble`], in
/// processing order.
pub const SECTIONS: [&str; 5] = ["plugins", "interceptors", "drivers", "outputs", "inputs"];

/// The plain initialization hook: hands `InitArgs` straight to the component.
pub fn init_with_args(target: &mut dyn Initialize, args: &Config) -> Result<(), BoxError> {
    target.on_init(args)
}

fn config_error(entry: &str) -> impl FnOnce(ConfigError) -> AssemblyError + '_ {
    move |source| AssemblyError::Config {
        entry: entry.to_string(),
        source,
    }
}

impl RegistrationBuilder {
    /// Assemble every known section of a configuration document.
    ///
    /// Sections are processed as plugins, interceptors, drivers, outputs and
    /// finally inputs; absent sections are skipped.
    pub fn assemble<F>(&mut self, document: &Config, mut init_hook: F) -> Result<(), AssemblyError>
    where
        F: FnMut(&mut dyn Initialize, &Config) -> Result<(), BoxError>,
    {
        for section in SECTIONS {
            let entries = document.child(section).map_err(config_error(section))?;
            self.register_from_config(&entries, &mut init_hook)?;
        }
        Ok(())
    }

    /// Register every entry of one configuration section, in document order.
    ///
    /// Stops at the first invalid entry.
    pub fn register_from_config<F>(
        &mut self,
        section: &Config,
        mut init_hook: F,
    ) -> Result<(), AssemblyError>
    where
        F: FnMut(&mut dyn Initialize, &Config) -> Result<(), BoxError>,
    {
        for (key, value) in section.entries() {
            self.register_entry(key, value, &mut init_hook)?;
        }
        Ok(())
    }

    fn register_entry<F>(
        &mut self,
        key: &str,
        value: &Value,
        init_hook: &mut F,
    ) -> Result<(), AssemblyError>
    where
        F: FnMut(&mut dyn Initialize, &Config) -> Result<(), BoxError>,
    {
        let entry = match value {
            Value::Object(table) => Config::new(table.clone()),
            _ => {
                return Err(AssemblyError::MalformedEntry {
                    entry: key.to_string(),
                });
            }
        };

        if entry.get_bool("disable").map_err(config_error(key))? {
            info!(entry = key, "entry disabled in configuration");
            return Ok(());
        }

        let type_name = entry.get_non_empty_str("type").unwrap_or(key);
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| AssemblyError::MissingFactory {
                entry: key.to_string(),
                type_name: type_name.to_string(),
            })?;
        let mut bundle = factory();

        let mut output_pattern = None;
        let mut priority = 0;
        match &mut bundle {
            Bundle::Interceptor(_) => {
                priority = entry
                    .get_i64("priority")
                    .map_err(config_error(key))?
                    .unwrap_or(0);
            }
            Bundle::InputDevice(device) => {
                self.configure_device(key, &entry, device.base_mut())?;
                let topic = entry
                    .get_non_empty_str("topic")
                    .ok_or_else(|| AssemblyError::MissingField {
                        entry: key.to_string(),
                        field: "topic",
                    })?;
                device.base_mut().set_topic(topic);
            }
            Bundle::OutputDevice(device) => {
                self.configure_device(key, &entry, device.base_mut())?;
                if let Some(topic) = entry.get_non_empty_str("topic") {
                    let pattern = TopicExpr::compile_with(topic, &self.syntax).map_err(|source| {
                        AssemblyError::InvalidPattern {
                            entry: key.to_string(),
                            source,
                        }
                    })?;
                    device.base_mut().set_topic(topic);
                    output_pattern = Some(pattern);
                }
            }
            Bundle::Driver(_) | Bundle::Plugin(_) => {}
        }

        let filter = if bundle.filters_topics() {
            self.topic_filter(key, &entry)?
        } else {
            TopicFilter::any()
        };

        if let Some(target) = bundle.as_initialize() {
            let args = entry.child("InitArgs").map_err(config_error(key))?;
            init_hook(target, &args).map_err(|source| AssemblyError::Init {
                entry: key.to_string(),
                source,
            })?;
        }

        let name = entry.get_non_empty_str("name").unwrap_or(key);
        match bundle {
            Bundle::Driver(driver) => {
                self.add_driver(DriverEntry::from_boxed(name, driver).with_filter(filter));
            }
            Bundle::Interceptor(interceptor) => {
                self.add_interceptor(
                    InterceptorEntry::from_boxed(name, interceptor)
                        .with_priority(priority)
                        .with_filter(filter),
                );
            }
            Bundle::InputDevice(device) => self.add_input_device(device)?,
            Bundle::OutputDevice(device) => self.insert_output(device, output_pattern)?,
            Bundle::Plugin(plugin) => self.add_plugin(PluginEntry::new(name, plugin)),
        }
        Ok(())
    }

    /// Name, address and codecs shared by input and output devices.
    fn configure_device(
        &self,
        key: &str,
        entry: &Config,
        base: &mut DeviceBase,
    ) -> Result<(), AssemblyError> {
        let name = entry
            .get_non_empty_str("name")
            .ok_or_else(|| AssemblyError::MissingField {
                entry: key.to_string(),
                field: "name",
            })?;

        let address = DeviceAddress::new(
            entry.get_str("uuid").unwrap_or_default(),
            entry.get_str("group").unwrap_or_default(),
            entry.get_str("private").unwrap_or_default(),
        );
        if !address.is_valid() {
            return Err(AssemblyError::InvalidAddress {
                entry: key.to_string(),
            });
        }
        self.ensure_unique_uuid(&address.uuid)?;

        let encoder = match entry.get_non_empty_str("encoder") {
            Some(name) => Some(self.encoders.get(name).cloned().ok_or_else(|| {
                AssemblyError::UnknownEncoder {
                    entry: key.to_string(),
                    name: name.to_string(),
                }
            })?),
            None if base.encoder().is_some() => None,
            None => {
                return Err(AssemblyError::MissingCodec {
                    entry: key.to_string(),
                    role: "encoder",
                });
            }
        };

        let decoder = match entry.get_non_empty_str("decoder") {
            Some(name) => Some(self.decoders.get(name).cloned().ok_or_else(|| {
                AssemblyError::UnknownDecoder {
                    entry: key.to_string(),
                    name: name.to_string(),
                }
            })?),
            None if base.decoder().is_some() => None,
            None => {
                return Err(AssemblyError::MissingCodec {
                    entry: key.to_string(),
                    role: "decoder",
                });
            }
        };

        base.set_name(name);
        base.set_address(address);
        if let Some(encoder) = encoder {
            base.set_encoder(encoder);
        }
        if let Some(decoder) = decoder {
            base.set_decoder(decoder);
        }
        Ok(())
    }

    fn topic_filter(&self, key: &str, entry: &Config) -> Result<TopicFilter, AssemblyError> {
        let invalid = || AssemblyError::InvalidTopics {
            entry: key.to_string(),
        };
        let topics = entry.get_str_array("topics").map_err(|_| invalid())?;
        if topics.is_empty() {
            return Err(invalid());
        }
        TopicFilter::compile(&topics, &self.syntax).map_err(|source| {
            AssemblyError::InvalidPattern {
                entry: key.to_string(),
                source,
            }
        })
    }
}
