//! Typed registry entries.

use portico_core::{
    DynDriver, DynInterceptor, DynOutputDevice, Driver, Interceptor, Plugin, TopicExpr,
    TopicFilter,
};
use std::sync::Arc;

/// A registered driver with the name and topic filter Registration attached.
pub struct DriverEntry {
    name: String,
    filter: TopicFilter,
    driver: Box<dyn DynDriver>,
}

impl DriverEntry {
    /// A driver that accepts every topic until a filter is attached.
    pub fn new(name: impl Into<String>, driver: impl Driver) -> Self {
        Self::from_boxed(name, Box::new(driver))
    }

    /// Wrap an already boxed driver.
    pub fn from_boxed(name: impl Into<String>, driver: Box<dyn DynDriver>) -> Self {
        Self {
            name: name.into(),
            filter: TopicFilter::any(),
            driver,
        }
    }

    /// Attach a topic filter.
    pub fn with_filter(mut self, filter: TopicFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attached filter.
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    /// The driver itself.
    pub fn driver(&self) -> &dyn DynDriver {
        self.driver.as_ref()
    }

    /// Whether the driver should see `topic`.
    pub fn accepts(&self, topic: &str) -> bool {
        self.filter.matches(topic)
    }
}

/// A registered interceptor with its priority and topic filter.
pub struct InterceptorEntry {
    name: String,
    priority: i64,
    filter: TopicFilter,
    interceptor: Box<dyn DynInterceptor>,
}

impl InterceptorEntry {
    /// An interceptor at priority 0 that accepts every topic.
    pub fn new(name: impl Into<String>, interceptor: impl Interceptor) -> Self {
        Self::from_boxed(name, Box::new(interceptor))
    }

    /// Wrap an already boxed interceptor.
    pub fn from_boxed(name: impl Into<String>, interceptor: Box<dyn DynInterceptor>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            filter: TopicFilter::any(),
            interceptor,
        }
    }

    /// Set the priority. Lower values run earlier.
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a topic filter.
    pub fn with_filter(mut self, filter: TopicFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The priority.
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// The attached filter.
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    /// The interceptor itself.
    pub fn interceptor(&self) -> &dyn DynInterceptor {
        self.interceptor.as_ref()
    }

    /// Whether the interceptor should see `topic`.
    pub fn accepts(&self, topic: &str) -> bool {
        self.filter.matches(topic)
    }
}

/// A registered plugin.
pub struct PluginEntry {
    name: String,
    plugin: Box<dyn Plugin>,
}

impl PluginEntry {
    /// Wrap a plugin.
    pub fn new(name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        Self {
            name: name.into(),
            plugin,
        }
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin itself.
    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }
}

/// An output device plus the compiled form of its optional topic pattern.
pub(crate) struct OutputSlot {
    pub(crate) device: Arc<dyn DynOutputDevice>,
    pub(crate) pattern: Option<TopicExpr>,
}
