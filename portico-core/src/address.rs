//! Device addressing.

use std::fmt;

/// Identifies a virtual device.
///
/// The UUID must be unique across all input and output devices of a
/// Registration. Group and private labels are free-form and are carried for
/// drivers that address devices by installation layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    /// Globally unique device identifier.
    pub uuid: String,
    /// Group label (e.g. a controller or floor).
    pub group: String,
    /// Private label, meaningful only to the device's drivers.
    pub private: String,
}

impl DeviceAddress {
    /// Create an address from its three parts.
    pub fn new(
        uuid: impl Into<String>,
        group: impl Into<String>,
        private: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            group: group.into(),
            private: private.into(),
        }
    }

    /// An address is valid when all three parts are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.uuid.is_empty() && !self.group.is_empty() && !self.private.is_empty()
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.private, self.uuid)
    }
}
