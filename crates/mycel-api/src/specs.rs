//! Hardware-spec report posted once at startup

use serde::{Deserialize, Serialize};

/// Body of `POST /api/client_specs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSpecs {
    pub mac: String,
    pub ram: String,
    pub manufacturer: String,
    pub product_name: String,
    pub product_version: String,
    pub serial_number: String,
    pub uuid: String,
    pub cpu_family: String,
}

impl HardwareSpecs {
    pub fn for_mac(mac: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            ..Default::default()
        }
    }
}
