//! Hardware identity and inventory

use mycel_api::HardwareSpecs;
use mycel_host_api::{HostError, HostResult};
use mycel_util::{hardware_address_path, HardwareId};
use tracing::{debug, warn};

use crate::CommandRunner;

const DMIDECODE: &str = "/usr/sbin/dmidecode";

/// Read the MAC address of `interface` from sysfs
pub fn read_hardware_id(interface: &str) -> HostResult<HardwareId> {
    let path = hardware_address_path(interface);
    let raw = std::fs::read_to_string(&path)?;
    let id = HardwareId::new(raw);
    if id.is_empty() {
        return Err(HostError::Internal(format!(
            "{} is empty",
            path.display()
        )));
    }
    debug!(interface, hardware_id = %id, "Hardware id read");
    Ok(id)
}

/// Gather the hardware report with `dmidecode`.
///
/// Fields dmidecode cannot provide are left empty; the report is informative
/// only.
pub async fn collect_specs(runner: &CommandRunner, hardware_id: &HardwareId) -> HardwareSpecs {
    let mut specs = HardwareSpecs::for_mac(hardware_id.as_str());

    specs.ram = match runner
        .run_privileged(DMIDECODE, &["-t".to_string(), "19".to_string()])
        .await
    {
        Ok(out) => memory_ranges(&out),
        Err(e) => {
            warn!(error = %e, "Could not read memory layout");
            String::new()
        }
    };

    let fields: [(&str, &mut String); 6] = [
        ("system-manufacturer", &mut specs.manufacturer),
        ("system-product-name", &mut specs.product_name),
        ("system-version", &mut specs.product_version),
        ("system-serial-number", &mut specs.serial_number),
        ("system-uuid", &mut specs.uuid),
        ("processor-family", &mut specs.cpu_family),
    ];
    for (keyword, slot) in fields {
        match runner
            .run_privileged(DMIDECODE, &["-s".to_string(), keyword.to_string()])
            .await
        {
            Ok(out) => *slot = first_value(&out),
            Err(e) => warn!(keyword, error = %e, "dmidecode query failed"),
        }
    }

    specs
}

/// `Range Size` values of every memory array mapping, comma separated
pub fn memory_ranges(dmidecode_output: &str) -> String {
    dmidecode_output
        .lines()
        .filter_map(|l| l.trim().strip_prefix("Range Size:"))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ")
}

/// First non-comment line of a `dmidecode -s` answer
fn first_value(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_ranges() {
        let out = "\
# dmidecode 3.3
Handle 0x0013, DMI type 19, 31 bytes
Memory Array Mapped Address
\tStarting Address: 0x00000000000
\tEnding Address: 0x000FFFFFFFF
\tRange Size: 4 GB
\tPhysical Array Handle: 0x0011

Handle 0x0014, DMI type 19, 31 bytes
\tRange Size: 2 GB
";
        assert_eq!(memory_ranges(out), "4 GB, 2 GB");
    }

    #[test]
    fn test_first_value_skips_comments() {
        assert_eq!(first_value("# SMBIOS entry point\nLENOVO\n"), "LENOVO");
        assert_eq!(first_value(""), "");
    }

    #[test]
    fn test_missing_interface_is_error() {
        assert!(read_hardware_id("mycel-test-no-such-iface").is_err());
    }
}
