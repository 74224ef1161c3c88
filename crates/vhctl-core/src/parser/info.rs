//! `KEY: value` block parsers for `DEVICE INFO` and `SERVER INFO`.
//!
//! ```text
//! ADDRESS: TryanksPC.14
//! VENDOR: Xiaomi
//! VENDOR ID: 0x18d1
//! IN USE BY: NO ONE
//! ```
//!
//! Each line is split on its first colon, so values may themselves contain
//! colons (`ADDRESS: 192.168.31.145 (192.168.31.145)`, MAC addresses, ...).

use crate::types::{DeviceInfo, ServerInfo};

/// A flat record filled from `KEY: value` lines.
trait KeyValueRecord: Default {
    /// The field a key maps to, or `None` for keys this record ignores.
    fn field_mut(&mut self, key: &str) -> Option<&mut String>;
}

impl KeyValueRecord for DeviceInfo {
    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        Some(match key {
            "ADDRESS" => &mut self.address,
            "VENDOR" => &mut self.vendor,
            "VENDOR ID" => &mut self.vendor_id,
            "PRODUCT" => &mut self.product,
            "PRODUCT ID" => &mut self.product_id,
            "SERIAL" => &mut self.serial,
            "IN USE BY" => &mut self.in_use_by,
            _ => return None,
        })
    }
}

impl KeyValueRecord for ServerInfo {
    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        Some(match key {
            "NAME" => &mut self.name,
            "VERSION" => &mut self.version,
            "STATE" => &mut self.state,
            "ADDRESS" => &mut self.address,
            "PORT" => &mut self.port,
            "CONNECTED FOR" => &mut self.connected_for,
            "MAX DEVICES" => &mut self.max_devices,
            "CONNECTION ID" => &mut self.connection_id,
            "INTERFACE" => &mut self.interface,
            "SERIAL NUMBER" => &mut self.serial_number,
            "EASYFIND" => &mut self.easy_find,
            _ => return None,
        })
    }
}

/// Parse a `DEVICE INFO` reply. Unknown keys are ignored.
pub fn parse_device_info(output: &str) -> DeviceInfo {
    parse_fields(output)
}

/// Parse a `SERVER INFO` reply. Unknown keys are ignored.
pub fn parse_server_info(output: &str) -> ServerInfo {
    parse_fields(output)
}

fn parse_fields<T: KeyValueRecord>(output: &str) -> T {
    let mut record = T::default();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if let Some(field) = record.field_mut(key.trim()) {
            *field = value.trim().to_string();
        }
    }
    record
}
