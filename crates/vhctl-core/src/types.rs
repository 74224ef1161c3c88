//! Domain values decoded from daemon replies.
//!
//! Every value here is an immutable snapshot rebuilt on each call; nothing
//! is cached or diffed between calls.

use serde::{Deserialize, Serialize};

/// A USB device exposed by a hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable identifier used by `USE`, `DEVICE INFO`, ... (e.g. `raspberrypi.114`).
    pub address: String,
    pub name: String,
    pub auto_use: bool,
    pub in_use: bool,
    pub nickname: String,
}

/// A USB sharing server and the devices it exposes, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub name: String,
    /// `host:port`, unique within one snapshot.
    pub address: String,
    pub devices: Vec<Device>,
}

/// Snapshot produced by `LIST`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    pub hubs: Vec<Hub>,
    pub auto_find_enabled: bool,
    pub auto_use_all_enabled: bool,
    pub reverse_lookup: bool,
    pub running_as_service: bool,
}

impl ClientState {
    /// Find a hub by address.
    pub fn hub(&self, address: &str) -> Option<&Hub> {
        self.hubs.iter().find(|h| h.address == address)
    }

    /// Find a device by address across all hubs.
    pub fn device(&self, address: &str) -> Option<&Device> {
        self.hubs
            .iter()
            .flat_map(|h| h.devices.iter())
            .find(|d| d.address == address)
    }
}

/// `DEVICE INFO` record. Absent keys leave fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub address: String,
    pub vendor: String,
    pub vendor_id: String,
    pub product: String,
    pub product_id: String,
    pub serial: String,
    /// `NO ONE` when free, otherwise the claiming client's hostname.
    pub in_use_by: String,
}

/// `SERVER INFO` record. Absent keys leave fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub state: String,
    pub address: String,
    pub port: String,
    /// e.g. `9265 sec`
    pub connected_for: String,
    pub max_devices: String,
    pub connection_id: String,
    pub interface: String,
    pub serial_number: String,
    pub easy_find: String,
}

/// A client registered on a server for daemon-initiated connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseClient {
    pub server_serial: String,
    pub client_address: String,
}

// ── GET CLIENT STATE ────────────────────────────────────────────────────

/// Root `<state>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlClientState {
    #[serde(rename(deserialize = "server"), default)]
    pub servers: Vec<XmlServer>,
}

/// One `<server>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlServer {
    #[serde(default)]
    pub connection: XmlServerConnection,
    #[serde(rename(deserialize = "device"), default)]
    pub devices: Vec<XmlDevice>,
}

/// Attributes of a `<connection>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlServerConnection {
    #[serde(rename(deserialize = "@connectionId"), deserialize_with = "lenient::number")]
    pub connection_id: i32,
    #[serde(rename(deserialize = "@secure"), deserialize_with = "lenient::flag")]
    pub secure: bool,
    #[serde(rename(deserialize = "@serverMajor"), deserialize_with = "lenient::number")]
    pub server_major: i32,
    #[serde(rename(deserialize = "@serverMinor"), deserialize_with = "lenient::number")]
    pub server_minor: i32,
    #[serde(rename(deserialize = "@serverRevision"), deserialize_with = "lenient::number")]
    pub server_revision: i32,
    #[serde(rename(deserialize = "@remoteAdmin"), deserialize_with = "lenient::flag")]
    pub remote_admin: bool,
    #[serde(rename(deserialize = "@serverName"))]
    pub server_name: String,
    #[serde(rename(deserialize = "@interfaceName"))]
    pub interface_name: String,
    #[serde(rename(deserialize = "@hostname"))]
    pub hostname: String,
    #[serde(rename(deserialize = "@serverSerial"))]
    pub server_serial: String,
    #[serde(rename(deserialize = "@license_max_devices"), deserialize_with = "lenient::number")]
    pub license_max_devices: i32,
    #[serde(rename(deserialize = "@state"), deserialize_with = "lenient::number")]
    pub state: i32,
    /// Kept verbatim; the daemon's timestamp format is not pinned down.
    #[serde(rename(deserialize = "@connectedTime"))]
    pub connected_time: String,
    #[serde(rename(deserialize = "@host"))]
    pub host: String,
    #[serde(rename(deserialize = "@port"), deserialize_with = "lenient::number")]
    pub port: u16,
    #[serde(rename(deserialize = "@error"), deserialize_with = "lenient::flag")]
    pub error: bool,
    #[serde(rename(deserialize = "@uuid"))]
    pub uuid: String,
    #[serde(rename(deserialize = "@transportId"))]
    pub transport_id: String,
    #[serde(rename(deserialize = "@easyFindEnabled"), deserialize_with = "lenient::flag")]
    pub easy_find_enabled: bool,
    #[serde(rename(deserialize = "@easyFindAvailable"), deserialize_with = "lenient::flag")]
    pub easy_find_available: bool,
    #[serde(rename(deserialize = "@easyFindId"))]
    pub easy_find_id: String,
    #[serde(rename(deserialize = "@easyFindPin"))]
    pub easy_find_pin: String,
    #[serde(rename(deserialize = "@easyFindAuthorized"), deserialize_with = "lenient::number")]
    pub easy_find_authorized: i32,
    #[serde(rename(deserialize = "@ip"))]
    pub ip: String,
}

/// Attributes of a `<device>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlDevice {
    #[serde(rename(deserialize = "@vendor"))]
    pub vendor: String,
    #[serde(rename(deserialize = "@product"))]
    pub product: String,
    #[serde(rename(deserialize = "@idVendor"), deserialize_with = "lenient::number")]
    pub id_vendor: i32,
    #[serde(rename(deserialize = "@idProduct"), deserialize_with = "lenient::number")]
    pub id_product: i32,
    #[serde(rename(deserialize = "@address"), deserialize_with = "lenient::number")]
    pub address: i32,
    #[serde(rename(deserialize = "@connectionId"), deserialize_with = "lenient::number")]
    pub connection_id: i32,
    #[serde(rename(deserialize = "@state"), deserialize_with = "lenient::number")]
    pub state: i32,
    #[serde(rename(deserialize = "@serverSerial"))]
    pub server_serial: String,
    #[serde(rename(deserialize = "@serverName"))]
    pub server_name: String,
    #[serde(rename(deserialize = "@serverInterfaceName"))]
    pub server_interface_name: String,
    #[serde(rename(deserialize = "@deviceSerial"))]
    pub device_serial: String,
    #[serde(rename(deserialize = "@connectionUUID"))]
    pub connection_uuid: String,
    #[serde(rename(deserialize = "@boundConnectionUUID"))]
    pub bound_connection_uuid: String,
    #[serde(rename(deserialize = "@boundConnectionIp"))]
    pub bound_connection_ip: String,
    #[serde(rename(deserialize = "@boundConnectionIp6"))]
    pub bound_connection_ip6: String,
    #[serde(rename(deserialize = "@boundClientHostname"))]
    pub bound_client_hostname: String,
    #[serde(rename(deserialize = "@nickname"))]
    pub nickname: String,
    #[serde(rename(deserialize = "@clientId"))]
    pub client_id: String,
    #[serde(rename(deserialize = "@numConfigurations"), deserialize_with = "lenient::number")]
    pub num_configurations: i32,
    #[serde(rename(deserialize = "@numInterfacesInFirstConfiguration"), deserialize_with = "lenient::number")]
    pub num_interfaces_in_first_configuration: i32,
    #[serde(rename(deserialize = "@firstInterfaceClass"), deserialize_with = "lenient::number")]
    pub first_interface_class: i32,
    #[serde(rename(deserialize = "@firstInterfaceSubClass"), deserialize_with = "lenient::number")]
    pub first_interface_sub_class: i32,
    #[serde(rename(deserialize = "@firstInterfaceProtocol"), deserialize_with = "lenient::number")]
    pub first_interface_protocol: i32,
    #[serde(rename(deserialize = "@hideClientInfo"), deserialize_with = "lenient::flag")]
    pub hide_client_info: bool,
    #[serde(rename(deserialize = "@badSerial"), deserialize_with = "lenient::flag")]
    pub bad_serial: bool,
    #[serde(rename(deserialize = "@parentHubPort"), deserialize_with = "lenient::number")]
    pub parent_hub_port: i32,
    #[serde(rename(deserialize = "@parentHubAddress"), deserialize_with = "lenient::number")]
    pub parent_hub_address: i32,
    #[serde(rename(deserialize = "@parentHubContainerID"))]
    pub parent_hub_container_id: String,
    #[serde(rename(deserialize = "@parentHubContainerIDPrefix"), deserialize_with = "lenient::number")]
    pub parent_hub_container_id_prefix: i32,
    #[serde(rename(deserialize = "@containerID"))]
    pub container_id: String,
    #[serde(rename(deserialize = "@containerIDPrefix"), deserialize_with = "lenient::number")]
    pub container_id_prefix: i32,
    #[serde(rename(deserialize = "@numPorts"), deserialize_with = "lenient::number")]
    pub num_ports: i32,
    /// `not-set`, `on`, `off`, ...
    #[serde(rename(deserialize = "@autoUse"))]
    pub auto_use: String,
}

impl XmlClientState {
    /// All devices across all servers, in document order.
    pub fn devices(&self) -> impl Iterator<Item = &XmlDevice> {
        self.servers.iter().flat_map(|s| s.devices.iter())
    }
}

/// Attribute decoders that follow the daemon's loose numbers: surrounding
/// whitespace is ignored and an empty value reads as zero or `false`.
mod lenient {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
        T::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(T::default());
        }
        raw.parse()
            .map_err(|e| D::Error::custom(format!("invalid number {raw:?}: {e}")))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            "" | "0" | "false" | "False" | "FALSE" => Ok(false),
            "1" | "true" | "True" | "TRUE" => Ok(true),
            other => Err(D::Error::custom(format!("invalid boolean {other:?}"))),
        }
    }
}
