//! `GET CLIENT STATE` XML parser.
//!
//! ```xml
//! <state>
//!   <server>
//!     <connection connectionId="1" serverName="Desk Hub" port="7575" ... />
//!     <device vendor="Logitech" idVendor="1133" address="1" autoUse="not-set" ... />
//!   </server>
//! </state>
//! ```
//!
//! Unlike the text parsers this one is strict: the document must be well
//! formed and rooted at `<state>`. Numeric and boolean attributes are the
//! exception: padding is trimmed and an empty value reads as zero.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ClientError;
use crate::types::XmlClientState;

const ROOT: &[u8] = b"state";

/// Parse the XML client state document.
pub fn parse_client_state(output: &str) -> Result<XmlClientState, ClientError> {
    check_root(output)?;
    quick_xml::de::from_str(output).map_err(|e| ClientError::Parse(format!("client state: {e}")))
}

fn check_root(output: &str) -> Result<(), ClientError> {
    let mut reader = Reader::from_str(output);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().as_ref() == ROOT {
                    return Ok(());
                }
                return Err(ClientError::Parse(format!(
                    "client state: expected <state> root, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Eof) => {
                return Err(ClientError::Parse(
                    "client state: document has no root element".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(ClientError::Parse(format!("client state: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<state>
  <server>
    <connection connectionId="1" secure="false" serverMajor="4" serverMinor="6"
      serverRevision="4" remoteAdmin="true" serverName="Desk Hub" interfaceName="eth0"
      hostname="deskhub" serverSerial="07370b72" license_max_devices="1" state="3"
      connectedTime="2024-05-01T10:00:00Z" host="192.168.1.20" port="7575" error="false"
      uuid="abc-123" transportId="tcp" easyFindEnabled="false" easyFindAvailable="true"
      easyFindId="" easyFindPin="" easyFindAuthorized="0" ip="192.168.1.20"/>
    <device vendor="Logitech" product="C920" idVendor="1133" idProduct="2098"
      address="11" connectionId="1" state="1" serverSerial="07370b72" serverName="Desk Hub"
      serverInterfaceName="eth0" deviceSerial="A1B2" connectionUUID="abc-123"
      boundConnectionUUID="" boundConnectionIp="" boundConnectionIp6=""
      boundClientHostname="" nickname="Camera" clientId="" numConfigurations="1"
      numInterfacesInFirstConfiguration="4" firstInterfaceClass="14"
      firstInterfaceSubClass="1" firstInterfaceProtocol="0" hideClientInfo="false"
      badSerial="false" parentHubPort="2" parentHubAddress="1"
      parentHubContainerID="{00000000}" parentHubContainerIDPrefix="0"
      containerID="{11111111}" containerIDPrefix="0" numPorts="0" autoUse="not-set"/>
    <device vendor="Acme" product="Keyboard" idVendor="4660" address="12" autoUse="on"/>
  </server>
  <server>
    <connection connectionId="2" serverName="Lab Hub" port="7576"/>
  </server>
</state>"#;

    #[test]
    fn test_parses_servers_and_devices() {
        let state = parse_client_state(SAMPLE).unwrap();
        assert_eq!(state.servers.len(), 2);

        let desk = &state.servers[0];
        assert_eq!(desk.connection.connection_id, 1);
        assert_eq!(desk.connection.server_name, "Desk Hub");
        assert_eq!(desk.connection.server_major, 4);
        assert!(desk.connection.remote_admin);
        assert!(!desk.connection.secure);
        assert!(desk.connection.easy_find_available);
        assert_eq!(desk.connection.port, 7575);
        assert_eq!(desk.connection.connected_time, "2024-05-01T10:00:00Z");
        assert_eq!(desk.devices.len(), 2);

        let cam = &desk.devices[0];
        assert_eq!(cam.vendor, "Logitech");
        assert_eq!(cam.id_vendor, 1133);
        assert_eq!(cam.id_product, 2098);
        assert_eq!(cam.address, 11);
        assert_eq!(cam.nickname, "Camera");
        assert_eq!(cam.num_interfaces_in_first_configuration, 4);
        assert_eq!(cam.parent_hub_port, 2);
        assert_eq!(cam.parent_hub_container_id, "{00000000}");
        assert_eq!(cam.container_id, "{11111111}");
        assert_eq!(cam.auto_use, "not-set");

        let lab = &state.servers[1];
        assert_eq!(lab.connection.server_name, "Lab Hub");
        assert!(lab.devices.is_empty());
    }

    #[test]
    fn test_missing_attributes_default() {
        let state = parse_client_state(SAMPLE).unwrap();
        let keyboard = &state.servers[0].devices[1];
        assert_eq!(keyboard.id_product, 0);
        assert_eq!(keyboard.server_name, "");
        assert!(!keyboard.bad_serial);
        assert_eq!(keyboard.auto_use, "on");
    }

    #[test]
    fn test_devices_iterates_in_document_order() {
        let state = parse_client_state(SAMPLE).unwrap();
        let addrs: Vec<_> = state.devices().map(|d| d.address).collect();
        assert_eq!(addrs, vec![11, 12]);
    }

    #[test]
    fn test_empty_state() {
        let state = parse_client_state("<state/>").unwrap();
        assert!(state.servers.is_empty());
    }

    #[test]
    fn test_malformed_document_is_error() {
        let result = parse_client_state("<state><server></state>");
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_wrong_root_is_error() {
        let result = parse_client_state("<status><server/></status>");
        match result {
            Err(ClientError::Parse(msg)) => assert!(msg.contains("<status>")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_error() {
        let result = parse_client_state("VirtualHere IPC\nHub (h:7575)");
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_empty_numeric_attributes_read_as_zero() {
        let state = parse_client_state(
            r#"<state><server>
                <connection connectionId="1" serverName="Hub" easyFindAuthorized="" port=""/>
                <device address="3" idVendor="" nickname="" badSerial=""/>
            </server><server>
                <connection connectionId="" serverName="Other" secure=" true "/>
            </server></state>"#,
        )
        .unwrap();

        let hub = &state.servers[0];
        assert_eq!(hub.connection.connection_id, 1);
        assert_eq!(hub.connection.easy_find_authorized, 0);
        assert_eq!(hub.connection.port, 0);
        assert_eq!(hub.devices[0].address, 3);
        assert_eq!(hub.devices[0].id_vendor, 0);
        assert!(!hub.devices[0].bad_serial);

        let other = &state.servers[1].connection;
        assert_eq!(other.connection_id, 0);
        assert!(other.secure);
    }

    #[test]
    fn test_padded_numbers_are_trimmed() {
        let state = parse_client_state(
            r#"<state><server><device idVendor=" 1133 " address="7"/></server></state>"#,
        )
        .unwrap();
        assert_eq!(state.servers[0].devices[0].id_vendor, 1133);
    }

    #[test]
    fn test_bad_attribute_type_is_error() {
        let result =
            parse_client_state(r#"<state><server><device idVendor="lots"/></server></state>"#);
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }
}
