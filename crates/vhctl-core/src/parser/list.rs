//! `LIST` reply parser.
//!
//! ```text
//! VirtualHere IPC, below are the available devices:
//! (Value in brackets = address, * = Auto-Use)
//!
//! Raspberry Hub (raspberrypi:7575)
//!    --> Webcam (raspberrypi.114) *
//!    --> Ultra USB 3.0 (raspberrypi.115)
//!
//! Auto-Find currently on
//! Auto-Use All currently off
//! Reverse Lookup currently off
//! VirtualHere Client not running as a service
//! ```
//!
//! A line without the device marker that ends in a parenthesized address
//! opens a new hub; marker lines add devices to the most recent hub.

use crate::types::{ClientState, Device, Hub};

const DEVICE_MARKER: &str = "-->";
const AUTO_USE_MARKER: char = '*';

const BANNERS: &[&str] = &["VirtualHere IPC", "(Value in brackets"];

const AUTO_FIND: &str = "Auto-Find currently";
const AUTO_USE_ALL: &str = "Auto-Use All currently";
const REVERSE_LOOKUP: &str = "Reverse Lookup currently";
const RUNNING_AS_SERVICE: &str = "running as a service";

/// Parse a `LIST` reply. Never fails: malformed lines are skipped.
pub fn parse_list(output: &str) -> ClientState {
    let mut state = ClientState::default();
    // Index into `state.hubs` of the hub devices currently attach to.
    let mut current: Option<usize> = None;

    for line in output.lines().map(str::trim) {
        if line.is_empty() || BANNERS.iter().any(|b| line.starts_with(b)) {
            continue;
        }

        if let Some(rest) = line.strip_prefix(DEVICE_MARKER) {
            if let (Some(idx), Some(device)) = (current, parse_device(rest)) {
                state.hubs[idx].devices.push(device);
            }
            continue;
        }

        if apply_status(&mut state, line) {
            continue;
        }

        if let Some((name, address)) = split_name_address(line) {
            state.hubs.push(Hub {
                name,
                address,
                devices: Vec::new(),
            });
            current = Some(state.hubs.len() - 1);
        }
    }

    state
}

fn parse_device(rest: &str) -> Option<Device> {
    let mut body = rest.trim();
    let mut auto_use = false;
    if let Some(stripped) = body.strip_suffix(AUTO_USE_MARKER) {
        auto_use = true;
        body = stripped.trim_end();
    }

    let (name, address) = split_name_address(body)?;
    Some(Device {
        address,
        name,
        auto_use,
        ..Device::default()
    })
}

/// Split `Name (address)` on the last parenthesized segment.
fn split_name_address(line: &str) -> Option<(String, String)> {
    let open = line.rfind('(')?;
    let close = line.rfind(')')?;
    if open >= close {
        return None;
    }
    let name = line[..open].trim();
    if name.is_empty() {
        return None;
    }
    let address = line[open + 1..close].trim();
    Some((name.to_string(), address.to_string()))
}

/// Apply a status line to the feature flags. Returns whether it was one.
fn apply_status(state: &mut ClientState, line: &str) -> bool {
    if let Some(rest) = after(line, AUTO_FIND) {
        state.auto_find_enabled = reads_on(rest);
    } else if let Some(rest) = after(line, AUTO_USE_ALL) {
        state.auto_use_all_enabled = reads_on(rest);
    } else if let Some(rest) = after(line, REVERSE_LOOKUP) {
        state.reverse_lookup = reads_on(rest);
    } else if line.contains(RUNNING_AS_SERVICE) {
        state.running_as_service = !line.split_whitespace().any(|w| w == "not");
    } else {
        return false;
    }
    true
}

fn after<'a>(line: &'a str, phrase: &str) -> Option<&'a str> {
    line.find(phrase).map(|idx| &line[idx + phrase.len()..])
}

fn reads_on(rest: &str) -> bool {
    rest.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|w| !w.is_empty())
        .is_some_and(|w| w.eq_ignore_ascii_case("on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_hub_scenario() {
        let output = "VirtualHere IPC\n\
                      Raspberry Hub (raspberrypi:7575)\n\
                      --> Webcam (raspberrypi.114) *\n\
                      Auto-Find currently on\n";
        let state = parse_list(output);

        assert_eq!(state.hubs.len(), 1);
        let hub = &state.hubs[0];
        assert_eq!(hub.name, "Raspberry Hub");
        assert_eq!(hub.address, "raspberrypi:7575");
        assert_eq!(hub.devices.len(), 1);
        assert_eq!(hub.devices[0].name, "Webcam");
        assert_eq!(hub.devices[0].address, "raspberrypi.114");
        assert!(hub.devices[0].auto_use);
        assert!(state.auto_find_enabled);
        assert!(!state.auto_use_all_enabled);
    }

    #[test]
    fn test_full_listing() {
        let output = "\
VirtualHere IPC, below are the available devices:
(Value in brackets = address, * = Auto-Use)

Raspberry Hub (raspberrypi:7575)
   --> Webcam (raspberrypi.114) *
   --> Ultra USB 3.0 (raspberrypi.115)

Desk Hub (192.168.1.20:7575)
   --> Keyboard (desk.11)

Auto-Find currently off
Auto-Use All currently on
Reverse Lookup currently on
VirtualHere Client IS running as a service
";
        let state = parse_list(output);

        let names: Vec<_> = state.hubs.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Raspberry Hub", "Desk Hub"]);
        let devices: Vec<_> = state.hubs[0]
            .devices
            .iter()
            .map(|d| (d.name.as_str(), d.address.as_str(), d.auto_use))
            .collect();
        assert_eq!(
            devices,
            vec![
                ("Webcam", "raspberrypi.114", true),
                ("Ultra USB 3.0", "raspberrypi.115", false),
            ]
        );
        assert_eq!(state.hubs[1].devices[0].address, "desk.11");
        assert!(!state.auto_find_enabled);
        assert!(state.auto_use_all_enabled);
        assert!(state.reverse_lookup);
        assert!(state.running_as_service);
    }

    #[test]
    fn test_not_running_as_service() {
        let state = parse_list("VirtualHere Client not running as a service\n");
        assert!(!state.running_as_service);
        assert!(state.hubs.is_empty());
    }

    #[test]
    fn test_status_off_contains_no_on_substring_trap() {
        // "Auto-Find currently off" must not count as on even though
        // the line contains "on" inside other words.
        let state = parse_list("Auto-Find currently off (configuration)\n");
        assert!(!state.auto_find_enabled);
    }

    #[test]
    fn test_devices_before_any_hub_are_discarded() {
        let output = "--> Orphan (x.1)\nHub (h:7575)\n--> Cam (h.1)\n";
        let state = parse_list(output);
        assert_eq!(state.hubs.len(), 1);
        assert_eq!(state.hubs[0].devices.len(), 1);
        assert_eq!(state.hubs[0].devices[0].name, "Cam");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "\
Hub (h:7575)
--> No address here
--> (h.2)
--> Broken ) order (
--> Good (h.3)
 (orphan-address)
";
        let state = parse_list(output);
        assert_eq!(state.hubs.len(), 1);
        let devices = &state.hubs[0].devices;
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, "h.3");
    }

    #[test]
    fn test_auto_use_marker_leaves_no_trailing_space() {
        for line in ["--> Cam (h.1) *", "--> Cam (h.1)*", "--> Cam (h.1)   *  "] {
            let state = parse_list(&format!("Hub (h:7575)\n{line}\n"));
            let device = &state.hubs[0].devices[0];
            assert!(device.auto_use, "{line}");
            assert_eq!(device.name, "Cam");
            assert_eq!(device.address, "h.1");
        }
    }

    #[test]
    fn test_name_with_parentheses_uses_last_segment() {
        let state = parse_list("Hub (h:7575)\n--> Hub (USB 2.0) Device (h.7)\n");
        let device = &state.hubs[0].devices[0];
        assert_eq!(device.name, "Hub (USB 2.0) Device");
        assert_eq!(device.address, "h.7");
    }

    #[test]
    fn test_hubs_and_devices_keep_input_order() {
        let mut output = String::new();
        for h in 0..5 {
            output.push_str(&format!("Hub {h} (hub{h}:7575)\n"));
            for d in 0..4 {
                output.push_str(&format!("--> Dev {h}-{d} (hub{h}.{d})\n"));
            }
        }
        let state = parse_list(&output);
        assert_eq!(state.hubs.len(), 5);
        for (h, hub) in state.hubs.iter().enumerate() {
            assert_eq!(hub.address, format!("hub{h}:7575"));
            let addrs: Vec<_> = hub.devices.iter().map(|d| d.address.clone()).collect();
            let expected: Vec<_> = (0..4).map(|d| format!("hub{h}.{d}")).collect();
            assert_eq!(addrs, expected);
        }
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_list(""), ClientState::default());
    }
}
