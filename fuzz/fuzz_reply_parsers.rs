//! Fuzz target for the daemon reply parsers.
//!
//! Run with: cargo +nightly fuzz run fuzz_reply_parsers
//!
//! The text parsers must never panic on console output they do not
//! recognise, and the XML parser must reject rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vhctl_core::classify::classify_text;
use vhctl_core::parser;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let state = parser::parse_list(s);
    for hub in &state.hubs {
        assert!(!hub.name.is_empty());
        for device in &hub.devices {
            assert!(!device.name.is_empty());
        }
    }

    let _ = parser::parse_device_info(s);
    let _ = parser::parse_server_info(s);
    let _ = parser::parse_lines(s, Some("Manual"));
    let _ = parser::parse_client_state(s);

    let result = classify_text(s);
    assert_eq!(result.success, result.error.is_none());
});
