//! Reply parsers.
//!
//! The daemon's text replies are console output rather than a designed
//! protocol, so the text parsers are lenient: lines they cannot make sense
//! of are skipped and parsing never fails. The XML reply of
//! `GET CLIENT STATE` is schema-stable, so its parser is strict and reports
//! malformed documents as errors.

pub mod info;
pub mod list;
pub mod xml;

pub use info::{parse_device_info, parse_server_info};
pub use list::parse_list;
pub use xml::parse_client_state;

/// Non-empty trimmed lines, skipping any that start with `skip_prefix`.
///
/// Used for the one-entry-per-line replies of `MANUAL HUB LIST`,
/// `LIST REVERSE` and `LIST LICENSES`.
pub fn parse_lines(output: &str, skip_prefix: Option<&str>) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| skip_prefix.is_none_or(|prefix| !line.starts_with(prefix)))
        .map(str::to_string)
        .collect()
}
