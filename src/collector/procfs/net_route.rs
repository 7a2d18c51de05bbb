//! Decoder for the kernel socket tables `/proc/net/{tcp,udp,tcp6,udp6}`.
//!
//! Each entry line looks like:
//!
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue ...
//!    0: 0100007F:901F 00000000:0000 0A 00000000:00000000 ...
//! ```
//!
//! Addresses are hex strings written in the kernel's native word order: each
//! two-digit group is one address byte and the groups come out reversed.
//! Ports are four hex digits with the low byte printed first.

use crate::collector::procfs::parser::ParseError;
use crate::model::{NetworkRoute, RouteType};

/// One socket table, described by where it lives and how to render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTable {
    /// Path relative to the proc root, e.g. `net/tcp`.
    pub relative_path: &'static str,
    /// Joins address groups: `.` for IPv4, `:` for IPv6.
    pub separator: char,
    pub route_type: RouteType,
}

/// The four tables collected per snapshot, in output order.
pub const ROUTE_TABLES: [RouteTable; 4] = [
    RouteTable {
        relative_path: "net/tcp",
        separator: '.',
        route_type: RouteType::Tcp,
    },
    RouteTable {
        relative_path: "net/udp",
        separator: '.',
        route_type: RouteType::Udp,
    },
    RouteTable {
        relative_path: "net/tcp6",
        separator: ':',
        route_type: RouteType::Tcp6,
    },
    RouteTable {
        relative_path: "net/udp6",
        separator: ':',
        route_type: RouteType::Udp6,
    },
];

impl RouteTable {
    /// Decodes every entry of the table. Malformed lines are skipped.
    pub fn decode(&self, content: &str) -> Vec<NetworkRoute> {
        content
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| self.decode_line(line).ok())
            .collect()
    }

    /// Decodes a single entry line.
    pub fn decode_line(&self, line: &str) -> Result<NetworkRoute, ParseError> {
        let mut fields = line.split_whitespace();
        let slot = fields
            .next()
            .ok_or_else(|| ParseError::new("empty socket line"))?;
        if !slot.ends_with(':') {
            return Err(ParseError::new(format!("invalid slot field '{}'", slot)));
        }

        let local = fields
            .next()
            .ok_or_else(|| ParseError::new("missing local address"))?;
        let remote = fields
            .next()
            .ok_or_else(|| ParseError::new("missing remote address"))?;

        let (local_address, local_port) = self.decode_endpoint(local)?;
        let (remote_address, remote_port) = self.decode_endpoint(remote)?;

        Ok(NetworkRoute {
            route_type: self.route_type,
            local_address,
            local_port,
            remote_address,
            remote_port,
        })
    }

    fn decode_endpoint(&self, endpoint: &str) -> Result<(String, u16), ParseError> {
        let (address, port) = endpoint
            .split_once(':')
            .ok_or_else(|| ParseError::new(format!("invalid endpoint '{}'", endpoint)))?;
        Ok((
            decode_address(address, self.separator)?,
            decode_port(port)?,
        ))
    }
}

/// Decodes a hex address: byte groups reversed, each rendered in decimal.
///
/// `0100007F` with `.` becomes `127.0.0.1`. IPv6 tables use the same rule
/// over 16 groups joined with `:`.
pub fn decode_address(hex: &str, separator: char) -> Result<String, ParseError> {
    if !matches!(hex.len(), 8 | 32) || !hex.is_ascii() {
        return Err(ParseError::new(format!(
            "address '{}' must be 8 or 32 hex digits",
            hex
        )));
    }

    let mut groups = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| ParseError::new(format!("invalid hex in address '{}'", hex)))?;
        groups.push(byte.to_string());
    }
    groups.reverse();

    Ok(groups.join(&separator.to_string()))
}

/// Decodes a 4-digit hex port, low byte first: `901F` is 8080.
pub fn decode_port(hex: &str) -> Result<u16, ParseError> {
    if hex.len() != 4 || !hex.is_ascii() {
        return Err(ParseError::new(format!("port '{}' must be 4 hex digits", hex)));
    }
    let byte = |digits: &str| {
        u8::from_str_radix(digits, 16).map_err(|_| ParseError::new(format!("invalid port '{}'", hex)))
    };
    let lsb = byte(&hex[..2])?;
    let msb = byte(&hex[2..])?;
    Ok(((msb as u16) << 8) | lsb as u16)
}
