//! Network sub-aggregate.

use serde::{Deserialize, Serialize};

/// Transport and family of a socket table entry.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RouteType {
    Tcp,
    Tcp6,
    Udp,
    Udp6,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Tcp => "tcp",
            RouteType::Tcp6 => "tcp6",
            RouteType::Udp => "udp",
            RouteType::Udp6 => "udp6",
        }
    }
}

impl std::fmt::Display for RouteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One kernel socket table entry.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkRoute {
    pub route_type: RouteType,
    pub local_address: String,
    pub local_port: u16,
    pub remote_address: String,
    pub remote_port: u16,
}

/// Host-wide throughput in bytes per second.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkRate {
    pub download: f64,
    pub upload: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    /// `None` when `/proc/net/dev` could not be sampled.
    pub rate: Option<NetworkRate>,
    pub routes: Vec<NetworkRoute>,
}
