// Routes module - BIRD table parsing, published route entries and lookups

pub mod lookup;
pub mod parser;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names of a published route hash
pub const FIELD_NETWORK: &str = "network";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_SOURCE_PROTOCOL: &str = "source_protocol";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_PREFERENCE: &str = "preference";
pub const FIELD_NEXT_HOP: &str = "next_hop";
pub const FIELD_INTERFACE: &str = "interface";

/// One routing table entry as reported by the local BIRD daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub network: String, // CIDR notation
    #[serde(rename = "type")]
    pub route_type: String,
    pub source_protocol: String,
    pub timestamp: String, // verbatim from the daemon
    pub preference: u32,
    pub next_hop: Option<String>,
    pub interface: Option<String>,
}

impl RouteRecord {
    /// Flat field map written to the store.
    ///
    /// `next_hop` and `interface` are always present so consumers see one
    /// schema; they are empty strings when unknown.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_NETWORK, self.network.clone()),
            (FIELD_TYPE, self.route_type.clone()),
            (FIELD_SOURCE_PROTOCOL, self.source_protocol.clone()),
            (FIELD_TIMESTAMP, self.timestamp.clone()),
            (FIELD_PREFERENCE, self.preference.to_string()),
            (FIELD_NEXT_HOP, self.next_hop.clone().unwrap_or_default()),
            (FIELD_INTERFACE, self.interface.clone().unwrap_or_default()),
        ]
    }
}

/// A route hash read back from the shared store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEntry {
    pub key: String,
    pub fields: BTreeMap<String, String>,
}

impl PublishedEntry {
    pub fn network(&self) -> Option<&str> {
        self.field(FIELD_NETWORK)
    }

    pub fn preference(&self) -> Option<u32> {
        self.field(FIELD_PREFERENCE).and_then(|p| p.parse().ok())
    }

    pub fn next_hop(&self) -> Option<&str> {
        self.field(FIELD_NEXT_HOP)
    }

    pub fn interface(&self) -> Option<&str> {
        self.field(FIELD_INTERFACE)
    }

    /// Field value, treating empty strings as absent
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Rebuild the typed record; `None` if a required field is missing or malformed
    pub fn to_record(&self) -> Option<RouteRecord> {
        Some(RouteRecord {
            network: self.network()?.to_string(),
            route_type: self.field(FIELD_TYPE).unwrap_or_default().to_string(),
            source_protocol: self.field(FIELD_SOURCE_PROTOCOL).unwrap_or_default().to_string(),
            timestamp: self.field(FIELD_TIMESTAMP).unwrap_or_default().to_string(),
            preference: self.preference()?,
            next_hop: self.next_hop().map(String::from),
            interface: self.interface().map(String::from),
        })
    }
}
