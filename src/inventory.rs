// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The network inventory that zones are generated from.
//!
//! An [`Inventory`] exposes three read-only collections: aggregates
//! (the top-level address blocks that reverse zones are derived from),
//! IP addresses with optional DNS names, and DHCP-enabled prefixes.
//! Records are handed over in raw, string-based form, as an inventory
//! API returns them; the accessors on each record type parse and check
//! them, failing with [`crate::Error::InvalidNetwork`].

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::Deserialize;

use crate::name::Name;
use crate::{Error as ZonegenError, Result as ZonegenResult};

/// The usual number of addresses at the start of a DHCP prefix that
/// are left out of the pool when the inventory does not say otherwise.
pub const DEFAULT_DHCP_RESERVED: u32 = 10;

////////////////////////////////////////////////////////////////////////
// INVENTORY TRAIT                                                    //
////////////////////////////////////////////////////////////////////////

/// A source of network inventory data. Each collection is fetched once
/// per run.
pub trait Inventory {
    /// Returns every aggregate.
    fn aggregates(&self) -> Result<Vec<RawAggregate>, Error>;

    /// Returns every IP address.
    fn addresses(&self) -> Result<Vec<RawAddress>, Error>;

    /// Returns the prefixes that are marked as DHCP-enabled.
    fn dhcp_prefixes(&self) -> Result<Vec<RawPrefix>, Error>;
}

////////////////////////////////////////////////////////////////////////
// RAW RECORDS                                                        //
////////////////////////////////////////////////////////////////////////

/// A top-level address block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawAggregate {
    pub prefix: String,
}

impl RawAggregate {
    /// Parses the aggregate's network. Host bits must not be set.
    pub fn network(&self) -> ZonegenResult<IpNet> {
        parse_network(&self.prefix)
    }
}

/// A single IP address, in interface form (`10.0.0.5/24`) or bare.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawAddress {
    pub address: String,
    #[serde(default)]
    pub dns_name: Option<String>,
}

impl RawAddress {
    /// Parses the address, discarding any prefix length.
    pub fn ip(&self) -> ZonegenResult<IpAddr> {
        let text = self.address.trim();
        if text.contains('/') {
            text.parse::<IpNet>()
                .map(|interface| interface.addr())
                .map_err(|_| ZonegenError::invalid_network(text, "not an interface address"))
        } else {
            text.parse::<IpAddr>()
                .map_err(|_| ZonegenError::invalid_network(text, "not an IP address"))
        }
    }

    /// Returns the DNS name, if one is set. Inventories commonly use an
    /// empty string for "no name", which is treated the same as
    /// absence.
    pub fn dns_name(&self) -> Option<&str> {
        self.dns_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Parses the DNS name as a fully qualified [`Name`]. Returns
    /// `None` if there is no name, and logs and returns `None` if the
    /// name cannot be parsed.
    pub fn parsed_dns_name(&self) -> Option<Name> {
        let text = self.dns_name()?;
        match text.parse() {
            Ok(name) => Some(name),
            Err(e) => {
                log::warn!(
                    "Skipping the DNS name {:?} of {}: {}.",
                    text,
                    self.address,
                    e
                );
                None
            }
        }
    }
}

/// A subnet, as used by the DHCP hostname allocator.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawPrefix {
    pub prefix: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub dhcp_reserved: Option<u32>,
    #[serde(default)]
    pub description: String,
}

impl RawPrefix {
    /// Parses the prefix's network. Host bits must not be set.
    pub fn network(&self) -> ZonegenResult<IpNet> {
        parse_network(&self.prefix)
    }

    /// Returns the number of reserved addresses at the start of the
    /// prefix, or `default` if the inventory does not give one.
    pub fn reserved(&self, default: u32) -> u32 {
        self.dhcp_reserved.unwrap_or(default)
    }
}

fn parse_network(text: &str) -> ZonegenResult<IpNet> {
    let text = text.trim();
    let network: IpNet = text
        .parse()
        .map_err(|_| ZonegenError::invalid_network(text, "not a CIDR network"))?;
    if network.trunc() != network {
        Err(ZonegenError::invalid_network(text, "host bits are set"))
    } else {
        Ok(network)
    }
}

////////////////////////////////////////////////////////////////////////
// STATIC INVENTORY                                                   //
////////////////////////////////////////////////////////////////////////

/// An [`Inventory`] held in memory, e.g. loaded from a snapshot file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StaticInventory {
    #[serde(default)]
    pub aggregates: Vec<RawAggregate>,
    #[serde(default)]
    pub addresses: Vec<RawAddress>,
    #[serde(default)]
    pub prefixes: Vec<RawPrefix>,
}

impl Inventory for StaticInventory {
    fn aggregates(&self) -> Result<Vec<RawAggregate>, Error> {
        Ok(self.aggregates.clone())
    }

    fn addresses(&self) -> Result<Vec<RawAddress>, Error> {
        Ok(self.addresses.clone())
    }

    fn dhcp_prefixes(&self) -> Result<Vec<RawPrefix>, Error> {
        Ok(self.prefixes.iter().filter(|p| p.dhcp).cloned().collect())
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error reported by an [`Inventory`] implementation.
#[derive(Debug)]
pub struct Error {
    collection: &'static str,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new `Error` for a failure to fetch `collection`.
    pub fn new(
        collection: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            collection,
            source: source.into(),
        }
    }

    /// Returns the name of the collection that could not be fetched.
    pub fn collection(&self) -> &'static str {
        self.collection
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to fetch {} from the inventory", self.collection)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn address(address: &str, dns_name: Option<&str>) -> RawAddress {
        RawAddress {
            address: address.to_owned(),
            dns_name: dns_name.map(str::to_owned),
        }
    }

    #[test]
    fn address_accepts_interface_and_bare_forms() {
        let expected: IpAddr = "10.0.0.5".parse().unwrap();
        assert_eq!(address("10.0.0.5/24", None).ip().unwrap(), expected);
        assert_eq!(address("10.0.0.5", None).ip().unwrap(), expected);
        assert_eq!(
            address("2001:db8::1/64", None).ip().unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
        assert!(matches!(
            address("10.0.0/24", None).ip(),
            Err(ZonegenError::InvalidNetwork { .. })
        ));
    }

    #[test]
    fn empty_dns_name_is_absent() {
        assert_eq!(address("10.0.0.5/24", Some("")).dns_name(), None);
        assert_eq!(address("10.0.0.5/24", Some("  ")).dns_name(), None);
        assert_eq!(
            address("10.0.0.5/24", Some("host1.example.org")).dns_name(),
            Some("host1.example.org")
        );
    }

    #[test]
    fn unparseable_dns_name_is_skipped() {
        let long_label = "x".repeat(64);
        let raw = address("10.0.0.5/24", Some(&long_label));
        assert!(raw.parsed_dns_name().is_none());
        let raw = address("10.0.0.5/24", Some("host1.example.org"));
        assert_eq!(
            raw.parsed_dns_name().unwrap().to_string(),
            "host1.example.org."
        );
    }

    #[test]
    fn networks_with_host_bits_are_rejected() {
        let aggregate = RawAggregate {
            prefix: "10.0.0.1/23".to_owned(),
        };
        assert!(matches!(
            aggregate.network(),
            Err(ZonegenError::InvalidNetwork { .. })
        ));
        let aggregate = RawAggregate {
            prefix: "10.0.0.0/23".to_owned(),
        };
        assert_eq!(
            aggregate.network().unwrap(),
            "10.0.0.0/23".parse::<IpNet>().unwrap()
        );
    }

    #[test]
    fn static_inventory_filters_dhcp_prefixes() {
        let inventory: StaticInventory = serde_json::from_str(
            r#"{
                "aggregates": [{"prefix": "10.0.0.0/23"}],
                "prefixes": [
                    {"prefix": "10.0.0.0/24", "dhcp": true, "description": "Camper-A"},
                    {"prefix": "10.0.1.0/24"}
                ]
            }"#,
        )
        .unwrap();
        let prefixes = inventory.dhcp_prefixes().unwrap();
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].reserved(DEFAULT_DHCP_RESERVED), 10);
        assert!(inventory.addresses().unwrap().is_empty());
    }
}
