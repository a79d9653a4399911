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

//! Synthesized hostnames for DHCP pools.
//!
//! The [`DhcpHostnameAllocator`] is a [`PlacementHook`] that gives every
//! address in the pool of each DHCP-enabled IPv4 prefix a name, and
//! places forward and reverse records for it. A prefix whose
//! description contains the codename marker draws memorable
//! `first-second` names from a word list, in the codename domain; every
//! other prefix gets `host-a-b-c-d` names in the numeric domain.

use std::net::Ipv4Addr;

use ipnet::IpNet;
use log::{debug, info, warn};

use crate::inventory::{Inventory, RawPrefix, DEFAULT_DHCP_RESERVED};
use crate::name::Name;
use crate::placer::{PlacementHook, RecordPlacer};
use crate::store::ZoneStore;
use crate::{Error, Result};

/// The default marker that selects the codename policy.
pub const DEFAULT_CODENAME_MARKER: &str = "Camper-";

////////////////////////////////////////////////////////////////////////
// CODENAMES                                                          //
////////////////////////////////////////////////////////////////////////

/// The word list that codenames are combined from.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Codenames {
    words: Vec<String>,
}

impl Codenames {
    /// Parses a word list: one word per line, with spaces removed and
    /// blank lines ignored.
    pub fn parse(text: &str) -> Self {
        let words = text
            .lines()
            .map(|line| line.trim().replace(' ', ""))
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    /// Returns the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the codename at counter position `*pos` and advances the
    /// counter.
    ///
    /// The first word is `pos / n` and the second is `pos % n`, where
    /// `n` is the number of words. The position is first bumped by one
    /// whenever `pos % n` equals `pos / n` taken as an exact quotient,
    /// which only holds at position zero: the combination of the first
    /// word with itself is never handed out, while the other doubled
    /// words are. Existing deployments depend on the resulting
    /// numbering, so it must not be "fixed".
    pub fn next(&self, pos: &mut usize) -> Result<String> {
        let n = self.words.len();
        if n == 0 {
            return Err(Error::CodenameExhaustion {
                position: *pos,
                words: 0,
            });
        }
        if n * (*pos % n) == *pos {
            *pos += 1;
        }
        let (first, second) = (*pos / n, *pos % n);
        if first >= n {
            return Err(Error::CodenameExhaustion {
                position: *pos,
                words: n,
            });
        }
        *pos += 1;
        Ok(format!("{}-{}", self.words[first], self.words[second]))
    }
}

////////////////////////////////////////////////////////////////////////
// ALLOCATOR                                                          //
////////////////////////////////////////////////////////////////////////

/// Names the addresses of DHCP pools. See the [module-level
/// documentation](`self`).
#[derive(Clone, Debug)]
pub struct DhcpHostnameAllocator {
    codename_domain: Name,
    numeric_domain: Name,
    codenames: Codenames,
    marker: String,
    default_reserved: u32,
    pos: usize,
}

impl DhcpHostnameAllocator {
    /// Creates a new allocator with the default codename marker and
    /// reservation count.
    pub fn new(codename_domain: Name, numeric_domain: Name, codenames: Codenames) -> Self {
        Self {
            codename_domain,
            numeric_domain,
            codenames,
            marker: DEFAULT_CODENAME_MARKER.to_owned(),
            default_reserved: DEFAULT_DHCP_RESERVED,
            pos: 0,
        }
    }

    /// Sets the description marker that selects the codename policy.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Sets the reservation count used for prefixes that do not carry
    /// their own.
    pub fn with_default_reserved(mut self, reserved: u32) -> Self {
        self.default_reserved = reserved;
        self
    }

    /// Returns the current codename counter position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Names and places the pool of one prefix. Returns the number of
    /// addresses named.
    fn allocate_prefix(
        &mut self,
        prefix: &RawPrefix,
        store: &mut ZoneStore,
        placer: &RecordPlacer,
    ) -> Result<usize> {
        let network = match prefix.network()? {
            IpNet::V4(v4) => v4,
            IpNet::V6(v6) => {
                warn!("Skipping the IPv6 DHCP prefix {}.", v6);
                return Ok(0);
            }
        };
        let use_codenames = prefix.description.contains(&self.marker);
        let reserved = prefix.reserved(self.default_reserved);
        let start = u32::from(network.network())
            .checked_add(1)
            .and_then(|start| start.checked_add(reserved));
        let end = u32::from(network.broadcast()).checked_sub(1);
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if start <= end => (start, end),
            _ => {
                warn!(
                    "The DHCP pool of {} is empty ({} addresses reserved).",
                    network, reserved
                );
                return Ok(0);
            }
        };

        let mut count = 0;
        for address in (start..=end).map(Ipv4Addr::from) {
            let (label, domain) = if use_codenames {
                (self.codenames.next(&mut self.pos)?, &self.codename_domain)
            } else {
                (numeric_hostname(address), &self.numeric_domain)
            };
            let name = match domain.child(label.as_bytes()) {
                Ok(name) => name,
                Err(e) => {
                    warn!("Cannot name {} {:?} in {}: {}.", address, label, domain, e);
                    continue;
                }
            };
            let placement = placer.place(store, address.into(), &name);
            debug!("DHCP address {} is {} ({:?}).", address, name, placement);
            count += 1;
        }
        Ok(count)
    }
}

impl PlacementHook for DhcpHostnameAllocator {
    fn after_placement(
        &mut self,
        inventory: &dyn Inventory,
        store: &mut ZoneStore,
        placer: &RecordPlacer,
    ) -> Result<()> {
        // Each run hands out codenames from the start.
        self.pos = 0;
        let prefixes = inventory.dhcp_prefixes()?;
        let mut total = 0;
        for prefix in &prefixes {
            total += self.allocate_prefix(prefix, store, placer)?;
        }
        info!(
            "Named {} DHCP addresses in {} prefixes.",
            total,
            prefixes.len()
        );
        Ok(())
    }
}

/// Returns the `host-a-b-c-d` label for `address`.
fn numeric_hostname(address: Ipv4Addr) -> String {
    let [a, b, c, d] = address.octets();
    format!("host-{}-{}-{}-{}", a, b, c, d)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
