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

//! The in-memory registry of zones built during a run.
//!
//! A [`ZoneStore`] owns every [`Zone`] in an arena and hands out
//! [`ZoneId`]s. Alongside the arena it maintains two indices: a
//! [`Catalog`] tree for longest-match forward lookups, and a reverse
//! index from covered networks to zones. Once all mutation is done,
//! [`ZoneStore::freeze`] converts the store into [`FrozenZones`], which
//! exposes only read access.

use std::collections::HashMap;
use std::net::IpAddr;

use ipnet::{Ipv4Net, Ipv6Net};
use slab::Slab;

use crate::name::Name;
use crate::zone::Zone;

mod catalog;
pub use catalog::Catalog;

////////////////////////////////////////////////////////////////////////
// ZONE STORE                                                         //
////////////////////////////////////////////////////////////////////////

/// The identifier of a [`Zone`] inside a [`ZoneStore`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ZoneId(usize);

/// A mutable registry of zones, indexed by name and by the networks
/// they cover.
#[derive(Debug, Default)]
pub struct ZoneStore {
    zones: Slab<Zone>,
    by_name: HashMap<Name, ZoneId>,
    catalog: Catalog<ZoneId>,
    ipv4_index: HashMap<Ipv4Net, ZoneId>,
    ipv6_index: Vec<(Ipv6Net, ZoneId)>,
}

impl ZoneStore {
    /// Creates a new, empty `ZoneStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID of the zone with origin `origin`, creating the
    /// zone with `create` if it does not exist yet. The returned flag
    /// is true if the zone was created.
    pub fn get_or_insert_with(
        &mut self,
        origin: &Name,
        create: impl FnOnce() -> Zone,
    ) -> (ZoneId, bool) {
        if let Some(id) = self.by_name.get(origin) {
            return (*id, false);
        }
        let zone = create();
        debug_assert_eq!(zone.origin(), origin);
        let id = ZoneId(self.zones.insert(zone));
        self.by_name.insert(origin.clone(), id);
        self.catalog.replace(origin, id);
        (id, true)
    }

    /// Registers `subnet` (which should be a /24) as covered by the
    /// zone `id`. Returns the zone that already covered it, if any; in
    /// that case the existing registration is kept.
    pub fn cover_ipv4(&mut self, subnet: Ipv4Net, id: ZoneId) -> Option<ZoneId> {
        let subnet = subnet.trunc();
        match self.ipv4_index.get(&subnet) {
            Some(existing) => Some(*existing),
            None => {
                self.ipv4_index.insert(subnet, id);
                None
            }
        }
    }

    /// Registers `network` as covered by the zone `id`. Returns the zone
    /// that already covered exactly this network, if any; in that case
    /// the existing registration is kept.
    pub fn cover_ipv6(&mut self, network: Ipv6Net, id: ZoneId) -> Option<ZoneId> {
        let network = network.trunc();
        if let Some((_, existing)) = self.ipv6_index.iter().find(|(n, _)| *n == network) {
            Some(*existing)
        } else {
            self.ipv6_index.push((network, id));
            None
        }
    }

    /// Returns the ID of the zone with origin `origin`.
    pub fn id(&self, origin: &Name) -> Option<ZoneId> {
        self.by_name.get(origin).copied()
    }

    /// Returns the zone `id`.
    pub fn get(&self, id: ZoneId) -> &Zone {
        &self.zones[id.0]
    }

    /// Returns the zone `id` for mutation.
    pub fn get_mut(&mut self, id: ZoneId) -> &mut Zone {
        &mut self.zones[id.0]
    }

    /// Finds the zone with the longest origin that is equal to or an
    /// ancestor of `name`.
    pub fn find_forward(&self, name: &Name) -> Option<ZoneId> {
        self.catalog.lookup(name).copied()
    }

    /// Finds the reverse zone whose covered range contains `address`.
    /// IPv4 lookups are a single hash lookup of the address's /24;
    /// IPv6 lookups scan the registered buckets.
    pub fn find_reverse(&self, address: IpAddr) -> Option<ZoneId> {
        match address {
            IpAddr::V4(v4) => {
                // NOTE: the unwrap() is okay, since 24 is a valid
                // prefix length.
                let subnet = Ipv4Net::new(v4, 24).unwrap().trunc();
                self.ipv4_index.get(&subnet).copied()
            }
            IpAddr::V6(v6) => self
                .ipv6_index
                .iter()
                .find(|(network, _)| network.contains(&v6))
                .map(|(_, id)| *id),
        }
    }

    /// Returns the number of zones in the store.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns whether the store has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Returns an iterator over the zones of the store, in the order
    /// they were created.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &Zone)> {
        self.zones.iter().map(|(index, zone)| (ZoneId(index), zone))
    }

    /// Ends the mutable phase, returning the zones in canonical order
    /// of their origins.
    pub fn freeze(self) -> FrozenZones {
        let mut zones: Vec<Zone> = self.zones.into_iter().map(|(_, zone)| zone).collect();
        zones.sort_by(|a, b| a.origin().cmp(b.origin()));
        FrozenZones { zones }
    }
}

////////////////////////////////////////////////////////////////////////
// FROZEN ZONES                                                       //
////////////////////////////////////////////////////////////////////////

/// The read-only result of a zone generation run.
#[derive(Clone, Debug)]
pub struct FrozenZones {
    zones: Vec<Zone>,
}

impl FrozenZones {
    /// Looks up a zone by origin.
    pub fn get(&self, origin: &Name) -> Option<&Zone> {
        self.zones
            .binary_search_by(|zone| zone.origin().cmp(origin))
            .ok()
            .map(|index| &self.zones[index])
    }

    /// Returns an iterator over the zones, in canonical order of their
    /// origins.
    pub fn iter(&self) -> std::slice::Iter<Zone> {
        self.zones.iter()
    }

    /// Returns the number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns whether there are no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl<'a> IntoIterator for &'a FrozenZones {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
