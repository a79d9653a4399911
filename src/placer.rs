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

//! Placement of address records into zones.

use std::net::IpAddr;

use log::{debug, error};

use crate::inventory::Inventory;
use crate::name::Name;
use crate::reverse::reverse_name;
use crate::rr::{Rdata, Ttl};
use crate::store::{ZoneId, ZoneStore};
use crate::Result;

/// Adds the forward (A/AAAA) and reverse (PTR) records of named
/// addresses to the zones of a [`ZoneStore`].
#[derive(Clone, Copy, Debug)]
pub struct RecordPlacer {
    ttl: Ttl,
}

/// What [`RecordPlacer::place`] did with an address. Each field is
/// the origin of the zone that received a record, if any.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Placement {
    pub forward: Option<Name>,
    pub reverse: Option<Name>,
}

impl RecordPlacer {
    /// Creates a new `RecordPlacer` that gives records the TTL `ttl`.
    pub fn new(ttl: Ttl) -> Self {
        Self { ttl }
    }

    /// Places the records for `address` named `dns_name`.
    ///
    /// The forward record goes to the zone with the longest origin
    /// that is equal to or an ancestor of `dns_name`. The PTR record
    /// goes to the reverse zone whose range contains `address`. Both
    /// are attempted, and records are accumulated alongside any that
    /// are already present. If no zone is found for either, that half
    /// is skipped.
    pub fn place(&self, store: &mut ZoneStore, address: IpAddr, dns_name: &Name) -> Placement {
        let forward_rdata = match address {
            IpAddr::V4(v4) => Rdata::A(v4),
            IpAddr::V6(v6) => Rdata::Aaaa(v6),
        };
        let forward = match store.find_forward(dns_name) {
            Some(id) => self.add(store, id, dns_name, forward_rdata),
            None => {
                debug!("No forward zone for {}; skipping {}.", dns_name, address);
                None
            }
        };

        let reverse = match store.find_reverse(address) {
            Some(id) => {
                let owner = reverse_name(address);
                self.add(store, id, &owner, Rdata::Ptr(dns_name.clone()))
            }
            None => {
                debug!("No reverse zone for {}; skipping its PTR.", address);
                None
            }
        };

        Placement { forward, reverse }
    }

    /// Adds a record to the zone `id`, returning the zone's origin on
    /// success.
    fn add(&self, store: &mut ZoneStore, id: ZoneId, owner: &Name, rdata: Rdata) -> Option<Name> {
        let zone = store.get_mut(id);
        match zone.add(owner, self.ttl, rdata) {
            Ok(_) => Some(zone.origin().clone()),
            Err(e) => {
                error!("Could not add a record to {}: {}.", zone.origin(), e);
                None
            }
        }
    }
}

/// A step that runs right after inventory addresses have been placed,
/// and may place further records of its own.
pub trait PlacementHook {
    fn after_placement(
        &mut self,
        inventory: &dyn Inventory,
        store: &mut ZoneStore,
        placer: &RecordPlacer,
    ) -> Result<()>;
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rr::Type;
    use crate::zone::Zone;

    fn store_with(origins: &[&str]) -> ZoneStore {
        let mut store = ZoneStore::new();
        for origin in origins {
            let origin: Name = origin.parse().unwrap();
            store.get_or_insert_with(&origin, || Zone::new(origin.clone()));
        }
        store
    }

    fn cover(store: &mut ZoneStore, origin: &str, network: &str) {
        let id = store.id(&origin.parse().unwrap()).unwrap();
        match network.parse::<ipnet::IpNet>().unwrap() {
            ipnet::IpNet::V4(v4) => store.cover_ipv4(v4, id),
            ipnet::IpNet::V6(v6) => store.cover_ipv6(v6, id),
        };
    }

    #[test]
    fn place_adds_forward_and_reverse_records() {
        let mut store = store_with(&["example.org.", "0.0.10.in-addr.arpa."]);
        cover(&mut store, "0.0.10.in-addr.arpa.", "10.0.0.0/24");
        let placer = RecordPlacer::new(Ttl::from(3600));
        let host1: Name = "host1.example.org.".parse().unwrap();
        let placement = placer.place(&mut store, "10.0.0.5".parse().unwrap(), &host1);
        assert_eq!(placement.forward, Some("example.org.".parse().unwrap()));
        assert_eq!(
            placement.reverse,
            Some("0.0.10.in-addr.arpa.".parse().unwrap())
        );

        let forward = store.get(store.id(&"example.org.".parse().unwrap()).unwrap());
        let a = forward.lookup(&host1, Type::A).unwrap();
        assert_eq!(a.rdatas().next(), Some(&Rdata::A("10.0.0.5".parse().unwrap())));
        let reverse = store.get(store.find_reverse("10.0.0.5".parse().unwrap()).unwrap());
        let ptr = reverse
            .lookup(&"5.0.0.10.in-addr.arpa.".parse().unwrap(), Type::PTR)
            .unwrap();
        assert_eq!(ptr.rdatas().next(), Some(&Rdata::Ptr(host1.clone())));
    }

    #[test]
    fn place_accumulates_for_multihomed_hosts() {
        let mut store = store_with(&["example.org."]);
        let placer = RecordPlacer::new(Ttl::from(3600));
        let host1: Name = "host1.example.org.".parse().unwrap();
        placer.place(&mut store, "10.0.0.5".parse().unwrap(), &host1);
        placer.place(&mut store, "10.0.0.6".parse().unwrap(), &host1);
        placer.place(&mut store, "2001:db8::5".parse().unwrap(), &host1);
        let zone = store.get(store.find_forward(&host1).unwrap());
        assert_eq!(zone.lookup(&host1, Type::A).unwrap().len(), 2);
        assert_eq!(zone.lookup(&host1, Type::AAAA).unwrap().len(), 1);
    }

    #[test]
    fn place_halves_are_independent() {
        let mut store = store_with(&["0.0.10.in-addr.arpa."]);
        cover(&mut store, "0.0.10.in-addr.arpa.", "10.0.0.0/24");
        let placer = RecordPlacer::new(Ttl::from(3600));
        let outside: Name = "host1.example.net.".parse().unwrap();
        let placement = placer.place(&mut store, "10.0.0.5".parse().unwrap(), &outside);
        assert_eq!(placement.forward, None);
        assert!(placement.reverse.is_some());

        let mut store = store_with(&["example.org."]);
        let host1: Name = "host1.example.org.".parse().unwrap();
        let placement = placer.place(&mut store, "192.0.2.1".parse().unwrap(), &host1);
        assert!(placement.forward.is_some());
        assert_eq!(placement.reverse, None);
    }

    #[test]
    fn place_uses_longest_matching_zone() {
        let mut store = store_with(&["example.org.", "lab.example.org."]);
        let placer = RecordPlacer::new(Ttl::from(3600));
        let host: Name = "host1.lab.example.org.".parse().unwrap();
        let placement = placer.place(&mut store, "10.0.0.5".parse().unwrap(), &host);
        assert_eq!(placement.forward, Some("lab.example.org.".parse().unwrap()));
    }
}
