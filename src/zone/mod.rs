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

//! Implementation of DNS zone data structures, for building zones in
//! memory before they are written out.

use std::collections::BTreeMap;

use crate::name::Name;
use crate::rr::{Rdata, Rrset, RrsetList, Soa, Ttl, Type};

mod error;
mod validation;
pub use error::Error;
pub use validation::ValidationIssue;

/// A DNS zone under construction.
///
/// A `Zone` maps owner names to the [`RrsetList`]s they own. Owners are
/// kept in DNSSEC canonical order ([RFC 4034 § 6.1]), so iterating over
/// [`Zone::nodes`] yields the apex first and then every other owner in
/// a deterministic order.
///
/// Records are added one by one with [`Zone::add`], which accumulates
/// them into RRsets, or installed a whole RRset at a time with
/// [`Zone::replace`]. The zone's data can also be checked for semantic
/// correctness; see [`Zone::validate`] and the `validation` module,
/// which provides the implementation.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
#[derive(Clone, Debug)]
pub struct Zone {
    origin: Name,
    nodes: BTreeMap<Name, RrsetList>,
}

impl Zone {
    /// Creates a new `Zone` with the specified origin. The zone is
    /// initially empty.
    pub fn new(origin: Name) -> Self {
        Self {
            origin,
            nodes: BTreeMap::new(),
        }
    }

    /// Returns the zone's origin (the name of its apex).
    pub fn origin(&self) -> &Name {
        &self.origin
    }

    /// Adds a record to the `Zone`, returning whether it was new.
    ///
    /// The record is accumulated into the RRset of its type at `owner`;
    /// existing records are never overwritten. This will fail if the
    /// provided owner is not within the zone.
    pub fn add(&mut self, owner: &Name, ttl: Ttl, rdata: Rdata) -> Result<bool, Error> {
        self.check_owner(owner)?;
        Ok(self
            .nodes
            .entry(owner.clone())
            .or_default()
            .add(ttl, rdata))
    }

    /// Replaces the RRset at `owner` of `rrset`'s type with `rrset`,
    /// returning the RRset that was there before (if any). An empty
    /// `rrset` deletes the existing one.
    pub fn replace(&mut self, owner: &Name, rrset: Rrset) -> Result<Option<Rrset>, Error> {
        self.check_owner(owner)?;
        let list = self.nodes.entry(owner.clone()).or_default();
        let old = list.replace(rrset);
        if list.is_empty() {
            self.nodes.remove(owner);
        }
        Ok(old)
    }

    /// Looks up the RRset of type `rr_type` owned by `owner`.
    pub fn lookup(&self, owner: &Name, rr_type: Type) -> Option<&Rrset> {
        self.nodes.get(owner)?.lookup(rr_type)
    }

    /// Returns the RRsets owned by `owner`, if it owns any.
    pub fn node(&self, owner: &Name) -> Option<&RrsetList> {
        self.nodes.get(owner)
    }

    /// Returns an iterator over the owners of the zone and their
    /// RRsets, in canonical order.
    pub fn nodes(&self) -> impl Iterator<Item = (&Name, &RrsetList)> {
        self.nodes.iter()
    }

    /// Returns the zone's SOA RRset, if present.
    pub fn soa(&self) -> Option<&Rrset> {
        self.lookup(&self.origin, Type::SOA)
    }

    /// Returns the zone's SOA record data, if there is an SOA RRset.
    pub fn soa_rdata(&self) -> Option<&Soa> {
        self.soa()?.rdatas().find_map(|rdata| match rdata {
            Rdata::Soa(soa) => Some(soa),
            _ => None,
        })
    }

    /// Returns the zone's apex NS RRset, if present.
    pub fn ns(&self) -> Option<&Rrset> {
        self.lookup(&self.origin, Type::NS)
    }

    /// Returns the total number of records in the zone.
    pub fn record_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(RrsetList::iter)
            .map(Rrset::len)
            .sum()
    }

    fn check_owner(&self, owner: &Name) -> Result<(), Error> {
        if owner.eq_or_subdomain_of(&self.origin) {
            Ok(())
        } else {
            Err(Error::NotInZone(owner.clone()))
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;

    lazy_static! {
        static ref ORIGIN: Name = "example.org.".parse().unwrap();
        static ref HOST: Name = "host1.example.org.".parse().unwrap();
        static ref OUTSIDE: Name = "example.net.".parse().unwrap();
    }

    fn a(last: u8) -> Rdata {
        Rdata::A([10, 0, 0, last].into())
    }

    #[test]
    fn add_rejects_owner_outside_of_zone() {
        let mut zone = Zone::new(ORIGIN.clone());
        assert_eq!(
            zone.add(&OUTSIDE, Ttl::from(3600), a(5)),
            Err(Error::NotInZone(OUTSIDE.clone()))
        );
    }

    #[test]
    fn add_accumulates() {
        let mut zone = Zone::new(ORIGIN.clone());
        assert_eq!(zone.add(&HOST, Ttl::from(3600), a(5)), Ok(true));
        assert_eq!(zone.add(&HOST, Ttl::from(3600), a(6)), Ok(true));
        assert_eq!(zone.add(&HOST, Ttl::from(3600), a(5)), Ok(false));
        assert_eq!(zone.lookup(&HOST, Type::A).unwrap().len(), 2);
        assert_eq!(zone.record_count(), 2);
    }

    #[test]
    fn replace_with_empty_rrset_removes_node() {
        let mut zone = Zone::new(ORIGIN.clone());
        zone.add(&HOST, Ttl::from(3600), a(5)).unwrap();
        let old = zone
            .replace(&HOST, Rrset::new(Type::A, Ttl::from(3600)))
            .unwrap();
        assert_eq!(old.unwrap().len(), 1);
        assert!(zone.node(&HOST).is_none());
    }

    #[test]
    fn nodes_are_in_canonical_order() {
        let mut zone = Zone::new(ORIGIN.clone());
        let z: Name = "z.example.org.".parse().unwrap();
        let a_name: Name = "a.example.org.".parse().unwrap();
        zone.add(&z, Ttl::from(3600), a(1)).unwrap();
        zone.add(&a_name, Ttl::from(3600), a(2)).unwrap();
        zone.add(&ORIGIN, Ttl::from(3600), a(3)).unwrap();
        let owners: Vec<&Name> = zone.nodes().map(|(owner, _)| owner).collect();
        assert_eq!(owners, [&*ORIGIN, &a_name, &z]);
    }
}
