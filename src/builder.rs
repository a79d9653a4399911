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

//! Creation of zone skeletons.
//!
//! The [`ZoneBuilder`] creates one zone per reverse bucket of every
//! aggregate and one per forward domain, each seeded with an SOA record
//! and the configured NS records, and registers them in a
//! [`ZoneStore`]. How aggregates are cut into reverse buckets is
//! decided by a [`ReverseZonePolicy`].

use std::time::{SystemTime, UNIX_EPOCH};

use ipnet::{IpNet, Ipv4Net};
use log::{debug, info, warn};

use crate::name::Name;
use crate::reverse::{ipv4_reverse_zone, ipv6_reverse_zone, ipv6_zone_networks};
use crate::rr::{Rdata, Soa, Ttl};
use crate::store::{ZoneId, ZoneStore};
use crate::zone::Zone;
use crate::Result;

////////////////////////////////////////////////////////////////////////
// REVERSE ZONE POLICIES                                              //
////////////////////////////////////////////////////////////////////////

/// A reverse zone to create for part of an aggregate, together with
/// the network range whose PTR records it holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReverseBucket {
    pub zone: Name,
    pub coverage: IpNet,
}

/// Decides how an aggregate is divided into reverse zones.
pub trait ReverseZonePolicy {
    fn buckets(&self, aggregate: IpNet) -> Result<Vec<ReverseBucket>>;
}

/// The standard reverse zone policy: IPv4 aggregates are split into
/// /24s, each with its own `in-addr.arpa.` zone, and IPv6 aggregates
/// are split at the next nibble boundary, each part with its own
/// `ip6.arpa.` zone of `ceil(L / 4)` labels. An IPv6 aggregate whose
/// prefix length is a multiple of four thus gets exactly one zone.
///
/// An IPv4 aggregate longer than a /24 is given the bucket of the /24
/// that encloses it.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPolicy;

impl ReverseZonePolicy for StandardPolicy {
    fn buckets(&self, aggregate: IpNet) -> Result<Vec<ReverseBucket>> {
        match aggregate {
            IpNet::V4(v4) => {
                let subnets: Vec<Ipv4Net> = if v4.prefix_len() > 24 {
                    // NOTE: the unwrap() is okay, since 24 is a valid
                    // prefix length.
                    vec![Ipv4Net::new(v4.network(), 24).unwrap().trunc()]
                } else {
                    // NOTE: the unwrap() is okay, since the prefix
                    // length is at most 24.
                    v4.subnets(24).unwrap().collect()
                };
                subnets
                    .into_iter()
                    .map(|subnet| {
                        Ok(ReverseBucket {
                            zone: ipv4_reverse_zone(subnet)?,
                            coverage: IpNet::V4(subnet),
                        })
                    })
                    .collect()
            }
            IpNet::V6(v6) => ipv6_zone_networks(v6)
                .into_iter()
                .map(|network| {
                    Ok(ReverseBucket {
                        zone: ipv6_reverse_zone(network)?,
                        coverage: IpNet::V6(network),
                    })
                })
                .collect(),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ZONE BUILDER                                                       //
////////////////////////////////////////////////////////////////////////

/// The SOA fields that are the same for every generated zone. The
/// serial and minimum come from the [`ZoneBuilder`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SoaParams {
    pub mname: Name,
    pub rname: Name,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
}

/// Creates zone skeletons (SOA and NS records) and registers them.
#[derive(Clone, Debug)]
pub struct ZoneBuilder {
    soa: SoaParams,
    name_servers: Vec<Name>,
    ttl: Ttl,
    serial: u32,
}

impl ZoneBuilder {
    /// Creates a new `ZoneBuilder`. The SOA serial is the current UNIX
    /// time, so that it increases from run to run; see
    /// [`ZoneBuilder::with_serial`] to override it.
    pub fn new(soa: SoaParams, name_servers: Vec<Name>, ttl: Ttl) -> Self {
        let serial = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        Self {
            soa,
            name_servers,
            ttl,
            serial,
        }
    }

    /// Overrides the SOA serial.
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    /// Returns the SOA serial given to every zone.
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the TTL given to every generated record.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Returns a new zone with origin `origin` containing only the SOA
    /// and NS records.
    pub fn skeleton(&self, origin: Name) -> Zone {
        let mut zone = Zone::new(origin.clone());
        let soa = Rdata::Soa(Soa {
            mname: self.soa.mname.clone(),
            rname: self.soa.rname.clone(),
            serial: self.serial,
            refresh: self.soa.refresh,
            retry: self.soa.retry,
            expire: self.soa.expire,
            minimum: self.ttl.into(),
        });
        // NOTE: the unwrap()s are okay, since the owner is the origin.
        zone.add(&origin, self.ttl, soa).unwrap();
        for ns in &self.name_servers {
            zone.add(&origin, self.ttl, Rdata::Ns(ns.clone())).unwrap();
        }
        zone
    }

    /// Creates the skeletons of all reverse zones for `aggregates` (as
    /// cut by `policy`) and of all `forward_domains`, registering them
    /// in `store`.
    ///
    /// Overlapping aggregates can produce the same bucket twice; the
    /// zone created first is kept, with a warning.
    pub fn build(
        &self,
        store: &mut ZoneStore,
        policy: &dyn ReverseZonePolicy,
        aggregates: &[IpNet],
        forward_domains: &[Name],
    ) -> Result<()> {
        let mut n_reverse = 0;
        for aggregate in aggregates {
            for bucket in policy.buckets(*aggregate)? {
                let id = self.register(store, &bucket.zone, "reverse");
                let existing = match bucket.coverage {
                    IpNet::V4(v4) => store.cover_ipv4(v4, id),
                    IpNet::V6(v6) => store.cover_ipv6(v6, id),
                };
                match existing {
                    Some(existing) if existing != id => warn!(
                        "{} is already covered by {}; not registering {} for it.",
                        bucket.coverage,
                        store.get(existing).origin(),
                        bucket.zone,
                    ),
                    _ => n_reverse += 1,
                }
                debug!("Reverse zone {} covers {}.", bucket.zone, bucket.coverage);
            }
        }

        for domain in forward_domains {
            self.register(store, domain, "forward");
        }
        info!(
            "Built {} zone skeletons ({} reverse buckets, {} forward domains).",
            store.len(),
            n_reverse,
            forward_domains.len(),
        );
        Ok(())
    }

    /// Looks up or creates the zone `origin`, warning if it already
    /// existed.
    fn register(&self, store: &mut ZoneStore, origin: &Name, kind: &str) -> ZoneId {
        let (id, created) = store.get_or_insert_with(origin, || self.skeleton(origin.clone()));
        if !created {
            warn!(
                "The {} zone {} was produced more than once; reusing the first.",
                kind, origin,
            );
        }
        id
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
