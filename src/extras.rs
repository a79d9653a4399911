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

//! Operator-authored overrides of generated zone data.
//!
//! The extras document is YAML, mapping zone names (with or without
//! the trailing period) to lists of record definitions in zone-file
//! syntax:
//!
//! ```yaml
//! example.org:
//!   - host1 IN A 10.0.0.9
//!   - "@ IN TXT \"v=spf1 -all\""
//! ```
//!
//! [`ExtrasMerger::merge`] *replaces* the RRsets that the definitions
//! name, rather than accumulating into them. This is the only path by
//! which generated records are overwritten. Zones are merged in
//! document order; if two keys name the same zone (say `example.org`
//! and `example.org.`), the later key's RRsets replace the earlier's.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info};
use serde::{de, Deserialize};

use crate::name::Name;
use crate::rr::{Rrset, Ttl, Type};
use crate::store::ZoneStore;
use crate::zone_file::Parser;
use crate::{Error, Result};

////////////////////////////////////////////////////////////////////////
// EXTRAS DOCUMENT                                                    //
////////////////////////////////////////////////////////////////////////

/// A parsed extras document: record definitions by zone, in document
/// order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extras {
    zones: Vec<(String, Vec<String>)>,
}

impl<'de> Deserialize<'de> for Extras {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(ExtrasVisitor)
    }
}

/// A [`Visitor`](de::Visitor) that keeps the zones of an extras
/// document in document order.
struct ExtrasVisitor;

impl<'de> de::Visitor<'de> for ExtrasVisitor {
    type Value = Extras;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping from zone names to lists of record definitions")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut zones = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
            zones.push(entry);
        }
        Ok(Extras { zones })
    }
}

impl Extras {
    /// Parses an extras document from YAML text. An empty document
    /// yields no extras.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Returns an iterator over the zones named by the document and
    /// their record definitions, in document order. Zone names are
    /// parsed as fully qualified names.
    pub fn iter(&self) -> impl Iterator<Item = Result<(Name, &[String])>> {
        self.zones.iter().map(|(zone, definitions)| {
            let name = zone
                .parse::<Name>()
                .map_err(|source| Error::InvalidZoneName {
                    zone: zone.clone(),
                    source,
                })?;
            Ok((name, definitions.as_slice()))
        })
    }

    /// Returns whether the document has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// EXTRAS MERGER                                                      //
////////////////////////////////////////////////////////////////////////

/// Applies extras to the zones of a [`ZoneStore`].
#[derive(Clone, Copy, Debug)]
pub struct ExtrasMerger {
    default_ttl: Ttl,
}

impl ExtrasMerger {
    /// Creates a new `ExtrasMerger`. Definitions without a TTL get
    /// `default_ttl`.
    pub fn new(default_ttl: Ttl) -> Self {
        Self { default_ttl }
    }

    /// Applies every zone of `extras`, in document order.
    pub fn merge_all(&self, store: &mut ZoneStore, extras: &Extras) -> Result<usize> {
        let mut total = 0;
        for entry in extras.iter() {
            let (zone, definitions) = entry?;
            total += self.merge(store, &zone, definitions)?;
        }
        info!("Merged {} extra RRsets.", total);
        Ok(total)
    }

    /// Parses `definitions` relative to the zone `zone_name`, groups
    /// them into RRsets by owner and type, and replaces the zone's
    /// existing RRset for each. Returns the number of RRsets replaced
    /// or created.
    ///
    /// This fails with [`Error::UnknownZone`] if the zone does not
    /// exist, and with [`Error::ExtrasSyntax`] or [`Error::Zone`] if a
    /// definition cannot be parsed or lies outside the zone. Nothing is
    /// changed in the zone unless every definition is valid.
    pub fn merge<S: AsRef<str>>(
        &self,
        store: &mut ZoneStore,
        zone_name: &Name,
        definitions: &[S],
    ) -> Result<usize> {
        let id = store
            .id(zone_name)
            .ok_or_else(|| Error::UnknownZone(zone_name.clone()))?;
        let parser = Parser::new(zone_name.clone(), self.default_ttl);

        let mut rrsets: BTreeMap<(Name, Type), Rrset> = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            let parsed = parser
                .parse(definition.as_ref())
                .map_err(|source| Error::ExtrasSyntax {
                    zone: zone_name.clone(),
                    definition: index,
                    source,
                })?;
            let rr_type = parsed.rdata.rr_type();
            let rrset = rrsets
                .entry((parsed.owner, rr_type))
                .or_insert_with(|| Rrset::new(rr_type, parsed.ttl));
            rrset.ttl = rrset.ttl.min(parsed.ttl);
            rrset.push_rdata(parsed.rdata);
        }

        let zone = store.get_mut(id);
        if let Some(((owner, _), _)) = rrsets
            .iter()
            .find(|((owner, _), _)| !owner.eq_or_subdomain_of(zone_name))
        {
            return Err(Error::Zone {
                zone: zone_name.clone(),
                source: crate::zone::Error::NotInZone(owner.clone()),
            });
        }
        let count = rrsets.len();
        for ((owner, rr_type), rrset) in rrsets {
            debug!("Replacing the {} RRset of {} in {}.", rr_type, owner, zone_name);
            zone.replace(&owner, rrset).map_err(|source| Error::Zone {
                zone: zone_name.clone(),
                source,
            })?;
        }
        Ok(count)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::rr::Rdata;
    use crate::zone::Zone;

    lazy_static! {
        static ref ORIGIN: Name = "example.org.".parse().unwrap();
        static ref HOST1: Name = "host1.example.org.".parse().unwrap();
    }

    fn store() -> ZoneStore {
        let mut store = ZoneStore::new();
        let (id, _) = store.get_or_insert_with(&ORIGIN, || Zone::new(ORIGIN.clone()));
        let zone = store.get_mut(id);
        zone.add(&HOST1, Ttl::from(3600), Rdata::A("10.0.0.5".parse().unwrap()))
            .unwrap();
        zone.add(&HOST1, Ttl::from(3600), Rdata::A("10.0.0.6".parse().unwrap()))
            .unwrap();
        store
    }

    fn a_records(store: &ZoneStore) -> Vec<Rdata> {
        let zone = store.get(store.id(&ORIGIN).unwrap());
        zone.lookup(&HOST1, Type::A)
            .map(|rrset| rrset.rdatas().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn merge_replaces_whole_rrset() {
        let mut store = store();
        let merger = ExtrasMerger::new(Ttl::from(3600));
        let count = merger
            .merge(&mut store, &ORIGIN, &["host1 IN A 10.0.0.9"])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(a_records(&store), [Rdata::A("10.0.0.9".parse().unwrap())]);
    }

    #[test]
    fn merge_groups_definitions_into_rrsets() {
        let mut store = store();
        let merger = ExtrasMerger::new(Ttl::from(3600));
        merger
            .merge(
                &mut store,
                &ORIGIN,
                &["host1 A 10.0.0.9", "host1 A 10.0.0.10", "www CNAME host1"],
            )
            .unwrap();
        assert_eq!(a_records(&store).len(), 2);
        let zone = store.get(store.id(&ORIGIN).unwrap());
        assert!(zone
            .lookup(&"www.example.org.".parse().unwrap(), Type::CNAME)
            .is_some());
    }

    #[test]
    fn merge_fails_for_unknown_zone() {
        let mut store = store();
        let merger = ExtrasMerger::new(Ttl::from(3600));
        let unknown: Name = "example.net.".parse().unwrap();
        assert!(matches!(
            merger.merge(&mut store, &unknown, &["host1 A 10.0.0.9"]),
            Err(Error::UnknownZone(name)) if name == unknown
        ));
    }

    #[test]
    fn merge_is_all_or_nothing() {
        let mut store = store();
        let merger = ExtrasMerger::new(Ttl::from(3600));
        assert!(matches!(
            merger.merge(&mut store, &ORIGIN, &["host1 A 10.0.0.9", "host2 A bogus"]),
            Err(Error::ExtrasSyntax { definition: 1, .. })
        ));
        assert!(matches!(
            merger.merge(&mut store, &ORIGIN, &["host1 A 10.0.0.9", "x.example.net. A 10.0.0.1"]),
            Err(Error::Zone { .. })
        ));
        assert_eq!(a_records(&store).len(), 2);
    }

    #[test]
    fn extras_document_accepts_names_without_trailing_dot() {
        let extras = Extras::from_yaml(
            "example.org:\n  - host1 IN A 10.0.0.9\n\"example.net.\":\n  - \"@ TXT hello\"\n",
        )
        .unwrap();
        let zones: Vec<String> = extras
            .iter()
            .map(|entry| entry.unwrap().0.to_string())
            .collect();
        assert_eq!(zones, ["example.org.", "example.net."]);

        let mut store = store();
        let total = ExtrasMerger::new(Ttl::from(3600))
            .merge_all(
                &mut store,
                &Extras::from_yaml("example.org:\n  - host1 IN A 10.0.0.9\n").unwrap(),
            )
            .unwrap();
        assert_eq!(total, 1);
        assert!(Extras::from_yaml("").unwrap().is_empty());
        let bad = Extras::from_yaml("\"a..b\":\n  - x A 10.0.0.1\n").unwrap();
        assert!(matches!(
            bad.iter().next(),
            Some(Err(Error::InvalidZoneName { .. }))
        ));
    }

    #[test]
    fn later_keys_for_the_same_zone_win() {
        let extras = Extras::from_yaml(
            "\"example.org.\":\n  - host1 A 10.0.0.1\nexample.org:\n  - host1 A 10.0.0.2\n",
        )
        .unwrap();
        let mut store = store();
        ExtrasMerger::new(Ttl::from(3600))
            .merge_all(&mut store, &extras)
            .unwrap();
        assert_eq!(a_records(&store), [Rdata::A("10.0.0.2".parse().unwrap())]);
    }

    #[test]
    fn merge_accepts_any_record_type() {
        let mut store = store();
        ExtrasMerger::new(Ttl::from(3600))
            .merge(
                &mut store,
                &ORIGIN,
                &[
                    "@ CAA 0 issue \"letsencrypt.org\"",
                    "ssh SSHFP 1 1 0123456789abcdef0123456789abcdef01234567",
                    r"x TYPE65280 \# 3 0A0B0C",
                ],
            )
            .unwrap();
        let zone = store.get(store.id(&ORIGIN).unwrap());
        let caa = zone.lookup(&ORIGIN, Type::CAA).unwrap();
        assert_eq!(
            caa.rdatas().next().unwrap().to_string(),
            "0 issue \"letsencrypt.org\""
        );
        let ssh: Name = "ssh.example.org.".parse().unwrap();
        assert!(zone.lookup(&ssh, Type::SSHFP).is_some());
        let x: Name = "x.example.org.".parse().unwrap();
        let private = zone.lookup(&x, Type::from(65280)).unwrap();
        assert_eq!(private.rdatas().next().unwrap().to_string(), r"\# 3 0A0B0C");
    }
}
