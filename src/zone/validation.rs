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

//! Implementation of zone validation, to detect semantic errors and
//! warnings in a generated zone before it is written out.
//!
//! [RFC 1035 § 5.2] (corrected by [Erratum 5626]) indicates that a zone
//! file should be checked for semantic errors in addition to syntactic
//! errors. The checks implemented by [`Zone::validate`] are:
//!
//! 1. Exactly one SOA record must be present at the zone apex.
//! 2. ([Erratum 5626]) At least one NS record must be present at the
//!    zone apex.
//! 3. A name cannot own more than one CNAME record.
//! 4. A name cannot own a CNAME record and another record of a
//!    different type.
//! 5. Any in-zone nameservers referenced by NS records must have A or
//!    AAAA records.
//! 6. Any in-zone mail exchangers referenced by MX records should have
//!    A or AAAA records (warning only).
//!
//! The owners of all records being at or below the zone apex is
//! enforced by [`Zone::add`] instead, and a consistent TTL within each
//! RRset by the [`RrsetList`] itself.
//!
//! [RFC 1035 § 5.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.2
//! [Erratum 5626]: https://www.rfc-editor.org/errata/eid5626

use std::fmt;

use crate::name::Name;
use crate::rr::{Rdata, RrsetList, Type};

use super::{Error, Zone};

////////////////////////////////////////////////////////////////////////
// VALIDATION ISSUES                                                  //
////////////////////////////////////////////////////////////////////////

/// Indicates a semantic error or warning found in a zone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidationIssue {
    MissingApexSoa,
    TooManyApexSoas,
    MissingApexNs,
    MissingNsAddress(Name),
    MissingMxAddress(Name),
    DuplicateCname(Name),
    OtherRecordsAtCname(Name),
}

impl ValidationIssue {
    /// Returns whether the `ValidationIssue` represents a (fatal)
    /// error. Otherwise, it is a warning.
    pub fn is_error(&self) -> bool {
        !matches!(*self, Self::MissingMxAddress(_))
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingApexSoa => f.write_str("the zone is missing an SOA record"),
            Self::TooManyApexSoas => {
                f.write_str("the zone has too many SOA records (precisely one is needed)")
            }
            Self::MissingApexNs => f.write_str("the zone is missing an NS record"),
            Self::MissingNsAddress(nsdname) => write!(
                f,
                "the in-zone nameserver {} is missing an address",
                nsdname
            ),
            Self::MissingMxAddress(name) => write!(
                f,
                "the in-zone mail exchanger {} is missing an address",
                name
            ),
            Self::DuplicateCname(name) => {
                write!(f, "the name {} has duplicate CNAME records", name)
            }
            Self::OtherRecordsAtCname(name) => write!(
                f,
                "the name {}, which has a CNAME record, cannot have other records",
                name
            ),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// VALIDATION LOGIC                                                   //
////////////////////////////////////////////////////////////////////////

impl Zone {
    /// Checks a zone for semantic errors and warnings (other than those
    /// that are caught in [`Zone::add`]).
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        // Check 1: there must be exactly one SOA record for the zone.
        if let Some(soa_rrset) = self.soa() {
            if soa_rrset.len() != 1 {
                issues.push(ValidationIssue::TooManyApexSoas);
            }
        } else {
            issues.push(ValidationIssue::MissingApexSoa);
        }

        // Check 2: there must be at least one NS record for the zone.
        if self.ns().is_none() {
            issues.push(ValidationIssue::MissingApexNs);
        }

        // Now, we scan the nodes of the zone, which will perform the
        // CNAME checks (3 and 4), NS address checks (5), and MX address
        // checks (6).
        for (owner, rrsets) in self.nodes() {
            scan_node(self, owner, rrsets, &mut issues);
        }
        issues
    }

    /// Like [`Zone::validate`], but logs warnings and fails with
    /// [`Error::Invalid`] if any of the issues found is an error.
    pub fn check(&self) -> Result<(), Error> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(|i| i.is_error());
        for warning in warnings {
            log::warn!("Zone {}: {}.", self.origin(), warning);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid(errors))
        }
    }
}

/// Checks a single node for semantic errors and warnings.
fn scan_node(zone: &Zone, owner: &Name, rrsets: &RrsetList, issues: &mut Vec<ValidationIssue>) {
    if let Some(cname_rrset) = rrsets.lookup(Type::CNAME) {
        if rrsets.len() != 1 {
            issues.push(ValidationIssue::OtherRecordsAtCname(owner.clone()));
        }
        if cname_rrset.len() != 1 {
            issues.push(ValidationIssue::DuplicateCname(owner.clone()));
        }
    }

    if let Some(ns_rrset) = rrsets.lookup(Type::NS) {
        for rdata in ns_rrset.rdatas() {
            if let Rdata::Ns(nsdname) = rdata {
                if !in_zone_has_address(zone, nsdname) {
                    issues.push(ValidationIssue::MissingNsAddress(nsdname.clone()));
                }
            }
        }
    }

    if let Some(mx_rrset) = rrsets.lookup(Type::MX) {
        for rdata in mx_rrset.rdatas() {
            if let Rdata::Mx { exchange, .. } = rdata {
                if !in_zone_has_address(zone, exchange) {
                    issues.push(ValidationIssue::MissingMxAddress(exchange.clone()));
                }
            }
        }
    }
}

/// Returns false only if `name` is within `zone` and owns no address
/// records there.
fn in_zone_has_address(zone: &Zone, name: &Name) -> bool {
    if !name.eq_or_subdomain_of(zone.origin()) {
        return true;
    }
    zone.node(name).map_or(false, has_address)
}

/// Helper to determine whether an [`RrsetList`] contains an address
/// RRset (i.e., an A or AAAA RRset).
fn has_address(rrsets: &RrsetList) -> bool {
    rrsets
        .iter()
        .any(|rrset| rrset.rr_type == Type::A || rrset.rr_type == Type::AAAA)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::super::Zone;
    use super::ValidationIssue;
    use crate::name::Name;
    use crate::rr::{Rdata, Soa, Ttl};

    lazy_static! {
        static ref APEX: Name = "zonegen.test.".parse().unwrap();
        static ref NS: Name = "ns.zonegen.test.".parse().unwrap();
        static ref MX: Name = "mx.zonegen.test.".parse().unwrap();
        static ref HOST1: Name = "HOST1.zonegen.test.".parse().unwrap();
        static ref HOST2: Name = "HOST2.zonegen.test.".parse().unwrap();
        static ref HOST3: Name = "HOST3.zonegen.test.".parse().unwrap();
        static ref SUBDEL: Name = "subdel.zonegen.test.".parse().unwrap();
        static ref NS_SUBDEL: Name = "ns.subdel.zonegen.test.".parse().unwrap();
        static ref OUTSIDE_NS: Name = "ns.example.net.".parse().unwrap();
    }

    fn soa(serial: u32) -> Rdata {
        Rdata::Soa(Soa {
            mname: NS.clone(),
            rname: "hostmaster.zonegen.test.".parse().unwrap(),
            serial,
            refresh: 3600,
            retry: 600,
            expire: 86400,
            minimum: 300,
        })
    }

    fn localhost() -> Rdata {
        Rdata::A([127, 0, 0, 1].into())
    }

    fn add_rr(zone: &mut Zone, owner: &Name, rdata: Rdata) {
        zone.add(owner, Ttl::from(3600), rdata).unwrap();
    }

    fn add_basic_rrs(zone: &mut Zone) {
        add_rr(zone, &APEX, soa(0));
        add_rr(zone, &APEX, Rdata::Ns(NS.clone()));
        add_rr(zone, &NS, localhost());
    }

    #[test]
    fn validate_accepts_basic_zone() {
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        assert_eq!(zone.validate(), []);
        assert!(zone.check().is_ok());
    }

    #[test]
    fn validate_detects_missing_apex_soa() {
        let mut zone = Zone::new(APEX.clone());
        add_rr(&mut zone, &APEX, Rdata::Ns(NS.clone()));
        add_rr(&mut zone, &NS, localhost());
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingApexSoa]);
    }

    #[test]
    fn validate_detects_too_many_soas() {
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        add_rr(&mut zone, &APEX, soa(1));
        assert_eq!(zone.validate(), vec![ValidationIssue::TooManyApexSoas]);
    }

    #[test]
    fn validate_detects_missing_apex_ns() {
        let mut zone = Zone::new(APEX.clone());
        add_rr(&mut zone, &APEX, soa(0));
        assert_eq!(zone.validate(), vec![ValidationIssue::MissingApexNs]);
    }

    #[test]
    fn validate_detects_multiple_cname() {
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        add_rr(&mut zone, &HOST1, Rdata::Cname(HOST2.clone()));
        add_rr(&mut zone, &HOST1, Rdata::Cname(HOST3.clone()));
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::DuplicateCname(HOST1.clone())]
        );
    }

    #[test]
    fn validate_detects_other_records_at_cname() {
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        add_rr(&mut zone, &HOST1, Rdata::Cname(HOST2.clone()));
        add_rr(&mut zone, &HOST1, localhost());
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::OtherRecordsAtCname(HOST1.clone())]
        );
    }

    #[test]
    fn validate_detects_missing_ns_address() {
        // First case: the apex NS record is missing an address.
        let mut zone = Zone::new(APEX.clone());
        add_rr(&mut zone, &APEX, soa(0));
        add_rr(&mut zone, &APEX, Rdata::Ns(NS.clone()));
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::MissingNsAddress(NS.clone())]
        );

        // Second case: a delegation NS record which points to a name
        // within the zone is missing an address.
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        add_rr(&mut zone, &SUBDEL, Rdata::Ns(NS_SUBDEL.clone()));
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::MissingNsAddress(NS_SUBDEL.clone())]
        );
        assert!(zone.check().is_err());
    }

    #[test]
    fn validate_ignores_out_of_zone_nameservers() {
        let mut zone = Zone::new(APEX.clone());
        add_rr(&mut zone, &APEX, soa(0));
        add_rr(&mut zone, &APEX, Rdata::Ns(OUTSIDE_NS.clone()));
        assert_eq!(zone.validate(), []);
    }

    #[test]
    fn missing_mx_address_is_only_a_warning() {
        let mut zone = Zone::new(APEX.clone());
        add_basic_rrs(&mut zone);
        add_rr(
            &mut zone,
            &APEX,
            Rdata::Mx {
                preference: 10,
                exchange: MX.clone(),
            },
        );
        assert_eq!(
            zone.validate(),
            vec![ValidationIssue::MissingMxAddress(MX.clone())]
        );
        assert!(zone.check().is_ok());
    }
}
