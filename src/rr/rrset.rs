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

//! Implementation of RRset-related data structures.

use log::debug;

use super::{Rdata, Ttl, Type};

////////////////////////////////////////////////////////////////////////
// RRSETS                                                             //
////////////////////////////////////////////////////////////////////////

/// A resource record set: the records of one type at one owner.
///
/// [RFC 2181 § 5] defines an RRset as a group of records with the same
/// label, class, and type, all of which have the same TTL. Records are
/// stored by setting the common [`Type`] and [`Ttl`] and then pushing
/// their [`Rdata`]s. The owner is not stored in the structure itself,
/// but is kept track of by the owner of the [`RrsetList`].
///
/// [RFC 2181 § 5]: https://datatracker.ietf.org/doc/html/rfc2181#section-5
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rrset {
    pub rr_type: Type,
    pub ttl: Ttl,
    rdatas: Vec<Rdata>,
}

impl Rrset {
    /// Creates a new [`Rrset`] with the given RR type and TTL. It will
    /// initially contain no record data.
    pub fn new(rr_type: Type, ttl: Ttl) -> Self {
        Self {
            rr_type,
            ttl,
            rdatas: Vec::new(),
        }
    }

    /// Adds an [`Rdata`] to this [`Rrset`], returning whether it was
    /// added. As other nameservers do, [`Rdata`] that is already
    /// present in the [`Rrset`] is silently discarded.
    pub fn push_rdata(&mut self, rdata: Rdata) -> bool {
        debug_assert_eq!(rdata.rr_type(), self.rr_type);
        if self.rdatas.contains(&rdata) {
            false
        } else {
            self.rdatas.push(rdata);
            true
        }
    }

    /// Returns an iterator over the [`Rdata`] of this `Rrset`, in the
    /// order they were added.
    pub fn rdatas(&self) -> std::slice::Iter<Rdata> {
        self.rdatas.iter()
    }

    /// Returns the number of records in the `Rrset`.
    pub fn len(&self) -> usize {
        self.rdatas.len()
    }

    /// Returns whether the `Rrset` has no records.
    pub fn is_empty(&self) -> bool {
        self.rdatas.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// RRSET LISTS                                                        //
////////////////////////////////////////////////////////////////////////

/// All of the [`Rrset`]s at a node, kept sorted by [`Type`].
#[derive(Clone, Debug, Default)]
pub struct RrsetList {
    rrsets: Vec<Rrset>,
}

impl RrsetList {
    /// Returns a new, empty [`RrsetList`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a resource record to the [`RrsetList`], accumulating it
    /// into any existing [`Rrset`] of the same type.
    ///
    /// If the existing [`Rrset`] has a different TTL, the RRset takes
    /// the lower of the two so that the RRset stays consistent
    /// ([RFC 2181 § 5.2]).
    ///
    /// [RFC 2181 § 5.2]: https://datatracker.ietf.org/doc/html/rfc2181#section-5.2
    pub fn add(&mut self, ttl: Ttl, rdata: Rdata) -> bool {
        let rr_type = rdata.rr_type();
        match self.rrsets.binary_search_by_key(&rr_type, |r| r.rr_type) {
            Ok(index) => {
                let rrset = &mut self.rrsets[index];
                if rrset.ttl != ttl {
                    debug!(
                        "TTL mismatch in {} RRset ({} vs. {}); using the lower TTL.",
                        rr_type, rrset.ttl, ttl,
                    );
                    rrset.ttl = rrset.ttl.min(ttl);
                }
                rrset.push_rdata(rdata)
            }
            Err(index) => {
                let mut rrset = Rrset::new(rr_type, ttl);
                rrset.push_rdata(rdata);
                self.rrsets.insert(index, rrset);
                true
            }
        }
    }

    /// Replaces the [`Rrset`] of `rrset`'s type, returning the previous
    /// one (if any). An empty `rrset` simply removes the existing one.
    pub fn replace(&mut self, rrset: Rrset) -> Option<Rrset> {
        match self
            .rrsets
            .binary_search_by_key(&rrset.rr_type, |r| r.rr_type)
        {
            Ok(index) if rrset.is_empty() => Some(self.rrsets.remove(index)),
            Ok(index) => Some(std::mem::replace(&mut self.rrsets[index], rrset)),
            Err(_) if rrset.is_empty() => None,
            Err(index) => {
                self.rrsets.insert(index, rrset);
                None
            }
        }
    }

    /// Looks up the [`Rrset`] of type `rr_type` in the [`RrsetList`].
    pub fn lookup(&self, rr_type: Type) -> Option<&Rrset> {
        self.rrsets
            .binary_search_by_key(&rr_type, |r| r.rr_type)
            .map(|index| &self.rrsets[index])
            .ok()
    }

    /// Returns an iterator over the [`Rrset`]s of the `RrsetList`, in
    /// order of type.
    pub fn iter(&self) -> std::slice::Iter<Rrset> {
        self.rrsets.iter()
    }

    /// Returns the number of [`Rrset`]s in the `RrsetList`.
    pub fn len(&self) -> usize {
        self.rrsets.len()
    }

    /// Returns whether the `RrsetList` is empty.
    pub fn is_empty(&self) -> bool {
        self.rrsets.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
