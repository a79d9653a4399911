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

//! Computation of reverse-DNS names.
//!
//! Reverse zones for IPv4 live under `in-addr.arpa.` ([RFC 1035
//! § 3.5]) and are always /24 buckets, named by the first three octets
//! of the subnet in reverse order. Reverse zones for IPv6 live under
//! `ip6.arpa.` ([RFC 3596 § 2.5]) and are named by the nibbles of the
//! network address in reverse order, one label per nibble. An IPv6
//! prefix whose length is not a multiple of four is given the zone of
//! `ceil(L / 4)` nibbles, i.e. the partial final nibble is included;
//! [`ipv6_zone_networks`] splits such a prefix into the nibble-aligned
//! networks whose zones together cover it.
//!
//! [RFC 1035 § 3.5]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.5
//! [RFC 3596 § 2.5]: https://datatracker.ietf.org/doc/html/rfc3596#section-2.5

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use arrayvec::ArrayVec;
use ipnet::{Ipv4Net, Ipv6Net};
use lazy_static::lazy_static;

use crate::name::{Label, Name};
use crate::util::nibble_to_ascii_hex_digit;
use crate::{Error, Result};

lazy_static! {
    static ref IN_ADDR_ARPA: Name = "in-addr.arpa.".parse().unwrap();
    static ref IP6_ARPA: Name = "ip6.arpa.".parse().unwrap();
}

/// Returns the `in-addr.arpa.` zone name for a /24 subnet.
///
/// The caller is responsible for splitting larger networks into /24s
/// first; anything else fails with [`Error::InvalidNetwork`].
pub fn ipv4_reverse_zone(subnet: Ipv4Net) -> Result<Name> {
    if subnet.prefix_len() != 24 {
        return Err(Error::invalid_network(subnet, "not a /24 subnet"));
    } else if subnet.addr() != subnet.network() {
        return Err(Error::invalid_network(subnet, "host bits are set"));
    }
    let octets = subnet.network().octets();
    let labels = octets[..3]
        .iter()
        .rev()
        .map(|octet| decimal_label(*octet))
        .chain(IN_ADDR_ARPA.labels().cloned())
        .collect();
    // NOTE: the unwrap() is okay, since the name has only five short
    // labels.
    Ok(Name::from_labels(labels).unwrap())
}

/// Returns the `ip6.arpa.` zone name for an IPv6 prefix of any length.
/// The name has `ceil(L / 4)` nibble labels, where `L` is the prefix
/// length.
pub fn ipv6_reverse_zone(supernet: Ipv6Net) -> Result<Name> {
    if supernet.addr() != supernet.network() {
        return Err(Error::invalid_network(supernet, "host bits are set"));
    }
    let n_nibbles = (usize::from(supernet.prefix_len()) + 3) / 4;
    Ok(nibble_name(&supernet.network(), n_nibbles))
}

/// Returns the nibble-aligned networks that together cover `supernet`.
/// Each has a prefix length of `supernet`'s rounded up to a multiple of
/// four, so an aligned prefix yields only itself and a /42 yields four
/// /44s. Each network gets its own reverse zone, so that the zones
/// cover the whole of `supernet`.
pub fn ipv6_zone_networks(supernet: Ipv6Net) -> Vec<Ipv6Net> {
    let aligned_len = (supernet.prefix_len() + 3) / 4 * 4;
    // NOTE: the unwrap() is okay, since aligned_len is at least the
    // prefix length and at most 128.
    supernet.trunc().subnets(aligned_len).unwrap().collect()
}

/// Returns the full reverse owner name (the owner of the PTR record)
/// for a single address.
pub fn reverse_name(address: IpAddr) -> Name {
    match address {
        IpAddr::V4(v4) => ipv4_reverse_name(v4),
        IpAddr::V6(v6) => nibble_name(&v6, 32),
    }
}

fn ipv4_reverse_name(address: Ipv4Addr) -> Name {
    let labels = address
        .octets()
        .iter()
        .rev()
        .map(|octet| decimal_label(*octet))
        .chain(IN_ADDR_ARPA.labels().cloned())
        .collect();
    // NOTE: the unwrap() is okay, since the name has six short labels.
    Name::from_labels(labels).unwrap()
}

/// Builds the `ip6.arpa.` name of the first `n_nibbles` nibbles of
/// `address`.
fn nibble_name(address: &Ipv6Addr, n_nibbles: usize) -> Name {
    let octets = address.octets();
    let mut nibbles = ArrayVec::<u8, 32>::new();
    for i in 0..n_nibbles {
        let octet = octets[i / 2];
        let nibble = if i % 2 == 0 { octet >> 4 } else { octet & 0xf };
        nibbles.push(nibble_to_ascii_hex_digit(nibble));
    }
    let labels = nibbles
        .iter()
        .rev()
        .map(|digit| label(&[*digit]))
        .chain(IP6_ARPA.labels().cloned())
        .collect();
    // NOTE: the unwrap() is okay; the longest such name (32 nibbles
    // plus ip6.arpa.) is 73 octets on the wire.
    Name::from_labels(labels).unwrap()
}

fn decimal_label(octet: u8) -> Label {
    label(octet.to_string().as_bytes())
}

fn label(octets: &[u8]) -> Label {
    // NOTE: the unwrap() is okay, since we only build short labels.
    Label::try_from(octets).unwrap()
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
