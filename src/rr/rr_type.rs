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

//! Provides the [`Type`] structure for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// This is a wrapper around the `u16` type code with [`Display`] and
/// [`FromStr`] implementations for the textual mnemonics used in zone
/// files. Any type can be written in the generic `TYPEnnn` form of
/// [RFC 3597 § 5]; constants are provided for the common ones. The
/// [`Ord`] implementation orders by type code, which is the order
/// RRsets are written at a node.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
///
/// [`Display`]: fmt::Display
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

impl Type {
    pub const A: Type = Type(1);
    pub const NS: Type = Type(2);
    pub const CNAME: Type = Type(5);
    pub const SOA: Type = Type(6);
    pub const PTR: Type = Type(12);
    pub const HINFO: Type = Type(13);
    pub const MX: Type = Type(15);
    pub const TXT: Type = Type(16);
    pub const AAAA: Type = Type(28);
    pub const LOC: Type = Type(29);
    pub const SRV: Type = Type(33);
    pub const NAPTR: Type = Type(35);
    pub const DNAME: Type = Type(39);
    pub const DS: Type = Type(43);
    pub const SSHFP: Type = Type(44);
    pub const DNSKEY: Type = Type(48);
    pub const TLSA: Type = Type(52);
    pub const SVCB: Type = Type(64);
    pub const HTTPS: Type = Type(65);
    pub const CAA: Type = Type(257);
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match Caseless(text) {
            Caseless("A") => Ok(Self::A),
            Caseless("NS") => Ok(Self::NS),
            Caseless("CNAME") => Ok(Self::CNAME),
            Caseless("SOA") => Ok(Self::SOA),
            Caseless("PTR") => Ok(Self::PTR),
            Caseless("HINFO") => Ok(Self::HINFO),
            Caseless("MX") => Ok(Self::MX),
            Caseless("TXT") => Ok(Self::TXT),
            Caseless("AAAA") => Ok(Self::AAAA),
            Caseless("LOC") => Ok(Self::LOC),
            Caseless("SRV") => Ok(Self::SRV),
            Caseless("NAPTR") => Ok(Self::NAPTR),
            Caseless("DNAME") => Ok(Self::DNAME),
            Caseless("DS") => Ok(Self::DS),
            Caseless("SSHFP") => Ok(Self::SSHFP),
            Caseless("DNSKEY") => Ok(Self::DNSKEY),
            Caseless("TLSA") => Ok(Self::TLSA),
            Caseless("SVCB") => Ok(Self::SVCB),
            Caseless("HTTPS") => Ok(Self::HTTPS),
            Caseless("CAA") => Ok(Self::CAA),
            _ => {
                if text
                    .get(0..4)
                    .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TYPE"))
                {
                    text[4..]
                        .parse::<u16>()
                        .map(Self::from)
                        .or(Err("type value is not a valid unsigned 16-bit integer"))
                } else {
                    Err("unknown type")
                }
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::A => f.write_str("A"),
            Self::NS => f.write_str("NS"),
            Self::CNAME => f.write_str("CNAME"),
            Self::SOA => f.write_str("SOA"),
            Self::PTR => f.write_str("PTR"),
            Self::HINFO => f.write_str("HINFO"),
            Self::MX => f.write_str("MX"),
            Self::TXT => f.write_str("TXT"),
            Self::AAAA => f.write_str("AAAA"),
            Self::LOC => f.write_str("LOC"),
            Self::SRV => f.write_str("SRV"),
            Self::NAPTR => f.write_str("NAPTR"),
            Self::DNAME => f.write_str("DNAME"),
            Self::DS => f.write_str("DS"),
            Self::SSHFP => f.write_str("SSHFP"),
            Self::DNSKEY => f.write_str("DNSKEY"),
            Self::TLSA => f.write_str("TLSA"),
            Self::SVCB => f.write_str("SVCB"),
            Self::HTTPS => f.write_str("HTTPS"),
            Self::CAA => f.write_str("CAA"),
            Self(value) => write!(f, "TYPE{value}"), // RFC 3597 § 5
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_parses_case_insensitively() {
        assert_eq!("aaaa".parse::<Type>(), Ok(Type::AAAA));
        assert_eq!("Ptr".parse::<Type>(), Ok(Type::PTR));
        assert_eq!("caa".parse::<Type>(), Ok(Type::CAA));
        assert!("BOGUS".parse::<Type>().is_err());
    }

    #[test]
    fn type_parses_and_displays_generic_form() {
        // TYPE65280 is from the private use range, so it has no
        // mnemonic.
        let private: Type = "TYPE65280".parse().unwrap();
        assert_eq!(u16::from(private), 65280);
        assert_eq!(private.to_string(), "TYPE65280");
        assert_eq!("type257".parse::<Type>(), Ok(Type::CAA));
        assert_eq!(Type::CAA.to_string(), "CAA");
        assert!("TYPE65536".parse::<Type>().is_err());
    }

    #[test]
    fn types_order_by_code() {
        let mut types = vec![Type::AAAA, Type::PTR, Type::A, Type::SOA, Type::NS];
        types.sort();
        assert_eq!(types, [Type::A, Type::NS, Type::SOA, Type::PTR, Type::AAAA]);
    }
}
