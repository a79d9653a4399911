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

//! Typed record data.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::Type;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RDATA                                                              //
////////////////////////////////////////////////////////////////////////

/// The data of a single resource record.
///
/// The record types that the generator produces (SOA, NS, A, AAAA, and
/// PTR) and the common types that operators write as overrides have
/// their own variants. Data of any other type is kept as raw octets in
/// [`Rdata::Unknown`]. The [`Display`](fmt::Display) implementation
/// produces the zone-file presentation format, always writing domain
/// names fully qualified; unknown data is written in the generic form
/// of [RFC 3597 § 5].
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rdata {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(Name),
    Cname(Name),
    Ptr(Name),
    Mx {
        preference: u16,
        exchange: Name,
    },
    Txt(Vec<CharacterString>),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    Soa(Soa),
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    },
    Sshfp {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: Vec<u8>,
    },
    Tlsa {
        usage: u8,
        selector: u8,
        matching_type: u8,
        data: Vec<u8>,
    },
    Caa {
        flags: u8,
        tag: String,
        value: Vec<u8>,
    },
    Unknown {
        rr_type: Type,
        octets: Vec<u8>,
    },
}

impl Rdata {
    /// Returns the RR type that this data belongs to.
    pub fn rr_type(&self) -> Type {
        match self {
            Self::A(_) => Type::A,
            Self::Aaaa(_) => Type::AAAA,
            Self::Ns(_) => Type::NS,
            Self::Cname(_) => Type::CNAME,
            Self::Ptr(_) => Type::PTR,
            Self::Mx { .. } => Type::MX,
            Self::Txt(_) => Type::TXT,
            Self::Srv { .. } => Type::SRV,
            Self::Soa(_) => Type::SOA,
            Self::Ds { .. } => Type::DS,
            Self::Sshfp { .. } => Type::SSHFP,
            Self::Tlsa { .. } => Type::TLSA,
            Self::Caa { .. } => Type::CAA,
            Self::Unknown { rr_type, .. } => *rr_type,
        }
    }
}

impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::A(address) => write!(f, "{}", address),
            Self::Aaaa(address) => write!(f, "{}", address),
            Self::Ns(name) | Self::Cname(name) | Self::Ptr(name) => write!(f, "{}", name),
            Self::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            Self::Txt(strings) => {
                let mut first = true;
                for string in strings {
                    if !first {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", string)?;
                    first = false;
                }
                Ok(())
            }
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            Self::Soa(soa) => write!(f, "{}", soa),
            Self::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                write!(f, "{} {} {} ", key_tag, algorithm, digest_type)?;
                write_hex(f, digest)
            }
            Self::Sshfp {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => {
                write!(f, "{} {} ", algorithm, fingerprint_type)?;
                write_hex(f, fingerprint)
            }
            Self::Tlsa {
                usage,
                selector,
                matching_type,
                data,
            } => {
                write!(f, "{} {} {} ", usage, selector, matching_type)?;
                write_hex(f, data)
            }
            Self::Caa { flags, tag, value } => {
                write!(f, "{} {} ", flags, tag)?;
                write_quoted(f, value)
            }
            Self::Unknown { octets, .. } => {
                write!(f, "\\# {}", octets.len())?;
                if !octets.is_empty() {
                    f.write_str(" ")?;
                    write_hex(f, octets)?;
                }
                Ok(())
            }
        }
    }
}

/// Writes `octets` as upper-case hexadecimal digits.
fn write_hex(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    for octet in octets {
        write!(f, "{:02X}", octet)?;
    }
    Ok(())
}

/// Writes `octets` quoted, with `"` and `\` escaped with a backslash
/// and non-printable octets escaped as `\DDD`.
fn write_quoted(f: &mut fmt::Formatter, octets: &[u8]) -> fmt::Result {
    f.write_str("\"")?;
    for &octet in octets {
        if octet == b'"' || octet == b'\\' {
            write!(f, "\\{}", octet as char)?;
        } else if octet == b' ' || octet.is_ascii_graphic() {
            write!(f, "{}", octet as char)?;
        } else {
            write!(f, "\\{:03}", octet)?;
        }
    }
    f.write_str("\"")
}

////////////////////////////////////////////////////////////////////////
// SOA DATA                                                           //
////////////////////////////////////////////////////////////////////////

/// The fields of an SOA record ([RFC 1035 § 3.3.13]).
///
/// [RFC 1035 § 3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl fmt::Display for Soa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum,
        )
    }
}

////////////////////////////////////////////////////////////////////////
// CHARACTER STRINGS                                                  //
////////////////////////////////////////////////////////////////////////

/// An [RFC 1035 § 3.3] `<character-string>`: up to 255 octets.
///
/// [RFC 1035 § 3.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharacterString {
    octets: Vec<u8>,
}

impl CharacterString {
    /// The maximum length of a `<character-string>`.
    pub const MAX_LEN: usize = 255;

    /// Wraps `octets`, failing if they are longer than
    /// [`CharacterString::MAX_LEN`].
    pub fn new(octets: Vec<u8>) -> Option<Self> {
        if octets.len() > Self::MAX_LEN {
            None
        } else {
            Some(Self { octets })
        }
    }

    /// Returns the octets of the string.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }
}

/// Character strings are always displayed quoted, with `"` and `\`
/// escaped with a backslash and non-printable octets escaped as
/// `\DDD`.
impl fmt::Display for CharacterString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_quoted(f, &self.octets)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_presentation_format() {
        let soa = Rdata::Soa(Soa {
            mname: "ns1.example.org.".parse().unwrap(),
            rname: "noc.example.org.".parse().unwrap(),
            serial: 1700000000,
            refresh: 3600,
            retry: 120,
            expire: 14400,
            minimum: 3600,
        });
        assert_eq!(
            soa.to_string(),
            "ns1.example.org. noc.example.org. 1700000000 3600 120 14400 3600",
        );
        let mx = Rdata::Mx {
            preference: 10,
            exchange: "mail.example.org".parse().unwrap(),
        };
        assert_eq!(mx.to_string(), "10 mail.example.org.");
        assert_eq!(Rdata::Aaaa("2001:db8::1".parse().unwrap()).to_string(), "2001:db8::1");
    }

    #[test]
    fn txt_strings_are_quoted_and_escaped() {
        let txt = Rdata::Txt(vec![
            CharacterString::new(b"v=spf1 -all".to_vec()).unwrap(),
            CharacterString::new(b"say \"hi\"\n".to_vec()).unwrap(),
        ]);
        assert_eq!(txt.to_string(), "\"v=spf1 -all\" \"say \\\"hi\\\"\\010\"");
        assert!(CharacterString::new(vec![b'x'; 256]).is_none());
    }

    #[test]
    fn hex_and_caa_data_display_in_presentation_format() {
        let caa = Rdata::Caa {
            flags: 0,
            tag: "issue".to_owned(),
            value: b"letsencrypt.org".to_vec(),
        };
        assert_eq!(caa.to_string(), "0 issue \"letsencrypt.org\"");
        let sshfp = Rdata::Sshfp {
            algorithm: 4,
            fingerprint_type: 2,
            fingerprint: vec![0x01, 0xab, 0xff],
        };
        assert_eq!(sshfp.to_string(), "4 2 01ABFF");
        let ds = Rdata::Ds {
            key_tag: 60485,
            algorithm: 5,
            digest_type: 1,
            digest: vec![0x2b, 0xb1],
        };
        assert_eq!(ds.to_string(), "60485 5 1 2BB1");
    }

    #[test]
    fn unknown_data_displays_in_generic_form() {
        let unknown = Rdata::Unknown {
            rr_type: Type::from(65280),
            octets: vec![0x0a, 0x00, 0x00, 0x01],
        };
        assert_eq!(unknown.to_string(), "\\# 4 0A000001");
        assert_eq!(unknown.rr_type(), Type::from(65280));
        let empty = Rdata::Unknown {
            rr_type: Type::from(65280),
            octets: Vec::new(),
        };
        assert_eq!(empty.to_string(), "\\# 0");
    }

    #[test]
    fn rr_type_matches_variant() {
        assert_eq!(Rdata::A(Ipv4Addr::LOCALHOST).rr_type(), Type::A);
        assert_eq!(Rdata::Ptr(Name::root()).rr_type(), Type::PTR);
    }
}
