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

//! Parsing of resource records.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::reader::{Field, Reader};
use super::{Error, ErrorKind, ParsedRr, Parser, Position, Result};
use crate::name::{Label, Name};
use crate::rr::{CharacterString, Rdata, Soa, Ttl, Type};
use crate::util::{ascii_hex_digit_to_nibble, Caseless};

impl Parser {
    ////////////////////////////////////////////////////////////////////
    // PARSING OF RESOURCE RECORDS                                    //
    ////////////////////////////////////////////////////////////////////

    /// Parses a single resource record from `reader`.
    pub(super) fn parse_record(&self, reader: &mut Reader) -> Result<ParsedRr> {
        // In zone files, leading whitespace means that the owner is the
        // previous record's owner. A definition stands alone, so there
        // is no previous owner.
        if reader.starts_with_blank() {
            return Err(reader.error(ErrorKind::EmptyOwner));
        }
        let owner_field = reader
            .next_field()?
            .ok_or_else(|| reader.error(ErrorKind::NoRecord))?;
        let owner = self.parse_name(owner_field)?;

        // The next fields are the optional TTL and class, in either
        // order, and then the type. As noted in RFC 1035 § 5.1, the
        // possible TTL, class, and type fields are disjoint, so the
        // parse is unique.
        let mut ttl = None;
        let mut class_seen = false;
        let rr_type = loop {
            let field = next(reader, ErrorKind::ExpectedTtlClassOrType)?;
            if field.text.bytes().all(|b| b.is_ascii_digit()) && ttl.is_none() {
                ttl = Some(
                    field
                        .text
                        .parse::<Ttl>()
                        .map_err(|e| Error::new(field.position, ErrorKind::InvalidTtl(e)))?,
                );
            } else if Caseless(field.text) == Caseless("IN") && !class_seen {
                class_seen = true;
            } else if is_other_class(field.text) {
                return Err(Error::new(field.position, ErrorKind::InvalidClass));
            } else {
                break field
                    .text
                    .parse::<Type>()
                    .map_err(|e| Error::new(field.position, ErrorKind::InvalidType(e)))?;
            }
        };

        // The RDATA completes the record.
        let rdata = self.parse_rdata(reader, rr_type)?;
        reader.finish()?;

        Ok(ParsedRr {
            owner,
            ttl: ttl.unwrap_or(self.default_ttl),
            rdata,
        })
    }

    ////////////////////////////////////////////////////////////////////
    // RDATA PARSING                                                  //
    ////////////////////////////////////////////////////////////////////

    // RFC 3597 § 5 allows the RDATA of any type to be written in the
    // generic form `\# <length> <hex digits>`. For types with their own
    // Rdata variant, generic RDATA is decoded into that variant (and
    // must be valid for the type), so that the zone sees the same data
    // either way. All other types must use the generic form, and are
    // kept as raw octets.

    /// Parses the RDATA of a record of type `rr_type`.
    fn parse_rdata(&self, reader: &mut Reader, rr_type: Type) -> Result<Rdata> {
        if reader.next_field_is(GENERIC_RDATA_MARKER)? {
            return parse_generic_rdata(reader, rr_type);
        }

        match rr_type {
            Type::A => {
                let field = next(reader, ErrorKind::ExpectedIpv4)?;
                let address = parse_field::<Ipv4Addr>(field, ErrorKind::InvalidIpv4)?;
                Ok(Rdata::A(address))
            }
            Type::AAAA => {
                let field = next(reader, ErrorKind::ExpectedIpv6)?;
                let address = parse_field::<Ipv6Addr>(field, ErrorKind::InvalidIpv6)?;
                Ok(Rdata::Aaaa(address))
            }
            Type::NS => Ok(Rdata::Ns(self.parse_next_name(reader)?)),
            Type::CNAME => Ok(Rdata::Cname(self.parse_next_name(reader)?)),
            Type::PTR => Ok(Rdata::Ptr(self.parse_next_name(reader)?)),
            Type::MX => Ok(Rdata::Mx {
                preference: parse_u16(reader)?,
                exchange: self.parse_next_name(reader)?,
            }),
            Type::TXT => {
                let mut strings = vec![parse_character_string(next(
                    reader,
                    ErrorKind::ExpectedCharacterString,
                )?)?];
                while let Some(field) = reader.next_field()? {
                    strings.push(parse_character_string(field)?);
                }
                Ok(Rdata::Txt(strings))
            }
            Type::SRV => Ok(Rdata::Srv {
                priority: parse_u16(reader)?,
                weight: parse_u16(reader)?,
                port: parse_u16(reader)?,
                target: self.parse_next_name(reader)?,
            }),
            Type::SOA => Ok(Rdata::Soa(Soa {
                mname: self.parse_next_name(reader)?,
                rname: self.parse_next_name(reader)?,
                serial: parse_u32(reader)?,
                refresh: parse_u32(reader)?,
                retry: parse_u32(reader)?,
                expire: parse_u32(reader)?,
                minimum: parse_u32(reader)?,
            })),
            Type::DS => Ok(Rdata::Ds {
                key_tag: parse_u16(reader)?,
                algorithm: parse_u8(reader)?,
                digest_type: parse_u8(reader)?,
                digest: parse_hex(reader)?,
            }),
            Type::SSHFP => Ok(Rdata::Sshfp {
                algorithm: parse_u8(reader)?,
                fingerprint_type: parse_u8(reader)?,
                fingerprint: parse_hex(reader)?,
            }),
            Type::TLSA => Ok(Rdata::Tlsa {
                usage: parse_u8(reader)?,
                selector: parse_u8(reader)?,
                matching_type: parse_u8(reader)?,
                data: parse_hex(reader)?,
            }),
            Type::CAA => {
                let flags = parse_u8(reader)?;
                let tag = parse_caa_tag(next(reader, ErrorKind::ExpectedCaaTag)?)?;
                let value = unescape(next(reader, ErrorKind::ExpectedCharacterString)?)?;
                Ok(Rdata::Caa { flags, tag, value })
            }
            _ => Err(reader.error(ErrorKind::ExpectedGenericRdata)),
        }
    }

    ////////////////////////////////////////////////////////////////////
    // DOMAIN NAMES                                                   //
    ////////////////////////////////////////////////////////////////////

    /// Parses a domain name, which may be `@` or relative to the
    /// origin.
    fn parse_name(&self, field: Field) -> Result<Name> {
        if field.quoted {
            return Err(Error::new(field.position, ErrorKind::ExpectedName));
        }
        Name::parse_relative(field.text, Some(&self.origin))
            .map_err(|e| Error::new(field.position, ErrorKind::InvalidName(e)))
    }

    fn parse_next_name(&self, reader: &mut Reader) -> Result<Name> {
        let field = next(reader, ErrorKind::ExpectedName)?;
        self.parse_name(field)
    }
}

////////////////////////////////////////////////////////////////////////
// FIELD HELPERS                                                      //
////////////////////////////////////////////////////////////////////////

/// Reads the next field, failing with `expected` at the end of the
/// record.
fn next<'a>(reader: &mut Reader<'a>, expected: ErrorKind) -> Result<Field<'a>> {
    reader.next_field()?.ok_or_else(|| reader.error(expected))
}

/// Parses a field into a value of type `T`, using `or_else` to convert
/// the parse error into an [`ErrorKind`].
fn parse_field<T: FromStr>(field: Field, or_else: impl FnOnce(T::Err) -> ErrorKind) -> Result<T> {
    field
        .text
        .parse()
        .map_err(|e| Error::new(field.position, or_else(e)))
}

fn parse_u8(reader: &mut Reader) -> Result<u8> {
    let field = next(reader, ErrorKind::ExpectedU8)?;
    parse_field(field, ErrorKind::InvalidInt)
}

fn parse_u16(reader: &mut Reader) -> Result<u16> {
    let field = next(reader, ErrorKind::ExpectedU16)?;
    parse_field(field, ErrorKind::InvalidInt)
}

fn parse_u32(reader: &mut Reader) -> Result<u32> {
    let field = next(reader, ErrorKind::ExpectedU32)?;
    parse_field(field, ErrorKind::InvalidInt)
}

/// Returns whether `text` names a class other than IN.
fn is_other_class(text: &str) -> bool {
    ["CH", "CS", "HS", "ANY"]
        .iter()
        .any(|&class| Caseless(text) == Caseless(class))
}

////////////////////////////////////////////////////////////////////////
// GENERIC AND HEXADECIMAL RDATA                                      //
////////////////////////////////////////////////////////////////////////

/// The field that introduces RDATA in the generic form.
const GENERIC_RDATA_MARKER: &str = "\\#";

/// Returns whether records of type `rr_type` have their own [`Rdata`]
/// variant.
fn has_own_variant(rr_type: Type) -> bool {
    matches!(
        rr_type,
        Type::A
            | Type::AAAA
            | Type::NS
            | Type::CNAME
            | Type::PTR
            | Type::MX
            | Type::TXT
            | Type::SRV
            | Type::SOA
            | Type::DS
            | Type::SSHFP
            | Type::TLSA
            | Type::CAA
    )
}

/// Parses generic RDATA following the `\#` marker: a length and then
/// that many octets in hexadecimal.
fn parse_generic_rdata(reader: &mut Reader, rr_type: Type) -> Result<Rdata> {
    let len_field = next(reader, ErrorKind::ExpectedRdataLen)?;
    let len: u16 = parse_field(len_field, ErrorKind::InvalidInt)?;
    let octets = if len == 0 {
        Vec::new()
    } else {
        parse_hex(reader)?
    };
    if octets.len() != usize::from(len) {
        return Err(Error::new(len_field.position, ErrorKind::RdataLenMismatch));
    }
    if has_own_variant(rr_type) {
        decode_rdata(rr_type, &octets)
            .ok_or_else(|| Error::new(len_field.position, ErrorKind::InvalidRdataForType))
    } else {
        Ok(Rdata::Unknown { rr_type, octets })
    }
}

/// Decodes the uncompressed wire form of RDATA for a type with its own
/// [`Rdata`] variant. Returns `None` if the octets are not valid RDATA
/// for `rr_type`.
fn decode_rdata(rr_type: Type, octets: &[u8]) -> Option<Rdata> {
    let mut wire = Wire(octets);
    let rdata = match rr_type {
        Type::A => Rdata::A(Ipv4Addr::from(wire.array::<4>()?)),
        Type::AAAA => Rdata::Aaaa(Ipv6Addr::from(wire.array::<16>()?)),
        Type::NS => Rdata::Ns(wire.name()?),
        Type::CNAME => Rdata::Cname(wire.name()?),
        Type::PTR => Rdata::Ptr(wire.name()?),
        Type::MX => Rdata::Mx {
            preference: wire.u16()?,
            exchange: wire.name()?,
        },
        Type::TXT => {
            let mut strings = Vec::new();
            while !wire.0.is_empty() {
                let len = wire.u8()?;
                strings.push(CharacterString::new(wire.take(len.into())?.to_vec())?);
            }
            if strings.is_empty() {
                return None;
            }
            Rdata::Txt(strings)
        }
        Type::SRV => Rdata::Srv {
            priority: wire.u16()?,
            weight: wire.u16()?,
            port: wire.u16()?,
            target: wire.name()?,
        },
        Type::SOA => Rdata::Soa(Soa {
            mname: wire.name()?,
            rname: wire.name()?,
            serial: wire.u32()?,
            refresh: wire.u32()?,
            retry: wire.u32()?,
            expire: wire.u32()?,
            minimum: wire.u32()?,
        }),
        Type::DS => Rdata::Ds {
            key_tag: wire.u16()?,
            algorithm: wire.u8()?,
            digest_type: wire.u8()?,
            digest: wire.rest(),
        },
        Type::SSHFP => Rdata::Sshfp {
            algorithm: wire.u8()?,
            fingerprint_type: wire.u8()?,
            fingerprint: wire.rest(),
        },
        Type::TLSA => Rdata::Tlsa {
            usage: wire.u8()?,
            selector: wire.u8()?,
            matching_type: wire.u8()?,
            data: wire.rest(),
        },
        Type::CAA => {
            let flags = wire.u8()?;
            let tag_len = wire.u8()?;
            let tag = wire.take(tag_len.into())?;
            if !is_valid_caa_tag(tag) {
                return None;
            }
            Rdata::Caa {
                flags,
                tag: String::from_utf8_lossy(tag).into_owned(),
                value: wire.rest(),
            }
        }
        _ => return None,
    };
    if wire.0.is_empty() {
        Some(rdata)
    } else {
        None
    }
}

/// A cursor over uncompressed wire-format RDATA.
struct Wire<'a>(&'a [u8]);

impl<'a> Wire<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.0.len() < len {
            return None;
        }
        let (taken, rest) = self.0.split_at(len);
        self.0 = rest;
        Some(taken)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|[octet]| octet)
    }

    fn u16(&mut self) -> Option<u16> {
        self.array().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_be_bytes)
    }

    fn rest(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0).to_vec()
    }

    /// Reads an uncompressed domain name. Compression pointers are not
    /// allowed in zone file RDATA.
    fn name(&mut self) -> Option<Name> {
        let mut labels = Vec::new();
        loop {
            let len = self.u8()?;
            if len == 0 {
                return Name::from_labels(labels).ok();
            }
            labels.push(Label::try_from(self.take(len.into())?).ok()?);
        }
    }
}

/// Parses the rest of the record as hexadecimal digits, which may be
/// split into several fields. At least one digit is required.
fn parse_hex(reader: &mut Reader) -> Result<Vec<u8>> {
    let first = next(reader, ErrorKind::ExpectedHexRdata)?;
    let mut octets = Vec::new();
    let mut high_nibble: Option<(u8, Position)> = None;
    let mut field = Some(first);
    while let Some(current) = field {
        if current.quoted {
            return Err(Error::new(current.position, ErrorKind::InvalidHexDigit));
        }
        for (i, digit) in current.text.bytes().enumerate() {
            let position = Position {
                line: current.position.line,
                column: current.position.column + i,
            };
            let nibble = ascii_hex_digit_to_nibble(digit)
                .ok_or_else(|| Error::new(position, ErrorKind::InvalidHexDigit))?;
            match high_nibble.take() {
                Some((high, _)) => octets.push((high << 4) | nibble),
                None => high_nibble = Some((nibble, position)),
            }
        }
        field = reader.next_field()?;
    }
    match high_nibble {
        Some((_, position)) => Err(Error::new(position, ErrorKind::OddHexDigits)),
        None => Ok(octets),
    }
}

////////////////////////////////////////////////////////////////////////
// CAA                                                                //
////////////////////////////////////////////////////////////////////////

/// Parses a CAA property tag, which [RFC 8659 § 4.1.1] limits to 1 to
/// 15 ASCII letters and digits.
///
/// [RFC 8659 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc8659#section-4.1.1
fn parse_caa_tag(field: Field) -> Result<String> {
    if !field.quoted && is_valid_caa_tag(field.text.as_bytes()) {
        Ok(field.text.to_owned())
    } else {
        Err(Error::new(field.position, ErrorKind::InvalidCaaTag))
    }
}

fn is_valid_caa_tag(tag: &[u8]) -> bool {
    (1..=15).contains(&tag.len()) && tag.iter().all(u8::is_ascii_alphanumeric)
}

////////////////////////////////////////////////////////////////////////
// CHARACTER STRINGS                                                  //
////////////////////////////////////////////////////////////////////////

/// Parses a `<character-string>` ([RFC 1035 § 5.1]), processing escape
/// sequences.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
fn parse_character_string(field: Field) -> Result<CharacterString> {
    CharacterString::new(unescape(field)?)
        .ok_or_else(|| Error::new(field.position, ErrorKind::CharacterStringTooLong))
}

/// Processes the escape sequences of a field.
fn unescape(field: Field) -> Result<Vec<u8>> {
    let mut octets = Vec::with_capacity(field.text.len());
    let mut iter = field.text.bytes().enumerate();
    while let Some((i, octet)) = iter.next() {
        if octet != b'\\' {
            octets.push(octet);
            continue;
        }
        let position = Position {
            line: field.position.line,
            column: field.position.column + i + usize::from(field.quoted),
        };
        match iter.next() {
            Some((_, first)) if first.is_ascii_digit() => {
                let rest = (iter.next(), iter.next());
                let (Some((_, tens)), Some((_, ones))) = rest else {
                    return Err(Error::new(position, ErrorKind::EscapeNeedsThreeDigits));
                };
                if !tens.is_ascii_digit() || !ones.is_ascii_digit() {
                    return Err(Error::new(position, ErrorKind::EscapeNeedsThreeDigits));
                }
                let value = 100 * usize::from(first - b'0')
                    + 10 * usize::from(tens - b'0')
                    + usize::from(ones - b'0');
                let value = u8::try_from(value)
                    .map_err(|_| Error::new(position, ErrorKind::EscapeValueOutOfRange))?;
                octets.push(value);
            }
            Some((_, other)) => octets.push(other),
            None => return Err(Error::new(position, ErrorKind::EndInEscape)),
        }
    }
    Ok(octets)
}
