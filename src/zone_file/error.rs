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

//! Error types for record definition parsing.
//!
//! In order to maintain consistency in error messages (and to avoid
//! unnecessary allocation of strings), all syntax errors are recorded
//! with an [`ErrorKind`] value that can be used by calling code to get
//! an appropriate error message.

use std::fmt;
use std::net::AddrParseError;
use std::num::ParseIntError;

use super::Position;
use crate::name;

////////////////////////////////////////////////////////////////////////
// ERROR STRUCTURE                                                    //
////////////////////////////////////////////////////////////////////////

/// A syntax error found in a record definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    position: Position,
    kind: ErrorKind,
}

impl Error {
    /// Constructs a new [`Error`] with the provided information.
    pub(super) fn new(position: Position, kind: ErrorKind) -> Self {
        Self { position, kind }
    }

    /// Returns the line at which the error occurred.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Returns the column at which the error occurred.
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Returns the kind of syntax error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line {} column {}",
            self.kind, self.position.line, self.position.column,
        )
    }
}

impl std::error::Error for Error {}

/// A result type for record definition parsing.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// SYNTAX ERROR KINDS                                                 //
////////////////////////////////////////////////////////////////////////

/// Kinds of record definition syntax errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    CharacterStringTooLong,
    DirectiveNotAllowed,
    EmptyOwner,
    EndInEscape,
    EndInQuotedCharacterString,
    EscapeNeedsThreeDigits,
    EscapeValueOutOfRange,
    ExpectedCaaTag,
    ExpectedCharacterString,
    ExpectedEol,
    ExpectedGenericRdata,
    ExpectedHexRdata,
    ExpectedIpv4,
    ExpectedIpv6,
    ExpectedName,
    ExpectedRdataLen,
    ExpectedTtlClassOrType,
    ExpectedU8,
    ExpectedU16,
    ExpectedU32,
    InvalidCaaTag,
    InvalidClass,
    InvalidHexDigit,
    InvalidInt(ParseIntError),
    InvalidIpv4(AddrParseError),
    InvalidIpv6(AddrParseError),
    InvalidName(name::Error),
    InvalidRdataForType,
    InvalidTtl(&'static str),
    InvalidType(&'static str),
    NestedParens,
    NoRecord,
    OddHexDigits,
    RdataLenMismatch,
    UnbalancedParens,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CharacterStringTooLong => f.write_str("<character-string> is too long"),
            Self::DirectiveNotAllowed => {
                f.write_str("directives are not allowed in a record definition")
            }
            Self::EmptyOwner => f.write_str("the owner cannot be omitted in a record definition"),
            Self::EndInEscape => f.write_str("reached end of input in escape sequence"),
            Self::EndInQuotedCharacterString => {
                f.write_str("reached end of input in quoted <character-string>")
            }
            Self::EscapeNeedsThreeDigits => {
                f.write_str("invalid escape sequence: expected three decimal digits")
            }
            Self::EscapeValueOutOfRange => {
                f.write_str("invalid escape sequence: escaped octet value is out of range")
            }
            Self::ExpectedCaaTag => f.write_str("expected a CAA property tag"),
            Self::ExpectedCharacterString => f.write_str("expected a <character-string>"),
            Self::ExpectedEol => f.write_str("expected the end of the record"),
            Self::ExpectedGenericRdata => {
                f.write_str("expected RDATA in the generic \\# format for this type")
            }
            Self::ExpectedHexRdata => f.write_str("expected RDATA in hexadecimal"),
            Self::ExpectedIpv4 => f.write_str("expected an IPv4 address"),
            Self::ExpectedIpv6 => f.write_str("expected an IPv6 address"),
            Self::ExpectedName => f.write_str("expected a domain name"),
            Self::ExpectedRdataLen => f.write_str("expected the RDATA length"),
            Self::ExpectedTtlClassOrType => f.write_str("expected a TTL, class, or RR type"),
            Self::ExpectedU8 => f.write_str("expected an unsigned 8-bit integer"),
            Self::ExpectedU16 => f.write_str("expected an unsigned 16-bit integer"),
            Self::ExpectedU32 => f.write_str("expected an unsigned 32-bit integer"),
            Self::InvalidCaaTag => {
                f.write_str("a CAA property tag must be 1 to 15 ASCII letters and digits")
            }
            Self::InvalidClass => f.write_str("only the IN class is supported"),
            Self::InvalidHexDigit => f.write_str("invalid hexadecimal digit"),
            Self::InvalidInt(int_err) => int_err.fmt(f),
            Self::InvalidIpv4(addr_err) => addr_err.fmt(f),
            Self::InvalidIpv6(addr_err) => addr_err.fmt(f),
            Self::InvalidName(name_err) => write!(f, "invalid name: {}", name_err),
            Self::InvalidRdataForType => f.write_str("the RDATA is not valid for the type"),
            Self::InvalidTtl(ttl_err) => write!(f, "invalid TTL: {}", ttl_err),
            Self::InvalidType(type_err) => type_err.fmt(f),
            Self::NestedParens => f.write_str("nested parentheses"),
            Self::NoRecord => f.write_str("the definition contains no record"),
            Self::OddHexDigits => f.write_str("odd number of hexadecimal digits"),
            Self::RdataLenMismatch => {
                f.write_str("the RDATA length does not match the hexadecimal data")
            }
            Self::UnbalancedParens => f.write_str("unbalanced parentheses"),
        }
    }
}
