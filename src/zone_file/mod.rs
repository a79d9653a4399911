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

//! Parsing of record definitions in [RFC 1035 § 5] zone file syntax.
//!
//! Operators hand-author exceptions to generated zone data as
//! individual zone-file lines, scoped to a zone. This module provides
//! the [`Parser`] structure, which is created with the zone's origin
//! and a default TTL and then parses one definition at a time:
//!
//! ```
//! use zonegen::rr::{Rdata, Ttl};
//! use zonegen::zone_file::Parser;
//!
//! let parser = Parser::new("example.org.".parse().unwrap(), Ttl::from(3600));
//! let rr = parser.parse("host1 300 IN A 10.0.0.9").unwrap();
//! assert_eq!(rr.owner.to_string(), "host1.example.org.");
//! assert_eq!(rr.ttl, Ttl::from(300));
//! assert_eq!(rr.rdata, Rdata::A("10.0.0.9".parse().unwrap()));
//! ```
//!
//! The usual zone-file conveniences are available: `@` for the origin,
//! partially qualified names, an optional TTL and class in either
//! order, `;` comments, quoted `<character-string>`s, escape sequences,
//! and parentheses to continue a record over several lines. Since a
//! definition stands alone, it must start with an owner, and it must
//! contain exactly one record. Directives (`$ORIGIN`, `$TTL`, and
//! `$INCLUDE`) are not accepted.
//!
//! # A note about the implementation
//!
//! Zone files do not lend themselves to a clean lexer/parser split:
//! whether a backslash or a quotation mark is special depends on what
//! part of the record is being read. The internal `Reader` structure
//! therefore only splits the text into fields (handling comments,
//! parentheses, and quoting, and letting escapes keep a field
//! together). The [`Parser`] then interprets each field, including
//! escape-sequence processing, according to its place in the record.
//!
//! [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5

use crate::name::Name;
use crate::rr::{Rdata, Ttl};

pub mod error;
mod reader;
mod record;

use error::ErrorKind;
pub use error::{Error, Result};
use reader::Reader;
pub use reader::Position;

////////////////////////////////////////////////////////////////////////
// STRUCTURES                                                         //
////////////////////////////////////////////////////////////////////////

/// A parser for record definitions in [RFC 1035 § 5] syntax.
///
/// See the [module-level documentation](`self`) for details and example
/// usage.
///
/// [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5
#[derive(Clone, Debug)]
pub struct Parser {
    origin: Name,
    default_ttl: Ttl,
}

/// Parsed resource record data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedRr {
    pub owner: Name,
    pub ttl: Ttl,
    pub rdata: Rdata,
}

impl Parser {
    /// Creates a new [`Parser`]. Relative names are completed with
    /// `origin`, and records without a TTL get `default_ttl`.
    pub fn new(origin: Name, default_ttl: Ttl) -> Self {
        Self {
            origin,
            default_ttl,
        }
    }

    /// Parses a single record definition.
    pub fn parse(&self, text: &str) -> Result<ParsedRr> {
        let mut reader = Reader::new(text);
        if text.trim_start().starts_with('$') {
            return Err(reader.error(ErrorKind::DirectiveNotAllowed));
        }
        self.parse_record(&mut reader)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
