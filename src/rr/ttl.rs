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

//! Provides the [`Ttl`] structure for DNS RR TTLs.

use std::fmt;
use std::str::FromStr;

/// The time to live (TTL) of a DNS record.
///
/// [RFC 2181 § 8] clarified that TTL values are unsigned integers
/// between 0 and 2³¹ - 1, inclusive. `Ttl::from(u32)` clamps larger
/// values to zero, as required there. Parsing from text is stricter:
/// zone-file input above the limit is rejected rather than silently
/// becoming zero.
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Ttl(u32);

impl From<u32> for Ttl {
    fn from(raw: u32) -> Self {
        if raw > i32::MAX as u32 {
            Self(0)
        } else {
            Self(raw)
        }
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl FromStr for Ttl {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.parse::<u32>() {
            Ok(raw) if raw <= i32::MAX as u32 => Ok(Self(raw)),
            Ok(_) => Err("TTL is larger than 2147483647"),
            Err(_) => Err("TTL is not an unsigned integer"),
        }
    }
}

impl fmt::Debug for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_ttls_become_zero() {
        assert_eq!(u32::from(Ttl::from(3600)), 3600);
        assert_eq!(u32::from(Ttl::from(i32::MAX as u32 + 1)), 0);
    }

    #[test]
    fn parsing_rejects_out_of_range_ttls() {
        assert_eq!("3600".parse::<Ttl>(), Ok(Ttl::from(3600)));
        assert!("2147483648".parse::<Ttl>().is_err());
        assert!("1h".parse::<Ttl>().is_err());
    }
}
