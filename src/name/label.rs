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

//! Implementation of the [`Label`] type.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Error, MAX_LABEL_LEN};

/// A single, non-null label of a domain name.
///
/// In accordance with [RFC 1034 § 3.1], comparisons between `Label`s
/// are ASCII-case-insensitive, but case is preserved in the stored
/// octets (and hence when the label is displayed).
///
/// [RFC 1034 § 3.1]: https://tools.ietf.org/html/rfc1034#section-3.1
#[derive(Clone)]
pub struct Label {
    octets: Box<[u8]>,
}

impl Label {
    /// Returns the octets of this `Label`.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the number of octets in this `Label`.
    #[allow(clippy::len_without_is_empty)] // Labels are never empty.
    pub fn len(&self) -> usize {
        self.octets.len()
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = Error;

    fn try_from(octets: &[u8]) -> Result<Self, Self::Error> {
        if octets.is_empty() {
            Err(Error::NullNonTerminal)
        } else if octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            Ok(Self {
                octets: octets.into(),
            })
        }
    }
}

impl TryFrom<&str> for Label {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::try_from(text.as_bytes())
    }
}

/// When a `Label` is displayed, periods, backslashes, and octets that
/// are not ASCII graphic characters are escaped in accordance with
/// RFC 1035 § 5.1: `\.`, `\\`, and `\DDD` respectively.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &octet in self.octets() {
            if octet == b'.' || octet == b'\\' {
                write!(f, "\\{}", octet as char)?;
            } else if octet.is_ascii_graphic() {
                write!(f, "{}", octet as char)?;
            } else {
                write!(f, "\\{:03}", octet)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.octets.len());
        for octet in self.octets.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `Label`s are ordered as in DNSSEC's canonical ordering
/// ([RFC 4034 § 6.1]): as unsigned left-justified octet strings, with
/// uppercase ASCII letters treated as if they were lowercase.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.octets
            .iter()
            .map(u8::to_ascii_lowercase)
            .cmp(other.octets.iter().map(u8::to_ascii_lowercase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_is_case_insensitive() {
        let upper = Label::try_from("HOST").unwrap();
        let lower = Label::try_from("host").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.cmp(&lower), Ordering::Equal);
        assert_eq!(upper.to_string(), "HOST");
    }

    #[test]
    fn ordering_is_canonical() {
        let a = Label::try_from("a").unwrap();
        let z = Label::try_from("Z").unwrap();
        let za = Label::try_from("za").unwrap();
        assert!(a < z);
        assert!(z < za);
    }

    #[test]
    fn display_escapes_special_octets() {
        let label = Label::try_from(&b"a.b\\c d"[..]).unwrap();
        assert_eq!(label.to_string(), "a\\.b\\\\c\\032d");
    }

    #[test]
    fn rejects_long_and_empty_labels() {
        assert_eq!(Label::try_from(&[b'x'; 64][..]), Err(Error::LabelTooLong));
        assert_eq!(Label::try_from(""), Err(Error::NullNonTerminal));
    }
}
