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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::str::FromStr;

mod error;
mod label;
pub use error::Error;
pub use label::Label;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name.
///
/// A `Name` is stored as its non-null labels, most specific first; the
/// terminating null label of the root is implicit. `Name`s can be
/// constructed:
///
/// * through the [`FromStr`] implementation, which accepts the
///   presentation format with or without the trailing period (a name
///   without a trailing period is still taken to be fully qualified);
/// * through [`Name::parse_relative`], which implements zone-file
///   semantics for partially qualified names and `@`; and
/// * by prepending labels to an existing name with [`Name::child`].
///
/// Comparisons are ASCII-case-insensitive, and the [`Ord`]
/// implementation is DNSSEC's canonical ordering.
#[derive(Clone, Default)]
pub struct Name {
    labels: Vec<Label>,
}

////////////////////////////////////////////////////////////////////////
// NAME PUBLIC API                                                    //
////////////////////////////////////////////////////////////////////////

#[allow(clippy::len_without_is_empty)] // Use is_root() instead.
impl Name {
    /// Returns the DNS root, `.`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Constructs a `Name` from its labels, most specific first.
    pub fn from_labels(labels: Vec<Label>) -> Result<Self, Error> {
        let name = Self { labels };
        if name.wire_len() > MAX_WIRE_LEN {
            Err(Error::NameTooLong)
        } else {
            Ok(name)
        }
    }

    /// Returns the name formed by prepending `label` to this `Name`.
    pub fn child(&self, label: &[u8]) -> Result<Self, Error> {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push(Label::try_from(label)?);
        labels.extend(self.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.len() >= other.len()
            && self
                .labels
                .iter()
                .rev()
                .zip(other.labels.iter().rev())
                .all(|(a, b)| a == b)
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns an iterator over the labels of this `Name`, most
    /// specific first. The null label of the root is not included.
    pub fn labels(&self) -> std::slice::Iter<Label> {
        self.labels.iter()
    }

    /// Returns the number of labels in this `Name`, not counting the
    /// null label of the root.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns the superdomain obtained by skipping the first `skip`
    /// labels of the `Name`, or `None` if there aren't enough labels.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        self.labels.get(skip..).map(|labels| Self {
            labels: labels.to_vec(),
        })
    }

    /// Formats this `Name` relative to `origin`, as done for owner
    /// names in zone files. The origin itself is written as `@`, and a
    /// name outside of `origin` is written fully qualified.
    pub fn relative_to(&self, origin: &Name) -> String {
        if !self.eq_or_subdomain_of(origin) {
            self.to_string()
        } else if self.len() == origin.len() {
            String::from("@")
        } else {
            let prefix = &self.labels[..self.len() - origin.len()];
            prefix
                .iter()
                .map(Label::to_string)
                .collect::<Vec<_>>()
                .join(".")
        }
    }

    /// Parses a name in zone-file presentation format. A name ending in
    /// a period is fully qualified; `@` stands for `origin`; any other
    /// name is relative to `origin`.
    pub fn parse_relative(text: &str, origin: Option<&Name>) -> Result<Self, Error> {
        if text == "@" {
            return origin.cloned().ok_or(Error::RelativeWithoutOrigin);
        }
        let (labels, fully_qualified) = parse_labels(text)?;
        if fully_qualified {
            Self::from_labels(labels)
        } else if let Some(origin) = origin {
            let mut labels = labels;
            labels.extend(origin.labels.iter().cloned());
            Self::from_labels(labels)
        } else {
            Err(Error::RelativeWithoutOrigin)
        }
    }

    /// Returns the length of the uncompressed on-the-wire
    /// representation of this `Name`.
    fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        &self.labels[index]
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING                                                            //
////////////////////////////////////////////////////////////////////////

/// Splits presentation-format text into labels, processing `\DDD` and
/// `\X` escapes. Also returns whether the text ended with an unescaped
/// period.
fn parse_labels(text: &str) -> Result<(Vec<Label>, bool), Error> {
    if text.is_empty() {
        return Err(Error::StrEmpty);
    } else if text == "." {
        return Ok((Vec::new(), true));
    }

    let mut labels = Vec::new();
    let mut current = Vec::new();
    let mut octets = text.as_bytes();
    let mut ended_with_period = false;
    while let Some(&octet) = octets.first() {
        ended_with_period = false;
        if octet == b'\\' {
            let (value, consumed) = parse_escape(&octets[1..])?;
            current.push(value);
            octets = &octets[consumed + 1..];
        } else if octet == b'.' {
            labels.push(Label::try_from(&current[..])?);
            current.clear();
            ended_with_period = true;
            octets = &octets[1..];
        } else if !octet.is_ascii() {
            return Err(Error::StrNotAscii);
        } else {
            current.push(octet);
            octets = &octets[1..];
        }
    }
    if !ended_with_period {
        labels.push(Label::try_from(&current[..])?);
    }
    Ok((labels, ended_with_period))
}

/// Parses the escape sequence following a backslash. Returns the
/// escaped octet and the number of octets consumed.
fn parse_escape(octets: &[u8]) -> Result<(u8, usize), Error> {
    match octets.first() {
        Some(first) if first.is_ascii_digit() => {
            let digits = octets.get(0..3).ok_or(Error::InvalidEscape)?;
            if !digits.iter().all(u8::is_ascii_digit) {
                return Err(Error::InvalidEscape);
            }
            let value = digits
                .iter()
                .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
            u8::try_from(value)
                .map(|v| (v, 3))
                .or(Err(Error::InvalidEscape))
        }
        Some(&octet) if octet.is_ascii() => Ok((octet, 1)),
        Some(_) => Err(Error::StrNotAscii),
        None => Err(Error::InvalidEscape),
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (labels, _) = parse_labels(s)?;
        Self::from_labels(labels)
    }
}

////////////////////////////////////////////////////////////////////////
// TRAIT IMPLEMENTATIONS                                              //
////////////////////////////////////////////////////////////////////////

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in &self.labels {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.labels.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` employs DNSSEC's canonical
/// ordering of domain names. Per [RFC 4034 § 6.1], `Name`s are ordered
/// as strings of labels read from right to left.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels
            .iter()
            .rev()
            .zip(other.labels.iter().rev())
            .find_map(|(a, b)| Some(a.cmp(b)).filter(|ordering| ordering.is_ne()))
            .unwrap_or_else(|| self.len().cmp(&other.len()))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    #[test]
    fn from_str_treats_names_as_fully_qualified() {
        assert_eq!(name("host1.example.org"), name("host1.example.org."));
        assert_eq!(name("host1.example.org").to_string(), "host1.example.org.");
        assert_eq!(name(".").to_string(), ".");
        assert!(name(".").is_root());
    }

    #[test]
    fn from_str_processes_escapes() {
        let escaped = name("a\\.b.c\\065.");
        assert_eq!(escaped.len(), 2);
        assert_eq!(escaped[0].octets(), b"a.b");
        assert_eq!(escaped[1].octets(), b"cA");
        assert_eq!("a\\256.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("a\\25".parse::<Name>(), Err(Error::InvalidEscape));
    }

    #[test]
    fn from_str_rejects_bad_names() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("a..b.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!("hé.test.".parse::<Name>(), Err(Error::StrNotAscii));
        let long = format!("{}.", vec!["x".repeat(60); 5].join("."));
        assert_eq!(long.parse::<Name>(), Err(Error::NameTooLong));
    }

    #[test]
    fn parse_relative_follows_zone_file_rules() {
        let origin = name("example.org.");
        assert_eq!(Name::parse_relative("@", Some(&origin)).unwrap(), origin);
        assert_eq!(
            Name::parse_relative("host1", Some(&origin)).unwrap(),
            name("host1.example.org."),
        );
        assert_eq!(
            Name::parse_relative("other.test.", Some(&origin)).unwrap(),
            name("other.test."),
        );
        assert_eq!(
            Name::parse_relative("host1", None),
            Err(Error::RelativeWithoutOrigin),
        );
    }

    #[test]
    fn subdomain_check_is_label_based() {
        let origin = name("example.org.");
        assert!(name("a.b.example.org.").eq_or_subdomain_of(&origin));
        assert!(name("EXAMPLE.org.").eq_or_subdomain_of(&origin));
        assert!(!name("badexample.org.").eq_or_subdomain_of(&origin));
        assert!(!name("org.").eq_or_subdomain_of(&origin));
        assert!(origin.eq_or_subdomain_of(&Name::root()));
    }

    #[test]
    fn relative_to_works() {
        let origin = name("example.org.");
        assert_eq!(origin.relative_to(&origin), "@");
        assert_eq!(name("a.b.example.org.").relative_to(&origin), "a.b");
        assert_eq!(name("other.test.").relative_to(&origin), "other.test.");
    }

    #[test]
    fn canonical_ordering_works() {
        // From RFC 4034 § 6.1, minus the entries that require octets
        // outside of the ASCII range.
        let ordered = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "*.z.example.",
        ];
        let mut names: Vec<Name> = ordered.iter().rev().map(|n| name(n)).collect();
        names.sort();
        let sorted: Vec<String> = names.iter().map(Name::to_string).collect();
        let expected: Vec<String> = ordered.iter().map(|n| n.to_string()).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn child_and_superdomain_work() {
        let origin = name("example.org.");
        let host = origin.child(b"host1").unwrap();
        assert_eq!(host, name("host1.example.org."));
        assert_eq!(host.superdomain(1).unwrap(), origin);
        assert!(host.superdomain(3).unwrap().is_root());
        assert!(host.superdomain(4).is_none());
    }
}
