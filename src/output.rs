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

//! Serialization of zones to zone files.
//!
//! Zones are written to `zones/` or, when a [`SignedZones`] selector
//! picks them, to `signed-zones/`. Files are rendered the same way in
//! both places. In particular, a signed zone's file carries no
//! `$INCLUDE` for its DNSKEY records: the signing process that picks
//! up `signed-zones/` must supply the keys itself.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use log::debug;

use crate::name::Name;
use crate::rr::{Rrset, Type};
use crate::zone::Zone;
use crate::{Error, Result};

const EDIT_WARNING: &str = ";\n\
                            ; DO NOT EDIT THIS FILE!\n\
                            ; This file is automatically generated and changes will be lost next time it is built.\n";

////////////////////////////////////////////////////////////////////////
// PATH SELECTION                                                     //
////////////////////////////////////////////////////////////////////////

/// Chooses the subdirectory of the output root that a zone's file is
/// written to.
pub trait PathSelector {
    fn subdirectory(&self, origin: &Name) -> &str;
}

/// Writes every zone to `zones/`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPaths;

impl PathSelector for DefaultPaths {
    fn subdirectory(&self, _origin: &Name) -> &str {
        "zones"
    }
}

/// Writes zones at or below any of a set of signed zones to
/// `signed-zones/`, where a signing process picks them up, and all
/// others to `zones/`. Only the directory differs; the signer must add
/// the DNSKEY records (usually with an `$INCLUDE`) itself.
#[derive(Clone, Debug, Default)]
pub struct SignedZones {
    signed: Vec<Name>,
}

impl SignedZones {
    pub fn new(signed: Vec<Name>) -> Self {
        Self { signed }
    }

    /// Returns whether `origin` is at or below a signed zone.
    pub fn is_signed(&self, origin: &Name) -> bool {
        self.signed.iter().any(|s| origin.eq_or_subdomain_of(s))
    }
}

impl PathSelector for SignedZones {
    fn subdirectory(&self, origin: &Name) -> &str {
        if self.is_signed(origin) {
            "signed-zones"
        } else {
            "zones"
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ZONE WRITER                                                        //
////////////////////////////////////////////////////////////////////////

/// Renders zones as text and writes them below an output root.
pub struct ZoneWriter {
    root: PathBuf,
    selector: Box<dyn PathSelector>,
}

impl ZoneWriter {
    /// Creates a new `ZoneWriter` that writes every zone to
    /// `<root>/zones/`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            selector: Box::new(DefaultPaths),
        }
    }

    /// Replaces the [`PathSelector`].
    pub fn with_selector(mut self, selector: impl PathSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Returns the path that `zone` is written to: the origin, without
    /// its trailing period, inside the selected subdirectory.
    pub fn path_for(&self, zone: &Name) -> PathBuf {
        let file_name = zone.to_string();
        let file_name = file_name.strip_suffix('.').unwrap_or(&file_name);
        self.root
            .join(self.selector.subdirectory(zone))
            .join(file_name)
    }

    /// Renders `zone` in zone-file format.
    ///
    /// The output is deterministic: owners are in canonical order, the
    /// SOA record comes first, and the other RRsets at each owner follow
    /// in type order. Owners are written relative to the origin, while
    /// names in RDATA are always fully qualified.
    pub fn render(&self, zone: &Zone) -> String {
        let origin = zone.origin();
        let mut text = String::new();
        text.push_str(";\n; zone file built by zonegen\n");
        // NOTE: the unwrap()s are okay, since writing to a String
        // cannot fail.
        writeln!(text, "; {}", origin).unwrap();
        text.push_str(EDIT_WARNING);
        text.push_str(";\n");

        for (owner, rrsets) in zone.nodes() {
            let owner_text = owner.relative_to(origin);
            let mut ordered: Vec<&Rrset> = rrsets.iter().collect();
            ordered.sort_by_key(|rrset| (rrset.rr_type != Type::SOA, rrset.rr_type));
            for rrset in ordered {
                for rdata in rrset.rdatas() {
                    writeln!(
                        text,
                        "{} {} IN {} {}",
                        owner_text, rrset.ttl, rrset.rr_type, rdata
                    )
                    .unwrap();
                }
            }
        }

        text.push_str(EDIT_WARNING);
        text
    }

    /// Writes `zone` to its path, creating directories as needed.
    /// Returns the path written.
    ///
    /// The text is first written to a temporary file in the target
    /// directory, which is then renamed over the target, so that a
    /// reader never sees a partially-written file.
    pub fn write(&self, zone: &Zone) -> Result<PathBuf> {
        let path = self.path_for(zone.origin());
        let io_error = |source| Error::Io {
            path: path.clone(),
            source,
        };
        let text = self.render(zone);
        write_atomically(&path, text.as_bytes()).map_err(io_error)?;
        debug!("Wrote {} to {}.", zone.origin(), path.display());
        Ok(path)
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(path.file_name().unwrap_or_default());
    temp_name.push(".tmp");
    let temp_path = directory.join(temp_name);

    let result = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    match result.and_then(|()| fs::rename(&temp_path, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::rr::{Rdata, Soa, Ttl};

    lazy_static! {
        static ref ORIGIN: Name = "example.org.".parse().unwrap();
    }

    fn zone() -> Zone {
        let mut zone = Zone::new(ORIGIN.clone());
        let ttl = Ttl::from(3600);
        let host1: Name = "host1.example.org.".parse().unwrap();
        zone.add(&host1, ttl, Rdata::A("10.0.0.5".parse().unwrap()))
            .unwrap();
        zone.add(&ORIGIN, ttl, Rdata::Ns("ns1.example.net.".parse().unwrap()))
            .unwrap();
        zone.add(
            &ORIGIN,
            ttl,
            Rdata::Soa(Soa {
                mname: "ns1.example.net.".parse().unwrap(),
                rname: "hostmaster.example.net.".parse().unwrap(),
                serial: 1234,
                refresh: 3600,
                retry: 120,
                expire: 14400,
                minimum: 3600,
            }),
        )
        .unwrap();
        zone
    }

    #[test]
    fn render_is_deterministic_and_ordered() {
        let writer = ZoneWriter::new("out");
        let text = writer.render(&zone());
        let expected = ";\n\
                        ; zone file built by zonegen\n\
                        ; example.org.\n\
                        ;\n\
                        ; DO NOT EDIT THIS FILE!\n\
                        ; This file is automatically generated and changes will be lost next time it is built.\n\
                        ;\n\
                        @ 3600 IN SOA ns1.example.net. hostmaster.example.net. 1234 3600 120 14400 3600\n\
                        @ 3600 IN NS ns1.example.net.\n\
                        host1 3600 IN A 10.0.0.5\n\
                        ;\n\
                        ; DO NOT EDIT THIS FILE!\n\
                        ; This file is automatically generated and changes will be lost next time it is built.\n";
        assert_eq!(text, expected);
        assert_eq!(writer.render(&zone()), text);
    }

    #[test]
    fn signed_zones_get_their_own_directory() {
        let writer = ZoneWriter::new("/out")
            .with_selector(SignedZones::new(vec!["example.org.".parse().unwrap()]));
        assert_eq!(
            writer.path_for(&"lab.example.org.".parse().unwrap()),
            Path::new("/out/signed-zones/lab.example.org")
        );
        assert_eq!(
            writer.path_for(&"notexample.org.".parse().unwrap()),
            Path::new("/out/zones/notexample.org")
        );
        assert_eq!(
            ZoneWriter::new("/out").path_for(&ORIGIN),
            Path::new("/out/zones/example.org")
        );
        let signed = writer.render(&zone());
        assert_eq!(signed, ZoneWriter::new("/out").render(&zone()));
        assert!(!signed.contains("$INCLUDE"));
    }

    #[test]
    fn write_creates_directories_and_replaces_files() {
        let root = tempfile::tempdir().unwrap();
        let writer = ZoneWriter::new(root.path());
        let path = writer.write(&zone()).unwrap();
        assert_eq!(path, root.path().join("zones").join("example.org"));
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("host1 3600 IN A 10.0.0.5"));

        let mut changed = zone();
        changed
            .add(
                &"host2.example.org.".parse().unwrap(),
                Ttl::from(3600),
                Rdata::A("10.0.0.6".parse().unwrap()),
            )
            .unwrap();
        writer.write(&changed).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert!(second.contains("host2 3600 IN A 10.0.0.6"));
        let leftovers: Vec<_> = fs::read_dir(root.path().join("zones"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn write_reports_io_errors() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("zones"), b"not a directory").unwrap();
        let writer = ZoneWriter::new(root.path());
        assert!(matches!(writer.write(&zone()), Err(Error::Io { .. })));
    }
}
