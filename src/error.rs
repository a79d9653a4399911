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

//! Implementation of the crate-level [`Error`] type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::name::{self, Name};
use crate::{inventory, zone, zone_file};

/// Errors that abort a zone generation run.
#[derive(Debug)]
pub enum Error {
    /// The inventory contained a network or address that could not be
    /// parsed or used as given.
    InvalidNetwork {
        network: String,
        reason: &'static str,
    },

    /// Extra records were given for a zone that was never built.
    UnknownZone(Name),

    /// A zone name in the extras document could not be parsed.
    InvalidZoneName { zone: String, source: name::Error },

    /// One or more zone files failed the syntax check. The names of
    /// the failing zones are provided.
    ZoneValidationFailed(Vec<Name>),

    /// The DHCP hostname allocator ran out of codename combinations.
    CodenameExhaustion { position: usize, words: usize },

    /// The inventory could not be read.
    Inventory(inventory::Error),

    /// The extras document could not be read or parsed.
    ExtrasDocument(serde_yaml::Error),

    /// A record definition in the extras document could not be parsed.
    ExtrasSyntax {
        zone: Name,
        definition: usize,
        source: zone_file::Error,
    },

    /// A record could not be added to a zone.
    Zone { zone: Name, source: zone::Error },

    /// A zone file could not be written.
    Io { path: PathBuf, source: io::Error },
}

/// A result type for zone generation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Constructs an [`Error::InvalidNetwork`].
    pub(crate) fn invalid_network(network: impl fmt::Display, reason: &'static str) -> Self {
        Self::InvalidNetwork {
            network: network.to_string(),
            reason,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidNetwork { network, reason } => {
                write!(f, "invalid network {}: {}", network, reason)
            }
            Self::UnknownZone(name) => write!(
                f,
                "extra records were given for {}, which is not a generated zone",
                name
            ),
            Self::InvalidZoneName { zone, .. } => {
                write!(f, "invalid zone name {:?} in the extras document", zone)
            }
            Self::ZoneValidationFailed(zones) => {
                if zones.len() == 1 {
                    write!(f, "1 zone failed validation: {}", zones[0])
                } else {
                    write!(f, "{} zones failed validation:", zones.len())?;
                    for zone in zones {
                        write!(f, " {}", zone)?;
                    }
                    Ok(())
                }
            }
            Self::CodenameExhaustion { position, words } => write!(
                f,
                "ran out of codenames at position {} ({} words available)",
                position, words
            ),
            Self::Inventory(_) => f.write_str("failed to read the inventory"),
            Self::ExtrasDocument(_) => f.write_str("failed to parse the extras document"),
            Self::ExtrasSyntax {
                zone, definition, ..
            } => write!(
                f,
                "failed to parse extra record definition {} for {}",
                definition + 1,
                zone
            ),
            Self::Zone { zone, .. } => write!(f, "failed to update {}", zone),
            Self::Io { path, .. } => write!(f, "failed to write {}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidZoneName { source, .. } => Some(source),
            Self::Inventory(e) => Some(e),
            Self::ExtrasDocument(e) => Some(e),
            Self::ExtrasSyntax { source, .. } => Some(source),
            Self::Zone { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<inventory::Error> for Error {
    fn from(error: inventory::Error) -> Self {
        Self::Inventory(error)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::ExtrasDocument(error)
    }
}
