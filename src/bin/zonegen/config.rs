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

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use zonegen::builder::SoaParams;
use zonegen::dhcp::DEFAULT_CODENAME_MARKER;
use zonegen::inventory::{Inventory, StaticInventory, DEFAULT_DHCP_RESERVED};
use zonegen::name::Name;
use zonegen::validate::NamedCheckzone;

use crate::netbox;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`. Relative
/// paths in the configuration are interpreted relative to the
/// configuration file's directory.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let dir = match path.as_ref().parent() {
        Some(p) => p,
        None => return Err(anyhow!("the configuration file path has no parent")),
    };
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let mut config: Config =
        toml::from_slice(&raw_config).context("failed to parse the configuration file")?;
    config.resolve_paths(dir);
    log_config_summary(&config);
    Ok(config)
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = format!(
        "Configuration loaded:\n\
         Inventory:       {}\n\
         Output:          {}\n\
         DHCP names:      {}\n\
         Forward domains: ",
        config.inventory.name(),
        config.output_dir.display(),
        if config.dhcp.is_some() {
            "enabled"
        } else {
            "disabled"
        },
    );
    summarize_names(&config.forward_domains, &mut message);
    message.push_str("\nName servers:    ");
    summarize_names(&config.name_servers, &mut message);
    debug!("{}", message);
}

fn summarize_names(names: &[ConfigName], message: &mut String) {
    if names.is_empty() {
        message.push_str("none");
    } else {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                message.push_str(", ");
            }
            write!(message, "{}", name.0).unwrap();
        }
    }
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub forward_domains: Vec<ConfigName>,
    pub name_servers: Vec<ConfigName>,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_checkzone")]
    pub checkzone: PathBuf,
    #[serde(default)]
    pub signed_zones: Vec<ConfigName>,
    pub soa: SoaConfig,
    pub inventory: InventoryConfig,
    pub dhcp: Option<DhcpConfig>,
}

fn default_ttl() -> u32 {
    3600
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_checkzone() -> PathBuf {
    PathBuf::from(NamedCheckzone::DEFAULT_PROGRAM)
}

impl Config {
    fn resolve_paths(&mut self, dir: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        };
        resolve(&mut self.output_dir);
        if let InventoryConfig::Snapshot(ref mut snapshot) = self.inventory {
            resolve(&mut snapshot.path);
        }
        if let Some(ref mut dhcp) = self.dhcp {
            resolve(&mut dhcp.codenames);
        }
    }
}

/// Unwraps configured domain names.
pub fn names(names: &[ConfigName]) -> Vec<Name> {
    names.iter().map(|name| name.0.clone()).collect()
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION SECTION: SOA                                         //
////////////////////////////////////////////////////////////////////////

/// The SOA fields shared by every generated zone.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoaConfig {
    pub mname: ConfigName,
    pub rname: ConfigName,
    #[serde(default = "default_refresh")]
    pub refresh: u32,
    #[serde(default = "default_retry")]
    pub retry: u32,
    #[serde(default = "default_expire")]
    pub expire: u32,
}

fn default_refresh() -> u32 {
    3600
}

fn default_retry() -> u32 {
    120
}

fn default_expire() -> u32 {
    4 * 60 * 60
}

impl From<&SoaConfig> for SoaParams {
    fn from(config: &SoaConfig) -> Self {
        Self {
            mname: config.mname.0.clone(),
            rname: config.rname.0.clone(),
            refresh: config.refresh,
            retry: config.retry,
            expire: config.expire,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION SECTION: INVENTORY                                   //
////////////////////////////////////////////////////////////////////////

/// The selection of inventory source and its configuration.
#[derive(Debug, Deserialize)]
#[serde(tag = "source")]
pub enum InventoryConfig {
    #[serde(rename = "netbox")]
    Netbox(netbox::Config),
    #[serde(rename = "snapshot")]
    Snapshot(SnapshotConfig),
}

/// An inventory snapshot: a JSON file with `aggregates`, `addresses`,
/// and `prefixes` arrays.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    pub path: PathBuf,
}

impl InventoryConfig {
    /// Returns the name of the selected inventory source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Netbox(_) => "netbox",
            Self::Snapshot(_) => "snapshot",
        }
    }

    /// Opens the selected inventory source.
    pub fn open(&self) -> Result<Box<dyn Inventory>> {
        match self {
            Self::Netbox(config) => Ok(Box::new(netbox::NetboxInventory::new(config)?)),
            Self::Snapshot(config) => {
                let raw = fs::read(&config.path).with_context(|| {
                    format!("failed to read the snapshot {}", config.path.display())
                })?;
                let inventory: StaticInventory =
                    serde_json::from_slice(&raw).context("failed to parse the snapshot")?;
                Ok(Box::new(inventory))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION SECTION: DHCP                                        //
////////////////////////////////////////////////////////////////////////

/// The configuration of DHCP hostname synthesis.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DhcpConfig {
    pub codename_domain: ConfigName,
    pub numeric_domain: ConfigName,
    pub codenames: PathBuf,
    #[serde(default = "default_codename_marker")]
    pub codename_marker: String,
    #[serde(default = "default_reserved")]
    pub default_reserved: u32,
}

fn default_codename_marker() -> String {
    DEFAULT_CODENAME_MARKER.to_owned()
}

fn default_reserved() -> u32 {
    DEFAULT_DHCP_RESERVED
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS OVER ZONEGEN TYPES FOR SERDE                              //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type
/// from [`zonegen`], using its [`FromStr`](std::str::FromStr)
/// implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper over a [`zonegen`]
        /// type.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigName, Name, "domain name");

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        forward_domains = ["example.org", "campers.example.org."]
        name_servers = ["ns1.example.net."]
        signed_zones = ["example.org"]

        [soa]
        mname = "ns1.example.net."
        rname = "hostmaster.example.net."

        [inventory]
        source = "snapshot"
        path = "inventory.json"

        [dhcp]
        codename_domain = "campers.example.org."
        numeric_domain = "example.org."
        codenames = "dns-codenames.txt"
    "#;

    #[test]
    fn config_parses_with_defaults() {
        let mut config: Config = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.ttl, 3600);
        assert_eq!(config.soa.expire, 14400);
        assert_eq!(
            names(&config.forward_domains)[0],
            "example.org.".parse::<Name>().unwrap()
        );
        let dhcp = config.dhcp.as_ref().unwrap();
        assert_eq!(dhcp.codename_marker, "Camper-");
        assert_eq!(dhcp.default_reserved, 10);
        assert_eq!(config.inventory.name(), "snapshot");

        config.resolve_paths(Path::new("/etc/zonegen"));
        assert_eq!(config.output_dir, Path::new("/etc/zonegen/out"));
        assert_eq!(
            config.dhcp.unwrap().codenames,
            Path::new("/etc/zonegen/dns-codenames.txt")
        );
    }

    #[test]
    fn config_rejects_unknown_fields_and_bad_names() {
        let unknown = CONFIG.replace("[soa]", "bogus = 1\n[soa]");
        assert!(toml::from_str::<Config>(&unknown).is_err());
        let bad_name = CONFIG.replace("ns1.example.net.\"]", "a..b\"]");
        assert!(toml::from_str::<Config>(&bad_name).is_err());
    }
}
