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

//! An [`Inventory`] backed by the NetBox REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use zonegen::inventory::{self, Inventory, RawAddress, RawAggregate, RawPrefix};

/// Connection settings for NetBox.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub url: String,
    pub token: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_page_size() -> usize {
    1000
}

fn default_timeout() -> u64 {
    60
}

/// Reads aggregates, IP addresses, and DHCP prefixes from NetBox. Each
/// collection is paged through in full on every call.
pub struct NetboxInventory {
    client: Client,
    api: String,
    token: String,
    page_size: usize,
}

/// One page of a NetBox list endpoint.
#[derive(Deserialize)]
struct Page<T> {
    next: Option<String>,
    results: Vec<T>,
}

/// A NetBox prefix. The DHCP settings are custom fields.
#[derive(Deserialize)]
struct NetboxPrefix {
    prefix: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    custom_fields: CustomFields,
}

#[derive(Default, Deserialize)]
struct CustomFields {
    #[serde(default)]
    dhcp: Option<bool>,
    #[serde(default)]
    dhcp_reserved: Option<u32>,
}

impl From<NetboxPrefix> for RawPrefix {
    fn from(prefix: NetboxPrefix) -> Self {
        Self {
            prefix: prefix.prefix,
            dhcp: prefix.custom_fields.dhcp.unwrap_or(false),
            dhcp_reserved: prefix.custom_fields.dhcp_reserved,
            description: prefix.description,
        }
    }
}

impl NetboxInventory {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("zonegen/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create the NetBox client")?;
        Ok(Self {
            client,
            api: format!("{}/api", config.url.trim_end_matches('/')),
            token: config.token.clone(),
            page_size: config.page_size,
        })
    }

    fn request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/json")
    }

    /// Fetches every object of the list endpoint `endpoint`, following
    /// the `next` links.
    fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: &'static str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, inventory::Error> {
        let limit = self.page_size.to_string();
        let mut request = self
            .request(&format!("{}/{}/", self.api, endpoint))
            .query(query)
            .query(&[("limit", limit.as_str())]);
        let mut objects = Vec::new();
        loop {
            let page: Page<T> = request
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.json())
                .map_err(|e| inventory::Error::new(collection, e))?;
            objects.extend(page.results);
            match page.next {
                Some(next) => request = self.request(&next),
                None => break,
            }
        }
        debug!("Fetched {} {} from NetBox.", objects.len(), collection);
        Ok(objects)
    }
}

impl Inventory for NetboxInventory {
    fn aggregates(&self) -> Result<Vec<RawAggregate>, inventory::Error> {
        self.fetch_all("aggregates", "ipam/aggregates", &[])
    }

    fn addresses(&self) -> Result<Vec<RawAddress>, inventory::Error> {
        self.fetch_all("IP addresses", "ipam/ip-addresses", &[])
    }

    fn dhcp_prefixes(&self) -> Result<Vec<RawPrefix>, inventory::Error> {
        let prefixes: Vec<NetboxPrefix> = self.fetch_all(
            "prefixes",
            "ipam/prefixes",
            &[("cf_dhcp", "true"), ("family", "4")],
        )?;
        Ok(prefixes.into_iter().map(RawPrefix::from).collect())
    }
}
