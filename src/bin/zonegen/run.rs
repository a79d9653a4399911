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

//! Implements the `generate` command.

use std::fmt::Write;
use std::fs;
use std::process;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};

use zonegen::builder::ZoneBuilder;
use zonegen::dhcp::{Codenames, DhcpHostnameAllocator};
use zonegen::engine::{self, Engine};
use zonegen::extras::Extras;
use zonegen::output::{SignedZones, ZoneWriter};
use zonegen::rr::Ttl;
use zonegen::validate::{NamedCheckzone, ZoneValidator};

use crate::args::GenerateArgs;
use crate::config::{self, Config, DhcpConfig};

/// Runs a generation.
pub fn run(args: GenerateArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    if let Err(e) = try_generating(args) {
        let mut message = String::from("Failed to generate zones:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_generating(args: GenerateArgs) -> Result<()> {
    info!(
        "zonegen v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    info!("Loading the configuration from {}.", args.config.display());
    let config =
        config::load_from_path(&args.config).context("failed to load the configuration")?;

    // Read the extras before touching the inventory, so that a typo in
    // them fails fast.
    let extras = match args.extra {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Some(Extras::from_yaml(&text).context("failed to load the extras")?)
        }
        None => None,
    };

    let mut engine = make_engine(&config, args.serial)?;
    let inventory = config
        .inventory
        .open()
        .context("failed to open the inventory")?;
    info!("Generating zones.");
    let zones = engine
        .generate(inventory.as_ref(), extras.as_ref())
        .context("failed to generate the zones")?;

    let output_dir = args.output.unwrap_or(config.output_dir);
    info!("Writing zones to {}.", output_dir.display());
    let writer = ZoneWriter::new(output_dir)
        .with_selector(SignedZones::new(config::names(&config.signed_zones)));
    let validator = ZoneValidator::new(NamedCheckzone::new(config.checkzone));
    engine::publish(&zones, &writer, &validator).context("failed to publish the zones")?;
    Ok(())
}

fn make_engine(config: &Config, serial: Option<u32>) -> Result<Engine> {
    let mut builder = ZoneBuilder::new(
        (&config.soa).into(),
        config::names(&config.name_servers),
        Ttl::from(config.ttl),
    );
    if let Some(serial) = serial {
        builder = builder.with_serial(serial);
    }
    info!("Using SOA serial {}.", builder.serial());

    let engine = Engine::new(builder, config::names(&config.forward_domains));
    match config.dhcp {
        Some(ref dhcp) => Ok(engine.with_hook(make_allocator(dhcp)?)),
        None => Ok(engine),
    }
}

fn make_allocator(config: &DhcpConfig) -> Result<DhcpHostnameAllocator> {
    let text = fs::read_to_string(&config.codenames).with_context(|| {
        format!(
            "failed to read the codename list {}",
            config.codenames.display()
        )
    })?;
    let codenames = Codenames::parse(&text);
    info!("Loaded {} codenames.", codenames.len());
    Ok(DhcpHostnameAllocator::new(
        config.codename_domain.0.clone(),
        config.numeric_domain.0.clone(),
        codenames,
    )
    .with_marker(config.codename_marker.clone())
    .with_default_reserved(config.default_reserved))
}
