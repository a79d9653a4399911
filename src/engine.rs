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

//! The zone generation pipeline.
//!
//! An [`Engine`] runs the phases of a generation run in order:
//!
//! 1. build zone skeletons for every aggregate and forward domain;
//! 2. place the records of every named inventory address;
//! 3. run the optional [`PlacementHook`] (e.g. DHCP hostnames);
//! 4. merge the extras, replacing RRsets wholesale;
//! 5. check every zone for structural errors and freeze the store.
//!
//! The frozen zones are then handed to [`publish`], which writes and
//! validates them.

use ipnet::IpNet;
use log::{debug, info};

use crate::builder::{ReverseZonePolicy, StandardPolicy, ZoneBuilder};
use crate::extras::{Extras, ExtrasMerger};
use crate::inventory::Inventory;
use crate::name::Name;
use crate::output::ZoneWriter;
use crate::placer::{PlacementHook, RecordPlacer};
use crate::store::{FrozenZones, ZoneStore};
use crate::validate::ZoneValidator;
use crate::{Error, Result};

/// A zone generator, configured with the capabilities of a particular
/// deployment.
pub struct Engine {
    builder: ZoneBuilder,
    policy: Box<dyn ReverseZonePolicy>,
    forward_domains: Vec<Name>,
    hook: Option<Box<dyn PlacementHook>>,
}

impl Engine {
    /// Creates a new `Engine` with the [`StandardPolicy`] and no
    /// placement hook.
    pub fn new(builder: ZoneBuilder, forward_domains: Vec<Name>) -> Self {
        Self {
            builder,
            policy: Box::new(StandardPolicy),
            forward_domains,
            hook: None,
        }
    }

    /// Replaces the [`ReverseZonePolicy`].
    pub fn with_policy(mut self, policy: impl ReverseZonePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Sets the [`PlacementHook`] that runs after inventory addresses
    /// are placed.
    pub fn with_hook(mut self, hook: impl PlacementHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Runs a generation from `inventory`, applying `extras` if given.
    pub fn generate(
        &mut self,
        inventory: &dyn Inventory,
        extras: Option<&Extras>,
    ) -> Result<FrozenZones> {
        let aggregates = inventory
            .aggregates()?
            .iter()
            .map(|aggregate| aggregate.network())
            .collect::<Result<Vec<IpNet>>>()?;
        info!("Read {} aggregates.", aggregates.len());

        let mut store = ZoneStore::new();
        self.builder.build(
            &mut store,
            self.policy.as_ref(),
            &aggregates,
            &self.forward_domains,
        )?;

        let placer = RecordPlacer::new(self.builder.ttl());
        let addresses = inventory.addresses()?;
        let (mut n_forward, mut n_reverse) = (0, 0);
        for raw in &addresses {
            if raw.dns_name().is_none() {
                debug!("{} has no DNS name; skipping.", raw.address);
                continue;
            }
            let address = raw.ip()?;
            let dns_name = match raw.parsed_dns_name() {
                Some(name) => name,
                None => continue,
            };
            let placement = placer.place(&mut store, address, &dns_name);
            n_forward += placement.forward.is_some() as usize;
            n_reverse += placement.reverse.is_some() as usize;
        }
        info!(
            "Placed {} forward and {} reverse records for {} addresses.",
            n_forward,
            n_reverse,
            addresses.len()
        );

        if let Some(hook) = self.hook.as_mut() {
            hook.after_placement(inventory, &mut store, &placer)?;
        }

        if let Some(extras) = extras {
            ExtrasMerger::new(self.builder.ttl()).merge_all(&mut store, extras)?;
        }

        for (_, zone) in store.iter() {
            zone.check().map_err(|source| Error::Zone {
                zone: zone.origin().clone(),
                source,
            })?;
        }
        let frozen = store.freeze();
        info!("Generated {} zones.", frozen.len());
        Ok(frozen)
    }
}

/// Writes every zone with `writer`, then checks all of them with
/// `validator`. Fails with [`Error::ZoneValidationFailed`] naming every
/// zone that did not pass.
pub fn publish(zones: &FrozenZones, writer: &ZoneWriter, validator: &ZoneValidator) -> Result<()> {
    let mut written = Vec::with_capacity(zones.len());
    for zone in zones {
        written.push((zone.origin(), writer.write(zone)?));
    }
    info!("Wrote {} zone files.", written.len());
    validator.verify_all(written).into_result()
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
