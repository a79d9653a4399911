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

//! Generation of DNS zone files from a network inventory.
//!
//! Given the address aggregates and named addresses recorded in a
//! network inventory, this crate derives a forward zone for each
//! configured domain and a reverse zone for each address bucket,
//! places A/AAAA/PTR records for every named address, merges
//! hand-authored overrides, and writes the zones out as zone files that
//! are then checked by an external syntax checker.
//!
//! The pipeline is driven by an [`Engine`](engine::Engine), whose
//! phases operate on an explicit [`ZoneStore`](store::ZoneStore):
//!
//! 1. [`ZoneBuilder`](builder::ZoneBuilder) creates SOA/NS skeletons;
//! 2. [`RecordPlacer`](placer::RecordPlacer) fills in records;
//! 3. an optional [`PlacementHook`](placer::PlacementHook) (e.g. the
//!    [`DhcpHostnameAllocator`](dhcp::DhcpHostnameAllocator)) adds
//!    more;
//! 4. the [`ExtrasMerger`](extras::ExtrasMerger) applies overrides;
//! 5. the store is frozen, and the [`ZoneWriter`](output::ZoneWriter)
//!    and [`ZoneValidator`](validate::ZoneValidator) produce and check
//!    the files.

pub mod builder;
pub mod dhcp;
pub mod engine;
mod error;
pub mod extras;
pub mod inventory;
pub mod name;
pub mod output;
pub mod placer;
pub mod reverse;
pub mod rr;
pub mod store;
mod util;
pub mod validate;
pub mod zone;
pub mod zone_file;

pub use error::{Error, Result};
