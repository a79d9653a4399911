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

//! End-to-end generation from an inventory snapshot.

use std::fs;
use std::path::Path;

use zonegen::builder::{SoaParams, ZoneBuilder};
use zonegen::dhcp::{Codenames, DhcpHostnameAllocator};
use zonegen::engine::{self, Engine};
use zonegen::extras::Extras;
use zonegen::inventory::StaticInventory;
use zonegen::name::Name;
use zonegen::output::{SignedZones, ZoneWriter};
use zonegen::rr::Ttl;
use zonegen::validate::ZoneValidator;
use zonegen::Error;

const SNAPSHOT: &str = r#"{
    "aggregates": [
        {"prefix": "10.0.0.0/23"},
        {"prefix": "2001:db8:ab00::/42"}
    ],
    "addresses": [
        {"address": "10.0.0.5/24", "dns_name": "host1.example.org"},
        {"address": "2001:db8:ab00::5/64", "dns_name": "host1.example.org"},
        {"address": "2001:db8:ab30::7/64", "dns_name": "v6.lab.example.org"},
        {"address": "10.0.1.20/24", "dns_name": "gw.lab.example.org"},
        {"address": "10.0.1.21/24", "dns_name": ""},
        {"address": "10.0.1.22/24"}
    ],
    "prefixes": [
        {"prefix": "10.0.1.240/29", "dhcp": true, "dhcp_reserved": 2,
         "description": "Camper-North"},
        {"prefix": "10.0.1.0/25", "dhcp": false}
    ]
}"#;

const EXTRAS: &str = "
example.org:
  - host1 IN A 10.0.0.9
  - \"@ 300 IN TXT \\\"v=spf1 -all\\\"\"
";

fn engine() -> Engine {
    let builder = ZoneBuilder::new(
        SoaParams {
            mname: "ns1.example.net.".parse().unwrap(),
            rname: "hostmaster.example.net.".parse().unwrap(),
            refresh: 3600,
            retry: 120,
            expire: 14400,
        },
        vec![
            "ns1.example.net.".parse().unwrap(),
            "ns2.example.net.".parse().unwrap(),
        ],
        Ttl::from(3600),
    )
    .with_serial(1700000000);
    let allocator = DhcpHostnameAllocator::new(
        "campers.example.org.".parse().unwrap(),
        "example.org.".parse().unwrap(),
        Codenames::parse("alpha\nbravo\ncharlie\n"),
    );
    Engine::new(
        builder,
        vec![
            "example.org.".parse().unwrap(),
            "campers.example.org.".parse().unwrap(),
        ],
    )
    .with_hook(allocator)
}

fn generate() -> zonegen::store::FrozenZones {
    let inventory: StaticInventory = serde_json::from_str(SNAPSHOT).unwrap();
    let extras = Extras::from_yaml(EXTRAS).unwrap();
    engine().generate(&inventory, Some(&extras)).unwrap()
}

#[test]
fn snapshot_generates_expected_zone_files() {
    let zones = generate();
    let origins: Vec<String> = zones.iter().map(|z| z.origin().to_string()).collect();
    assert_eq!(
        origins,
        [
            "0.0.10.in-addr.arpa.",
            "1.0.10.in-addr.arpa.",
            "0.b.a.8.b.d.0.1.0.0.2.ip6.arpa.",
            "1.b.a.8.b.d.0.1.0.0.2.ip6.arpa.",
            "2.b.a.8.b.d.0.1.0.0.2.ip6.arpa.",
            "3.b.a.8.b.d.0.1.0.0.2.ip6.arpa.",
            "example.org.",
            "campers.example.org.",
        ]
    );

    let root = tempfile::tempdir().unwrap();
    let writer = ZoneWriter::new(root.path())
        .with_selector(SignedZones::new(vec!["campers.example.org.".parse().unwrap()]));
    let validator = ZoneValidator::new(|_: &Name, path: &Path| path.exists());
    engine::publish(&zones, &writer, &validator).unwrap();

    let forward = fs::read_to_string(root.path().join("zones/example.org")).unwrap();
    assert!(forward.starts_with(";\n; zone file built by zonegen\n; example.org.\n"));
    assert!(forward.contains("\n@ 3600 IN SOA ns1.example.net. hostmaster.example.net. 1700000000 3600 120 14400 3600\n"));
    assert!(forward.contains("\n@ 300 IN TXT \"v=spf1 -all\"\n"));
    assert!(forward.contains("\nhost1 3600 IN A 10.0.0.9\n"));
    assert!(!forward.contains("10.0.0.5"));
    assert!(forward.contains("\nhost1 3600 IN AAAA 2001:db8:ab00::5\n"));
    assert!(forward.contains("\ngw.lab 3600 IN A 10.0.1.20\n"));
    assert!(forward.ends_with(
        "; This file is automatically generated and changes will be lost next time it is built.\n"
    ));

    let reverse = fs::read_to_string(root.path().join("zones/0.0.10.in-addr.arpa")).unwrap();
    assert!(reverse.contains("\n5 3600 IN PTR host1.example.org.\n"));

    // The /42 aggregate is split into four /44 zones; the last quarter
    // gets its PTR too.
    let reverse = fs::read_to_string(root.path().join("zones/3.b.a.8.b.d.0.1.0.0.2.ip6.arpa"))
        .unwrap();
    assert!(reverse.contains(" 3600 IN PTR v6.lab.example.org.\n"));

    let campers =
        fs::read_to_string(root.path().join("signed-zones/campers.example.org")).unwrap();
    for (name, address) in [
        ("alpha-bravo", "10.0.1.243"),
        ("alpha-charlie", "10.0.1.244"),
        ("bravo-alpha", "10.0.1.245"),
        ("bravo-bravo", "10.0.1.246"),
    ] {
        assert!(
            campers.contains(&format!("\n{} 3600 IN A {}\n", name, address)),
            "{} missing",
            name
        );
    }
    let reverse = fs::read_to_string(root.path().join("zones/1.0.10.in-addr.arpa")).unwrap();
    assert!(reverse.contains("\n246 3600 IN PTR bravo-bravo.campers.example.org.\n"));
    assert!(!reverse.contains("\n21 "));
}

#[test]
fn repeated_runs_are_identical() {
    let writer = ZoneWriter::new("unused");
    let first: Vec<String> = generate().iter().map(|z| writer.render(z)).collect();
    let second: Vec<String> = generate().iter().map(|z| writer.render(z)).collect();
    assert_eq!(first, second);
}

#[test]
fn failing_zones_are_all_reported() {
    let zones = generate();
    let root = tempfile::tempdir().unwrap();
    let writer = ZoneWriter::new(root.path());
    let validator = ZoneValidator::new(|origin: &Name, _: &Path| !origin.to_string().contains("arpa"));
    match engine::publish(&zones, &writer, &validator) {
        Err(Error::ZoneValidationFailed(failed)) => assert_eq!(failed.len(), 6),
        other => panic!("unexpected result: {:?}", other),
    }
    // Every zone is still written.
    assert_eq!(fs::read_dir(root.path().join("zones")).unwrap().count(), 8);
}
