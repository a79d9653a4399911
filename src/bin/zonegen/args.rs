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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Generates DNS zone files from a network inventory
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate, write, and validate the zone files
    Generate(GenerateArgs),
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Set the configuration file to use
    #[clap(long, short, value_name = "FILE")]
    pub config: PathBuf,

    /// Merge extra records from a YAML file
    #[clap(long, short, value_name = "FILE")]
    pub extra: Option<PathBuf>,

    /// Override the output directory
    #[clap(long, short, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Override the SOA serial (defaults to the current UNIX time)
    #[clap(long, value_name = "N")]
    pub serial: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_arguments_parse() {
        let args = Args::try_parse_from([
            "zonegen",
            "generate",
            "--config",
            "zonegen.toml",
            "-e",
            "dns-extra.yaml",
            "--serial",
            "42",
        ])
        .unwrap();
        let Command::Generate(generate) = args.command;
        assert_eq!(generate.config, PathBuf::from("zonegen.toml"));
        assert_eq!(generate.extra, Some(PathBuf::from("dns-extra.yaml")));
        assert_eq!(generate.output, None);
        assert_eq!(generate.serial, Some(42));
    }

    #[test]
    fn config_is_required() {
        assert!(Args::try_parse_from(["zonegen", "generate"]).is_err());
    }
}
