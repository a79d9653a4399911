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

//! Implementation of the [`Error`] type for zone-related errors.

use std::fmt;

use crate::name::Name;

use super::ValidationIssue;

/// Errors that arise during operations on a [`Zone`](super::Zone).
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The owner of a record is not at or below the zone apex.
    NotInZone(Name),

    /// The zone failed structural validation. Only the fatal issues
    /// are provided.
    Invalid(Vec<ValidationIssue>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotInZone(owner) => write!(f, "the owner {} is not within the zone", owner),
            Self::Invalid(issues) => {
                f.write_str("the zone is invalid")?;
                for (i, issue) in issues.iter().enumerate() {
                    let separator = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{}", separator, issue)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}
