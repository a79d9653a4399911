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

//! Syntax checking of written zone files.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use log::{debug, error, info, warn};

use crate::name::Name;
use crate::{Error, Result};

////////////////////////////////////////////////////////////////////////
// SYNTAX CHECKERS                                                    //
////////////////////////////////////////////////////////////////////////

/// Checks the zone file at `path` for the zone `origin`.
pub trait SyntaxChecker {
    fn check(&self, origin: &Name, path: &Path) -> bool;
}

impl<F> SyntaxChecker for F
where
    F: Fn(&Name, &Path) -> bool,
{
    fn check(&self, origin: &Name, path: &Path) -> bool {
        self(origin, path)
    }
}

/// A [`SyntaxChecker`] that runs BIND's `named-checkzone`. A zone
/// passes only if the last line of the program's output is exactly
/// `OK`.
#[derive(Clone, Debug)]
pub struct NamedCheckzone {
    program: OsString,
}

impl NamedCheckzone {
    pub const DEFAULT_PROGRAM: &'static str = "named-checkzone";

    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NamedCheckzone {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl SyntaxChecker for NamedCheckzone {
    fn check(&self, origin: &Name, path: &Path) -> bool {
        let output = match Command::new(&self.program)
            .arg(origin.to_string())
            .arg(path)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    "Could not run {}: {}.",
                    Path::new(&self.program).display(),
                    e
                );
                return false;
            }
        };
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("Checker output for {}:\n{}", origin, stdout.trim_end());
        last_line_is_ok(&stdout)
    }
}

fn last_line_is_ok(output: &str) -> bool {
    output.lines().last() == Some("OK")
}

////////////////////////////////////////////////////////////////////////
// ZONE VALIDATOR                                                     //
////////////////////////////////////////////////////////////////////////

/// Runs a [`SyntaxChecker`] over written zone files.
pub struct ZoneValidator {
    checker: Box<dyn SyntaxChecker>,
}

/// The outcome of [`ZoneValidator::verify_all`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationReport {
    pub passed: usize,
    pub failed: Vec<Name>,
}

impl ZoneValidator {
    pub fn new(checker: impl SyntaxChecker + 'static) -> Self {
        Self {
            checker: Box::new(checker),
        }
    }

    /// Checks a single zone file.
    pub fn verify(&self, origin: &Name, path: &Path) -> bool {
        let passed = self.checker.check(origin, path);
        if !passed {
            error!("Validation failed: {} for {}.", path.display(), origin);
        }
        passed
    }

    /// Checks every zone file in `zones`. All zones are checked, even
    /// after a failure.
    pub fn verify_all<'a, I, P>(&self, zones: I) -> ValidationReport
    where
        I: IntoIterator<Item = (&'a Name, P)>,
        P: AsRef<Path>,
    {
        let mut report = ValidationReport::default();
        for (origin, path) in zones {
            if self.verify(origin, path.as_ref()) {
                report.passed += 1;
            } else {
                report.failed.push(origin.clone());
            }
        }
        info!(
            "Zone validation: {} ok, {} not ok.",
            report.passed,
            report.failed.len()
        );
        report
    }
}

impl Default for ZoneValidator {
    fn default() -> Self {
        Self::new(NamedCheckzone::default())
    }
}

impl ValidationReport {
    /// Returns whether every zone passed.
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// Converts the report into an error if any zone failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::ZoneValidationFailed(self.failed))
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;

    fn names(texts: &[&str]) -> Vec<Name> {
        texts.iter().map(|t| t.parse().unwrap()).collect()
    }

    #[test]
    fn last_line_must_be_ok() {
        assert!(last_line_is_ok("zone example.org/IN: loaded serial 1\nOK\n"));
        assert!(!last_line_is_ok("OK\nzone example.org/IN: has 0 SOA records\n"));
        assert!(!last_line_is_ok("NOT OK\n"));
        assert!(!last_line_is_ok(""));
    }

    #[test]
    fn verify_all_checks_every_zone() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_by_checker = seen.clone();
        let validator = ZoneValidator::new(move |origin: &Name, _: &Path| {
            seen_by_checker.borrow_mut().push(origin.clone());
            origin.to_string() != "b.example."
        });
        let origins = names(&["a.example.", "b.example.", "c.example."]);
        let report = validator.verify_all(
            origins
                .iter()
                .map(|origin| (origin, PathBuf::from(origin.to_string()))),
        );
        assert_eq!(*seen.borrow(), origins);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, names(&["b.example."]));
        assert!(matches!(
            report.into_result(),
            Err(Error::ZoneValidationFailed(failed)) if failed == names(&["b.example."])
        ));
    }

    #[test]
    fn missing_checker_program_fails_validation() {
        let checker = NamedCheckzone::new("/nonexistent/named-checkzone");
        assert!(!checker.check(&"example.org.".parse().unwrap(), Path::new("zone")));
        let report = ValidationReport {
            passed: 3,
            failed: Vec::new(),
        };
        assert!(report.into_result().is_ok());
    }
}
