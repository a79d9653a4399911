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

//! Implementation of the [`Catalog`] structure.

use std::collections::HashMap;

use crate::name::{Label, Name};

/// A DNS tree that places values (in practice, zone IDs) at nodes
/// according to their names.
///
/// This makes it simple to look up the value at the nearest ancestor
/// of any domain name (see [`Catalog::lookup`]), which is how a record
/// is matched to the most specific zone that can hold it.
#[derive(Debug)]
pub struct Catalog<T> {
    root: Node<T>,
}

/// A node in the catalog's DNS tree.
#[derive(Debug)]
struct Node<T> {
    children: HashMap<Label, Node<T>>,
    data: Option<T>,
}

impl<T> Catalog<T> {
    /// Creates a new, initially empty `Catalog`.
    pub fn new() -> Self {
        Self {
            root: Node::new(),
        }
    }

    /// Places `value` at `name`, replacing and returning the value that
    /// was there before (if any).
    pub fn replace(&mut self, name: &Name, value: T) -> Option<T> {
        self.root
            .get_or_create_descendant(name, name.len())
            .data
            .replace(value)
    }

    /// Looks up the value in the `Catalog` at the nearest ancestor of
    /// `name` (i.e., at the name matching the most consecutive labels
    /// in `name`, starting from the right). A value at `name` itself
    /// counts as a match.
    pub fn lookup(&self, name: &Name) -> Option<&T> {
        lookup_from(&self.root, name, name.len())
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            data: None,
        }
    }

    /// Gets or creates a descendant node corresponding to `name`. Any
    /// nodes between the target descendant node and `self` will also be
    /// created. `level` should be set so that `self` corresponds to the
    /// superdomain of `name` with `level` labels removed.
    fn get_or_create_descendant(&mut self, name: &Name, level: usize) -> &mut Self {
        if level == 0 {
            self
        } else {
            self.children
                .entry(name[level - 1].clone())
                .or_insert_with(Self::new)
                .get_or_create_descendant(name, level - 1)
        }
    }
}

/// Implements catalog lookup. The parameter `node` is the deepest node
/// we have matched so far, `level` labels short of `name`.
fn lookup_from<'a, T>(node: &'a Node<T>, name: &Name, level: usize) -> Option<&'a T> {
    if level == 0 {
        // We've matched the entire name.
        node.data.as_ref()
    } else {
        // Try to traverse down the tree. If we can match more labels,
        // then we see if there's a longer match.
        let longer_match = node
            .children
            .get(&name[level - 1])
            .and_then(|subnode| lookup_from(subnode, name, level - 1));
        longer_match.or(node.data.as_ref())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_works() {
        let test: Name = "test.".parse().unwrap();
        let zonegen_test: Name = "zonegen.test.".parse().unwrap();
        let x_zonegen_test: Name = "x.zonegen.test.".parse().unwrap();
        let y_x_zonegen_test: Name = "y.X.zonegen.test.".parse().unwrap();

        let mut catalog = Catalog::new();
        catalog.replace(&test, 1);
        catalog.replace(&x_zonegen_test, 2);

        assert!(catalog.lookup(&Name::root()).is_none());
        assert_eq!(catalog.lookup(&test), Some(&1));
        assert_eq!(catalog.lookup(&zonegen_test), Some(&1));
        assert_eq!(catalog.lookup(&x_zonegen_test), Some(&2));
        assert_eq!(catalog.lookup(&y_x_zonegen_test), Some(&2));
    }

    #[test]
    fn replace_returns_previous_value() {
        let name: Name = "zonegen.test.".parse().unwrap();
        let mut catalog = Catalog::new();
        assert_eq!(catalog.replace(&name, 1), None);
        assert_eq!(catalog.replace(&name, 2), Some(1));
        assert_eq!(catalog.lookup(&name), Some(&2));
    }
}
