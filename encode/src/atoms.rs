// Copyright (C) 2025 Marceline Cramer
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Paraglut is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option) any
// later version.
//
// Paraglut is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for
// more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Paraglut. If not, see <https://www.gnu.org/licenses/>.

use std::collections::HashMap;

use indexmap::IndexMap;
use paraglut_formula::TruthValue;
use tracing::trace;

use crate::{literal, Clause, EncodeError, Ident, IdentifierAllocator, Result};

/// The three indicator variables of one atom.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtomIndicators {
    pub t: Ident,
    pub f: Ident,
    pub b: Ident,
}

impl AtomIndicators {
    pub fn get(&self, value: TruthValue) -> Ident {
        match value {
            TruthValue::True => self.t,
            TruthValue::False => self.f,
            TruthValue::Both => self.b,
        }
    }

    /// The indicator satisfying a classical literal over this atom.
    ///
    /// A positive occurrence is satisfied by `t` and a negative one by `f`.
    /// Both are encoded as positive literals.
    pub fn classical(&self, positive: bool) -> i32 {
        literal(if positive { self.t } else { self.f }, true)
    }

    /// Clauses forcing exactly one indicator to hold.
    pub fn exactly_one(&self) -> [Clause; 4] {
        let (t, f, b) = (self.t as i32, self.f as i32, self.b as i32);
        [vec![t, f, b], vec![-t, -f], vec![-t, -b], vec![-f, -b]]
    }
}

/// Bidirectional map between atoms and their indicator variables.
#[derive(Clone, Debug, Default)]
pub struct AtomTable {
    atoms: IndexMap<String, AtomIndicators>,
    inverse: HashMap<Ident, (usize, TruthValue)>,
}

impl AtomTable {
    pub fn get(&self, atom: &str) -> Option<&AtomIndicators> {
        self.atoms.get(atom)
    }

    /// Like [AtomTable::get] but fails loudly on atoms that were never encoded.
    pub fn require(&self, atom: &str) -> Result<&AtomIndicators> {
        self.get(atom)
            .ok_or_else(|| EncodeError::UnknownAtom(atom.to_string()))
    }

    /// Finds the atom and truth value an indicator variable stands for.
    pub fn lookup(&self, ident: Ident) -> Option<(&str, TruthValue)> {
        let (idx, value) = self.inverse.get(&ident)?;
        let (atom, _) = self.atoms.get_index(*idx)?;
        Some((atom.as_str(), *value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AtomIndicators)> {
        self.atoms.iter().map(|(atom, vars)| (atom.as_str(), vars))
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Maps every atom to its `t` indicator.
    pub fn truth_map(&self) -> IndexMap<String, Ident> {
        self.atoms
            .iter()
            .map(|(atom, vars)| (atom.clone(), vars.t))
            .collect()
    }
}

/// Allocates indicator triples for atoms and constrains them.
pub struct ThreeValuedAtomEncoder<'a> {
    alloc: &'a mut IdentifierAllocator,
}

impl<'a> ThreeValuedAtomEncoder<'a> {
    pub fn new(alloc: &'a mut IdentifierAllocator) -> Self {
        Self { alloc }
    }

    /// Encodes each distinct atom once, in iteration order, pushing the
    /// exactly-one constraints to `hard`.
    pub fn encode<'s>(
        self,
        atoms: impl IntoIterator<Item = &'s str>,
        hard: &mut Vec<Clause>,
    ) -> AtomTable {
        let mut table = IndexMap::new();
        for atom in atoms {
            if table.contains_key(atom) {
                continue;
            }

            let vars = AtomIndicators {
                t: self.alloc.fresh(),
                f: self.alloc.fresh(),
                b: self.alloc.fresh(),
            };

            trace!(atom, ?vars, "allocated atom indicators");
            hard.extend(vars.exactly_one());
            table.insert(atom.to_string(), vars);
        }

        let mut inverse = HashMap::with_capacity(table.len() * 3);
        for (idx, vars) in table.values().enumerate() {
            for value in TruthValue::ALL {
                inverse.insert(vars.get(value), (idx, value));
            }
        }

        AtomTable {
            atoms: table,
            inverse,
        }
    }
}
