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

//! Structure-sharing CNF with one auxiliary variable per sub-formula.

use indexmap::IndexMap;
use paraglut_formula::{Connective, Formula};
use smallvec::{smallvec, SmallVec};

use crate::{EncodeError, Ident, IdentifierAllocator, Result};

/// A clause of a gate definition.
///
/// Four is the most literals any connective's definition needs.
pub type GateClause = SmallVec<[i32; 4]>;

/// The output of a Tseitin transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TseitinCnf {
    /// The literal standing for the whole formula.
    pub top: i32,

    /// The gate definitions of every non-atomic sub-formula.
    pub clauses: Vec<GateClause>,
}

/// Transforms formulas with an allocator and atom map shared between calls.
///
/// Atom leaves resolve directly to their truth variable in the atom map.
/// Every other node, including negated atoms and constants, gets a fresh
/// auxiliary variable, allocated after its children's.
pub struct TseitinCnfTransform<'a> {
    alloc: &'a mut IdentifierAllocator,
    atoms: &'a IndexMap<String, Ident>,
}

impl<'a> TseitinCnfTransform<'a> {
    pub fn new(alloc: &'a mut IdentifierAllocator, atoms: &'a IndexMap<String, Ident>) -> Self {
        Self { alloc, atoms }
    }

    pub fn transform(&mut self, formula: &Formula) -> Result<TseitinCnf> {
        let mut clauses = Vec::new();
        let top = self.define(formula, &mut clauses)?;
        Ok(TseitinCnf { top, clauses })
    }

    fn define(&mut self, formula: &Formula, clauses: &mut Vec<GateClause>) -> Result<i32> {
        use Formula::*;
        let gate = match formula {
            Atom(atom) => {
                return self.atoms.get(atom).map(|var| *var as i32).ok_or_else(|| {
                    EncodeError::UnsupportedTransform {
                        atom: atom.to_string(),
                    }
                });
            }
            True => Gate::Const(true),
            False => Gate::Const(false),
            Not(inner) => Gate::Not(self.define(inner, clauses)?),
            Binary { op, lhs, rhs } => {
                let lhs = self.define(lhs, clauses)?;
                let rhs = self.define(rhs, clauses)?;
                Gate::Binary(*op, lhs, rhs)
            }
        };

        let out = self.alloc.fresh() as i32;
        clauses.extend(gate.clauses(out));
        Ok(out)
    }
}

enum Gate {
    Const(bool),
    Not(i32),
    Binary(Connective, i32, i32),
}

impl Gate {
    /// The clauses defining `v <=> gate`.
    fn clauses(&self, v: i32) -> SmallVec<[GateClause; 4]> {
        match *self {
            Gate::Const(true) => smallvec![smallvec![v]],
            Gate::Const(false) => smallvec![smallvec![-v]],
            Gate::Not(a) => smallvec![smallvec![-v, -a], smallvec![v, a]],
            Gate::Binary(op, a, b) => match op {
                Connective::And => smallvec![
                    smallvec![-v, a],
                    smallvec![-v, b],
                    smallvec![v, -a, -b]
                ],
                Connective::Or => smallvec![
                    smallvec![v, -a],
                    smallvec![v, -b],
                    smallvec![-v, a, b]
                ],
                Connective::Implies => smallvec![
                    smallvec![-v, -a, b],
                    smallvec![v, a],
                    smallvec![v, -b]
                ],
                Connective::Iff => smallvec![
                    smallvec![-v, -a, b],
                    smallvec![-v, a, -b],
                    smallvec![v, a, b],
                    smallvec![v, -a, -b]
                ],
            },
        }
    }
}
