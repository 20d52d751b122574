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

//! Compiles knowledge bases of propositional formulas into the inputs of
//! external optimizers: weighted clause sets for MaxSAT engines and logic
//! programs for answer-set solvers.

pub mod alloc;
pub mod asp;
pub mod atoms;
pub mod maxsat;
pub mod naive;
pub mod tseitin;

pub use alloc::{Ident, IdentifierAllocator};
pub use asp::{AspEncoder, LogicProgram};
pub use atoms::{AtomIndicators, AtomTable, ThreeValuedAtomEncoder};
pub use maxsat::{ClauseStrategy, EncodingStats, MaxSatEncoder, MaxSatEncoding, WeightedClauseSet};

/// A clause of signed DIMACS-style literals.
pub type Clause = Vec<i32>;

pub type Result<T> = std::result::Result<T, EncodeError>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("cannot Tseitin-transform atom {atom:?} without an entry in the shared atom map")]
    UnsupportedTransform { atom: String },

    #[error("{formula} is not a disjunction of literals")]
    MalformedClause { formula: String },

    #[error("atom {0:?} has no truth indicators")]
    UnknownAtom(String),
}

/// Returns the literal of `ident` with the given polarity.
pub fn literal(ident: Ident, positive: bool) -> i32 {
    let lit = ident as i32;
    if positive {
        lit
    } else {
        -lit
    }
}
