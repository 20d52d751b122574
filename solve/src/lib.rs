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

//! Runs encodings through optimizers and maps their answers back onto the
//! knowledge base.

use std::fmt;

use paraglut_encode::{AspEncoder, ClauseStrategy, EncodeError, MaxSatEncoder};
use paraglut_formula::{KnowledgeBase, TruthValue};
use serde::Serialize;
use tracing::debug_span;

pub mod clingo;
pub mod interpret;
pub mod maxsat;

#[cfg(test)]
pub mod tests;

pub use clingo::{AspEngine, AspOutcome, ClingoProcess, Symbol};
pub use maxsat::{BatsatEngine, MaxSatEngine, MaxSatOutcome};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("solver failure: {0}")]
    SolverFailure(String),

    #[error("atom {atom:?} has {} truth values in the model: {values:?}", .values.len())]
    EncodingInvariantViolation {
        atom: String,
        values: Vec<TruthValue>,
    },

    #[error("solver output names unknown {0}")]
    UnknownSymbol(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Which encoding and engine pair computes a [Solution].
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    Naive,
    Tseitin,
    Asp,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Naive, Strategy::Tseitin, Strategy::Asp];

    /// The clause strategy of a MaxSAT-based strategy.
    pub fn clause_strategy(&self) -> Option<ClauseStrategy> {
        match self {
            Strategy::Naive => Some(ClauseStrategy::Naive),
            Strategy::Tseitin => Some(ClauseStrategy::Tseitin),
            Strategy::Asp => None,
        }
    }
}

impl From<ClauseStrategy> for Strategy {
    fn from(strategy: ClauseStrategy) -> Self {
        match strategy {
            ClauseStrategy::Naive => Strategy::Naive,
            ClauseStrategy::Tseitin => Strategy::Tseitin,
        }
    }
}

/// The value of one atom in a solution.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct AtomValue {
    pub atom: String,
    pub value: TruthValue,
}

impl fmt::Display for AtomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.atom, self.value)
    }
}

/// An inconsistency-minimal model of a knowledge base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub strategy: Strategy,

    /// The number of inconsistent formulas.
    pub cost: u64,

    /// The ids of the inconsistent formulas, in ascending order.
    pub inconsistent: Vec<usize>,

    /// The value of every atom, ordered by atom name.
    pub valuation: Vec<AtomValue>,
}

impl Solution {
    pub fn value_of(&self, atom: &str) -> Option<TruthValue> {
        self.valuation
            .iter()
            .find(|entry| entry.atom == atom)
            .map(|entry| entry.value)
    }

    /// The atoms valued `both`.
    pub fn both_atoms(&self) -> impl Iterator<Item = &str> {
        self.valuation
            .iter()
            .filter(|entry| entry.value == TruthValue::Both)
            .map(|entry| entry.atom.as_str())
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inconsistent: Vec<_> = self.inconsistent.iter().map(|id| format!("F{id}")).collect();
        let atoms: Vec<_> = self.valuation.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} IFC: {}, InconsistentFormulas: [{}], Atoms: [{}]",
            self.strategy,
            self.cost,
            inconsistent.join(", "),
            atoms.join(", ")
        )
    }
}

/// Encodes a knowledge base with a clause strategy and solves it.
pub fn solve_maxsat(
    kb: &KnowledgeBase,
    strategy: ClauseStrategy,
    engine: &mut impl MaxSatEngine,
) -> Result<Solution> {
    let _span = debug_span!("solve_maxsat", %strategy).entered();
    let encoding = MaxSatEncoder::new(kb, strategy).encode()?;
    let outcome = engine.solve(&encoding.clauses)?;
    interpret::interpret_maxsat(&encoding, &outcome)
}

/// Encodes a knowledge base into a logic program and solves it.
pub fn solve_asp(kb: &KnowledgeBase, engine: &mut impl AspEngine) -> Result<Solution> {
    let _span = debug_span!("solve_asp").entered();
    let program = AspEncoder::new(kb).encode();
    let outcome = engine.solve(&program)?;
    interpret::interpret_asp(kb, &outcome)
}
