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

//! Weighted clause sets whose optimum is an inconsistency-minimal model.
//!
//! Both strategies share the atom indicators, the per-formula inconsistency
//! indicators, and the glut rescue of clauses. They differ only in how a
//! formula becomes clauses, and are deliberately kept as separate code paths
//! so that they can be cross-checked against each other.

use std::fmt;

use indexmap::IndexSet;
use paraglut_formula::{KnowledgeBase, TruthValue};
use tracing::{debug, debug_span, info, trace};

use crate::{
    naive,
    tseitin::{TseitinCnf, TseitinCnfTransform},
    AtomTable, Clause, Ident, IdentifierAllocator, Result, ThreeValuedAtomEncoder,
};

/// How formulas are turned into clauses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ClauseStrategy {
    /// Syntactic rewriting into CNF with no auxiliary variables.
    Naive,

    /// One auxiliary variable per sub-formula.
    Tseitin,
}

/// Hard clauses plus weighted soft clauses over variables `1..=n_vars`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeightedClauseSet {
    pub hard: Vec<Clause>,
    pub soft: Vec<(Clause, u64)>,
    pub n_vars: u32,
}

impl WeightedClauseSet {
    pub fn add_hard(&mut self, clause: Clause) {
        trace!(?clause, "hard");
        self.hard.push(clause);
    }

    pub fn add_soft(&mut self, clause: Clause, weight: u64) {
        trace!(?clause, weight, "soft");
        self.soft.push((clause, weight));
    }

    /// A weight strictly greater than the cost of violating every soft clause.
    pub fn top_weight(&self) -> u64 {
        self.soft.iter().map(|(_, weight)| weight).sum::<u64>() + 1
    }

    /// The total weight of the soft clauses that `value_of` falsifies.
    pub fn cost(&self, value_of: impl Fn(Ident) -> bool) -> u64 {
        self.soft
            .iter()
            .filter(|(clause, _)| {
                !clause
                    .iter()
                    .any(|lit| value_of(lit.unsigned_abs()) == (*lit > 0))
            })
            .map(|(_, weight)| weight)
            .sum()
    }

    /// Renders this clause set in the DIMACS WCNF format.
    pub fn to_wcnf(&self) -> String {
        let top = self.top_weight();
        let mut out = format!(
            "p wcnf {} {} {}\n",
            self.n_vars,
            self.hard.len() + self.soft.len(),
            top
        );

        let hard = self.hard.iter().map(|clause| (clause, top));
        let soft = self.soft.iter().map(|(clause, weight)| (clause, *weight));
        for (clause, weight) in hard.chain(soft) {
            out.push_str(&weight.to_string());
            for lit in clause.iter() {
                out.push(' ');
                out.push_str(&lit.to_string());
            }
            out.push_str(" 0\n");
        }

        out
    }

    pub fn stats(&self) -> EncodingStats {
        EncodingStats {
            vars: self.n_vars as usize,
            hard: self.hard.len(),
            soft: self.soft.len(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodingStats {
    pub vars: usize,
    pub hard: usize,
    pub soft: usize,
}

impl fmt::Display for EncodingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} hard clauses, {} soft clauses",
            self.vars, self.hard, self.soft
        )
    }
}

/// A complete MaxSAT encoding of one knowledge base.
#[derive(Clone, Debug)]
pub struct MaxSatEncoding {
    pub strategy: ClauseStrategy,
    pub clauses: WeightedClauseSet,
    pub atoms: AtomTable,

    /// The inconsistency indicator of each formula, indexed by formula id.
    pub inconsistency: Vec<Ident>,
}

/// Encodes a knowledge base into a [MaxSatEncoding].
///
/// Every call owns a fresh [IdentifierAllocator], so encoding the same
/// knowledge base twice yields identical clause sets.
pub struct MaxSatEncoder<'kb> {
    kb: &'kb KnowledgeBase,
    strategy: ClauseStrategy,
}

impl<'kb> MaxSatEncoder<'kb> {
    pub fn new(kb: &'kb KnowledgeBase, strategy: ClauseStrategy) -> Self {
        Self { kb, strategy }
    }

    pub fn encode(&self) -> Result<MaxSatEncoding> {
        let _span = debug_span!("encode", strategy = %self.strategy).entered();

        let mut alloc = IdentifierAllocator::new();
        let mut hard = Vec::new();
        let atoms = ThreeValuedAtomEncoder::new(&mut alloc).encode(self.kb.atoms(), &mut hard);
        let inconsistency: Vec<Ident> = self.kb.iter().map(|_| alloc.fresh()).collect();

        let mut clauses = WeightedClauseSet::default();
        for clause in hard {
            clauses.add_hard(clause);
        }

        match self.strategy {
            ClauseStrategy::Naive => self.encode_naive(&atoms, &inconsistency, &mut clauses)?,
            ClauseStrategy::Tseitin => {
                self.encode_tseitin(&mut alloc, &atoms, &inconsistency, &mut clauses)?
            }
        }

        clauses.n_vars = alloc.len();

        info!(atoms = atoms.len(), "encoded {}", clauses.stats());

        Ok(MaxSatEncoding {
            strategy: self.strategy,
            clauses,
            atoms,
            inconsistency,
        })
    }

    fn encode_naive(
        &self,
        atoms: &AtomTable,
        inconsistency: &[Ident],
        out: &mut WeightedClauseSet,
    ) -> Result<()> {
        for (id, (formula, &finc)) in self.kb.iter().zip(inconsistency).enumerate() {
            flag_gluts(formula.atoms(), finc, atoms, out)?;

            let cnf = naive::transform(formula)?;
            debug!(id, clauses = cnf.len(), "naive CNF");

            for clause in cnf {
                let mut lits = Vec::with_capacity(clause.len() * 2);
                let mut rescue = IndexSet::new();
                for signed in clause.iter() {
                    let vars = atoms.require(&signed.atom)?;
                    lits.push(vars.classical(signed.positive));
                    rescue.insert(vars.b as i32);
                }

                lits.extend(rescue);
                out.add_hard(lits);
            }

            out.add_soft(vec![-(finc as i32)], 1);
        }

        Ok(())
    }

    fn encode_tseitin(
        &self,
        alloc: &mut IdentifierAllocator,
        atoms: &AtomTable,
        inconsistency: &[Ident],
        out: &mut WeightedClauseSet,
    ) -> Result<()> {
        let truth = atoms.truth_map();
        let mut transform = TseitinCnfTransform::new(alloc, &truth);

        for (id, (formula, &finc)) in self.kb.iter().zip(inconsistency).enumerate() {
            flag_gluts(formula.atoms(), finc, atoms, out)?;

            let TseitinCnf { top, clauses } = transform.transform(formula)?;
            debug!(id, top, clauses = clauses.len(), "Tseitin CNF");

            out.add_hard(rescue_atom_literals(&[top], atoms));
            for clause in clauses.iter() {
                out.add_hard(rescue_atom_literals(clause, atoms));
            }

            out.add_soft(vec![-(finc as i32)], 1);
        }

        Ok(())
    }
}

/// Forces a formula's inconsistency indicator whenever one of its atoms is a
/// glut.
fn flag_gluts<'a>(
    formula_atoms: impl IntoIterator<Item = &'a str>,
    finc: Ident,
    atoms: &AtomTable,
    out: &mut WeightedClauseSet,
) -> Result<()> {
    for atom in formula_atoms {
        let vars = atoms.require(atom)?;
        out.add_hard(vec![finc as i32, -(vars.b as i32)]);
    }

    Ok(())
}

/// Maps the truth-variable literals of a gate clause onto atom indicators and
/// appends the glut indicator of every atom so named.
///
/// Literals over auxiliary variables pass through unchanged, so a clause
/// naming no atom directly gains no glut indicators.
fn rescue_atom_literals(clause: &[i32], atoms: &AtomTable) -> Clause {
    let mut lits = Vec::with_capacity(clause.len() * 2);
    let mut rescue = IndexSet::new();
    for &lit in clause {
        match atoms.lookup(lit.unsigned_abs()) {
            Some((atom, TruthValue::True)) => {
                if let Some(vars) = atoms.get(atom) {
                    lits.push(vars.classical(lit > 0));
                    rescue.insert(vars.b as i32);
                }
            }
            _ => lits.push(lit),
        }
    }

    lits.extend(rescue);
    lits
}
