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

//! Conjunctive normal form by syntactic rewriting.
//!
//! No auxiliary variables are introduced, so the output may grow
//! exponentially in the size of the input. This is the baseline that the
//! Tseitin transformation is measured against.

use paraglut_formula::{Connective, Formula};

use crate::{EncodeError, Result};

/// A reference to an atom with a polarity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedAtom {
    pub atom: String,
    pub positive: bool,
}

impl SignedAtom {
    pub fn new(atom: impl ToString, positive: bool) -> Self {
        Self {
            atom: atom.to_string(),
            positive,
        }
    }
}

/// A disjunction of signed atoms.
pub type NaiveClause = Vec<SignedAtom>;

/// Rewrites a formula into CNF and flattens it into clauses.
pub fn transform(formula: &Formula) -> Result<Vec<NaiveClause>> {
    clauses(&to_cnf(formula))
}

/// Rewrites a formula into a conjunction of disjunctions of literals.
pub fn to_cnf(formula: &Formula) -> Formula {
    let formula = eliminate_iff(formula);
    let formula = eliminate_implies(&formula);
    let formula = push_negations(&formula);
    distribute_or(&formula)
}

/// Replaces `a <=> b` with `(a => b) && (b => a)`.
pub fn eliminate_iff(formula: &Formula) -> Formula {
    use Formula::*;
    match formula {
        Atom(_) | True | False => formula.clone(),
        Not(inner) => Formula::not(eliminate_iff(inner)),
        Binary {
            op: Connective::Iff,
            lhs,
            rhs,
        } => {
            let lhs = eliminate_iff(lhs);
            let rhs = eliminate_iff(rhs);
            Formula::and(
                Formula::implies(lhs.clone(), rhs.clone()),
                Formula::implies(rhs, lhs),
            )
        }
        Binary { op, lhs, rhs } => Formula::binary(*op, eliminate_iff(lhs), eliminate_iff(rhs)),
    }
}

/// Replaces `a => b` with `!a || b`.
pub fn eliminate_implies(formula: &Formula) -> Formula {
    use Formula::*;
    match formula {
        Atom(_) | True | False => formula.clone(),
        Not(inner) => Formula::not(eliminate_implies(inner)),
        Binary {
            op: Connective::Implies,
            lhs,
            rhs,
        } => Formula::or(
            Formula::not(eliminate_implies(lhs)),
            eliminate_implies(rhs),
        ),
        Binary { op, lhs, rhs } => {
            Formula::binary(*op, eliminate_implies(lhs), eliminate_implies(rhs))
        }
    }
}

/// Pushes negations down to the atoms with De Morgan's laws.
///
/// Double negations cancel and negated constants are folded. Implications
/// and equivalences that survived the earlier passes are eliminated on the way.
pub fn push_negations(formula: &Formula) -> Formula {
    use Formula::*;
    match formula {
        Atom(_) | True | False => formula.clone(),
        Not(inner) => match inner.as_ref() {
            Atom(_) => formula.clone(),
            True => False,
            False => True,
            Not(inner) => push_negations(inner),
            Binary {
                op: Connective::And,
                lhs,
                rhs,
            } => Formula::or(
                push_negations(&Formula::not(lhs.as_ref().clone())),
                push_negations(&Formula::not(rhs.as_ref().clone())),
            ),
            Binary {
                op: Connective::Or,
                lhs,
                rhs,
            } => Formula::and(
                push_negations(&Formula::not(lhs.as_ref().clone())),
                push_negations(&Formula::not(rhs.as_ref().clone())),
            ),
            Binary { .. } => push_negations(&Formula::not(eliminate_implies(&eliminate_iff(
                inner,
            )))),
        },
        Binary {
            op: op @ (Connective::And | Connective::Or),
            lhs,
            rhs,
        } => Formula::binary(*op, push_negations(lhs), push_negations(rhs)),
        Binary { .. } => push_negations(&eliminate_implies(&eliminate_iff(formula))),
    }
}

/// Distributes disjunctions over conjunctions until no conjunction remains
/// below a disjunction.
pub fn distribute_or(formula: &Formula) -> Formula {
    use Formula::*;
    match formula {
        Binary {
            op: Connective::Or,
            lhs,
            rhs,
        } => {
            let lhs = distribute_or(lhs);
            let rhs = distribute_or(rhs);
            match (lhs, rhs) {
                (
                    Binary {
                        op: Connective::And,
                        lhs: left,
                        rhs: right,
                    },
                    rhs,
                ) => Formula::and(
                    distribute_or(&Formula::or(*left, rhs.clone())),
                    distribute_or(&Formula::or(*right, rhs)),
                ),
                (
                    lhs,
                    Binary {
                        op: Connective::And,
                        lhs: left,
                        rhs: right,
                    },
                ) => Formula::and(
                    distribute_or(&Formula::or(lhs.clone(), *left)),
                    distribute_or(&Formula::or(lhs, *right)),
                ),
                (lhs, rhs) => Formula::or(lhs, rhs),
            }
        }
        Binary {
            op: Connective::And,
            lhs,
            rhs,
        } => Formula::and(distribute_or(lhs), distribute_or(rhs)),
        _ => formula.clone(),
    }
}

/// Flattens a formula in CNF into its clauses.
///
/// Clauses containing the constant true are dropped and the constant false is
/// removed from the clauses that contain it, so a formula equivalent to false
/// yields an empty clause.
pub fn clauses(cnf: &Formula) -> Result<Vec<NaiveClause>> {
    let mut clauses = Vec::new();
    collect_clauses(cnf, &mut clauses)?;
    Ok(clauses)
}

fn collect_clauses(formula: &Formula, clauses: &mut Vec<NaiveClause>) -> Result<()> {
    if let Formula::Binary {
        op: Connective::And,
        lhs,
        rhs,
    } = formula
    {
        collect_clauses(lhs, clauses)?;
        return collect_clauses(rhs, clauses);
    }

    let mut clause = Vec::new();
    if collect_literals(formula, &mut clause)? {
        clauses.push(clause);
    }

    Ok(())
}

/// Returns false if the clause is trivially satisfied.
fn collect_literals(formula: &Formula, clause: &mut NaiveClause) -> Result<bool> {
    use Formula::*;
    match formula {
        Atom(atom) => clause.push(SignedAtom::new(atom, true)),
        Not(inner) => match inner.as_ref() {
            Atom(atom) => clause.push(SignedAtom::new(atom, false)),
            _ => return malformed(formula),
        },
        True => return Ok(false),
        False => {}
        Binary {
            op: Connective::Or,
            lhs,
            rhs,
        } => {
            let lhs = collect_literals(lhs, clause)?;
            let rhs = collect_literals(rhs, clause)?;
            return Ok(lhs && rhs);
        }
        Binary { .. } => return malformed(formula),
    }

    Ok(true)
}

fn malformed<T>(formula: &Formula) -> Result<T> {
    Err(EncodeError::MalformedClause {
        formula: formula.to_string(),
    })
}
