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

use paraglut_encode::WeightedClauseSet;
use rustsat::{
    encodings::card::{totalizer::Totalizer, BoundBoth},
    instances::ManageVars,
    solvers::{Solve, SolverResult},
    types::{constraints::CardConstraint, Clause, Lit, Var},
};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

pub type Oracle = rustsat_batsat::BasicSolver;

/// An optimum of a weighted clause set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxSatOutcome {
    /// The total weight of the falsified soft clauses.
    pub cost: u64,

    /// The value of every variable of the clause set as a signed literal,
    /// with variable `i` at index `i - 1`.
    pub assignment: Vec<i32>,
}

impl MaxSatOutcome {
    /// Every literal of the assignment that is positive.
    pub fn positive(&self) -> impl Iterator<Item = u32> + '_ {
        self.assignment
            .iter()
            .filter(|lit| **lit > 0)
            .map(|lit| lit.unsigned_abs())
    }

    pub fn value(&self, ident: u32) -> bool {
        ident
            .checked_sub(1)
            .and_then(|idx| self.assignment.get(idx as usize))
            .is_some_and(|lit| *lit > 0)
    }
}

/// An optimizer for weighted clause sets.
pub trait MaxSatEngine {
    /// Finds an assignment satisfying every hard clause with minimal soft
    /// cost.
    fn solve(&mut self, clauses: &WeightedClauseSet) -> Result<MaxSatOutcome>;
}

/// A linear SAT-UNSAT search over a batsat oracle.
///
/// Soft clauses are relaxed with fresh variables, one per unit of weight, and
/// every improving step re-solves with a totalizer bounding the number of
/// true relaxation variables below the best cost so far.
#[derive(Debug, Default)]
pub struct BatsatEngine {
    /// The number of SAT calls made by the last solve.
    pub calls: usize,
}

impl BatsatEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solves once, optionally bounding the number of true relaxation
    /// variables, and returns the encoding variables' values if satisfiable.
    fn check(
        &mut self,
        clauses: &WeightedClauseSet,
        bound: Option<usize>,
    ) -> Result<Option<Vec<i32>>> {
        self.calls += 1;

        let mut oracle = Oracle::default();
        let mut vars = VariablePool::starting_after(clauses.n_vars);

        for clause in clauses.hard.iter() {
            oracle
                .add_clause(to_clause(clause))
                .map_err(|err| Error::SolverFailure(err.to_string()))?;
        }

        let mut relax = Vec::new();
        for (clause, weight) in clauses.soft.iter() {
            for _ in 0..*weight {
                let r = vars.new_var().pos_lit();
                let mut cl = to_clause(clause);
                cl.add(r);
                oracle
                    .add_clause(cl)
                    .map_err(|err| Error::SolverFailure(err.to_string()))?;
                relax.push(r);
            }
        }

        if let Some(bound) = bound {
            trace!(bound, relaxed = relax.len(), "bounding cost");
            let constr = CardConstraint::new_ub(relax, bound);
            Totalizer::encode_constr(constr, &mut oracle, &mut vars)
                .map_err(|err| Error::SolverFailure(format!("{err:?}")))?;
        }

        let result = oracle
            .solve()
            .map_err(|err| Error::SolverFailure(err.to_string()))?;

        match result {
            SolverResult::Sat => {}
            SolverResult::Unsat => return Ok(None),
            SolverResult::Interrupted => {
                return Err(Error::SolverFailure("SAT oracle was interrupted".to_string()))
            }
        }

        let mut assignment = Vec::with_capacity(clauses.n_vars as usize);
        for ident in 1..=clauses.n_vars {
            let value = oracle
                .var_val(Var::new(ident - 1))
                .map_err(|err| Error::SolverFailure(err.to_string()))?
                .to_bool_with_def(false);

            assignment.push(if value { ident as i32 } else { -(ident as i32) });
        }

        Ok(Some(assignment))
    }
}

impl MaxSatEngine for BatsatEngine {
    fn solve(&mut self, clauses: &WeightedClauseSet) -> Result<MaxSatOutcome> {
        self.calls = 0;

        if clauses.hard.iter().any(Vec::is_empty) {
            return Err(Error::SolverFailure(
                "hard clauses contain the empty clause".to_string(),
            ));
        }

        let Some(mut assignment) = self.check(clauses, None)? else {
            return Err(Error::SolverFailure(
                "hard clauses are unsatisfiable".to_string(),
            ));
        };

        let mut cost = cost_of(clauses, &assignment);
        debug!(cost, "initial model");

        while cost > 0 {
            let bound = usize::try_from(cost - 1)
                .map_err(|err| Error::SolverFailure(err.to_string()))?;

            match self.check(clauses, Some(bound))? {
                Some(better) => {
                    let better_cost = cost_of(clauses, &better);
                    if better_cost >= cost {
                        warn!(cost, better_cost, "bounded model did not improve");
                        break;
                    }

                    debug!(cost = better_cost, "improved model");
                    assignment = better;
                    cost = better_cost;
                }
                None => break,
            }
        }

        debug!(cost, calls = self.calls, "optimum found");
        Ok(MaxSatOutcome { cost, assignment })
    }
}

fn cost_of(clauses: &WeightedClauseSet, assignment: &[i32]) -> u64 {
    clauses.cost(|ident| {
        ident
            .checked_sub(1)
            .and_then(|idx| assignment.get(idx as usize))
            .is_some_and(|lit| *lit > 0)
    })
}

fn to_lit(lit: i32) -> Lit {
    let var = Var::new(lit.unsigned_abs() - 1);
    if lit > 0 {
        var.pos_lit()
    } else {
        var.neg_lit()
    }
}

fn to_clause(clause: &[i32]) -> Clause {
    clause.iter().copied().map(to_lit).collect()
}

/// Allocator for relaxation and totalizer variables above the encoding's own.
#[derive(Debug, Default)]
pub struct VariablePool {
    next_var: u32,
    used_num: u32,
}

impl VariablePool {
    /// Creates a pool whose first variable follows `n_vars` encoding variables.
    pub fn starting_after(n_vars: u32) -> Self {
        Self {
            next_var: n_vars,
            used_num: n_vars,
        }
    }
}

impl ManageVars for VariablePool {
    fn new_var(&mut self) -> Var {
        let var = Var::new(self.next_var);
        self.next_var += 1;
        self.used_num += 1;
        var
    }

    fn max_var(&self) -> Option<Var> {
        self.next_var.checked_sub(1).map(Var::new)
    }

    fn increase_next_free(&mut self, v: Var) -> bool {
        let idx = v.idx32();
        if idx > self.next_var {
            self.used_num += idx - self.next_var;
            self.next_var = idx;
            true
        } else {
            false
        }
    }

    fn combine(&mut self, other: Self) {
        self.next_var = self.next_var.max(other.next_var);
        self.used_num = self.next_var;
    }

    fn n_used(&self) -> u32 {
        self.used_num
    }

    fn forget_from(&mut self, min_var: Var) {
        self.next_var = self.next_var.min(min_var.idx32());
        self.used_num = self.used_num.min(self.next_var);
    }
}
