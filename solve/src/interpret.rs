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

//! Maps raw optimizer answers back onto atoms and formula ids.

use indexmap::IndexMap;
use paraglut_encode::MaxSatEncoding;
use paraglut_formula::{KnowledgeBase, TruthValue};
use tracing::{debug, trace};

use crate::{AspOutcome, AtomValue, Error, MaxSatOutcome, Result, Solution, Strategy, Symbol};

/// Interprets an optimal assignment of a MaxSAT encoding.
///
/// Every positive literal is looked up in the encoding's atom table. The
/// cost is recomputed from the soft clauses and must match the engine's.
pub fn interpret_maxsat(encoding: &MaxSatEncoding, outcome: &MaxSatOutcome) -> Result<Solution> {
    let mut values: IndexMap<&str, Vec<TruthValue>> = encoding
        .atoms
        .iter()
        .map(|(atom, _)| (atom, Vec::new()))
        .collect();

    for ident in outcome.positive() {
        if let Some((atom, value)) = encoding.atoms.lookup(ident) {
            if let Some(atom_values) = values.get_mut(atom) {
                atom_values.push(value);
            }
        }
    }

    let valuation = check_valuation(values)?;

    let inconsistent: Vec<usize> = encoding
        .inconsistency
        .iter()
        .enumerate()
        .filter(|(_, finc)| outcome.value(**finc))
        .map(|(id, _)| id)
        .collect();

    let cost = encoding.clauses.cost(|ident| outcome.value(ident));
    if cost != outcome.cost {
        return Err(Error::SolverFailure(format!(
            "engine reported cost {} but its model costs {cost}",
            outcome.cost
        )));
    }

    debug!(cost, ?inconsistent, "interpreted MaxSAT model");

    Ok(Solution {
        strategy: encoding.strategy.into(),
        cost,
        inconsistent,
        valuation,
    })
}

/// Interprets the shown atoms of an optimal answer set.
pub fn interpret_asp(kb: &KnowledgeBase, outcome: &AspOutcome) -> Result<Solution> {
    let mut values: IndexMap<&str, Vec<TruthValue>> = kb
        .atoms()
        .into_iter()
        .map(|atom| (atom, Vec::new()))
        .collect();

    let mut inconsistent = Vec::new();
    for symbol in outcome.symbols.iter() {
        let Symbol::Function { name, args } = symbol else {
            return Err(Error::UnknownSymbol(format!("symbol {symbol}")));
        };

        match (name.as_str(), args.as_slice()) {
            ("val", [Symbol::String(atom), Symbol::Function { name: value, args }])
                if args.is_empty() =>
            {
                let value: TruthValue = value
                    .parse()
                    .map_err(|_| Error::UnknownSymbol(format!("truth value {value:?}")))?;

                let atom_values = values
                    .get_mut(atom.as_str())
                    .ok_or_else(|| Error::UnknownSymbol(format!("atom {atom:?}")))?;

                atom_values.push(value);
            }
            ("f_inconsistent", [Symbol::Number(id)]) => {
                let id = usize::try_from(*id)
                    .ok()
                    .filter(|id| *id < kb.len())
                    .ok_or_else(|| Error::UnknownSymbol(format!("formula id {id}")))?;

                inconsistent.push(id);
            }
            _ => trace!(%symbol, "ignoring shown symbol"),
        }
    }

    let valuation = check_valuation(values)?;

    inconsistent.sort_unstable();
    inconsistent.dedup();

    let cost = inconsistent.len() as u64;
    if cost != outcome.cost {
        return Err(Error::SolverFailure(format!(
            "engine reported cost {} but {cost} formulas are inconsistent",
            outcome.cost
        )));
    }

    debug!(cost, ?inconsistent, "interpreted answer set");

    Ok(Solution {
        strategy: Strategy::Asp,
        cost,
        inconsistent,
        valuation,
    })
}

/// Checks that every atom has exactly one value and sorts by atom.
fn check_valuation(values: IndexMap<&str, Vec<TruthValue>>) -> Result<Vec<AtomValue>> {
    let mut valuation = Vec::with_capacity(values.len());
    for (atom, atom_values) in values {
        match atom_values.as_slice() {
            [value] => valuation.push(AtomValue {
                atom: atom.to_string(),
                value: *value,
            }),
            _ => {
                return Err(Error::EncodingInvariantViolation {
                    atom: atom.to_string(),
                    values: atom_values,
                })
            }
        }
    }

    valuation.sort();
    Ok(valuation)
}
