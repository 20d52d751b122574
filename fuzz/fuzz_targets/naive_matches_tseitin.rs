// Copyright (C) 2025-2026 Marceline Cramer
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

#![no_main]

use libfuzzer_sys::fuzz_target;
use paraglut_encode::ClauseStrategy;
use paraglut_formula::{Formula, KnowledgeBase};
use paraglut_solve::{solve_maxsat, BatsatEngine};

fuzz_target!(|formulas: Vec<Formula>| {
    let kb = KnowledgeBase::new(formulas);
    let oversized = |formula: &Formula| formula.size() > 32 || formula.depth() > 6;
    if kb.len() > 6 || kb.atoms().len() > 6 || kb.iter().any(oversized) {
        return;
    }

    let naive = solve_maxsat(&kb, ClauseStrategy::Naive, &mut BatsatEngine::new());
    let tseitin = solve_maxsat(&kb, ClauseStrategy::Tseitin, &mut BatsatEngine::new());

    match (naive, tseitin) {
        (Ok(naive), Ok(tseitin)) => {
            assert_eq!(naive.cost, tseitin.cost, "{kb}");
            assert_eq!(naive.inconsistent.len(), tseitin.inconsistent.len());
        }
        (Err(_), Err(_)) => {}
        (naive, tseitin) => panic!("strategies disagree on {kb}: {naive:?} vs {tseitin:?}"),
    }
});
