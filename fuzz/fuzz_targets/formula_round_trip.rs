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

use chumsky::Parser;
use libfuzzer_sys::fuzz_target;
use paraglut_formula::Formula;

fn valid_atoms(formula: &Formula) -> bool {
    formula.atoms().iter().all(|atom| {
        !atom.is_empty() && atom.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fuzz_target!(|formula: Formula| {
    if !valid_atoms(&formula) {
        return;
    }

    let text = formula.to_string();
    let parser = Formula::parser().then_ignore(chumsky::primitive::end());
    let got = parser.parse(text.as_str()).unwrap();
    assert_eq!(formula, got, "{text}");
});
