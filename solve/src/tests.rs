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

use paraglut_encode::{
    asp::{Fact, NodeId},
    ClauseStrategy, LogicProgram, MaxSatEncoder,
};
use paraglut_formula::{KnowledgeBase, TruthValue};

use crate::*;

const CLAUSE_STRATEGIES: [ClauseStrategy; 2] = [ClauseStrategy::Naive, ClauseStrategy::Tseitin];

const MIXED_SOURCES: [&str; 8] = [
    "A && B\n!A || !B",
    "A <=> B\nA\n!B",
    "(A => B) && (B => C)\nA && !C",
    "!(A || (B && !C))\nC => A\nB",
    "(A <=> !B) <=> (C || -)\n+ => A\n!C && B",
    "A || B || C\n!A\n!B\n!C",
    "(A && (B || (C && !(D => A))))\nD <=> !D",
    "((A => B) => C) => A\n!A",
];

fn parse(src: &str) -> KnowledgeBase {
    KnowledgeBase::parse(src).unwrap()
}

fn solve(src: &str, strategy: ClauseStrategy) -> Solution {
    solve_maxsat(&parse(src), strategy, &mut BatsatEngine::new()).unwrap()
}

/// Enumerates every valuation to find the least number of formulas that
/// must contain a glut for all formulas to be designated.
fn brute_force_optimum(kb: &KnowledgeBase) -> Option<u64> {
    let atoms: Vec<&str> = kb.atoms().into_iter().collect();
    let per_formula = kb.atoms_per_formula();

    let mut best: Option<u64> = None;
    for code in 0..3usize.pow(atoms.len() as u32) {
        let mut rest = code;
        let values: Vec<TruthValue> = atoms
            .iter()
            .map(|_| {
                let value = TruthValue::ALL[rest % 3];
                rest /= 3;
                value
            })
            .collect();

        let value_of = |atom: &str| {
            let idx = atoms.iter().position(|other| *other == atom).unwrap();
            values[idx]
        };

        if !kb.iter().all(|formula| formula.eval(&value_of).is_designated()) {
            continue;
        }

        let cost = per_formula
            .iter()
            .filter(|atoms| atoms.iter().any(|atom| value_of(*atom) == TruthValue::Both))
            .count() as u64;

        best = Some(best.map_or(cost, |best| best.min(cost)));
    }

    best
}

/// Checks that a solution designates every formula and flags exactly the
/// formulas containing gluts.
fn assert_valid(kb: &KnowledgeBase, solution: &Solution) {
    let value_of = |atom: &str| solution.value_of(atom).unwrap();
    for (id, formula) in kb.iter().enumerate() {
        assert!(
            formula.eval(&value_of).is_designated(),
            "{formula} is false in {solution}"
        );

        let has_glut = formula
            .atoms()
            .iter()
            .any(|atom| value_of(*atom) == TruthValue::Both);

        assert_eq!(solution.inconsistent.contains(&id), has_glut, "{solution}");
    }

    assert_eq!(solution.cost, solution.inconsistent.len() as u64);
}

#[test]
fn scenario_single_atom() {
    for strategy in CLAUSE_STRATEGIES {
        let solution = solve("A0", strategy);
        assert_eq!(solution.cost, 0);
        assert!(solution.inconsistent.is_empty());
        assert_eq!(solution.value_of("A0"), Some(TruthValue::True));
        assert_eq!(solution.both_atoms().count(), 0);
    }
}

#[test]
fn scenario_contradiction() {
    for strategy in CLAUSE_STRATEGIES {
        let solution = solve("A0 && !A0", strategy);
        assert_eq!(solution.cost, 1);
        assert_eq!(solution.inconsistent, vec![0]);
        assert_eq!(solution.both_atoms().collect::<Vec<_>>(), vec!["A0"]);
    }
}

#[test]
fn scenario_contradictory_formulas() {
    // the shared glut flags both formulas
    for strategy in CLAUSE_STRATEGIES {
        let kb = parse("A0\n!A0");
        let solution = solve_maxsat(&kb, strategy, &mut BatsatEngine::new()).unwrap();
        assert_eq!(solution.cost, 2);
        assert_eq!(solution.inconsistent, vec![0, 1]);
        assert_eq!(solution.value_of("A0"), Some(TruthValue::Both));
        assert_eq!(brute_force_optimum(&kb), Some(2));
    }
}

#[test]
fn scenario_jointly_unsatisfiable_formulas() {
    for strategy in CLAUSE_STRATEGIES {
        let kb = parse("A0 || A1\n!A0 && !A1");
        let solution = solve_maxsat(&kb, strategy, &mut BatsatEngine::new()).unwrap();
        assert_valid(&kb, &solution);
        assert_eq!(solution.cost, 2);
        assert!(solution.both_atoms().count() >= 1);
        assert_eq!(brute_force_optimum(&kb), Some(2));
    }
}

#[test]
fn consistent_formulas_need_no_gluts() {
    for strategy in CLAUSE_STRATEGIES {
        let kb = parse("A0 || A1\n!A0\nA1 => A2");
        let solution = solve_maxsat(&kb, strategy, &mut BatsatEngine::new()).unwrap();
        assert_valid(&kb, &solution);
        assert_eq!(solution.cost, 0);
        assert_eq!(solution.value_of("A0"), Some(TruthValue::False));
        assert_eq!(solution.value_of("A1"), Some(TruthValue::True));
        assert_eq!(solution.value_of("A2"), Some(TruthValue::True));
    }
}

#[test]
fn gluts_are_isolated_to_their_formulas() {
    for strategy in CLAUSE_STRATEGIES {
        let kb = parse("B\nA && !A\nC || B");
        let solution = solve_maxsat(&kb, strategy, &mut BatsatEngine::new()).unwrap();
        assert_valid(&kb, &solution);
        assert_eq!(solution.cost, 1);
        assert_eq!(solution.inconsistent, vec![1]);
    }
}

#[test]
fn strategies_agree_with_brute_force() {
    for src in MIXED_SOURCES {
        let kb = parse(src);
        let expected = brute_force_optimum(&kb).unwrap();

        for strategy in CLAUSE_STRATEGIES {
            let solution = solve_maxsat(&kb, strategy, &mut BatsatEngine::new()).unwrap();
            assert_valid(&kb, &solution);
            assert_eq!(solution.cost, expected, "{strategy} on {src:?}");
        }
    }
}

#[test]
fn unrescued_auxiliaries_keep_costs_equal() {
    // nested gates without atom literals are never rescued, yet the gates
    // above a glut can still take either value
    let kb = parse("!(!(A && !A) || !(B || -))\n!B || C\n!C");
    let naive = solve_maxsat(&kb, ClauseStrategy::Naive, &mut BatsatEngine::new()).unwrap();
    let tseitin = solve_maxsat(&kb, ClauseStrategy::Tseitin, &mut BatsatEngine::new()).unwrap();

    assert_eq!(naive.cost, tseitin.cost);
    assert_eq!(Some(naive.cost), brute_force_optimum(&kb));

    let naive_encoding = MaxSatEncoder::new(&kb, ClauseStrategy::Naive).encode().unwrap();
    let tseitin_encoding = MaxSatEncoder::new(&kb, ClauseStrategy::Tseitin).encode().unwrap();
    assert!(tseitin_encoding.clauses.n_vars > naive_encoding.clauses.n_vars);
    assert_eq!(naive_encoding.clauses.soft, tseitin_encoding.clauses.soft);
}

#[test]
fn false_formula_is_a_solver_failure() {
    for strategy in CLAUSE_STRATEGIES {
        let err = solve_maxsat(&parse("A\n-"), strategy, &mut BatsatEngine::new()).unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)), "{err}");
    }
}

#[test]
fn empty_knowledge_base() {
    for strategy in CLAUSE_STRATEGIES {
        let solution = solve("", strategy);
        assert_eq!(solution.cost, 0);
        assert!(solution.valuation.is_empty());
    }
}

#[test]
fn every_atom_has_one_value() {
    let kb = parse("A0 && !A0\nA1 || A2\n!A2");
    let encoding = MaxSatEncoder::new(&kb, ClauseStrategy::Tseitin).encode().unwrap();
    let outcome = BatsatEngine::new().solve(&encoding.clauses).unwrap();

    for (_, vars) in encoding.atoms.iter() {
        let set = TruthValue::ALL
            .into_iter()
            .filter(|value| outcome.value(vars.get(*value)))
            .count();

        assert_eq!(set, 1);
    }
}

#[test]
fn two_values_violate_the_encoding() {
    let encoding = MaxSatEncoder::new(&parse("A0"), ClauseStrategy::Naive)
        .encode()
        .unwrap();

    // t, f, b, finc
    let outcome = MaxSatOutcome {
        cost: 0,
        assignment: vec![1, -2, 3, -4],
    };

    let err = interpret::interpret_maxsat(&encoding, &outcome).unwrap_err();
    match err {
        Error::EncodingInvariantViolation { atom, values } => {
            assert_eq!(atom, "A0");
            assert_eq!(values, vec![TruthValue::True, TruthValue::Both]);
        }
        other => panic!("unexpected error {other}"),
    }

    let outcome = MaxSatOutcome {
        cost: 0,
        assignment: vec![-1, -2, -3, -4],
    };

    let err = interpret::interpret_maxsat(&encoding, &outcome).unwrap_err();
    assert!(matches!(err, Error::EncodingInvariantViolation { .. }));
}

#[test]
fn misreported_cost_is_a_solver_failure() {
    let encoding = MaxSatEncoder::new(&parse("A0"), ClauseStrategy::Naive)
        .encode()
        .unwrap();

    let outcome = MaxSatOutcome {
        cost: 0,
        assignment: vec![1, -2, -3, 4],
    };

    let err = interpret::interpret_maxsat(&encoding, &outcome).unwrap_err();
    assert!(matches!(err, Error::SolverFailure(_)));
}

/// Answers every program with a fixed outcome.
struct Canned(AspOutcome);

impl AspEngine for Canned {
    fn solve(&mut self, _program: &LogicProgram) -> Result<AspOutcome> {
        Ok(self.0.clone())
    }
}

fn val(atom: &str, value: &str) -> Symbol {
    Symbol::function(
        "val",
        vec![
            Symbol::String(atom.to_string()),
            Symbol::function(value, vec![]),
        ],
    )
}

fn f_inconsistent(id: i64) -> Symbol {
    Symbol::function("f_inconsistent", vec![Symbol::Number(id)])
}

#[test]
fn answer_sets_are_interpreted() {
    let mut engine = Canned(AspOutcome {
        cost: 1,
        symbols: vec![val("B", "t"), f_inconsistent(0), val("A0", "b")],
    });

    let solution = solve_asp(&parse("A0 && !A0\nB"), &mut engine).unwrap();
    assert_eq!(solution.strategy, Strategy::Asp);
    assert_eq!(solution.cost, 1);
    assert_eq!(solution.inconsistent, vec![0]);
    assert_eq!(
        solution.valuation,
        vec![
            AtomValue {
                atom: "A0".to_string(),
                value: TruthValue::Both
            },
            AtomValue {
                atom: "B".to_string(),
                value: TruthValue::True
            },
        ]
    );
    assert_eq!(
        solution.to_string(),
        "asp IFC: 1, InconsistentFormulas: [F0], Atoms: [A0:both, B:true]"
    );
}

#[test]
fn unknown_answer_symbols_fail() {
    let kb = parse("A0");
    let cases = [
        vec![val("A0", "t"), val("Z", "f")],
        vec![val("A0", "t"), f_inconsistent(3)],
        vec![val("A0", "x")],
    ];

    for symbols in cases {
        let mut engine = Canned(AspOutcome { cost: 0, symbols });
        let err = solve_asp(&kb, &mut engine).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(_)), "{err}");
    }

    let mut engine = Canned(AspOutcome {
        cost: 0,
        symbols: vec![],
    });

    let err = solve_asp(&kb, &mut engine).unwrap_err();
    assert!(matches!(err, Error::EncodingInvariantViolation { .. }));
}

#[test]
fn strategy_names() {
    assert_eq!("tseitin".parse::<Strategy>(), Ok(Strategy::Tseitin));
    assert_eq!(Strategy::Asp.to_string(), "asp");
    assert_eq!(Strategy::Asp.clause_strategy(), None);
    assert_eq!(Strategy::from(ClauseStrategy::Naive), Strategy::Naive);
}

/// Grounds the generic rules over the facts of a program and enumerates every
/// valuation of its atoms, answering with the first one of least cost.
struct GroundRules;

impl GroundRules {
    fn children(facts: &[Fact]) -> HashMap<NodeId, Vec<NodeId>> {
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for fact in facts {
            let (parent, child) = match fact {
                Fact::Negation { node, inner } => (*node, *inner),
                Fact::ConjunctOf { conjunct, node } => (*node, *conjunct),
                Fact::DisjunctOf { disjunct, node } => (*node, *disjunct),
                _ => continue,
            };

            children.entry(parent).or_default().push(child);
        }

        children
    }

    /// The `holds/2` value of a node; panics if the rules derive two values.
    fn holds(
        facts: &[Fact],
        children: &HashMap<NodeId, Vec<NodeId>>,
        node: NodeId,
        valuation: &HashMap<&str, TruthValue>,
    ) -> TruthValue {
        use TruthValue::*;

        let values = move || {
            children
                .get(&node)
                .into_iter()
                .flatten()
                .map(move |child| Self::holds(facts, children, *child, valuation))
        };

        let junction = |conjunction: bool| {
            let arity = facts.iter().find_map(|fact| match fact {
                Fact::NumConjuncts { node: n, count } if conjunction && *n == node => Some(*count),
                Fact::NumDisjuncts { node: n, count } if !conjunction && *n == node => Some(*count),
                _ => None,
            });

            let (all, any) = if conjunction { (True, False) } else { (False, True) };
            let all_hold = Some(values().filter(|value| *value == all).count()) == arity;
            let any_holds = values().any(|value| value == any);
            match (all_hold, any_holds) {
                (true, false) => all,
                (false, true) => any,
                (false, false) => Both,
                (true, true) => panic!("{node} holds as both {all} and {any}"),
            }
        };

        for fact in facts {
            match fact {
                Fact::FormulaIsAtom { node: n, atom } if *n == node => {
                    return valuation[atom.as_str()]
                }
                Fact::FormulaIsTrue(n) if *n == node => return True,
                Fact::FormulaIsFalse(n) if *n == node => return False,
                Fact::Negation { node: n, inner } if *n == node => {
                    return Self::holds(facts, children, *inner, valuation).negate()
                }
                Fact::Conjunction(n) if *n == node => return junction(true),
                Fact::Disjunction(n) if *n == node => return junction(false),
                _ => {}
            }
        }

        panic!("{node} has no defining fact");
    }

    /// The atoms reachable from a node through `contains/2`.
    fn contained_atoms<'a>(
        facts: &'a [Fact],
        children: &HashMap<NodeId, Vec<NodeId>>,
        root: NodeId,
    ) -> Vec<&'a str> {
        let mut stack = vec![root];
        let mut atoms = Vec::new();
        while let Some(node) = stack.pop() {
            stack.extend(children.get(&node).into_iter().flatten().copied());
            atoms.extend(facts.iter().filter_map(|fact| match fact {
                Fact::FormulaIsAtom { node: n, atom } if *n == node => Some(atom.as_str()),
                _ => None,
            }));
        }

        atoms
    }
}

impl AspEngine for GroundRules {
    fn solve(&mut self, program: &LogicProgram) -> Result<AspOutcome> {
        let facts = program.facts.as_slice();
        let children = Self::children(facts);

        let mut atoms: Vec<&str> = Vec::new();
        for fact in facts {
            if let Fact::FormulaIsAtom { atom, .. } = fact {
                if !atoms.contains(&atom.as_str()) {
                    atoms.push(atom);
                }
            }
        }

        let roots: Vec<(usize, NodeId)> = facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::KbFormula { id, root } => Some((*id, *root)),
                _ => None,
            })
            .collect();

        let mut best: Option<AspOutcome> = None;
        for code in 0..3usize.pow(atoms.len() as u32) {
            let mut rest = code;
            let mut valuation = HashMap::new();
            for atom in atoms.iter() {
                valuation.insert(*atom, TruthValue::ALL[rest % 3]);
                rest /= 3;
            }

            let rejected = roots.iter().any(|(_, root)| {
                Self::holds(facts, &children, *root, &valuation) == TruthValue::False
            });

            if rejected {
                continue;
            }

            let inconsistent: Vec<usize> = roots
                .iter()
                .filter(|(_, root)| {
                    Self::contained_atoms(facts, &children, *root)
                        .into_iter()
                        .any(|atom| valuation[atom] == TruthValue::Both)
                })
                .map(|(id, _)| *id)
                .collect();

            let cost = inconsistent.len() as u64;
            if best.as_ref().is_some_and(|best| best.cost <= cost) {
                continue;
            }

            let mut symbols: Vec<Symbol> = atoms
                .iter()
                .map(|atom| {
                    let value = match valuation[atom] {
                        TruthValue::True => "t",
                        TruthValue::False => "f",
                        TruthValue::Both => "b",
                    };

                    val(atom, value)
                })
                .collect();

            symbols.extend(inconsistent.iter().map(|id| f_inconsistent(*id as i64)));
            best = Some(AspOutcome { cost, symbols });
        }

        best.ok_or_else(|| Error::SolverFailure("logic program has no answer set".to_string()))
    }
}

#[test]
fn logic_program_scenarios() {
    let cases = [
        ("A0", 0),
        ("A0 && !A0", 1),
        ("A0\n!A0", 2),
        ("A0 || A1\n!A0 && !A1", 2),
    ];

    for (src, cost) in cases {
        let kb = parse(src);
        let solution = solve_asp(&kb, &mut GroundRules).unwrap();
        assert_valid(&kb, &solution);
        assert_eq!(solution.cost, cost, "{src:?}");
    }
}

#[test]
fn logic_program_agrees_with_maxsat() {
    for src in MIXED_SOURCES {
        let kb = parse(src);
        let asp = solve_asp(&kb, &mut GroundRules).unwrap();
        assert_valid(&kb, &asp);

        let naive = solve_maxsat(&kb, ClauseStrategy::Naive, &mut BatsatEngine::new()).unwrap();
        assert_eq!(asp.cost, naive.cost, "{src:?}");
        assert_eq!(Some(asp.cost), brute_force_optimum(&kb), "{src:?}");
    }
}

#[test]
fn false_formula_has_no_answer_set() {
    let err = solve_asp(&parse("A\n-"), &mut GroundRules).unwrap_err();
    assert!(matches!(err, Error::SolverFailure(_)), "{err}");
}

#[test]
fn gluts_below_negations_are_contained() {
    // the atom is only reachable through nested negations and a disjunction
    let kb = parse("!(!(A || B))\n!A\n!B");
    let solution = solve_asp(&kb, &mut GroundRules).unwrap();
    assert_valid(&kb, &solution);
    assert_eq!(solution.cost, 2);
    assert!(solution.inconsistent.contains(&0));
}

#[test]
#[ignore = "requires a clingo executable on PATH"]
fn clingo_agrees_with_maxsat() {
    let sources = ["A0", "A0 && !A0", "A0\n!A0", "A0 || A1\n!A0 && !A1", "(A => B) <=> !C\nC"];
    for src in sources {
        let kb = parse(src);
        let asp = solve_asp(&kb, &mut ClingoProcess::default()).unwrap();
        assert_valid(&kb, &asp);

        let naive = solve_maxsat(&kb, ClauseStrategy::Naive, &mut BatsatEngine::new()).unwrap();
        assert_eq!(asp.cost, naive.cost, "{src:?}");
    }
}
