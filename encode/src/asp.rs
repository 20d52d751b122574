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

//! Logic programs describing formula trees as facts.
//!
//! Unlike the MaxSAT encodings, no clauses are produced. Each formula is
//! mirrored node by node, and the semantics live in a fixed set of generic
//! rules shared by every knowledge base.

use std::fmt;

use paraglut_formula::{Connective, Formula, KnowledgeBase, FORMAT_WIDTH};
use pretty::RcDoc;
use tracing::{debug, debug_span, info};

/// The generic rules appended to every program.
pub static PARACONSISTENT_RULES: &str = include_str!("paraconsistent.lp");

/// Names a node of a formula tree by formula id and pre-order index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub formula: usize,
    pub index: usize,
}

impl NodeId {
    pub fn root(formula: usize) -> Self {
        Self { formula, index: 0 }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n({},{})", self.formula, self.index)
    }
}

/// A single ground fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fact {
    KbFormula { id: usize, root: NodeId },
    Formula(NodeId),
    FormulaIsAtom { node: NodeId, atom: String },
    FormulaIsTrue(NodeId),
    FormulaIsFalse(NodeId),
    Negation { node: NodeId, inner: NodeId },
    Conjunction(NodeId),
    NumConjuncts { node: NodeId, count: usize },
    ConjunctOf { conjunct: NodeId, node: NodeId },
    Disjunction(NodeId),
    NumDisjuncts { node: NodeId, count: usize },
    DisjunctOf { disjunct: NodeId, node: NodeId },
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::KbFormula { id, root } => write!(f, "kb_formula({id}, {root})."),
            Fact::Formula(node) => write!(f, "formula({node})."),
            Fact::FormulaIsAtom { node, atom } => {
                write!(f, "formula_is_atom({node}, {}).", quote(atom))
            }
            Fact::FormulaIsTrue(node) => write!(f, "formula_is_true({node})."),
            Fact::FormulaIsFalse(node) => write!(f, "formula_is_false({node})."),
            Fact::Negation { node, inner } => write!(f, "negation({node}, {inner})."),
            Fact::Conjunction(node) => write!(f, "conjunction({node})."),
            Fact::NumConjuncts { node, count } => write!(f, "num_conjuncts({node}, {count})."),
            Fact::ConjunctOf { conjunct, node } => write!(f, "conjunct_of({conjunct}, {node})."),
            Fact::Disjunction(node) => write!(f, "disjunction({node})."),
            Fact::NumDisjuncts { node, count } => write!(f, "num_disjuncts({node}, {count})."),
            Fact::DisjunctOf { disjunct, node } => write!(f, "disjunct_of({disjunct}, {node})."),
        }
    }
}

/// Renders an atom name as a string term.
pub fn quote(atom: &str) -> String {
    let escaped = atom.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Knowledge-base facts plus the generic rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicProgram {
    pub facts: Vec<Fact>,
}

impl LogicProgram {
    pub fn to_doc(&self) -> RcDoc<'static, ()> {
        let facts = self
            .facts
            .iter()
            .map(|fact| RcDoc::text(fact.to_string()));

        RcDoc::intersperse(facts, RcDoc::hardline())
            .append(RcDoc::hardline())
            .append(RcDoc::hardline())
            .append(RcDoc::text(PARACONSISTENT_RULES))
    }
}

impl fmt::Display for LogicProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_doc().render_fmt(FORMAT_WIDTH, f)
    }
}

/// Encodes a knowledge base into a [LogicProgram].
pub struct AspEncoder<'kb> {
    kb: &'kb KnowledgeBase,
}

impl<'kb> AspEncoder<'kb> {
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Self { kb }
    }

    pub fn encode(&self) -> LogicProgram {
        let _span = debug_span!("encode_asp").entered();

        let mut facts = Vec::new();
        for (id, formula) in self.kb.iter().enumerate() {
            facts.push(Fact::KbFormula {
                id,
                root: NodeId::root(id),
            });

            let mut emitter = FactEmitter {
                formula: id,
                next: 0,
                facts: &mut facts,
            };

            emitter.emit(formula);
            debug!(id, nodes = emitter.next, "emitted formula facts");
        }

        info!(facts = facts.len(), "encoded logic program");
        LogicProgram { facts }
    }
}

struct FactEmitter<'a> {
    formula: usize,
    next: usize,
    facts: &'a mut Vec<Fact>,
}

impl FactEmitter<'_> {
    fn emit(&mut self, formula: &Formula) -> NodeId {
        let node = NodeId {
            formula: self.formula,
            index: self.next,
        };

        self.next += 1;
        self.facts.push(Fact::Formula(node));
        self.emit_at(node, formula);
        node
    }

    fn emit_at(&mut self, node: NodeId, formula: &Formula) {
        use Formula::*;
        match formula {
            Atom(atom) => self.facts.push(Fact::FormulaIsAtom {
                node,
                atom: atom.clone(),
            }),
            True => self.facts.push(Fact::FormulaIsTrue(node)),
            False => self.facts.push(Fact::FormulaIsFalse(node)),
            Not(inner) => {
                let inner = self.emit(inner);
                self.facts.push(Fact::Negation { node, inner });
            }
            Binary { op, lhs, rhs } => match op {
                Connective::And | Connective::Or => {
                    self.emit_junction(node, *op == Connective::And, &[&**lhs, &**rhs]);
                }
                Connective::Implies => {
                    let rewritten = Formula::or(Formula::not((**lhs).clone()), (**rhs).clone());
                    self.emit_at(node, &rewritten);
                }
                Connective::Iff => {
                    let rewritten = Formula::and(
                        Formula::implies((**lhs).clone(), (**rhs).clone()),
                        Formula::implies((**rhs).clone(), (**lhs).clone()),
                    );
                    self.emit_at(node, &rewritten);
                }
            },
        }
    }

    fn emit_junction(&mut self, node: NodeId, conjunction: bool, operands: &[&Formula; 2]) {
        let count = operands.len();
        if conjunction {
            self.facts.push(Fact::Conjunction(node));
            self.facts.push(Fact::NumConjuncts { node, count });
        } else {
            self.facts.push(Fact::Disjunction(node));
            self.facts.push(Fact::NumDisjuncts { node, count });
        }

        for operand in operands {
            let child = self.emit(operand);
            self.facts.push(if conjunction {
                Fact::ConjunctOf {
                    conjunct: child,
                    node,
                }
            } else {
                Fact::DisjunctOf {
                    disjunct: child,
                    node,
                }
            });
        }
    }
}
