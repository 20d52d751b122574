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

use std::fmt;

use indexmap::IndexSet;
use pretty::RcDoc;
use serde::{Deserialize, Serialize};

pub mod parse;

pub use parse::SyntaxError;

/// The line width used when pretty-printing formulas.
pub const FORMAT_WIDTH: usize = 80;

/// A propositional formula.
///
/// Formulas are immutable trees. Every transformation over them builds a new
/// tree instead of rewriting one in place.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Formula {
    Atom(String),
    True,
    False,
    Not(Box<Formula>),
    Binary {
        op: Connective,
        lhs: Box<Formula>,
        rhs: Box<Formula>,
    },
}

impl Formula {
    pub fn atom(name: impl ToString) -> Self {
        Formula::Atom(name.to_string())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    pub fn binary(op: Connective, lhs: Formula, rhs: Formula) -> Self {
        Formula::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::And, lhs, rhs)
    }

    pub fn or(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::Or, lhs, rhs)
    }

    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::Implies, lhs, rhs)
    }

    pub fn iff(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::Iff, lhs, rhs)
    }

    /// Every atom in this formula, deduplicated, in left-to-right order of
    /// first occurrence.
    pub fn atoms(&self) -> IndexSet<&str> {
        let mut atoms = IndexSet::new();
        self.collect_atoms(&mut atoms);
        atoms
    }

    fn collect_atoms<'a>(&'a self, atoms: &mut IndexSet<&'a str>) {
        use Formula::*;
        match self {
            Atom(name) => {
                atoms.insert(name.as_str());
            }
            True | False => {}
            Not(inner) => inner.collect_atoms(atoms),
            Binary { lhs, rhs, .. } => {
                lhs.collect_atoms(atoms);
                rhs.collect_atoms(atoms);
            }
        }
    }

    /// The number of nodes in this formula.
    pub fn size(&self) -> usize {
        use Formula::*;
        match self {
            Atom(_) | True | False => 1,
            Not(inner) => 1 + inner.size(),
            Binary { lhs, rhs, .. } => 1 + lhs.size() + rhs.size(),
        }
    }

    /// The number of connectives on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        use Formula::*;
        match self {
            Atom(_) | True | False => 0,
            Not(inner) => 1 + inner.depth(),
            Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
        }
    }

    /// Evaluates this formula in the paraconsistent three-valued lattice.
    ///
    /// Negation swaps `true` and `false` and fixes `both`; conjunction is the
    /// lattice meet and disjunction the join over `false < both < true`.
    pub fn eval(&self, value_of: &impl Fn(&str) -> TruthValue) -> TruthValue {
        use Formula::*;
        match self {
            Atom(name) => value_of(name),
            True => TruthValue::True,
            False => TruthValue::False,
            Not(inner) => inner.eval(value_of).negate(),
            Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(value_of);
                let rhs = rhs.eval(value_of);
                match op {
                    Connective::And => lhs.meet(rhs),
                    Connective::Or => lhs.join(rhs),
                    Connective::Implies => lhs.negate().join(rhs),
                    Connective::Iff => lhs.negate().join(rhs).meet(rhs.negate().join(lhs)),
                }
            }
        }
    }

    /// Lays out the formula for pretty output, breaking long binary nodes
    /// across lines at [FORMAT_WIDTH].
    pub fn to_doc(&self) -> RcDoc<'static, ()> {
        use Formula::*;
        match self {
            Atom(name) => RcDoc::text(name.clone()),
            True => RcDoc::text("+"),
            False => RcDoc::text("-"),
            Not(inner) => RcDoc::text("!(").append(inner.to_doc()).append(")"),
            Binary { op, lhs, rhs } => RcDoc::text("(")
                .append(lhs.to_doc())
                .append(RcDoc::space())
                .append(op.symbol())
                .append(RcDoc::line().append(rhs.to_doc()).nest(1))
                .append(")")
                .group(),
        }
    }
}

/// Writes the formula on a single line in the syntax accepted by the parser.
impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Formula::*;
        match self {
            Atom(name) => write!(f, "{name}"),
            True => write!(f, "+"),
            False => write!(f, "-"),
            Not(inner) => write!(f, "!({inner})"),
            Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// A binary connective.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Connective {
    #[strum(serialize = "&&")]
    And,

    #[strum(serialize = "||")]
    Or,

    #[strum(serialize = "=>")]
    Implies,

    #[strum(serialize = "<=>")]
    Iff,
}

impl Connective {
    /// All connectives from the tightest-binding to the loosest.
    pub const BY_PRECEDENCE: [Connective; 4] = [
        Connective::And,
        Connective::Or,
        Connective::Implies,
        Connective::Iff,
    ];

    pub fn symbol(&self) -> &'static str {
        use Connective::*;
        match self {
            And => "&&",
            Or => "||",
            Implies => "=>",
            Iff => "<=>",
        }
    }

    pub fn is_right_associative(&self) -> bool {
        matches!(self, Connective::Implies)
    }
}

/// A value in the paraconsistent truth lattice.
///
/// `Both` is a glut: it satisfies every literal over its atom.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum TruthValue {
    #[strum(to_string = "true", serialize = "t")]
    True,

    #[strum(to_string = "false", serialize = "f")]
    False,

    #[strum(to_string = "both", serialize = "b")]
    Both,
}

impl TruthValue {
    pub const ALL: [TruthValue; 3] = [TruthValue::True, TruthValue::False, TruthValue::Both];

    pub fn negate(self) -> Self {
        use TruthValue::*;
        match self {
            True => False,
            False => True,
            Both => Both,
        }
    }

    pub fn meet(self, other: Self) -> Self {
        if self.rank() <= other.rank() {
            self
        } else {
            other
        }
    }

    pub fn join(self, other: Self) -> Self {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    /// A formula is satisfied if it is at least partially true.
    pub fn is_designated(&self) -> bool {
        !matches!(self, TruthValue::False)
    }

    fn rank(&self) -> u8 {
        use TruthValue::*;
        match self {
            False => 0,
            Both => 1,
            True => 2,
        }
    }
}

/// An ordered knowledge base of formulas.
///
/// The position of a formula is its identifier in every downstream encoding
/// and result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KnowledgeBase {
    formulas: Vec<Formula>,
}

impl KnowledgeBase {
    pub fn new(formulas: Vec<Formula>) -> Self {
        Self { formulas }
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    pub fn get(&self, id: usize) -> Option<&Formula> {
        self.formulas.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formula> {
        self.formulas.iter()
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Every atom in the knowledge base in order of first reference.
    pub fn atoms(&self) -> IndexSet<&str> {
        let mut atoms = IndexSet::new();
        for formula in self.formulas.iter() {
            formula.collect_atoms(&mut atoms);
        }

        atoms
    }

    /// The atoms of each formula, indexed by formula identifier.
    pub fn atoms_per_formula(&self) -> Vec<IndexSet<&str>> {
        self.formulas.iter().map(Formula::atoms).collect()
    }
}

impl FromIterator<Formula> for KnowledgeBase {
    fn from_iter<T: IntoIterator<Item = Formula>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for formula in self.formulas.iter() {
            writeln!(f, "{formula}")?;
        }

        Ok(())
    }
}
