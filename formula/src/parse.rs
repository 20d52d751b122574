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

use std::ops::Range;

use chumsky::{prelude::*, BoxedParser};

use crate::{Connective, Formula, KnowledgeBase};

type FormulaParser<'a> = BoxedParser<'a, char, Formula, Simple<char>>;

/// A malformed line of input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("syntax error on line {line}: {message}")]
pub struct SyntaxError {
    /// The 1-based line number of the malformed formula.
    pub line: usize,

    /// The character range of the error within the whole source.
    pub span: Range<usize>,

    pub message: String,
}

impl SyntaxError {
    fn from_simple(line: usize, offset: usize, errors: Vec<Simple<char>>) -> Self {
        let Some(err) = errors.into_iter().next() else {
            return Self {
                line,
                span: offset..offset,
                message: "invalid formula".to_string(),
            };
        };

        let found = match err.found() {
            Some(c) => format!("unexpected {c:?}"),
            None => "unexpected end of line".to_string(),
        };

        let mut expected: Vec<String> = err
            .expected()
            .map(|c| match c {
                Some(c) => format!("{c:?}"),
                None => "end of line".to_string(),
            })
            .collect();

        expected.sort();

        let message = if expected.is_empty() {
            found
        } else {
            format!("{found}, expected one of {}", expected.join(", "))
        };

        let span = err.span();
        Self {
            line,
            span: (span.start + offset)..(span.end + offset),
            message,
        }
    }
}

impl Formula {
    /// Parses a single infix formula.
    ///
    /// Binding strength is `! > && > || > => > <=>`. `!` and `=>` associate to
    /// the right and the other connectives to the left. `+` and `-` are the
    /// constants true and false.
    pub fn parser() -> impl Parser<char, Formula, Error = Simple<char>> + Clone {
        recursive(|formula| {
            let atom = filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated()
                .at_least(1)
                .collect::<String>()
                .map(Formula::Atom)
                .labelled("atom");

            let constant = just('+').to(Formula::True).or(just('-').to(Formula::False));

            let group = formula.delimited_by(just('('), just(')'));

            let primary = atom.or(constant).or(group).padded();

            let negation = just('!')
                .padded()
                .repeated()
                .then(primary)
                .foldr(|_, inner| Formula::not(inner))
                .boxed();

            Connective::BY_PRECEDENCE
                .into_iter()
                .fold(negation, binary_level)
        })
    }
}

/// Wraps the next-tightest level of the grammar in chains of one connective.
fn binary_level(next: FormulaParser<'_>, op: Connective) -> FormulaParser<'_> {
    let chain = next
        .clone()
        .then(just(op.symbol()).padded().ignore_then(next).repeated());

    if op.is_right_associative() {
        chain
            .map(move |(first, rest)| fold_right(op, first, rest))
            .boxed()
    } else {
        chain
            .foldl(move |lhs, rhs| Formula::binary(op, lhs, rhs))
            .boxed()
    }
}

fn fold_right(op: Connective, first: Formula, rest: Vec<Formula>) -> Formula {
    let mut rest = rest.into_iter().rev();
    let Some(last) = rest.next() else {
        return first;
    };

    let tail = rest.fold(last, |rhs, lhs| Formula::binary(op, lhs, rhs));
    Formula::binary(op, first, tail)
}

impl KnowledgeBase {
    /// Parses one formula per non-blank line of `src`.
    pub fn parse(src: &str) -> Result<Self, SyntaxError> {
        let parser = Formula::parser().padded().then_ignore(end());

        let mut formulas = Vec::new();
        let mut offset = 0;
        for (idx, line) in src.split_inclusive('\n').enumerate() {
            let text = line.trim_end_matches(|c| c == '\n' || c == '\r');

            if !text.trim().is_empty() {
                let formula = parser
                    .parse(text)
                    .map_err(|errs| SyntaxError::from_simple(idx + 1, offset, errs))?;

                formulas.push(formula);
            }

            offset += line.chars().count();
        }

        Ok(Self::new(formulas))
    }
}
