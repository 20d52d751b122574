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

use std::{
    fmt,
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

use chumsky::prelude::*;
use paraglut_encode::{asp::quote, LogicProgram};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// The shown atoms of an optimal answer set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AspOutcome {
    pub cost: u64,
    pub symbols: Vec<Symbol>,
}

/// An answer-set solver.
pub trait AspEngine {
    /// Finds an optimal answer set of a program.
    fn solve(&mut self, program: &LogicProgram) -> Result<AspOutcome>;
}

/// A ground term printed by an answer-set solver.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Number(i64),
    String(String),
    Function { name: String, args: Vec<Symbol> },
}

impl Symbol {
    pub fn function(name: impl ToString, args: Vec<Symbol>) -> Self {
        Symbol::Function {
            name: name.to_string(),
            args,
        }
    }

    pub fn parser() -> impl Parser<char, Symbol, Error = Simple<char>> + Clone {
        recursive(|symbol| {
            let number = just('-')
                .or_not()
                .chain::<char, _, _>(text::int(10))
                .collect::<String>()
                .try_map(|digits, span| match digits.parse() {
                    Ok(number) => Ok(Symbol::Number(number)),
                    Err(_) => Err(Simple::custom(span, "integer out of range")),
                });

            let escape = just('\\').ignore_then(any()).map(|c| match c {
                'n' => '\n',
                c => c,
            });

            let string = filter(|c: &char| *c != '\\' && *c != '"')
                .or(escape)
                .repeated()
                .collect::<String>()
                .delimited_by(just('"'), just('"'))
                .map(Symbol::String);

            let args = symbol
                .separated_by(just(',').padded())
                .delimited_by(just('('), just(')'));

            let function = text::ident()
                .then(args.or_not())
                .map(|(name, args)| Symbol::Function {
                    name,
                    args: args.unwrap_or_default(),
                });

            number.or(string).or(function)
        })
    }

    /// Parses a whitespace-separated line of symbols.
    pub fn parse_line(line: &str) -> Result<Vec<Symbol>> {
        Symbol::parser()
            .padded()
            .repeated()
            .then_ignore(end())
            .parse(line)
            .map_err(|errors| {
                let spans: Vec<_> = errors.iter().map(|err| err.span()).collect();
                Error::SolverFailure(format!("unparseable answer set {line:?} at {spans:?}"))
            })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Number(number) => write!(f, "{number}"),
            Symbol::String(string) => write!(f, "{}", quote(string)),
            Symbol::Function { name, args } if args.is_empty() => write!(f, "{name}"),
            Symbol::Function { name, args } => {
                let args: Vec<_> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", args.join(","))
            }
        }
    }
}

/// Parses the text output of clingo, keeping the last answer set.
///
/// The answer is only accepted once clingo has proven it optimal.
pub fn parse_output(stdout: &str) -> Result<AspOutcome> {
    let mut answer = None;
    let mut cost = None;
    let mut optimum = false;
    let mut lines = stdout.lines();
    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.starts_with("Answer:") {
            answer = Some(lines.next().unwrap_or_default());
            cost = None;
        } else if let Some(rest) = line.strip_prefix("Optimization:") {
            cost = rest.split_whitespace().next();
        } else if line == "OPTIMUM FOUND" {
            optimum = true;
        } else if line == "UNSATISFIABLE" {
            return Err(Error::SolverFailure(
                "logic program has no answer set".to_string(),
            ));
        }
    }

    let Some(answer) = answer else {
        return Err(Error::SolverFailure(
            "clingo reported no answer set".to_string(),
        ));
    };

    if !optimum {
        return Err(Error::SolverFailure(
            "clingo stopped before proving an answer set optimal".to_string(),
        ));
    }

    let cost = match cost {
        Some(cost) => cost
            .parse()
            .map_err(|_| Error::SolverFailure(format!("invalid optimization value {cost:?}")))?,
        None => {
            warn!("clingo reported no optimization value; assuming zero");
            0
        }
    };

    let symbols = Symbol::parse_line(answer)?;
    trace!(?symbols, cost, "parsed answer set");
    Ok(AspOutcome { cost, symbols })
}

/// Runs a clingo executable on each program.
#[derive(Clone, Debug)]
pub struct ClingoProcess {
    pub binary: PathBuf,
}

impl Default for ClingoProcess {
    fn default() -> Self {
        Self::new("clingo")
    }
}

impl ClingoProcess {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl AspEngine for ClingoProcess {
    fn solve(&mut self, program: &LogicProgram) -> Result<AspOutcome> {
        let failure =
            |err: std::io::Error| Error::SolverFailure(format!("{:?}: {err}", self.binary));

        let mut child = Command::new(&self.binary)
            .arg("--opt-mode=opt")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(failure)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(program.to_string().as_bytes())
                .map_err(failure)?;
        }

        let output = child.wait_with_output().map_err(failure)?;
        debug!(status = ?output.status, "clingo exited");

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_output(&stdout) {
            // 30 is satisfiable with the search space exhausted
            Ok(_) if output.status.code() != Some(30) => Err(Error::SolverFailure(format!(
                "clingo exited with {} after an optimal answer",
                output.status
            ))),
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    warn!(%stderr, "clingo failed");
                }

                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIMUM: &str = "clingo version 5.7.1
Reading from stdin
Solving...
Answer: 1
val(\"A0\",t) f_inconsistent(1) val(\"A1\",b) f_inconsistent(0)
Optimization: 2
Answer: 2
val(\"A0\",b) f_inconsistent(0)
Optimization: 1
OPTIMUM FOUND

Models       : 2
  Optimum    : yes
Optimization : 1
Calls        : 1
";

    #[test]
    fn parse_symbols() {
        let line = "val(\"A\\\"0\",b) f_inconsistent(12) n(0,-3) done";
        let symbols = Symbol::parse_line(line).unwrap();
        assert_eq!(
            symbols,
            vec![
                Symbol::function(
                    "val",
                    vec![
                        Symbol::String("A\"0".to_string()),
                        Symbol::function("b", vec![])
                    ]
                ),
                Symbol::function("f_inconsistent", vec![Symbol::Number(12)]),
                Symbol::function("n", vec![Symbol::Number(0), Symbol::Number(-3)]),
                Symbol::function("done", vec![]),
            ]
        );
        assert_eq!(symbols[0].to_string(), "val(\"A\\\"0\",b)");
    }

    #[test]
    fn last_answer_is_optimal() {
        let outcome = parse_output(OPTIMUM).unwrap();
        assert_eq!(outcome.cost, 1);
        assert_eq!(outcome.symbols.len(), 2);
        assert_eq!(outcome.symbols[1].to_string(), "f_inconsistent(0)");
    }

    #[test]
    fn empty_answer_set() {
        let outcome = parse_output("Answer: 1\n\nOptimization: 0\nOPTIMUM FOUND\n").unwrap();
        assert_eq!(outcome.cost, 0);
        assert!(outcome.symbols.is_empty());
    }

    #[test]
    fn unsatisfiable_programs_fail() {
        let err = parse_output("Solving...\nUNSATISFIABLE\n").unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)));

        let err = parse_output("*** ERROR: (clingo): parsing failed\n").unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)));
    }

    #[test]
    fn interrupted_search_is_not_optimal() {
        let output = "Solving...
Answer: 1
val(\"A0\",b) f_inconsistent(0) f_inconsistent(1)
Optimization: 2
INTERRUPTED : 1
SATISFIABLE

Models       : 1+
  Optimum    : unknown
Optimization : 2
";

        let err = parse_output(output).unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)), "{err}");

        let unproven = OPTIMUM.replace("OPTIMUM FOUND\n", "");
        assert!(parse_output(&unproven).is_err());
    }

    #[test]
    fn missing_binary_is_a_solver_failure() {
        let mut engine = ClingoProcess::new("/nonexistent/paraglut-clingo");
        let err = engine.solve(&LogicProgram::default()).unwrap_err();
        assert!(matches!(err, Error::SolverFailure(_)));
    }
}
