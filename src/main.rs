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
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use paraglut_encode::{AspEncoder, MaxSatEncoder};
use paraglut_formula::{KnowledgeBase, SyntaxError, FORMAT_WIDTH};
use paraglut_solve::{BatsatEngine, ClingoProcess, Solution, Strategy};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prints the encoding of a knowledge base.
    Encode {
        /// The path to the knowledge base, one formula per line.
        path: PathBuf,

        #[arg(short, long, default_value_t = Strategy::Naive)]
        strategy: Strategy,
    },

    /// Finds an inconsistency-minimal model of each knowledge base.
    Solve {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, default_value_t = Strategy::Naive)]
        strategy: Strategy,

        #[arg(short, long, default_value_t = Format::Text)]
        format: Format,

        /// The clingo executable used by the ASP strategy.
        #[arg(long, default_value = "clingo")]
        clingo: PathBuf,
    },

    /// Solves each knowledge base with every strategy and compares the costs.
    Compare {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// The clingo executable used by the ASP strategy.
        #[arg(long, default_value = "clingo")]
        clingo: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let default_directive: Directive = "paraglut=info"
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into());

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var("PARAGLUT_LOG")
        .with_default_directive(default_directive)
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    match args.command {
        Command::Encode { path, strategy } => {
            let Some(kb) = load_file(&path) else {
                return ExitCode::FAILURE;
            };

            match encode(&kb, strategy) {
                Ok(text) => print!("{text}"),
                Err(err) => {
                    error!("{}: {err}", path.display());
                    return ExitCode::FAILURE;
                }
            }
        }
        Command::Solve {
            paths,
            strategy,
            format,
            clingo,
        } => {
            let results = for_each_file(paths, move |kb| solve(&kb, strategy, &clingo)).await;

            let mut failed = false;
            for (path, result) in results {
                match result {
                    Some(Ok(solution)) => {
                        if let Err(err) = print_solution(&path, &solution, format) {
                            error!("{}: {err}", path.display());
                            failed = true;
                        }
                    }
                    Some(Err(err)) => {
                        error!("{}: {err}", path.display());
                        failed = true;
                    }
                    None => failed = true,
                }
            }

            if failed {
                return ExitCode::FAILURE;
            }
        }
        Command::Compare { paths, clingo } => {
            let use_asp = clingo_runs(&clingo);
            if !use_asp {
                warn!("{} is not runnable; skipping the ASP strategy", clingo.display());
            }

            let results = for_each_file(paths, move |kb| compare(&kb, use_asp, &clingo)).await;

            let mut disagreements = 0;
            for (path, result) in results {
                let Some(solutions) = result else {
                    disagreements += 1;
                    continue;
                };

                let costs: Vec<String> = solutions
                    .iter()
                    .map(|(strategy, result)| match result {
                        Ok(solution) => format!("{strategy}={}", solution.cost),
                        Err(err) => format!("{strategy}=error({err})"),
                    })
                    .collect();

                let agree = solutions
                    .iter()
                    .map(|(_, result)| result.as_ref().ok().map(|solution| solution.cost))
                    .collect::<Option<Vec<_>>>()
                    .is_some_and(|costs| costs.windows(2).all(|pair| pair[0] == pair[1]));

                let verdict = if agree { "agree" } else { "DISAGREE" };
                println!("{}: {} {verdict}", path.display(), costs.join(" "));

                if !agree {
                    disagreements += 1;
                }
            }

            if disagreements > 0 {
                error!("{disagreements} knowledge bases disagree");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Loads and processes every file on the blocking pool, returning results in
/// input order. Files that fail to load yield `None`.
async fn for_each_file<T, F>(paths: Vec<PathBuf>, op: F) -> Vec<(PathBuf, Option<T>)>
where
    T: Send + 'static,
    F: Fn(KnowledgeBase) -> T + Clone + Send + 'static,
{
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let op = op.clone();
            let handle = tokio::task::spawn_blocking({
                let path = path.clone();
                move || load_file(&path).map(op)
            });

            (path, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                error!("{}: worker failed: {err}", path.display());
                None
            }
        };

        results.push((path, result));
    }

    results
}

fn encode(
    kb: &KnowledgeBase,
    strategy: Strategy,
) -> Result<String, paraglut_encode::EncodeError> {
    match strategy.clause_strategy() {
        Some(clause_strategy) => {
            let encoding = MaxSatEncoder::new(kb, clause_strategy).encode()?;
            info!("{}", encoding.clauses.stats());
            Ok(encoding.clauses.to_wcnf())
        }
        None => Ok(AspEncoder::new(kb).encode().to_string()),
    }
}

fn solve(
    kb: &KnowledgeBase,
    strategy: Strategy,
    clingo: &Path,
) -> paraglut_solve::Result<Solution> {
    let start = Instant::now();
    let solution = match strategy.clause_strategy() {
        Some(clause_strategy) => {
            paraglut_solve::solve_maxsat(kb, clause_strategy, &mut BatsatEngine::new())
        }
        None => paraglut_solve::solve_asp(kb, &mut ClingoProcess::new(clingo)),
    }?;

    info!(%strategy, elapsed = ?start.elapsed(), cost = solution.cost, "solved");
    Ok(solution)
}

fn compare(
    kb: &KnowledgeBase,
    use_asp: bool,
    clingo: &Path,
) -> Vec<(Strategy, paraglut_solve::Result<Solution>)> {
    Strategy::ALL
        .into_iter()
        .filter(|strategy| use_asp || *strategy != Strategy::Asp)
        .map(|strategy| (strategy, solve(kb, strategy, clingo)))
        .collect()
}

fn print_solution(path: &Path, solution: &Solution, format: Format) -> serde_json::Result<()> {
    match format {
        Format::Text => println!("{}: {solution}", path.display()),
        Format::Json => {
            let row = serde_json::json!({
                "path": path.display().to_string(),
                "solution": solution,
            });

            println!("{}", serde_json::to_string(&row)?);
        }
    }

    Ok(())
}

fn clingo_runs(clingo: &Path) -> bool {
    std::process::Command::new(clingo)
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Reads and parses a knowledge base, reporting failures to stderr.
pub fn load_file(path: &Path) -> Option<KnowledgeBase> {
    let src = match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            return None;
        }
    };

    match KnowledgeBase::parse(&src) {
        Ok(kb) => {
            info!(
                path = %path.display(),
                formulas = kb.len(),
                atoms = kb.atoms().len(),
                "loaded knowledge base"
            );

            for (id, formula) in kb.iter().enumerate() {
                debug!("F{id}:\n{}", formula.to_doc().pretty(FORMAT_WIDTH));
            }

            Some(kb)
        }
        Err(err) => {
            report_syntax_error(path, &src, &err);
            None
        }
    }
}

fn report_syntax_error(path: &Path, src: &str, err: &SyntaxError) {
    let name = path.display().to_string();
    let span = (name.clone(), err.span.clone());

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(format!("syntax error on line {}", err.line))
        .with_label(
            Label::new(span)
                .with_message(&err.message)
                .with_color(Color::Red),
        )
        .finish();

    if let Err(io_err) = report.eprint((name, Source::from(src))) {
        error!("{err} ({io_err})");
    }
}
