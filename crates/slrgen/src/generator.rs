//! The whole pipeline from a grammar source to the parse table.

use crate::{
    first_sets::FirstSets,
    follow_sets::FollowSets,
    grammar::{Grammar, GrammarDefError},
    lr0::Automaton,
    parser::Parser,
    table::{Config, ParseTable, TableError},
    util::display_fn,
};
use std::{fmt, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Grammar(#[from] GrammarDefError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// The SLR(1) parser generator.
///
/// Every intermediate result is computed once at construction and kept
/// for diagnostics.
#[derive(Debug)]
pub struct Generator {
    grammar: Grammar,
    first_sets: FirstSets,
    follow_sets: FollowSets,
    automaton: Automaton,
    table: ParseTable,
}

impl Generator {
    pub fn new(source: &str) -> Result<Self, BuildError> {
        Self::with_config(source, &Config::new())
    }

    pub fn with_config(source: &str, config: &Config) -> Result<Self, BuildError> {
        let grammar = Grammar::from_str(source)?;
        Self::from_grammar(grammar, config)
    }

    pub fn from_file(path: impl AsRef<Path>, config: &Config) -> Result<Self, BuildError> {
        let grammar = Grammar::from_file(path)?;
        Self::from_grammar(grammar, config)
    }

    pub fn from_grammar(grammar: Grammar, config: &Config) -> Result<Self, BuildError> {
        let first_sets = FirstSets::new(&grammar);
        let follow_sets = FollowSets::new(&grammar, &first_sets);
        let automaton = Automaton::generate(&grammar);
        let table = config.generate(&grammar, &automaton, &follow_sets)?;
        tracing::debug!(
            "generated parse table ({} states, {} tolerated conflict(s))",
            automaton.len(),
            table.conflicts().len()
        );

        Ok(Self {
            grammar,
            first_sets,
            follow_sets,
            automaton,
            table,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Return a parser that refers to the generated table.
    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.grammar, &self.table)
    }

    /// Render the FIRST sets of all symbols and the FOLLOW sets of nonterminals.
    pub fn display_sets(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            writeln!(f, "## first sets:")?;
            write!(f, "{}", self.first_sets.display(&self.grammar))?;
            writeln!(f, "\n## follow sets:")?;
            write!(f, "{}", self.follow_sets.display(&self.grammar))
        })
    }
}
