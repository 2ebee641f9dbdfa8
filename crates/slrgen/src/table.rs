//! Calculation of SLR(1) parse table with conflict detection.

use crate::{
    follow_sets::FollowSets,
    grammar::{Grammar, ProductionID, SymbolID},
    lr0::{Automaton, StateID},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The strategy for cells that receive more than one action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Fail the table generation and report every conflict.
    #[default]
    Reject,

    /// Keep the action written last: shifts are written before reductions,
    /// and reductions in the order of the items in the state.
    LastWriteWins,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    conflict_policy: ConflictPolicy,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Reject,
        }
    }

    /// Make the table generation fail on shift/reduce or reduce/reduce conflicts.
    ///
    /// This is the default.
    pub fn reject_conflicts(&mut self) -> &mut Self {
        self.conflict_policy = ConflictPolicy::Reject;
        self
    }

    /// Resolve conflicts by keeping the action written last.
    ///
    /// The detected conflicts are still available from [`ParseTable::conflicts`].
    pub fn last_write_wins(&mut self) -> &mut Self {
        self.conflict_policy = ConflictPolicy::LastWriteWins;
        self
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(ProductionID),

    /// Reduce to the start symbol at the end of input.
    ///
    /// The input is accepted when this reduction empties the stack.
    Accept(ProductionID),
}

impl Action {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Action::Shift(n) => write!(f, "shift({:02})", n),
            Action::Reduce(p) => write!(f, "reduce({})", g.production(*p).display(g)),
            Action::Accept(p) => write!(f, "accept({})", g.production(*p).display(g)),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
        }
    }
}

/// Multiple actions competing for a single cell of the table.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub state: StateID,
    pub symbol: SymbolID,
    /// The competing actions, in the order they were written.
    pub actions: Vec<Action>,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        if self.actions.iter().any(|a| matches!(a, Action::Shift(..))) {
            ConflictKind::ShiftReduce
        } else {
            ConflictKind::ReduceReduce
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{} conflict in state {:02} on `{}':",
                self.kind(),
                self.state,
                g.symbol(self.symbol)
            )?;
            for action in &self.actions {
                write!(f, " {}", action.display(g))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("detected {} conflict(s) in the parse table", _0.len())]
    Conflicts(Vec<Conflict>),
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<SymbolID, Action>,
    pub gotos: Map<SymbolID, StateID>,
}

#[derive(Debug)]
pub struct ParseTable {
    rows: Vec<ParseTableRow>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub fn generate(
        g: &Grammar,
        lr0: &Automaton,
        follow_sets: &FollowSets,
    ) -> Result<Self, TableError> {
        Config::new().generate(g, lr0, follow_sets)
    }

    pub fn rows(&self) -> impl Iterator<Item = (StateID, &ParseTableRow)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (StateID::from_raw(i as u16), row))
    }

    pub fn row(&self, state: StateID) -> Option<&ParseTableRow> {
        self.rows.get(usize::from(state.into_raw()))
    }

    pub fn action(&self, state: StateID, symbol: SymbolID) -> Option<Action> {
        self.row(state)?.actions.get(&symbol).copied()
    }

    pub fn goto(&self, state: StateID, symbol: SymbolID) -> Option<StateID> {
        self.row(state)?.gotos.get(&symbol).copied()
    }

    /// The conflicts tolerated during generation.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts[..]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.rows().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {:02}", id)?;
                writeln!(f, "## actions")?;
                for (symbol, action) in &row.actions {
                    writeln!(f, "- {} => {}", g.symbol(*symbol), action.display(g))?;
                }

                writeln!(f, "## gotos")?;
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:02})", g.symbol(*symbol), goto)?;
                }
            }

            if !self.conflicts.is_empty() {
                writeln!(f, "\n## conflicts")?;
                for conflict in &self.conflicts {
                    writeln!(f, "- {}", conflict.display(g))?;
                }
            }
            Ok(())
        })
    }
}

impl Config {
    pub fn generate(
        &self,
        g: &Grammar,
        lr0: &Automaton,
        follow_sets: &FollowSets,
    ) -> Result<ParseTable, TableError> {
        let mut rows = Vec::with_capacity(lr0.len());
        let mut conflicts = vec![];

        for state in lr0.states() {
            let mut pending_actions = Map::<SymbolID, Vec<Action>>::default();
            let mut gotos = Map::default();

            // shift, goto
            for (symbol, next) in state.transitions() {
                if g.is_terminal(symbol) {
                    pending_actions
                        .entry(symbol)
                        .or_default()
                        .push(Action::Shift(next));
                } else {
                    gotos.insert(symbol, next);
                }
            }

            // reduce, accept
            for item in state.items().iter().filter(|item| item.is_complete(g)) {
                let left = g.production(item.production).left();
                for lookahead in follow_sets.get(left).iter() {
                    let action = if left == g.start_symbol() && lookahead == SymbolID::EOI {
                        Action::Accept(item.production)
                    } else {
                        Action::Reduce(item.production)
                    };
                    pending_actions.entry(lookahead).or_default().push(action);
                }
            }

            let mut actions = Map::default();
            for (symbol, candidates) in pending_actions {
                let Some(&last) = candidates.last() else {
                    continue;
                };
                if candidates.len() > 1 {
                    let conflict = Conflict {
                        state: state.id(),
                        symbol,
                        actions: candidates,
                    };
                    if self.conflict_policy == ConflictPolicy::LastWriteWins {
                        tracing::warn!("{}; keeping the last one", conflict.display(g));
                    }
                    conflicts.push(conflict);
                }
                actions.insert(symbol, last);
            }

            rows.push(ParseTableRow { actions, gotos });
        }

        if self.conflict_policy == ConflictPolicy::Reject && !conflicts.is_empty() {
            for conflict in &conflicts {
                tracing::debug!("{}", conflict.display(g));
            }
            return Err(TableError::Conflicts(conflicts));
        }

        Ok(ParseTable { rows, conflicts })
    }
}
