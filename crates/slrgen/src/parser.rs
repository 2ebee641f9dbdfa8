//! Concrete syntax tree construction on top of the runtime parser.

use crate::{
    grammar::{Grammar, ProductionID, SymbolID},
    lr0::StateID,
    syntax,
    table::{Action, ParseTable},
};
use slrgen_runtime::{
    definition::{self, ParseAction, ParseActionError},
    parser::{self as engine, ParseEvent, ParseItem},
};
use std::{convert::Infallible, fmt};

/// A node of the concrete syntax tree.
///
/// Leaves are labelled with the token text and inner nodes with the name of
/// the reduced nonterminal symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    label: String,
    children: Vec<ParseTree>,
}

impl ParseTree {
    fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: vec![],
        }
    }

    fn node(label: impl Into<String>, children: Vec<ParseTree>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The child nodes, in the order of the right-hand side of the production.
    pub fn children(&self) -> &[ParseTree] {
        &self.children[..]
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Collect the labels of leaf nodes from left to right.
    pub fn leaves(&self) -> Vec<&str> {
        let mut leaves = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                leaves.push(node.label());
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        if self.is_leaf() {
            return writeln!(f, "{:indent$}{}", "", self.label);
        }
        writeln!(f, "{:indent$}{} {{", "", self.label)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        writeln!(f, "{:indent$}}}", "")
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unknown token `{}'", _0)]
    UnknownToken(String),

    #[error("`{}' cannot be used as an input token", _0)]
    UnexpectedSymbol(String),

    #[error("syntax error: unexpected `{}' in state {:02}", token, state)]
    Syntax { state: StateID, token: String },

    #[error("missing goto entry after reduction")]
    MissingGoto,

    #[error("inconsistent parser stack: {}", _0)]
    Internal(String),
}

#[derive(Debug)]
struct Token {
    symbol: SymbolID,
    text: String,
}

impl engine::Token<SymbolID> for Token {
    fn as_symbol(&self) -> SymbolID {
        self.symbol
    }
}

/// The parser driven by a generated SLR(1) table.
///
/// It keeps no state between calls, so a single instance can be shared
/// between threads.
#[derive(Debug, Copy, Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    table: &'g ParseTable,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g ParseTable) -> Self {
        Self { grammar, table }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn table(&self) -> &'g ParseTable {
        self.table
    }

    /// Parse a sequence of terminal names.
    ///
    /// The end of input is implicit. All token names are resolved before
    /// the table is consulted.
    pub fn parse<I>(&self, tokens: I) -> Result<ParseTree, ParseError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        let tokens = tokens
            .into_iter()
            .map(|name| self.resolve_token(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut tokens = tokens.into_iter().map(Ok::<_, Infallible>);

        let mut driver = engine::Parser::new(*self);
        let mut args = vec![];
        let mut nodes: Vec<ParseTree> = vec![];
        loop {
            let event = match driver.next_event(&mut tokens, &mut args) {
                Ok(event) => event,
                Err(err) => return Err(self.convert_error(err, &driver)),
            };
            let (ParseEvent::Reduce(id) | ParseEvent::Accept(id)) = event;

            let node = self.reduce(id, &mut args, &mut nodes)?;
            if let ParseEvent::Accept(..) = event {
                tracing::trace!("accepted");
                return Ok(node);
            }
            nodes.push(node);
        }
    }

    fn resolve_token(&self, name: &str) -> Result<Token, ParseError> {
        let symbol = self
            .grammar
            .symbol_id(name)
            .ok_or_else(|| ParseError::UnknownToken(name.to_owned()))?;

        let s = self.grammar.symbol(symbol);
        if !s.is_terminal() || s.is_reserved() {
            return Err(ParseError::UnexpectedSymbol(name.to_owned()));
        }

        Ok(Token {
            symbol,
            text: name.to_owned(),
        })
    }

    fn reduce(
        &self,
        id: ProductionID,
        args: &mut [ParseItem<Token, SymbolID>],
        nodes: &mut Vec<ParseTree>,
    ) -> Result<ParseTree, ParseError> {
        let production = self.grammar.production(id);
        tracing::trace!("reduce: {}", production.display(self.grammar));

        // 還元済みの非終端記号に対応する部分木はノードスタックの末尾に積まれている
        let n_subtrees = args
            .iter()
            .filter(|arg| matches!(arg, ParseItem::N(..)))
            .count();
        let start = nodes
            .len()
            .checked_sub(n_subtrees)
            .ok_or_else(|| ParseError::Internal("empty node stack".into()))?;
        let mut subtrees = nodes.drain(start..);

        let mut children = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            let child = match arg.take() {
                Some(ParseItem::T(token)) => ParseTree::leaf(token.text),
                Some(ParseItem::N(..)) => subtrees
                    .next()
                    .ok_or_else(|| ParseError::Internal("empty node stack".into()))?,
                _ => return Err(ParseError::Internal("empty item".into())),
            };
            children.push(child);
        }

        let label = self.grammar.symbol(production.left()).name();
        Ok(ParseTree::node(label, children))
    }

    fn convert_error(
        &self,
        err: engine::ParseError<Infallible>,
        driver: &engine::Parser<Self, Token>,
    ) -> ParseError {
        match err {
            engine::ParseError::Lexer(never) => match never {},
            engine::ParseError::Syntax(..) => ParseError::Syntax {
                state: driver.current_state().unwrap_or(StateID::START),
                token: driver
                    .lookahead()
                    .map_or_else(|| syntax::EOI.to_owned(), |t| t.text.clone()),
            },
            engine::ParseError::MissingGoto => ParseError::MissingGoto,
            err => ParseError::Internal(err.to_string()),
        }
    }
}

impl definition::ParseTable for Parser<'_> {
    type State = StateID;
    type Symbol = SymbolID;
    type Reduce = ProductionID;

    fn initial_state(&self) -> Self::State {
        StateID::START
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
        let Some(row) = self.table.row(current) else {
            return ParseAction::Error(ParseActionError::IncorrectState);
        };
        let lookahead = lookahead.unwrap_or(SymbolID::EOI);
        match row.actions.get(&lookahead).copied() {
            Some(Action::Shift(next)) => ParseAction::Shift(next),
            Some(Action::Reduce(id)) => {
                let production = self.grammar.production(id);
                ParseAction::Reduce(id, production.left(), production.right().len())
            }
            Some(Action::Accept(id)) => {
                let production = self.grammar.production(id);
                ParseAction::Accept(id, production.left(), production.right().len())
            }
            None => ParseAction::Error(ParseActionError::IncorrectSymbol),
        }
    }

    fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State> {
        self.table.goto(current, symbol)
    }
}
