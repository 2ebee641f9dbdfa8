//! Parser.

use crate::definition::{ParseAction, ParseActionError, ParseTable};
use std::{fmt, mem};

/// A trait for abstracting token symbols.
pub trait Token<TSym> {
    fn as_symbol(&self) -> TSym;
}

/// The parser driven based on the generated parse table.
#[derive(Debug)]
pub struct Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    definition: TDef,
    state_stack: Vec<TDef::State>,
    item_stack: Vec<ParseItem<TTok, TDef::Symbol>>,
    parser_state: ParserState,
    // `Some(None)` means that the end of input has been reached.
    lookahead: Option<Option<TTok>>,
}

#[derive(Debug)]
enum ParserState {
    Reading,
    Accepted,
}

impl<TDef, TTok> Parser<TDef, TTok>
where
    TDef: ParseTable,
    TTok: Token<TDef::Symbol>,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: TDef) -> Self {
        let initial_state = definition.initial_state();
        Self {
            definition,
            state_stack: vec![initial_state],
            item_stack: vec![],
            parser_state: ParserState::Reading,
            lookahead: None,
        }
    }

    /// Return the state on the top of the stack.
    pub fn current_state(&self) -> Option<TDef::State> {
        self.state_stack.last().copied()
    }

    /// Return the lookahead token that has been read but not consumed yet.
    pub fn lookahead(&self) -> Option<&TTok> {
        self.lookahead.as_ref().and_then(|t| t.as_ref())
    }

    /// Consume some tokens and drive the state machine
    /// until it matches a certain production rule.
    ///
    /// On `Reduce` and `Accept`, `args` is filled with the matched
    /// right-hand side items in left-to-right order.
    pub fn next_event<I, E>(
        &mut self,
        tokens: &mut I,
        args: &mut Vec<ParseItem<TTok, TDef::Symbol>>,
    ) -> Result<ParseEvent<TDef>, ParseError<E>>
    where
        I: Iterator<Item = Result<TTok, E>>,
        E: fmt::Display,
    {
        if matches!(self.parser_state, ParserState::Accepted) {
            return Err(ParseError::AlreadyAccepted);
        }

        loop {
            let current = self
                .state_stack
                .last()
                .copied()
                .ok_or_else(|| ParseError::EmptyNodeStack)?;

            if self.lookahead.is_none() {
                let token = tokens.next().transpose().map_err(ParseError::Lexer)?;
                self.lookahead = Some(token);
            }
            let input = self.lookahead().map(|t| t.as_symbol());

            match self.definition.action(current, input) {
                ParseAction::Shift(n) => {
                    let t = self
                        .lookahead
                        .take()
                        .flatten()
                        .ok_or_else(|| ParseError::UnexpectedEOI)?;
                    tracing::trace!("shift");
                    self.item_stack.push(ParseItem::T(t));
                    self.state_stack.push(n);
                    continue;
                }

                ParseAction::Reduce(reduce, lhs, n) => {
                    self.pop_args(n, args)?;
                    tracing::trace!("reduce {} item(s)", n);
                    self.goto(lhs)?;
                    return Ok(ParseEvent::Reduce(reduce));
                }

                ParseAction::Accept(reduce, lhs, n) => {
                    self.pop_args(n, args)?;
                    if self.state_stack.len() == 1 {
                        tracing::trace!("accept");
                        self.parser_state = ParserState::Accepted;
                        return Ok(ParseEvent::Accept(reduce));
                    }

                    // The start symbol is nested in the right-hand side of some rule.
                    tracing::trace!("reduce {} item(s) to the start symbol", n);
                    self.goto(lhs)?;
                    return Ok(ParseEvent::Reduce(reduce));
                }

                ParseAction::Error(err) => {
                    return Err(ParseError::Syntax(err));
                }
            }
        }
    }

    fn pop_args<E>(
        &mut self,
        n: usize,
        args: &mut Vec<ParseItem<TTok, TDef::Symbol>>,
    ) -> Result<(), ParseError<E>>
    where
        E: fmt::Display,
    {
        if self.state_stack.len() <= n {
            return Err(ParseError::EmptyNodeStack);
        }

        args.clear();
        args.resize_with(n, Default::default);
        for i in 0..n {
            self.state_stack.pop();
            let arg = self
                .item_stack
                .pop()
                .ok_or_else(|| ParseError::EmptyItemStack)?;
            args[n - i - 1] = arg;
        }

        Ok(())
    }

    fn goto<E>(&mut self, lhs: TDef::Symbol) -> Result<(), ParseError<E>>
    where
        E: fmt::Display,
    {
        let current = self
            .state_stack
            .last()
            .copied()
            .ok_or_else(|| ParseError::EmptyNodeStack)?;
        let next = self
            .definition
            .goto(current, lhs)
            .ok_or_else(|| ParseError::MissingGoto)?;
        self.item_stack.push(ParseItem::N(lhs));
        self.state_stack.push(next);
        Ok(())
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ParseItem<TTok, TSym> {
    T(TTok),
    N(TSym),

    #[doc(hidden)]
    __Empty,
}

impl<TTok, TSym> Default for ParseItem<TTok, TSym> {
    fn default() -> Self {
        Self::__Empty
    }
}

impl<TTok, TSym> ParseItem<TTok, TSym> {
    pub fn take(&mut self) -> Option<Self> {
        match mem::replace(self, Self::__Empty) {
            Self::__Empty => None,
            me => Some(me),
        }
    }
}

#[derive(Debug)]
pub enum ParseEvent<TDef>
where
    TDef: ParseTable,
{
    Reduce(TDef::Reduce),
    Accept(TDef::Reduce),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError<L: fmt::Display> {
    #[error("from lexer: {}", _0)]
    Lexer(L),

    #[error("syntax error: {}", _0)]
    Syntax(ParseActionError),

    #[error("missing goto entry after reduction")]
    MissingGoto,

    #[error("unexpected EOI")]
    UnexpectedEOI,

    #[error("empty node stack")]
    EmptyNodeStack,

    #[error("empty item stack")]
    EmptyItemStack,

    #[error("already accepted")]
    AlreadyAccepted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    // S := a S   (rule 0)
    // S := b     (rule 1)
    const A: u8 = 0;
    const B: u8 = 1;
    const S: u8 = 2;

    struct Table;

    impl ParseTable for Table {
        type State = u8;
        type Symbol = u8;
        type Reduce = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, lookahead: Option<u8>) -> ParseAction<u8, u8, u8> {
            match (current, lookahead) {
                (0 | 1, Some(A)) => ParseAction::Shift(1),
                (0 | 1, Some(B)) => ParseAction::Shift(2),
                (2, None) => ParseAction::Accept(1, S, 1),
                (3, None) => ParseAction::Accept(0, S, 2),
                _ => ParseAction::Error(ParseActionError::IncorrectSymbol),
            }
        }

        fn goto(&self, current: u8, symbol: u8) -> Option<u8> {
            match (current, symbol) {
                (1, S) => Some(3),
                _ => None,
            }
        }
    }

    impl Token<u8> for u8 {
        fn as_symbol(&self) -> u8 {
            *self
        }
    }

    fn run(input: &[u8]) -> Result<Vec<u8>, ParseError<Infallible>> {
        let mut parser = Parser::new(Table);
        let mut tokens = input.iter().copied().map(Ok::<_, Infallible>);
        let mut args = vec![];
        let mut reduced = vec![];
        loop {
            match parser.next_event(&mut tokens, &mut args)? {
                ParseEvent::Reduce(rule) => reduced.push(rule),
                ParseEvent::Accept(rule) => {
                    reduced.push(rule);
                    return Ok(reduced);
                }
            }
        }
    }

    #[test]
    fn accept_single_token() {
        assert_eq!(run(&[B]).unwrap(), vec![1]);
    }

    #[test]
    fn accept_nested_start_symbol() {
        assert_eq!(run(&[A, A, B]).unwrap(), vec![1, 0, 0]);
    }

    #[test]
    fn table_behind_pointer() {
        let table = std::rc::Rc::new(Table);
        let mut parser = Parser::new(table.clone());
        let mut tokens = [B].into_iter().map(Ok::<_, Infallible>);
        let mut args = vec![];
        assert!(matches!(
            parser.next_event(&mut tokens, &mut args),
            Ok(ParseEvent::Accept(1))
        ));
        assert_eq!(std::rc::Rc::strong_count(&table), 2);
    }

    // 還元後の遷移先が存在しないテーブル
    struct NoGoto;

    impl ParseTable for NoGoto {
        type State = u8;
        type Symbol = u8;
        type Reduce = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn action(&self, current: u8, lookahead: Option<u8>) -> ParseAction<u8, u8, u8> {
            match (current, lookahead) {
                (0, Some(A)) => ParseAction::Shift(1),
                (1, None) => ParseAction::Reduce(1, S, 1),
                _ => ParseAction::Error(ParseActionError::IncorrectSymbol),
            }
        }

        fn goto(&self, _: u8, _: u8) -> Option<u8> {
            None
        }
    }

    #[test]
    fn missing_goto() {
        let mut parser = Parser::new(NoGoto);
        let mut tokens = [A].into_iter().map(Ok::<_, Infallible>);
        let mut args = vec![];
        assert!(matches!(
            parser.next_event(&mut tokens, &mut args),
            Err(ParseError::MissingGoto)
        ));
    }

    #[test]
    fn reject_missing_operand() {
        assert!(matches!(
            run(&[A]),
            Err(ParseError::Syntax(ParseActionError::IncorrectSymbol))
        ));
    }

    #[test]
    fn reject_trailing_tokens() {
        assert!(matches!(run(&[B, B]), Err(ParseError::Syntax(..))));
    }

    #[test]
    fn args_are_ordered_left_to_right() {
        let mut parser = Parser::new(Table);
        let mut tokens = [A, B].into_iter().map(Ok::<_, Infallible>);
        let mut args = vec![];

        let event = parser.next_event(&mut tokens, &mut args).unwrap();
        assert!(matches!(event, ParseEvent::Reduce(1)));
        assert!(matches!(&args[..], [ParseItem::T(B)]));

        let event = parser.next_event(&mut tokens, &mut args).unwrap();
        assert!(matches!(event, ParseEvent::Accept(0)));
        assert!(matches!(&args[..], [ParseItem::T(A), ParseItem::N(S)]));

        assert!(matches!(
            parser.next_event(&mut tokens, &mut args),
            Err(ParseError::AlreadyAccepted)
        ));
    }
}
