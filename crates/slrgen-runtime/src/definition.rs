//! Parser definition.

/// The trait for abstracting the generated SLR(1) parse table.
pub trait ParseTable {
    /// The number to identify the state of LR(0) automaton.
    type State: Copy;

    /// The number to identify the terminal/nonterminal symbols.
    type Symbol: Copy;

    /// The context value corresponding to the matched production rule.
    type Reduce: Copy;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// If there is no lookahead symbol, a `None` is passed as the end of input.
    fn action(
        &self,
        current: Self::State,
        lookahead: Option<Self::Symbol>,
    ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce>;

    /// Return the state to transition to after a nonterminal symbol has been
    /// reduced in the specified state.
    fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State>;
}

// ポインタ越しにもテーブルとして扱えるようにする
macro_rules! forward_parse_table {
    ($($ptr:ty),*$(,)?) => {$(
        impl<T: ?Sized + ParseTable> ParseTable for $ptr {
            type State = T::State;
            type Symbol = T::Symbol;
            type Reduce = T::Reduce;

            #[inline]
            fn initial_state(&self) -> Self::State {
                (**self).initial_state()
            }

            #[inline]
            fn action(
                &self,
                current: Self::State,
                lookahead: Option<Self::Symbol>,
            ) -> ParseAction<Self::State, Self::Symbol, Self::Reduce> {
                (**self).action(current, lookahead)
            }

            #[inline]
            fn goto(&self, current: Self::State, symbol: Self::Symbol) -> Option<Self::State> {
                (**self).goto(current, symbol)
            }
        }
    )*};
}

forward_parse_table!(&T, Box<T>, std::rc::Rc<T>, std::sync::Arc<T>);

/// The action that the parser performs on a state and a lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq)]
#[non_exhaustive]
pub enum ParseAction<TState, TSymbol, TReduce> {
    /// Consume the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Replace the last `n` items on the stack with the left-hand side symbol.
    Reduce(TReduce, TSymbol, usize),

    /// Reduce by the start production. The input is accepted if the stack
    /// becomes empty by this reduction.
    Accept(TReduce, TSymbol, usize),

    Error(ParseActionError),
}

#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum ParseActionError {
    #[error("incorrect state")]
    IncorrectState,

    #[error("no action for the lookahead symbol")]
    IncorrectSymbol,
}
