//! Runtime implementation for `slrgen` parser generator.
//!
//! The parser in this crate knows nothing about grammars; it replays
//! a [`ParseTable`](definition::ParseTable) against a token stream.

pub mod definition;
pub mod parser;
