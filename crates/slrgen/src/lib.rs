//! An SLR(1) parser generator.
//!
//! ```
//! let gen = slrgen::build(
//!     "
//!     S -> E
//!     E -> E + T
//!     E -> T
//!     T -> id
//!     T -> ( E )
//!     ",
//! )
//! .unwrap();
//! let tree = gen.parser().parse(["id", "+", "id"]).unwrap();
//! assert_eq!(tree.leaves(), ["id", "+", "id"]);
//! ```

pub mod first_sets;
pub mod follow_sets;
pub mod generator;
pub mod grammar;
pub mod lr0;
pub mod parser;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    generator::{BuildError, Generator},
    parser::{ParseError, ParseTree, Parser},
    table::Config,
};

/// Build an SLR(1) parser from the grammar source with the default configuration.
pub fn build(source: &str) -> Result<Generator, BuildError> {
    Generator::new(source)
}
