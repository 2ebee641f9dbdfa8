//! Grammar types.

use crate::{
    syntax,
    types::Map,
    util::{display_fn, write_separated},
};
use std::{fmt, fs, io, marker::PhantomData, path::Path};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolID {
    raw: u16,
}

impl SymbolID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    /// Reserved symbol that stands for the empty string.
    pub const EPSILON: Self = Self::new(1);

    const OFFSET: u16 = 2;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    fn from_index(index: usize) -> Self {
        assert!(index < u16::MAX as usize, "too many symbols");
        Self::new(index as u16)
    }

    fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EOI => write!(f, "S#End"),
            Self::EPSILON => write!(f, "S#Eps"),
            _ => write!(f, "S#{:03}", self.raw),
        }
    }
}

impl fmt::Display for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// A grammar symbol, identified by its name.
#[derive(Debug)]
pub struct Symbol {
    id: SymbolID,
    name: String,
    terminal: bool,
}

impl Symbol {
    pub fn id(&self) -> SymbolID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return `true` if this symbol never appears as a left-hand side.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Return `true` if this is one of the symbols created by the grammar itself.
    pub fn is_reserved(&self) -> bool {
        self.id.raw < SymbolID::OFFSET
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}

impl ProductionID {
    /// The production whose left-hand side is the start symbol of grammar.
    pub const START: Self = Self::new(0);

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    fn from_index(index: usize) -> Self {
        assert!(index < u16::MAX as usize, "too many production rules");
        Self::new(index as u16)
    }

    fn index(self) -> usize {
        self.raw as usize
    }
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.raw)
    }
}

impl fmt::Display for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: SymbolID,
    right: Vec<SymbolID>,
}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> SymbolID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} -> ", g.symbol(self.left))?;
            write_separated(f, self.right.iter().map(|r| g.symbol(*r)), " ")
        })
    }
}

/// A set of grammar symbols, mostly used for terminals.
#[derive(Debug, Default, Clone)]
pub struct SymbolSet {
    inner: bit_set::BitSet,
}

impl SymbolSet {
    pub fn contains(&self, id: SymbolID) -> bool {
        self.inner.contains(id.index())
    }

    pub fn insert(&mut self, id: SymbolID) -> bool {
        self.inner.insert(id.index())
    }

    /// Add all elements of `other` and return whether this set was changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.inner.iter().map(SymbolID::from_index)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            write_separated(f, self.iter().map(|id| g.symbol(id)), ", ")?;
            f.write_str("}")
        })
    }
}

impl FromIterator<SymbolID> for SymbolSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = SymbolID>,
    {
        Self {
            inner: iter.into_iter().map(SymbolID::index).collect(),
        }
    }
}

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
pub struct Grammar {
    symbols: Vec<Symbol>,
    symbol_ids: Map<String, SymbolID>,
    productions: Vec<Production>,
    productions_by_lhs: Map<SymbolID, Vec<ProductionID>>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## symbols:")?;
        for symbol in &self.symbols {
            let kind = if symbol.is_terminal() {
                "terminal"
            } else {
                "nonterminal"
            };
            write!(f, "{:02}: {} ({})", symbol.id, symbol, kind)?;
            if symbol.id == self.start_symbol() {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in &self.productions {
            writeln!(f, "{:02}: {}", production.id, production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    /// Read a grammar from its textual form, one `LHS -> sym ...` production per line.
    pub fn from_str(source: &str) -> Result<Grammar, GrammarDefError> {
        let rules = syntax::parse(source);
        Grammar::define(|g| {
            for rule in &rules {
                g.production(&rule.left, &rule.right);
            }
            Ok(())
        })
    }

    /// Define a grammar using the specified function.
    ///
    /// The left-hand side of the first production becomes the start symbol.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            symbols: vec![],
            symbol_ids: Map::default(),
            productions: vec![],
            productions_by_lhs: Map::default(),
            _marker: PhantomData,
        };

        let eoi = def.symbol(syntax::EOI);
        let epsilon = def.symbol(syntax::EPSILON);
        debug_assert_eq!(eoi, SymbolID::EOI);
        debug_assert_eq!(epsilon, SymbolID::EPSILON);

        f(&mut def)?;

        def.end()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter()
    }

    pub fn symbol(&self, id: SymbolID) -> &Symbol {
        &self.symbols[id.index()]
    }

    /// Resolve the symbol with the specified name.
    pub fn symbol_id(&self, name: &str) -> Option<SymbolID> {
        self.symbol_ids.get(name).copied()
    }

    pub fn is_terminal(&self, id: SymbolID) -> bool {
        self.symbol(id).is_terminal()
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.iter()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[id.index()]
    }

    /// Return the productions whose left-hand side is `left`, in definition order.
    pub fn productions_by_lhs(&self, left: SymbolID) -> &[ProductionID] {
        self.productions_by_lhs
            .get(&left)
            .map_or(&[][..], |ids| &ids[..])
    }

    pub fn start_symbol(&self) -> SymbolID {
        self.production(ProductionID::START).left()
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    symbols: Vec<Symbol>,
    symbol_ids: Map<String, SymbolID>,
    productions: Vec<Production>,
    productions_by_lhs: Map<SymbolID, Vec<ProductionID>>,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Resolve a symbol by its name.
    ///
    /// An unknown name is registered as a new terminal symbol.
    pub fn symbol(&mut self, name: &str) -> SymbolID {
        if let Some(id) = self.symbol_ids.get(name) {
            return *id;
        }

        let id = SymbolID::from_index(self.symbols.len());
        self.symbols.push(Symbol {
            id,
            name: name.to_owned(),
            terminal: true,
        });
        self.symbol_ids.insert(name.to_owned(), id);

        id
    }

    /// Specify a production rule into this grammer.
    ///
    /// The left-hand side symbol is turned into a nonterminal symbol.
    /// Empty right-hand sides are not supported and make [`Grammar::define`] fail.
    pub fn production<I>(&mut self, left: &str, right: I) -> ProductionID
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let left = self.symbol(left);
        let right = right
            .into_iter()
            .map(|name| self.symbol(name.as_ref()))
            .collect();
        self.symbols[left.index()].terminal = false;

        let id = ProductionID::from_index(self.productions.len());
        self.productions.push(Production { id, left, right });
        self.productions_by_lhs.entry(left).or_default().push(id);

        id
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        if self.productions.is_empty() {
            return Err(GrammarDefError::Empty);
        }

        if let Some(p) = self.productions.iter().find(|p| p.right.is_empty()) {
            let left = &self.symbols[p.left.index()].name;
            return Err(GrammarDefError::EmptyRightHandSide(left.clone()));
        }

        tracing::debug!(
            "defined grammar with {} symbols and {} productions",
            self.symbols.len(),
            self.productions.len()
        );

        Ok(Grammar {
            symbols: self.symbols,
            symbol_ids: self.symbol_ids,
            productions: self.productions,
            productions_by_lhs: self.productions_by_lhs,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("the grammar has no production rules")]
    Empty,

    #[error("the production rule of `{}' has an empty right-hand side", _0)]
    EmptyRightHandSide(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arithmetic() -> Grammar {
        Grammar::define(|g| {
            g.production("S", ["E"]);
            g.production("E", ["E", "+", "T"]);
            g.production("E", ["T"]);
            g.production("T", ["id"]);
            g.production("T", ["(", "E", ")"]);
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn reserved_symbols_come_first() {
        let g = arithmetic();
        assert_eq!(g.symbol_id("$"), Some(SymbolID::EOI));
        assert_eq!(g.symbol_id("^"), Some(SymbolID::EPSILON));
        assert!(g.symbol(SymbolID::EOI).is_terminal());
        assert!(g.symbol(SymbolID::EOI).is_reserved());
        assert!(!g.symbol(g.symbol_id("S").unwrap()).is_reserved());
    }

    #[test]
    fn symbols_are_numbered_by_first_appearance() {
        let g = arithmetic();
        let names: Vec<_> = g.symbols().map(|s| s.name()).collect();
        assert_eq!(names, ["$", "^", "S", "E", "+", "T", "id", "(", ")"]);
        for (i, symbol) in g.symbols().enumerate() {
            assert_eq!(symbol.id().into_raw() as usize, i);
        }
    }

    #[test]
    fn interning_is_idempotent() {
        Grammar::define(|g| {
            let a1 = g.symbol("a");
            let b = g.symbol("b");
            let a2 = g.symbol("a");
            assert_eq!(a1, a2);
            assert_ne!(a1, b);
            g.production("S", ["a", "b", "a"]);
            assert_eq!(g.symbol("a"), a1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn left_hand_side_becomes_nonterminal() {
        let g = Grammar::define(|g| {
            // `B` is seen on the right-hand side before its definition.
            g.production("A", ["B", "x"]);
            g.production("B", ["y"]);
            Ok(())
        })
        .unwrap();
        assert!(!g.is_terminal(g.symbol_id("A").unwrap()));
        assert!(!g.is_terminal(g.symbol_id("B").unwrap()));
        assert!(g.is_terminal(g.symbol_id("x").unwrap()));
        assert!(g.is_terminal(g.symbol_id("y").unwrap()));
    }

    #[test]
    fn productions_grouped_by_lhs() {
        let g = arithmetic();
        let e = g.symbol_id("E").unwrap();
        let t = g.symbol_id("T").unwrap();
        let ids = |ids: &[ProductionID]| ids.iter().map(|p| p.into_raw()).collect::<Vec<_>>();
        assert_eq!(ids(g.productions_by_lhs(e)), [1, 2]);
        assert_eq!(ids(g.productions_by_lhs(t)), [3, 4]);
        assert!(g.productions_by_lhs(SymbolID::EOI).is_empty());
        assert_eq!(g.start_symbol(), g.symbol_id("S").unwrap());
    }

    #[test]
    fn empty_grammar() {
        assert!(matches!(
            Grammar::define(|_| Ok(())),
            Err(GrammarDefError::Empty)
        ));
        assert!(matches!(
            Grammar::from_str("\n  \n garbage\n"),
            Err(GrammarDefError::Empty)
        ));
    }

    #[test]
    fn empty_right_hand_side() {
        let res = Grammar::define(|g| {
            g.production("S", ["A", "B", "c"]);
            g.production("A", ["a"]);
            g.production("B", Vec::<&str>::new());
            Ok(())
        });
        match res {
            Err(GrammarDefError::EmptyRightHandSide(left)) => assert_eq!(left, "B"),
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn display_production() {
        let g = arithmetic();
        let p = g.production(ProductionID::new(4));
        assert_eq!(p.display(&g).to_string(), "T -> ( E )");
    }

    #[test]
    fn symbol_set() {
        let g = arithmetic();
        let plus = g.symbol_id("+").unwrap();
        let id = g.symbol_id("id").unwrap();
        let mut set: SymbolSet = [id].into_iter().collect();
        assert!(set.insert(plus));
        assert!(!set.insert(plus));
        assert!(!set.union_with(&[id].into_iter().collect()));
        assert!(set.union_with(&[SymbolID::EOI].into_iter().collect()));
        assert_eq!(set.len(), 3);
        assert_eq!(set.display(&g).to_string(), "{$, +, id}");
    }
}
