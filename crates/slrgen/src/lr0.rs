//! The canonical collection of LR(0) item sets.

use crate::{
    grammar::{Grammar, ProductionID, SymbolID},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);

impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }

    fn from_index(index: usize) -> Self {
        assert!(index < u16::MAX as usize, "too many LR(0) states");
        Self(index as u16)
    }

    fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The LR(0) item.
///
/// `X -> Y1 Y2 ... Yn` という構文規則に、認識済みの位置 (dot) を付与したもの
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub dot: usize,
}

impl Item {
    pub const fn new(production: ProductionID, dot: usize) -> Self {
        Self { production, dot }
    }

    /// Return the symbol just after the dot, or `None` if the item is complete.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production).right().get(self.dot).copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.dot >= g.production(self.production).right().len()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.symbol(production.left()))?;
            for (i, r) in production.right().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol(*r))?;
            }
            if self.dot == production.right().len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// A set of LR(0) items that remembers the insertion order.
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
    items: Set<Item>,
}

impl ItemSet {
    /// Add an item, returning `false` if it was already in the set.
    pub fn insert(&mut self, item: Item) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    /// The order-independent identity of this set.
    fn key(&self) -> Vec<Item> {
        let mut key: Vec<Item> = self.items.iter().copied().collect();
        key.sort_unstable();
        key
    }
}

impl PartialEq for ItemSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl Eq for ItemSet {}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// クロージャ展開
///
/// Items are visited in insertion order, including the ones added during
/// the expansion, so each item is expanded exactly once.
pub fn closure(g: &Grammar, mut items: ItemSet) -> ItemSet {
    let mut i = 0;
    while let Some(item) = items.items.get_index(i).copied() {
        i += 1;

        // [X -> ... . Y beta]
        //  Y: one nonterminal symbol
        let y = match item.next_symbol(g) {
            Some(y) if !g.is_terminal(y) => y,
            _ => continue,
        };
        for &production in g.productions_by_lhs(y) {
            items.insert(Item::new(production, 0));
        }
    }
    items
}

/// 指定したLRアイテム集合から `symbol` による遷移先のアイテム集合を求める
///
/// An empty set is returned if no item has `symbol` after its dot.
pub fn goto(g: &Grammar, items: &ItemSet, symbol: SymbolID) -> ItemSet {
    let kernels = items
        .iter()
        .filter(|item| item.next_symbol(g) == Some(symbol))
        .map(|item| Item::new(item.production, item.dot + 1))
        .collect();
    closure(g, kernels)
}

#[derive(Debug)]
pub struct State {
    id: StateID,
    items: ItemSet,
    transitions: Map<SymbolID, StateID>,
}

impl State {
    pub fn id(&self) -> StateID {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// The outgoing edges of this state, on both terminal and nonterminal symbols.
    pub fn transitions(&self) -> impl Iterator<Item = (SymbolID, StateID)> + '_ {
        self.transitions.iter().map(|(symbol, to)| (*symbol, *to))
    }

    pub fn transition(&self, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&symbol).copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            for item in self.items.iter() {
                writeln!(f, "- {}", item.display(g))?;
            }
            if !self.transitions.is_empty() {
                writeln!(f, "## transitions:")?;
                for (symbol, to) in &self.transitions {
                    writeln!(f, "- {} => {:02}", g.symbol(*symbol), to)?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct Automaton {
    states: Vec<State>,
}

impl Automaton {
    /// Calculate the LR(0) automaton based on the specified grammar.
    pub fn generate(g: &Grammar) -> Self {
        let start: ItemSet = Some(Item::new(ProductionID::START, 0))
            .into_iter()
            .collect();
        let start = closure(g, start);

        let mut isocores = Map::<Vec<Item>, StateID>::default();
        isocores.insert(start.key(), StateID::START);
        let mut states = vec![State {
            id: StateID::START,
            items: start,
            transitions: Map::default(),
        }];

        // 新規に状態が生成されなくなるまで、発見された順に遷移先を求める
        let mut current = 0;
        while current < states.len() {
            let mut transitions = Map::default();
            for symbol in g.symbols() {
                let items = goto(g, &states[current].items, symbol.id());
                if items.is_empty() {
                    continue;
                }

                let key = items.key();
                let next = match isocores.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = StateID::from_index(states.len());
                        isocores.insert(key, id);
                        states.push(State {
                            id,
                            items,
                            transitions: Map::default(),
                        });
                        id
                    }
                };
                tracing::trace!(
                    "goto({:?}, {}) = {:?}",
                    StateID::from_index(current),
                    symbol,
                    next
                );
                transitions.insert(symbol.id(), next);
            }
            states[current].transitions = transitions;
            current += 1;
        }

        tracing::debug!("generated LR(0) automaton with {} states", states.len());

        Self { states }
    }

    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.iter()
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.index()]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, state) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:02}", state.id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arithmetic() -> Grammar {
        Grammar::from_str(
            "
            S -> E
            E -> E + T
            E -> T
            T -> id
            T -> ( E )
            ",
        )
        .unwrap()
    }

    fn item_strings(g: &Grammar, items: &ItemSet) -> Vec<String> {
        items.iter().map(|item| item.display(g).to_string()).collect()
    }

    #[test]
    fn initial_state() {
        let g = arithmetic();
        let lr0 = Automaton::generate(&g);
        assert_eq!(
            item_strings(&g, lr0.state(StateID::START).items()),
            [
                "S -> . E",
                "E -> . E + T",
                "E -> . T",
                "T -> . id",
                "T -> . ( E )",
            ]
        );
    }

    #[test]
    fn arithmetic_states() {
        let g = arithmetic();
        let lr0 = Automaton::generate(&g);
        assert_eq!(lr0.len(), 9);

        let sym = |name: &str| g.symbol_id(name).unwrap();
        let start = lr0.state(StateID::START);
        let edges: Vec<_> = start
            .transitions()
            .map(|(symbol, to)| (g.symbol(symbol).name().to_owned(), to.into_raw()))
            .collect();
        assert_eq!(
            edges,
            [
                ("E".to_owned(), 1),
                ("T".to_owned(), 2),
                ("id".to_owned(), 3),
                ("(".to_owned(), 4),
            ]
        );

        // `(` の遷移先からも同じ状態へ戻ってくる
        let lparen = lr0.state(start.transition(sym("(")).unwrap());
        assert_eq!(lparen.transition(sym("(")), Some(lparen.id()));
        assert_eq!(lparen.transition(sym("id")), start.transition(sym("id")));
        assert_eq!(lparen.transition(sym(")")), None);
    }

    #[test]
    fn closure_is_idempotent() {
        let g = arithmetic();
        let lr0 = Automaton::generate(&g);
        for state in lr0.states() {
            let closed = closure(&g, state.items().clone());
            assert_eq!(&closed, state.items());
            assert_eq!(closed.len(), state.items().len());
        }
    }

    #[test]
    fn states_are_distinct() {
        let g = arithmetic();
        let lr0 = Automaton::generate(&g);
        for s1 in lr0.states() {
            for s2 in lr0.states().filter(|s2| s2.id() != s1.id()) {
                assert_ne!(s1.items(), s2.items());
            }
        }
    }

    #[test]
    fn goto_without_transition_is_empty() {
        let g = arithmetic();
        let lr0 = Automaton::generate(&g);
        let start = lr0.state(StateID::START).items();
        assert!(goto(&g, start, g.symbol_id(")").unwrap()).is_empty());
        assert!(goto(&g, start, SymbolID::EOI).is_empty());
    }

    #[test]
    fn item_set_equality_ignores_order() {
        let p = |raw| Item::new(ProductionID::START, raw);
        let a: ItemSet = [p(0), p(1), p(2)].into_iter().collect();
        let b: ItemSet = [p(2), p(0), p(1), p(0)].into_iter().collect();
        let c: ItemSet = [p(0), p(1)].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.key(), b.key());
    }
}
