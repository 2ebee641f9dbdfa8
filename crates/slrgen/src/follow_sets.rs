//! Calculation of follow set function.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, SymbolID, SymbolSet},
    util::display_fn,
};
use std::fmt;

/// `Follow(N)` for every nonterminal symbol `N` in the grammar.
///
/// The follow sets of terminal symbols are always empty.
#[derive(Debug)]
pub struct FollowSets {
    follow_sets: Vec<SymbolSet>,
}

impl FollowSets {
    pub fn new(grammar: &Grammar, first_sets: &FirstSets) -> Self {
        Self {
            follow_sets: follow_sets(grammar, first_sets),
        }
    }

    /// `Follow(n)`
    pub fn get(&self, n: SymbolID) -> &SymbolSet {
        &self.follow_sets[usize::from(n.into_raw())]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for symbol in g.symbols().filter(|s| !s.is_terminal()) {
                writeln!(
                    f,
                    "follow({}) = {}",
                    symbol,
                    self.get(symbol.id()).display(g)
                )?;
            }
            Ok(())
        })
    }
}

fn follow_sets(grammar: &Grammar, first_sets: &FirstSets) -> Vec<SymbolSet> {
    let mut sets = vec![SymbolSet::default(); grammar.symbols().count()];
    let index = |id: SymbolID| usize::from(id.into_raw());

    // 開始記号の後には入力の終端が続く
    sets[index(grammar.start_symbol())].insert(SymbolID::EOI);

    // X Y という並びが右辺に現れるなら Follow(X) \supseteq First(Y)
    for production in grammar.productions() {
        for pair in production.right().windows(2) {
            let (x, y) = (pair[0], pair[1]);
            if !grammar.is_terminal(x) {
                sets[index(x)].union_with(first_sets.get(y));
            }
        }
    }

    // X -> ... Y という構文規則に対し Follow(Y) \supseteq Follow(X) という制約を追加する
    // (X = Y となる右再帰の規則は制約にならない)
    #[derive(Debug)]
    struct Constraint {
        sup: usize,
        sub: usize,
    }
    let constraints: Vec<Constraint> = grammar
        .productions()
        .filter_map(|production| {
            let last = *production.right().last()?;
            (!grammar.is_terminal(last) && last != production.left()).then(|| Constraint {
                sup: index(last),
                sub: index(production.left()),
            })
        })
        .collect();

    // 値が更新されなくなるまで繰り返す
    let mut changed = true;
    while changed {
        changed = false;
        for Constraint { sup, sub } in &constraints {
            let subset = sets[*sub].clone();
            changed |= sets[*sup].union_with(&subset);
        }
    }

    sets
}
