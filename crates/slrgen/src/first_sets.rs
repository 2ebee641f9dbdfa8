//! Calculation of first set function.

use crate::{
    grammar::{Grammar, SymbolID, SymbolSet},
    util::display_fn,
};
use std::fmt;

/// `First(X)` for every single symbol `X` in the grammar.
#[derive(Debug)]
pub struct FirstSets {
    first_sets: Vec<SymbolSet>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        Self {
            first_sets: first_sets(grammar),
        }
    }

    /// `First(x)`
    pub fn get(&self, x: SymbolID) -> &SymbolSet {
        &self.first_sets[usize::from(x.into_raw())]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for symbol in g.symbols() {
                writeln!(
                    f,
                    "first({}) = {}",
                    symbol,
                    self.get(symbol.id()).display(g)
                )?;
            }
            Ok(())
        })
    }
}

fn first_sets(grammar: &Grammar) -> Vec<SymbolSet> {
    // terminal symbols については First(T) = {T} になる
    // nonterminal symbols は First(N) = {} と初期化する
    let mut sets: Vec<SymbolSet> = grammar
        .symbols()
        .map(|symbol| {
            if symbol.is_terminal() {
                Some(symbol.id()).into_iter().collect()
            } else {
                SymbolSet::default()
            }
        })
        .collect();

    // 制約条件の抽出
    // X -> Y1 Y2 ... Yn という構文規則に対し First(X) \supseteq First(Y1) という制約を追加する
    // (X = Y1 となる左再帰の規則は制約にならない)
    #[derive(Debug)]
    struct Constraint {
        sup: usize,
        sub: usize,
    }
    let constraints: Vec<Constraint> = grammar
        .productions()
        .filter_map(|production| {
            let first = *production.right().first()?;
            (first != production.left()).then(|| Constraint {
                sup: usize::from(production.left().into_raw()),
                sub: usize::from(first.into_raw()),
            })
        })
        .collect();

    // 制約条件の解消
    // 値が更新されなくなるまで、すべての制約条件について First(sub) の要素を First(sup) に追加する
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
