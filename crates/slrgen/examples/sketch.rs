use slrgen::{grammar::Grammar, table::Config, Generator};
use slrgen_runtime::parser::{ParseEvent, ParseItem, Parser, Token};
use std::convert::Infallible;

#[derive(Debug, Copy, Clone)]
struct Tok(slrgen::grammar::SymbolID);

impl Token<slrgen::grammar::SymbolID> for Tok {
    fn as_symbol(&self) -> slrgen::grammar::SymbolID {
        self.0
    }
}

fn main() -> anyhow::Result<()> {
    // 文法定義
    let grammar = Grammar::define(|g| {
        g.production("A", ["E", "=", "E"]);
        g.production("E", ["E", "+", "T"]);
        g.production("E", ["T"]);
        g.production("T", ["NUM"]);
        g.production("T", ["ID"]);
        Ok(())
    })?;
    println!("{}", grammar);

    let gen = Generator::from_grammar(grammar, &Config::new())?;
    let g = gen.grammar();
    println!("{}", gen.display_sets());
    println!("{}", gen.table().display(g));

    // NUM + ID = NUM
    let mut tokens = ["NUM", "+", "ID", "=", "NUM"]
        .into_iter()
        .map(|name| {
            let id = g
                .symbol_id(name)
                .ok_or_else(|| anyhow::anyhow!("unknown token: {}", name))?;
            Ok::<_, anyhow::Error>(Tok(id))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(Ok::<_, Infallible>);

    let mut parser = Parser::new(gen.parser());
    let mut args = vec![];
    loop {
        let event = parser.next_event(&mut tokens, &mut args)?;
        let (ParseEvent::Reduce(id) | ParseEvent::Accept(id)) = event;
        let production = g.production(id);
        print!("{} <-", g.symbol(production.left()));
        for arg in &args {
            match arg {
                ParseItem::T(Tok(t)) => print!(" '{}'", g.symbol(*t)),
                ParseItem::N(n) => print!(" {}", g.symbol(*n)),
                _ => (),
            }
        }
        println!();

        if let ParseEvent::Accept(..) = event {
            break;
        }
    }

    Ok(())
}
