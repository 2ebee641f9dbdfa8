use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use slrgen::{table::Config, Generator};
use std::{path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Resolve conflicts by keeping the action written last instead of failing.
    #[arg(long)]
    allow_conflicts: bool,

    /// Print the intermediate results of the generator.
    #[arg(long, value_enum)]
    dump: Vec<Dump>,

    /// The path of grammar definition file.
    input: PathBuf,

    /// The terminal names to be parsed with the generated table.
    tokens: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Dump {
    Grammar,
    Sets,
    Automaton,
    Table,
    All,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let mut config = Config::new();
    if args.allow_conflicts {
        config.last_write_wins();
    }

    let s = Instant::now();
    let gen = Generator::from_file(&args.input, &config)
        .context("failed to generate the parse table")?;
    tracing::info!("generate: {:?} elapsed", s.elapsed());

    let dumps = |kind: Dump| args.dump.contains(&kind) || args.dump.contains(&Dump::All);
    let g = gen.grammar();
    if dumps(Dump::Grammar) {
        println!("{}", g);
    }
    if dumps(Dump::Sets) {
        println!("{}", gen.display_sets());
    }
    if dumps(Dump::Automaton) {
        println!("{}", gen.automaton().display(g));
    }
    if dumps(Dump::Table) {
        println!("{}", gen.table().display(g));
    }

    for conflict in gen.table().conflicts() {
        println!("[warning] {}", conflict.display(g));
    }

    if !args.tokens.is_empty() {
        let s = Instant::now();
        let tree = gen
            .parser()
            .parse(&args.tokens)
            .context("failed to parse the input tokens")?;
        tracing::info!("parse: {:?} elapsed", s.elapsed());
        print!("{}", tree);
    }

    Ok(())
}
