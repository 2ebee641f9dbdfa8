use slrgen::{
    table::{Config, TableError},
    BuildError, Generator, ParseError,
};
use std::{env, path::PathBuf};
use tracing_subscriber::EnvFilter;

fn grammar_path(name: &str) -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join(format!("tests/{}.g", name))
}

fn load(name: &str) -> Generator {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Generator::from_file(grammar_path(name), &Config::new()).unwrap()
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let gen = load(stringify!($name));
            assert!(gen.table().conflicts().is_empty());
            assert_eq!(gen.table().rows().count(), gen.automaton().len());
        }
    )*};
}

define_tests! {
    arithmetic,
    arithmetic_prec,
    list,
    mutual,
    stmts,
}

#[track_caller]
fn assert_accepts(gen: &Generator, input: &str) {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    match gen.parser().parse(&tokens) {
        Ok(tree) => assert_eq!(tree.leaves(), tokens),
        Err(err) => panic!("rejected {:?}: {}", input, err),
    }
}

#[track_caller]
fn assert_rejects(gen: &Generator, input: &str) {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if let Ok(tree) = gen.parser().parse(&tokens) {
        panic!("accepted {:?}:\n{}", input, tree);
    }
}

#[test]
fn parse_arithmetic() {
    let gen = load("arithmetic");
    assert_accepts(&gen, "id");
    assert_accepts(&gen, "id + ( id + id )");
    assert_accepts(&gen, "( ( id ) ) + id + id");
    assert_rejects(&gen, "");
    assert_rejects(&gen, "id +");
    assert_rejects(&gen, "+ id");
    assert_rejects(&gen, "( id");
    assert_rejects(&gen, "id id");
}

#[test]
fn parse_arithmetic_prec() {
    let gen = load("arithmetic_prec");
    assert_accepts(&gen, "num + num * num");
    assert_accepts(&gen, "- - num / ( num - num )");
    assert_rejects(&gen, "num * * num");

    // `*` は `+` よりも強く結合する
    let tree = gen
        .parser()
        .parse(["num", "+", "num", "*", "num"])
        .unwrap();
    let e = &tree.children()[0];
    assert_eq!(e.label(), "E");
    assert_eq!(e.children()[1].label(), "+");
    assert_eq!(e.children()[2].leaves(), ["num", "*", "num"]);
}

#[test]
fn parse_left_recursive_start_symbol() {
    let gen = load("list");
    assert_accepts(&gen, "item");
    assert_accepts(&gen, "item , item , item");
    assert_rejects(&gen, "item ,");
    assert_rejects(&gen, ", item");
}

#[test]
fn parse_mutual_recursion() {
    let gen = load("mutual");
    assert_accepts(&gen, "x z");
    assert_accepts(&gen, "x y x y x z");
    assert_rejects(&gen, "x y z");
}

#[test]
fn parse_statements() {
    let gen = load("stmts");
    assert_accepts(&gen, "id = id ;");
    assert_accepts(&gen, "id = id + id ; { id = id ; { id = id ; } }");
    assert_rejects(&gen, "{ }");
    assert_rejects(&gen, "id = ;");
}

#[test]
fn unknown_token() {
    let gen = load("arithmetic");
    assert!(matches!(
        gen.parser().parse(["id", "+", "["]),
        Err(ParseError::UnknownToken(..))
    ));
}

#[test]
fn ambiguous_grammar() {
    let path = grammar_path("ambiguous");
    match Generator::from_file(&path, &Config::new()) {
        Err(BuildError::Table(TableError::Conflicts(conflicts))) => {
            assert!(!conflicts.is_empty())
        }
        res => panic!("unexpected result: {:?}", res.map(|_| ())),
    }

    let gen = Generator::from_file(&path, Config::new().last_write_wins()).unwrap();
    assert!(!gen.table().conflicts().is_empty());
    assert_accepts(&gen, "id + id * id");
}
