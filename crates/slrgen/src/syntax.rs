//! Reader for the textual grammar definition.
//!
//! A grammar is written as one production per line:
//!
//! ```text
//! S -> E
//! E -> E + T
//! E -> T
//! ```
//!
//! Symbols are separated by whitespace. Blank lines and lines that are not
//! of the form `LHS -> sym ...` are ignored. A line that mentions one of the
//! reserved names `$` or `^` is malformed as well, so `A -> ^` is skipped
//! rather than read as an empty production.

/// The name of the reserved end-of-input symbol.
pub const EOI: &str = "$";

/// The name of the reserved empty-string symbol.
pub const EPSILON: &str = "^";

const ARROW: &str = "->";

/// A production rule read from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDesc {
    pub left: String,
    pub right: Vec<String>,
}

pub fn parse(source: &str) -> Vec<RuleDesc> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut rules = vec![];
    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(rule) => {
                tracing::trace!("line {}: {:?}", i + 1, rule);
                rules.push(rule);
            }
            Err(reason) => {
                tracing::warn!("line {}: skipped ({}): {:?}", i + 1, reason, line);
            }
        }
    }
    rules
}

fn parse_line(line: &str) -> Result<RuleDesc, &'static str> {
    let (left, right) = line.split_once(ARROW).ok_or("missing `->'")?;

    let mut left_names = left.split_whitespace();
    let left = match (left_names.next(), left_names.next()) {
        (Some(left), None) => left,
        (None, _) => return Err("empty left-hand side"),
        (Some(..), Some(..)) => return Err("multiple symbols in left-hand side"),
    };

    let right: Vec<String> = right.split_whitespace().map(str::to_owned).collect();
    if right.is_empty() {
        return Err("empty right-hand side");
    }

    if is_reserved(left) || right.iter().any(|name| is_reserved(name)) {
        return Err("reserved symbol used");
    }

    Ok(RuleDesc {
        left: left.to_owned(),
        right,
    })
}

fn is_reserved(name: &str) -> bool {
    matches!(name, EOI | EPSILON) || name.contains(ARROW)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(left: &str, right: &[&str]) -> RuleDesc {
        RuleDesc {
            left: left.into(),
            right: right.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn smoketest() {
        let rules = parse(
            "
                S -> E
                E -> E + T
                E ->   T
                T -> id
                T -> ( E )
            ",
        );
        assert_eq!(
            rules,
            [
                rule("S", &["E"]),
                rule("E", &["E", "+", "T"]),
                rule("E", &["T"]),
                rule("T", &["id"]),
                rule("T", &["(", "E", ")"]),
            ]
        );
    }

    #[test]
    fn skip_malformed_lines() {
        let rules = parse(
            "
            A -> a
            no arrow here
            -> b
            B C -> c
            D ->
            E -> $ e
            H -> ^
            F -> f -> g
            G->g
            ",
        );
        assert_eq!(rules, [rule("A", &["a"]), rule("G", &["g"])]);
    }

    #[test]
    fn empty_source() {
        assert!(parse("").is_empty());
        assert!(parse("\n\t\n").is_empty());
    }
}
