//! Syntax support for grammar files.
//!
//! A grammar file lists, one item per line (blank lines are ignored):
//!
//! ```text
//! 3
//! E T F
//! 5
//! + * ( ) id
//! 6
//! E -> E + T
//! E -> T
//! T -> T * F
//! T -> F
//! F -> ( E )
//! F -> id
//! E
//! ```
//!
//! that is, the nonterminals, the terminals and the productions, each
//! preceded by its count, followed by the start symbol. `A ->` declares an
//! epsilon production, and `→` may be used in place of `->`.

pub mod ast;

use std::vec;

pub fn parse(source: &str) -> Result<ast::GrammarSource, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut lines = Lines::new(source);

    let nonterminals = lines.names("nonterminal")?;
    let terminals = lines.names("terminal")?;

    let (_, num_productions) = lines.count("production")?;
    let mut productions = Vec::with_capacity(num_productions);
    for _ in 0..num_productions {
        let (line, text) = lines.next_line("a production")?;
        productions.push(parse_production(line, text)?);
    }

    let (line, text) = lines.next_line("the start symbol")?;
    if contains_arrow(text) {
        return Err(SyntaxError::TooManyProductions {
            line,
            declared: num_productions,
        });
    }
    let mut words = text.split_whitespace();
    let start = match (words.next(), words.next()) {
        (Some(start), None) => start.to_owned(),
        _ => {
            return Err(SyntaxError::InvalidStartSymbol {
                line,
                found: text.to_owned(),
            })
        }
    };

    if let Some((line, rest)) = lines.next() {
        return Err(SyntaxError::TrailingContent {
            line,
            found: rest.to_owned(),
        });
    }

    tracing::trace!(
        "parsed {} nonterminals, {} terminals, {} productions",
        nonterminals.len(),
        terminals.len(),
        productions.len()
    );

    Ok(ast::GrammarSource {
        nonterminals,
        terminals,
        productions,
        start,
    })
}

fn contains_arrow(text: &str) -> bool {
    text.contains("->") || text.contains('→')
}

fn parse_production(line: usize, text: &str) -> Result<ast::ProductionDesc, SyntaxError> {
    let malformed = || SyntaxError::MalformedProduction {
        line,
        found: text.to_owned(),
    };

    let normalized = text.replace('→', "->");
    let (left, right) = normalized.split_once("->").ok_or_else(malformed)?;

    let mut left_words = left.split_whitespace();
    let left = match (left_words.next(), left_words.next()) {
        (Some(left), None) => left.to_owned(),
        _ => return Err(malformed()),
    };
    let right: Vec<String> = right.split_whitespace().map(str::to_owned).collect();
    if right.iter().any(|symbol| contains_arrow(symbol)) {
        return Err(malformed());
    }

    Ok(ast::ProductionDesc { left, right })
}

/// Non-blank, trimmed lines with their 1-based line numbers.
struct Lines<'s> {
    inner: vec::IntoIter<(usize, &'s str)>,
}

impl<'s> Lines<'s> {
    fn new(source: &'s str) -> Self {
        let lines: Vec<_> = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        Self {
            inner: lines.into_iter(),
        }
    }

    fn next(&mut self) -> Option<(usize, &'s str)> {
        self.inner.next()
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'s str), SyntaxError> {
        self.next().ok_or(SyntaxError::UnexpectedEnd { expected })
    }

    fn count(&mut self, what: &'static str) -> Result<(usize, usize), SyntaxError> {
        let (line, text) = self.next_line("a symbol or production count")?;
        let count = text.parse().map_err(|_| SyntaxError::InvalidCount {
            line,
            what,
            found: text.to_owned(),
        })?;
        Ok((line, count))
    }

    /// A count line followed by a line listing that many names.
    fn names(&mut self, what: &'static str) -> Result<Vec<String>, SyntaxError> {
        let (_, declared) = self.count(what)?;
        if declared == 0 {
            return Ok(vec![]);
        }
        let (line, text) = self.next_line("a list of symbol names")?;
        let names: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
        if names.len() != declared {
            return Err(SyntaxError::CountMismatch {
                line,
                what,
                declared,
                listed: names.len(),
            });
        }
        Ok(names)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected end of grammar, expecting {}", expected)]
    UnexpectedEnd { expected: &'static str },

    #[error("line {}: expected the number of {}s, found `{}'", line, what, found)]
    InvalidCount {
        line: usize,
        what: &'static str,
        found: String,
    },

    #[error("line {}: {} {}s declared but {} listed", line, declared, what, listed)]
    CountMismatch {
        line: usize,
        what: &'static str,
        declared: usize,
        listed: usize,
    },

    #[error(
        "line {}: malformed production `{}', expecting `LEFT -> R1 R2 ...'",
        line,
        found
    )]
    MalformedProduction { line: usize, found: String },

    #[error("line {}: more productions than the {} declared", line, declared)]
    TooManyProductions { line: usize, declared: usize },

    #[error("line {}: the start symbol must be a single name, found `{}'", line, found)]
    InvalidStartSymbol { line: usize, found: String },

    #[error("line {}: unexpected trailing content `{}'", line, found)]
    TrailingContent { line: usize, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPR: &str = "\
3
E T F
5
+ * ( ) id

6
E -> E + T
E -> T
T -> T * F
T -> F
F -> ( E )
F -> id
E
";

    #[test]
    fn expression_grammar() {
        let grammar = parse(EXPR).unwrap();
        assert_eq!(grammar.nonterminals, ["E", "T", "F"]);
        assert_eq!(grammar.terminals, ["+", "*", "(", ")", "id"]);
        assert_eq!(grammar.productions.len(), 6);
        assert_eq!(
            grammar.productions[4],
            ast::ProductionDesc {
                left: "F".into(),
                right: vec!["(".into(), "E".into(), ")".into()],
            }
        );
        assert_eq!(grammar.start, "E");
    }

    #[test]
    fn epsilon_and_unicode_arrow() {
        let grammar = parse("2\nS A\n1\nb\n2\nS → A b\n  A ->  \nS\n").unwrap();
        assert_eq!(grammar.productions[0].right, ["A", "b"]);
        assert_eq!(grammar.productions[1].left, "A");
        assert!(grammar.productions[1].right.is_empty());
    }

    #[test]
    fn zero_terminals() {
        let grammar = parse("1\nS\n0\n1\nS ->\nS\n").unwrap();
        assert!(grammar.terminals.is_empty());
        assert_eq!(grammar.productions.len(), 1);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse(""),
            Err(SyntaxError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("two\n"),
            Err(SyntaxError::InvalidCount { line: 1, .. })
        ));
        assert!(matches!(
            parse("2\nE\n"),
            Err(SyntaxError::CountMismatch {
                line: 2,
                declared: 2,
                listed: 1,
                ..
            })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE id\nE\n"),
            Err(SyntaxError::MalformedProduction { line: 6, .. })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE F -> id\nE\n"),
            Err(SyntaxError::MalformedProduction { line: 6, .. })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE -> id\n"),
            Err(SyntaxError::UnexpectedEnd {
                expected: "the start symbol"
            })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE -> id\nE -> E id\nE\n"),
            Err(SyntaxError::TooManyProductions { line: 7, declared: 1 })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE -> id\nE T\n"),
            Err(SyntaxError::InvalidStartSymbol { line: 7, .. })
        ));
        assert!(matches!(
            parse("1\nE\n1\nid\n1\nE -> id\nE\nid\n"),
            Err(SyntaxError::TrailingContent { line: 8, .. })
        ));
    }
}
