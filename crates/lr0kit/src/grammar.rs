//! Grammar types.

use crate::{
    syntax::{self, ast, SyntaxError},
    types::Map,
    util::display_fn,
};
use lr0kit_runtime::definition::{ProductionIndex, ProductionSet, Reduction, END_MARKER};
use std::{fmt, fs, io, marker::PhantomData, path::Path};

/// The name of the start symbol introduced by augmentation.
pub const AUGMENTED_START: &str = "S'";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}
impl NonterminalID {
    /// Reserved symbol used as the left-hand side of the augmented rule.
    pub const START: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}
impl ProductionID {
    /// The augmented rule `S' -> S`.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
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
    left: NonterminalID,
    right: Vec<SymbolID>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    pub fn is_epsilon(&self) -> bool {
        self.right.is_empty()
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} ->", g.nonterminal_name(self.left))?;
            if self.right.is_empty() {
                return f.write_str(" ε");
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// An augmented context-free grammar.
///
/// Once defined the grammar is never modified.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Vec<Production>,
    start_symbol: NonterminalID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for (_, name) in self.terminals() {
            writeln!(f, "{}", name)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (id, name) in self.nonterminals() {
            write!(f, "{}", name)?;
            if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in &self.productions {
            writeln!(f, "{}: {}", production.id, production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    pub fn from_str(source: &str) -> Result<Grammar, GrammarDefError> {
        let grammar = syntax::parse(source).map_err(GrammarDefError::Syntax)?;
        Grammar::define(|g| define_grammar_from_syntax(g, &grammar))
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: vec![],
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            _marker: PhantomData,
        };
        def.terminals.insert(TerminalID::EOI, END_MARKER.to_owned());
        def.nonterminals
            .insert(NonterminalID::START, AUGMENTED_START.to_owned());

        f(&mut def)?;

        def.end()
    }

    /// Iterate over the declared terminal symbols, without the end marker.
    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &str)> + '_ {
        self.terminals
            .iter()
            .filter(|(id, _)| **id != TerminalID::EOI)
            .map(|(id, name)| (*id, name.as_str()))
    }

    /// Iterate over the declared nonterminal symbols, without the augmented
    /// start symbol.
    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &str)> + '_ {
        self.nonterminals
            .iter()
            .filter(|(id, _)| **id != NonterminalID::START)
            .map(|(id, name)| (*id, name.as_str()))
    }

    /// All productions ordered by their ID, starting with the augmented rule.
    pub fn productions(&self) -> &[Production] {
        &self.productions[..]
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[usize::from(id.raw)]
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn terminal_name(&self, id: TerminalID) -> &str {
        &self.terminals[&id]
    }

    pub fn nonterminal_name(&self, id: NonterminalID) -> &str {
        &self.nonterminals[&id]
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal_name(t),
            SymbolID::N(n) => self.nonterminal_name(n),
        }
    }

    /// Look up a symbol by its name.
    pub fn find_symbol(&self, name: &str) -> Option<SymbolID> {
        self.terminals
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| SymbolID::T(*id))
            .or_else(|| {
                self.nonterminals
                    .iter()
                    .find(|(_, n)| *n == name)
                    .map(|(id, _)| SymbolID::N(*id))
            })
    }
}

impl ProductionSet for Grammar {
    fn reduction(&self, production: ProductionIndex) -> Option<Reduction<'_>> {
        let production = self.productions.get(production)?;
        Some(Reduction {
            left: self.nonterminal_name(production.left),
            arity: production.right.len(),
        })
    }
}

fn define_grammar_from_syntax(
    g: &mut GrammarDef<'_>,
    grammar: &ast::GrammarSource,
) -> Result<(), GrammarDefError> {
    let mut symbols = Map::<&str, SymbolID>::default();
    for name in &grammar.nonterminals {
        let id = g.nonterminal(name)?;
        symbols.insert(name.as_str(), SymbolID::N(id));
    }
    for name in &grammar.terminals {
        let id = g.terminal(name)?;
        symbols.insert(name.as_str(), SymbolID::T(id));
    }

    let lookup_nonterminal = |name: &str| match symbols.get(name) {
        Some(SymbolID::N(n)) => Ok(*n),
        Some(SymbolID::T(..)) => Err(GrammarDefError::NotNonterminal {
            name: name.to_owned(),
        }),
        None => Err(GrammarDefError::UnknownSymbol {
            name: name.to_owned(),
        }),
    };

    for production in &grammar.productions {
        let left = lookup_nonterminal(&production.left)?;
        let right = production
            .right
            .iter()
            .map(|name| {
                symbols
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| GrammarDefError::UnknownSymbol { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        g.rule(left, right)?;
    }

    let start = lookup_nonterminal(&grammar.start)?;
    g.start_symbol(start)?;

    Ok(())
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Vec<Production>,
    start: Option<NonterminalID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = TerminalID::new(self.next_terminal_id);
        self.next_terminal_id = self
            .next_terminal_id
            .checked_add(1)
            .ok_or(GrammarDefError::TooManySymbols)?;
        self.terminals.insert(id, name.to_owned());

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = NonterminalID::new(self.next_nonterminal_id);
        self.next_nonterminal_id = self
            .next_nonterminal_id
            .checked_add(1)
            .ok_or(GrammarDefError::TooManySymbols)?;
        self.nonterminals.insert(id, name.to_owned());

        Ok(id)
    }

    /// Specify a production rule into this grammer.
    ///
    /// Production rules are numbered in the order of declaration, starting at 1.
    /// A rule declared twice gets a second number.
    pub fn rule<I>(&mut self, left: NonterminalID, right: I) -> Result<ProductionID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<SymbolID> = right.into_iter().collect();

        if left == NonterminalID::START || !self.nonterminals.contains_key(&left) {
            return Err(GrammarDefError::UnknownSymbol {
                name: format!("{:?}", left),
            });
        }
        for symbol in &right {
            let declared = match symbol {
                SymbolID::T(t) => *t != TerminalID::EOI && self.terminals.contains_key(t),
                SymbolID::N(n) => *n != NonterminalID::START && self.nonterminals.contains_key(n),
            };
            if !declared {
                return Err(GrammarDefError::UnknownSymbol {
                    name: format!("{:?}", symbol),
                });
            }
        }

        let raw = u16::try_from(self.productions.len())
            .ok()
            .and_then(|n| n.checked_add(ProductionID::OFFSET))
            .ok_or(GrammarDefError::TooManySymbols)?;
        let id = ProductionID::from_raw(raw);
        self.productions.push(Production { id, left, right });

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        if symbol == NonterminalID::START || !self.nonterminals.contains_key(&symbol) {
            return Err(GrammarDefError::UnknownSymbol {
                name: format!("{:?}", symbol),
            });
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn verify_new_name(&self, name: &str) -> Result<(), GrammarDefError> {
        if !verify_name(name) {
            return Err(GrammarDefError::InvalidName {
                name: name.to_owned(),
            });
        }
        if self.terminals.values().any(|n| n == name)
            || self.nonterminals.values().any(|n| n == name)
        {
            return Err(GrammarDefError::DuplicateSymbol {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // Without an explicit start symbol, the first declared nonterminal is used.
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or(GrammarDefError::EmptyNonterminals)?,
        };

        self.productions.insert(
            0,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
            },
        );

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start_symbol: start,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(SyntaxError),

    #[error("invalid symbol name `{}'", name)]
    InvalidName { name: String },

    #[error("the symbol `{}' has already been declared", name)]
    DuplicateSymbol { name: String },

    #[error("unknown symbol `{}'", name)]
    UnknownSymbol { name: String },

    #[error("`{}' is not a nonterminal symbol", name)]
    NotNonterminal { name: String },

    #[error("empty nonterminal symbols")]
    EmptyNonterminals,

    #[error("too many symbols or production rules")]
    TooManySymbols,
}

fn verify_name(name: &str) -> bool {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return false;
    }
    if name == END_MARKER || name == AUGMENTED_START {
        // Reserved by the augmented grammar.
        return false;
    }
    // The arrow separates the two sides of a production in grammar files.
    !name.contains("->") && !name.contains('→')
}
