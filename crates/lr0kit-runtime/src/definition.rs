//! Parser definition.

use std::fmt;

/// The terminal symbol appended to every input to mark its end.
pub const END_MARKER: &str = "#";

/// The number to identify the state of LR(0) automaton.
pub type StateIndex = usize;

/// The number to identify a production rule.
///
/// The production `0` is always the augmented start rule.
pub type ProductionIndex = usize;

/// The action that the parser performs in a state on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(StateIndex),

    /// Reduce to the specified production rule.
    Reduce(ProductionIndex),

    Accept,
}

impl Action {
    /// Choose between two actions recorded for the same table cell.
    ///
    /// `Accept` wins over `Shift`, `Shift` wins over `Reduce`, and among
    /// reductions the one with the lowest production number wins. Ties keep
    /// `self`.
    pub fn prefer(self, other: Self) -> Self {
        if other.rank() < self.rank() {
            other
        } else {
            self
        }
    }

    fn rank(self) -> (u8, usize) {
        match self {
            Self::Accept => (0, 0),
            Self::Shift(..) => (1, 0),
            Self::Reduce(production) => (2, production),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "s{}", next),
            Self::Reduce(production) => write!(f, "r{}", production),
            Self::Accept => f.write_str("acc"),
        }
    }
}

/// The trait for abstracting the action/goto table consumed by the parser.
pub trait ParseTable {
    /// Return the action corresponding to the specified state number and
    /// lookahead symbol, or `None` if the cell is empty.
    fn action(&self, current: StateIndex, lookahead: &str) -> Option<Action>;

    /// Return the state reached from `current` after reducing to `nonterminal`.
    fn goto(&self, current: StateIndex, nonterminal: &str) -> Option<StateIndex>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    fn action(&self, current: StateIndex, lookahead: &str) -> Option<Action> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: StateIndex, nonterminal: &str) -> Option<StateIndex> {
        (**self).goto(current, nonterminal)
    }
}

/// What the parser needs to know about a production in order to reduce by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Reduction<'a> {
    /// The left-hand side nonterminal.
    pub left: &'a str,
    /// The number of symbols on the right-hand side.
    pub arity: usize,
}

/// The trait for abstracting the production rules of a grammar.
pub trait ProductionSet {
    fn reduction(&self, production: ProductionIndex) -> Option<Reduction<'_>>;
}

impl<T: ?Sized> ProductionSet for &T
where
    T: ProductionSet,
{
    fn reduction(&self, production: ProductionIndex) -> Option<Reduction<'_>> {
        (**self).reduction(production)
    }
}

/// `(left, arity)` pairs indexed by production number.
impl<S> ProductionSet for [(S, usize)]
where
    S: AsRef<str>,
{
    fn reduction(&self, production: ProductionIndex) -> Option<Reduction<'_>> {
        self.get(production).map(|(left, arity)| Reduction {
            left: left.as_ref(),
            arity: *arity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_preference() {
        use Action::*;
        assert_eq!(Shift(3).prefer(Reduce(1)), Shift(3));
        assert_eq!(Reduce(1).prefer(Shift(3)), Shift(3));
        assert_eq!(Reduce(4).prefer(Reduce(2)), Reduce(2));
        assert_eq!(Reduce(2).prefer(Accept), Accept);
        assert_eq!(Shift(1).prefer(Shift(2)), Shift(1));
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Shift(12).to_string(), "s12");
        assert_eq!(Action::Reduce(0).to_string(), "r0");
        assert_eq!(Action::Accept.to_string(), "acc");
    }

    #[test]
    fn production_slice() {
        let productions = [("S'", 1), ("S", 3), ("S", 1)];
        let productions = &productions[..];
        assert_eq!(
            productions.reduction(1),
            Some(Reduction {
                left: "S",
                arity: 3
            })
        );
        assert_eq!(productions.reduction(3), None);
    }
}
