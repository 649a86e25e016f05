//! Detection of LR(0) conflicts.

use crate::{
    automaton::{Automaton, StateID},
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    util::display_fn,
};
use std::fmt;

/// An inconsistency found in a single state of the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A complete item coexists with transitions on terminal symbols.
    ShiftReduce {
        state: StateID,
        reduce: ProductionID,
        terminals: Vec<TerminalID>,
    },

    /// The state has complete items of more than one production.
    ReduceReduce {
        state: StateID,
        reduces: Vec<ProductionID>,
    },
}

impl Conflict {
    pub fn state(&self) -> StateID {
        match self {
            Self::ShiftReduce { state, .. } | Self::ReduceReduce { state, .. } => *state,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| match self {
            Self::ShiftReduce {
                state,
                reduce,
                terminals,
            } => {
                write!(
                    f,
                    "shift/reduce conflict in state {}: reduce by `{}' or shift on",
                    state,
                    g.production(*reduce).display(g)
                )?;
                for t in terminals {
                    write!(f, " `{}'", g.terminal_name(*t))?;
                }
                Ok(())
            }
            Self::ReduceReduce { state, reduces } => {
                write!(f, "reduce/reduce conflict in state {}:", state)?;
                for (i, reduce) in reduces.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or")?;
                    }
                    write!(f, " `{}'", g.production(*reduce).display(g))?;
                }
                Ok(())
            }
        })
    }
}

/// Collect the conflicts of every state, in state order.
pub fn conflicts(g: &Grammar, automaton: &Automaton) -> Vec<Conflict> {
    let mut conflicts = vec![];
    for state in automaton.states() {
        let mut reduces: Vec<ProductionID> =
            state.reduce_items(g).map(|item| item.production).collect();
        reduces.sort();
        reduces.dedup();
        if reduces.is_empty() {
            continue;
        }

        if reduces.len() > 1 {
            conflicts.push(Conflict::ReduceReduce {
                state: state.id(),
                reduces: reduces.clone(),
            });
        }

        let terminals: Vec<TerminalID> = state
            .transitions()
            .filter_map(|(symbol, _)| match symbol {
                SymbolID::T(t) => Some(t),
                SymbolID::N(..) => None,
            })
            .collect();
        if !terminals.is_empty() {
            for reduce in reduces {
                conflicts.push(Conflict::ShiftReduce {
                    state: state.id(),
                    reduce,
                    terminals: terminals.clone(),
                });
            }
        }
    }

    for conflict in &conflicts {
        tracing::debug!("{}", conflict.display(g));
    }
    conflicts
}

/// Whether no state of the automaton has a conflict.
pub fn is_lr0(g: &Grammar, automaton: &Automaton) -> bool {
    conflicts(g, automaton).is_empty()
}
