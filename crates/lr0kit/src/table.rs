//! Compilation of the LR(0) automaton into a parse table.

use crate::{
    automaton::Automaton,
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
};
use lr0kit_runtime::{
    definition::Action,
    table::{ActionRow, CompiledTable, GotoRow},
};

/// Build the action and goto rows of every state.
///
/// Conflicting actions are all kept as separate rows for the same cell, and
/// are resolved when the table is consulted.
pub fn compile(g: &Grammar, automaton: &Automaton) -> CompiledTable {
    let span = tracing::trace_span!("compile_table");
    let _entered = span.enter();

    let end_marker = g.terminal_name(TerminalID::EOI);

    let mut actions = vec![];
    let mut gotos = vec![];
    for state in automaton.states() {
        let current = state.id().into_raw();

        for (symbol, next) in state.transitions() {
            if let SymbolID::T(..) = symbol {
                actions.push(ActionRow::new(
                    current,
                    g.symbol_name(symbol),
                    Action::Shift(next.into_raw()),
                ));
            }
        }

        let mut reduces: Vec<ProductionID> =
            state.reduce_items(g).map(|item| item.production).collect();
        reduces.sort();
        reduces.dedup();
        for production in reduces {
            if production == ProductionID::ACCEPT {
                actions.push(ActionRow::new(current, end_marker, Action::Accept));
                continue;
            }
            let reduce = Action::Reduce(usize::from(production.into_raw()));
            for (_, name) in g.terminals() {
                actions.push(ActionRow::new(current, name, reduce));
            }
            actions.push(ActionRow::new(current, end_marker, reduce));
        }

        for (symbol, next) in state.transitions() {
            if let SymbolID::N(..) = symbol {
                gotos.push(GotoRow::new(current, g.symbol_name(symbol), next.into_raw()));
            }
        }
    }

    let table = CompiledTable::new(actions, gotos);
    tracing::debug!(
        "compiled {} action rows and {} goto rows",
        table.actions().len(),
        table.gotos().len()
    );
    table
}
