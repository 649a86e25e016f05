//! The compiled parse table and its text representation.
//!
//! ```text
//! <number of action rows>
//! <state> <symbol> <s<N> | r<N> | acc>
//! ...
//! <number of goto rows>
//! <state> <symbol> <target>
//! ...
//! ```

use crate::{
    definition::{Action, ParseTable, StateIndex},
    Map,
};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRow {
    pub state: StateIndex,
    pub symbol: String,
    pub action: Action,
}

impl ActionRow {
    pub fn new(state: StateIndex, symbol: impl Into<String>, action: Action) -> Self {
        Self {
            state,
            symbol: symbol.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoRow {
    pub state: StateIndex,
    pub symbol: String,
    pub target: StateIndex,
}

impl GotoRow {
    pub fn new(state: StateIndex, symbol: impl Into<String>, target: StateIndex) -> Self {
        Self {
            state,
            symbol: symbol.into(),
            target,
        }
    }
}

/// A flattened action/goto table.
///
/// The rows are kept exactly as compiled, including several rows for the
/// same `(state, symbol)` cell when the source grammar has conflicts.
/// Lookups resolve such cells with [`Action::prefer`].
#[derive(Debug, Default, Clone)]
pub struct CompiledTable {
    actions: Vec<ActionRow>,
    gotos: Vec<GotoRow>,
    action_index: Map<StateIndex, Map<String, Action>>,
    goto_index: Map<StateIndex, Map<String, StateIndex>>,
}

impl PartialEq for CompiledTable {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions && self.gotos == other.gotos
    }
}
impl Eq for CompiledTable {}

impl CompiledTable {
    /// Create a table from the given rows, sorting them by `(state, symbol)`.
    ///
    /// The sort is stable, so rows sharing a cell keep their relative order.
    pub fn new(mut actions: Vec<ActionRow>, mut gotos: Vec<GotoRow>) -> Self {
        actions.sort_by(|a, b| (a.state, &a.symbol).cmp(&(b.state, &b.symbol)));
        gotos.sort_by(|a, b| (a.state, &a.symbol).cmp(&(b.state, &b.symbol)));

        let mut action_index: Map<StateIndex, Map<String, Action>> = Map::default();
        for row in &actions {
            let cells = action_index.entry(row.state).or_default();
            match cells.get_mut(row.symbol.as_str()) {
                Some(action) => *action = action.prefer(row.action),
                None => {
                    cells.insert(row.symbol.clone(), row.action);
                }
            }
        }

        let mut goto_index: Map<StateIndex, Map<String, StateIndex>> = Map::default();
        for row in &gotos {
            let cells = goto_index.entry(row.state).or_default();
            if cells.contains_key(row.symbol.as_str()) {
                tracing::debug!(
                    "ignoring duplicate goto row: {} {} {}",
                    row.state,
                    row.symbol,
                    row.target
                );
                continue;
            }
            cells.insert(row.symbol.clone(), row.target);
        }

        Self {
            actions,
            gotos,
            action_index,
            goto_index,
        }
    }

    pub fn actions(&self) -> &[ActionRow] {
        &self.actions[..]
    }

    pub fn gotos(&self) -> &[GotoRow] {
        &self.gotos[..]
    }

    /// Return the `(state, symbol)` cells that carry more than one action row.
    pub fn ambiguous_cells(&self) -> Vec<(StateIndex, &str)> {
        let mut cells: Vec<(StateIndex, &str)> = vec![];
        for pair in self.actions.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.state == b.state && a.symbol == b.symbol {
                let cell = (a.state, a.symbol.as_str());
                if cells.last() != Some(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

impl ParseTable for CompiledTable {
    fn action(&self, current: StateIndex, lookahead: &str) -> Option<Action> {
        self.action_index.get(&current)?.get(lookahead).copied()
    }

    fn goto(&self, current: StateIndex, nonterminal: &str) -> Option<StateIndex> {
        self.goto_index.get(&current)?.get(nonterminal).copied()
    }
}

impl fmt::Display for CompiledTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.actions.len())?;
        for row in &self.actions {
            writeln!(f, "{} {} {}", row.state, row.symbol, row.action)?;
        }
        writeln!(f, "{}", self.gotos.len())?;
        for row in &self.gotos {
            writeln!(f, "{} {} {}", row.state, row.symbol, row.target)?;
        }
        Ok(())
    }
}

impl FromStr for CompiledTable {
    type Err = TableFormatError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (line, count) = lines.next().ok_or(TableFormatError::UnexpectedEnd {
            expected: "the number of action rows",
        })?;
        let num_actions = parse_count(line, count)?;
        let mut actions = Vec::with_capacity(num_actions);
        for _ in 0..num_actions {
            let (line, row) = lines
                .next()
                .ok_or(TableFormatError::UnexpectedEnd {
                    expected: "an action row",
                })?;
            let [state, symbol, action] = split_row(line, row, "action")?;
            let action = parse_action(action).ok_or_else(|| TableFormatError::InvalidAction {
                line,
                found: action.to_owned(),
            })?;
            actions.push(ActionRow::new(parse_state(line, state)?, symbol, action));
        }

        let (line, count) = lines.next().ok_or(TableFormatError::UnexpectedEnd {
            expected: "the number of goto rows",
        })?;
        let num_gotos = parse_count(line, count)?;
        let mut gotos = Vec::with_capacity(num_gotos);
        for _ in 0..num_gotos {
            let (line, row) = lines.next().ok_or(TableFormatError::UnexpectedEnd {
                expected: "a goto row",
            })?;
            let [state, symbol, target] = split_row(line, row, "goto")?;
            gotos.push(GotoRow::new(
                parse_state(line, state)?,
                symbol,
                parse_state(line, target)?,
            ));
        }

        if let Some((line, rest)) = lines.next() {
            return Err(TableFormatError::TrailingContent {
                line,
                found: rest.to_owned(),
            });
        }

        Ok(Self::new(actions, gotos))
    }
}

fn parse_count(line: usize, s: &str) -> Result<usize, TableFormatError> {
    s.parse().map_err(|_| TableFormatError::InvalidCount {
        line,
        found: s.to_owned(),
    })
}

fn parse_state(line: usize, s: &str) -> Result<StateIndex, TableFormatError> {
    s.parse().map_err(|_| TableFormatError::InvalidState {
        line,
        found: s.to_owned(),
    })
}

fn split_row<'s>(
    line: usize,
    row: &'s str,
    kind: &'static str,
) -> Result<[&'s str; 3], TableFormatError> {
    let mut fields = row.split_whitespace();
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(a), Some(b), Some(c), None) => Ok([a, b, c]),
        _ => Err(TableFormatError::MalformedRow {
            line,
            kind,
            found: row.to_owned(),
        }),
    }
}

fn parse_action(s: &str) -> Option<Action> {
    if s == "acc" {
        return Some(Action::Accept);
    }
    if let Some(next) = s.strip_prefix('s') {
        return next.parse().ok().map(Action::Shift);
    }
    if let Some(production) = s.strip_prefix('r') {
        return production.parse().ok().map(Action::Reduce);
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum TableFormatError {
    #[error("unexpected end of table, expecting {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("line {line}: invalid row count `{found}'")]
    InvalidCount { line: usize, found: String },

    #[error("line {line}: invalid state number `{found}'")]
    InvalidState { line: usize, found: String },

    #[error("line {line}: malformed {kind} row `{found}', expecting three fields")]
    MalformedRow {
        line: usize,
        kind: &'static str,
        found: String,
    },

    #[error("line {line}: invalid action `{found}'")]
    InvalidAction { line: usize, found: String },

    #[error("line {line}: unexpected trailing content `{found}'")]
    TrailingContent { line: usize, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENS: &str = "\
6
0 ( s1
0 a s3
1 ( s1
1 a s3
2 # acc
3 # r2
2
0 S 2
1 S 4
";

    #[test]
    fn read_and_write() {
        let table: CompiledTable = PARENS.parse().unwrap();
        assert_eq!(table.actions().len(), 6);
        assert_eq!(table.gotos().len(), 2);
        assert_eq!(table.action(0, "("), Some(Action::Shift(1)));
        assert_eq!(table.action(2, "#"), Some(Action::Accept));
        assert_eq!(table.action(3, "#"), Some(Action::Reduce(2)));
        assert_eq!(table.action(3, "a"), None);
        assert_eq!(table.goto(1, "S"), Some(4));
        assert_eq!(table.goto(2, "S"), None);
        assert_eq!(table.to_string(), PARENS);
    }

    #[test]
    fn tolerates_blank_lines_and_indentation() {
        let source = "\n2\n  0   (  s1\n\n  2   #  acc\n1\n  0   S   2\n\n";
        let table: CompiledTable = source.parse().unwrap();
        assert_eq!(table.action(0, "("), Some(Action::Shift(1)));
        assert_eq!(table.goto(0, "S"), Some(2));
    }

    #[test]
    fn rows_are_sorted() {
        let table = CompiledTable::new(
            vec![
                ActionRow::new(1, "b", Action::Reduce(1)),
                ActionRow::new(0, "b", Action::Shift(1)),
                ActionRow::new(1, "#", Action::Reduce(1)),
            ],
            vec![],
        );
        let keys: Vec<_> = table
            .actions()
            .iter()
            .map(|row| (row.state, row.symbol.as_str()))
            .collect();
        assert_eq!(keys, [(0, "b"), (1, "#"), (1, "b")]);
    }

    #[test]
    fn duplicate_cells_are_kept_and_resolved() {
        let table = CompiledTable::new(
            vec![
                ActionRow::new(4, "+", Action::Shift(3)),
                ActionRow::new(4, "+", Action::Reduce(1)),
                ActionRow::new(4, "#", Action::Reduce(2)),
                ActionRow::new(4, "#", Action::Reduce(1)),
            ],
            vec![],
        );
        assert_eq!(table.actions().len(), 4);
        assert_eq!(table.action(4, "+"), Some(Action::Shift(3)));
        assert_eq!(table.action(4, "#"), Some(Action::Reduce(1)));
        assert_eq!(table.ambiguous_cells(), [(4, "#"), (4, "+")]);

        let reloaded: CompiledTable = table.to_string().parse().unwrap();
        assert_eq!(reloaded, table);
        assert_eq!(reloaded.action(4, "+"), Some(Action::Shift(3)));
    }

    #[test]
    fn malformed_tables() {
        assert!(matches!(
            "".parse::<CompiledTable>(),
            Err(TableFormatError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            "x\n".parse::<CompiledTable>(),
            Err(TableFormatError::InvalidCount { line: 1, .. })
        ));
        assert!(matches!(
            "2\n0 a s1\n".parse::<CompiledTable>(),
            Err(TableFormatError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            "1\n0 a x1\n0\n".parse::<CompiledTable>(),
            Err(TableFormatError::InvalidAction { line: 2, .. })
        ));
        assert!(matches!(
            "1\n0 a\n0\n".parse::<CompiledTable>(),
            Err(TableFormatError::MalformedRow { line: 2, .. })
        ));
        assert!(matches!(
            "0\n1\nq S 2\n".parse::<CompiledTable>(),
            Err(TableFormatError::InvalidState { line: 3, .. })
        ));
        assert!(matches!(
            "0\n0\nextra\n".parse::<CompiledTable>(),
            Err(TableFormatError::TrailingContent { line: 3, .. })
        ));
    }
}
