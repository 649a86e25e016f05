//! The table-driven LR parser.

use crate::definition::{
    Action, ParseTable, ProductionIndex, ProductionSet, StateIndex, END_MARKER,
};

/// A single parse run over one token sequence.
///
/// The parser is driven one action at a time by [`Parser::step`], and the
/// stacks and remaining input can be inspected between steps.
#[derive(Debug)]
pub struct Parser<TTable, TProds>
where
    TTable: ParseTable,
    TProds: ProductionSet,
{
    table: TTable,
    productions: TProds,
    state_stack: Vec<StateIndex>,
    symbol_stack: Vec<String>,
    input: Vec<String>,
    cursor: usize,
    status: ParserStatus,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ParserStatus {
    Running,
    Accepted,
    Failed,
}

/// The action performed by one step of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Shift {
        token: String,
        next: StateIndex,
    },
    Reduce {
        production: ProductionIndex,
        left: String,
        arity: usize,
        next: StateIndex,
    },
    Accept,
}

impl Step {
    pub fn action(&self) -> Action {
        match self {
            Self::Shift { next, .. } => Action::Shift(*next),
            Self::Reduce { production, .. } => Action::Reduce(*production),
            Self::Accept => Action::Accept,
        }
    }
}

impl<TTable, TProds> Parser<TTable, TProds>
where
    TTable: ParseTable,
    TProds: ProductionSet,
{
    /// Create a parser for the given tokens. The end marker is appended
    /// automatically.
    pub fn new<I>(table: TTable, productions: TProds, tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut input: Vec<String> = tokens.into_iter().map(Into::into).collect();
        input.push(END_MARKER.to_owned());
        Self {
            table,
            productions,
            state_stack: vec![0],
            symbol_stack: vec![],
            input,
            cursor: 0,
            status: ParserStatus::Running,
        }
    }

    pub fn state_stack(&self) -> &[StateIndex] {
        &self.state_stack[..]
    }

    pub fn symbol_stack(&self) -> &[String] {
        &self.symbol_stack[..]
    }

    /// The tokens not consumed yet, including the end marker.
    pub fn remaining_input(&self) -> &[String] {
        self.input.get(self.cursor..).unwrap_or(&[])
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ParserStatus::Accepted
    }

    /// Perform one action.
    ///
    /// Once the parser has accepted or failed, every later call returns an
    /// error without touching the stacks.
    pub fn step(&mut self) -> Result<Step, ParseError> {
        match self.status {
            ParserStatus::Running => (),
            ParserStatus::Accepted => return Err(ParseError::AlreadyAccepted),
            ParserStatus::Failed => return Err(ParseError::AlreadyFailed),
        }

        let result = self.step_inner();
        match &result {
            Ok(Step::Accept) => self.status = ParserStatus::Accepted,
            Ok(step) => tracing::trace!("{:?} -> {:?}", step, self.state_stack),
            Err(err) => {
                tracing::debug!("parse failed: {}", err);
                self.status = ParserStatus::Failed;
            }
        }
        result
    }

    fn step_inner(&mut self) -> Result<Step, ParseError> {
        let current = self
            .state_stack
            .last()
            .copied()
            .ok_or(ParseError::EmptyStateStack)?;
        let lookahead = self
            .input
            .get(self.cursor)
            .ok_or(ParseError::UnexpectedEndOfInput)?;

        match self.table.action(current, lookahead) {
            None => Err(ParseError::UndefinedAction {
                state: current,
                lookahead: lookahead.clone(),
            }),

            Some(Action::Accept) => Ok(Step::Accept),

            Some(Action::Shift(next)) => {
                let token = lookahead.clone();
                self.symbol_stack.push(token.clone());
                self.state_stack.push(next);
                self.cursor += 1;
                Ok(Step::Shift { token, next })
            }

            Some(Action::Reduce(production)) => {
                let reduction = self
                    .productions
                    .reduction(production)
                    .ok_or(ParseError::UnknownProduction { production })?;
                let arity = reduction.arity;
                if arity >= self.state_stack.len() || arity > self.symbol_stack.len() {
                    return Err(ParseError::StackUnderflow { production });
                }

                // the stacks are left untouched when the goto is missing.
                let left = reduction.left.to_owned();
                let top = self.state_stack[self.state_stack.len() - arity - 1];
                let next = self
                    .table
                    .goto(top, &left)
                    .ok_or_else(|| ParseError::UndefinedGoto {
                        state: top,
                        nonterminal: left.clone(),
                    })?;

                self.state_stack.truncate(self.state_stack.len() - arity);
                self.symbol_stack.truncate(self.symbol_stack.len() - arity);
                self.symbol_stack.push(left.clone());
                self.state_stack.push(next);

                Ok(Step::Reduce {
                    production,
                    left,
                    arity,
                    next,
                })
            }
        }
    }

    /// Drive the parser until it accepts or fails, returning the number of
    /// steps taken.
    pub fn run(&mut self) -> Result<usize, ParseError> {
        let mut steps = 0;
        self.run_with(|_, _| steps += 1)?;
        Ok(steps)
    }

    /// Drive the parser until it accepts or fails, calling `observer` with
    /// the parser and the performed action after every successful step.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<(), ParseError>
    where
        F: FnMut(&Self, &Step),
    {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        loop {
            let step = self.step()?;
            observer(self, &step);
            if step == Step::Accept {
                return Ok(());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no action defined for state {state} on `{lookahead}'")]
    UndefinedAction { state: StateIndex, lookahead: String },

    #[error("no goto defined for state {state} on `{nonterminal}'")]
    UndefinedGoto {
        state: StateIndex,
        nonterminal: String,
    },

    #[error("the table reduces by unknown production r{production}")]
    UnknownProduction { production: ProductionIndex },

    #[error("too few symbols on the stack to reduce by production r{production}")]
    StackUnderflow { production: ProductionIndex },

    #[error("the table shifted past the end marker")]
    UnexpectedEndOfInput,

    #[error("empty state stack")]
    EmptyStateStack,

    #[error("already accepted")]
    AlreadyAccepted,

    #[error("already failed")]
    AlreadyFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CompiledTable;

    // S' -> S
    // S  -> ( S )
    // S  -> a
    const PRODUCTIONS: &[(&str, usize)] = &[("S'", 1), ("S", 3), ("S", 1)];
    const TABLE: &str = "\
14
0 ( s1
0 a s3
1 ( s1
1 a s3
2 # acc
3 # r2
3 ( r2
3 ) r2
3 a r2
4 ) s5
5 # r1
5 ( r1
5 ) r1
5 a r1
2
0 S 2
1 S 4
";

    fn table() -> CompiledTable {
        TABLE.parse().unwrap()
    }

    #[test]
    fn accepts_nested() {
        let table = table();
        let mut parser = Parser::new(&table, PRODUCTIONS, "( a )".split_whitespace());
        let mut actions = vec![];
        parser
            .run_with(|_, step| actions.push(step.action()))
            .unwrap();
        assert!(parser.is_accepted());
        assert_eq!(
            actions,
            [
                Action::Shift(1),
                Action::Shift(3),
                Action::Reduce(2),
                Action::Shift(5),
                Action::Reduce(1),
                Action::Accept,
            ]
        );
        assert_eq!(parser.state_stack(), [0, 2]);
        assert_eq!(parser.symbol_stack(), ["S"]);
        assert_eq!(parser.remaining_input(), ["#"]);
    }

    #[test]
    fn observable_configuration() {
        let table = table();
        let mut parser = Parser::new(&table, PRODUCTIONS, ["(", "a", ")"]);
        assert_eq!(parser.state_stack(), [0]);
        assert!(parser.symbol_stack().is_empty());
        assert_eq!(parser.remaining_input(), ["(", "a", ")", "#"]);

        assert_eq!(
            parser.step().unwrap(),
            Step::Shift {
                token: "(".into(),
                next: 1
            }
        );
        assert_eq!(parser.step().unwrap().action(), Action::Shift(3));
        assert_eq!(parser.state_stack(), [0, 1, 3]);
        assert_eq!(parser.symbol_stack(), ["(", "a"]);
        assert_eq!(parser.remaining_input(), [")", "#"]);

        assert_eq!(
            parser.step().unwrap(),
            Step::Reduce {
                production: 2,
                left: "S".into(),
                arity: 1,
                next: 4
            }
        );
        assert_eq!(parser.state_stack(), [0, 1, 4]);
        assert_eq!(parser.symbol_stack(), ["(", "S"]);
    }

    #[test]
    fn undefined_action() {
        let table = table();
        let mut parser = Parser::new(&table, PRODUCTIONS, ["(", "a"]);
        let err = parser.run().unwrap_err();
        assert_eq!(
            err,
            ParseError::UndefinedAction {
                state: 4,
                lookahead: "#".into()
            }
        );
        assert!(!parser.is_accepted());
        assert_eq!(parser.step(), Err(ParseError::AlreadyFailed));
    }

    #[test]
    fn empty_input_is_rejected() {
        let table = table();
        let mut parser = Parser::new(&table, PRODUCTIONS, Vec::<String>::new());
        assert_eq!(
            parser.run(),
            Err(ParseError::UndefinedAction {
                state: 0,
                lookahead: "#".into()
            })
        );
    }

    #[test]
    fn undefined_goto() {
        // the goto row for state 1 is missing.
        let table: CompiledTable = "3\n0 ( s1\n1 a s3\n3 ) r2\n1\n0 S 2\n".parse().unwrap();
        let mut parser = Parser::new(&table, PRODUCTIONS, ["(", "a", ")"]);
        assert_eq!(
            parser.run(),
            Err(ParseError::UndefinedGoto {
                state: 1,
                nonterminal: "S".into()
            })
        );
        assert_eq!(parser.state_stack(), [0, 1, 3]);
        assert_eq!(parser.symbol_stack(), ["(", "a"]);
        assert_eq!(parser.remaining_input(), [")", "#"]);
    }

    #[test]
    fn unknown_production() {
        let table: CompiledTable = "1\n0 a r7\n0\n".parse().unwrap();
        let mut parser = Parser::new(&table, PRODUCTIONS, ["a"]);
        assert_eq!(
            parser.run(),
            Err(ParseError::UnknownProduction { production: 7 })
        );
    }

    #[test]
    fn already_accepted() {
        let table = table();
        let mut parser = Parser::new(&table, PRODUCTIONS, ["a"]);
        assert_eq!(parser.run(), Ok(3));
        assert_eq!(parser.step(), Err(ParseError::AlreadyAccepted));
    }

    #[test]
    fn epsilon_reduction_pops_nothing() {
        // S' -> S, S -> A b, A -> (empty)
        let productions: &[(&str, usize)] = &[("S'", 1), ("S", 2), ("A", 0)];
        let table: CompiledTable = "\
5
0 # r2
0 b r2
1 b s3
2 # acc
3 # r1
2
0 A 1
0 S 2
"
        .parse()
        .unwrap();
        let mut parser = Parser::new(&table, productions, ["b"]);
        assert_eq!(
            parser.step().unwrap(),
            Step::Reduce {
                production: 2,
                left: "A".into(),
                arity: 0,
                next: 1
            }
        );
        assert_eq!(parser.state_stack(), [0, 1]);
        assert_eq!(parser.remaining_input(), ["b", "#"]);
        assert_eq!(parser.run(), Ok(3));
        assert!(parser.is_accepted());
    }
}
