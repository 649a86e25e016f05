use lr0kit::{automaton::Automaton, conflict, grammar::Grammar, table};
use lr0kit_runtime::{
    parser::{ParseError, Parser},
    table::CompiledTable,
};
use std::{env, path::PathBuf};

macro_rules! define_tests {
    ($(
        $name:ident {
            lr0: $lr0:expr,
            accept: [$($accept:expr),*$(,)?],
            reject: [$($reject:expr),*$(,)?]$(,)?
        }
    ),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = Grammar::from_file(
                &PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
                    .join(concat!("tests/", stringify!($name), ".grammar"))
            ).unwrap();
            let automaton = Automaton::generate(&grammar);
            assert_eq!(conflict::is_lr0(&grammar, &automaton), $lr0);

            let table: CompiledTable = table::compile(&grammar, &automaton)
                .to_string()
                .parse()
                .unwrap();
            $(
                let mut parser = Parser::new(&table, &grammar, $accept.split_whitespace());
                assert!(parser.run().is_ok(), "should accept `{}'", $accept);
                assert!(parser.is_accepted());
            )*
            $(
                let mut parser = Parser::new(&table, &grammar, $reject.split_whitespace());
                let result = parser.run();
                if $lr0 {
                    assert!(
                        matches!(result, Err(ParseError::UndefinedAction { .. })),
                        "should reject `{}' on a missing action: {:?}",
                        $reject,
                        result
                    );
                } else {
                    assert!(result.is_err(), "should reject `{}'", $reject);
                }
            )*
        }
    )*};
}

define_tests! {
    expr {
        lr0: false,
        accept: ["id", "id + id * id", "( id + id ) * id"],
        reject: ["", "id +", "( id", "id id"],
    },
    ambiguous {
        lr0: false,
        accept: ["id", "id + id + id"],
        reject: ["+", "id +"],
    },
    epsilon {
        lr0: true,
        accept: ["b"],
        reject: ["", "b b"],
    },
    parens {
        lr0: true,
        accept: ["a", "( a )", "( ( a ) )"],
        reject: ["", "( a", "a )", "( )"],
    },
}
