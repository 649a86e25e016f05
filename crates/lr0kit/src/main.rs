use anyhow::Context as _;
use clap::{Parser as _, Subcommand, ValueEnum};
use lr0kit::{
    automaton::{AutomatonBuilder, SymbolOrder},
    conflict,
    grammar::Grammar,
    table,
    util::display_joined,
};
use lr0kit_runtime::{
    definition::{ParseTable, ProductionSet},
    parser::{Parser, Step},
    table::CompiledTable,
};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the LR(0) automaton of a grammar and write its parse table.
    Build {
        /// The path of grammar definition file.
        grammar: PathBuf,

        /// Specify the path of generated table file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// The order in which the outgoing symbols of each state are visited.
        #[arg(long, value_enum, default_value_t = Order::Lexicographic)]
        order: Order,

        /// Also write the item sets and transitions to this file.
        #[arg(long)]
        automaton: Option<PathBuf>,
    },

    /// Parse every line of an input file with a compiled table.
    Parse {
        /// The path of grammar definition file.
        grammar: PathBuf,

        /// The path of the table file written by `build`.
        table: PathBuf,

        /// The input file, one whitespace-separated sentence per line.
        input: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Order {
    Lexicographic,
    Declaration,
}

impl From<Order> for SymbolOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Lexicographic => SymbolOrder::Lexicographic,
            Order::Declaration => SymbolOrder::Declaration,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    match args.command {
        Command::Build {
            grammar,
            output,
            order,
            automaton,
        } => build(&grammar, output, order.into(), automaton)
            .with_context(|| anyhow::anyhow!("errored during building {}", grammar.display())),
        Command::Parse {
            grammar,
            table,
            input,
        } => parse(&grammar, &table, &input)
            .with_context(|| anyhow::anyhow!("errored during parsing {}", input.display())),
    }
}

fn load_grammar(path: &Path) -> anyhow::Result<Grammar> {
    let s = Instant::now();
    let grammar = Grammar::from_file(path)
        .with_context(|| anyhow::anyhow!("failed to load grammar from {}", path.display()))?;
    tracing::info!("load_grammar: {:?} elapsed", s.elapsed());
    Ok(grammar)
}

fn build(
    grammar_file: &Path,
    output: Option<PathBuf>,
    order: SymbolOrder,
    automaton_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let grammar = load_grammar(grammar_file)?;
    print!("{}", grammar);

    let s = Instant::now();
    let automaton = AutomatonBuilder::new(&grammar).order(order).build();
    tracing::info!("build_automaton: {:?} elapsed", s.elapsed());

    println!();
    println!("{}", automaton.display(&grammar));

    let conflicts = conflict::conflicts(&grammar, &automaton);
    if conflicts.is_empty() {
        println!("the grammar is LR(0)");
    } else {
        println!("the grammar is not LR(0)");
        for conflict in &conflicts {
            tracing::warn!(state = %conflict.state(), "{}", conflict.display(&grammar));
            println!("[warning] {}", conflict.display(&grammar));
        }
    }

    let s = Instant::now();
    let table = table::compile(&grammar, &automaton);
    tracing::info!("compile_table: {:?} elapsed", s.elapsed());

    if let Some(path) = automaton_file {
        fs::write(&path, automaton.display(&grammar).to_string()).with_context(|| {
            anyhow::anyhow!("failed to write the automaton to {}", path.display())
        })?;
    }

    let out_file = output.unwrap_or_else(|| grammar_file.with_extension("lrtbl"));
    fs::write(&out_file, table.to_string()).with_context(|| {
        anyhow::anyhow!("failed to write the parse table to {}", out_file.display())
    })?;
    println!(
        "wrote {} action rows and {} goto rows to {}",
        table.actions().len(),
        table.gotos().len(),
        out_file.display()
    );

    Ok(())
}

fn parse(grammar_file: &Path, table_file: &Path, input_file: &Path) -> anyhow::Result<()> {
    let grammar = load_grammar(grammar_file)?;

    let table: CompiledTable = fs::read_to_string(table_file)
        .with_context(|| anyhow::anyhow!("failed to read {}", table_file.display()))?
        .parse()
        .with_context(|| anyhow::anyhow!("malformed parse table in {}", table_file.display()))?;

    let input = fs::read_to_string(input_file)
        .with_context(|| anyhow::anyhow!("failed to read {}", input_file.display()))?;

    let mut failed = 0;
    for (i, line) in input.lines().enumerate() {
        if !trace_sentence(&grammar, &table, i + 1, line) {
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} input line(s) were rejected", failed);
    }
    Ok(())
}

/// Run the parser on a single line, printing each configuration it goes
/// through. Returns whether the sentence was accepted.
fn trace_sentence(grammar: &Grammar, table: &CompiledTable, line: usize, sentence: &str) -> bool {
    let sentence = sentence.trim();
    println!(
        "line {}: {}",
        line,
        if sentence.is_empty() { "ε" } else { sentence }
    );

    let mut parser = Parser::new(table, grammar, sentence.split_whitespace());
    let mut steps = 0;
    println!(
        "{:<4} {:<24} {:<20} {:<24} {}",
        "step", "states", "symbols", "input", "action"
    );
    print_row(steps, &parser, "initial");

    let result = parser.run_with(|parser, step| {
        steps += 1;
        let action = match step {
            Step::Shift { next, .. } => format!("s{}", next),
            Step::Reduce { production, .. } => match grammar.productions().get(*production) {
                Some(p) => format!("reduce by {}: {}", production, p.display(grammar)),
                None => format!("r{}", production),
            },
            Step::Accept => "acc".to_owned(),
        };
        print_row(steps, parser, &action);
    });

    match result {
        Ok(()) => {
            println!("accepted");
            true
        }
        Err(err) => {
            print_row(steps + 1, &parser, "error");
            tracing::debug!("line {} rejected: {}", line, err);
            println!("rejected: {}", err);
            false
        }
    }
}

fn print_row<TTable, TProds>(step: usize, parser: &Parser<TTable, TProds>, action: &str)
where
    TTable: ParseTable,
    TProds: ProductionSet,
{
    println!(
        "{:<4} {:<24} {:<20} {:<24} {}",
        step,
        display_joined(parser.state_stack()).to_string(),
        display_joined(parser.symbol_stack()).to_string(),
        display_joined(parser.remaining_input()).to_string(),
        action
    );
}
