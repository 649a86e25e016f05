use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use lr0kit::{
    automaton::{AutomatonBuilder, SymbolOrder},
    grammar::Grammar,
    table,
};

criterion_main!(benches);
criterion_group!(benches, bench_expr, bench_small);

fn bench_expr(c: &mut Criterion) {
    bench_automaton_gen(c, "expr");
    bench_automaton_gen(c, "ambiguous");
}

fn bench_small(c: &mut Criterion) {
    bench_automaton_gen(c, "epsilon");
    bench_automaton_gen(c, "parens");
}

fn bench_automaton_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        Grammar::from_file(project_root.join(format!("tests/{}.grammar", grammar_name))).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("Lexicographic", |b| {
        b.iter(|| {
            AutomatonBuilder::new(&grammar)
                .order(SymbolOrder::Lexicographic)
                .build()
        });
    });
    group.bench_function("Declaration", |b| {
        b.iter(|| {
            AutomatonBuilder::new(&grammar)
                .order(SymbolOrder::Declaration)
                .build()
        });
    });
    group.bench_function("Table", |b| {
        let automaton = AutomatonBuilder::new(&grammar).build();
        b.iter(|| table::compile(&grammar, &automaton));
    });
    group.finish();
}
