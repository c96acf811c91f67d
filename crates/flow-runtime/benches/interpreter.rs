//! Interpreter benchmarks
//!
//! Measures:
//! - Lexing and parsing alone
//! - Tail-recursive loops through the trampoline
//! - Non-tail recursion within the depth limit
//! - Container building and display caching
//! - Operator overrides on structs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flow_runtime::{Context, Flow, Lexer, Parser, Settings};
use std::rc::Rc;

fn parse_only(source: &str, settings: &Rc<Settings>) {
    let _ = Parser::from_source(source, Rc::clone(settings)).parse();
}

// ============================================================================
// Front end
// ============================================================================

fn bench_lex(c: &mut Criterion) {
    let settings = Rc::new(Settings::default());
    let source = "x = [1, 2.5, \"text\", {\"k\": true}] # comment\n".repeat(200);
    c.bench_function("lex_200_lines", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(&source), Rc::clone(&settings));
            let _ = lexer.tokenize();
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let settings = Rc::new(Settings::default());
    let source = r#"
        function classify(n) do
            if n < 0 do "negative" else if n == 0 do "zero" else "positive" end
        end
        module Point(x, y) do
            function __add__(self, other) do Point{self.x + other.x, self.y + other.y} end
        end
    "#
    .repeat(50);
    c.bench_function("parse_definitions_50", |b| {
        b.iter(|| parse_only(black_box(&source), &settings))
    });
}

// ============================================================================
// Execution
// ============================================================================

fn bench_tail_loop(c: &mut Criterion) {
    let runtime = Flow::with_context(Context::default());
    let mut group = c.benchmark_group("tail_loop");
    for count in [1_000, 10_000, 100_000] {
        let source = format!(
            "function count(n, acc) do if n == 0 do acc else count(n - 1, acc + 1) end end\ncount({}, 0)",
            count
        );
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| runtime.eval(black_box(source)))
        });
    }
    group.finish();
}

fn bench_recursion(c: &mut Criterion) {
    let runtime = Flow::with_context(Context::default());
    let source = "function fib(n) do if n < 2 do n else fib(n - 1) + fib(n - 2) end end\nfib(15)";
    c.bench_function("fib_15", |b| b.iter(|| runtime.eval(black_box(source))));
}

fn bench_containers(c: &mut Criterion) {
    let runtime = Flow::new();
    let source = r#"
        items = core.range(500)
        d = {}
        core.map(items, function (i) do d[i] = [i, i * 2] end)
        first = core.text(d)
        d[0] = "changed"
        core.text(d)
    "#;
    c.bench_function("dict_build_and_display_500", |b| {
        b.iter(|| runtime.eval(black_box(source)))
    });
}

fn bench_overrides(c: &mut Criterion) {
    let runtime = Flow::new();
    let source = r#"
        module Vec(x, y) do
            function __add__(self, other) do Vec{self.x + other.x, self.y + other.y} end
        end
        function total(items, acc) do
            if core.length(items) == 0 do acc else total(items - 0, acc + items[0]) end
        end
        total(core.map(core.range(200), function (i) do Vec{i, 1} end), Vec{0, 0}).x
    "#;
    c.bench_function("struct_add_override_200", |b| {
        b.iter(|| runtime.eval(black_box(source)))
    });
}

criterion_group!(front_end, bench_lex, bench_parse);
criterion_group!(
    execution,
    bench_tail_loop,
    bench_recursion,
    bench_containers,
    bench_overrides
);
criterion_main!(front_end, execution);
