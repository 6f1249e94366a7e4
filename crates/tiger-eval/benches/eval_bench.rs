//! Evaluator throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tiger_eval::natives::{root_decls, standard_bindings, NativeCtx, SharedBuffer};
use tiger_eval::Interpreter;
use tiger_par::Parser;

fn run(source: &str) -> tiger_eval::Value {
    let program = Parser::new(source, None).parse().unwrap();
    let bindings = standard_bindings();
    let resolved = tiger_sem::resolve(&program, &root_decls(&bindings)).unwrap();
    let ctx = NativeCtx::with_streams(
        Box::new(SharedBuffer::new()),
        Box::new(SharedBuffer::new()),
        false,
    );
    let mut interp = Interpreter::new(resolved.scopes, ctx);
    interp.run(&program, &bindings).unwrap()
}

fn bench_eval(c: &mut Criterion) {
    let sum_loop = "let var a := 0 in (for i := 1 to 10000 do a := a + i; a) end";
    c.bench_function("eval_sum_loop", |b| {
        b.iter(|| black_box(run(black_box(sum_loop))))
    });

    let fib = "let function fib(n:int):int = if n < 2 then n else fib(n - 1) + fib(n - 2) in fib(15) end";
    c.bench_function("eval_fib_15", |b| {
        b.iter(|| black_box(run(black_box(fib))))
    });
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
