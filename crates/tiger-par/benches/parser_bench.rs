//! Parser throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tiger_par::Parser;

fn sample_program() -> String {
    let mut source = String::from("let\n  type intarray = array of int\n  var total := 0\n");
    for i in 0..48 {
        source.push_str(&format!(
            "  function mix{i}(a:int, b:int):int = if a < b then mix{i}(b, a) else a * {i} + b\n"
        ));
    }
    source.push_str("in\n  for i := 1 to 100 do total := total + i;\n  total\nend\n");
    source
}

fn bench_parser(c: &mut Criterion) {
    let source = sample_program();

    c.bench_function("parse_sample_program", |b| {
        b.iter(|| {
            let ast = Parser::new(black_box(&source), None).parse().unwrap();
            black_box(ast)
        })
    });
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
