//! Parser and evaluator benchmarks
//!
//! Run with: cargo bench --bench parse

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use precedent::prelude::*;

fn binary(name: &str, precedence: i64, op: &str, operand: &str, result: &str) -> NodeDefinition {
    NodeDefinition::new(name, precedence)
        .pattern([
            lhs_typed(operand).named("left"),
            token(op),
            rhs_typed(operand).named("right"),
        ])
        .returns(result)
}

fn build_parser(config: ParserConfig) -> Parser {
    Parser::with_config(
        [
            NodeDefinition::new("ternary", 0)
                .pattern([
                    lhs_typed("boolean").named("cond"),
                    token("?"),
                    full().named("then"),
                    token(":"),
                    full().named("otherwise"),
                ])
                .union_of(["then", "otherwise"])
                .evaluate(|b, _| {
                    let branch = if b.boolean("cond")? { "then" } else { "otherwise" };
                    b.value(branch).cloned()
                }),
            binary("ge", 1, ">=", "number", "boolean")
                .evaluate(|b, _| Ok(Value::bool(b.number("left")? >= b.number("right")?))),
            binary("eq", 1, "==", "string", "boolean")
                .evaluate(|b, _| Ok(Value::bool(b.string("left")? == b.string("right")?))),
            binary("add", 2, "+", "number", "number")
                .evaluate(|b, _| Ok(Value::number(b.number("left")? + b.number("right")?))),
            binary("sub", 2, "-", "number", "number")
                .evaluate(|b, _| Ok(Value::number(b.number("left")? - b.number("right")?))),
            binary("mul", 3, "*", "number", "number")
                .evaluate(|b, _| Ok(Value::number(b.number("left")? * b.number("right")?))),
        ],
        config,
    )
    .unwrap()
}

fn sum_chain(terms: usize) -> String {
    (0..terms)
        .map(|i| format!("{} * x", i))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn nested(depth: usize) -> String {
    format!("{}x{}", "(".repeat(depth), " + 1)".repeat(depth))
}

fn bench_parse(c: &mut Criterion) {
    let parser = build_parser(ParserConfig::default());
    let ctx = Context::from_descriptors([("x", "number"), ("name", "string")]).unwrap();

    let mut group = c.benchmark_group("parse");
    for terms in [4, 32, 256] {
        let input = sum_chain(terms);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("sum_chain", terms), &input, |b, input| {
            b.iter(|| parser.parse_ast(black_box(input), &ctx))
        });
    }
    for depth in [4, 32] {
        let input = nested(depth);
        group.bench_with_input(BenchmarkId::new("nested", depth), &input, |b, input| {
            b.iter(|| parser.parse_ast(black_box(input), &ctx))
        });
    }
    group.bench_function("ternary", |b| {
        b.iter(|| parser.parse_ast(black_box("x >= 70 ? x + 10 : name == 'a' ? 1 : 2"), &ctx))
    });
    group.finish();
}

fn bench_memoization(c: &mut Criterion) {
    let memo = build_parser(ParserConfig::default());
    let plain = build_parser(ParserConfig::new().with_memoize(false));
    let ctx = Context::from_descriptors([("x", "number")]).unwrap();
    let input = sum_chain(32);

    let mut group = c.benchmark_group("memoization");
    group.bench_function("enabled", |b| b.iter(|| memo.parse_ast(black_box(&input), &ctx)));
    group.bench_function("disabled", |b| b.iter(|| plain.parse_ast(black_box(&input), &ctx)));
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let parser = build_parser(ParserConfig::default());
    let ctx = Context::from_descriptors([("x", "number")]).unwrap();
    let expr = parser.parse(&sum_chain(32), &ctx).unwrap();
    let mut data = DataBag::new();
    data.insert("x".to_string(), Value::number(3.0));

    c.bench_function("evaluate/sum_chain_32", |b| {
        b.iter(|| expr.evaluate(black_box(&data)))
    });
}

fn bench_errors(c: &mut Criterion) {
    let parser = build_parser(ParserConfig::default());
    let ctx = Context::new();

    c.bench_function("errors/type_mismatch", |b| {
        b.iter(|| parser.parse_ast(black_box("1 + 2 * 'three'"), &ctx))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_memoization,
    bench_evaluate,
    bench_errors
);
criterion_main!(benches);
