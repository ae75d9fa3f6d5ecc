// Benchmarks for the value codec and event dispatch
//
// Measures decode/encode of representative remote values and the cost of
// routing a network event to a handful of listeners.

use bidi_rs::protocol::value_codec::{decode, encode};
use bidi_rs::{EventKind, Router, Target};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;

fn sample_values() -> Vec<(&'static str, serde_json::Value)> {
    vec![
        ("number", json!({"type": "number", "value": 3000})),
        ("negative_zero", json!({"type": "number", "value": "-0"})),
        (
            "object",
            json!({"type": "object", "value": [
                ["name", {"type": "string", "value": "widget"}],
                ["count", {"type": "number", "value": 7}],
                [{"type": "symbol", "handle": "h-1"}, {"type": "boolean", "value": true}]
            ]}),
        ),
        (
            "node",
            json!({"type": "node", "sharedId": "n-1", "handle": "h-2", "value": {
                "nodeType": 1,
                "childNodeCount": 2,
                "localName": "div",
                "attributes": {"id": "main", "class": "container"},
                "children": [
                    {"type": "node", "sharedId": "n-2", "value": {"nodeType": 3, "childNodeCount": 0, "nodeValue": "hi"}},
                    {"type": "node", "sharedId": "n-3", "value": {"nodeType": 1, "childNodeCount": 0, "localName": "span"}}
                ]
            }}),
        ),
    ]
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_decode");
    for (name, wire) in sample_values() {
        group.bench_function(name, |b| {
            b.iter(|| std::hint::black_box(decode(&wire)));
        });
    }
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_encode");
    for (name, wire) in sample_values() {
        let Ok(value) = decode(&wire) else {
            continue;
        };
        group.bench_function(name, |b| {
            b.iter(|| std::hint::black_box(encode(&value)));
        });
    }
    group.finish();
}

fn benchmark_dispatch(c: &mut Criterion) {
    let router = Router::new();
    for _ in 0..4 {
        router.register_typed(Target::Page("A1".into()), EventKind::Load, |record| {
            std::hint::black_box(record);
        });
    }
    let frame = json!({
        "type": "event",
        "method": "browsingContext.load",
        "params": {"context": "A1", "navigation": "n", "timestamp": 1, "url": "https://a.test/"}
    })
    .to_string();

    c.bench_function("dispatch_load_four_listeners", |b| {
        b.iter(|| router.dispatch(std::hint::black_box(&frame)));
    });
}

criterion_group!(benches, benchmark_decode, benchmark_encode, benchmark_dispatch);
criterion_main!(benches);
