//! Criterion benchmarks for the bridge codec and response classification.
//!
//! Every backend call passes through `encode_native_query` (or a WebView frame)
//! on the way out and through `classify` plus push-event parsing on the way in.
//!
//! Run with:
//! ```bash
//! cargo bench --package wallet-bridge-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use wallet_bridge_core::protocol::{
    decode_frame, decode_native_query, encode_frame, encode_native_query, WebViewFrame,
};
use wallet_bridge_core::{classify, PushEvent, Query};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn queries() -> Vec<(&'static str, Query)> {
    vec![
        ("get_accounts", Query::get("accounts")),
        ("get_balance", Query::get("account/v0-f00d-btc-0/balance")),
        (
            "post_config",
            Query::post(
                "config",
                Some(json!({
                    "backend": {"btcActive": true, "proxy": {"useProxy": false, "proxyAddress": ""}},
                    "frontend": {"fiatCode": "CHF", "fiatList": ["USD", "EUR", "CHF"]}
                })),
            ),
        ),
    ]
}

fn accounts_response() -> Value {
    Value::Array(
        (0..20)
            .map(|i| {
                json!({
                    "code": format!("v0-f00d-btc-{i}"),
                    "name": "Bitcoin",
                    "coinCode": "btc",
                    "active": true
                })
            })
            .collect(),
    )
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_native_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("native_query");
    for (name, query) in queries() {
        let wire = encode_native_query(&query).expect("encode must succeed for benchmark setup");
        group.bench_with_input(BenchmarkId::new("encode", name), &query, |b, q| {
            b.iter(|| encode_native_query(black_box(q)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", name), &wire, |b, w| {
            b.iter(|| decode_native_query(black_box(w)).unwrap())
        });
    }
    group.finish();
}

fn bench_webview_frame(c: &mut Criterion) {
    let frame = WebViewFrame::Response {
        query_id: 42,
        response: accounts_response().to_string(),
    };
    let line = encode_frame(&frame).unwrap();

    let mut group = c.benchmark_group("webview_frame");
    group.bench_function("encode_response", |b| b.iter(|| encode_frame(black_box(&frame)).unwrap()));
    group.bench_function("decode_response", |b| b.iter(|| decode_frame(black_box(&line)).unwrap()));
    group.finish();
}

fn bench_inbound_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound");

    let body = accounts_response();
    group.bench_function("classify_accounts", |b| {
        b.iter(|| classify(black_box(body.clone())).unwrap())
    });

    let push = r#"{"subject":"account/v0-f00d-btc-0/status","action":"reload"}"#;
    group.bench_function("parse_push_event", |b| {
        b.iter(|| PushEvent::parse(black_box(push)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_native_query, bench_webview_frame, bench_inbound_hot_path);
criterion_main!(benches);
