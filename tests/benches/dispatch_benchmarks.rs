//! # Dispatch Benchmarks
//!
//! | Path | What it measures |
//! |------|------------------|
//! | rejected | lookup and origin check only |
//! | local | full pipeline into a store read |
//! | cached | cache hit on a chain identity method |
//! | wire | JSON decode, dispatch and envelope |

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use shared_types::RpcRequest;
use tokio::runtime::Runtime;
use wm_tests::harness::{Client, ORIGIN};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let client = rt.block_on(Client::start()).expect("mediator");
    rt.block_on(client.import_mnemonic()).expect("import");

    let mut group = c.benchmark_group("dispatch");

    group.bench_function("rejected", |b| {
        b.iter(|| {
            let request = RpcRequest::new("wallet_getVaults", json!(null)).from_inpage(ORIGIN);
            black_box(rt.block_on(client.send(request)).is_err())
        })
    });

    group.bench_function("local", |b| {
        b.iter(|| black_box(rt.block_on(client.popup("wallet_getAccountGroup", json!(null)))))
    });

    rt.block_on(client.popup("cfx_chainId", json!([])))
        .expect("warm cache");
    group.bench_function("cached", |b| {
        b.iter(|| black_box(rt.block_on(client.popup("cfx_chainId", json!([])))))
    });

    let raw = r#"{"id": 1, "method": "wallet_isLocked", "_popup": true}"#;
    group.bench_function("wire", |b| {
        b.iter(|| black_box(rt.block_on(client.mediator.handle_json(raw))))
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
