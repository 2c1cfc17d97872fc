// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hint::black_box;

use yangtools::Reactor;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn module_with_leaves(n: usize) -> String {
    let leaves = (0..n)
        .map(|i| format!("    leaf l{i} {{ type string; }}\n"))
        .collect::<String>();
    format!(
        r#"
module bench {{
  namespace "urn:bench";
  prefix b;
  container c {{
{leaves}  }}
}}
"#
    )
}

fn module_with_uses(n: usize) -> String {
    let containers = (0..n)
        .map(|i| format!("  container c{i} {{ uses g; }}\n"))
        .collect::<String>();
    format!(
        r#"
module bench {{
  namespace "urn:bench";
  prefix b;
  grouping g {{
    leaf x {{ type string; }}
    container inner {{
      leaf y {{ type int32; }}
    }}
  }}
{containers}}}
"#
    )
}

fn reactor_with(yang: String) -> Reactor {
    let mut reactor = Reactor::new();
    reactor
        .add_source("bench.yang".to_string(), yang)
        .unwrap();
    reactor
}

fn build_flat_module(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat module");
    for size in [32, 128, 512, 2048].iter() {
        group.bench_with_input(BenchmarkId::new("leaves", size), size, |b, &size| {
            let reactor = reactor_with(module_with_leaves(size));
            b.iter(|| black_box(reactor.build().unwrap()))
        });
    }
    group.finish();
}

fn build_grouping_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping expansion");
    for size in [8, 32, 128, 512].iter() {
        group.bench_with_input(BenchmarkId::new("uses", size), size, |b, &size| {
            let reactor = reactor_with(module_with_uses(size));
            b.iter(|| black_box(reactor.build().unwrap()))
        });
    }
    group.finish();
}

fn build_imports(c: &mut Criterion) {
    c.bench_function("augment across an import", |b| {
        let mut reactor = reactor_with(module_with_leaves(16));
        reactor
            .add_source(
                "aug.yang".to_string(),
                r#"
module aug {
  namespace "urn:aug";
  prefix a;
  import bench { prefix b; }
  augment "/b:c" {
    leaf extra { type string; }
  }
}
"#
                .to_string(),
            )
            .unwrap();
        b.iter(|| black_box(reactor.build().unwrap()))
    });
}

criterion_group!(
    benches,
    build_flat_module,
    build_grouping_expansion,
    build_imports
);
criterion_main!(benches);
