use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modlink_engine::{Eventual, ModuleGraph, ModuleId, Referrer, ResolveError};

/// Sources for a chain `m0 -> m1 -> ... -> m{len-1}`
fn chain(len: usize) -> Vec<(String, String)> {
    (0..len)
        .map(|i| {
            let source = if i + 1 < len {
                format!("import {{ v as prev }} from \"m{}\"; export let v = prev + 1;", i + 1)
            } else {
                "export let v = 0;".to_string()
            };
            (format!("m{}", i), source)
        })
        .collect()
}

/// Sources for `width` modules that all import one shared leaf
fn diamond(width: usize) -> Vec<(String, String)> {
    let mut modules = Vec::with_capacity(width + 2);
    let root_imports: String = (0..width)
        .map(|i| format!("import \"mid{}\"; ", i))
        .collect();
    modules.push(("root".to_string(), format!("{}1;", root_imports)));
    for i in 0..width {
        modules.push((format!("mid{}", i), "import * as leaf from \"leaf\"; leaf.x;".to_string()));
    }
    modules.push(("leaf".to_string(), "export let x = 1;".to_string()));
    modules
}

fn run(modules: &[(String, String)]) -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    let ids: Vec<ModuleId> = modules
        .iter()
        .map(|(name, source)| {
            graph
                .create_module(source, &format!("memory:///{}", name))
                .unwrap()
        })
        .collect();
    for &id in &ids {
        let mut resolver = |_: Referrer<'_>,
                            specifier: &str|
         -> Result<Eventual<ModuleId>, ResolveError> {
            let pos = modules
                .iter()
                .position(|(name, _)| name == specifier)
                .ok_or_else(|| ResolveError::failed(specifier))?;
            Ok(Eventual::fulfilled(ids[pos]))
        };
        graph.link(id, &mut resolver).unwrap();
    }
    graph.instantiate(ids[0]).unwrap();
    graph.evaluate(ids[0]).unwrap();
    graph
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for len in [10, 100, 500] {
        let modules = chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &modules, |b, modules| {
            b.iter(|| run(black_box(modules)));
        });
    }
    group.finish();
}

fn bench_diamond(c: &mut Criterion) {
    let mut group = c.benchmark_group("diamond");
    for width in [10, 100] {
        let modules = diamond(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &modules, |b, modules| {
            b.iter(|| run(black_box(modules)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain, bench_diamond);
criterion_main!(benches);
