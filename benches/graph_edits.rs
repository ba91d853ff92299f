use std::collections::HashSet;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use product_graph::graph::GraphModel;
use product_graph::invariants::graph_invariant_violations;
use product_graph::models::{
    EdgeId, EdgeKind, EdgeUpdate, GraphEdge, GraphNode, NodeId, Position, ProductGraph,
};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn synthetic_graph(node_count: usize, edge_count: usize) -> ProductGraph {
    let nodes = (0..node_count)
        .map(|idx| GraphNode {
            id: NodeId(format!("p{idx}")),
            label: format!("Product {idx}"),
            position: Position::new(idx as f64, (idx * 7 % 13) as f64),
        })
        .collect::<Vec<_>>();

    let kinds = EdgeKind::ALL;
    let mut state = 0x1234_5678_9abc_def0u64;
    let mut seen = HashSet::with_capacity(edge_count);
    let mut edges = Vec::with_capacity(edge_count);
    while edges.len() < edge_count {
        let a = (lcg_next(&mut state) as usize) % node_count;
        let b = (lcg_next(&mut state) as usize) % node_count;
        if a == b || !seen.insert((a, b)) {
            continue;
        }
        edges.push(GraphEdge {
            id: EdgeId(format!("rel-{}", edges.len())),
            source: nodes[a].id.clone(),
            target: nodes[b].id.clone(),
            weight: (lcg_next(&mut state) % 101) as f64 / 100.0,
            kind: kinds[edges.len() % kinds.len()],
        });
    }

    ProductGraph { nodes, edges }
}

fn bench_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_edits");
    for (nodes, edges) in [(500usize, 2_000usize), (2_000usize, 8_000usize)] {
        let graph = synthetic_graph(nodes, edges);
        let model = GraphModel::try_from(graph.clone()).expect("synthetic graph is valid");
        let ids = graph.edges.iter().map(|edge| edge.id.clone()).collect::<Vec<_>>();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("update_edge", format!("{nodes}n_{edges}e")),
            &ids,
            |b, ids| {
                let mut model = model.clone();
                let mut seed = 42u64;
                b.iter(|| {
                    let id = &ids[(lcg_next(&mut seed) as usize) % ids.len()];
                    let update = EdgeUpdate::default().weight(0.25).kind("related");
                    black_box(model.update_edge(id, &update).ok());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("connect_remove", format!("{nodes}n_{edges}e")),
            &graph,
            |b, graph| {
                let mut model = model.clone();
                let source = graph.nodes[0].id.clone();
                let mut idx = 1usize;
                b.iter(|| {
                    let target = &graph.nodes[idx % graph.nodes.len()].id;
                    idx = idx.wrapping_add(1);
                    if let Ok(edge) = model.connect_nodes(&source, target) {
                        black_box(model.remove_edge(&edge.id).ok());
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_snapshot_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_checks");
    for (nodes, edges) in [(500usize, 2_000usize), (2_000usize, 8_000usize)] {
        let graph = synthetic_graph(nodes, edges);
        let model = GraphModel::try_from(graph).expect("synthetic graph is valid");

        group.bench_with_input(
            BenchmarkId::new("snapshot_and_validate", format!("{nodes}n_{edges}e")),
            &model,
            |b, model| {
                b.iter(|| {
                    let snapshot = model.snapshot();
                    black_box(graph_invariant_violations(&snapshot.nodes, &snapshot.edges));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(graph_edits, bench_edits, bench_snapshot_checks);
criterion_main!(graph_edits);
