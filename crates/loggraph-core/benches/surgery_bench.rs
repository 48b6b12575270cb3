//! # Surgery Benchmarks
//!
//! Throughput of excision and projection on synthetic file graphs.
//!
//! Run with: `cargo bench -p loggraph-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use loggraph_core::{
    Edge, EdgeKind, Graph, Node, NodeId, NodeKind, Severity, Target, excise, graph_from_bytes,
    graph_to_bytes, project,
};
use std::hint::black_box;

/// `size` filler tokens with one logging statement in the middle, a token
/// chain, and a parent edge from the first node to every tenth node.
fn create_file_graph(size: u64) -> (Graph, NodeId) {
    let mut graph = Graph::new("Bench.java");
    let middle = size / 2;
    let statement = ["log", "DOT", "info", "LPAREN", "\"x\"", "RPAREN", "SEMI"];

    let mut contents: Vec<&str> = Vec::new();
    for i in 0..size {
        if i == middle {
            contents.extend(statement);
        } else {
            contents.push("tok");
        }
    }

    for (i, text) in contents.iter().enumerate() {
        graph
            .push_node(Node::new(NodeId(i as u64 * 2 + 1), NodeKind::Token, *text))
            .expect("node");
    }
    let count = contents.len() as u64;
    for i in 0..count - 1 {
        graph
            .push_edge(Edge::new(NodeId(i * 2 + 1), NodeId(i * 2 + 3), EdgeKind::NextToken))
            .expect("edge");
    }
    for i in (10..count).step_by(10) {
        graph
            .push_edge(Edge::new(NodeId(1), NodeId(i * 2 + 1), EdgeKind::AstChild))
            .expect("edge");
    }

    (graph, NodeId(middle * 2 + 1))
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_excision(c: &mut Criterion) {
    let mut group = c.benchmark_group("excision");

    for size in [100u64, 1000, 10000].iter() {
        let (graph, root) = create_file_graph(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| {
                let mut working = graph.clone();
                excise(&mut working, root).expect("excise");
                black_box(working)
            });
        });
    }

    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for size in [100u64, 1000, 10000].iter() {
        let (mut graph, root) = create_file_graph(*size);
        excise(&mut graph, root).expect("excise");
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| black_box(project(graph, Target::Severity(Severity::Info)).expect("project")));
        });
    }

    group.finish();
}

fn bench_record_decode(c: &mut Criterion) {
    let (graph, _) = create_file_graph(10000);
    let bytes = graph_to_bytes(&graph).expect("encode");

    c.bench_function("record_decode_10000", |b| {
        b.iter(|| black_box(graph_from_bytes(black_box(&bytes)).expect("decode")));
    });
}

criterion_group!(benches, bench_excision, bench_projection, bench_record_decode);
criterion_main!(benches);
