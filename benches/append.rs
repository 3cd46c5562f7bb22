use std::hint::black_box;
use std::sync::Arc;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use relgraph::prelude::*;

const BLOG: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("title", ScalarType::Text),
];

const POST: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("blog_id", ScalarType::Integer).references("blog", "id"),
    AttributeDef::new("title", ScalarType::Text),
];

struct Fixture {
    template: Arc<GraphTemplate>,
    rows: Vec<(Record, Record)>,
}

/// 100 blogs with 10 posts each, as the rows of a blog/post join.
fn fixture() -> Fixture {
    let blog = EntityType::from_defs("blog", BLOG).unwrap();
    let post = EntityType::from_defs("post", POST).unwrap();

    let mut builder = GraphTemplate::builder();
    builder.declare("blog", &blog).unwrap();
    builder.declare("post", &post).unwrap();
    builder.relate("blog", ["post"]).unwrap();

    let mut rows = Vec::with_capacity(1000);
    for b in 0..100i64 {
        for p in 0..10i64 {
            rows.push((
                record!(blog, { "id" => b, "title" => format!("Blog {b}") }).unwrap(),
                record!(post, { "id" => b * 10 + p, "blog_id" => b, "title" => format!("Post {p}") })
                    .unwrap(),
            ));
        }
    }
    Fixture {
        template: builder.build(),
        rows,
    }
}

fn fill(fixture: &Fixture) -> Graph {
    let mut graph = Graph::new(fixture.template.clone());
    for (blog, post) in &fixture.rows {
        graph
            .append(row! { "blog" => blog.clone(), "post" => post.clone() })
            .unwrap();
    }
    graph
}

fn append(c: &mut Criterion) {
    let fixture = fixture();
    let mut group = c.benchmark_group("append");

    group.bench_function("join_rows_1000", |b| {
        b.iter(|| black_box(fill(&fixture)));
    });

    group.bench_function("resubmit_known_rows", |b| {
        b.iter_batched(
            || fill(&fixture),
            |mut graph| {
                for (blog, post) in &fixture.rows {
                    graph
                        .append(row! { "blog" => blog.clone(), "post" => post.clone() })
                        .unwrap();
                }
                black_box(graph)
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn serialize(c: &mut Criterion) {
    let fixture = fixture();
    let graph = fill(&fixture);
    let spec = SerializationSpec::all(graph.template());
    let mut group = c.benchmark_group("serialize");

    group.bench_function("data", |b| {
        b.iter(|| black_box(relgraph::serialize(&graph.view(), &spec).unwrap()));
    });

    group.bench_function("schema", |b| {
        b.iter(|| black_box(relgraph::schema(graph.template(), &spec).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, append, serialize);
criterion_main!(benches);
