use std::sync::Arc;

use relgraph::error::{AppendError, SerializeError};
use relgraph::prelude::*;
use relgraph::serialize::{schema, serialize};
use serde_json::json;

const ITEM: &[AttributeDef] = &[
    AttributeDef::new("v", ScalarType::Integer).primary_key(),
    AttributeDef::new("w", ScalarType::Integer),
];

fn item_type() -> Arc<EntityType> {
    EntityType::from_defs("item", ITEM).unwrap()
}

fn item(ty: &Arc<EntityType>, v: i64, w: i64) -> Record {
    record!(ty, { "v" => v, "w" => w }).unwrap()
}

/// Nested `a -> [b, c]`
fn inner(ty: &Arc<EntityType>) -> Arc<GraphTemplate> {
    let mut b = GraphTemplate::builder();
    b.declare("a", ty).unwrap();
    b.declare("b", ScalarType::Text).unwrap();
    b.declare("c", ScalarType::Real).unwrap();
    b.relate("a", ["b", "c"]).unwrap();
    b.build()
}

/// `a -> b`, where every `b` holds a graph of [`inner`]
fn outer(ty: &Arc<EntityType>) -> Arc<GraphTemplate> {
    let sub = inner(ty);
    let mut b = GraphTemplate::builder();
    b.declare("a", ty).unwrap();
    b.declare("b", SlotDecl::graph(&sub)).unwrap();
    b.relate("a", ["b"]).unwrap();
    b.build()
}

fn filled(ty: &Arc<EntityType>) -> Graph {
    let mut graph = Graph::new(outer(ty));
    graph
        .append(row! {
            "a" => item(ty, 0, 1),
            "b" => row! { "a" => item(ty, 10, 1), "b" => "a", "c" => 0.1 },
        })
        .unwrap();
    graph
        .append(row! {
            "a" => item(ty, 0, 2),
            "b" => row! { "a" => item(ty, 10, 2), "b" => "b", "c" => 0.2 },
        })
        .unwrap();
    graph
        .append(row! {
            "a" => item(ty, 0, 3),
            "b" => row! { "a" => item(ty, 11, 1), "b" => "b", "c" => 0.3 },
        })
        .unwrap();
    graph
        .append(row! {
            "a" => item(ty, 1, 1),
            "b" => row! { "a" => item(ty, 10, 1), "b" => "a", "c" => 0.4 },
        })
        .unwrap();
    graph
        .append(row! {
            "a" => item(ty, 2, 1),
            "b" => row! { "a" => item(ty, 10, 1) },
        })
        .unwrap();
    graph
}

fn nested_spec() -> SerializationSpec {
    SerializationSpec::new()
        .with("a", SlotSerializer::new())
        .with(
            "b",
            SlotSerializer::new().sub(
                SerializationSpec::new()
                    .with("a", SlotSerializer::new())
                    .with("b", SlotSerializer::new())
                    .with("c", SlotSerializer::new().head_or(json!(100))),
            ),
        )
}

#[test]
fn nested_rows_fill_one_graph_per_parent() {
    let ty = item_type();
    let graph = filled(&ty);

    assert_eq!(graph.len("a").unwrap(), 3);
    assert_eq!(graph.len("b").unwrap(), 3);
    assert_eq!(
        serialize(&graph.view(), &nested_spec()).unwrap(),
        json!({
            "a": [
                {
                    "v": 0, "w": 1,
                    "b": { "a": [
                        { "v": 10, "w": 1, "b": ["a", "b"], "c": 0.1 },
                        { "v": 11, "w": 1, "b": ["b"], "c": 0.3 },
                    ] },
                },
                {
                    "v": 1, "w": 1,
                    "b": { "a": [{ "v": 10, "w": 1, "b": ["a"], "c": 0.4 }] },
                },
                {
                    "v": 2, "w": 1,
                    "b": { "a": [{ "v": 10, "w": 1, "b": [], "c": 100 }] },
                },
            ],
        })
    );
}

#[test]
fn nested_graphs_are_reachable_from_views() {
    let ty = item_type();
    let graph = filled(&ty);
    let view = graph.view();

    let first = view.nodes("a").unwrap().first().unwrap();
    assert!(first.graph().is_none());
    let holder = first.child("b").unwrap().unwrap();
    assert!(holder.entity().is_absent());

    let nested = holder.graph().unwrap();
    assert_eq!(nested.template().label(), "default");
    assert_eq!(nested.nodes("a").unwrap().len(), 2);
    let v10 = nested.nodes("a").unwrap().first().unwrap();
    assert_eq!(v10.children("c").unwrap().len(), 2);
}

#[test]
fn default_serialization_of_nested_graphs() {
    let ty = item_type();
    let mut graph = Graph::new(outer(&ty));
    graph
        .append(row! {
            "a" => item(&ty, 2, 1),
            "b" => row! { "a" => item(&ty, 10, 1) },
        })
        .unwrap();

    let spec = SerializationSpec::all(graph.template());
    assert_eq!(
        serialize(&graph.view(), &spec).unwrap(),
        json!({ "a": [{ "v": 2, "w": 1, "b": { "a": [{ "v": 10, "w": 1, "b": [], "c": [] }] } }] })
    );

    // Without a nested spec every nested graph is listed.
    let spec = spec.with("b", SlotSerializer::new());
    assert_eq!(
        serialize(&graph.view(), &spec).unwrap()["a"][0]["b"],
        json!([{ "a": [{ "v": 10, "w": 1, "b": [], "c": [] }] }])
    );
}

#[test]
fn schema_describes_nested_graphs() {
    let ty = item_type();
    let template = outer(&ty);
    let spec = nested_spec();
    let shape = schema(&template, &spec).unwrap();

    let Shape::List(item) = &shape.field("a").unwrap().shape else {
        panic!("a is not a list");
    };
    let b = &item.as_record().unwrap().field("b").unwrap().shape;
    assert!(b.is_nullable());
    let nested = b.as_record().unwrap();
    assert_eq!(nested.keys().collect::<Vec<_>>(), ["a"]);
    let Shape::List(nested_item) = &nested.field("a").unwrap().shape else {
        panic!("nested a is not a list");
    };
    let nested_item = nested_item.as_record().unwrap();
    assert_eq!(nested_item.keys().collect::<Vec<_>>(), ["v", "w", "b", "c"]);
    assert_eq!(nested_item.field("c").unwrap().shape, Shape::Scalar(ScalarType::Real));

    let data = serialize(&filled(&ty).view(), &spec).unwrap();
    assert!(Shape::Record(shape.root.clone()).admits(&data));
}

#[test]
fn transform_chains_receive_nested_output() {
    let ty = item_type();
    let graph = filled(&ty);
    let spec = nested_spec().with(
        "b",
        SlotSerializer::new()
            .sub(SerializationSpec::all(&inner(&ty)))
            .each(|_, v| Ok(json!(v["a"].as_array().map_or(0, Vec::len)))),
    );
    let out = serialize(&graph.view(), &spec).unwrap();
    assert_eq!(out["a"][0]["b"], json!(2));
    assert_eq!(out["a"][2]["b"], json!(1));
}

#[test]
fn replace_reaches_into_nested_graphs() {
    let ty = item_type();
    let mut graph = filled(&ty);
    graph
        .replace(row! { "a" => item(&ty, 1, 1), "b" => row! { "a" => item(&ty, 10, 7) } })
        .unwrap();
    let out = serialize(&graph.view(), &nested_spec()).unwrap();
    assert_eq!(out["a"][1]["b"]["a"][0]["w"], json!(7));
    assert_eq!(out["a"][0]["b"]["a"][0]["w"], json!(1));
}

#[test]
fn failed_nested_rows_roll_back_the_whole_call() {
    let ty = item_type();
    let mut graph = filled(&ty);
    let before = serialize(&graph.view(), &nested_spec()).unwrap();

    // `b` of the nested graph has no parent in the nested row.
    let err = graph
        .append(row! {
            "a" => item(&ty, 5, 1),
            "b" => row! { "b" => "x" },
        })
        .unwrap_err();
    assert!(matches!(err, AppendError::UnresolvedParent(slot) if slot == "b"));
    assert_eq!(graph.len("a").unwrap(), 3);
    assert_eq!(graph.len("b").unwrap(), 3);
    assert_eq!(serialize(&graph.view(), &nested_spec()).unwrap(), before);
}

#[test]
fn outer_failure_restores_nested_graphs() {
    let ty = item_type();
    let sub = inner(&ty);
    let mut b = GraphTemplate::builder();
    b.declare("a", &ty).unwrap();
    b.declare("b", &sub).unwrap();
    b.declare("e", &ty).unwrap();
    b.relate("a", ["b"]).unwrap();
    b.relate("b", ["e"]).unwrap();
    let template = b.build();

    let mut graph = Graph::new(template);
    graph
        .append(row! {
            "a" => item(&ty, 0, 1),
            "b" => row! { "a" => item(&ty, 10, 1) },
        })
        .unwrap();

    // The nested row lands, then the key-only `e` matches nothing.
    let err = graph
        .append(row! {
            "a" => item(&ty, 0, 1),
            "b" => row! { "a" => item(&ty, 12, 1) },
            "e" => record!(ty, { "v" => 99 }).unwrap(),
        })
        .unwrap_err();
    assert!(matches!(err, AppendError::UnresolvedParent(slot) if slot == "e"));

    let view = graph.view();
    let holder = view.nodes("b").unwrap().first().unwrap();
    let nested = holder.graph().unwrap();
    assert_eq!(nested.nodes("a").unwrap().len(), 1);
    assert_eq!(graph.len("e").unwrap(), 0);
}

#[test]
fn graph_slots_without_parents() {
    let ty = item_type();
    let sub = inner(&ty);

    // Root sub-graph slots get a new graph per call.
    let mut b = GraphTemplate::builder();
    b.declare("g", &sub).unwrap();
    let mut graph = Graph::new(b.build());
    graph.append(row! { "g" => row! { "a" => item(&ty, 1, 1) } }).unwrap();
    graph.append(row! { "g" => row! { "a" => item(&ty, 1, 1) } }).unwrap();
    assert_eq!(graph.len("g").unwrap(), 2);

    // Nested ones use the only existing graph.
    let mut graph = Graph::new(outer(&ty));
    assert!(matches!(
        graph.append(row! { "b" => row! { "a" => item(&ty, 1, 1) } }),
        Err(AppendError::UnresolvedParent(slot)) if slot == "b"
    ));
    graph
        .append(row! {
            "a" => item(&ty, 0, 1),
            "b" => row! { "a" => item(&ty, 10, 1) },
        })
        .unwrap();
    graph.append(row! { "b" => row! { "a" => item(&ty, 11, 1) } }).unwrap();
    let view = graph.view();
    let holder = view.nodes("b").unwrap().first().unwrap();
    assert_eq!(holder.graph().unwrap().nodes("a").unwrap().len(), 2);

    let mut graph = filled(&ty);
    assert!(matches!(
        graph.append(row! { "b" => row! { "a" => item(&ty, 11, 1) } }),
        Err(AppendError::AmbiguousParent { slot, matches: 3 }) if slot == "b"
    ));
}

#[test]
fn values_must_match_graph_slots() {
    let ty = item_type();
    let mut graph = Graph::new(outer(&ty));

    assert!(matches!(
        graph.append(row! { "a" => item(&ty, 0, 1), "b" => item(&ty, 1, 1) }),
        Err(AppendError::TypeMismatch { slot, .. }) if slot == "b"
    ));
    assert!(matches!(
        graph.append(row! { "a" => row! { "a" => item(&ty, 1, 1) } }),
        Err(AppendError::TypeMismatch { slot, .. }) if slot == "a"
    ));
    // Nested rows are checked against the nested template.
    assert!(matches!(
        graph.append(row! { "a" => item(&ty, 0, 1), "b" => row! { "c" => "text" } }),
        Err(AppendError::TypeMismatch { slot, .. }) if slot == "c"
    ));
    assert!(matches!(
        graph.append(row! { "a" => item(&ty, 0, 1), "b" => row! { "z" => 1 } }),
        Err(AppendError::UnknownSlot(slot)) if slot == "z"
    ));
    assert!(graph.is_empty());
}

#[test]
fn merge_folds_nested_graphs() {
    let ty = item_type();
    let template = outer(&ty);

    let mut left = Graph::new(template.clone());
    left.append(row! {
        "a" => item(&ty, 0, 1),
        "b" => row! { "a" => item(&ty, 10, 1), "b" => "a" },
    })
    .unwrap();
    let mut right = Graph::new(template.clone());
    right
        .append(row! {
            "a" => item(&ty, 0, 1),
            "b" => row! { "a" => item(&ty, 11, 1) },
        })
        .unwrap();
    right
        .append(row! {
            "a" => item(&ty, 1, 1),
            "b" => row! { "a" => item(&ty, 10, 1) },
        })
        .unwrap();

    left.merge(&right.view()).unwrap();
    assert_eq!(left.len("a").unwrap(), 2);
    assert_eq!(left.len("b").unwrap(), 2);
    let out = serialize(&left.view(), &nested_spec()).unwrap();
    assert_eq!(
        out["a"][0]["b"],
        json!({ "a": [
            { "v": 10, "w": 1, "b": ["a"], "c": 100 },
            { "v": 11, "w": 1, "b": [], "c": 100 },
        ] })
    );
    assert_eq!(out["a"][1]["b"], json!({ "a": [{ "v": 10, "w": 1, "b": [], "c": 100 }] }));

    let merged = Graph::from_bases(template, &[right.view(), left.view()]).unwrap();
    assert_eq!(merged.len("b").unwrap(), 2);
    let out = serialize(&merged.view(), &nested_spec()).unwrap();
    assert_eq!(out["a"][0]["b"]["a"][0]["v"], json!(11));
}

#[test]
fn graph_slot_serializer_rules() {
    let ty = item_type();
    let template = outer(&ty);

    let spec = SerializationSpec::all(&template)
        .with("a", SlotSerializer::new().sub(SerializationSpec::all(&inner(&ty))));
    assert!(matches!(
        schema(&template, &spec),
        Err(SerializeError::NotASubgraph(slot)) if slot == "a"
    ));

    let spec = SerializationSpec::all(&template)
        .with("b", SlotSerializer::new().fold(Shape::Any, |_, _| Ok(json!(null))));
    assert!(matches!(
        schema(&template, &spec),
        Err(SerializeError::FoldOnSubgraph(slot)) if slot == "b"
    ));

    let ghost = SerializationSpec::new().with("ghost", SlotSerializer::new());
    let spec = SerializationSpec::all(&template).with("b", SlotSerializer::new().sub(ghost));
    assert!(matches!(
        schema(&template, &spec),
        Err(SerializeError::UnknownSlot(slot)) if slot == "ghost"
    ));
}
