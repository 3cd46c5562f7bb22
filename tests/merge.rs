use relgraph::error::AppendError;
use relgraph::prelude::*;

mod common;
use common::*;

#[test]
fn merge_folds_nodes_by_identity() {
    let t = types();
    let template = blog_tree(&t);

    let mut left = Graph::new(template.clone());
    left.append(row! { "blog" => blog(&t, 1, "A"), "post" => post(&t, 10, 1, "P1") })
        .unwrap();

    let mut right = Graph::new(template.clone());
    right
        .append(row! {
            "blog" => blog(&t, 1, "A"),
            "post" => post(&t, 10, 1, "P1"),
            "comment" => comment(&t, 100, 10, "c"),
        })
        .unwrap();
    right
        .append(row! { "blog" => blog(&t, 2, "B"), "tag" => "x" })
        .unwrap();

    left.merge(&right.view()).unwrap();

    assert_eq!(left.len("blog").unwrap(), 2);
    assert_eq!(left.len("post").unwrap(), 1);
    assert_eq!(left.len("comment").unwrap(), 1);
    assert_eq!(left.len("tag").unwrap(), 1);
    assert_eq!(titles(&left.view(), "blog"), ["A", "B"]);

    let view = left.view();
    let p1 = view.nodes("post").unwrap().first().unwrap();
    assert_eq!(p1.children("comment").unwrap().len(), 1);
}

#[test]
fn from_bases_merges_in_order() {
    let t = types();
    let template = blog_posts(&t);

    let mut a = Graph::new(template.clone());
    a.append(row! { "blog" => blog(&t, 2, "B") }).unwrap();
    let mut b = Graph::new(template.clone());
    b.append(row! { "blog" => blog(&t, 1, "A"), "post" => post(&t, 10, 1, "P") })
        .unwrap();
    b.append(row! { "blog" => blog(&t, 2, "B") }).unwrap();

    let merged = Graph::from_bases(template, &[a.view(), b.view()]).unwrap();
    assert_eq!(titles(&merged.view(), "blog"), ["B", "A"]);
    assert_eq!(merged.len("post").unwrap(), 1);
    assert_eq!(merged.edge_count(), 1);
}

#[test]
fn merge_into_a_wider_template() {
    let t = types();
    let narrow = blog_posts(&t);
    let wide = blog_tree(&t);

    let mut source = Graph::new(narrow);
    source
        .append(row! { "blog" => blog(&t, 1, "A"), "post" => post(&t, 10, 1, "P") })
        .unwrap();

    let mut target = Graph::new(wide);
    target.merge(&source.view()).unwrap();
    target
        .append(row! {
            "blog" => blog_ref(&t, 1),
            "post" => post(&t, 10, 1, "P"),
            "comment" => comment(&t, 1, 10, "c"),
        })
        .unwrap();
    assert_eq!(target.len("post").unwrap(), 1);
    assert_eq!(target.len("comment").unwrap(), 1);
}

#[test]
fn merge_with_unknown_slot_is_atomic() {
    let t = types();
    let mut source = Graph::new(blog_tree(&t));
    source
        .append(row! { "blog" => blog(&t, 1, "A"), "tag" => "x" })
        .unwrap();

    let mut target = Graph::new(blog_posts(&t));
    let err = target.merge(&source.view()).unwrap_err();
    assert_eq!(err, AppendError::UnknownSlot("tag".into()));
    assert!(target.is_empty());
}
