use relgraph::error::TemplateError;
use relgraph::prelude::*;
use relgraph::{Slot, SlotKind};

mod common;
use common::*;

#[test]
fn declare_and_query() {
    let t = types();
    let template = blog_tree(&t);

    assert_eq!(template.len(), 4);
    let blog = template.slot("blog").unwrap();
    assert!(blog.is_root());
    assert_eq!(blog.entity_kind(), &SlotKind::Record(t.blog.clone()));
    assert_eq!(blog.identity().name(), "primary_key");
    assert_eq!(template.children("blog").unwrap(), ["post", "tag"]);
    assert_eq!(template.parents("comment").unwrap(), ["post"]);
    assert_eq!(template.slot("tag").unwrap().identity().name(), "never");

    let roots: Vec<_> = template.roots().map(Slot::name).collect();
    assert_eq!(roots, ["blog"]);
}

#[test]
fn unknown_slot_queries_fail() {
    let t = types();
    let template = blog_posts(&t);
    assert_eq!(
        template.slot("nope").unwrap_err(),
        TemplateError::UnknownSlot("nope".into())
    );
    assert!(template.children("nope").is_err());
    assert!(template.get("nope").is_none());
}

#[test]
fn duplicate_slot_is_rejected() {
    let t = types();
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    assert_eq!(
        b.declare("blog", &t.post).unwrap_err(),
        TemplateError::DuplicateSlot("blog".into())
    );
}

#[test]
fn relate_checks_both_sides() {
    let t = types();
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    assert_eq!(
        b.relate("blog", ["post"]).unwrap_err(),
        TemplateError::UnknownSlot("post".into())
    );
    assert_eq!(
        b.relate("post", ["blog"]).unwrap_err(),
        TemplateError::UnknownSlot("post".into())
    );
}

#[test]
fn cycles_are_rejected() {
    let t = types();
    let mut b = GraphTemplate::builder();
    b.declare_all([("blog", &t.blog), ("post", &t.post), ("comment", &t.comment)])
        .unwrap();
    b.relate("blog", ["post"]).unwrap();
    b.relate("post", ["comment"]).unwrap();

    assert!(matches!(
        b.relate("comment", ["blog"]),
        Err(TemplateError::CycleDetected { .. })
    ));
    assert!(matches!(
        b.relate("blog", ["blog"]),
        Err(TemplateError::CycleDetected { .. })
    ));

    // The failed relations left the template untouched.
    let template = b.build();
    assert!(template.slot("blog").unwrap().is_root());
    assert_eq!(template.children("comment").unwrap(), Vec::<&str>::new());
}

#[test]
fn relate_is_idempotent() {
    let t = types();
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    b.declare("post", &t.post).unwrap();
    b.relate("blog", ["post"]).unwrap();
    b.relate("blog", ["post", "post"]).unwrap();
    let template = b.build();
    assert_eq!(template.children("blog").unwrap(), ["post"]);
    assert_eq!(template.parents("post").unwrap(), ["blog"]);
}

#[test]
fn primary_key_policy_requires_record_slot() {
    let mut b = GraphTemplate::builder();
    let err = b
        .declare("n", SlotDecl::scalar(ScalarType::Integer).identity(PrimaryKey))
        .unwrap_err();
    assert!(matches!(err, TemplateError::PolicyMismatch { ref slot, .. } if slot == "n"));
}

#[test]
fn typed_slots_resolve_through_the_registry() {
    let t = types();
    let mut registry = TypeRegistry::new();
    registry.register(t.author.clone()).unwrap();
    let spec = GraphSpec::default().with_registry(registry);

    let mut b = spec.new_template();
    b.declare("author", SlotDecl::typed("author")).unwrap();
    assert!(matches!(
        b.declare("ghost", SlotDecl::typed("ghost")),
        Err(TemplateError::Type(_))
    ));
    let template = b.build();
    assert_eq!(
        template.slot("author").unwrap().entity_kind().entity_type().unwrap().name(),
        "author"
    );
}

#[test]
fn fan_in_is_allowed() {
    let t = types();
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    b.declare("author", &t.author).unwrap();
    b.declare("post", &t.post).unwrap();
    b.relate("blog", ["post"]).unwrap();
    b.relate("author", ["post"]).unwrap();
    let template = b.build();

    assert_eq!(template.parents("post").unwrap(), ["blog", "author"]);
    let order: Vec<_> = template.slots().map(Slot::name).collect();
    assert_eq!(order, ["blog", "author", "post"]);
}

#[test]
fn include_composes_templates() {
    let t = types();
    let base = blog_posts(&t);

    let mut b = GraphTemplate::builder();
    b.include(&base).unwrap();
    b.declare("comment", &t.comment).unwrap();
    b.relate("post", ["comment"]).unwrap();
    let template = b.build();

    assert_eq!(template.len(), 3);
    assert_eq!(template.children("post").unwrap(), ["comment"]);
    assert_eq!(template.parents("post").unwrap(), ["blog"]);

    let mut clash = GraphTemplate::builder();
    clash.declare("post", &t.post).unwrap();
    assert_eq!(
        clash.include(&base).unwrap_err(),
        TemplateError::DuplicateSlot("post".into())
    );
}

#[test]
fn template_is_shared_across_threads() {
    let t = types();
    let template = blog_posts(&t);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let template = template.clone();
            let t = types();
            std::thread::spawn(move || {
                let mut graph = Graph::new(template);
                graph
                    .append(row! {
                        "blog" => blog(&t, i, "A"),
                        "post" => post(&t, 10 + i, i, "P"),
                    })
                    .unwrap();
                graph.node_count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
