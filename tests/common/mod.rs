#![allow(dead_code)]

use std::sync::Arc;

use relgraph::prelude::*;

pub const BLOG: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("title", ScalarType::Text).doc("Blog title"),
];

pub const POST: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("blog_id", ScalarType::Integer).references("blog", "id"),
    AttributeDef::new("title", ScalarType::Text),
];

pub const AUTHOR: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("name", ScalarType::Text),
];

pub const COMMENT: &[AttributeDef] = &[
    AttributeDef::new("id", ScalarType::Integer).primary_key(),
    AttributeDef::new("post_id", ScalarType::Integer).references("post", "id"),
    AttributeDef::new("body", ScalarType::Text).nullable(),
];

pub const NOTE: &[AttributeDef] = &[
    AttributeDef::new("text", ScalarType::Text),
    AttributeDef::new("weight", ScalarType::Real).nullable(),
];

pub struct Types {
    pub blog: Arc<EntityType>,
    pub post: Arc<EntityType>,
    pub author: Arc<EntityType>,
    pub comment: Arc<EntityType>,
    pub note: Arc<EntityType>,
}

pub fn types() -> Types {
    Types {
        blog: EntityType::from_defs("blog", BLOG).unwrap(),
        post: EntityType::from_defs("post", POST).unwrap(),
        author: EntityType::from_defs("author", AUTHOR).unwrap(),
        comment: EntityType::from_defs("comment", COMMENT).unwrap(),
        note: EntityType::from_defs("note", NOTE).unwrap(),
    }
}

/// `blog -> post`
pub fn blog_posts(t: &Types) -> Arc<GraphTemplate> {
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    b.declare("post", &t.post).unwrap();
    b.relate("blog", ["post"]).unwrap();
    b.build()
}

/// `blog -> post -> comment`, `blog -> tag`
pub fn blog_tree(t: &Types) -> Arc<GraphTemplate> {
    let mut b = GraphTemplate::builder();
    b.declare("blog", &t.blog).unwrap();
    b.declare("post", &t.post).unwrap();
    b.declare("comment", &t.comment).unwrap();
    b.declare("tag", ScalarType::Text).unwrap();
    b.relate("blog", ["post", "tag"]).unwrap();
    b.relate("post", ["comment"]).unwrap();
    b.build()
}

pub fn blog(t: &Types, id: i64, title: &str) -> Record {
    record!(t.blog, { "id" => id, "title" => title }).unwrap()
}

pub fn blog_ref(t: &Types, id: i64) -> Record {
    record!(t.blog, { "id" => id }).unwrap()
}

pub fn post(t: &Types, id: i64, blog_id: i64, title: &str) -> Record {
    record!(t.post, { "id" => id, "blog_id" => blog_id, "title" => title }).unwrap()
}

pub fn comment(t: &Types, id: i64, post_id: i64, body: &str) -> Record {
    record!(t.comment, { "id" => id, "post_id" => post_id, "body" => body }).unwrap()
}

pub fn author(t: &Types, id: i64, name: &str) -> Record {
    record!(t.author, { "id" => id, "name" => name }).unwrap()
}

/// Slot names in the order `nodes` yields them.
pub fn titles(view: &GraphView<'_>, slot: &str) -> Vec<String> {
    view.nodes(slot)
        .unwrap()
        .entities()
        .map(|e| {
            e.as_record()
                .and_then(|r| r.get("title"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        })
        .collect()
}
