//! A post's comment listing arrives as `[]`, `{"count": n}` or a full
//! `{"data": [...], "count": n}` envelope; all three map to the same
//! `Connection` field.

mod common;

use common::{Post, init_logging};
use graphbind::{ConnectionKeys, JsonMapper, Shape, classify};
use serde_json::json;

#[test]
fn empty_array_means_no_comments() -> anyhow::Result<()> {
    init_logging();
    let post: Post = JsonMapper::new().from_json(common::POST_WITH_EMPTY_COMMENTS)?;

    let comments = post.comments.expect("comments connection");
    assert_eq!(comments.total_count(), 0);
    assert_eq!(comments.explicit_total_count(), None);
    assert!(comments.is_empty());
    Ok(())
}

#[test]
fn count_only_envelope_keeps_the_aggregate() -> anyhow::Result<()> {
    init_logging();
    let post: Post = JsonMapper::new().from_json(common::POST_WITH_COMMENT_COUNT_ONLY)?;

    let comments = post.comments.expect("comments connection");
    assert_eq!(comments.total_count(), 3);
    assert!(comments.data().is_empty());
    Ok(())
}

#[test]
fn full_envelope_maps_items_count_and_paging() -> anyhow::Result<()> {
    init_logging();
    let post: Post = JsonMapper::new().from_json(common::POST_WITH_NORMAL_COMMENTS)?;

    let comments = post.comments.expect("comments connection");
    assert_eq!(comments.total_count(), 1);
    assert_eq!(comments.len(), 1);

    let first = &comments.data()[0];
    assert_eq!(first.id.as_deref(), Some("159764610718391_1"));
    assert_eq!(first.message.as_deref(), Some("First!"));
    assert_eq!(first.like_count, Some(2));
    assert_eq!(
        comments.paging().and_then(|p| p.get("next")),
        Some(&json!("https://graph.example.com/159764610718391/comments?after=MQ"))
    );
    Ok(())
}

#[test]
fn fixtures_cover_every_shape() -> anyhow::Result<()> {
    let mapper = JsonMapper::new();
    let keys = ConnectionKeys::default();
    let shapes: Vec<Shape> = [
        common::POST_WITH_EMPTY_COMMENTS,
        common::POST_WITH_COMMENT_COUNT_ONLY,
        common::POST_WITH_NORMAL_COMMENTS,
    ]
    .into_iter()
    .map(|fixture| mapper.parse(fixture).map(|post| classify(&post["comments"], &keys)))
    .collect::<Result<_, _>>()?;

    assert_eq!(
        shapes,
        vec![Shape::BareArray, Shape::AggregateOnly, Shape::WithItems]
    );
    Ok(())
}

#[test]
fn unusable_listing_degrades_to_empty() -> anyhow::Result<()> {
    let post: Post = JsonMapper::new().from_json(r#"{"id": "1", "comments": "none"}"#)?;
    let comments = post.comments.expect("comments connection");
    assert!(comments.is_empty());
    assert_eq!(comments.total_count(), 0);
    Ok(())
}

#[test]
fn integral_float_count_is_an_explicit_count() -> anyhow::Result<()> {
    let post: Post = JsonMapper::new().from_json(r#"{"comments": {"count": 3.0}}"#)?;
    let comments = post.comments.expect("comments connection");
    assert_eq!(comments.explicit_total_count(), Some(3));
    Ok(())
}
