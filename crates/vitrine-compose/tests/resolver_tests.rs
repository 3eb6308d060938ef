//! Integration tests for content reference resolution.

use vitrine_compose::{ContentResolver, FieldLookup, ItemContent};
use vitrine_model::{
    ContentDocument, DocumentRef, NodeModel, PageModel, PageSnapshot, Payload, Value,
};
use vitrine_richtext::LinkResolver;

fn snapshot() -> PageSnapshot {
    let banner = NodeModel::item("i1", "BannerCTA")
        .field("title", "Sale")
        .field("link", DocumentRef::new("doc-1"))
        .field("broken", DocumentRef::new("gone"))
        .field(
            "meta",
            Payload::new()
                .with("author", "Ada")
                .with("page", DocumentRef::new("doc-2")),
        );
    let referenced = NodeModel::item("i2", "TitleAndText").content_ref("doc-2");
    let dangling = NodeModel::item("i3", "TitleAndText").content_ref("nowhere");
    let model = PageModel::new(
        NodeModel::container("root", "Main")
            .child(banner)
            .child(referenced)
            .child(dangling),
    )
    .document(ContentDocument::new("doc-1", Some("/sale".to_string())))
    .document(
        ContentDocument::new("doc-2", Some("about".to_string()))
            .with_fields(Payload::new().with("title", "About")),
    );
    PageSnapshot::from_model(model)
        .unwrap()
        .with_base_url(Some("https://shop.example.com/".to_string()))
}

fn payload(snapshot: &PageSnapshot, id: &str) -> Payload {
    let node = snapshot.node_by_id(id).unwrap();
    snapshot.get(node).unwrap().payload.clone()
}

#[test]
fn test_missing_and_absent_reference_are_distinct() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let payload = payload(&snapshot, "i1");

    assert_eq!(resolver.resolve_field(&payload, "subtitle"), FieldLookup::Missing);
    assert!(matches!(
        resolver.resolve_field(&payload, "broken"),
        FieldLookup::AbsentReference(reference) if reference.id() == "gone"
    ));
    assert_ne!(
        resolver.resolve_field(&payload, "subtitle"),
        resolver.resolve_field(&payload, "broken")
    );
}

#[test]
fn test_value_and_document_lookups() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let payload = payload(&snapshot, "i1");

    let title = resolver.resolve_field(&payload, "title");
    assert_eq!(title.as_str(), Some("Sale"));
    assert!(title.is_present());

    let link = resolver.resolve_field(&payload, "link");
    assert_eq!(link.as_document().map(|doc| doc.id.as_str()), Some("doc-1"));
}

#[test]
fn test_field_names_are_exact() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let payload = payload(&snapshot, "i1");
    assert_eq!(resolver.resolve_field(&payload, "Title"), FieldLookup::Missing);
}

#[test]
fn test_nested_payload_is_a_value() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let payload = payload(&snapshot, "i1");
    assert!(matches!(
        resolver.resolve_field(&payload, "meta"),
        FieldLookup::Value(Value::Payload(inner)) if inner.len() == 2
    ));
}

#[test]
fn test_resolve_path() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let payload = payload(&snapshot, "i1");

    assert_eq!(resolver.resolve_path(&payload, "meta/author").as_str(), Some("Ada"));
    assert_eq!(resolver.resolve_path(&payload, "meta/page/title").as_str(), Some("About"));
    assert_eq!(resolver.resolve_path(&payload, "meta/missing"), FieldLookup::Missing);
    assert_eq!(resolver.resolve_path(&payload, "title/deeper"), FieldLookup::Missing);
    assert!(matches!(
        resolver.resolve_path(&payload, "broken/title"),
        FieldLookup::AbsentReference(_)
    ));
    assert_eq!(resolver.resolve_path(&payload, ""), FieldLookup::Missing);
}

#[test]
fn test_item_content() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);
    let node = |id: &str| snapshot.get(snapshot.node_by_id(id).unwrap()).unwrap();

    assert!(matches!(resolver.item_content(node("i1")), ItemContent::Inline(p) if p.contains("title")));
    assert!(matches!(
        resolver.item_content(node("i2")),
        ItemContent::Referenced(doc) if doc.id == "doc-2"
    ));
    assert!(matches!(
        resolver.item_content(node("i3")),
        ItemContent::Broken(reference) if reference.id() == "nowhere"
    ));
}

#[test]
fn test_resolve_reference_and_links() {
    let snapshot = snapshot();
    let resolver = ContentResolver::new(&snapshot);

    assert!(resolver.resolve_reference(&DocumentRef::new("doc-1")).is_some());
    assert!(resolver.resolve_reference(&DocumentRef::new("gone")).is_none());
    assert_eq!(
        resolver.resolve_link("doc-1").as_deref(),
        Some("https://shop.example.com/sale")
    );
    assert_eq!(
        resolver.resolve_link("doc-2").as_deref(),
        Some("https://shop.example.com/about")
    );
    assert_eq!(resolver.resolve_link("gone"), None);
}
