//! Integration tests for tree composition.

use std::sync::Arc;

use quickcheck_macros::quickcheck;
use vitrine_compose::{
    ComponentKind, ContainerLayout, MappingRegistry, Prop, Props, RenderNode, RenderTarget, Renderer,
    compose, compose_path,
};
use vitrine_context::{
    Configuration, ConsentState, ContextPropagator, CookieSnapshot, RuntimeContext,
};
use vitrine_model::{
    ContentDocument, DocumentRef, NodeId, NodeModel, PageModel, PageSnapshot, Payload, Scalar,
    Value,
};

const CONFIG_JSON: &str = r#"{
    "endpoint": "https://cms.example.com/delivery/site/v1/channels/brxsaas/pages",
    "commerce": {
        "graphqlServiceUrl": "https://graphql.example.com/graphql",
        "connector": "brsm",
        "accountEnvId": "pacific",
        "discoveryAccountId": "6413",
        "discoveryDomainKey": "pacific_beauty"
    }
}"#;

fn context() -> Arc<RuntimeContext> {
    let configuration = Configuration::from_json_str(CONFIG_JSON).unwrap();
    ContextPropagator::new()
        .build_context(&configuration, CookieSnapshot::empty(), None)
        .unwrap()
}

fn banner(id: &str) -> NodeModel {
    NodeModel::item(id, "BannerCTA")
        .field("title", "Sale")
        .field("link", DocumentRef::new("doc-1"))
}

fn sale_page(with_document: bool) -> PageSnapshot {
    let mut model = PageModel::new(NodeModel::container("root", "Main").child(banner("i1")));
    if with_document {
        model = model.document(ContentDocument::new("doc-1", Some("/sale".to_string())));
    }
    PageSnapshot::from_model(model).unwrap()
}

fn compose_root(snapshot: &PageSnapshot) -> RenderNode {
    compose(snapshot.root(), snapshot, &MappingRegistry::storefront(), &context())
}

#[test]
fn test_banner_link_resolves() {
    let tree = compose_root(&sale_page(true));

    // "Main" is not a registered layout: structural passthrough.
    assert!(tree.is_passthrough());
    assert_eq!(tree.children.len(), 1);

    let child = &tree.children[0];
    assert_eq!(
        child.target,
        RenderTarget::Mapped(Renderer::Component(ComponentKind::BannerCTA))
    );
    assert_eq!(child.props.text("title"), Some("Sale"));
    assert_eq!(child.props.url("link"), Some("/sale"));
}

#[test]
fn test_banner_with_absent_link_still_renders_title() {
    let tree = compose_root(&sale_page(false));
    let child = &tree.children[0];

    assert!(!child.is_empty());
    assert_eq!(child.props.text("title"), Some("Sale"));
    assert!(child.props.is_unresolved("link"));
    assert_eq!(child.props.url("link"), None);
}

#[test]
fn test_unmapped_container_passes_children_through() {
    let model = PageModel::new(
        NodeModel::container("root", "hst.vbox").child(
            NodeModel::container("wrap", "LegacyWrapper")
                .field("style", "fancy")
                .child(banner("a"))
                .child(NodeModel::item("b", "TitleAndText").field("title", "Hello")),
        ),
    )
    .document(ContentDocument::new("doc-1", Some("/sale".to_string())));
    let snapshot = PageSnapshot::from_model(model).unwrap();
    let tree = compose_root(&snapshot);

    assert_eq!(
        tree.renderer(),
        Some(Renderer::Container(ContainerLayout::VBox))
    );
    let wrap = &tree.children[0];
    assert!(wrap.is_passthrough());
    assert!(wrap.props.is_empty());
    let ids: Vec<&str> = wrap.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(wrap.children[1].props.text("title"), Some("Hello"));
}

#[test]
fn test_mapped_container_payload_becomes_props() {
    let model = PageModel::new(
        NodeModel::container("root", "hst.vbox")
            .field("heading", "Deals")
            .field("link", DocumentRef::new("doc-1"))
            .child(banner("i1")),
    )
    .document(ContentDocument::new("doc-1", Some("/sale".to_string())));
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    assert_eq!(tree.renderer(), Some(Renderer::Container(ContainerLayout::VBox)));
    assert_eq!(tree.props.text("heading"), Some("Deals"));
    assert_eq!(tree.props.url("link"), Some("/sale"));
    assert_eq!(tree.children[0].props.url("link"), Some("/sale"));
}

#[test]
fn test_nested_unmapped_containers_are_not_flattened() {
    let model = PageModel::new(
        NodeModel::container("outer", "Unknown")
            .child(NodeModel::container("inner", "AlsoUnknown").child(banner("i1"))),
    );
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    assert!(tree.is_passthrough());
    assert!(tree.children[0].is_passthrough());
    assert_eq!(tree.children[0].children[0].id, "i1");
}

#[test]
fn test_unmapped_item_is_empty_and_keeps_its_slot() {
    let model = PageModel::new(
        NodeModel::container("root", "hst.nomarkup")
            .child(NodeModel::item("a", "TitleAndText").field("title", "A"))
            .child(NodeModel::item("b", "Carousel3D").field("title", "B"))
            .child(NodeModel::item("c", "TitleAndText").field("title", "C")),
    );
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    let ids: Vec<&str> = tree.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert!(tree.children[1].is_empty());
    assert!(tree.children[1].props.is_empty());
    assert_eq!(tree.children[2].props.text("title"), Some("C"));
}

#[test]
fn test_every_node_shares_one_context() {
    let model = PageModel::new(
        NodeModel::container("root", "hst.vbox")
            .child(banner("a"))
            .child(NodeModel::container("x", "Unknown").child(banner("b")))
            .child(NodeModel::item("c", "Nope")),
    );
    let snapshot = PageSnapshot::from_model(model).unwrap();
    let context = context();
    let tree = compose(snapshot.root(), &snapshot, &MappingRegistry::storefront(), &context);

    assert_eq!(tree.walk().count(), 5);
    assert!(tree.walk().all(|node| Arc::ptr_eq(node.context(), &context)));

    // A consent decision made after composition is visible from every node.
    assert!(tree.walk().all(|node| node.context().consent() == ConsentState::Unknown));
    context.consent_writer().unwrap().acknowledge(true);
    assert!(tree.walk().all(|node| node.context().consent() == ConsentState::Accepted));
    assert!(tree.walk().all(|node| node.context().tracking_allowed()));
}

#[test]
fn test_rich_text_rewritten_in_props() {
    let model = PageModel::new(
        NodeModel::item("i1", "TitleAndText").field(
            "text",
            Value::RichText(r#"<p><a data-type="internal" data-ref="doc-1">Sale</a></p>"#.to_string()),
        ),
    )
    .document(ContentDocument::new("doc-1", Some("/sale".to_string())));
    let snapshot = PageSnapshot::from_model(model)
        .unwrap()
        .with_base_url(Some("https://shop.example.com".to_string()));
    let tree = compose_root(&snapshot);

    assert_eq!(
        tree.props.get("text"),
        Some(&Prop::RichText(
            r#"<p><a href="https://shop.example.com/sale">Sale</a></p>"#.to_string()
        ))
    );
}

#[test]
fn test_item_content_from_reference() {
    let model = PageModel::new(
        NodeModel::container("root", "hst.vbox")
            .child(NodeModel::item("i1", "Content").content_ref("doc-2"))
            .child(NodeModel::item("i2", "Content").content_ref("missing")),
    )
    .document(
        ContentDocument::new("doc-2", Some("/about".to_string()))
            .with_fields(Payload::new().with("title", "About us")),
    );
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    assert_eq!(tree.children[0].props.text("title"), Some("About us"));
    assert!(tree.children[1].is_empty());
    assert_eq!(tree.children[1].id, "i2");
}

#[test]
fn test_documents_embedded_and_cycles_cut() {
    let model = PageModel::new(
        NodeModel::item("i1", "ContentPage").field("page", DocumentRef::new("a")),
    )
    .document(
        ContentDocument::new("a", Some("/a".to_string()))
            .with_fields(Payload::new().with("title", "A").with("next", DocumentRef::new("b"))),
    )
    .document(
        ContentDocument::new("b", Some("/b".to_string()))
            .with_fields(Payload::new().with("back", DocumentRef::new("a"))),
    );
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    let Some(Prop::Document(a)) = tree.props.get("page") else {
        panic!("expected embedded document, got {:?}", tree.props.get("page"));
    };
    assert_eq!(a.url.as_deref(), Some("/a"));
    assert_eq!(a.fields.text("title"), Some("A"));

    let Some(Prop::Document(b)) = a.fields.get("next") else {
        panic!("expected embedded document");
    };
    assert_eq!(
        b.fields.get("back"),
        Some(&Prop::Link {
            id: "a".to_string(),
            url: Some("/a".to_string()),
        })
    );
}

/// Count every prop under `props` and how many of them are embedded documents.
fn count_props(props: &Props) -> (usize, usize) {
    props.iter().fold((0, 0), |(total, documents), (_, prop)| {
        let (t, d) = count_prop(prop);
        (total + t, documents + d)
    })
}

fn count_prop(prop: &Prop) -> (usize, usize) {
    match prop {
        Prop::Document(document) => {
            let (t, d) = count_props(&document.fields);
            (t + 1, d + 1)
        }
        Prop::Nested(inner) => {
            let (t, d) = count_props(inner);
            (t + 1, d)
        }
        Prop::List(items) => items
            .iter()
            .map(count_prop)
            .fold((1, 0), |(t, d), (it, id)| (t + it, d + id)),
        _ => (1, 0),
    }
}

#[test]
fn test_fully_connected_documents_embedded_once() {
    const N: usize = 9;
    let mut model = PageModel::new(
        NodeModel::item("i1", "ContentPage").field("page", DocumentRef::new("d0")),
    );
    for i in 0..N {
        let fields = (0..N)
            .filter(|&j| j != i)
            .fold(Payload::new(), |fields, j| {
                fields.with(format!("to{j}"), DocumentRef::new(format!("d{j}")))
            });
        model = model.document(
            ContentDocument::new(format!("d{i}"), Some(format!("/d{i}"))).with_fields(fields),
        );
    }
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    let (total, documents) = count_props(&tree.props);
    assert_eq!(documents, N);
    assert!(total <= N * N, "{total} props for {N} documents");
}

#[test]
fn test_diamond_shares_document_as_link() {
    let document = |id: &str, fields: Payload| {
        ContentDocument::new(id, Some(format!("/{id}"))).with_fields(fields)
    };
    let model = PageModel::new(
        NodeModel::item("i1", "ContentPage").field("page", DocumentRef::new("a")),
    )
    .document(document(
        "a",
        Payload::new()
            .with("left", DocumentRef::new("b"))
            .with("right", DocumentRef::new("c")),
    ))
    .document(document("b", Payload::new().with("next", DocumentRef::new("d"))))
    .document(document("c", Payload::new().with("next", DocumentRef::new("d"))))
    .document(document("d", Payload::new().with("title", "D")));
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    let (total, documents) = count_props(&tree.props);
    assert_eq!(documents, 4);
    assert_eq!(total, 6);

    let Some(Prop::Document(a)) = tree.props.get("page") else {
        panic!("expected embedded document");
    };
    let next = |side: &str| match a.fields.get(side) {
        Some(Prop::Document(doc)) => doc.fields.get("next").cloned(),
        other => panic!("expected embedded document, got {other:?}"),
    };
    let (left, right) = (next("left"), next("right"));
    let (embedded, linked) = if matches!(left, Some(Prop::Document(_))) {
        (left, right)
    } else {
        (right, left)
    };
    assert!(matches!(embedded, Some(Prop::Document(ref d)) if d.fields.text("title") == Some("D")));
    assert_eq!(
        linked,
        Some(Prop::Link {
            id: "d".to_string(),
            url: Some("/d".to_string()),
        })
    );
}

#[test]
fn test_lists_and_nested_payloads() {
    let model = PageModel::new(
        NodeModel::item("i1", "BannerCollection")
            .field(
                "banners",
                Value::List(vec![
                    Value::Reference(DocumentRef::new("doc-1")),
                    Value::Reference(DocumentRef::new("gone")),
                    Value::from("plain"),
                ]),
            )
            .field("style", Payload::new().with("columns", 3.0)),
    )
    .document(ContentDocument::new("doc-1", Some("/sale".to_string())));
    let tree = compose_root(&PageSnapshot::from_model(model).unwrap());

    let Some(Prop::List(items)) = tree.props.get("banners") else {
        panic!("expected list");
    };
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].url(), Some("/sale"));
    assert!(items[1].is_unresolved());
    assert_eq!(items[2].as_str(), Some("plain"));

    let Some(Prop::Nested(style)) = tree.props.get("style") else {
        panic!("expected nested props");
    };
    assert_eq!(style.get("columns"), Some(&Prop::Scalar(Scalar::Number(3.0))));
}

#[test]
fn test_compose_path() {
    let model = PageModel::new(
        NodeModel::container("root", "Main").child(
            NodeModel::container("m", "hst.vbox")
                .named("main")
                .child(banner("i1").named("banner")),
        ),
    );
    let snapshot = PageSnapshot::from_model(model).unwrap();
    let registry = MappingRegistry::storefront();
    let context = context();

    let main = compose_path("main", &snapshot, &registry, &context).unwrap();
    assert_eq!(main.id, "m");
    assert_eq!(main.name.as_deref(), Some("main"));

    let banner = compose_path("main/banner", &snapshot, &registry, &context).unwrap();
    assert_eq!(banner.id, "i1");

    assert!(compose_path("footer", &snapshot, &registry, &context).is_none());
}

#[test]
fn test_root_outside_snapshot_is_empty() {
    let snapshot = sale_page(true);
    let tree = compose(NodeId(99), &snapshot, &MappingRegistry::storefront(), &context());
    assert!(tree.is_empty());
    assert!(tree.children.is_empty());
}

#[test]
fn test_json_output() {
    let tree = compose_root(&sale_page(true));
    let json = serde_json::to_value(&tree).unwrap();

    assert_eq!(json["target"]["kind"], "passthrough");
    let child = &json["children"][0];
    assert_eq!(child["type"], "BannerCTA");
    assert_eq!(child["target"]["renderer"], "BannerCTA");
    assert_eq!(child["props"]["title"]["kind"], "scalar");
    assert_eq!(child["props"]["title"]["value"], "Sale");
    assert_eq!(child["props"]["link"]["value"]["url"], "/sale");
    assert!(child.get("context").is_none());
}

#[test]
fn test_tree_printer() {
    let printed = compose_root(&sale_page(false)).to_string();
    assert!(printed.starts_with("(Main)#root\n"));
    assert!(printed.contains("  BannerCTA#i1\n"));
    assert!(printed.contains("title = \"Sale\""));
    assert!(printed.contains("link = unresolved doc-1"));
}

/// Child ordering survives any mix of mapped and unmapped children.
#[quickcheck]
fn prop_child_order_preserved(mapped: Vec<bool>) -> bool {
    let mut root = NodeModel::container("root", "hst.vbox");
    for (i, &is_mapped) in mapped.iter().enumerate() {
        let label = if is_mapped { "TitleAndText" } else { "Unregistered" };
        root = root.child(NodeModel::item(&format!("n{i}"), label));
    }
    let snapshot = PageSnapshot::from_model(PageModel::new(root)).unwrap();
    let tree = compose_root(&snapshot);

    tree.children.len() == mapped.len()
        && tree
            .children
            .iter()
            .zip(&mapped)
            .enumerate()
            .all(|(i, (child, &is_mapped))| child.id == format!("n{i}") && child.is_empty() != is_mapped)
}
