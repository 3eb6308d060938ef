//! Integration tests for the mapping registry.

use vitrine_compose::{ComponentKind, ContainerLayout, Lookup, MappingRegistry, Renderer};
use vitrine_context::ConfigurationError;

#[test]
fn test_storefront_labels() {
    let registry = MappingRegistry::storefront();
    assert_eq!(registry.len(), 26);
    assert_eq!(
        registry.resolve("BannerCTA"),
        Lookup::Mapped(Renderer::Component(ComponentKind::BannerCTA))
    );
    assert_eq!(
        registry.resolve("Info"),
        Lookup::Mapped(Renderer::Component(ComponentKind::Information))
    );
    assert_eq!(
        registry.resolve("hst.vbox"),
        Lookup::Mapped(Renderer::Container(ContainerLayout::VBox))
    );
    assert!(registry.labels().contains(&"SingleBannerCarouselX"));
}

#[test]
fn test_lookup_is_exact() {
    let registry = MappingRegistry::storefront();
    assert_eq!(registry.resolve("bannercta"), Lookup::Unmapped);
    assert_eq!(registry.resolve("BannerCTA "), Lookup::Unmapped);
    assert_eq!(registry.resolve("Information"), Lookup::Unmapped);
    assert_eq!(registry.resolve(""), Lookup::Unmapped);
}

#[test]
fn test_duplicate_label_rejected() {
    let err = MappingRegistry::new([
        ("Hero", Renderer::Component(ComponentKind::BannerCTA)),
        ("Hero", Renderer::Component(ComponentKind::Video)),
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigurationError::DuplicateTypeLabel(ref label) if label == "Hero"));
}

#[test]
fn test_builder_extends_defaults() {
    let registry = MappingRegistry::builder()
        .storefront_defaults()
        .map("Hero", Renderer::Component(ComponentKind::BannerCTA))
        .build()
        .unwrap();
    assert_eq!(registry.len(), 27);
    assert_eq!(registry.resolve("Hero"), registry.resolve("BannerCTA"));
}

#[test]
fn test_builder_rejects_default_collision() {
    let result = MappingRegistry::builder()
        .storefront_defaults()
        .map("Video", Renderer::Component(ComponentKind::Map))
        .build();
    assert!(matches!(result, Err(ConfigurationError::DuplicateTypeLabel(_))));
}

#[test]
fn test_empty_registry_maps_nothing() {
    let registry = MappingRegistry::new(Vec::<(String, Renderer)>::new()).unwrap();
    assert!(registry.is_empty());
    assert_eq!(registry.resolve("BannerCTA"), Lookup::Unmapped);
}

#[test]
fn test_default_labels_round_trip() {
    let registry = MappingRegistry::storefront();
    for renderer in Renderer::all() {
        assert_eq!(registry.resolve(renderer.default_label()), Lookup::Mapped(renderer));
    }
}
