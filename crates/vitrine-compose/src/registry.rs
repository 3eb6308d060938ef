//! Mapping from page-model type labels to renderers.
//!
//! The set of renderers is closed: built-in container layouts plus the
//! storefront's component kinds. A [`MappingRegistry`] is an immutable table
//! from label to [`Renderer`], validated at construction so that no label is
//! mapped twice. Lookup is exact and case-sensitive; there is no fallback
//! between labels.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};
use vitrine_context::ConfigurationError;

/// Built-in container layouts provided by the page SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum ContainerLayout {
    /// Children stacked vertically, each in its own block.
    #[strum(serialize = "hst.vbox")]
    VBox,
    /// Children emitted without any wrapper markup.
    #[strum(serialize = "hst.nomarkup")]
    NoMarkup,
    /// Children as an ordered list.
    #[strum(serialize = "hst.orderedlist")]
    OrderedList,
    /// Children as an unordered list.
    #[strum(serialize = "hst.unorderedlist")]
    UnorderedList,
    /// Children as inline spans.
    #[strum(serialize = "hst.span")]
    Span,
}

/// Storefront component renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum ComponentKind {
    /// Grid of banners.
    BannerCollection,
    /// Banner with title, rich text and call-to-action link.
    BannerCTA,
    /// Highlighted product category.
    CategoryHighlight,
    /// Generic content document.
    Content,
    /// Full content page.
    ContentPage,
    /// Image gallery.
    Images,
    /// Information block.
    #[strum(serialize = "Info")]
    Information,
    /// Embedded map.
    Map,
    /// Menu.
    Menu,
    /// Carousel showing several banners at once.
    MultiBannerCarousel,
    /// Site navigation.
    Navigation,
    /// Product catalog page.
    PageCatalog,
    /// Pathways recommendation widget.
    PathwaysRecommendations,
    /// Product detail.
    Product,
    /// Product grid.
    ProductGrid,
    /// Highlighted product.
    ProductHighlight,
    /// Carousel showing one banner at a time.
    SingleBannerCarousel,
    /// Extended single-banner carousel.
    SingleBannerCarouselX,
    /// Search bar.
    SearchBar,
    /// Title with text.
    TitleAndText,
    /// Embedded video.
    Video,
}

/// A renderer a type label can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renderer {
    /// Structural container with a built-in layout.
    Container(ContainerLayout),
    /// Storefront component.
    Component(ComponentKind),
}

impl Renderer {
    /// The label this renderer is registered under by default.
    #[must_use]
    pub fn default_label(self) -> &'static str {
        match self {
            Self::Container(layout) => layout.into(),
            Self::Component(kind) => kind.into(),
        }
    }

    /// Every renderer in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        ContainerLayout::iter()
            .map(Self::Container)
            .chain(ComponentKind::iter().map(Self::Component))
    }
}

impl Serialize for Renderer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.default_label())
    }
}

/// Result of a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The label is mapped to this renderer.
    Mapped(Renderer),
    /// No renderer is registered for the label.
    Unmapped,
}

/// Immutable table from type label to renderer.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    entries: HashMap<String, Renderer>,
}

impl MappingRegistry {
    /// Build a registry from explicit `(label, renderer)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateTypeLabel`] if a label appears
    /// more than once.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (S, Renderer)>,
        S: Into<String>,
    {
        let mut table = HashMap::new();
        for (label, renderer) in entries {
            match table.entry(label.into()) {
                Entry::Occupied(entry) => {
                    return Err(ConfigurationError::DuplicateTypeLabel(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    let _ = entry.insert(renderer);
                }
            }
        }
        Ok(Self { entries: table })
    }

    /// The storefront's default mapping: every renderer under its default label.
    #[must_use]
    pub fn storefront() -> Self {
        Self {
            entries: Renderer::all()
                .map(|renderer| (renderer.default_label().to_string(), renderer))
                .collect(),
        }
    }

    /// Start building a registry.
    #[must_use]
    pub fn builder() -> MappingRegistryBuilder {
        MappingRegistryBuilder::default()
    }

    /// Look a type label up. Never fails; unknown labels are [`Lookup::Unmapped`].
    #[must_use]
    pub fn resolve(&self, type_label: &str) -> Lookup {
        self.entries
            .get(type_label)
            .map_or(Lookup::Unmapped, |renderer| Lookup::Mapped(*renderer))
    }

    /// Number of mapped labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no label is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapped labels, sorted.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
}

/// Incremental construction of a [`MappingRegistry`].
#[derive(Debug, Clone, Default)]
pub struct MappingRegistryBuilder {
    entries: Vec<(String, Renderer)>,
}

impl MappingRegistryBuilder {
    /// Add every renderer under its default label.
    #[must_use]
    pub fn storefront_defaults(mut self) -> Self {
        self.entries.extend(
            Renderer::all().map(|renderer| (renderer.default_label().to_string(), renderer)),
        );
        self
    }

    /// Map `label` to `renderer`.
    #[must_use]
    pub fn map(mut self, label: impl Into<String>, renderer: Renderer) -> Self {
        self.entries.push((label.into(), renderer));
        self
    }

    /// Validate and build the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateTypeLabel`] if a label was added
    /// more than once.
    pub fn build(self) -> Result<MappingRegistry, ConfigurationError> {
        MappingRegistry::new(self.entries)
    }
}
