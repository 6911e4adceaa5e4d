//! Raw map elements as they arrive from a source reader.
//!
//! A [`RawElement`] owns every attribute and child marker of one top-level
//! `node` or `way`. Nothing here interprets the values; shaping does that.

use std::fmt;

/// The two element kinds the pipeline shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A positioned point entity (`<node>`).
    Node,
    /// An ordered-reference path entity (`<way>`).
    Way,
}

impl ElementKind {
    /// Markup tag name for the kind.
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
        }
    }

    /// Parse a markup tag name, returning `None` for kinds we do not shape.
    #[must_use]
    pub fn from_tag_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Ordered attribute list of one markup tag.
///
/// Attribute order is preserved and lookups are linear; elements carry a
/// handful of attributes so a map would only add allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Build an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Look up the first attribute with `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// One fully materialised top-level element.
///
/// # Examples
/// ```
/// use mapclean_core::{Attributes, ElementKind, RawElement};
///
/// let mut way = RawElement::new(
///     ElementKind::Way,
///     Attributes::from_iter([("id", "7")]),
/// );
/// way.push_node_ref(Attributes::from_iter([("ref", "1")]));
/// way.push_tag(Attributes::from_iter([("k", "highway"), ("v", "residential")]));
///
/// assert_eq!(way.id(), Some("7"));
/// assert_eq!(way.node_refs().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    kind: ElementKind,
    attributes: Attributes,
    tags: Vec<Attributes>,
    node_refs: Vec<Attributes>,
}

impl RawElement {
    /// Start an element with its own attributes and no children.
    #[must_use]
    pub const fn new(kind: ElementKind, attributes: Attributes) -> Self {
        Self {
            kind,
            attributes,
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    /// Append a `<tag>` child.
    pub fn push_tag(&mut self, attributes: Attributes) {
        self.tags.push(attributes);
    }

    /// Append an `<nd>` child.
    pub fn push_node_ref(&mut self, attributes: Attributes) {
        self.node_refs.push(attributes);
    }

    /// Element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Element attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The `id` attribute, when present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id")
    }

    /// `<tag>` children in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[Attributes] {
        &self.tags
    }

    /// `<nd>` children in declaration order.
    #[must_use]
    pub fn node_refs(&self) -> &[Attributes] {
        &self.node_refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"node".as_slice(), Some(ElementKind::Node))]
    #[case(b"way".as_slice(), Some(ElementKind::Way))]
    #[case(b"relation".as_slice(), None)]
    #[case(b"tag".as_slice(), None)]
    fn recognises_shaped_kinds(#[case] name: &[u8], #[case] expected: Option<ElementKind>) {
        assert_eq!(ElementKind::from_tag_name(name), expected);
    }

    #[rstest]
    fn attribute_lookup_returns_first_match() {
        let attributes = Attributes::from_iter([("k", "name"), ("v", "Main"), ("k", "other")]);
        assert_eq!(attributes.get("k"), Some("name"));
        assert_eq!(attributes.get("missing"), None);
        assert_eq!(attributes.len(), 3);
    }

    #[rstest]
    fn children_keep_declaration_order() {
        let mut way = RawElement::new(ElementKind::Way, Attributes::from_iter([("id", "1")]));
        for reference in ["30", "10", "20"] {
            way.push_node_ref(Attributes::from_iter([("ref", reference)]));
        }
        let refs: Vec<_> = way
            .node_refs()
            .iter()
            .filter_map(|attributes| attributes.get("ref"))
            .collect();
        assert_eq!(refs, ["30", "10", "20"]);
    }
}
