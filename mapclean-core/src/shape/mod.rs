//! Reshape raw elements into flat, cleaned record bundles.

use log::debug;
use thiserror::Error;

use crate::{
    Attributes, DEFAULT_TAG_TYPE, ElementKind, PathEntity, PathReference, PointEntity,
    RawElement, ShapedElement, ShapedPath, ShapedPoint, TagRecord, ValueCleaner,
};

/// Characters that disqualify a tag key from export.
pub const PROBLEM_CHARS: [char; 20] = [
    '=', '+', '/', '&', '<', '>', ';', '\'', '"', '?', '%', '#', '$', '@', ',', '.', ' ', '\t',
    '\r', '\n',
];

/// A required attribute was absent from a source element or one of its
/// child markers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "{kind} {} is missing attribute `{attribute}` on <{marker}>",
    .id.as_deref().unwrap_or("<without id>")
)]
pub struct MissingAttributeError {
    /// Kind of the element being shaped.
    pub kind: ElementKind,
    /// Element identifier, when the element has one.
    pub id: Option<String>,
    /// Markup tag carrying the attribute (`node`, `way`, `tag` or `nd`).
    pub marker: &'static str,
    /// Name of the missing attribute.
    pub attribute: &'static str,
}

/// Which cleaning rule a tag key selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// Street names; direction and street-type expansion.
    Street,
    /// Postal codes; range clamp.
    Postcode,
    /// House numbers; truncation.
    HouseNumber,
    /// Building heights; decimal formatting.
    Height,
    /// Any other key; value kept verbatim.
    Other,
}

impl TagCategory {
    /// Classify a source tag key.
    #[must_use]
    pub fn of(key: &str) -> Self {
        match key {
            "addr:street" | "tiger:name_type" | "tiger:name_type_1" | "cityracks.street" => {
                Self::Street
            }
            "addr:postcode" => Self::Postcode,
            "addr:housenumber" | "cityracks.housenum" => Self::HouseNumber,
            "height" | "min_height" => Self::Height,
            _ => Self::Other,
        }
    }
}

/// Whether a key contains any of [`PROBLEM_CHARS`].
#[must_use]
pub fn has_problem_chars(key: &str) -> bool {
    key.contains(PROBLEM_CHARS)
}

/// Split a `namespace:rest` key into its namespace and remainder.
///
/// The namespace is the text before the first colon and must consist of ASCII
/// lowercase letters or underscores; the remainder must start with one.
///
/// # Examples
/// ```
/// use mapclean_core::split_namespace;
///
/// assert_eq!(split_namespace("addr:street"), Some(("addr", "street")));
/// assert_eq!(split_namespace("name:en:short"), Some(("name", "en:short")));
/// assert_eq!(split_namespace("Addr:street"), None);
/// assert_eq!(split_namespace("building"), None);
/// ```
#[must_use]
pub fn split_namespace(key: &str) -> Option<(&str, &str)> {
    let is_lower = |ch: char| ch.is_ascii_lowercase() || ch == '_';
    let (namespace, rest) = key.split_once(':')?;
    (!namespace.is_empty() && namespace.chars().all(is_lower) && rest.starts_with(is_lower))
        .then_some((namespace, rest))
}

/// Turns raw elements into [`ShapedElement`] bundles.
///
/// # Examples
/// ```
/// use mapclean_core::{Attributes, ElementKind, ElementShaper, RawElement, ShapedElement};
///
/// let mut node = RawElement::new(
///     ElementKind::Node,
///     Attributes::from_iter([
///         ("id", "1"), ("lat", "40.7"), ("lon", "-73.9"), ("user", "mapper"),
///         ("uid", "7"), ("version", "1"), ("changeset", "3"),
///         ("timestamp", "2016-01-01T00:00:00Z"),
///     ]),
/// );
/// node.push_tag(Attributes::from_iter([("k", "addr:street"), ("v", "5th Ave")]));
///
/// let ShapedElement::Point(point) = ElementShaper::default().shape(&node)? else {
///     panic!("nodes shape into points");
/// };
/// assert_eq!(point.tags[0].tag_type, "addr");
/// assert_eq!(point.tags[0].key, "street");
/// assert_eq!(point.tags[0].value, "5th Avenue");
/// # Ok::<(), mapclean_core::MissingAttributeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementShaper {
    cleaner: ValueCleaner,
}

impl ElementShaper {
    /// Build a shaper around `cleaner`.
    #[must_use]
    pub const fn new(cleaner: ValueCleaner) -> Self {
        Self { cleaner }
    }

    /// Cleaning rules applied to tag values.
    #[must_use]
    pub const fn cleaner(&self) -> &ValueCleaner {
        &self.cleaner
    }

    /// Shape one element into its record bundle.
    pub fn shape(&self, element: &RawElement) -> Result<ShapedElement, MissingAttributeError> {
        match element.kind() {
            ElementKind::Node => self.shape_point(element).map(ShapedElement::Point),
            ElementKind::Way => self.shape_path(element).map(ShapedElement::Path),
        }
    }

    fn shape_point(&self, element: &RawElement) -> Result<ShapedPoint, MissingAttributeError> {
        let own = |name| required(element, element.attributes(), "node", name);
        let entity = PointEntity {
            id: own("id")?,
            lat: own("lat")?,
            lon: own("lon")?,
            user: own("user")?,
            uid: own("uid")?,
            version: own("version")?,
            changeset: own("changeset")?,
            timestamp: own("timestamp")?,
        };
        let tags = self.shape_tags(element, &entity.id)?;
        Ok(ShapedPoint { entity, tags })
    }

    fn shape_path(&self, element: &RawElement) -> Result<ShapedPath, MissingAttributeError> {
        let own = |name| required(element, element.attributes(), "way", name);
        let entity = PathEntity {
            id: own("id")?,
            user: own("user")?,
            uid: own("uid")?,
            version: own("version")?,
            changeset: own("changeset")?,
            timestamp: own("timestamp")?,
        };
        let references = element
            .node_refs()
            .iter()
            .enumerate()
            .map(|(position, node_ref)| -> Result<_, MissingAttributeError> {
                Ok(PathReference {
                    path_id: entity.id.clone(),
                    node_id: required(element, node_ref, "nd", "ref")?,
                    position,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let tags = self.shape_tags(element, &entity.id)?;
        Ok(ShapedPath {
            entity,
            references,
            tags,
        })
    }

    fn shape_tags(
        &self,
        element: &RawElement,
        owner_id: &str,
    ) -> Result<Vec<TagRecord>, MissingAttributeError> {
        let mut records = Vec::with_capacity(element.tags().len());
        for tag in element.tags() {
            let key = required(element, tag, "tag", "k")?;
            let value = required(element, tag, "tag", "v")?;
            if has_problem_chars(&key) {
                debug!(
                    "dropping tag {key:?} on {} {owner_id}: key has problem characters",
                    element.kind()
                );
                continue;
            }
            let value = self.clean_value(&key, &value);
            let (tag_type, key) =
                split_namespace(&key).unwrap_or((DEFAULT_TAG_TYPE, key.as_str()));
            records.push(TagRecord {
                owner_id: owner_id.to_owned(),
                key: key.to_owned(),
                value,
                tag_type: tag_type.to_owned(),
            });
        }
        Ok(records)
    }

    fn clean_value(&self, key: &str, value: &str) -> String {
        match TagCategory::of(key) {
            TagCategory::Street => self.cleaner.street_name(value),
            TagCategory::Postcode => self.cleaner.postcode(value),
            TagCategory::HouseNumber => self.cleaner.house_number(value),
            TagCategory::Height => self.cleaner.height(value),
            TagCategory::Other => value.to_owned(),
        }
    }
}

fn required(
    element: &RawElement,
    attributes: &Attributes,
    marker: &'static str,
    attribute: &'static str,
) -> Result<String, MissingAttributeError> {
    attributes
        .get(attribute)
        .map(str::to_owned)
        .ok_or_else(|| MissingAttributeError {
            kind: element.kind(),
            id: element.id().map(str::to_owned),
            marker,
            attribute,
        })
}

#[cfg(test)]
mod tests;
