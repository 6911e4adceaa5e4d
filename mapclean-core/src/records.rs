//! Shaped records produced from a single source element.
//!
//! Attribute text is carried exactly as read from the source. Typing is the
//! schema contract's concern, so a record never fails to construct because an
//! attribute looks wrong; it fails validation instead.

use serde::Serialize;

use crate::ElementKind;

/// Tag type assigned when the key has no namespace prefix.
pub const DEFAULT_TAG_TYPE: &str = "regular";

/// Attributes of a shaped `node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointEntity {
    /// Element identifier.
    pub id: String,
    /// Latitude in decimal degrees.
    pub lat: String,
    /// Longitude in decimal degrees.
    pub lon: String,
    /// Name of the last editor.
    pub user: String,
    /// Identifier of the last editor.
    pub uid: String,
    /// Element version.
    pub version: String,
    /// Changeset that produced this version.
    pub changeset: String,
    /// ISO-8601 edit timestamp.
    pub timestamp: String,
}

impl PointEntity {
    /// Column order of the `point_entities` table.
    pub const FIELDS: [&'static str; 8] = [
        "id",
        "lat",
        "lon",
        "user",
        "uid",
        "version",
        "changeset",
        "timestamp",
    ];
}

/// Attributes of a shaped `way`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntity {
    /// Element identifier.
    pub id: String,
    /// Name of the last editor.
    pub user: String,
    /// Identifier of the last editor.
    pub uid: String,
    /// Element version.
    pub version: String,
    /// Changeset that produced this version.
    pub changeset: String,
    /// ISO-8601 edit timestamp.
    pub timestamp: String,
}

impl PathEntity {
    /// Column order of the `path_entities` table.
    pub const FIELDS: [&'static str; 6] =
        ["id", "user", "uid", "version", "changeset", "timestamp"];
}

/// One cleaned key/value annotation.
///
/// Serialises with the table column names (`id`, `key`, `value`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    /// Identifier of the owning entity.
    #[serde(rename = "id")]
    pub owner_id: String,
    /// Key with the namespace prefix removed.
    pub key: String,
    /// Cleaned value.
    pub value: String,
    /// Namespace prefix, or [`DEFAULT_TAG_TYPE`].
    #[serde(rename = "type")]
    pub tag_type: String,
}

impl TagRecord {
    /// Column order of the `point_tags` and `path_tags` tables.
    pub const FIELDS: [&'static str; 4] = ["id", "key", "value", "type"];
}

/// Position of a node within a way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathReference {
    /// Identifier of the owning way.
    #[serde(rename = "id")]
    pub path_id: String,
    /// Identifier of the referenced node.
    pub node_id: String,
    /// Zero-based declaration index.
    pub position: usize,
}

impl PathReference {
    /// Column order of the `path_references` table.
    pub const FIELDS: [&'static str; 3] = ["id", "node_id", "position"];
}

/// Records shaped from one `node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapedPoint {
    /// Entity attributes.
    #[serde(rename = "node")]
    pub entity: PointEntity,
    /// Tags in declaration order.
    #[serde(rename = "node_tags")]
    pub tags: Vec<TagRecord>,
}

/// Records shaped from one `way`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapedPath {
    /// Entity attributes.
    #[serde(rename = "way")]
    pub entity: PathEntity,
    /// Node references in declaration order.
    #[serde(rename = "way_nodes")]
    pub references: Vec<PathReference>,
    /// Tags in declaration order.
    #[serde(rename = "way_tags")]
    pub tags: Vec<TagRecord>,
}

/// The record bundle produced from one source element.
///
/// Serialises to a document keyed by record group (`node`/`node_tags` or
/// `way`/`way_nodes`/`way_tags`), the shape the schema contract describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ShapedElement {
    /// A shaped `node`.
    Point(ShapedPoint),
    /// A shaped `way`.
    Path(ShapedPath),
}

impl ShapedElement {
    /// Kind of the source element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Point(_) => ElementKind::Node,
            Self::Path(_) => ElementKind::Way,
        }
    }

    /// Identifier of the shaped entity.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Point(point) => &point.entity.id,
            Self::Path(path) => &path.entity.id,
        }
    }

    /// Tag records of the entity.
    #[must_use]
    pub fn tags(&self) -> &[TagRecord] {
        match self {
            Self::Point(point) => &point.tags,
            Self::Path(path) => &path.tags,
        }
    }

    /// Node references; empty for points.
    #[must_use]
    pub fn references(&self) -> &[PathReference] {
        match self {
            Self::Point(_) => &[],
            Self::Path(path) => &path.references,
        }
    }
}
