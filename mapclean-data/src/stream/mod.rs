//! Streaming reader for OSM XML exports.
//!
//! [`ElementStream`] pulls one top-level `node` or `way` at a time out of a
//! buffered reader, together with its `tag` and `nd` children. Nothing from a
//! previous element is retained, so memory use is bounded by the largest
//! single element rather than by the document.

use std::{collections::BTreeSet, io::BufRead, str};

use mapclean_core::{Attributes, ElementKind, RawElement};
use quick_xml::{
    Reader,
    events::{BytesStart, Event, attributes::AttrError},
};
use thiserror::Error;

/// Errors raised while reading the source document.
///
/// Each variant records the byte offset reached when the problem surfaced.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The markup was malformed or could not be decoded.
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        /// Byte offset reached by the reader.
        position: u64,
        /// Source error returned by `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// An attribute was syntactically invalid.
    #[error("invalid attribute near byte {position}: {source}")]
    Attribute {
        /// Byte offset reached by the reader.
        position: u64,
        /// Source error returned by `quick-xml`.
        #[source]
        source: AttrError,
    },
    /// An attribute name was not valid UTF-8.
    #[error("attribute name is not valid UTF-8 near byte {position}: {source}")]
    Utf8 {
        /// Byte offset reached by the reader.
        position: u64,
        /// Decoding error.
        #[source]
        source: str::Utf8Error,
    },
    /// The input ended without a single element.
    #[error("no element found before byte {position}")]
    Empty {
        /// Byte offset of the end of input.
        position: u64,
    },
    /// The document ended before an open element was closed.
    #[error("document ended inside <{element}> at byte {position}")]
    Truncated {
        /// Byte offset of the end of input.
        position: u64,
        /// Name of the innermost open element being collected, or `document`.
        element: String,
    },
}

impl ParseError {
    /// Byte offset at which the error was detected.
    #[must_use]
    pub const fn position(&self) -> u64 {
        match self {
            Self::Xml { position, .. }
            | Self::Attribute { position, .. }
            | Self::Utf8 { position, .. }
            | Self::Empty { position }
            | Self::Truncated { position, .. } => *position,
        }
    }
}

/// Element currently being collected, with the nesting depth of its start
/// tag.
#[derive(Debug)]
struct Pending {
    element: RawElement,
    depth: usize,
}

/// Lazy iterator over the `node` and `way` elements of an OSM XML document.
///
/// Elements are yielded in document order. Kinds outside the requested set,
/// and elements such as `relation`, are skipped together with their
/// children. Input without any element, such as an empty file, fails with
/// [`ParseError::Empty`]. After the first error the stream is exhausted.
///
/// # Examples
/// ```
/// use mapclean_core::ElementKind;
/// use mapclean_data::ElementStream;
///
/// let xml = r#"<osm>
///   <node id="1" lat="40.7" lon="-73.9"><tag k="amenity" v="cafe"/></node>
///   <relation id="9"><member type="node" ref="1"/></relation>
///   <way id="2"><nd ref="1"/></way>
/// </osm>"#;
///
/// let kinds: Vec<_> = ElementStream::new(xml.as_bytes())
///     .map(|element| element.map(|element| element.kind()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(kinds, [ElementKind::Node, ElementKind::Way]);
/// # Ok::<(), mapclean_data::ParseError>(())
/// ```
pub struct ElementStream<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kinds: BTreeSet<ElementKind>,
    depth: usize,
    pending: Option<Pending>,
    seen_root: bool,
    finished: bool,
}

impl<R: BufRead> ElementStream<R> {
    /// Stream every `node` and `way` from `reader`.
    pub fn new(reader: R) -> Self {
        Self::with_kinds(reader, [ElementKind::Node, ElementKind::Way])
    }

    /// Stream only the element kinds listed in `kinds`.
    pub fn with_kinds(reader: R, kinds: impl IntoIterator<Item = ElementKind>) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            kinds: kinds.into_iter().collect(),
            depth: 0,
            pending: None,
            seen_root: false,
            finished: false,
        }
    }

    /// Byte offset reached in the source.
    pub fn position(&self) -> u64 {
        to_offset(self.reader.buffer_position())
    }

    fn next_element(&mut self) -> Result<Option<RawElement>, ParseError> {
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| ParseError::Xml {
                    position: to_offset(self.reader.buffer_position()),
                    source,
                })?;
            let position = to_offset(self.reader.buffer_position());
            match event {
                Event::Start(start) => {
                    self.seen_root = true;
                    let opened = open(&mut self.pending, &self.kinds, self.depth, &start, position)?;
                    self.depth += 1;
                    if let Some(element) = opened {
                        self.pending = Some(Pending {
                            element,
                            depth: self.depth,
                        });
                    }
                }
                Event::Empty(start) => {
                    self.seen_root = true;
                    if let Some(element) =
                        open(&mut self.pending, &self.kinds, self.depth, &start, position)?
                    {
                        return Ok(Some(element));
                    }
                }
                Event::End(_) => {
                    let closes_pending = self
                        .pending
                        .as_ref()
                        .is_some_and(|pending| pending.depth == self.depth);
                    self.depth = self.depth.saturating_sub(1);
                    if closes_pending {
                        return Ok(self.pending.take().map(|pending| pending.element));
                    }
                }
                Event::Eof if !self.seen_root => return Err(ParseError::Empty { position }),
                Event::Eof if self.depth == 0 => return Ok(None),
                Event::Eof => {
                    let element = self.pending.as_ref().map_or_else(
                        || "document".to_owned(),
                        |pending| pending.element.kind().tag_name().to_owned(),
                    );
                    return Err(ParseError::Truncated { position, element });
                }
                _ => {}
            }
        }
    }
}

/// Handle a start or empty tag at nesting `depth`.
///
/// Children of the pending element are attached to it. Outside an element, a
/// tag of a selected kind yields a fresh element.
fn open(
    pending: &mut Option<Pending>,
    kinds: &BTreeSet<ElementKind>,
    depth: usize,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<Option<RawElement>, ParseError> {
    let name = start.name();
    if let Some(pending) = pending {
        if depth == pending.depth {
            match name.as_ref() {
                b"tag" => pending.element.push_tag(read_attributes(start, position)?),
                b"nd" => pending
                    .element
                    .push_node_ref(read_attributes(start, position)?),
                _ => {}
            }
        }
        return Ok(None);
    }
    match ElementKind::from_tag_name(name.as_ref()) {
        Some(kind) if kinds.contains(&kind) => {
            Ok(Some(RawElement::new(kind, read_attributes(start, position)?)))
        }
        _ => Ok(None),
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<RawElement, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let next = self.next_element();
        if !matches!(next, Ok(Some(_))) {
            self.finished = true;
        }
        next.transpose()
    }
}

impl<R: BufRead> std::iter::FusedIterator for ElementStream<R> {}

fn read_attributes(start: &BytesStart<'_>, position: u64) -> Result<Attributes, ParseError> {
    start
        .attributes()
        .map(|attribute| {
            let attribute =
                attribute.map_err(|source| ParseError::Attribute { position, source })?;
            let name = str::from_utf8(attribute.key.as_ref())
                .map_err(|source| ParseError::Utf8 { position, source })?
                .to_owned();
            let value = attribute
                .unescape_value()
                .map_err(|source| ParseError::Xml { position, source })?
                .into_owned();
            Ok((name, value))
        })
        .collect()
}

fn to_offset(position: usize) -> u64 {
    u64::try_from(position).unwrap_or(u64::MAX)
}
