//! Boundary-point selections over a `RichDoc`.
//!
//! # Responsibility
//! - Validate selections reported by the read surface.
//! - Extract the selected subtree and re-insert it inside a wrapper element.
//!
//! # Invariants
//! - Extraction splits partially selected text and elements; content outside
//!   the selection stays where it was.
//! - The wrapper lands at the start position under the lowest container that
//!   holds both boundaries.

use super::tree::{entity_spans, Element, Node, RichDoc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Position inside the tree.
///
/// When `path` addresses a text node, `offset` is a byte offset into its raw
/// text. Otherwise `path` addresses a container (root when empty) and
/// `offset` is a child index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(path: impl Into<Vec<usize>>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    /// Checks the point against the current tree.
    pub fn validate(&self, doc: &RichDoc) -> Result<(), RangeError> {
        if self.path.is_empty() {
            return check_child_offset(self, doc.children().len());
        }
        match doc.node(&self.path) {
            Some(Node::Text(text)) => {
                if self.offset > text.len() {
                    return Err(RangeError::OffsetOutOfBounds {
                        path: self.path.clone(),
                        offset: self.offset,
                    });
                }
                if !text.is_char_boundary(self.offset) {
                    return Err(RangeError::NotCharBoundary {
                        path: self.path.clone(),
                        offset: self.offset,
                    });
                }
                let offset = self.offset;
                if entity_spans(text)
                    .iter()
                    .any(|entity| entity.start < offset && offset < entity.end)
                {
                    return Err(RangeError::SplitsEntity {
                        path: self.path.clone(),
                        offset,
                    });
                }
                Ok(())
            }
            Some(Node::Element(element)) => check_child_offset(self, element.children.len()),
            Some(Node::Raw(_)) => Err(RangeError::NotAContainer(self.path.clone())),
            None => Err(RangeError::InvalidPath(self.path.clone())),
        }
    }

    fn order_key(&self) -> Vec<usize> {
        let mut key = self.path.clone();
        key.push(self.offset);
        key
    }
}

/// Selection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Path does not address a node in the current tree.
    InvalidPath(Vec<usize>),
    /// Path addresses a node that can hold neither text nor children.
    NotAContainer(Vec<usize>),
    OffsetOutOfBounds { path: Vec<usize>, offset: usize },
    NotCharBoundary { path: Vec<usize>, offset: usize },
    /// Offset falls inside a character reference such as `&amp;`.
    SplitsEntity { path: Vec<usize>, offset: usize },
    /// Start lies after end.
    Reversed,
    /// Selection contains nothing.
    Collapsed,
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "selection path {path:?} does not exist"),
            Self::NotAContainer(path) => {
                write!(f, "selection path {path:?} cannot hold a boundary")
            }
            Self::OffsetOutOfBounds { path, offset } => {
                write!(f, "selection offset {offset} is out of bounds at {path:?}")
            }
            Self::NotCharBoundary { path, offset } => {
                write!(f, "selection offset {offset} splits a character at {path:?}")
            }
            Self::SplitsEntity { path, offset } => {
                write!(f, "selection offset {offset} splits a character reference at {path:?}")
            }
            Self::Reversed => write!(f, "selection start lies after its end"),
            Self::Collapsed => write!(f, "selection is empty"),
        }
    }
}

impl Error for RangeError {}

/// Nodes removed by `TextRange::extract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Container the nodes were removed from.
    pub container: Vec<usize>,
    /// Child index where the nodes used to start.
    pub index: usize,
    pub nodes: Vec<Node>,
}

/// Pair of boundary points, start first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl TextRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Selection inside a single text node.
    pub fn within_text(path: impl Into<Vec<usize>>, start: usize, end: usize) -> Self {
        let path = path.into();
        Self::new(
            BoundaryPoint::new(path.clone(), start),
            BoundaryPoint::new(path, end),
        )
    }

    pub fn validate(&self, doc: &RichDoc) -> Result<(), RangeError> {
        self.start.validate(doc)?;
        self.end.validate(doc)?;
        if self.start.order_key() > self.end.order_key() {
            return Err(RangeError::Reversed);
        }
        Ok(())
    }

    /// Text covered by the selection, without touching `doc`.
    pub fn selected_text(&self, doc: &RichDoc) -> Result<String, RangeError> {
        let mut scratch = doc.clone();
        match self.extract(&mut scratch) {
            Ok(extracted) => Ok(extracted.nodes.iter().map(Node::text_content).collect()),
            Err(RangeError::Collapsed) => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    /// Removes the selected content from `doc`.
    pub fn extract(&self, doc: &mut RichDoc) -> Result<Extracted, RangeError> {
        self.validate(doc)?;

        // End first: splitting it never moves the start.
        let (mut end, _) = split_text_boundary(doc, &self.end)?;
        let (start, inserted) = split_text_boundary(doc, &self.start)?;
        if let Some((parent, at)) = inserted {
            shift_for_insert(&mut end, &parent, at);
        }

        let common = common_prefix(&start.path, &end.path);
        let (end_index, _) = lift_to(doc, end, &common)?;
        let (start_index, inserted_at) = lift_to(doc, start, &common)?;
        let end_index = match inserted_at {
            Some(at) if end_index >= at => end_index + 1,
            _ => end_index,
        };
        if start_index >= end_index {
            return Err(RangeError::Collapsed);
        }

        let list = doc
            .child_list_mut(&common)
            .ok_or_else(|| RangeError::NotAContainer(common.clone()))?;
        let nodes = list.drain(start_index..end_index).collect();
        Ok(Extracted {
            container: common,
            index: start_index,
            nodes,
        })
    }

    /// Moves the selected content into `wrapper` and inserts it in place.
    ///
    /// Returns the wrapper's path.
    pub fn extract_and_wrap(
        &self,
        doc: &mut RichDoc,
        mut wrapper: Element,
    ) -> Result<Vec<usize>, RangeError> {
        let extracted = self.extract(doc)?;
        wrapper.children = extracted.nodes;
        let list = doc
            .child_list_mut(&extracted.container)
            .ok_or_else(|| RangeError::NotAContainer(extracted.container.clone()))?;
        list.insert(extracted.index, Node::Element(wrapper));

        let mut path = extracted.container;
        path.push(extracted.index);
        Ok(path)
    }
}

fn check_child_offset(point: &BoundaryPoint, child_count: usize) -> Result<(), RangeError> {
    if point.offset > child_count {
        return Err(RangeError::OffsetOutOfBounds {
            path: point.path.clone(),
            offset: point.offset,
        });
    }
    Ok(())
}

/// Converts a text boundary into a container boundary, splitting the text
/// node when the offset falls strictly inside it.
///
/// Returns the insertion point `(parent, index)` when a node was inserted.
fn split_text_boundary(
    doc: &mut RichDoc,
    point: &BoundaryPoint,
) -> Result<(BoundaryPoint, Option<(Vec<usize>, usize)>), RangeError> {
    if !matches!(doc.node(&point.path), Some(Node::Text(_))) {
        return Ok((point.clone(), None));
    }

    let (parent, index) = split_last(&point.path);
    let list = doc
        .child_list_mut(&parent)
        .ok_or_else(|| RangeError::InvalidPath(point.path.clone()))?;
    let Some(Node::Text(text)) = list.get_mut(index) else {
        return Err(RangeError::InvalidPath(point.path.clone()));
    };

    if point.offset == 0 {
        return Ok((BoundaryPoint::new(parent, index), None));
    }
    if point.offset >= text.len() {
        return Ok((BoundaryPoint::new(parent, index + 1), None));
    }

    let tail = text.split_off(point.offset);
    list.insert(index + 1, Node::Text(tail));
    Ok((
        BoundaryPoint::new(parent.clone(), index + 1),
        Some((parent, index + 1)),
    ))
}

/// Adjusts a container boundary after a node was inserted at `parent[at]`.
fn shift_for_insert(point: &mut BoundaryPoint, parent: &[usize], at: usize) {
    let depth = parent.len();
    if point.path.len() > depth && point.path.starts_with(parent) {
        if point.path[depth] >= at {
            point.path[depth] += 1;
        }
    } else if point.path == parent && point.offset >= at {
        point.offset += 1;
    }
}

/// Walks a container boundary up to `ancestor`, splitting every element
/// that the boundary cuts through.
///
/// Returns the child index in `ancestor` and, when the final split inserted
/// a node directly into `ancestor`, that insertion index.
fn lift_to(
    doc: &mut RichDoc,
    mut point: BoundaryPoint,
    ancestor: &[usize],
) -> Result<(usize, Option<usize>), RangeError> {
    let mut inserted_at = None;

    while point.path.len() > ancestor.len() {
        let (parent, index) = split_last(&point.path);
        let child_count = doc
            .child_list(&point.path)
            .ok_or_else(|| RangeError::NotAContainer(point.path.clone()))?
            .len();

        let next_offset = if point.offset == 0 {
            index
        } else if point.offset >= child_count {
            index + 1
        } else {
            let list = doc
                .child_list_mut(&parent)
                .ok_or_else(|| RangeError::NotAContainer(parent.clone()))?;
            let Some(Node::Element(element)) = list.get_mut(index) else {
                return Err(RangeError::NotAContainer(point.path.clone()));
            };
            let mut right = element.shell();
            right.children = element.children.split_off(point.offset);
            list.insert(index + 1, Node::Element(right));
            if parent.len() == ancestor.len() {
                inserted_at = Some(index + 1);
            }
            index + 1
        };

        point = BoundaryPoint::new(parent, next_offset);
    }

    Ok((point.offset, inserted_at))
}

fn split_last(path: &[usize]) -> (Vec<usize>, usize) {
    match path.split_last() {
        Some((last, parent)) => (parent.to_vec(), *last),
        None => (Vec::new(), 0),
    }
}

fn common_prefix(left: &[usize], right: &[usize]) -> Vec<usize> {
    left.iter()
        .zip(right.iter())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| *a)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{BoundaryPoint, RangeError, TextRange};
    use crate::markup::tree::{Element, RichDoc};

    fn wrapper() -> Element {
        Element::new("mark", &[])
    }

    #[test]
    fn wraps_span_inside_single_text_node() {
        let mut doc = RichDoc::parse("The formula is X=Y+Z for all cases.");
        let range = TextRange::within_text(vec![0], 15, 20);
        let path = range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(path, vec![1]);
        assert_eq!(
            doc.to_html(),
            "The formula is <mark>X=Y+Z</mark> for all cases."
        );
    }

    #[test]
    fn wraps_whole_text_node_without_empty_fragments() {
        let mut doc = RichDoc::parse("<p>abc</p>");
        let range = TextRange::within_text(vec![0, 0], 0, 3);
        range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(doc.to_html(), "<p><mark>abc</mark></p>");
        let paragraph = doc.node(&[0]).unwrap().as_element().unwrap();
        assert_eq!(paragraph.children.len(), 1);
    }

    #[test]
    fn selection_across_paragraphs_splits_both_blocks() {
        let mut doc = RichDoc::parse("<p>alpha</p><p>beta</p>");
        let range = TextRange::new(
            BoundaryPoint::new(vec![0, 0], 2),
            BoundaryPoint::new(vec![1, 0], 2),
        );
        let path = range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(path, vec![1]);
        assert_eq!(
            doc.to_html(),
            "<p>al</p><mark><p>pha</p><p>be</p></mark><p>ta</p>"
        );
        assert_eq!(doc.text_content(), "alphabeta");
    }

    #[test]
    fn selection_across_list_items_with_nested_inline_markup() {
        let mut doc = RichDoc::parse("<ul><li>one <b>two</b></li><li>three</li></ul>");
        let range = TextRange::new(
            BoundaryPoint::new(vec![0, 0, 1, 0], 1),
            BoundaryPoint::new(vec![0, 1, 0], 3),
        );
        range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(
            doc.to_html(),
            "<ul><li>one <b>t</b></li><mark><li><b>wo</b></li><li>thr</li></mark><li>ee</li></ul>"
        );
    }

    #[test]
    fn container_boundaries_select_whole_children() {
        let mut doc = RichDoc::parse("<p>a</p><p>b</p><p>c</p>");
        let range = TextRange::new(BoundaryPoint::new(vec![], 1), BoundaryPoint::new(vec![], 3));
        range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(doc.to_html(), "<p>a</p><mark><p>b</p><p>c</p></mark>");
    }

    #[test]
    fn start_in_ancestor_container_end_in_descendant_text() {
        let mut doc = RichDoc::parse("<div>x<p>hello</p></div>");
        let range = TextRange::new(
            BoundaryPoint::new(vec![0], 0),
            BoundaryPoint::new(vec![0, 1, 0], 2),
        );
        range.extract_and_wrap(&mut doc, wrapper()).unwrap();

        assert_eq!(doc.to_html(), "<div><mark>x<p>he</p></mark><p>llo</p></div>");
    }

    #[test]
    fn selected_text_leaves_document_untouched() {
        let doc = RichDoc::parse("<p>alpha</p><p>beta</p>");
        let range = TextRange::new(
            BoundaryPoint::new(vec![0, 0], 3),
            BoundaryPoint::new(vec![1, 0], 1),
        );
        assert_eq!(range.selected_text(&doc).unwrap(), "hab");
        assert_eq!(doc.to_html(), "<p>alpha</p><p>beta</p>");
    }

    #[test]
    fn collapsed_selection_is_rejected_and_reports_no_text() {
        let mut doc = RichDoc::parse("abc");
        let range = TextRange::within_text(vec![0], 1, 1);
        assert_eq!(range.selected_text(&doc).unwrap(), "");
        assert_eq!(
            range.extract_and_wrap(&mut doc, wrapper()).unwrap_err(),
            RangeError::Collapsed
        );
        assert_eq!(doc.to_html(), "abc");
    }

    #[test]
    fn reversed_and_invalid_selections_are_rejected() {
        let doc = RichDoc::parse("<p>abc</p>");
        let reversed = TextRange::within_text(vec![0, 0], 2, 1);
        assert_eq!(reversed.validate(&doc).unwrap_err(), RangeError::Reversed);

        let missing = TextRange::within_text(vec![3, 0], 0, 1);
        assert!(matches!(
            missing.validate(&doc).unwrap_err(),
            RangeError::InvalidPath(_)
        ));

        let too_far = TextRange::within_text(vec![0, 0], 0, 9);
        assert!(matches!(
            too_far.validate(&doc).unwrap_err(),
            RangeError::OffsetOutOfBounds { .. }
        ));
    }

    #[test]
    fn offsets_must_respect_char_boundaries() {
        let doc = RichDoc::parse("héllo");
        let range = TextRange::within_text(vec![0], 0, 2);
        assert!(matches!(
            range.validate(&doc).unwrap_err(),
            RangeError::NotCharBoundary { .. }
        ));
    }

    #[test]
    fn boundaries_inside_character_references_are_rejected() {
        let mut doc = RichDoc::parse("a &amp; b");
        let range = TextRange::within_text(vec![0], 3, 9);
        assert_eq!(
            range.extract_and_wrap(&mut doc, wrapper()).unwrap_err(),
            RangeError::SplitsEntity {
                path: vec![0],
                offset: 3
            }
        );
        assert_eq!(doc.to_html(), "a &amp; b");

        let whole = TextRange::within_text(vec![0], 2, 9);
        whole.extract_and_wrap(&mut doc, wrapper()).unwrap();
        assert_eq!(doc.to_html(), "a <mark>&amp; b</mark>");
    }
}
