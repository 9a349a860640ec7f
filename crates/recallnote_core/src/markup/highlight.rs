//! Highlight wrapper convention.
//!
//! A highlight is `<span class="note-highlight" data-question="...">` around
//! the annotated content. Everything that reads or writes wrappers goes
//! through this module.

use super::tree::{Element, Node, RichDoc};
use crate::model::note::Annotation;

pub const HIGHLIGHT_TAG: &str = "span";
pub const HIGHLIGHT_CLASS: &str = "note-highlight";
pub const QUESTION_ATTR: &str = "data-question";

/// Builds an empty wrapper carrying `question`.
pub fn highlight_wrapper(question: &str) -> Element {
    Element::new(
        HIGHLIGHT_TAG,
        &[("class", HIGHLIGHT_CLASS), (QUESTION_ATTR, question)],
    )
}

pub fn is_highlight(element: &Element) -> bool {
    element.name() == HIGHLIGHT_TAG && element.has_class(HIGHLIGHT_CLASS)
}

/// Open and close tag text for a wrapper, for string-level insertion.
pub fn wrapper_tags(question: &str) -> (String, String) {
    let wrapper = highlight_wrapper(question);
    (
        wrapper.open_tag().to_string(),
        wrapper.close_tag().unwrap_or_default().to_string(),
    )
}

pub fn contains_highlight(doc: &RichDoc) -> bool {
    !doc.find_elements(is_highlight).is_empty()
}

/// Whether any of `nodes` is a wrapper or holds one.
pub fn holds_highlight(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(element) => is_highlight(element) || holds_highlight(&element.children),
        _ => false,
    })
}

/// Replaces every wrapper with its children. Text is never removed.
pub fn strip_highlights(doc: &mut RichDoc) {
    strip_in(doc.children_mut());
}

/// String form of [`strip_highlights`]. Input without wrappers is returned
/// unchanged.
pub fn strip_highlights_html(html: &str) -> String {
    let mut doc = RichDoc::parse(html);
    if !contains_highlight(&doc) {
        return html.to_string();
    }
    strip_highlights(&mut doc);
    doc.to_html()
}

/// Re-derives the annotation list from the wrappers in `doc`, in document
/// order. Wrappers without text or without a question are skipped.
pub fn collect_annotations(doc: &RichDoc) -> Vec<Annotation> {
    doc.find_elements(is_highlight)
        .into_iter()
        .filter_map(|path| doc.node(&path).and_then(Node::as_element).cloned())
        .map(|wrapper| {
            Annotation::new(
                wrapper.text_content(),
                wrapper.attr(QUESTION_ATTR).unwrap_or_default(),
            )
        })
        .filter(Annotation::is_renderable)
        .collect()
}

/// Path of the nearest wrapper that is `path` itself or one of its
/// ancestors.
pub fn enclosing_highlight(doc: &RichDoc, path: &[usize]) -> Option<Vec<usize>> {
    (1..=path.len()).rev().map(|len| &path[..len]).find_map(|candidate| {
        match doc.node(candidate) {
            Some(Node::Element(element)) if is_highlight(element) => Some(candidate.to_vec()),
            _ => None,
        }
    })
}

/// Replaces the wrapper at `path` with its children.
///
/// Returns `false` when `path` does not address a wrapper.
pub fn unwrap_at(doc: &mut RichDoc, path: &[usize]) -> bool {
    let Some((&index, parent)) = path.split_last() else {
        return false;
    };
    let Some(list) = doc.child_list_mut(parent) else {
        return false;
    };
    match list.get(index) {
        Some(Node::Element(element)) if is_highlight(element) => {}
        _ => return false,
    }
    if let Node::Element(wrapper) = list.remove(index) {
        list.splice(index..index, wrapper.children);
    }
    true
}

fn strip_in(nodes: &mut Vec<Node>) {
    let mut index = 0;
    while index < nodes.len() {
        let unwrap = matches!(&nodes[index], Node::Element(element) if is_highlight(element));
        if unwrap {
            if let Node::Element(wrapper) = nodes.remove(index) {
                nodes.splice(index..index, wrapper.children);
            }
            // Re-examine the spliced children: wrappers may nest.
            continue;
        }
        if let Node::Element(element) = &mut nodes[index] {
            strip_in(&mut element.children);
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_escapes_question_and_round_trips_it() {
        let mut doc = RichDoc::parse("");
        let mut wrapper = highlight_wrapper("Is \"a\" < b & c?");
        wrapper.children.push(Node::Text("a".to_string()));
        doc.children_mut().push(Node::Element(wrapper));

        let html = doc.to_html();
        assert_eq!(
            html,
            "<span class=\"note-highlight\" data-question=\"Is &quot;a&quot; &lt; b &amp; c?\">a</span>"
        );
        let reparsed = RichDoc::parse(&html);
        assert_eq!(
            collect_annotations(&reparsed),
            vec![Annotation::new("a", "Is \"a\" < b & c?")]
        );
    }

    #[test]
    fn strip_keeps_inner_content_including_nested_wrappers() {
        let html = concat!(
            "<p>x <span class=\"note-highlight\" data-question=\"q1\">a ",
            "<span class=\"note-highlight\" data-question=\"q2\"><b>b</b></span></span> y</p>"
        );
        assert_eq!(strip_highlights_html(html), "<p>x a <b>b</b> y</p>");
    }

    #[test]
    fn strip_leaves_wrapper_free_input_untouched() {
        let html = "<p>plain <span class=\"other\">text</span></p>";
        assert_eq!(strip_highlights_html(html), html);
    }

    #[test]
    fn collect_follows_document_order_and_skips_invalid_wrappers() {
        let html = concat!(
            "<span class=\"note-highlight\" data-question=\"first\">one</span>",
            "<span class=\"note-highlight\" data-question=\"  \">skipped</span>",
            "<p><span class=\"note-highlight\" data-question=\"second\">t<i>wo</i></span></p>",
            "<span class=\"note-highlight\" data-question=\"empty\"></span>"
        );
        let doc = RichDoc::parse(html);
        assert_eq!(
            collect_annotations(&doc),
            vec![
                Annotation::new("one", "first"),
                Annotation::new("two", "second"),
            ]
        );
    }

    #[test]
    fn enclosing_highlight_finds_nearest_wrapper() {
        let doc = RichDoc::parse(
            "<p>a<span class=\"note-highlight\" data-question=\"q\">b<i>c</i></span></p>",
        );
        assert_eq!(enclosing_highlight(&doc, &[0, 1, 1, 0]), Some(vec![0, 1]));
        assert_eq!(enclosing_highlight(&doc, &[0, 1]), Some(vec![0, 1]));
        assert_eq!(enclosing_highlight(&doc, &[0, 0]), None);
        assert_eq!(enclosing_highlight(&doc, &[]), None);
    }

    #[test]
    fn unwrap_at_only_touches_wrappers() {
        let mut doc = RichDoc::parse(
            "<p>a<span class=\"note-highlight\" data-question=\"q\">b<i>c</i></span>d</p>",
        );
        assert!(!unwrap_at(&mut doc, &[0, 0]));
        assert!(unwrap_at(&mut doc, &[0, 1]));
        assert_eq!(doc.to_html(), "<p>ab<i>c</i>d</p>");
        assert!(!contains_highlight(&doc));
    }
}
