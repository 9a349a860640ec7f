//! Anchor resolver.
//!
//! # Responsibility
//! - Wrap each annotation's anchor text in a highlight wrapper, in list order.
//!
//! # Invariants
//! - Pure function of `(content, highlights)`.
//! - Each annotation claims the first literal occurrence that no earlier
//!   annotation claimed. Matches never cut through tags or entity references.
//! - Unmatched annotations are skipped without error.

use crate::markup::highlight::wrapper_tags;
use crate::markup::tree::{entity_spans, markup_token_spans};
use crate::model::note::Annotation;
use std::ops::Range;

/// Renders `highlights` over `content`.
pub fn resolve_highlights(content: &str, highlights: &[Annotation]) -> String {
    let mut output = content.to_string();
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut skipped = 0usize;

    for annotation in highlights {
        if !annotation.is_renderable() {
            skipped += 1;
            continue;
        }

        let markup = markup_token_spans(&output);
        let entities = entity_spans(&output);
        let Some(start) =
            find_free_occurrence(&output, &annotation.anchor_text, &claimed, &markup, &entities)
        else {
            skipped += 1;
            continue;
        };

        let end = start + annotation.anchor_text.len();
        let (open, close) = wrapper_tags(&annotation.question);
        output.insert_str(end, &close);
        output.insert_str(start, &open);

        let delta = open.len() + close.len();
        for range in claimed.iter_mut().filter(|range| range.start >= end) {
            range.start += delta;
            range.end += delta;
        }
        claimed.push(start..end + delta);
    }

    log::debug!(
        "event=highlights_resolve module=annotate status=ok total={} applied={} skipped={}",
        highlights.len(),
        claimed.len(),
        skipped
    );
    output
}

fn find_free_occurrence(
    haystack: &str,
    needle: &str,
    claimed: &[Range<usize>],
    markup: &[Range<usize>],
    entities: &[Range<usize>],
) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = haystack.get(from..)?.find(needle) {
        let start = from + found;
        let candidate = start..start + needle.len();
        let blocked = claimed
            .iter()
            .chain(markup.iter())
            .any(|span| overlaps(span, &candidate))
            || entities.iter().any(|entity| cuts(entity, &candidate));
        if !blocked {
            return Some(start);
        }
        let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
        from = start + step;
    }
    None
}

fn overlaps(left: &Range<usize>, right: &Range<usize>) -> bool {
    left.start < right.end && right.start < left.end
}

/// Whether `candidate` starts or ends strictly inside `entity`.
fn cuts(entity: &Range<usize>, candidate: &Range<usize>) -> bool {
    let inside = |offset: usize| entity.start < offset && offset < entity.end;
    inside(candidate.start) || inside(candidate.end)
}

#[cfg(test)]
mod tests {
    use super::resolve_highlights;
    use crate::model::note::Annotation;

    fn wrap(question: &str, text: &str) -> String {
        format!("<span class=\"note-highlight\" data-question=\"{question}\">{text}</span>")
    }

    #[test]
    fn wraps_first_occurrence_only() {
        let output = resolve_highlights("cat cat cat", &[Annotation::new("cat", "q")]);
        assert_eq!(output, format!("{} cat cat", wrap("q", "cat")));
    }

    #[test]
    fn earlier_annotations_claim_their_match() {
        let output = resolve_highlights(
            "cat cat",
            &[Annotation::new("cat", "one"), Annotation::new("cat", "two")],
        );
        assert_eq!(output, format!("{} {}", wrap("one", "cat"), wrap("two", "cat")));
    }

    #[test]
    fn missing_anchor_is_skipped() {
        let content = "<p>nothing to see</p>";
        let output = resolve_highlights(
            content,
            &[Annotation::new("absent", "q"), Annotation::new("see", "q2")],
        );
        assert_eq!(output, format!("<p>nothing to {}</p>", wrap("q2", "see")));
    }

    #[test]
    fn invalid_annotations_are_ignored() {
        let content = "alpha beta";
        let output = resolve_highlights(
            content,
            &[Annotation::new("", "q"), Annotation::new("alpha", "   ")],
        );
        assert_eq!(output, content);
    }

    #[test]
    fn resolving_twice_is_byte_identical() {
        let content = "<p>The formula is X=Y+Z for all cases.</p>";
        let highlights = [
            Annotation::new("X=Y+Z", "Why Y+Z?"),
            Annotation::new("cases", "Which?"),
        ];
        assert_eq!(
            resolve_highlights(content, &highlights),
            resolve_highlights(content, &highlights)
        );
    }

    #[test]
    fn matches_never_land_inside_tags() {
        let content = "<span class=\"note\">note</span>";
        let output = resolve_highlights(content, &[Annotation::new("note", "q")]);
        assert_eq!(output, format!("<span class=\"note\">{}</span>", wrap("q", "note")));
    }

    #[test]
    fn later_anchor_cannot_match_inside_earlier_question() {
        let output = resolve_highlights(
            "alpha beta",
            &[Annotation::new("alpha", "beta?"), Annotation::new("beta", "q")],
        );
        assert_eq!(output, format!("{} {}", wrap("beta?", "alpha"), wrap("q", "beta")));
    }

    #[test]
    fn matches_never_split_entity_references() {
        let output = resolve_highlights("a &amp; amp", &[Annotation::new("amp", "q")]);
        assert_eq!(output, format!("a &amp; {}", wrap("q", "amp")));
    }

    #[test]
    fn question_is_attribute_escaped() {
        let output = resolve_highlights("x", &[Annotation::new("x", "say \"hi\"")]);
        assert_eq!(output, wrap("say &quot;hi&quot;", "x"));
    }
}
