//! Formats rich-text spans into inline HTML.

mod annotations;

pub use annotations::{html_escape, HtmlStyleRenderer};

use crate::types::RichTextSpan;

/// Renders spans in order. An empty slice renders as an empty string.
///
/// Newlines inside a span become `<br>` so soft line breaks survive.
pub fn rich_text_to_html(spans: &[RichTextSpan]) -> String {
    spans.iter().map(format_span).collect()
}

fn format_span(span: &RichTextSpan) -> String {
    if span.text.is_empty() {
        return String::new();
    }
    let escaped = html_escape(&span.text).replace('\n', "<br>");
    let styled = HtmlStyleRenderer::apply_styles(&escaped, &span.annotations);
    HtmlStyleRenderer::apply_link(styled, span.link.as_deref())
}

/// True when the spans carry no visible text.
pub fn is_blank(spans: &[RichTextSpan]) -> bool {
    spans.iter().all(|span| span.text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotations, Color};
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_spans_equal_their_escaped_text() {
        let spans = vec![RichTextSpan::plain("Hello "), RichTextSpan::plain("world")];
        assert_eq!(rich_text_to_html(&spans), "Hello world");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(rich_text_to_html(&[]), "");
        assert!(is_blank(&[]));
    }

    #[test]
    fn link_wraps_color() {
        let span = RichTextSpan::plain("docs")
            .with_annotations(Annotations {
                italic: true,
                color: Color::Blue,
                ..Default::default()
            })
            .with_link("https://example.com/docs");
        assert_eq!(
            rich_text_to_html(&[span]),
            "<a href=\"https://example.com/docs\"><span class=\"notion-blue\"><em>docs</em></span></a>"
        );
    }

    #[test]
    fn unknown_color_adds_no_markup() {
        let span = RichTextSpan::plain("x").with_annotations(Annotations {
            color: Color::parse_lenient("chartreuse"),
            ..Default::default()
        });
        assert_eq!(rich_text_to_html(&[span]), "x");
    }

    #[test]
    fn text_is_escaped_and_breaks_kept() {
        let spans = vec![RichTextSpan::plain("a < b\nc")];
        assert_eq!(rich_text_to_html(&spans), "a &lt; b<br>c");
    }
}
