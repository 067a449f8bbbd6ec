use super::Color;
use serde::{Deserialize, Serialize};

/// Inline styling flags carried by a rich-text span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub color: Color,
}

impl Annotations {
    pub fn is_plain(&self) -> bool {
        *self == Annotations::default()
    }
}

/// One run of text with a single annotation set and optional link.
///
/// Both the official API (`rich_text` arrays) and the record-map API
/// (`[["text", [["b"], ["a", url]]]]` tuples) normalize into this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextSpan {
    #[serde(rename = "plain_text")]
    pub text: String,
    #[serde(rename = "href", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichTextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
            annotations: Annotations::default(),
        }
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// Concatenates the plain text of every span.
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_concatenates_in_order() {
        let spans = vec![
            RichTextSpan::plain("Hello, "),
            RichTextSpan::plain("world").with_link("https://example.com"),
        ];
        assert_eq!(plain_text(&spans), "Hello, world");
        assert_eq!(plain_text(&[]), "");
    }

    #[test]
    fn span_serializes_with_notion_field_names() {
        let json = serde_json::to_value(RichTextSpan::plain("Hi")).unwrap();
        assert_eq!(json["plain_text"], "Hi");
        assert!(json.get("href").is_none());
        assert_eq!(json["annotations"]["color"], "default");
    }
}
