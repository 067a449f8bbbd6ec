//! Annotation processing for rich text.
//!
//! Annotations wrap innermost-to-outermost in a fixed order: code,
//! strikethrough, underline, italic, bold. Color wraps outside those, and a
//! link wraps last. The order never depends on how the input listed them.

use crate::types::{Annotations, ValidatedUrl};

/// Applies annotation tags around already-escaped content.
pub struct HtmlStyleRenderer;

impl HtmlStyleRenderer {
    pub fn apply_styles(escaped: &str, annotations: &Annotations) -> String {
        let mut result = escaped.to_string();

        if annotations.code {
            result = format!("<code>{}</code>", result);
        }
        if annotations.strikethrough {
            result = format!("<s>{}</s>", result);
        }
        if annotations.underline {
            result = format!("<u>{}</u>", result);
        }
        if annotations.italic {
            result = format!("<em>{}</em>", result);
        }
        if annotations.bold {
            result = format!("<strong>{}</strong>", result);
        }

        if let Some(class) = annotations.color.css_class() {
            result = format!("<span class=\"{}\">{}</span>", class, result);
        }

        result
    }

    /// Wraps styled content in an anchor when the target is usable.
    pub fn apply_link(styled: String, link: Option<&str>) -> String {
        match link.filter(|href| is_safe_href(href)) {
            Some(href) => format!("<a href=\"{}\">{}</a>", html_escape(href), styled),
            None => {
                if let Some(rejected) = link {
                    log::debug!("Dropping unusable link target: {}", rejected);
                }
                styled
            }
        }
    }
}

/// Site-relative paths, fragments, mailto and absolute http(s) URLs.
fn is_safe_href(href: &str) -> bool {
    href.starts_with('/')
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || ValidatedUrl::is_valid(href)
}

/// Escapes text for element content and double-quoted attributes.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
