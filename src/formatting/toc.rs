//! Table-of-contents builder.
//!
//! Anchors are `h-<position>-<slug>`, where position is the heading's index
//! in the pre-order flattening of the page. Re-rendering an unchanged page
//! always produces the same anchors.

use super::rich_text::html_escape;
use crate::model::{flatten_blocks, Block};
use crate::types::{plain_text, Color};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

/// Ordered heading index of one page. Empty when the page has no headings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableOfContents {
    pub entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Renders the navigation list that replaces a `table_of_contents` block.
    pub fn to_html(&self, color: Color) -> String {
        if self.is_empty() {
            return String::new();
        }
        let class = match color.css_class() {
            Some(c) => format!("notion-table-of-contents {}", c),
            None => "notion-table-of-contents".to_string(),
        };
        let mut html = format!("<nav class=\"{}\">", class);
        for entry in &self.entries {
            html.push_str(&format!(
                "<a class=\"notion-table-of-contents-item notion-toc-level-{}\" href=\"#{}\">{}</a>",
                entry.level,
                entry.anchor,
                html_escape(&entry.text)
            ));
        }
        html.push_str("</nav>");
        html
    }
}

/// Scans the page's flattened block list for non-empty headings.
pub fn build_table_of_contents(blocks: &[Block]) -> TableOfContents {
    let mut toc = TableOfContents::default();

    for (index, block) in flatten_blocks(blocks).into_iter().enumerate() {
        let Some((level, heading)) = block.heading() else {
            continue;
        };
        let text = plain_text(&heading.content.rich_text).trim().to_string();
        if text.is_empty() {
            continue;
        }
        toc.entries.push(TocEntry {
            level,
            anchor: heading_anchor(index, &text),
            text,
        });
    }

    log::debug!("Built table of contents with {} entries", toc.len());
    toc
}

pub fn heading_anchor(index: usize, text: &str) -> String {
    format!("h-{}-{}", index, slugify(text))
}

/// Lowercases, keeps letters and digits of any script, joins words with `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockCommon, HeadingBlock, ParagraphBlock, TextBlockContent};
    use crate::types::RichTextSpan;
    use pretty_assertions::assert_eq;

    fn heading(text: &str) -> HeadingBlock {
        HeadingBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::new(vec![RichTextSpan::plain(text)]),
            is_toggleable: false,
        }
    }

    #[test]
    fn headings_in_order_with_distinct_anchors() {
        let blocks = vec![Block::Heading1(heading("A")), Block::Heading2(heading("B"))];
        let toc = build_table_of_contents(&blocks);

        let levels: Vec<_> = toc.entries.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2]);
        assert_eq!(toc.entries[0].anchor, "h-0-a");
        assert_eq!(toc.entries[1].anchor, "h-1-b");
    }

    #[test]
    fn anchors_are_stable_across_builds() {
        let blocks = vec![Block::Heading1(heading("Intro")), Block::Heading1(heading("Intro"))];
        let first = build_table_of_contents(&blocks);
        let second = build_table_of_contents(&blocks);
        assert_eq!(first.entries, second.entries);
        assert_ne!(first.entries[0].anchor, first.entries[1].anchor);
    }

    #[test]
    fn no_headings_yields_empty_result() {
        let blocks = vec![Block::Paragraph(ParagraphBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::new(vec![RichTextSpan::plain("text")]),
        })];
        let toc = build_table_of_contents(&blocks);
        assert!(toc.is_empty());
        assert_eq!(toc.to_html(Color::Default), "");
    }

    #[test]
    fn nested_headings_are_found_and_indexed() {
        let mut toggle = Block::Heading1(heading("Outer"));
        toggle.set_children(vec![Block::Heading3(heading("Inner"))]);
        let toc = build_table_of_contents(&[toggle]);

        assert_eq!(toc.len(), 2);
        assert_eq!(toc.entries[0].anchor, "h-0-outer");
        assert_eq!(toc.entries[1].anchor, "h-1-inner");
    }

    #[test]
    fn slugify_keeps_hangul_and_collapses_separators() {
        assert_eq!(slugify("  Hello,  World! "), "hello-world");
        assert_eq!(slugify("시작 하기"), "시작-하기");
        assert_eq!(slugify("!!!"), "section");
    }
}
