//! Block rendering engine: converts a page's block tree to HTML.
//!
//! Consecutive list items are grouped into one `<ul>`/`<ol>`, nested
//! children are rendered between a fragment's opening and closing markup,
//! and the first `table_of_contents` block receives the page's heading index.

use super::block_converter::{convert_block, RenderEnv};
use super::toc::{build_table_of_contents, TableOfContents};
use crate::constants::CHARS_PER_BLOCK_ESTIMATE;
use crate::model::{count_blocks, Block, SignedUrlTable};
use std::cell::Cell;

/// Inputs that vary per page fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Signed URLs from a record-map fetch; `None` for structured API data.
    pub signed_urls: Option<&'a SignedUrlTable>,
}

/// Rendered page body together with the heading index it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlocks {
    pub html: String,
    pub toc: TableOfContents,
}

/// Renders a page's top-level blocks into HTML.
pub fn render_blocks(blocks: &[Block], context: &RenderContext) -> String {
    render_page(blocks, context).html
}

/// Renders a page and returns its table of contents alongside.
pub fn render_page(blocks: &[Block], context: &RenderContext) -> RenderedBlocks {
    let renderer = PageRenderer::new(blocks, context);
    log::debug!(
        "Rendering {} blocks ({} headings, signed urls: {})",
        count_blocks(blocks),
        renderer.toc.len(),
        context.signed_urls.map_or(0, SignedUrlTable::len)
    );
    let html = renderer.render_list(blocks, 0, 0);
    RenderedBlocks {
        html,
        toc: renderer.toc,
    }
}

/// Positions are pre-order indices over the whole tree, the same numbering
/// [`build_table_of_contents`] uses. They come from each block's place in the
/// tree, so a block reached twice gets two positions.
struct PageRenderer<'a> {
    signed_urls: Option<&'a SignedUrlTable>,
    toc: TableOfContents,
    toc_pending: Cell<bool>,
}

impl<'a> PageRenderer<'a> {
    fn new(blocks: &[Block], context: &RenderContext<'a>) -> Self {
        Self {
            signed_urls: context.signed_urls,
            toc: build_table_of_contents(blocks),
            toc_pending: Cell::new(true),
        }
    }

    fn render_list(&self, blocks: &[Block], first_position: usize, level: usize) -> String {
        let mut output = String::with_capacity(blocks.len() * CHARS_PER_BLOCK_ESTIMATE);
        let mut open_list: Option<ListKind> = None;
        let mut position = first_position;

        for block in blocks {
            let html = self.render_block(block, position, level);
            position += 1 + count_blocks(block.children());
            if html.is_empty() {
                continue;
            }

            let kind = ListKind::of(block);
            if open_list != kind {
                if let Some(open) = open_list {
                    output.push_str(open.closing());
                }
                if let Some(next) = kind {
                    output.push_str(&next.opening(level));
                }
                open_list = kind;
            }
            output.push_str(&html);
        }

        if let Some(open) = open_list {
            output.push_str(open.closing());
        }
        output
    }

    fn render_block(&self, block: &Block, position: usize, level: usize) -> String {
        let fragment = convert_block(block, position, level, self);

        let mut html = fragment.opening;
        if !fragment.consumes_children && !block.children().is_empty() {
            html.push_str(&self.render_list(block.children(), position + 1, level + 1));
        }
        html.push_str(&fragment.closing);
        html
    }
}

impl RenderEnv for PageRenderer<'_> {
    fn signed_urls(&self) -> Option<&SignedUrlTable> {
        self.signed_urls
    }

    fn take_table_of_contents(&self) -> Option<&TableOfContents> {
        self.toc_pending.replace(false).then_some(&self.toc)
    }

    fn render_children(&self, blocks: &[Block], first_position: usize, level: usize) -> String {
        self.render_list(blocks, first_position, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    fn of(block: &Block) -> Option<Self> {
        match block {
            Block::BulletedListItem(_) => Some(ListKind::Bulleted),
            Block::NumberedListItem(_) => Some(ListKind::Numbered),
            _ => None,
        }
    }

    /// Nested numbered lists cycle through `1`, `a`, `i` like Notion does.
    fn opening(&self, level: usize) -> String {
        match self {
            ListKind::Bulleted => "<ul class=\"notion-list notion-list-disc\">".to_string(),
            ListKind::Numbered => format!(
                "<ol class=\"notion-list notion-list-numbered\" type=\"{}\">",
                ["1", "a", "i"][level % 3]
            ),
        }
    }

    fn closing(&self) -> &'static str {
        match self {
            ListKind::Bulleted => "</ul>",
            ListKind::Numbered => "</ol>",
        }
    }
}
