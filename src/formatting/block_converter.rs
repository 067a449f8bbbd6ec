//! Single-block conversion to HTML fragments.
//!
//! A [`BlockFragment`] is the markup before and after a block's children.
//! When `consumes_children` is set the converter has already placed (or
//! deliberately dropped) the children and the caller must not render them.

use super::rich_text::{html_escape, is_blank, rich_text_to_html};
use super::toc::{heading_anchor, TableOfContents};
use crate::attachments::{resolve_attachment, Resolution, INVALID_FILE_PLACEHOLDER};
use crate::model::*;
use crate::types::{plain_text, Color, PostSlug, RichTextSpan, ValidatedUrl};

/// Services a converter needs from the page-level renderer.
pub trait RenderEnv {
    fn signed_urls(&self) -> Option<&SignedUrlTable>;

    /// The page's table of contents. Only the first call per page returns
    /// it; later calls return `None`.
    fn take_table_of_contents(&self) -> Option<&TableOfContents>;

    /// Renders a nested block list, for blocks that lay out their own children.
    /// `first_position` is the pre-order position of `blocks[0]`.
    fn render_children(&self, blocks: &[Block], first_position: usize, level: usize) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockFragment {
    pub opening: String,
    pub closing: String,
    pub consumes_children: bool,
}

impl BlockFragment {
    fn wrap(opening: impl Into<String>, closing: impl Into<String>) -> Self {
        Self {
            opening: opening.into(),
            closing: closing.into(),
            consumes_children: false,
        }
    }

    fn whole(html: impl Into<String>) -> Self {
        Self {
            opening: html.into(),
            closing: String::new(),
            consumes_children: true,
        }
    }

    fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.opening.is_empty() && self.closing.is_empty()
    }
}

/// Converts `block`, found at pre-order position `index` and nesting `level`.
pub fn convert_block(block: &Block, index: usize, level: usize, env: &dyn RenderEnv) -> BlockFragment {
    match block {
        Block::Paragraph(b) => paragraph(b),
        Block::Heading1(b) => heading(1, b, index),
        Block::Heading2(b) => heading(2, b, index),
        Block::Heading3(b) => heading(3, b, index),
        Block::Quote(b) => text_block(&b.content, &b.common, "blockquote", "notion-quote"),
        Block::Callout(b) => callout(b),
        Block::Toggle(b) => BlockFragment::wrap(
            format!(
                "<details class=\"{}\"><summary>{}</summary>",
                class_with_color("notion-toggle", b.content.color),
                rich_text_to_html(&b.content.rich_text)
            ),
            "</details>",
        ),
        Block::BulletedListItem(b) | Block::NumberedListItem(b) => {
            text_block(&b.content, &b.common, "li", "notion-list-item")
        }
        Block::ToDo(b) => to_do(b),
        Block::Code(b) => code(b),
        Block::Divider(_) => BlockFragment::whole("<hr class=\"notion-hr\">"),
        Block::Image(_) | Block::Video(_) | Block::Audio(_) | Block::File(_) | Block::Pdf(_) => {
            match block.media() {
                Some((kind, media)) => media_block(kind, media, env),
                None => BlockFragment::empty(),
            }
        }
        Block::Bookmark(b) => link_card(b, "notion-bookmark"),
        Block::LinkPreview(b) => link_card(b, "notion-link-preview"),
        Block::Embed(b) => embed(b),
        Block::Equation(b) => BlockFragment::whole(format!(
            "<div class=\"notion-equation\">$${}$$</div>",
            html_escape(&b.expression)
        )),
        Block::Table(b) => table(b),
        Block::TableRow(b) => BlockFragment::whole(table_row(&b.cells, 0, false, false, 0)),
        Block::ColumnList(b) => column_list(b, index, level, env),
        Block::Column(_) => BlockFragment::wrap("<div class=\"notion-column\">", "</div>"),
        Block::TableOfContents(b) => match env.take_table_of_contents() {
            Some(toc) => BlockFragment::whole(toc.to_html(b.color)),
            None => BlockFragment::empty(),
        },
        Block::Breadcrumb(_) => BlockFragment::whole("<div class=\"notion-breadcrumb\"></div>"),
        Block::LinkToPage(b) => match &b.page_id {
            Some(page_id) => BlockFragment::whole(page_link(
                &PostSlug::for_page(page_id),
                "🔗",
                LINKED_PAGE_LABEL,
            )),
            None => BlockFragment::empty(),
        },
        Block::SyncedBlock(b) => synced(b),
        Block::TemplateButton(b) => BlockFragment::whole(format!(
            "<div class=\"notion-template-button\">{}</div>",
            rich_text_to_html(&b.rich_text)
        )),
        Block::ChildPage(b) => {
            let title = b.title.trim();
            let title = if title.is_empty() { UNTITLED_CHILD_PAGE } else { title };
            BlockFragment::whole(page_link(&PostSlug::for_page(&b.page_id()), "📄", title))
        }
        Block::Unsupported(b) => {
            log::warn!("Rendering marker for unsupported block {} ({})", b.common.id, b.block_type);
            BlockFragment::whole(format!(
                "<div class=\"notion-unsupported\">{} 블록</div>",
                html_escape(&b.block_type)
            ))
        }
    }
}

/// Label for `link_to_page` blocks, whose target title is not fetched.
pub const LINKED_PAGE_LABEL: &str = "링크된 페이지";

fn class_with_color(base: &str, color: Color) -> String {
    match color.css_class() {
        Some(c) => format!("{} {}", base, c),
        None => base.to_string(),
    }
}

fn paragraph(block: &ParagraphBlock) -> BlockFragment {
    let class = class_with_color("notion-text", block.content.color);
    let body = if is_blank(&block.content.rich_text) {
        "&nbsp;".to_string()
    } else {
        rich_text_to_html(&block.content.rich_text)
    };
    let opening = format!("<p class=\"{}\">{}</p>", class, body);
    if block.common.children.is_empty() {
        BlockFragment::wrap(opening, "")
    } else {
        BlockFragment::wrap(format!("{}<div class=\"notion-indent\">", opening), "</div>")
    }
}

/// Text-bearing container that disappears when it has neither text nor children.
fn text_block(content: &TextBlockContent, common: &BlockCommon, tag: &str, base: &str) -> BlockFragment {
    if is_blank(&content.rich_text) && common.children.is_empty() {
        return BlockFragment::empty();
    }
    BlockFragment::wrap(
        format!(
            "<{} class=\"{}\">{}",
            tag,
            class_with_color(base, content.color),
            rich_text_to_html(&content.rich_text)
        ),
        format!("</{}>", tag),
    )
}

fn heading(level: u8, block: &HeadingBlock, index: usize) -> BlockFragment {
    let spans = &block.content.rich_text;
    if is_blank(spans) {
        return BlockFragment::empty();
    }
    let anchor = heading_anchor(index, plain_text(spans).trim());
    let tag = format!(
        "<h{lvl} id=\"{anchor}\" class=\"{class}\">{text}</h{lvl}>",
        lvl = level,
        anchor = anchor,
        class = class_with_color(&format!("notion-h notion-h{}", level), block.content.color),
        text = rich_text_to_html(spans)
    );

    if block.is_toggleable || block.common.has_children {
        BlockFragment::wrap(
            format!("<details class=\"notion-toggle-heading\"><summary>{}</summary>", tag),
            "</details>",
        )
    } else {
        BlockFragment::wrap(tag, "")
    }
}

fn callout(block: &CalloutBlock) -> BlockFragment {
    if is_blank(&block.content.rich_text) && block.common.children.is_empty() {
        return BlockFragment::empty();
    }
    let icon = match &block.icon {
        Some(Icon::Emoji { emoji }) => html_escape(emoji),
        Some(Icon::External { url }) if ValidatedUrl::is_valid(url) => {
            format!("<img src=\"{}\" alt=\"\">", html_escape(url))
        }
        _ => String::new(),
    };
    BlockFragment::wrap(
        format!(
            "<div class=\"{}\"><div class=\"notion-callout-icon\">{}</div><div class=\"notion-callout-text\">{}",
            class_with_color("notion-callout", block.content.color),
            icon,
            rich_text_to_html(&block.content.rich_text)
        ),
        "</div></div>",
    )
}

fn to_do(block: &ToDoBlock) -> BlockFragment {
    if is_blank(&block.content.rich_text) && block.common.children.is_empty() {
        return BlockFragment::empty();
    }
    let (checked, text_class) = if block.checked {
        (" checked", "notion-to-do-checked")
    } else {
        ("", "notion-to-do-unchecked")
    };
    BlockFragment::wrap(
        format!(
            "<div class=\"{}\"><div class=\"notion-to-do-item\"><input type=\"checkbox\" disabled{}> <span class=\"{}\">{}</span></div>",
            class_with_color("notion-to-do", block.content.color),
            checked,
            text_class,
            rich_text_to_html(&block.content.rich_text)
        ),
        "</div>",
    )
}

fn code(block: &CodeBlock) -> BlockFragment {
    let language: String = block
        .language
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let language = if language.is_empty() { "plain-text".to_string() } else { language };

    let mut html = format!(
        "<pre class=\"notion-code\"><code class=\"language-{}\">{}</code></pre>",
        html_escape(&language),
        html_escape(&block.text)
    );
    html.push_str(&caption(&block.caption, "notion-code-caption"));
    BlockFragment::whole(html)
}

fn caption(spans: &[RichTextSpan], class: &str) -> String {
    if is_blank(spans) {
        String::new()
    } else {
        format!("<figcaption class=\"{}\">{}</figcaption>", class, rich_text_to_html(spans))
    }
}

fn media_block(kind: MediaKind, media: &MediaBlock, env: &dyn RenderEnv) -> BlockFragment {
    let resolution = resolve_attachment(kind, media, env.signed_urls());
    let Resolution::Resolved { url, display_name } = resolution else {
        return BlockFragment::whole(format!(
            "<div class=\"notion-file-invalid\">{}</div>",
            INVALID_FILE_PLACEHOLDER
        ));
    };
    let src = html_escape(&url);
    let name = html_escape(&display_name);
    let figcaption = caption(&media.caption, "notion-asset-caption");

    let html = match kind {
        MediaKind::Image => format!(
            "<figure class=\"notion-asset-wrapper notion-image\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\">{}</figure>",
            src, name, figcaption
        ),
        MediaKind::Video => match video_embed_url(&url) {
            Some(embed) => format!(
                "<figure class=\"notion-asset-wrapper notion-video\"><iframe src=\"{}\" allowfullscreen loading=\"lazy\"></iframe>{}</figure>",
                html_escape(&embed),
                figcaption
            ),
            None => format!(
                "<figure class=\"notion-asset-wrapper notion-video\"><video src=\"{}\" controls></video>{}</figure>",
                src, figcaption
            ),
        },
        MediaKind::Audio => format!(
            "<figure class=\"notion-asset-wrapper notion-audio\"><audio src=\"{}\" controls></audio>{}</figure>",
            src, figcaption
        ),
        MediaKind::File => format!(
            "<div class=\"notion-file\"><a href=\"{}\" download>{} 다운로드</a>{}</div>",
            src, name, figcaption
        ),
        MediaKind::Pdf => format!(
            "<figure class=\"notion-asset-wrapper notion-pdf\"><embed src=\"{src}\" type=\"application/pdf\"><a href=\"{src}\" download>{name} 다운로드</a>{cap}</figure>",
            src = src,
            name = name,
            cap = figcaption
        ),
    };
    BlockFragment::whole(html)
}

/// YouTube and Vimeo page URLs become their player URLs.
fn video_embed_url(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    match host {
        "youtube.com" | "m.youtube.com" => url
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| format!("https://www.youtube.com/embed/{}", v)),
        "youtu.be" => url
            .path_segments()?
            .next()
            .filter(|id| !id.is_empty())
            .map(|id| format!("https://www.youtube.com/embed/{}", id)),
        "vimeo.com" => url
            .path_segments()?
            .find(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .map(|id| format!("https://player.vimeo.com/video/{}", id)),
        _ => None,
    }
}

fn link_card(block: &UrlBlock, class: &str) -> BlockFragment {
    if !ValidatedUrl::is_valid(&block.url) {
        log::warn!("Block {} has no usable link target", block.common.id);
        return BlockFragment::empty();
    }
    let label = if is_blank(&block.caption) {
        html_escape(&block.url)
    } else {
        rich_text_to_html(&block.caption)
    };
    BlockFragment::whole(format!(
        "<a class=\"{}\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        class,
        html_escape(&block.url),
        label
    ))
}

fn embed(block: &UrlBlock) -> BlockFragment {
    if !ValidatedUrl::is_valid(&block.url) {
        log::warn!("Embed {} has no usable source", block.common.id);
        return BlockFragment::empty();
    }
    BlockFragment::whole(format!(
        "<figure class=\"notion-asset-wrapper notion-embed\"><iframe src=\"{}\" loading=\"lazy\"></iframe>{}</figure>",
        html_escape(&block.url),
        caption(&block.caption, "notion-asset-caption")
    ))
}

fn table(block: &TableBlock) -> BlockFragment {
    let mut html = String::from("<table class=\"notion-table\"><tbody>");
    let rows = block.common.children.iter().filter_map(|child| match child {
        Block::TableRow(row) => Some(row),
        _ => None,
    });
    for (row_index, row) in rows.enumerate() {
        html.push_str(&table_row(
            &row.cells,
            row_index,
            block.has_column_header,
            block.has_row_header,
            block.table_width,
        ));
    }
    html.push_str("</tbody></table>");
    BlockFragment::whole(html)
}

fn table_row(
    cells: &[Vec<RichTextSpan>],
    row_index: usize,
    column_header: bool,
    row_header: bool,
    width: usize,
) -> String {
    let mut html = String::from("<tr>");
    let empty = Vec::new();
    for col in 0..width.max(cells.len()) {
        let cell = cells.get(col).unwrap_or(&empty);
        let content = rich_text_to_html(cell);
        if column_header && row_index == 0 {
            html.push_str(&format!("<th scope=\"col\">{}</th>", content));
        } else if row_header && col == 0 {
            html.push_str(&format!("<th scope=\"row\">{}</th>", content));
        } else {
            html.push_str(&format!("<td>{}</td>", content));
        }
    }
    html.push_str("</tr>");
    html
}

fn column_list(block: &StructuralBlock, index: usize, level: usize, env: &dyn RenderEnv) -> BlockFragment {
    let width = block
        .common
        .children
        .iter()
        .filter(|child| matches!(child, Block::Column(_)))
        .count();
    let mut html = String::from("<div class=\"notion-row\">");
    let mut position = index + 1;
    for child in &block.common.children {
        if let Block::Column(_) = child {
            html.push_str(&format!(
                "<div class=\"notion-column\" style=\"width: calc(100% / {})\">{}</div>",
                width,
                env.render_children(child.children(), position + 1, level + 1)
            ));
        }
        position += 1 + count_blocks(child.children());
    }
    html.push_str("</div>");
    BlockFragment::whole(html)
}

fn synced(block: &SyncedBlock) -> BlockFragment {
    match &block.synced_from {
        Some(source) => BlockFragment::whole(format!(
            "<div class=\"notion-sync-block-reference\" data-synced-from=\"{id}\">동기화된 블록 ({id})</div>",
            id = source
        )),
        None => BlockFragment::wrap("<div class=\"notion-sync-block\">", "</div>"),
    }
}

fn page_link(slug: &PostSlug, icon: &str, title: &str) -> String {
    format!(
        "<a class=\"notion-page-link\" href=\"{}\" data-client-nav>{} {}</a>",
        slug.blog_path(),
        icon,
        html_escape(title)
    )
}
