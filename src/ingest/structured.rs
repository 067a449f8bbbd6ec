//! Official API block JSON → canonical [`Block`].
//!
//! Payload fields are probed leniently: a missing or mistyped field becomes
//! its empty value instead of failing the block. Only a missing id is fatal
//! for a block, because nothing downstream can address it.

use crate::error::AppError;
use crate::model::*;
use crate::types::{Annotations, BlockId, Color, PageId, RichTextSpan};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ApiRichText {
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    annotations: Annotations,
    #[serde(default)]
    text: Option<ApiTextContent>,
    #[serde(default)]
    equation: Option<ApiEquation>,
}

#[derive(Debug, Deserialize)]
struct ApiTextContent {
    #[serde(default)]
    content: String,
    #[serde(default)]
    link: Option<ApiLink>,
}

#[derive(Debug, Deserialize)]
struct ApiLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiEquation {
    expression: String,
}

impl From<ApiRichText> for RichTextSpan {
    fn from(item: ApiRichText) -> Self {
        let (content, text_link) = match item.text {
            Some(t) => (Some(t.content), t.link.map(|l| l.url)),
            None => (None, None),
        };
        let text = item
            .plain_text
            .or(content)
            .or_else(|| item.equation.map(|e| e.expression))
            .unwrap_or_default();

        RichTextSpan {
            text,
            link: text_link.or(item.href),
            annotations: item.annotations,
        }
    }
}

/// Converts a Notion API `rich_text` array. Malformed input yields no spans.
pub fn rich_text_from_api(value: &Value) -> Vec<RichTextSpan> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match ApiRichText::deserialize(item) {
                Ok(rt) => Some(RichTextSpan::from(rt)),
                Err(e) => {
                    log::warn!("Skipping malformed rich text item: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Converts one block object from `GET /blocks/{id}/children`.
pub fn block_from_api(value: &Value) -> Result<Block, AppError> {
    let raw_id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::MalformedResponse("Block is missing 'id'".to_string()))?;
    let id = BlockId::parse(raw_id)?;

    let block_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unsupported");
    let payload = value.get(block_type).unwrap_or(&Value::Null);

    let common = BlockCommon {
        id,
        has_children: bool_field(value, "has_children"),
        children: Vec::new(),
    };

    Ok(convert_payload(block_type, payload, common))
}

fn convert_payload(block_type: &str, payload: &Value, common: BlockCommon) -> Block {
    match block_type {
        "paragraph" => Block::Paragraph(ParagraphBlock {
            common,
            content: text_content(payload),
        }),
        "heading_1" => Block::Heading1(heading(payload, common)),
        "heading_2" => Block::Heading2(heading(payload, common)),
        "heading_3" => Block::Heading3(heading(payload, common)),
        "quote" => Block::Quote(QuoteBlock {
            common,
            content: text_content(payload),
        }),
        "callout" => Block::Callout(CalloutBlock {
            common,
            content: text_content(payload),
            icon: payload.get("icon").and_then(icon),
        }),
        "toggle" => Block::Toggle(ToggleBlock {
            common,
            content: text_content(payload),
        }),
        "bulleted_list_item" => Block::BulletedListItem(ListItemBlock {
            common,
            content: text_content(payload),
        }),
        "numbered_list_item" => Block::NumberedListItem(ListItemBlock {
            common,
            content: text_content(payload),
        }),
        "to_do" => Block::ToDo(ToDoBlock {
            common,
            content: text_content(payload),
            checked: bool_field(payload, "checked"),
        }),
        "code" => Block::Code(CodeBlock {
            common,
            language: str_field(payload, "language").unwrap_or_default(),
            text: crate::types::plain_text(&rich_text_from_api(&payload["rich_text"])),
            caption: rich_text_from_api(&payload["caption"]),
        }),
        "divider" => Block::Divider(StructuralBlock { common }),
        "breadcrumb" => Block::Breadcrumb(StructuralBlock { common }),
        "column_list" => Block::ColumnList(StructuralBlock { common }),
        "column" => Block::Column(StructuralBlock { common }),
        "image" => Block::Image(media(payload, common)),
        "video" => Block::Video(media(payload, common)),
        "audio" => Block::Audio(media(payload, common)),
        "file" => Block::File(media(payload, common)),
        "pdf" => Block::Pdf(media(payload, common)),
        "bookmark" => Block::Bookmark(url_block(payload, common)),
        "embed" => Block::Embed(url_block(payload, common)),
        "link_preview" => Block::LinkPreview(url_block(payload, common)),
        "equation" => Block::Equation(EquationBlock {
            common,
            expression: str_field(payload, "expression").unwrap_or_default(),
        }),
        "table" => Block::Table(TableBlock {
            common,
            table_width: payload
                .get("table_width")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize,
            has_column_header: bool_field(payload, "has_column_header"),
            has_row_header: bool_field(payload, "has_row_header"),
        }),
        "table_row" => Block::TableRow(TableRowBlock {
            common,
            cells: payload
                .get("cells")
                .and_then(Value::as_array)
                .map(|cells| cells.iter().map(rich_text_from_api).collect())
                .unwrap_or_default(),
        }),
        "table_of_contents" => Block::TableOfContents(TableOfContentsBlock {
            common,
            color: color_field(payload),
        }),
        "link_to_page" => Block::LinkToPage(LinkToPageBlock {
            common,
            page_id: str_field(payload, "page_id").and_then(|id| PageId::parse(&id).ok()),
        }),
        "synced_block" => Block::SyncedBlock(SyncedBlock {
            common,
            synced_from: payload
                .get("synced_from")
                .and_then(|from| from.get("block_id"))
                .and_then(Value::as_str)
                .and_then(|id| BlockId::parse(id).ok()),
        }),
        "template" => Block::TemplateButton(TemplateButtonBlock {
            common,
            rich_text: rich_text_from_api(&payload["rich_text"]),
        }),
        "child_page" => Block::ChildPage(ChildPageBlock {
            common,
            title: str_field(payload, "title").unwrap_or_default(),
        }),
        other => {
            log::debug!("Block {} has unmodelled type '{}'", common.id, other);
            Block::Unsupported(UnsupportedBlock {
                common,
                block_type: other.to_string(),
            })
        }
    }
}

fn text_content(payload: &Value) -> TextBlockContent {
    TextBlockContent {
        rich_text: rich_text_from_api(&payload["rich_text"]),
        color: color_field(payload),
    }
}

fn heading(payload: &Value, common: BlockCommon) -> HeadingBlock {
    HeadingBlock {
        common,
        content: text_content(payload),
        is_toggleable: bool_field(payload, "is_toggleable"),
    }
}

fn media(payload: &Value, common: BlockCommon) -> MediaBlock {
    MediaBlock {
        common,
        source: None,
        file: file_object(payload),
        file_name: None,
        caption: rich_text_from_api(&payload["caption"]),
        display_name: None,
    }
}

/// Reads `{type: "external", external: {url}}` or `{type: "file", file: {url}}`.
fn file_object(payload: &Value) -> Option<FileObject> {
    let name = str_field(payload, "name").filter(|n| !n.trim().is_empty());
    let (hosting, location) = match payload.get("type").and_then(Value::as_str) {
        Some("external") => (FileHosting::External, payload.get("external")?),
        Some("file") => (FileHosting::Notion, payload.get("file")?),
        _ => return None,
    };
    let url = str_field(location, "url")?;
    Some(FileObject { hosting, url, name })
}

fn url_block(payload: &Value, common: BlockCommon) -> UrlBlock {
    UrlBlock {
        common,
        url: str_field(payload, "url").unwrap_or_default(),
        caption: rich_text_from_api(&payload["caption"]),
    }
}

fn icon(value: &Value) -> Option<Icon> {
    match value.get("type").and_then(Value::as_str)? {
        "emoji" => str_field(value, "emoji").map(|emoji| Icon::Emoji { emoji }),
        kind @ ("external" | "file") => value
            .get(kind)
            .and_then(|loc| str_field(loc, "url"))
            .map(|url| Icon::External { url }),
        _ => None,
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn color_field(value: &Value) -> Color {
    value
        .get("color")
        .and_then(Value::as_str)
        .map(Color::parse_lenient)
        .unwrap_or_default()
}
