//! Private-API record map → canonical [`Block`] tree.
//!
//! A record map is a flat table of block records keyed by dashed id; the tree
//! is implied by each record's `content` list. Text lives in
//! `properties.title` as `[[text, [[code, arg?], ..]], ..]` segments.

use crate::constants::MAX_TREE_DEPTH;
use crate::error::AppError;
use crate::model::*;
use crate::types::{Annotations, BlockId, Color, NotionId, PageId, PostSlug, RichTextSpan};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Prefix marking a record-map source that must go through the signed-URL table.
pub const ATTACHMENT_PREFIX: &str = "attachment:";

/// Record map as returned by `loadPageChunk`, possibly merged over several chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMap {
    #[serde(default)]
    pub block: IndexMap<String, Value>,
    #[serde(default)]
    pub signed_urls: BTreeMap<String, String>,
}

impl RecordMap {
    /// Adds the records of a later chunk. Existing records are kept.
    pub fn merge(&mut self, other: RecordMap) {
        for (id, record) in other.block {
            self.block.entry(id).or_insert(record);
        }
        self.signed_urls.extend(other.signed_urls);
    }

    /// The block value for `id`, accepting dashed or plain ids.
    pub fn block_value(&self, id: &str) -> Option<&Value> {
        let record = self.block.get(id).or_else(|| {
            NotionId::parse(id)
                .ok()
                .and_then(|parsed| self.block.get(&parsed.to_dashed()))
        })?;
        unwrap_record(record)
    }

    /// All live block values in insertion order.
    pub fn block_values(&self) -> impl Iterator<Item = &Value> {
        self.block
            .values()
            .filter_map(unwrap_record)
            .filter(|value| value.get("alive").and_then(Value::as_bool) != Some(false))
    }

    pub fn signed_url_table(&self) -> SignedUrlTable {
        self.signed_urls
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Records come as `{role, value}` or, in newer responses, `{value: {role, value}}`.
fn unwrap_record(record: &Value) -> Option<&Value> {
    let value = record.get("value")?;
    match value.get("value") {
        Some(inner) if inner.is_object() => Some(inner),
        _ => Some(value),
    }
}

/// One page decoded from a record map.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMapPage {
    pub page_id: PageId,
    /// Plain-text page title, `None` when the page record has none.
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub signed_urls: SignedUrlTable,
}

/// Decodes the tree under `page_id`.
///
/// Blocks missing from the map (beyond the fetched chunks) are skipped; a
/// block reached twice or past the depth ceiling keeps no children.
pub fn page_from_record_map(
    record_map: &RecordMap,
    page_id: &PageId,
) -> Result<RecordMapPage, AppError> {
    let root = record_map.block_value(page_id.as_str()).ok_or_else(|| {
        AppError::MalformedResponse(format!("Record map has no block for page {}", page_id))
    })?;

    let decoder = Decoder { record_map };
    let mut visited = HashSet::new();
    visited.insert(page_id.as_str().to_string());

    let title = Some(decoder.plain(property(root, "title"))).filter(|t| !t.trim().is_empty());
    let blocks = decoder.children(root, 1, &[], &mut visited);

    log::debug!(
        "Decoded {} blocks for page {} from record map",
        count_blocks(&blocks),
        page_id
    );

    Ok(RecordMapPage {
        page_id: page_id.clone(),
        title,
        blocks,
        signed_urls: record_map.signed_url_table(),
    })
}

/// Decodes record-map text segments without page-mention titles.
pub fn decode_rich_text(value: &Value) -> Vec<RichTextSpan> {
    Decoder {
        record_map: &RecordMap::default(),
    }
    .rich_text(value)
}

struct Decoder<'a> {
    record_map: &'a RecordMap,
}

impl Decoder<'_> {
    fn children(
        &self,
        parent: &Value,
        depth: u8,
        table_columns: &[String],
        visited: &mut HashSet<String>,
    ) -> Vec<Block> {
        let Some(ids) = parent.get("content").and_then(Value::as_array) else {
            return Vec::new();
        };

        let mut blocks = Vec::with_capacity(ids.len());
        for raw_id in ids.iter().filter_map(Value::as_str) {
            let Some(value) = self.record_map.block_value(raw_id) else {
                log::warn!("Block {} is referenced but missing from the record map", raw_id);
                continue;
            };
            if value.get("alive").and_then(Value::as_bool) == Some(false) {
                continue;
            }
            let Some(mut block) = self.block(value, table_columns) else {
                continue;
            };

            let first_visit = visited.insert(block.id().as_str().to_string());
            let descend = first_visit && depth < MAX_TREE_DEPTH && !block.is_child_page();
            if !first_visit {
                log::warn!("Block {} appears twice in the tree; not descending", block.id());
            }
            if descend {
                let columns = column_order(value);
                let children = self.children(value, depth + 1, &columns, visited);
                block.set_children(children);
            }
            blocks.push(block);
        }
        blocks
    }

    fn block(&self, value: &Value, table_columns: &[String]) -> Option<Block> {
        let raw_id = value.get("id").and_then(Value::as_str)?;
        let id = match BlockId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Skipping record with invalid id: {}", e);
                return None;
            }
        };
        let block_type = value.get("type").and_then(Value::as_str).unwrap_or("unsupported");
        let common = BlockCommon {
            id,
            has_children: value
                .get("content")
                .and_then(Value::as_array)
                .is_some_and(|c| !c.is_empty()),
            children: Vec::new(),
        };
        Some(self.convert(block_type, value, common, table_columns))
    }

    fn convert(
        &self,
        block_type: &str,
        value: &Value,
        common: BlockCommon,
        table_columns: &[String],
    ) -> Block {
        match block_type {
            "text" => Block::Paragraph(ParagraphBlock {
                common,
                content: self.text_content(value),
            }),
            "header" => Block::Heading1(self.heading(value, common)),
            "sub_header" => Block::Heading2(self.heading(value, common)),
            "sub_sub_header" => Block::Heading3(self.heading(value, common)),
            "quote" => Block::Quote(QuoteBlock {
                common,
                content: self.text_content(value),
            }),
            "callout" => Block::Callout(CalloutBlock {
                common,
                content: self.text_content(value),
                icon: format_str(value, "page_icon").map(|icon| {
                    if icon.starts_with("http") || icon.starts_with('/') {
                        Icon::External { url: icon }
                    } else {
                        Icon::Emoji { emoji: icon }
                    }
                }),
            }),
            "toggle" => Block::Toggle(ToggleBlock {
                common,
                content: self.text_content(value),
            }),
            "bulleted_list" => Block::BulletedListItem(ListItemBlock {
                common,
                content: self.text_content(value),
            }),
            "numbered_list" => Block::NumberedListItem(ListItemBlock {
                common,
                content: self.text_content(value),
            }),
            "to_do" => Block::ToDo(ToDoBlock {
                common,
                content: self.text_content(value),
                checked: first_str(property(value, "checked")) == Some("Yes"),
            }),
            "code" => Block::Code(CodeBlock {
                common,
                language: first_str(property(value, "language"))
                    .unwrap_or_default()
                    .to_lowercase(),
                text: self.plain(property(value, "title")),
                caption: self.rich_text(property(value, "caption")),
            }),
            "divider" => Block::Divider(StructuralBlock { common }),
            "breadcrumb" => Block::Breadcrumb(StructuralBlock { common }),
            "column_list" => Block::ColumnList(StructuralBlock { common }),
            "column" => Block::Column(StructuralBlock { common }),
            "table_of_contents" => Block::TableOfContents(TableOfContentsBlock {
                common,
                color: block_color(value),
            }),
            "image" => Block::Image(self.media(value, common)),
            "video" => Block::Video(self.media(value, common)),
            "audio" => Block::Audio(self.media(value, common)),
            "file" => Block::File(self.media(value, common)),
            "pdf" => Block::Pdf(self.media(value, common)),
            "bookmark" => Block::Bookmark(UrlBlock {
                common,
                url: first_str(property(value, "link")).unwrap_or_default().to_string(),
                caption: self.rich_text(property(value, "caption")),
            }),
            "embed" | "tweet" | "gist" | "figma" | "maps" | "codepen" | "drive" | "excalidraw"
            | "typeform" | "replit" => Block::Embed(UrlBlock {
                common,
                url: format_str(value, "display_source")
                    .or_else(|| first_str(property(value, "source")).map(str::to_string))
                    .unwrap_or_default(),
                caption: self.rich_text(property(value, "caption")),
            }),
            "equation" => Block::Equation(EquationBlock {
                common,
                expression: self.plain(property(value, "title")),
            }),
            "table" => Block::Table(TableBlock {
                common,
                table_width: column_order(value).len(),
                has_column_header: format_bool(value, "table_block_column_header"),
                has_row_header: format_bool(value, "table_block_row_header"),
            }),
            "table_row" => Block::TableRow(TableRowBlock {
                common,
                cells: table_columns
                    .iter()
                    .map(|column| self.rich_text(property(value, column)))
                    .collect(),
            }),
            "page" => Block::ChildPage(ChildPageBlock {
                common,
                title: self.plain(property(value, "title")),
            }),
            "alias" => Block::LinkToPage(LinkToPageBlock {
                common,
                page_id: pointer_id(value, "alias_pointer").and_then(|id| PageId::parse(id).ok()),
            }),
            "transclusion_container" => Block::SyncedBlock(SyncedBlock {
                common,
                synced_from: None,
            }),
            "transclusion_reference" => Block::SyncedBlock(SyncedBlock {
                common,
                synced_from: pointer_id(value, "transclusion_reference_pointer")
                    .and_then(|id| BlockId::parse(id).ok()),
            }),
            "button" | "template" => Block::TemplateButton(TemplateButtonBlock {
                common,
                rich_text: self.rich_text(property(value, "title")),
            }),
            other => {
                log::debug!("Record {} has unmodelled type '{}'", common.id, other);
                Block::Unsupported(UnsupportedBlock {
                    common,
                    block_type: other.to_string(),
                })
            }
        }
    }

    fn text_content(&self, value: &Value) -> TextBlockContent {
        TextBlockContent {
            rich_text: self.rich_text(property(value, "title")),
            color: block_color(value),
        }
    }

    fn heading(&self, value: &Value, common: BlockCommon) -> HeadingBlock {
        HeadingBlock {
            common,
            content: self.text_content(value),
            is_toggleable: format_bool(value, "toggleable"),
        }
    }

    fn media(&self, value: &Value, common: BlockCommon) -> MediaBlock {
        let source = first_str(property(value, "source"))
            .map(str::to_string)
            .or_else(|| format_str(value, "display_source"));
        MediaBlock {
            common,
            source,
            file: None,
            file_name: first_str(property(value, "title"))
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string),
            caption: self.rich_text(property(value, "caption")),
            display_name: None,
        }
    }

    fn plain(&self, value: &Value) -> String {
        crate::types::plain_text(&self.rich_text(value))
    }

    fn rich_text(&self, value: &Value) -> Vec<RichTextSpan> {
        let Some(segments) = value.as_array() else {
            return Vec::new();
        };
        segments
            .iter()
            .filter_map(|segment| {
                let text = segment.get(0)?.as_str()?;
                let decorations = segment.get(1).and_then(Value::as_array);
                Some(self.span(text, decorations.map(Vec::as_slice).unwrap_or_default()))
            })
            .collect()
    }

    fn span(&self, text: &str, decorations: &[Value]) -> RichTextSpan {
        let mut span = RichTextSpan {
            text: text.to_string(),
            link: None,
            annotations: Annotations::default(),
        };
        for decoration in decorations {
            let Some(code) = decoration.get(0).and_then(Value::as_str) else {
                continue;
            };
            let arg = decoration.get(1);
            match code {
                "b" => span.annotations.bold = true,
                "i" => span.annotations.italic = true,
                "s" => span.annotations.strikethrough = true,
                "_" => span.annotations.underline = true,
                "c" => span.annotations.code = true,
                "a" => span.link = arg.and_then(Value::as_str).map(str::to_string),
                "h" => {
                    span.annotations.color = arg
                        .and_then(Value::as_str)
                        .map(Color::parse_lenient)
                        .unwrap_or_default()
                }
                "e" => {
                    if let Some(expression) = arg.and_then(Value::as_str) {
                        span.text = expression.to_string();
                    }
                }
                "d" => {
                    if let Some(date) = arg
                        .and_then(|a| a.get("start_date"))
                        .and_then(Value::as_str)
                    {
                        span.text = date.to_string();
                    }
                }
                "p" => {
                    if let Some(page_id) = arg.and_then(Value::as_str) {
                        self.page_mention(&mut span, page_id);
                    }
                }
                other => log::debug!("Ignoring text decoration '{}'", other),
            }
        }
        span
    }

    /// Mentions point at the page's blog route, titled from the map when possible.
    fn page_mention(&self, span: &mut RichTextSpan, raw_id: &str) {
        let Ok(page_id) = PageId::parse(raw_id) else {
            return;
        };
        if let Some(title) = self
            .record_map
            .block_value(raw_id)
            .map(|page| self.plain(property(page, "title")))
            .filter(|title| !title.is_empty())
        {
            span.text = title;
        }
        span.link = Some(PostSlug::for_page(&page_id).blog_path());
    }
}

fn property<'v>(value: &'v Value, name: &str) -> &'v Value {
    value
        .get("properties")
        .and_then(|props| props.get(name))
        .unwrap_or(&Value::Null)
}

/// `[[value]]`-shaped property → its first string.
fn first_str(property: &Value) -> Option<&str> {
    property.get(0)?.get(0)?.as_str()
}

fn format_str(value: &Value, key: &str) -> Option<String> {
    value
        .get("format")
        .and_then(|f| f.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn format_bool(value: &Value, key: &str) -> bool {
    value
        .get("format")
        .and_then(|f| f.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn block_color(value: &Value) -> Color {
    format_str(value, "block_color")
        .map(|c| Color::parse_lenient(&c))
        .unwrap_or_default()
}

fn pointer_id<'v>(value: &'v Value, pointer: &str) -> Option<&'v str> {
    value.get("format")?.get(pointer)?.get("id")?.as_str()
}

fn column_order(value: &Value) -> Vec<String> {
    value
        .get("format")
        .and_then(|f| f.get("table_block_column_order"))
        .and_then(Value::as_array)
        .map(|cols| {
            cols.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Splits `attachment:<file id>:<name>` into the file id.
pub fn attachment_file_id(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(ATTACHMENT_PREFIX)?;
    let id = rest.split(':').next()?;
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PAGE: &str = "1a1d9eed-7ec6-8022-8a3e-c54b7bd4db1a";

    fn id(n: u8) -> String {
        format!("00000000-0000-0000-0000-0000000000{:02x}", n)
    }

    fn record(value: Value) -> Value {
        json!({"role": "reader", "value": value})
    }

    fn fixture() -> RecordMap {
        let mut block = IndexMap::new();
        block.insert(
            PAGE.to_string(),
            record(json!({
                "id": PAGE, "type": "page", "alive": true,
                "properties": {"title": [["Guide"]]},
                "content": [id(1), id(2), id(3), id(4)]
            })),
        );
        block.insert(
            id(1),
            record(json!({
                "id": id(1), "type": "text",
                "properties": {"title": [["Hello "], ["world", [["b"], ["h", "red"]]]]}
            })),
        );
        block.insert(
            id(2),
            record(json!({
                "id": id(2), "type": "file",
                "properties": {"source": [["attachment:abc-123:report.pdf"]], "title": [["report.pdf"]]}
            })),
        );
        block.insert(
            id(3),
            record(json!({
                "id": id(3), "type": "table",
                "format": {"table_block_column_order": ["x", "y"], "table_block_column_header": true},
                "content": [id(5)]
            })),
        );
        block.insert(
            id(4),
            record(json!({"id": id(4), "type": "collection_view"})),
        );
        block.insert(
            id(5),
            record(json!({
                "id": id(5), "type": "table_row",
                "properties": {"y": [["second"]], "x": [["first"]]}
            })),
        );
        RecordMap {
            block,
            signed_urls: BTreeMap::from([(id(2), "https://signed.example/report".to_string())]),
        }
    }

    #[test]
    fn decodes_tree_in_content_order() {
        let page = page_from_record_map(&fixture(), &PageId::parse(PAGE).unwrap()).unwrap();

        assert_eq!(page.title.as_deref(), Some("Guide"));
        let types: Vec<_> = page.blocks.iter().map(Block::block_type).collect();
        assert_eq!(types, vec!["paragraph", "file", "table", "collection_view"]);
        assert_eq!(page.signed_urls.len(), 1);
    }

    #[test]
    fn decorations_become_annotations() {
        let page = page_from_record_map(&fixture(), &PageId::parse(PAGE).unwrap()).unwrap();
        let spans = page.blocks[0].rich_text().unwrap();

        assert_eq!(spans.len(), 2);
        assert!(spans[0].annotations.is_plain());
        assert!(spans[1].annotations.bold);
        assert_eq!(spans[1].annotations.color, Color::Red);
    }

    #[test]
    fn file_keeps_attachment_source_and_name() {
        let page = page_from_record_map(&fixture(), &PageId::parse(PAGE).unwrap()).unwrap();
        let (kind, media) = page.blocks[1].media().unwrap();

        assert_eq!(kind, MediaKind::File);
        assert_eq!(media.source.as_deref(), Some("attachment:abc-123:report.pdf"));
        assert_eq!(media.file_name.as_deref(), Some("report.pdf"));
    }

    #[test]
    fn table_rows_follow_column_order() {
        let page = page_from_record_map(&fixture(), &PageId::parse(PAGE).unwrap()).unwrap();
        let Block::Table(table) = &page.blocks[2] else {
            panic!("expected table")
        };
        assert_eq!(table.table_width, 2);
        assert!(table.has_column_header);

        let Block::TableRow(row) = &table.common.children[0] else {
            panic!("expected row")
        };
        let cells: Vec<_> = row.cells.iter().map(|c| crate::types::plain_text(c)).collect();
        assert_eq!(cells, vec!["first", "second"]);
    }

    #[test]
    fn self_referencing_content_terminates() {
        let mut map = fixture();
        map.block.insert(
            id(1),
            record(json!({"id": id(1), "type": "toggle", "content": [id(1)]})),
        );

        let page = page_from_record_map(&map, &PageId::parse(PAGE).unwrap()).unwrap();
        let toggle = &page.blocks[0];
        assert_eq!(toggle.children().len(), 1);
        assert!(toggle.children()[0].children().is_empty());
    }

    #[test]
    fn nested_value_wrapper_is_unwrapped() {
        let mut map = RecordMap::default();
        map.block.insert(
            PAGE.to_string(),
            json!({"spaceId": "s", "value": {"role": "reader", "value": {"id": PAGE, "type": "page"}}}),
        );
        let value = map
            .block_value("1a1d9eed7ec680228a3ec54b7bd4db1a")
            .unwrap();
        assert_eq!(value["type"], "page");
    }

    #[test]
    fn missing_page_is_malformed() {
        let err = page_from_record_map(&RecordMap::default(), &PageId::parse(PAGE).unwrap())
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn attachment_id_extraction() {
        assert_eq!(attachment_file_id("attachment:abc:ignored"), Some("abc"));
        assert_eq!(attachment_file_id("attachment::x"), None);
        assert_eq!(attachment_file_id("https://example.com/a.png"), None);
    }

    #[test]
    fn page_mention_links_to_blog_route() {
        let spans = decode_rich_text(&json!([["‣", [["p", PAGE]]]]));
        assert_eq!(
            spans[0].link.as_deref(),
            Some("/blog/post-1a1d9eed7ec680228a3ec54b7bd4db1a")
        );
    }
}
