use super::blocks::*;
use super::common::BlockCommon;
use crate::types::{BlockId, RichTextSpan};
use serde::{Deserialize, Serialize};

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Paragraph($pattern) => $result,
            Block::Heading1($pattern) => $result,
            Block::Heading2($pattern) => $result,
            Block::Heading3($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::Callout($pattern) => $result,
            Block::Toggle($pattern) => $result,
            Block::BulletedListItem($pattern) => $result,
            Block::NumberedListItem($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::Video($pattern) => $result,
            Block::Audio($pattern) => $result,
            Block::File($pattern) => $result,
            Block::Pdf($pattern) => $result,
            Block::Bookmark($pattern) => $result,
            Block::Embed($pattern) => $result,
            Block::LinkPreview($pattern) => $result,
            Block::Equation($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableRow($pattern) => $result,
            Block::ColumnList($pattern) => $result,
            Block::Column($pattern) => $result,
            Block::TableOfContents($pattern) => $result,
            Block::Breadcrumb($pattern) => $result,
            Block::LinkToPage($pattern) => $result,
            Block::SyncedBlock($pattern) => $result,
            Block::TemplateButton($pattern) => $result,
            Block::ChildPage($pattern) => $result,
            Block::Unsupported($pattern) => $result,
        }
    };
}

/// One node of a page's content tree, in the canonical internal shape.
///
/// Serialized with an internal `type` tag matching Notion's block type
/// names, so artifacts stay readable by anything that knows Notion JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(ParagraphBlock),
    #[serde(rename = "heading_1")]
    Heading1(HeadingBlock),
    #[serde(rename = "heading_2")]
    Heading2(HeadingBlock),
    #[serde(rename = "heading_3")]
    Heading3(HeadingBlock),
    Quote(QuoteBlock),
    Callout(CalloutBlock),
    Toggle(ToggleBlock),
    BulletedListItem(ListItemBlock),
    NumberedListItem(ListItemBlock),
    ToDo(ToDoBlock),
    Code(CodeBlock),
    Divider(StructuralBlock),
    Image(MediaBlock),
    Video(MediaBlock),
    Audio(MediaBlock),
    File(MediaBlock),
    Pdf(MediaBlock),
    Bookmark(UrlBlock),
    Embed(UrlBlock),
    LinkPreview(UrlBlock),
    Equation(EquationBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    ColumnList(StructuralBlock),
    Column(StructuralBlock),
    TableOfContents(TableOfContentsBlock),
    Breadcrumb(StructuralBlock),
    LinkToPage(LinkToPageBlock),
    SyncedBlock(SyncedBlock),
    TemplateButton(TemplateButtonBlock),
    ChildPage(ChildPageBlock),
    Unsupported(UnsupportedBlock),
}

impl Block {
    pub fn id(&self) -> &BlockId {
        match_all_blocks!(self, b => &b.common.id)
    }

    pub fn common(&self) -> &BlockCommon {
        match_all_blocks!(self, b => &b.common)
    }

    pub fn common_mut(&mut self) -> &mut BlockCommon {
        match_all_blocks!(self, b => &mut b.common)
    }

    pub fn children(&self) -> &[Block] {
        &self.common().children
    }

    pub fn has_children(&self) -> bool {
        self.common().has_children
    }

    /// Attaches fetched children, keeping `has_children` truthful.
    pub fn set_children(&mut self, children: Vec<Block>) {
        let common = self.common_mut();
        if !children.is_empty() {
            common.has_children = true;
        }
        common.children = children;
    }

    /// Notion type name of this block.
    pub fn block_type(&self) -> &str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading1(_) => "heading_1",
            Block::Heading2(_) => "heading_2",
            Block::Heading3(_) => "heading_3",
            Block::Quote(_) => "quote",
            Block::Callout(_) => "callout",
            Block::Toggle(_) => "toggle",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::ToDo(_) => "to_do",
            Block::Code(_) => "code",
            Block::Divider(_) => "divider",
            Block::Image(_) => "image",
            Block::Video(_) => "video",
            Block::Audio(_) => "audio",
            Block::File(_) => "file",
            Block::Pdf(_) => "pdf",
            Block::Bookmark(_) => "bookmark",
            Block::Embed(_) => "embed",
            Block::LinkPreview(_) => "link_preview",
            Block::Equation(_) => "equation",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
            Block::ColumnList(_) => "column_list",
            Block::Column(_) => "column",
            Block::TableOfContents(_) => "table_of_contents",
            Block::Breadcrumb(_) => "breadcrumb",
            Block::LinkToPage(_) => "link_to_page",
            Block::SyncedBlock(_) => "synced_block",
            Block::TemplateButton(_) => "template_button",
            Block::ChildPage(_) => "child_page",
            Block::Unsupported(b) => &b.block_type,
        }
    }

    /// Heading level (1-3) for heading blocks.
    pub fn heading(&self) -> Option<(u8, &HeadingBlock)> {
        match self {
            Block::Heading1(h) => Some((1, h)),
            Block::Heading2(h) => Some((2, h)),
            Block::Heading3(h) => Some((3, h)),
            _ => None,
        }
    }

    pub fn media(&self) -> Option<(MediaKind, &MediaBlock)> {
        match self {
            Block::Image(m) => Some((MediaKind::Image, m)),
            Block::Video(m) => Some((MediaKind::Video, m)),
            Block::Audio(m) => Some((MediaKind::Audio, m)),
            Block::File(m) => Some((MediaKind::File, m)),
            Block::Pdf(m) => Some((MediaKind::Pdf, m)),
            _ => None,
        }
    }

    pub fn media_mut(&mut self) -> Option<(MediaKind, &mut MediaBlock)> {
        match self {
            Block::Image(m) => Some((MediaKind::Image, m)),
            Block::Video(m) => Some((MediaKind::Video, m)),
            Block::Audio(m) => Some((MediaKind::Audio, m)),
            Block::File(m) => Some((MediaKind::File, m)),
            Block::Pdf(m) => Some((MediaKind::Pdf, m)),
            _ => None,
        }
    }

    /// Rich text of text-bearing blocks.
    pub fn rich_text(&self) -> Option<&[RichTextSpan]> {
        match self {
            Block::Paragraph(b) => Some(&b.content.rich_text),
            Block::Heading1(b) | Block::Heading2(b) | Block::Heading3(b) => {
                Some(&b.content.rich_text)
            }
            Block::Quote(b) => Some(&b.content.rich_text),
            Block::Callout(b) => Some(&b.content.rich_text),
            Block::Toggle(b) => Some(&b.content.rich_text),
            Block::BulletedListItem(b) | Block::NumberedListItem(b) => Some(&b.content.rich_text),
            Block::ToDo(b) => Some(&b.content.rich_text),
            Block::TemplateButton(b) => Some(&b.rich_text),
            _ => None,
        }
    }

    /// Child pages are separate documents: their children are never
    /// materialized inline.
    pub fn is_child_page(&self) -> bool {
        matches!(self, Block::ChildPage(_))
    }
}

/// Pre-order flattening of a block forest, including consumed children.
pub fn flatten_blocks(blocks: &[Block]) -> Vec<&Block> {
    fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
        for block in blocks {
            out.push(block);
            visit(block.children(), out);
        }
    }

    let mut out = Vec::new();
    visit(blocks, &mut out);
    out
}

/// Total number of blocks in a forest.
pub fn count_blocks(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|b| 1 + count_blocks(b.children()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use pretty_assertions::assert_eq;

    fn id(n: u8) -> BlockId {
        BlockId::parse(&format!("{:032x}", n)).unwrap()
    }

    fn paragraph(n: u8, text: &str) -> Block {
        Block::Paragraph(ParagraphBlock {
            common: BlockCommon::new(id(n)),
            content: TextBlockContent::new(vec![RichTextSpan::plain(text)]),
        })
    }

    #[test]
    fn paragraph_serializes_with_type_tag() {
        let json = serde_json::to_value(paragraph(1, "Hello")).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["id"], format!("{:032x}", 1));
        assert_eq!(json["rich_text"][0]["plain_text"], "Hello");
        assert_eq!(json["color"], "default");
        assert!(json.get("children").is_none());
    }

    #[test]
    fn heading_tags_use_notion_names() {
        let heading = Block::Heading2(HeadingBlock {
            common: BlockCommon::new(id(2)),
            content: TextBlockContent {
                rich_text: vec![RichTextSpan::plain("Title")],
                color: Color::Red,
            },
            is_toggleable: true,
        });
        let json = serde_json::to_value(&heading).unwrap();
        assert_eq!(json["type"], "heading_2");
        assert_eq!(json["is_toggleable"], true);

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, heading);
    }

    #[test]
    fn nested_tree_survives_deserialization() {
        let mut toggle = Block::Toggle(ToggleBlock {
            common: BlockCommon::new(id(3)),
            content: TextBlockContent::new(vec![RichTextSpan::plain("More")]),
        });
        toggle.set_children(vec![paragraph(4, "inside")]);

        let text = serde_json::to_string(&toggle).unwrap();
        let back: Block = serde_json::from_str(&text).unwrap();
        assert_eq!(back, toggle);
        assert!(back.has_children());
    }

    #[test]
    fn unsupported_reports_its_original_type() {
        let block = Block::Unsupported(UnsupportedBlock {
            common: BlockCommon::new(id(5)),
            block_type: "child_database".to_string(),
        });
        assert_eq!(block.block_type(), "child_database");
    }

    #[test]
    fn flatten_is_pre_order() {
        let mut parent = paragraph(1, "a");
        parent.set_children(vec![paragraph(2, "b"), paragraph(3, "c")]);
        let forest = vec![parent, paragraph(4, "d")];

        let ids: Vec<_> = flatten_blocks(&forest)
            .into_iter()
            .map(|b| b.id().clone())
            .collect();
        assert_eq!(ids, vec![id(1), id(2), id(3), id(4)]);
        assert_eq!(count_blocks(&forest), 4);
    }
}
