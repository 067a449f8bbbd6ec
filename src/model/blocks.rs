//! Per-type block payloads.
//!
//! Each struct flattens [`BlockCommon`] and its payload fields into one JSON
//! object, so a persisted block reads `{"type": "paragraph", "id": ..,
//! "rich_text": [..]}`.

use super::common::BlockCommon;
use crate::types::{BlockId, Color, PageId, RichTextSpan};
use serde::{Deserialize, Serialize};

/// Text content shared by paragraph-like blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlockContent {
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    pub color: Color,
}

impl TextBlockContent {
    pub fn new(rich_text: Vec<RichTextSpan>) -> Self {
        Self {
            rich_text,
            color: Color::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
}

/// Heading of any level; the level lives in the [`super::Block`] variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadingBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
    #[serde(default)]
    pub is_toggleable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuoteBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { url: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalloutBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToggleBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
}

/// Bulleted or numbered list item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItemBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToDoBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(flatten)]
    pub content: TextBlockContent,
    #[serde(default)]
    pub checked: bool,
}

/// Code is kept as raw text; annotations inside it are discarded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichTextSpan>,
}

/// Blocks that carry nothing beyond their position and children:
/// divider, breadcrumb, column_list and column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuralBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
}

/// Where a nested file object is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileHosting {
    External,
    Notion,
}

/// Structured-API file object (`block.<type>.external` / `block.<type>.file`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub hosting: FileHosting,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Which media block type a [`MediaBlock`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    File,
    Pdf,
}

impl MediaKind {
    /// Generic display label used when no file name is known.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            MediaKind::Image => "이미지",
            MediaKind::Pdf => "PDF 문서",
            MediaKind::Video => "동영상",
            MediaKind::Audio => "오디오",
            MediaKind::File => "첨부파일",
        }
    }

    /// Image, pdf and file blocks are treated as downloadable attachments.
    pub fn is_attachment(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::File | MediaKind::Pdf)
    }
}

/// Image, video, audio, file and pdf blocks.
///
/// Holds whichever URL locations the source shape provided; the attachment
/// resolver decides which one wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    /// Record-map `properties.source[0][0]`, possibly `attachment:<id>:<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileObject>,
    /// Explicit file-name property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichTextSpan>,
    /// Set when the tree walker classifies the block as an attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Bookmark, embed and link_preview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UrlBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichTextSpan>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquationBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub table_width: usize,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRowBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub cells: Vec<Vec<RichTextSpan>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableOfContentsBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkToPageBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    /// `None` when the link targets something other than a page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
}

/// Synced block: an original owning its content, or a reference to one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncedBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_from: Option<BlockId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateButtonBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
}

/// Link to a nested page. The block id is the child page's id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildPageBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(default)]
    pub title: String,
}

impl ChildPageBlock {
    pub fn page_id(&self) -> PageId {
        self.common.id.cast()
    }
}

/// Any block type this crate does not model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnsupportedBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    pub block_type: String,
}
