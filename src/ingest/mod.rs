//! Normalization of Notion payloads into the canonical block model.
//!
//! Both the official API and the private record-map API describe the same
//! content with different shapes. Everything past this module works on
//! [`crate::model::Block`] only.

pub mod record_map;
pub mod structured;

pub use record_map::{
    attachment_file_id, decode_rich_text, page_from_record_map, RecordMap, RecordMapPage,
    ATTACHMENT_PREFIX,
};
pub use structured::{block_from_api, rich_text_from_api};
