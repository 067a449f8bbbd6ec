//! notion-client types used at the wire boundary.

pub use notion_client::objects::{
    error::Error as NotionError,
    page::{FilePropertyValue, PageProperty},
    property::DateOrDateTime,
    rich_text::RichText as NotionRichText,
};
