//! Adapter from Notion page and database objects to domain metadata.
//!
//! Each page property is decoded on its own with notion-client's
//! `PageProperty`, so one property of an unexpected shape costs only that
//! property. Metadata fields walk an ordered chain of property names and end
//! in a fixed default; a missing property is never an error.

use super::responses::{DateOrDateTime, FilePropertyValue, NotionRichText, PageProperty};
use crate::error::AppError;
use crate::ingest::rich_text_from_api;
use crate::model::{DatabaseSchema, PageMetadata, UNTITLED_PAGE};
use crate::types::{plain_text, DatabaseId, PageId};
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use notion_client::objects::file::File as NcFile;
use serde_json::Value;

const TITLE_PROPERTIES: &[&str] = &["Title", "title"];
const SLUG_PROPERTIES: &[&str] = &["Slug", "slug"];
const DATE_PROPERTIES: &[&str] = &["Date", "date"];
const DESCRIPTION_PROPERTIES: &[&str] = &["Description", "description", "Summary", "요약"];
const COVER_PROPERTIES: &[&str] = &["Cover", "Image", "Thumbnail"];

/// Decoded properties of one page, in response order.
struct PageProperties(IndexMap<String, PageProperty>);

impl PageProperties {
    fn from_api(page_id: &PageId, value: &Value) -> Self {
        let mut properties = IndexMap::new();
        let Some(raw) = value.get("properties").and_then(Value::as_object) else {
            return Self(properties);
        };
        for (name, property) in raw {
            match serde_json::from_value::<PageProperty>(property.clone()) {
                Ok(decoded) => {
                    properties.insert(name.clone(), decoded);
                }
                Err(e) => log::warn!(
                    "Failed to decode property '{}' of page {}: {}. Skipping.",
                    name,
                    page_id,
                    e
                ),
            }
        }
        Self(properties)
    }

    fn first_text(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| match self.0.get(*name)? {
            PageProperty::Title { title, .. } => non_empty(notion_plain_text(title)),
            PageProperty::RichText { rich_text, .. } => non_empty(notion_plain_text(rich_text)),
            _ => None,
        })
    }

    fn any_title(&self) -> Option<String> {
        self.0.values().find_map(|property| match property {
            PageProperty::Title { title, .. } => non_empty(notion_plain_text(title)),
            _ => None,
        })
    }

    fn first_date(&self, names: &[&str]) -> Option<NaiveDate> {
        names.iter().find_map(|name| match self.0.get(*name)? {
            PageProperty::Date { date: Some(date), .. } => date.start.clone().map(resolve_date),
            _ => None,
        })
    }

    fn first_file_url(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| match self.0.get(*name)? {
            PageProperty::Files { files, .. } => files.first().map(file_url),
            _ => None,
        })
    }
}

/// Builds [`PageMetadata`] from a page object.
pub fn page_metadata_from_api(value: &Value) -> Result<PageMetadata, AppError> {
    let raw_id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::MalformedResponse("Page is missing 'id'".to_string()))?;
    let id = PageId::parse(raw_id)?;
    let properties = PageProperties::from_api(&id, value);

    let title = properties
        .first_text(TITLE_PROPERTIES)
        .or_else(|| properties.any_title())
        .unwrap_or_else(|| {
            log::warn!("Page {} has no title; using default", id);
            UNTITLED_PAGE.to_string()
        });

    let date = properties.first_date(DATE_PROPERTIES).or_else(|| {
        value
            .get("created_time")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
            .map(|created| created.date_naive())
    });

    let cover = value
        .get("cover")
        .and_then(cover_url)
        .or_else(|| properties.first_file_url(COVER_PROPERTIES));

    Ok(PageMetadata {
        title,
        date,
        description: properties
            .first_text(DESCRIPTION_PROPERTIES)
            .unwrap_or_default(),
        cover,
        custom_slug: properties.first_text(SLUG_PROPERTIES),
        url: value.get("url").and_then(Value::as_str).map(str::to_string),
        id,
    })
}

/// Builds a [`DatabaseSchema`] from a database object.
pub fn database_schema_from_api(value: &Value) -> Result<DatabaseSchema, AppError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .map(DatabaseId::parse)
        .transpose()?;

    let properties = value
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, prop)| {
                    let kind = prop.get("type").and_then(Value::as_str)?;
                    Some((name.clone(), kind.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(DatabaseSchema {
        id,
        title: plain_text(&rich_text_from_api(value.get("title").unwrap_or(&Value::Null))),
        properties,
    })
}

fn notion_plain_text(items: &[NotionRichText]) -> String {
    items
        .iter()
        .map(|item| match item {
            NotionRichText::Text {
                text, plain_text, ..
            } => plain_text.clone().unwrap_or_else(|| text.content.clone()),
            NotionRichText::Mention { plain_text, .. } => plain_text.clone(),
            NotionRichText::Equation { plain_text, .. } => plain_text.clone(),
            #[allow(unreachable_patterns)]
            _ => String::new(),
        })
        .collect()
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn resolve_date(value: DateOrDateTime) -> NaiveDate {
    match value {
        DateOrDateTime::Date(date) => date,
        DateOrDateTime::DateTime(date_time) => date_time.date_naive(),
    }
}

fn file_url(file: &FilePropertyValue) -> String {
    match &file.file {
        NcFile::External { external } => external.url.clone(),
        NcFile::File { file } => file.url.clone(),
    }
}

/// Page `cover`: `{type: "external", external: {url}}` or `{type: "file", file: {url}}`.
fn cover_url(cover: &Value) -> Option<String> {
    let kind = cover.get("type")?.as_str()?;
    cover
        .get(kind)?
        .get("url")?
        .as_str()
        .map(str::to_string)
}
