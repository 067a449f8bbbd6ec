//! Publish-status discovery and the entry query strategy.
//!
//! The blog database marks published posts with a select (or status)
//! property whose name and values vary between workspaces. Candidates are
//! tried in a fixed order and the first filter that returns entries wins.
//! Any dead end falls back to the unfiltered listing.

use crate::api::types::{StatusFilter, StatusPropertyKind};
use crate::api::NotionRepository;
use crate::constants::{PUBLISHED_STATUS_VALUES, STATUS_PROPERTY_CANDIDATES};
use crate::error::AppError;
use crate::model::{DatabaseSchema, PageMetadata};
use crate::types::DatabaseId;

/// The first candidate property typed as select or status.
pub fn find_status_property(schema: &DatabaseSchema) -> Option<(&'static str, StatusPropertyKind)> {
    STATUS_PROPERTY_CANDIDATES.iter().find_map(|name| {
        let kind = schema
            .property_type(name)
            .and_then(StatusPropertyKind::from_schema_type)?;
        Some((*name, kind))
    })
}

/// Entries to publish, never failing the run.
///
/// Runs the filtered strategy, retries once unfiltered if it errors, and
/// yields no entries if that fails too.
pub async fn discover_entries<R>(repository: &R, database_id: &DatabaseId) -> Vec<PageMetadata>
where
    R: NotionRepository + ?Sized,
{
    match query_published(repository, database_id).await {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Filtered query failed ({}); retrying without a filter", e);
            match repository.query_all(database_id, None).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::error!("Could not query database {}: {}", database_id, e);
                    Vec::new()
                }
            }
        }
    }
}

/// Tries each published value of the discovered status property in turn.
pub async fn query_published<R>(
    repository: &R,
    database_id: &DatabaseId,
) -> Result<Vec<PageMetadata>, AppError>
where
    R: NotionRepository + ?Sized,
{
    let schema = match repository.retrieve_database(database_id).await {
        Ok(schema) => Some(schema),
        Err(e) => {
            log::warn!("Could not read schema of {}: {}", database_id, e);
            None
        }
    };

    let Some((property, kind)) = schema.as_ref().and_then(find_status_property) else {
        log::info!("No status property found; listing every entry");
        return repository.query_all(database_id, None).await;
    };

    for value in PUBLISHED_STATUS_VALUES {
        let filter = StatusFilter {
            property: property.to_string(),
            kind,
            value: value.to_string(),
        };
        match repository.query_all(database_id, Some(&filter)).await {
            Ok(entries) if !entries.is_empty() => {
                log::info!(
                    "{} entries with {} = {}",
                    entries.len(),
                    property,
                    value
                );
                return Ok(entries);
            }
            Ok(_) => log::debug!("No entries with {} = {}", property, value),
            Err(e) => log::warn!("Query with {} = {} failed: {}", property, value, e),
        }
    }

    log::info!("No published value matched on '{}'; listing every entry", property);
    repository.query_all(database_id, None).await
}
