// src/config.rs
//! Command-line surface and the configuration structs resolved from it.
//!
//! Credentials come from the environment and are read exactly once, here.
//! Everything downstream receives an explicit config by reference.

use crate::constants::{DEFAULT_OUTPUT_DIR, DEFAULT_PAGE_CONCURRENCY, MAX_TREE_DEPTH};
use crate::error::AppError;
use crate::types::{ApiKey, DatabaseId, PageId, SessionToken};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const API_KEY_VAR: &str = "NOTION_API_KEY";
pub const DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";
pub const SESSION_TOKEN_VAR: &str = "NOTION_TOKEN_V2";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mirror the published posts of the blog database into local JSON artifacts
    Sync {
        /// Directory for artifacts and the posts.json manifest
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Number of top-level pages fetched at the same time
        #[arg(long, default_value_t = DEFAULT_PAGE_CONCURRENCY)]
        concurrency: usize,

        /// Maximum block nesting depth to fetch (at most 10)
        #[arg(long, default_value_t = MAX_TREE_DEPTH)]
        depth: u8,
    },

    /// Render one post to HTML
    Render {
        /// Post slug (`post-<id>`) or page id
        target: String,

        /// Where the block tree comes from
        #[arg(long, value_enum, default_value_t = SourceKind::Cache)]
        source: SourceKind,

        /// Directory holding synced artifacts (for `--source cache`)
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print a download URL for a file attached to a page
    ResolveFile {
        #[arg(long)]
        page_id: String,

        #[arg(long)]
        file_id: String,
    },

    /// Print the canonical redirect target for a legacy path
    Route { path: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Official Notion API
    Api,
    /// Private record-map API
    RecordMap,
    /// Artifacts written by `sync`
    Cache,
}

/// Resolved configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api_key: ApiKey,
    pub database_id: DatabaseId,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub max_depth: u8,
}

impl SyncConfig {
    pub fn resolve(output_dir: PathBuf, concurrency: usize, depth: u8) -> Result<Self, AppError> {
        Self::resolve_with(output_dir, concurrency, depth, env_var)
    }

    fn resolve_with(
        output_dir: PathBuf,
        concurrency: usize,
        depth: u8,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key = require_api_key(&lookup)?;
        let database_id = lookup(DATABASE_ID_VAR).ok_or_else(|| {
            AppError::MissingConfiguration(format!("{} environment variable not set", DATABASE_ID_VAR))
        })?;
        let database_id = DatabaseId::parse(&database_id)?;

        if depth > MAX_TREE_DEPTH {
            log::warn!("--depth {} exceeds {}; using {}", depth, MAX_TREE_DEPTH, MAX_TREE_DEPTH);
        }

        Ok(Self {
            api_key,
            database_id,
            output_dir,
            concurrency: concurrency.max(1),
            max_depth: depth.min(MAX_TREE_DEPTH),
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::new("secret_default_key_for_testing_only")
                .expect("Default API key should be valid"),
            database_id: DatabaseId::parse("12345678123456781234567812345678")
                .expect("Example database id should always be valid"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            concurrency: DEFAULT_PAGE_CONCURRENCY,
            max_depth: MAX_TREE_DEPTH,
        }
    }
}

/// Resolved configuration for `render`.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub target: String,
    pub source: SourceKind,
    pub output_dir: PathBuf,
    pub out: Option<PathBuf>,
    pub api_key: Option<ApiKey>,
    pub session_token: Option<SessionToken>,
}

impl RenderConfig {
    pub fn resolve(
        target: String,
        source: SourceKind,
        output_dir: PathBuf,
        out: Option<PathBuf>,
    ) -> Result<Self, AppError> {
        Self::resolve_with(target, source, output_dir, out, env_var)
    }

    fn resolve_with(
        target: String,
        source: SourceKind,
        output_dir: PathBuf,
        out: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key = match source {
            SourceKind::Api => Some(require_api_key(&lookup)?),
            _ => None,
        };

        Ok(Self {
            target,
            source,
            output_dir,
            out,
            api_key,
            session_token: optional_session_token(&lookup)?,
        })
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            source: SourceKind::Cache,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            out: None,
            api_key: None,
            session_token: None,
        }
    }
}

/// Resolved configuration for `resolve-file`.
#[derive(Debug, Clone)]
pub struct ResolveFileConfig {
    pub page_id: PageId,
    pub file_id: String,
    pub session_token: Option<SessionToken>,
}

impl ResolveFileConfig {
    pub fn resolve(page_id: &str, file_id: &str) -> Result<Self, AppError> {
        Self::resolve_with(page_id, file_id, env_var)
    }

    fn resolve_with(
        page_id: &str,
        file_id: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let file_id = file_id.trim();
        if file_id.is_empty() {
            return Err(AppError::MissingConfiguration("--file-id is empty".to_string()));
        }
        Ok(Self {
            page_id: PageId::parse(page_id)?,
            file_id: file_id.to_string(),
            session_token: optional_session_token(&lookup)?,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require_api_key(lookup: &impl Fn(&str) -> Option<String>) -> Result<ApiKey, AppError> {
    let raw = lookup(API_KEY_VAR).ok_or_else(|| {
        AppError::MissingConfiguration(format!("{} environment variable not set", API_KEY_VAR))
    })?;
    Ok(ApiKey::new(raw)?)
}

fn optional_session_token(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<SessionToken>, AppError> {
    lookup(SESSION_TOKEN_VAR)
        .map(SessionToken::new)
        .transpose()
        .map_err(AppError::from)
}
