// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2html::api::{NotionHttpClient, RecordMapClient};
use notion2html::config::{Command, CommandLineInput};
use notion2html::output::write_atomic;
use notion2html::pipeline::{render_post, ApiSource, CacheSource, ContentSource, RecordMapSource};
use notion2html::{
    find_file_url, routing, RenderConfig, ResolveFileConfig, SourceKind, SyncConfig, SyncManager,
};
use std::fs;
use std::process::ExitCode;

/// Exit code of `resolve-file` when the file is not found.
const EXIT_NOT_FOUND: u8 = 2;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("notion2html.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .target(log4rs::append::console::Target::Stderr)
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

async fn run_sync(config: &SyncConfig) -> anyhow::Result<ExitCode> {
    let client = NotionHttpClient::new(&config.api_key)?;
    let report = SyncManager::new(&client, config).run().await?;

    println!(
        "✓ {} entries, {} posts and {} child pages written to {}",
        report.entries,
        report.posts_written,
        report.child_pages_written,
        config.output_dir.display()
    );
    if !report.failed_pages.is_empty() || !report.failed_child_pages.is_empty() {
        eprintln!(
            "⚠️  {} pages could not be fetched; their previous artifacts were kept.",
            report.failed_pages.len() + report.failed_child_pages.len()
        );
    }
    if !report.manifest_written {
        eprintln!("⚠️  Nothing to publish; the manifest was left unchanged.");
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_render(config: &RenderConfig) -> anyhow::Result<ExitCode> {
    let page_id = routing::resolve_target(&config.target)?;

    let api_client = config
        .api_key
        .as_ref()
        .map(NotionHttpClient::new)
        .transpose()?;

    let source: Box<dyn ContentSource + '_> = match (config.source, api_client.as_ref()) {
        (SourceKind::Api, Some(client)) => Box::new(ApiSource::new(client)),
        (SourceKind::Api, None) => anyhow::bail!("NOTION_API_KEY is required for --source api"),
        (SourceKind::RecordMap, _) => Box::new(RecordMapSource::new(RecordMapClient::new(
            config.session_token.as_ref(),
        )?)),
        (SourceKind::Cache, _) => Box::new(CacheSource::new(&config.output_dir)),
    };

    let post = render_post(source.as_ref(), &page_id).await?;

    match &config.out {
        Some(path) => {
            write_atomic(path, post.html.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("✓ '{}' rendered to {}", post.title, path.display());
        }
        None => println!("{}", post.html),
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_resolve_file(config: &ResolveFileConfig) -> anyhow::Result<ExitCode> {
    let client = RecordMapClient::new(config.session_token.as_ref())?;
    let record_map = client.load_page(&config.page_id).await?;

    match find_file_url(&record_map, &config.file_id) {
        Some(url) => {
            println!("{}", url);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!(
                "File {} not found on page {}",
                config.file_id, config.page_id
            );
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        }
    }
}

fn run_route(path: &str) -> ExitCode {
    match routing::legacy_redirect(path) {
        Some(target) => println!("{}", target),
        None => log::info!("No redirect for {}", path),
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).map_err(|e| anyhow::anyhow!("logging setup failed: {}", e))?;

    match cli.command {
        Command::Sync {
            output_dir,
            concurrency,
            depth,
        } => {
            let config = SyncConfig::resolve(output_dir, concurrency, depth)?;
            run_sync(&config).await
        }
        Command::Render {
            target,
            source,
            output_dir,
            out,
        } => {
            let config = RenderConfig::resolve(target, source, output_dir, out)?;
            run_render(&config).await
        }
        Command::ResolveFile { page_id, file_id } => {
            let config = ResolveFileConfig::resolve(&page_id, &file_id)?;
            run_resolve_file(&config).await
        }
        Command::Route { path } => Ok(run_route(&path)),
    }
}
