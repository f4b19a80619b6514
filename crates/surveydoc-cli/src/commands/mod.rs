//! CLI command definitions and dispatch.

pub mod document;
pub mod migrate;
pub mod sweep;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use surveydoc_core::config::AppConfig;
use surveydoc_core::error::AppError;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_database::store::DocumentStore;
use surveydoc_entity::document::DocumentKey;
use surveydoc_service::{DocumentService, VersioningService};

use crate::output::OutputFormat;

/// SurveyDoc: versioned survey document store
#[derive(Debug, Parser)]
#[command(name = "surveydoc", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// List the retained versions of a document
    History(document::HistoryArgs),
    /// Show a document and the content of one version
    Show(document::ShowArgs),
    /// Delete unreferenced content blobs of a tenant
    Sweep(sweep::SweepArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.config)?;
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::History(args) => document::history(args, &config, self.format).await,
            Commands::Show(args) => document::show(args, &config, self.format).await,
            Commands::Sweep(args) => sweep::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: load and validate configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    let config = AppConfig::load_file(config_path)?;
    config.validate()?;
    Ok(config)
}

/// Record and blob stores opened from configuration.
pub struct Backends {
    /// Record store
    pub store: Arc<dyn DocumentStore>,
    /// Blob store
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// Open both stores.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        if config.database.is_memory() {
            crate::output::print_warning("database.url is memory://; the store starts empty");
        }
        Ok(Self {
            store: surveydoc_database::open_store(&config.database).await?,
            blobs: surveydoc_storage::build_blob_store(&config.storage).await?,
        })
    }

    /// Document service over the opened stores.
    pub fn document_service(&self, config: &AppConfig) -> DocumentService {
        let file_type = config.storage.default_file_type.clone();
        let versioning = VersioningService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
            config.versioning.clone(),
            file_type.clone(),
        );
        DocumentService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
            Arc::new(versioning),
            file_type,
        )
    }
}

/// Parse `tenant/document` or `tenant#document`.
pub fn parse_key(raw: &str) -> Result<DocumentKey, String> {
    let (tenant, document) = raw
        .split_once('/')
        .or_else(|| raw.split_once('#'))
        .ok_or_else(|| format!("expected <tenant>/<document>, got '{}'", raw))?;
    DocumentKey::new(tenant, document).map_err(|e| e.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_accepts_both_separators() {
        let slash = parse_key("acme/survey-1").unwrap();
        let hash = parse_key("acme#survey-1").unwrap();
        assert_eq!(slash, hash);
        assert_eq!(slash.document_id, "survey-1");
    }

    #[test]
    fn test_parse_key_rejects_malformed() {
        assert!(parse_key("acme").is_err());
        assert!(parse_key("acme/a/b").is_err());
        assert!(parse_key("/doc").is_err());
    }

    #[test]
    fn test_cli_parses_show() {
        let cli = Cli::try_parse_from(["surveydoc", "-f", "json", "show", "acme/d1", "--version", "3"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Show(args) => {
                assert_eq!(args.version, Some(3));
                assert_eq!(args.key.tenant_id, "acme");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
