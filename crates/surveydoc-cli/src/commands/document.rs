//! Document inspection commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use surveydoc_core::config::AppConfig;
use surveydoc_core::error::AppError;
use surveydoc_entity::document::{DocumentKey, DocumentVersion};
use surveydoc_service::RequestContext;

use super::Backends;
use crate::output::{self, OutputFormat};

/// Arguments for the history command
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Document key, `<tenant>/<document>`
    #[arg(value_parser = super::parse_key)]
    pub key: DocumentKey,
}

/// Arguments for the show command
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document key, `<tenant>/<document>`
    #[arg(value_parser = super::parse_key)]
    pub key: DocumentKey,

    /// Version to show instead of the current one
    #[arg(long)]
    pub version: Option<i64>,
}

#[derive(Debug, Serialize, Tabled)]
struct VersionRow {
    version: i64,
    author: String,
    created: String,
    change: String,
    bytes: i64,
    path: String,
}

impl From<&DocumentVersion> for VersionRow {
    fn from(v: &DocumentVersion) -> Self {
        Self {
            version: v.version,
            author: v.author.clone(),
            created: v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            change: v.change_type.clone(),
            bytes: v.file_size,
            path: v.path.clone(),
        }
    }
}

/// List retained versions, newest first
pub async fn history(
    args: &HistoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let backends = Backends::open(config).await?;
    let service = backends.document_service(config);
    let versions = service
        .list_versions(&RequestContext::system(), &args.key)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&versions),
        OutputFormat::Table => {
            let rows: Vec<VersionRow> = versions.iter().map(VersionRow::from).collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

/// Print metadata and content of one version
pub async fn show(args: &ShowArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let backends = Backends::open(config).await?;
    let service = backends.document_service(config);
    let ctx = RequestContext::system();

    let metadata = service.get_document(&ctx, &args.key).await?;
    let content = service.read_content(&ctx, &args.key, args.version).await?;
    let text = String::from_utf8_lossy(&content.data);

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "document": metadata,
            "version": content.version,
            "fileType": content.file_type,
            "content": text,
        })),
        OutputFormat::Table => {
            output::print_fields(&[
                ("Document", metadata.document_key.to_string()),
                ("File name", content.file_name.clone()),
                ("File type", content.file_type.clone()),
                ("Owner", metadata.owner.clone()),
                (
                    "Version",
                    format!("{} of {}", content.version, metadata.current_version),
                ),
                ("Updated", metadata.updated_at.to_rfc3339()),
                ("Bytes", content.data.len().to_string()),
            ]);
            println!();
            println!("{}", text);
        }
    }
    Ok(())
}
