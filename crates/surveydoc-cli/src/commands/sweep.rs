//! Blob sweep command.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use surveydoc_core::config::AppConfig;
use surveydoc_core::error::AppError;
use surveydoc_service::{BlobSweeper, SweepReport};

use super::Backends;
use crate::output::{self, OutputFormat};

/// Arguments for the sweep command
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Tenant whose documents are swept
    pub tenant: String,

    /// Override `worker.sweep_grace_seconds`
    #[arg(long)]
    pub grace_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Tabled)]
struct ReportRow {
    tenant: String,
    scanned: usize,
    deleted: usize,
    failed: usize,
}

/// Sweep one tenant and print the report
pub async fn execute(
    args: &SweepArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let backends = Backends::open(config).await?;
    let grace = args
        .grace_seconds
        .unwrap_or(config.worker.sweep_grace_seconds);
    let sweeper = BlobSweeper::new(Arc::clone(&backends.store), Arc::clone(&backends.blobs), grace);

    let SweepReport {
        scanned,
        deleted,
        failed,
    } = sweeper.sweep_tenant(&args.tenant).await?;

    output::print_list(
        &[ReportRow {
            tenant: args.tenant.clone(),
            scanned,
            deleted,
            failed,
        }],
        format,
    );
    if failed > 0 {
        output::print_warning(&format!("{} blobs could not be deleted", failed));
    }
    Ok(())
}
