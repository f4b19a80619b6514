//! Periodic sweep of unreferenced content blobs.

use std::sync::Arc;

use surveydoc_service::{BlobSweeper, SweepReport};

/// Sweeps every configured tenant in turn.
#[derive(Debug, Clone)]
pub struct BlobSweepJob {
    /// Sweeper over the shared stores
    sweeper: Arc<BlobSweeper>,
    /// Tenants to sweep
    tenants: Vec<String>,
}

impl BlobSweepJob {
    /// Create a new sweep job
    pub fn new(sweeper: Arc<BlobSweeper>, tenants: Vec<String>) -> Self {
        Self { sweeper, tenants }
    }

    /// Run one sweep across all tenants. A failing tenant is logged and
    /// skipped.
    pub async fn run(&self) -> SweepReport {
        tracing::info!(tenants = self.tenants.len(), "Running blob sweep");

        let mut total = SweepReport::default();
        for tenant in &self.tenants {
            match self.sweeper.sweep_tenant(tenant).await {
                Ok(report) => {
                    total.scanned += report.scanned;
                    total.deleted += report.deleted;
                    total.failed += report.failed;
                }
                Err(e) => tracing::error!(tenant = %tenant, "Blob sweep failed: {}", e),
            }
        }

        tracing::info!(
            scanned = total.scanned,
            deleted = total.deleted,
            failed = total.failed,
            "Blob sweep complete"
        );
        total
    }
}
