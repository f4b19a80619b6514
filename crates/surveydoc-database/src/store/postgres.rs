//! PostgreSQL document store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_core::result::AppResult;
use surveydoc_entity::document::{
    DocumentKey, DocumentMetadata, DocumentVersion, RecordType, SortKey,
};

use super::{DocumentStore, VersionCommit};

/// Row of the `documents` table.
#[derive(Debug, FromRow)]
struct DocumentRow {
    tenant_id: String,
    document_id: String,
    current_version: i64,
    last_modified: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    file_type: String,
    file_name: String,
    size: i64,
    editors: Vec<String>,
    viewers: Vec<String>,
    owner: String,
}

impl From<DocumentRow> for DocumentMetadata {
    fn from(row: DocumentRow) -> Self {
        Self {
            document_key: DocumentKey {
                tenant_id: row.tenant_id.clone(),
                document_id: row.document_id,
            },
            sort_key: SortKey::Latest,
            record_type: RecordType::Document,
            tenant_id: row.tenant_id,
            current_version: row.current_version,
            last_modified: row.last_modified,
            updated_at: row.updated_at,
            created_at: row.created_at,
            file_type: row.file_type,
            file_name: row.file_name,
            size: row.size,
            editors: row.editors,
            viewers: row.viewers,
            owner: row.owner,
        }
    }
}

/// Row of the `document_versions` table.
#[derive(Debug, FromRow)]
struct VersionRow {
    tenant_id: String,
    document_id: String,
    version: i64,
    author: String,
    created_at: DateTime<Utc>,
    change_type: String,
    path: String,
    file_size: i64,
    file_type: String,
    file_name: String,
}

impl From<VersionRow> for DocumentVersion {
    fn from(row: VersionRow) -> Self {
        Self {
            document_key: DocumentKey {
                tenant_id: row.tenant_id,
                document_id: row.document_id,
            },
            sort_key: SortKey::Version(row.version),
            record_type: RecordType::Version,
            version: row.version,
            author: row.author,
            created_at: row.created_at,
            change_type: row.change_type,
            path: row.path,
            file_size: row.file_size,
            file_type: row.file_type,
            file_name: row.file_name,
        }
    }
}

/// Document store backed by PostgreSQL.
///
/// The conditional metadata update locks the metadata row with
/// `SELECT ... FOR UPDATE`, so concurrent commits on one document are
/// serialized and all but one observe a moved version.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

async fn insert_version(
    conn: &mut sqlx::PgConnection,
    version: &DocumentVersion,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO document_versions \
         (tenant_id, document_id, version, author, created_at, change_type, path, file_size, file_type, file_name) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&version.document_key.tenant_id)
    .bind(&version.document_key.document_id)
    .bind(version.version)
    .bind(&version.author)
    .bind(version.created_at)
    .bind(&version.change_type)
    .bind(&version.path)
    .bind(version.file_size)
    .bind(&version.file_type)
    .bind(&version.file_name)
    .execute(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::conflict(
            format!("Version {} of {} already exists", version.version, version.document_key),
        ),
        _ => AppError::with_source(ErrorKind::Database, "Failed to insert version record", e),
    })?;
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(db_error("Health check failed"))
    }

    async fn get_latest(&self, key: &DocumentKey) -> AppResult<Option<DocumentMetadata>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE tenant_id = $1 AND document_id = $2",
        )
        .bind(&key.tenant_id)
        .bind(&key.document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to read document metadata"))?;
        Ok(row.map(Into::into))
    }

    async fn list_versions(&self, key: &DocumentKey) -> AppResult<Vec<DocumentVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT * FROM document_versions WHERE tenant_id = $1 AND document_id = $2 \
             ORDER BY version ASC",
        )
        .bind(&key.tenant_id)
        .bind(&key.document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list document versions"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_version(
        &self,
        key: &DocumentKey,
        version: i64,
    ) -> AppResult<Option<DocumentVersion>> {
        let row = sqlx::query_as::<_, VersionRow>(
            "SELECT * FROM document_versions \
             WHERE tenant_id = $1 AND document_id = $2 AND version = $3",
        )
        .bind(&key.tenant_id)
        .bind(&key.document_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to read document version"))?;
        Ok(row.map(Into::into))
    }

    async fn list_documents(&self, tenant_id: &str) -> AppResult<Vec<DocumentKey>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT document_id FROM documents WHERE tenant_id = $1 ORDER BY document_id ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list documents"))?;

        Ok(ids
            .into_iter()
            .map(|document_id| DocumentKey {
                tenant_id: tenant_id.to_string(),
                document_id,
            })
            .collect())
    }

    async fn create_document(
        &self,
        metadata: &DocumentMetadata,
        initial: Option<&DocumentVersion>,
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        sqlx::query(
            "INSERT INTO documents \
             (tenant_id, document_id, current_version, last_modified, updated_at, created_at, \
              file_type, file_name, size, editors, viewers, owner) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&metadata.document_key.tenant_id)
        .bind(&metadata.document_key.document_id)
        .bind(metadata.current_version)
        .bind(metadata.last_modified)
        .bind(metadata.updated_at)
        .bind(metadata.created_at)
        .bind(&metadata.file_type)
        .bind(&metadata.file_name)
        .bind(metadata.size)
        .bind(&metadata.editors)
        .bind(&metadata.viewers)
        .bind(&metadata.owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("Document {} already exists", metadata.document_key))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create document", e),
        })?;

        if let Some(version) = initial {
            insert_version(&mut tx, version).await?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit document creation"))?;
        Ok(())
    }

    async fn commit_version(&self, commit: &VersionCommit) -> AppResult<()> {
        let key = &commit.key;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let current: Option<i64> = sqlx::query_scalar(
            "SELECT current_version FROM documents \
             WHERE tenant_id = $1 AND document_id = $2 FOR UPDATE",
        )
        .bind(&key.tenant_id)
        .bind(&key.document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock document metadata"))?;

        match current {
            None => return Err(AppError::not_found(format!("Document {key} not found"))),
            Some(actual) if actual != commit.expected_version => {
                return Err(AppError::conflict(format!(
                    "Document {key} is at version {actual}, expected {}",
                    commit.expected_version
                )));
            }
            Some(_) => {}
        }

        sqlx::query(
            "UPDATE documents SET current_version = $3, last_modified = $4, updated_at = $4, \
             size = $5 WHERE tenant_id = $1 AND document_id = $2",
        )
        .bind(&key.tenant_id)
        .bind(&key.document_id)
        .bind(commit.version.version)
        .bind(commit.committed_at)
        .bind(commit.version.file_size)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to advance document version"))?;

        insert_version(&mut tx, &commit.version).await?;

        if !commit.prune.is_empty() {
            sqlx::query(
                "DELETE FROM document_versions \
                 WHERE tenant_id = $1 AND document_id = $2 AND version = ANY($3)",
            )
            .bind(&key.tenant_id)
            .bind(&key.document_id)
            .bind(&commit.prune)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to prune version records"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit version transaction"))?;

        debug!(
            document = %key,
            version = commit.version.version,
            pruned = commit.prune.len(),
            "Committed version"
        );
        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE tenant_id = $1 AND document_id = $2")
            .bind(&key.tenant_id)
            .bind(&key.document_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete document"))?;
        Ok(result.rows_affected() > 0)
    }
}
