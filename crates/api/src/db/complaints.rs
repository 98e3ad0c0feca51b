//! Complaint repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ration_tds_core::{ComplaintId, ComplaintStatus, ShopId, UserId};

use super::RepositoryError;
use crate::models::complaint::Complaint;

#[derive(sqlx::FromRow)]
struct ComplaintRow {
    id: ComplaintId,
    user_id: UserId,
    shop_id: Option<ShopId>,
    subject: String,
    description: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ComplaintRow> for Complaint {
    type Error = RepositoryError;

    fn try_from(row: ComplaintRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ComplaintStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            shop_id: row.shop_id,
            subject: row.subject,
            description: row.description,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COMPLAINT_COLUMNS: &str =
    "id, user_id, shop_id, subject, description, status, created_at, updated_at";

/// Repository for complaint operations.
pub struct ComplaintRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ComplaintRepository<'a> {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a complaint.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        shop_id: Option<&ShopId>,
        subject: &str,
        description: &str,
    ) -> Result<Complaint, RepositoryError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "INSERT INTO complaints (user_id, shop_id, subject, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(shop_id.map(ShopId::as_str))
        .bind(subject)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// A user's own complaints, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Complaint>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints
             WHERE user_id = $1
             ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Complaint::try_from).collect()
    }

    /// All complaints, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<Complaint>, RepositoryError> {
        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY id DESC"
        ))
        .bind(status.map(|s| s.to_string()))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Complaint::try_from).collect()
    }

    /// Move a complaint through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no complaint has this ID.
    pub async fn set_status(
        &self,
        id: ComplaintId,
        status: ComplaintStatus,
    ) -> Result<Complaint, RepositoryError> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "UPDATE complaints SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("complaint {id}")))?;

        row.try_into()
    }
}
