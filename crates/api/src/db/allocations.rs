//! Monthly allocation repository: lazy entitlement creation, capped
//! distribution with an audit trail, and history queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use ration_tds_core::{
    AllocationId, ItemCode, Period, Role, UserId, entitlement::derive_allocations,
};

use super::RepositoryError;
use crate::models::allocation::{AllocationHistoryEntry, MonthlyAllocation, MonthlyHistoryGroup};

/// How many recent quota changes the history feed returns.
const HISTORY_LIMIT: i64 = 20;

/// Errors from the distribution operation, beyond plain repository failures.
#[derive(Debug, Error)]
pub enum DistributionError {
    /// No allocation row exists for this (user, item, month, year).
    ///
    /// Distribution never fabricates allocations; the accessor must have
    /// been called first.
    #[error("no allocation for user {user_id}, item {item_code} in {period}")]
    AllocationMissing {
        user_id: UserId,
        item_code: ItemCode,
        period: Period,
    },

    /// The requested collected quantity exceeds the eligible cap.
    #[error("collected quantity {requested} exceeds eligible quantity {eligible}")]
    ExceedsEligible {
        requested: Decimal,
        eligible: Decimal,
    },

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for DistributionError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Arguments to [`AllocationRepository::distribute`].
#[derive(Debug, Clone)]
pub struct DistributeRequest {
    pub user_id: UserId,
    pub item_code: ItemCode,
    pub new_collected_quantity: Decimal,
    pub actor_id: UserId,
    pub actor_role: Role,
    pub reason: Option<String>,
    pub period: Period,
}

#[derive(sqlx::FromRow)]
struct AllocationRow {
    id: AllocationId,
    user_id: UserId,
    item_code: ItemCode,
    month: i32,
    year: i32,
    eligible_quantity: Decimal,
    collected_quantity: Decimal,
    collection_date: Option<DateTime<Utc>>,
    last_modified_by: Option<UserId>,
    modification_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AllocationRow> for MonthlyAllocation {
    fn from(row: AllocationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            item_code: row.item_code,
            month: row.month,
            year: row.year,
            eligible_quantity: row.eligible_quantity,
            collected_quantity: row.collected_quantity,
            collection_date: row.collection_date,
            last_modified_by: row.last_modified_by,
            modification_reason: row.modification_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ALLOCATION_COLUMNS: &str = "id, user_id, item_code, month, year, eligible_quantity, \
     collected_quantity, collection_date, last_modified_by, modification_reason, \
     created_at, updated_at";

/// Repository for monthly allocation operations.
pub struct AllocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AllocationRepository<'a> {
    /// Create a new allocation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the user's allocations for a period, lazily creating them from
    /// the entitlement policy on first read.
    ///
    /// Unknown users get an empty set; no allocations are fabricated for
    /// them. Concurrent first-reads race on the insert; the unique key on
    /// (user, item, month, year) plus `ON CONFLICT DO NOTHING` means the
    /// loser just re-reads what the winner created, so the call is
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_for_period(
        &self,
        user_id: UserId,
        period: Period,
    ) -> Result<Vec<MonthlyAllocation>, RepositoryError> {
        let existing = self.list_for_period(user_id, period).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        #[derive(sqlx::FromRow)]
        struct CardRow {
            card_type: Option<String>,
            family_size: Option<i32>,
        }

        let Some(card) =
            sqlx::query_as::<_, CardRow>("SELECT card_type, family_size FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
        else {
            return Ok(Vec::new());
        };

        let Some(card_type) = card
            .card_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(RepositoryError::DataCorruption)?
        else {
            // Staff users carry no card; they have no entitlements.
            return Ok(Vec::new());
        };

        for item in derive_allocations(card_type, card.family_size) {
            sqlx::query(
                "INSERT INTO monthly_allocations
                     (user_id, item_code, month, year, eligible_quantity)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (user_id, item_code, month, year) DO NOTHING",
            )
            .bind(user_id)
            .bind(&item.item_code)
            .bind(period.month)
            .bind(period.year)
            .bind(item.quantity)
            .execute(self.pool)
            .await?;
        }

        self.list_for_period(user_id, period).await
    }

    /// Allocations already materialised for (user, month, year), ordered by
    /// item code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_period(
        &self,
        user_id: UserId,
        period: Period,
    ) -> Result<Vec<MonthlyAllocation>, RepositoryError> {
        let rows = sqlx::query_as::<_, AllocationRow>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM monthly_allocations
             WHERE user_id = $1 AND month = $2 AND year = $3
             ORDER BY item_code"
        ))
        .bind(user_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a distribution: set the collected quantity on an existing
    /// allocation and append a before/after snapshot to the quota change
    /// log, in one
    /// transaction.
    ///
    /// The row is locked for the duration so the cap check and the update
    /// see the same state under concurrency.
    ///
    /// # Errors
    ///
    /// - [`DistributionError::AllocationMissing`] if no row exists for the
    ///   period (this operation never creates allocations).
    /// - [`DistributionError::ExceedsEligible`] if the new collected amount
    ///   is over the eligible cap.
    pub async fn distribute(
        &self,
        req: &DistributeRequest,
    ) -> Result<MonthlyAllocation, DistributionError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, AllocationRow>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM monthly_allocations
             WHERE user_id = $1 AND item_code = $2 AND month = $3 AND year = $4
             FOR UPDATE"
        ))
        .bind(req.user_id)
        .bind(&req.item_code)
        .bind(req.period.month)
        .bind(req.period.year)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DistributionError::AllocationMissing {
            user_id: req.user_id,
            item_code: req.item_code.clone(),
            period: req.period,
        })?;

        if req.new_collected_quantity > current.eligible_quantity {
            return Err(DistributionError::ExceedsEligible {
                requested: req.new_collected_quantity,
                eligible: current.eligible_quantity,
            });
        }

        let updated = sqlx::query_as::<_, AllocationRow>(&format!(
            "UPDATE monthly_allocations
             SET collected_quantity = $2,
                 collection_date = NOW(),
                 last_modified_by = $3,
                 modification_reason = $4,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(current.id)
        .bind(req.new_collected_quantity)
        .bind(req.actor_id)
        .bind(req.reason.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        log_quota_change(
            &mut tx,
            &current,
            req.new_collected_quantity,
            req.actor_id,
            req.actor_role,
            req.reason.as_deref(),
        )
        .await?;

        tx.commit().await?;

        Ok(updated.into())
    }

    /// Correct the collected quantity on an allocation addressed by its row
    /// ID, with the same cap check and change-log append as
    /// [`Self::distribute`].
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` (wrapped) if no allocation has this ID.
    /// - [`DistributionError::ExceedsEligible`] if the corrected amount is
    ///   over the eligible cap.
    pub async fn correct_collected(
        &self,
        id: AllocationId,
        new_collected_quantity: Decimal,
        actor_id: UserId,
        actor_role: Role,
        reason: Option<&str>,
    ) -> Result<MonthlyAllocation, DistributionError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, AllocationRow>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM monthly_allocations
             WHERE id = $1
             FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            DistributionError::Repository(RepositoryError::NotFound(format!("allocation {id}")))
        })?;

        if new_collected_quantity > current.eligible_quantity {
            return Err(DistributionError::ExceedsEligible {
                requested: new_collected_quantity,
                eligible: current.eligible_quantity,
            });
        }

        let updated = sqlx::query_as::<_, AllocationRow>(&format!(
            "UPDATE monthly_allocations
             SET collected_quantity = $2,
                 collection_date = NOW(),
                 last_modified_by = $3,
                 modification_reason = $4,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(current.id)
        .bind(new_collected_quantity)
        .bind(actor_id)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        log_quota_change(
            &mut tx,
            &current,
            new_collected_quantity,
            actor_id,
            actor_role,
            reason,
        )
        .await?;

        tx.commit().await?;

        Ok(updated.into())
    }

    /// The most recent quota changes for a user, joined with the acting
    /// user's display name. Capped at 20 entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_changes(
        &self,
        user_id: UserId,
    ) -> Result<Vec<AllocationHistoryEntry>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct ChangeRow {
            allocation_id: AllocationId,
            user_id: UserId,
            item_code: ItemCode,
            month: i32,
            year: i32,
            old_quantity: Decimal,
            new_quantity: Decimal,
            change_amount: Decimal,
            changed_by: UserId,
            changed_by_name: String,
            reason: Option<String>,
            created_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, ChangeRow>(
            "SELECT q.allocation_id, q.user_id, q.item_code, q.month, q.year,
                    q.old_quantity, q.new_quantity, q.change_amount,
                    q.changed_by, u.name AS changed_by_name, q.reason, q.created_at
             FROM quota_change_log q
             JOIN users u ON u.id = q.changed_by
             WHERE q.user_id = $1
             ORDER BY q.id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AllocationHistoryEntry {
                allocation_id: r.allocation_id,
                user_id: r.user_id,
                item_code: r.item_code,
                month: r.month,
                year: r.year,
                old_quantity: r.old_quantity,
                new_quantity: r.new_quantity,
                change_amount: r.change_amount,
                changed_by: r.changed_by,
                changed_by_name: r.changed_by_name,
                reason: r.reason,
                created_at: r.created_at,
            })
            .collect())
    }

    /// Allocation rows for the user's last `months` calendar months,
    /// grouped by month, newest month first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_history(
        &self,
        user_id: UserId,
        months: i32,
    ) -> Result<Vec<MonthlyHistoryGroup>, RepositoryError> {
        let rows = sqlx::query_as::<_, AllocationRow>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM monthly_allocations
             WHERE user_id = $1
               AND (year * 12 + month) > (
                   SELECT EXTRACT(YEAR FROM NOW())::int * 12
                        + EXTRACT(MONTH FROM NOW())::int - $2
               )
             ORDER BY year DESC, month DESC, item_code"
        ))
        .bind(user_id)
        .bind(months)
        .fetch_all(self.pool)
        .await?;

        let mut groups: Vec<MonthlyHistoryGroup> = Vec::new();
        for row in rows {
            let allocation: MonthlyAllocation = row.into();
            match groups.last_mut() {
                Some(group)
                    if group.month == allocation.month && group.year == allocation.year =>
                {
                    group.allocations.push(allocation);
                }
                _ => groups.push(MonthlyHistoryGroup {
                    month: allocation.month,
                    year: allocation.year,
                    allocations: vec![allocation],
                }),
            }
        }

        Ok(groups)
    }

    /// Admin override: set (or create) the eligible quantity for one item,
    /// preserving any collected amount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set_eligible(
        &self,
        user_id: UserId,
        item_code: &ItemCode,
        period: Period,
        quantity: Decimal,
        actor_id: UserId,
    ) -> Result<MonthlyAllocation, RepositoryError> {
        let row = sqlx::query_as::<_, AllocationRow>(&format!(
            "INSERT INTO monthly_allocations
                 (user_id, item_code, month, year, eligible_quantity, last_modified_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id, item_code, month, year)
             DO UPDATE SET eligible_quantity = EXCLUDED.eligible_quantity,
                           last_modified_by = EXCLUDED.last_modified_by,
                           updated_at = NOW()
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(item_code)
        .bind(period.month)
        .bind(period.year)
        .bind(quantity)
        .bind(actor_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}

/// Append one quota change to the log, snapshotting the old and new
/// collected quantities alongside the signed change amount.
async fn log_quota_change(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    before: &AllocationRow,
    new_collected_quantity: Decimal,
    actor_id: UserId,
    actor_role: Role,
    reason: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quota_change_log
             (allocation_id, user_id, item_code, month, year,
              old_quantity, new_quantity, change_amount,
              changed_by, actor_role, reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(before.id)
    .bind(before.user_id)
    .bind(&before.item_code)
    .bind(before.month)
    .bind(before.year)
    .bind(before.collected_quantity)
    .bind(new_collected_quantity)
    .bind(new_collected_quantity - before.collected_quantity)
    .bind(actor_id)
    .bind(actor_role.to_string())
    .bind(reason)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
