//! Queue token repository.
//!
//! Queue positions are 1-based per (shop, date). Assignment is a single
//! `INSERT ... SELECT COUNT(*) + 1` statement guarded by a unique index on
//! (shop_id, token_date, queue_position); concurrent bookings that land on
//! the same position fail the index, and the scheduler retries with a fresh
//! id, so positions stay gap-free.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use ration_tds_core::{ShopId, TokenId, TokenStatus, UserId};

use super::RepositoryError;
use crate::models::token::Token;

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: TokenId,
    shop_id: ShopId,
    user_id: UserId,
    token_date: NaiveDate,
    time_slot: String,
    queue_position: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for Token {
    type Error = RepositoryError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TokenStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            shop_id: row.shop_id,
            user_id: row.user_id,
            token_date: row.token_date,
            time_slot: row.time_slot,
            queue_position: row.queue_position,
            status,
            created_at: row.created_at,
        })
    }
}

const TOKEN_COLUMNS: &str =
    "id, shop_id, user_id, token_date, time_slot, queue_position, status, created_at";

/// A broadcast-assigned token ready for insertion, with its position
/// precomputed by the scheduler.
#[derive(Debug, Clone)]
pub struct BroadcastToken {
    pub id: TokenId,
    pub shop_id: ShopId,
    pub user_id: UserId,
    pub token_date: NaiveDate,
    pub time_slot: String,
    pub queue_position: i32,
}

/// Repository for queue token operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attempt to book a token: position = count of existing same-shop-
    /// same-date tokens + 1, assigned atomically.
    ///
    /// Returns `None` on a unique violation (lost the position race, or a
    /// duplicate id) so the scheduler can retry with a freshly minted id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` for non-collision failures.
    pub async fn try_book(
        &self,
        id: &TokenId,
        shop_id: &ShopId,
        user_id: UserId,
        date: NaiveDate,
        time_slot: &str,
    ) -> Result<Option<Token>, RepositoryError> {
        let result = sqlx::query_as::<_, TokenRow>(&format!(
            "INSERT INTO tokens
                 (id, shop_id, user_id, token_date, time_slot, queue_position, status)
             SELECT $1, $2, $3, $4, $5,
                    (SELECT COUNT(*) + 1 FROM tokens
                     WHERE shop_id = $2 AND token_date = $4)::int,
                    'active'
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(id)
        .bind(shop_id)
        .bind(user_id)
        .bind(date)
        .bind(time_slot)
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(row.try_into()?)),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    /// Insert a broadcast-assigned token, swallowing id and position
    /// collisions so the broadcast loop continues to the next recipient.
    ///
    /// Returns `None` when the insert was skipped due to a collision.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` for non-collision failures.
    pub async fn insert_broadcast(
        &self,
        token: &BroadcastToken,
    ) -> Result<Option<Token>, RepositoryError> {
        let result = sqlx::query_as::<_, TokenRow>(&format!(
            "INSERT INTO tokens
                 (id, shop_id, user_id, token_date, time_slot, queue_position, status)
             VALUES ($1, $2, $3, $4, $5, $6, 'pending')
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(&token.id)
        .bind(&token.shop_id)
        .bind(token.user_id)
        .bind(token.token_date)
        .bind(&token.time_slot)
        .bind(token.queue_position)
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(row.try_into()?)),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    token_id = %token.id,
                    user_id = %token.user_id,
                    "skipping broadcast token on collision"
                );
                Ok(None)
            }
            Err(e) => Err(RepositoryError::Database(e)),
        }
    }

    /// Tokens already issued for a shop and date. Used by the scheduler to
    /// base positions on.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_date(
        &self,
        shop_id: &ShopId,
        date: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tokens WHERE shop_id = $1 AND token_date = $2",
        )
        .bind(shop_id)
        .bind(date)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// The user's token for a given date, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_user(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<Token>, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE user_id = $1 AND token_date = $2
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        row.map(Token::try_from).transpose()
    }

    /// A shop's queue for one date, in position order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_shop(
        &self,
        shop_id: &ShopId,
        date: NaiveDate,
    ) -> Result<Vec<Token>, RepositoryError> {
        let rows = sqlx::query_as::<_, TokenRow>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE shop_id = $1 AND token_date = $2
             ORDER BY queue_position"
        ))
        .bind(shop_id)
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Token::try_from).collect()
    }

    /// Move a token through its lifecycle (serve, cancel, ...).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no token has this ID.
    pub async fn set_status(
        &self,
        id: &TokenId,
        status: TokenStatus,
    ) -> Result<Token, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>(&format!(
            "UPDATE tokens SET status = $2 WHERE id = $1 RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("token {id}")))?;

        row.try_into()
    }
}
