//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ration_tds_core::{CardType, Email, Role, ShopId, UserId};

use super::RepositoryError;
use crate::models::user::{UpdateUserInput, User, UserStats};

/// Typed filter for listing users.
///
/// Every field is optional; `None` means "don't filter on this column".
/// The query binds each field as `($n IS NULL OR col = $n)` so there is a
/// single parameterized statement rather than string-built SQL.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub shop_id: Option<ShopId>,
    pub card_type: Option<CardType>,
    pub is_flagged: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: String,
    card_type: Option<String>,
    card_status: Option<String>,
    ration_card_number: Option<String>,
    family_size: Option<i32>,
    shop_id: Option<ShopId>,
    mobile: Option<String>,
    address: Option<String>,
    district: Option<String>,
    pincode: Option<String>,
    is_active: bool,
    is_flagged: bool,
    language: Option<String>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<Role>()
            .map_err(RepositoryError::DataCorruption)?;
        let card_type = row
            .card_type
            .as_deref()
            .map(str::parse::<CardType>)
            .transpose()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role,
            card_type,
            card_status: row.card_status,
            ration_card_number: row.ration_card_number,
            family_size: row.family_size,
            shop_id: row.shop_id,
            mobile: row.mobile,
            address: row.address,
            district: row.district,
            pincode: row.pincode,
            is_active: row.is_active,
            is_flagged: row.is_flagged,
            language: row.language,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, role, card_type, card_status, \
     ration_card_number, family_size, shop_id, mobile, address, district, pincode, \
     is_active, is_flagged, language, last_login, created_at, updated_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored enum or email
    /// fails to parse.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a cardholder at first sign-in, assigned to the default shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_cardholder(
        &self,
        email: &Email,
        name: &str,
        shop_id: &ShopId,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, role, shop_id)
             VALUES ($1, $2, 'cardholder', $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(shop_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Record a successful sign-in, optionally updating the preferred
    /// language the client reported.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_login(
        &self,
        id: UserId,
        language: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE users
             SET last_login = NOW(),
                 language = COALESCE($2, language),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(language)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// List users matching a typed filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ($1::text IS NULL OR role = $1)
               AND ($2::text IS NULL OR shop_id = $2)
               AND ($3::text IS NULL OR card_type = $3)
               AND ($4::boolean IS NULL OR is_flagged = $4)
               AND ($5::boolean IS NULL OR is_active = $5)
             ORDER BY id DESC"
        ))
        .bind(filter.role.map(|r| r.to_string()))
        .bind(filter.shop_id.as_ref().map(ShopId::as_str))
        .bind(filter.card_type.map(|c| c.to_string()))
        .bind(filter.is_flagged)
        .bind(filter.is_active)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Apply an admin profile edit. Fields left `None` keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    pub async fn update_profile(
        &self,
        id: UserId,
        input: &UpdateUserInput,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 card_type = COALESCE($3, card_type),
                 card_status = COALESCE($4, card_status),
                 ration_card_number = COALESCE($5, ration_card_number),
                 family_size = COALESCE($6, family_size),
                 shop_id = COALESCE($7, shop_id),
                 mobile = COALESCE($8, mobile),
                 address = COALESCE($9, address),
                 district = COALESCE($10, district),
                 pincode = COALESCE($11, pincode),
                 is_active = COALESCE($12, is_active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.card_type.map(|c| c.to_string()))
        .bind(input.card_status.as_deref())
        .bind(input.ration_card_number.as_deref())
        .bind(input.family_size)
        .bind(input.shop_id.as_ref().map(ShopId::as_str))
        .bind(input.mobile.as_deref())
        .bind(input.address.as_deref())
        .bind(input.district.as_deref())
        .bind(input.pincode.as_deref())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;

        row.try_into()
    }

    /// Flag or unflag a user for admin review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    pub async fn set_flagged(&self, id: UserId, flagged: bool) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_flagged = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(flagged)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;

        row.try_into()
    }

    /// Activate or deactivate a user. Users are never hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    pub async fn set_active(&self, id: UserId, active: bool) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;

        row.try_into()
    }

    /// Aggregate user counts for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<UserStats, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct StatsRow {
            total_users: i64,
            total_cardholders: i64,
            total_shopkeepers: i64,
            flagged_users: i64,
            inactive_users: i64,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total_users,
                    COUNT(*) FILTER (WHERE role = 'cardholder') AS total_cardholders,
                    COUNT(*) FILTER (WHERE role = 'shopkeeper') AS total_shopkeepers,
                    COUNT(*) FILTER (WHERE is_flagged) AS flagged_users,
                    COUNT(*) FILTER (WHERE NOT is_active) AS inactive_users
             FROM users",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(UserStats {
            total_users: row.total_users,
            total_cardholders: row.total_cardholders,
            total_shopkeepers: row.total_shopkeepers,
            flagged_users: row.flagged_users,
            inactive_users: row.inactive_users,
        })
    }

    /// Active cardholders of one shop and card category, in stable id order.
    ///
    /// Used by broadcast scheduling, which assigns slots by recipient index.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_cardholders(
        &self,
        shop_id: &ShopId,
        card_type: CardType,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE role = 'cardholder'
               AND shop_id = $1
               AND card_type = $2
               AND is_active
             ORDER BY id"
        ))
        .bind(shop_id)
        .bind(card_type.to_string())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }
}
