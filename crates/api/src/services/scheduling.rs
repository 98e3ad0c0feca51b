//! Token scheduling: booking and card-type broadcasts.
//!
//! A broadcast walks a shop's active cardholders of one category in stable
//! id order, assigning each a slot `start + i * interval`. Queue positions
//! restart whenever a slot crosses a day boundary, based on the tokens
//! already issued for the new date.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};

use ration_tds_core::{CardType, ShopId, TokenId, UserId};

use crate::db::{
    NotificationRepository, RepositoryError, TokenRepository, UserRepository,
    notifications::NewNotification, tokens::BroadcastToken,
};
use crate::models::token::Token;
use crate::state::AppState;

/// Default minutes between broadcast slots.
pub const DEFAULT_INTERVAL_MINUTES: i64 = 15;

/// Display slot assigned to bookings that carry none.
pub const DEFAULT_BOOKING_SLOT: &str = "10:00 AM";

/// Booking attempts before giving up on insert collisions.
const BOOKING_RETRIES: usize = 3;

/// Token scheduling service.
pub struct SchedulingService<'a> {
    state: &'a AppState,
}

impl<'a> SchedulingService<'a> {
    /// Create a scheduling service over the shared state.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Book a token for a cardholder at a shop.
    ///
    /// The time slot defaults to [`DEFAULT_BOOKING_SLOT`]. A fresh token id
    /// is minted per attempt, so same-millisecond bookings that collide on
    /// the id (not just the queue position) still succeed on retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a queue position could not be
    /// claimed after retries.
    pub async fn book(
        &self,
        shop_id: &ShopId,
        user_id: UserId,
        date: NaiveDate,
        time_slot: Option<String>,
    ) -> Result<Token, RepositoryError> {
        let slot = time_slot.unwrap_or_else(|| DEFAULT_BOOKING_SLOT.to_owned());
        let tokens = TokenRepository::new(self.state.pool());

        for attempt in 0..BOOKING_RETRIES {
            let id = token_id(Utc::now().timestamp_millis(), attempt);
            if let Some(token) = tokens.try_book(&id, shop_id, user_id, date, &slot).await? {
                return Ok(token);
            }
        }

        Err(RepositoryError::Conflict(format!(
            "could not claim a queue position at shop {shop_id} for {date}"
        )))
    }

    /// Broadcast tokens to every active cardholder of a shop and card
    /// category, and enqueue one notification per created token.
    ///
    /// Insert collisions (duplicate id or position) skip that recipient and
    /// continue; a broadcast never aborts halfway.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for non-collision database failures.
    pub async fn broadcast_by_card_type(
        &self,
        shop_id: &ShopId,
        card_type: CardType,
        interval_minutes: Option<i64>,
        start_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Token>, RepositoryError> {
        let interval = Duration::minutes(interval_minutes.unwrap_or(DEFAULT_INTERVAL_MINUTES));
        let start = broadcast_start(start_at);
        let batch_millis = Utc::now().timestamp_millis();

        let recipients = UserRepository::new(self.state.pool())
            .active_cardholders(shop_id, card_type)
            .await?;

        let tokens = TokenRepository::new(self.state.pool());
        let notifications = NotificationRepository::new(self.state.pool());

        let mut created = Vec::new();
        let mut current_date = start.date_naive();
        let mut base = tokens.count_for_date(shop_id, current_date).await?;
        let mut issued_today: i64 = 0;

        for (i, recipient) in recipients.iter().enumerate() {
            let slot_time = start + interval * i32::try_from(i).unwrap_or(i32::MAX);
            let slot_date = slot_time.date_naive();

            // Positions restart per date: a broadcast spanning midnight
            // counts the new day's existing tokens as its base.
            if slot_date != current_date {
                current_date = slot_date;
                base = tokens.count_for_date(shop_id, slot_date).await?;
                issued_today = 0;
            }

            issued_today += 1;
            let position = i32::try_from(base + issued_today).unwrap_or(i32::MAX);

            let token = BroadcastToken {
                id: token_id(batch_millis, i),
                shop_id: shop_id.clone(),
                user_id: recipient.id,
                token_date: slot_date,
                time_slot: format_slot(slot_time),
                queue_position: position,
            };

            let Some(inserted) = tokens.insert_broadcast(&token).await? else {
                continue;
            };

            notifications
                .create(&NewNotification {
                    shop_id: Some(shop_id.clone()),
                    user_id: Some(recipient.id),
                    notification_type: "token".to_owned(),
                    message: format!(
                        "Your collection token for {} is at {}, queue position {}.",
                        inserted.token_date, inserted.time_slot, inserted.queue_position
                    ),
                })
                .await?;

            created.push(inserted);
        }

        tracing::info!(
            shop_id = %shop_id,
            card_type = %card_type,
            recipients = recipients.len(),
            created = created.len(),
            "card-type broadcast finished"
        );

        Ok(created)
    }
}

/// Resolve the first broadcast slot. The quarter-hour rule applies to
/// caller-supplied starts too, not just the wall-clock default.
fn broadcast_start(start_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    round_up_to_quarter_hour(start_at.unwrap_or_else(Utc::now))
}

/// Round a timestamp up to the next quarter-hour boundary. Timestamps
/// already on a boundary are unchanged.
#[must_use]
pub fn round_up_to_quarter_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let mut result = t
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t);

    // A partial minute always pushes into the next one.
    if result < t {
        result += Duration::minutes(1);
    }

    let rem = i64::from(result.minute()) % 15;
    if rem != 0 {
        result += Duration::minutes(15 - rem);
    }
    result
}

/// Format a timestamp as a 12-hour display slot, e.g. `10:15 AM`.
#[must_use]
pub fn format_slot(t: DateTime<Utc>) -> String {
    let (is_pm, hour) = t.hour12();
    let meridiem = if is_pm { "PM" } else { "AM" };
    format!("{}:{:02} {}", hour, t.minute(), meridiem)
}

/// Generate a broadcast-unique token id from a batch timestamp and a
/// recipient index, e.g. `T17096312345670003`.
fn token_id(batch_millis: i64, index: usize) -> TokenId {
    TokenId::new(format!("T{batch_millis}{index:04}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn rounds_up_to_next_quarter() {
        assert_eq!(round_up_to_quarter_hour(at(10, 1, 0)), at(10, 15, 0));
        assert_eq!(round_up_to_quarter_hour(at(10, 14, 59)), at(10, 15, 0));
        assert_eq!(round_up_to_quarter_hour(at(10, 16, 0)), at(10, 30, 0));
        assert_eq!(round_up_to_quarter_hour(at(10, 59, 1)), at(11, 0, 0));
    }

    #[test]
    fn exact_boundary_is_unchanged() {
        assert_eq!(round_up_to_quarter_hour(at(10, 15, 0)), at(10, 15, 0));
        assert_eq!(round_up_to_quarter_hour(at(10, 0, 0)), at(10, 0, 0));
    }

    #[test]
    fn boundary_with_seconds_rounds_up() {
        assert_eq!(round_up_to_quarter_hour(at(10, 15, 30)), at(10, 30, 0));
    }

    #[test]
    fn formats_twelve_hour_slots() {
        assert_eq!(format_slot(at(10, 15, 0)), "10:15 AM");
        assert_eq!(format_slot(at(0, 5, 0)), "12:05 AM");
        assert_eq!(format_slot(at(12, 0, 0)), "12:00 PM");
        assert_eq!(format_slot(at(23, 45, 0)), "11:45 PM");
    }

    #[test]
    fn supplied_broadcast_start_is_rounded() {
        // An off-boundary start with seconds snaps to the next quarter hour.
        assert_eq!(broadcast_start(Some(at(10, 7, 30))), at(10, 15, 0));
        assert_eq!(broadcast_start(Some(at(10, 15, 0))), at(10, 15, 0));
    }

    #[test]
    fn broadcast_slots_from_rounded_start_stay_on_boundaries() {
        let start = broadcast_start(Some(at(10, 7, 30)));
        let interval = Duration::minutes(DEFAULT_INTERVAL_MINUTES);

        assert_eq!(format_slot(start), "10:15 AM");
        assert_eq!(format_slot(start + interval), "10:30 AM");
        assert_eq!(format_slot(start + interval * 2), "10:45 AM");
    }

    #[test]
    fn token_ids_carry_batch_and_index() {
        let id = token_id(1_709_631_234_567, 3);
        assert_eq!(id.as_str(), "T17096312345670003");
        assert_ne!(token_id(1_709_631_234_567, 4), id);
    }

    #[test]
    fn consecutive_slots_step_by_interval() {
        let start = at(23, 45, 0);
        let interval = Duration::minutes(15);

        let slots: Vec<_> = (0..3).map(|i| start + interval * i).collect();
        assert_eq!(format_slot(slots[0]), "11:45 PM");
        assert_eq!(format_slot(slots[1]), "12:00 AM");
        // The third slot has crossed midnight into the next date.
        assert_eq!(slots[2].date_naive(), at(0, 0, 0).date_naive() + Duration::days(1));
    }
}
