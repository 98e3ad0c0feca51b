//! Monthly entitlement policy.
//!
//! Pure derivation of a cardholder's eligible quantities from their card
//! category and family size. No I/O; the allocation accessor in the API crate
//! materialises the result into `monthly_allocations` rows.
//!
//! Quantities are in kilograms. Percentage splits round **up** (ceiling), so
//! rounding never under-allocates a household.

use rust_decimal::Decimal;

use crate::types::{CardType, ItemCode};

/// Family size assumed when a user record carries none.
pub const DEFAULT_FAMILY_SIZE: i32 = 4;

/// One derived entitlement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuantity {
    /// Stock item this line entitles the holder to.
    pub item_code: ItemCode,
    /// Eligible quantity in kilograms.
    pub quantity: Decimal,
}

impl ItemQuantity {
    fn new(code: &str, quantity: Decimal) -> Self {
        Self {
            item_code: ItemCode::new(code),
            quantity,
        }
    }
}

/// Derive the monthly entitlement for a card category and family size.
///
/// Lines whose computed quantity is zero or negative are filtered out and
/// never materialised as allocation rows (this includes the AAY wheat line,
/// which the policy nominally carries at 0 kg).
///
/// A missing or non-positive family size falls back to
/// [`DEFAULT_FAMILY_SIZE`].
#[must_use]
pub fn derive_allocations(card_type: CardType, family_size: Option<i32>) -> Vec<ItemQuantity> {
    let family = match family_size {
        Some(n) if n >= 1 => n,
        _ => DEFAULT_FAMILY_SIZE,
    };

    let items = match card_type {
        // Antyodaya households get a flat ration regardless of family size.
        CardType::AAY => vec![
            ItemQuantity::new("rice", Decimal::from(35)),
            ItemQuantity::new("wheat", Decimal::ZERO),
            ItemQuantity::new("sugar", Decimal::from(5)),
        ],
        CardType::PHH => {
            let total = Decimal::from(family * 5);
            vec![
                ItemQuantity::new("rice", ceil_share(total, 6)),
                ItemQuantity::new("wheat", ceil_share(total, 4)),
                ItemQuantity::new("sugar", Decimal::from(family.min(5))),
            ]
        }
        CardType::BPL => {
            let total = Decimal::from(family * 5);
            vec![
                ItemQuantity::new("rice", ceil_share(total, 7)),
                ItemQuantity::new("wheat", ceil_share(total, 3)),
            ]
        }
        CardType::APL => {
            let total = Decimal::from(family * 3);
            vec![
                ItemQuantity::new("rice", ceil_share(total, 6)),
                ItemQuantity::new("wheat", ceil_share(total, 4)),
                ItemQuantity::new("sugar", Decimal::from(2)),
            ]
        }
    };

    items
        .into_iter()
        .filter(|item| item.quantity > Decimal::ZERO)
        .collect()
}

/// Ceiling of `total * tenths/10`.
fn ceil_share(total: Decimal, tenths: u32) -> Decimal {
    (total * Decimal::new(i64::from(tenths), 1)).ceil()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quantity_of(items: &[ItemQuantity], code: &str) -> Option<Decimal> {
        items
            .iter()
            .find(|i| i.item_code.as_str() == code)
            .map(|i| i.quantity)
    }

    #[test]
    fn aay_is_flat_and_drops_zero_wheat() {
        for family in [Some(1), Some(4), Some(12), None] {
            let items = derive_allocations(CardType::AAY, family);
            assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(35)));
            assert_eq!(quantity_of(&items, "sugar"), Some(Decimal::from(5)));
            // The nominal wheat:0 line is filtered, never materialised.
            assert_eq!(quantity_of(&items, "wheat"), None);
            assert_eq!(items.len(), 2);
        }
    }

    #[test]
    fn phh_family_of_four() {
        // total = 20; rice = ceil(12) = 12, wheat = ceil(8) = 8, sugar = min(4, 5) = 4
        let items = derive_allocations(CardType::PHH, Some(4));
        assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(12)));
        assert_eq!(quantity_of(&items, "wheat"), Some(Decimal::from(8)));
        assert_eq!(quantity_of(&items, "sugar"), Some(Decimal::from(4)));
    }

    #[test]
    fn phh_sugar_caps_at_five() {
        let items = derive_allocations(CardType::PHH, Some(9));
        assert_eq!(quantity_of(&items, "sugar"), Some(Decimal::from(5)));
    }

    #[test]
    fn phh_rounds_splits_up() {
        // family 3: total = 15; 15*0.6 = 9 exact, 15*0.4 = 6 exact
        let items = derive_allocations(CardType::PHH, Some(3));
        assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(9)));
        assert_eq!(quantity_of(&items, "wheat"), Some(Decimal::from(6)));

        // family 1: total = 5; 5*0.6 = 3 exact, 5*0.4 = 2 exact
        // family 7: total = 35; 35*0.6 = 21, 35*0.4 = 14
        let items = derive_allocations(CardType::BPL, Some(1));
        // 5*0.7 = 3.5 -> 4; 5*0.3 = 1.5 -> 2
        assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(4)));
        assert_eq!(quantity_of(&items, "wheat"), Some(Decimal::from(2)));
    }

    #[test]
    fn bpl_has_no_sugar_line() {
        let items = derive_allocations(CardType::BPL, Some(4));
        // total = 20; rice = ceil(14) = 14, wheat = ceil(6) = 6
        assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(14)));
        assert_eq!(quantity_of(&items, "wheat"), Some(Decimal::from(6)));
        assert_eq!(quantity_of(&items, "sugar"), None);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn apl_three_kg_per_member() {
        // family 4: total = 12; rice = ceil(7.2) = 8, wheat = ceil(4.8) = 5
        let items = derive_allocations(CardType::APL, Some(4));
        assert_eq!(quantity_of(&items, "rice"), Some(Decimal::from(8)));
        assert_eq!(quantity_of(&items, "wheat"), Some(Decimal::from(5)));
        assert_eq!(quantity_of(&items, "sugar"), Some(Decimal::from(2)));
    }

    #[test]
    fn missing_family_size_defaults_to_four() {
        assert_eq!(
            derive_allocations(CardType::PHH, None),
            derive_allocations(CardType::PHH, Some(DEFAULT_FAMILY_SIZE))
        );
        assert_eq!(
            derive_allocations(CardType::APL, Some(0)),
            derive_allocations(CardType::APL, Some(DEFAULT_FAMILY_SIZE))
        );
    }

    #[test]
    fn quantities_are_non_negative_integers() {
        for card_type in CardType::ALL {
            for family in 1..=15 {
                for item in derive_allocations(card_type, Some(family)) {
                    assert!(item.quantity > Decimal::ZERO);
                    assert_eq!(item.quantity, item.quantity.trunc(), "{card_type} {family}");
                }
            }
        }
    }
}
