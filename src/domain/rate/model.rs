//! Water rate domain entity

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::ids::deserialize_id;

/// Pricing applied to a reading when a bill is generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Price per cubic meter of consumption
    pub price_per_cubic_meter: Decimal,
    /// Flat charge added to every bill
    #[serde(default)]
    pub fixed_charge: Decimal,
    #[serde(default)]
    pub is_active: bool,
}

/// Amount split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountBreakdown {
    pub consumption: Decimal,
    pub consumption_charge: Decimal,
    pub fixed_charge: Decimal,
    pub total: Decimal,
}

impl Rate {
    /// `consumption × price_per_cubic_meter + fixed_charge`, rounded to cents.
    ///
    /// `None` when the amount does not fit in a `Decimal`.
    pub fn bill_amount(&self, consumption: Decimal) -> Option<Decimal> {
        self.breakdown(consumption).map(|b| b.total)
    }

    pub fn breakdown(&self, consumption: Decimal) -> Option<AmountBreakdown> {
        let consumption = consumption.max(Decimal::ZERO);
        let consumption_charge =
            round_cents(consumption.checked_mul(self.price_per_cubic_meter)?);
        let fixed_charge = round_cents(self.fixed_charge);

        Some(AmountBreakdown {
            consumption,
            consumption_charge,
            fixed_charge,
            total: consumption_charge.checked_add(fixed_charge)?,
        })
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rate() -> Rate {
        Rate {
            id: "1".into(),
            price_per_cubic_meter: Decimal::new(2550, 2), // 25.50 per m³
            fixed_charge: Decimal::new(15000, 2),         // 150.00 flat
            is_active: true,
        }
    }

    #[test]
    fn amount_is_consumption_times_rate_plus_fixed() {
        // 20 m³ * 25.50 = 510.00, + 150.00 = 660.00
        assert_eq!(
            sample_rate().bill_amount(Decimal::new(20, 0)),
            Some(Decimal::new(66000, 2))
        );
    }

    #[test]
    fn zero_consumption_costs_the_fixed_charge() {
        assert_eq!(sample_rate().bill_amount(Decimal::ZERO), Some(Decimal::new(15000, 2)));
    }

    #[test]
    fn fractional_consumption_rounds_half_away_from_zero() {
        let rate = Rate {
            price_per_cubic_meter: Decimal::new(333, 2), // 3.33
            fixed_charge: Decimal::ZERO,
            ..sample_rate()
        };
        // 1.5 * 3.33 = 4.995 -> 5.00
        assert_eq!(rate.bill_amount(Decimal::new(15, 1)), Some(Decimal::new(500, 2)));
    }

    #[test]
    fn breakdown_parts_add_up() {
        let b = sample_rate().breakdown(Decimal::new(3, 0)).unwrap();
        assert_eq!(b.consumption_charge, Decimal::new(7650, 2));
        assert_eq!(b.fixed_charge, Decimal::new(15000, 2));
        assert_eq!(b.total, b.consumption_charge + b.fixed_charge);
    }

    #[test]
    fn overflowing_amount_is_none() {
        let rate = Rate {
            price_per_cubic_meter: Decimal::MAX,
            ..sample_rate()
        };
        assert_eq!(rate.bill_amount(Decimal::new(2, 0)), None);

        let rate = Rate {
            price_per_cubic_meter: Decimal::ONE,
            fixed_charge: Decimal::MAX,
            ..sample_rate()
        };
        assert_eq!(rate.bill_amount(Decimal::ONE), None);
    }
}
