//! Body composition decomposition from body-fat percentage and total weight.
//!
//! Fat mass is rounded once; fat-free mass is derived by subtraction from the
//! unrounded weight, so the two halves always sum back to the weight exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::metrics::round_to;
use crate::models::BodyComposition;

/// Split total weight into fat mass and fat-free mass.
///
/// Formula:
/// ```text
/// fat_mass = round(weight × BF% / 100, 1)
/// fat_free_mass = weight - fat_mass
/// ```
pub fn decompose(weight_kg: Decimal, body_fat_pct: Decimal) -> BodyComposition {
    let fat_mass = round_to(weight_kg * body_fat_pct / dec!(100), 1);

    BodyComposition {
        fat_mass,
        fat_free_mass: weight_kg - fat_mass,
    }
}

/// [`decompose`] when body-fat percentage may be unavailable
pub fn decompose_opt(weight_kg: Decimal, body_fat_pct: Option<Decimal>) -> Option<BodyComposition> {
    body_fat_pct.map(|pct| decompose(weight_kg, pct))
}

impl BodyComposition {
    pub fn total(&self) -> Decimal {
        self.fat_mass + self.fat_free_mass
    }

    /// Fat and fat-free shares of total weight in percent, 1 decimal each.
    ///
    /// The fat-free share is the complement of the rounded fat share so the
    /// pair always adds up to 100.
    pub fn shares(&self) -> (Decimal, Decimal) {
        let total = self.total();
        if total.is_zero() {
            return (Decimal::ZERO, Decimal::ZERO);
        }

        let fat_share = round_to(self.fat_mass / total * dec!(100), 1);
        (fat_share, dec!(100) - fat_share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose() {
        let composition = decompose(dec!(80), dec!(20));
        assert_eq!(composition.fat_mass, dec!(16.0));
        assert_eq!(composition.fat_free_mass, dec!(64.0));
    }

    #[test]
    fn test_decompose_sums_to_weight() {
        // 73.45 × 17.3% = 12.70685 → 12.7, remainder carries the extra precision
        let composition = decompose(dec!(73.45), dec!(17.3));
        assert_eq!(composition.fat_mass, dec!(12.7));
        assert_eq!(composition.fat_free_mass, dec!(60.75));
        assert_eq!(composition.total(), dec!(73.45));
    }

    #[test]
    fn test_decompose_opt_absent() {
        assert!(decompose_opt(dec!(80), None).is_none());
        assert!(decompose_opt(dec!(80), Some(dec!(11.2))).is_some());
    }

    #[test]
    fn test_shares() {
        let composition = decompose(dec!(80), dec!(11.2));
        let (fat, lean) = composition.shares();

        // fat mass 9.0 of 80 kg: 11.25 ties to 11.2
        assert_eq!(fat, dec!(11.2));
        assert_eq!(fat + lean, dec!(100));
    }
}
