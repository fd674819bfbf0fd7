//! Derived anthropometric indices
//!
//! Pure functions over a validated [`MeasurementInput`]. Ratios, BMI and BRI
//! are rounded to 2 decimals; body-fat percentage and masses to 1 decimal.
//! The validator's domains exclude every zero denominator, so [`compute`] is
//! total over validated input.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::f64::consts::PI;

use crate::body_composition;
use crate::error::IncompleteDataError;
use crate::models::{DerivedMetrics, Gender, MeasurementInput, SkinfoldProtocol, Skinfolds};

/// Published Body Roundness Index constants (Thomas et al., 2013)
mod bri {
    pub const OFFSET: f64 = 364.2;
    pub const SCALE: f64 = 365.5;
}

/// Siri two-compartment model: %BF = 495 / density - 450
mod siri {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub const NUMERATOR: Decimal = dec!(495);
    pub const OFFSET: Decimal = dec!(450);
}

/// Round to `dp` decimal places, exact ties to the even digit
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

fn height_m_squared(height_cm: Decimal) -> Decimal {
    let height_m = height_cm / dec!(100);
    height_m * height_m
}

/// Body mass index in kg/m²
pub fn calculate_bmi(weight_kg: Decimal, height_cm: Decimal) -> Decimal {
    round_to(weight_kg / height_m_squared(height_cm), 2)
}

pub fn calculate_waist_hip_ratio(waist_cm: Decimal, hip_cm: Decimal) -> Decimal {
    round_to(waist_cm / hip_cm, 2)
}

pub fn calculate_waist_height_ratio(waist_cm: Decimal, height_cm: Decimal) -> Decimal {
    round_to(waist_cm / height_cm, 2)
}

/// Body Roundness Index from waist circumference and height.
///
/// Models the body as an ellipse whose semi-major axis is half the height
/// and whose semi-minor axis is the waist radius:
/// ```text
/// BRI = 364.2 - 365.5 × sqrt(1 - (WC / 2π)² / (0.5 × H)²)
/// ```
/// Both lengths share a unit, so the eccentricity term is dimensionless.
/// Extremely slender bodies can push the raw equation slightly below zero;
/// the result is floored at 0.
pub fn calculate_body_roundness_index(waist_cm: Decimal, height_cm: Decimal) -> Decimal {
    let waist = waist_cm.to_f64().unwrap_or_default();
    let height = height_cm.to_f64().unwrap_or_default();

    let waist_radius = waist / (2.0 * PI);
    let semi_axis = 0.5 * height;
    let eccentricity_term = (1.0 - (waist_radius * waist_radius) / (semi_axis * semi_axis)).max(0.0);

    let bri = bri::OFFSET - bri::SCALE * eccentricity_term.sqrt();

    // finite for every in-domain waist/height pair
    let bri = Decimal::from_f64(bri).unwrap_or_default();
    round_to(bri.max(Decimal::ZERO), 2)
}

/// Body density from a Jackson-Pollock 3-site skinfold sum
pub fn calculate_body_density(protocol: SkinfoldProtocol, skinfold_sum: Decimal, age: u32) -> Decimal {
    let c = protocol.coefficients();
    c.intercept - c.linear * skinfold_sum + c.quadratic * skinfold_sum * skinfold_sum
        - c.age_factor * Decimal::from(age)
}

/// Siri equation: body-fat percentage from body density
pub fn siri_body_fat(density: Decimal) -> Decimal {
    siri::NUMERATOR / density - siri::OFFSET
}

/// Jackson-Pollock 3-site body-fat percentage, 1 decimal.
///
/// The gender selects both the required sites and the regression. Absent
/// (never zero, never estimated from other sites) when any of the three is
/// missing.
pub fn calculate_body_fat_percentage(
    gender: Gender,
    age: u32,
    skinfolds: &Skinfolds,
) -> Result<Decimal, IncompleteDataError> {
    let protocol = gender.skinfold_protocol();
    let [a, b, c] = protocol.triplet(skinfolds)?;

    let density = calculate_body_density(protocol, a + b + c, age);
    Ok(round_to(siri_body_fat(density).max(Decimal::ZERO), 1))
}

/// Fat-free mass index in kg/m²
pub fn calculate_fat_free_mass_index(fat_free_mass_kg: Decimal, height_cm: Decimal) -> Decimal {
    round_to(fat_free_mass_kg / height_m_squared(height_cm), 2)
}

/// Compute every derived index for a validated record.
///
/// Skinfold-dependent metrics are absent together when the gender's triplet
/// is incomplete; the reason is returned alongside.
pub fn compute(input: &MeasurementInput) -> (DerivedMetrics, Option<IncompleteDataError>) {
    let body_fat = calculate_body_fat_percentage(input.gender, input.age, &input.skinfolds);

    let (body_fat_percentage, incomplete) = match body_fat {
        Ok(pct) => (Some(pct), None),
        Err(err) => (None, Some(err)),
    };

    let composition = body_composition::decompose_opt(input.weight, body_fat_percentage);
    let fat_free_mass_index = composition
        .map(|c| calculate_fat_free_mass_index(c.fat_free_mass, input.height));

    let metrics = DerivedMetrics {
        bmi: calculate_bmi(input.weight, input.height),
        waist_hip_ratio: calculate_waist_hip_ratio(input.waist, input.hip),
        waist_height_ratio: calculate_waist_height_ratio(input.waist, input.height),
        body_roundness_index: calculate_body_roundness_index(input.waist, input.height),
        body_fat_percentage,
        fat_mass: composition.map(|c| c.fat_mass),
        fat_free_mass: composition.map(|c| c.fat_free_mass),
        fat_free_mass_index,
    };

    (metrics, incomplete)
}
