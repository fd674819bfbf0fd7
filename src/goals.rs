//! Goal recommendation resolver
//!
//! A closed set of fitness goals, each tied to a fixed bundle of nutrition,
//! training and supplementation guidance. The bundles are static data; the
//! only metric-dependent part is the caloric field of the two goals whose
//! magnitude scales with how far the client sits from the reference cut.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownGoalError;
use crate::models::{DerivedMetrics, Gender};

/// Identifier of a supported goal. The wire form is the goal's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalId {
    #[serde(rename = "Reducción visceral")]
    VisceralReduction,
    #[serde(rename = "Hipertrofia")]
    Hypertrophy,
    #[serde(rename = "Recomposición avanzada")]
    AdvancedRecomposition,
    #[serde(rename = "Plan estándar")]
    StandardPlan,
}

impl GoalId {
    pub const ALL: [GoalId; 4] = [
        GoalId::VisceralReduction,
        GoalId::Hypertrophy,
        GoalId::AdvancedRecomposition,
        GoalId::StandardPlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalId::VisceralReduction => "Reducción visceral",
            GoalId::Hypertrophy => "Hipertrofia",
            GoalId::AdvancedRecomposition => "Recomposición avanzada",
            GoalId::StandardPlan => "Plan estándar",
        }
    }

    fn profile(&self) -> &'static GoalProfile {
        match self {
            GoalId::VisceralReduction => &PROFILES[0],
            GoalId::Hypertrophy => &PROFILES[1],
            GoalId::AdvancedRecomposition => &PROFILES[2],
            GoalId::StandardPlan => &PROFILES[3],
        }
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match only: an unknown identifier is never mapped to a nearby goal
impl FromStr for GoalId {
    type Err = UnknownGoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalId::ALL
            .iter()
            .copied()
            .find(|goal| goal.as_str() == s)
            .ok_or_else(|| UnknownGoalError {
                goal: s.to_string(),
            })
    }
}

/// The single caloric field carried by a recommendation.
///
/// Serialized flattened into its parent, so exactly one of `caloric_deficit`,
/// `caloric_surplus` or `caloric_strategy` appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaloricStrategy {
    /// Deficit in percent of maintenance calories
    #[serde(rename = "caloric_deficit")]
    Deficit(u32),
    /// Surplus in kcal per day
    #[serde(rename = "caloric_surplus")]
    Surplus(u32),
    #[serde(rename = "caloric_strategy")]
    Named(String),
}

impl fmt::Display for CaloricStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaloricStrategy::Deficit(pct) => write!(f, "{}% caloric deficit", pct),
            CaloricStrategy::Surplus(kcal) => write!(f, "+{} kcal/day surplus", kcal),
            CaloricStrategy::Named(strategy) => f.write_str(strategy),
        }
    }
}

struct GoalProfile {
    description: &'static str,
    training_focus: &'static str,
    nutrition: &'static [&'static str],
    training: &'static [&'static str],
    supplements: &'static [&'static str],
}

const RECOMPOSITION_STRATEGY: &str = "Ciclado nutricional: ±5% calorías días entrenamiento/descanso";
const STANDARD_STRATEGY: &str = "Equilibrio calórico o déficit moderado";

/// Indexed in [`GoalId::ALL`] order
static PROFILES: [GoalProfile; 4] = [
    GoalProfile {
        description: "Priorizar reducción de grasa abdominal",
        training_focus: "Entrenamiento de alta intensidad y ejercicio aeróbico",
        nutrition: &[
            "Déficit calórico moderado (15-20%)",
            "Enfoque en alimentos con bajo índice glucémico",
            "Priorizar proteínas (2g/kg) y grasas saludables",
            "Considerar ayuno intermitente 16/8",
        ],
        training: &[
            "3-4 sesiones semanales HIIT",
            "2-3 sesiones semanales de fuerza",
            "Monitorizar perímetro abdominal semanalmente",
        ],
        supplements: &[
            "Omega-3 (2-4g/día)",
            "Té verde o EGCG",
            "Considerar L-carnitina pre-entrenamiento",
        ],
    },
    GoalProfile {
        description: "Priorizar ganancia de masa muscular",
        training_focus: "Entrenamiento de fuerza e hipertrofia",
        nutrition: &[
            "Superávit calórico moderado (250-500 kcal)",
            "Proteínas: 2.2-2.5g/kg de peso",
            "Distribución de proteínas: 4-5 comidas",
            "Carbohidratos peri-entrenamiento",
        ],
        training: &[
            "Entrenamiento de fuerza 4-5 días/semana",
            "Enfoque en hipertrofia (8-12 repeticiones)",
            "Programación con sobrecarga progresiva",
            "Descanso óptimo entre series (60-90s)",
        ],
        supplements: &[
            "Creatina monohidrato (5g/día)",
            "Proteína de suero post-entrenamiento",
            "Considerar beta-alanina para entrenamientos intensos",
        ],
    },
    GoalProfile {
        description: "Equilibrio óptimo entre ganancia muscular y pérdida grasa",
        training_focus: "Entrenamiento mixto fuerza-metabólico",
        nutrition: &[
            "Mantenimiento calórico con ciclado nutricional",
            "Superávit en días de entrenamiento (+10%)",
            "Déficit en días de descanso (-10%)",
            "Proteínas elevadas constantes (2.2g/kg)",
        ],
        training: &[
            "Entrenamiento mixto: fuerza-metabólico",
            "Periodización ondulante",
            "Incluir entrenamiento concurrente estratégico",
            "Monitorizar rendimiento y recuperación",
        ],
        supplements: &[
            "Creatina (5g/día)",
            "Cafeína pre-entrenamiento",
            "Proteína de digestión rápida y lenta",
        ],
    },
    GoalProfile {
        description: "Plan equilibrado de composición corporal",
        training_focus: "Entrenamiento combinado fuerza-resistencia",
        nutrition: &[
            "Balance calórico ajustado a objetivo específico",
            "Distribución macronutrientes balanceada",
            "Enfoque en calidad nutricional",
            "Hidratación óptima (35ml/kg)",
        ],
        training: &[
            "Programa combinado fuerza-resistencia",
            "3-4 sesiones semanales",
            "Progresión gradual de intensidad",
            "Incluir componente de movilidad y flexibilidad",
        ],
        supplements: &[
            "Multivitamínico básico",
            "Proteína de suero si es necesario",
            "Considerar creatina según objetivos específicos",
        ],
    },
];

/// Reference cuts the goal logic measures excess against
struct GoalCuts {
    waist_hip_ratio: Decimal,
    ffmi_floor: Decimal,
}

impl GoalCuts {
    fn for_gender(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self {
                waist_hip_ratio: dec!(0.90),
                ffmi_floor: dec!(19),
            },
            Gender::Female => Self {
                waist_hip_ratio: dec!(0.85),
                ffmi_floor: dec!(15),
            },
        }
    }
}

const MIN_DEFICIT_PCT: u32 = 10;
const MAX_DEFICIT_PCT: u32 = 20;
const BASE_SURPLUS_KCAL: u32 = 300;

/// Deficit percent: one point per 0.01 of WHR above the cut, within [10, 20]
fn deficit_for(excess_whr: Decimal) -> u32 {
    let points = (excess_whr * dec!(100)).trunc().to_i64().unwrap_or(0);
    points.clamp(MIN_DEFICIT_PCT as i64, MAX_DEFICIT_PCT as i64) as u32
}

/// Surplus kcal: 300 plus 50 per FFMI point below the floor
fn surplus_for(ffmi_shortfall: Decimal) -> u32 {
    let extra = (ffmi_shortfall.max(Decimal::ZERO) * dec!(50))
        .trunc()
        .to_u32()
        .unwrap_or(0);
    BASE_SURPLUS_KCAL + extra
}

fn caloric_for(goal: GoalId, gender: Option<Gender>, metrics: Option<&DerivedMetrics>) -> CaloricStrategy {
    let cuts = gender.map(GoalCuts::for_gender);

    match goal {
        GoalId::VisceralReduction => {
            let excess = match (cuts, metrics) {
                (Some(cuts), Some(m)) => m.waist_hip_ratio - cuts.waist_hip_ratio,
                _ => Decimal::ZERO,
            };
            CaloricStrategy::Deficit(deficit_for(excess))
        }
        GoalId::Hypertrophy => {
            let shortfall = match (cuts, metrics.and_then(|m| m.fat_free_mass_index)) {
                (Some(cuts), Some(ffmi)) => cuts.ffmi_floor - ffmi,
                _ => Decimal::ZERO,
            };
            CaloricStrategy::Surplus(surplus_for(shortfall))
        }
        GoalId::AdvancedRecomposition => CaloricStrategy::Named(RECOMPOSITION_STRATEGY.to_string()),
        GoalId::StandardPlan => CaloricStrategy::Named(STANDARD_STRATEGY.to_string()),
    }
}

/// Guidance bundle for one goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRecommendation {
    pub primary_goal: GoalId,
    pub description: String,
    #[serde(flatten)]
    pub caloric: CaloricStrategy,
    pub training_focus: String,
    pub nutrition: Vec<String>,
    pub training: Vec<String>,
    pub supplements: Vec<String>,
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build(goal: GoalId, caloric: CaloricStrategy) -> GoalRecommendation {
    let profile = goal.profile();
    GoalRecommendation {
        primary_goal: goal,
        description: profile.description.to_string(),
        caloric,
        training_focus: profile.training_focus.to_string(),
        nutrition: to_owned_list(profile.nutrition),
        training: to_owned_list(profile.training),
        supplements: to_owned_list(profile.supplements),
    }
}

/// Bundle for a known goal at zero excess (10 % deficit, 300 kcal surplus)
pub fn resolve_goal(goal: GoalId) -> GoalRecommendation {
    build(goal, caloric_for(goal, None, None))
}

/// Bundle for a goal identifier. Unknown identifiers are an error, never a fallback bundle.
pub fn resolve(goal: &str) -> Result<GoalRecommendation, UnknownGoalError> {
    goal.parse::<GoalId>().map(resolve_goal)
}

/// Bundle whose caloric value is scaled by the client's own metrics
pub fn resolve_for(goal: GoalId, gender: Gender, metrics: &DerivedMetrics) -> GoalRecommendation {
    build(goal, caloric_for(goal, Some(gender), Some(metrics)))
}

/// Goal picked from the metrics, without the guidance lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSuggestion {
    pub primary_goal: GoalId,
    pub description: String,
    #[serde(flatten)]
    pub caloric: CaloricStrategy,
    pub training_focus: String,
}

impl From<GoalRecommendation> for GoalSuggestion {
    fn from(rec: GoalRecommendation) -> Self {
        Self {
            primary_goal: rec.primary_goal,
            description: rec.description,
            caloric: rec.caloric,
            training_focus: rec.training_focus,
        }
    }
}

/// Pick a goal from the metrics. First match wins:
/// 1. WHR above the gender cut → visceral reduction
/// 2. FFMI below the gender floor → hypertrophy
/// 3. body fat within [15, 25] % → advanced recomposition
/// 4. otherwise → standard plan
///
/// Needs body-fat percentage and FFMI; `None` without a skinfold triplet.
pub fn suggest_goal(gender: Gender, metrics: &DerivedMetrics) -> Option<GoalSuggestion> {
    let body_fat = metrics.body_fat_percentage?;
    let ffmi = metrics.fat_free_mass_index?;
    let cuts = GoalCuts::for_gender(gender);

    let goal = if metrics.waist_hip_ratio > cuts.waist_hip_ratio {
        GoalId::VisceralReduction
    } else if ffmi < cuts.ffmi_floor {
        GoalId::Hypertrophy
    } else if (dec!(15)..=dec!(25)).contains(&body_fat) {
        GoalId::AdvancedRecomposition
    } else {
        GoalId::StandardPlan
    };

    Some(resolve_for(goal, gender, metrics).into())
}

/// Result of a recommendation request.
///
/// Serializes as `{"success": true, ...bundle}` or
/// `{"success": false, "message": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Found(GoalRecommendation),
    Unavailable(UnknownGoalError),
}

impl RecommendationOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, RecommendationOutcome::Found(_))
    }

    pub fn recommendation(&self) -> Option<&GoalRecommendation> {
        match self {
            RecommendationOutcome::Found(rec) => Some(rec),
            RecommendationOutcome::Unavailable(_) => None,
        }
    }
}

impl From<Result<GoalRecommendation, UnknownGoalError>> for RecommendationOutcome {
    fn from(result: Result<GoalRecommendation, UnknownGoalError>) -> Self {
        match result {
            Ok(rec) => RecommendationOutcome::Found(rec),
            Err(err) => RecommendationOutcome::Unavailable(err),
        }
    }
}

impl Serialize for RecommendationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Found<'a> {
            success: bool,
            #[serde(flatten)]
            recommendation: &'a GoalRecommendation,
        }

        #[derive(Serialize)]
        struct Unavailable {
            success: bool,
            message: String,
        }

        match self {
            RecommendationOutcome::Found(recommendation) => Found {
                success: true,
                recommendation,
            }
            .serialize(serializer),
            RecommendationOutcome::Unavailable(err) => Unavailable {
                success: false,
                message: err.to_string(),
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(whr: Decimal, body_fat: Option<Decimal>, ffmi: Option<Decimal>) -> DerivedMetrics {
        DerivedMetrics {
            bmi: dec!(23),
            waist_hip_ratio: whr,
            waist_height_ratio: dec!(0.48),
            body_roundness_index: dec!(3),
            body_fat_percentage: body_fat,
            fat_mass: None,
            fat_free_mass: None,
            fat_free_mass_index: ffmi,
        }
    }

    fn caloric_keys(value: &serde_json::Value) -> Vec<&str> {
        ["caloric_deficit", "caloric_surplus", "caloric_strategy"]
            .into_iter()
            .filter(|key| value.get(*key).is_some())
            .collect()
    }

    #[test]
    fn test_every_goal_has_exactly_one_caloric_field() {
        for goal in GoalId::ALL {
            let json = serde_json::to_value(resolve_goal(goal)).unwrap();
            assert_eq!(caloric_keys(&json).len(), 1, "goal {}", goal);
            assert_eq!(json["primary_goal"], serde_json::json!(goal.as_str()));
        }
    }

    #[test]
    fn test_resolve_known_goal() {
        let rec = resolve("Hipertrofia").unwrap();
        assert_eq!(rec.primary_goal, GoalId::Hypertrophy);
        assert_eq!(rec.caloric, CaloricStrategy::Surplus(300));
        assert_eq!(rec.nutrition.len(), 4);
        assert_eq!(rec.supplements[0], "Creatina monohidrato (5g/día)");
    }

    #[test]
    fn test_resolve_is_exact_match() {
        assert!(resolve("unknown_goal").is_err());
        assert!(resolve("hipertrofia").is_err());
        assert!(resolve("").is_err());
    }

    #[test]
    fn test_unknown_goal_outcome_shape() {
        let outcome: RecommendationOutcome = resolve("unknown_goal").into();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], serde_json::json!(false));
        assert!(json["message"].as_str().unwrap().contains("unknown_goal"));
        assert!(json.get("nutrition").is_none());
    }

    #[test]
    fn test_found_outcome_shape() {
        let outcome: RecommendationOutcome = resolve("Plan estándar").into();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], serde_json::json!(true));
        assert_eq!(json["caloric_strategy"], serde_json::json!(STANDARD_STRATEGY));
        assert_eq!(json["training"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_suggest_visceral_reduction() {
        // 0.97 - 0.90 = 0.07 → 7 points, clamped up to 10
        let m = metrics(dec!(0.97), Some(dec!(22)), Some(dec!(20)));
        let suggestion = suggest_goal(Gender::Male, &m).unwrap();
        assert_eq!(suggestion.primary_goal, GoalId::VisceralReduction);
        assert_eq!(suggestion.caloric, CaloricStrategy::Deficit(10));

        // 1.05 - 0.85 = 0.20 → 20
        let m = metrics(dec!(1.05), Some(dec!(30)), Some(dec!(16)));
        let suggestion = suggest_goal(Gender::Female, &m).unwrap();
        assert_eq!(suggestion.caloric, CaloricStrategy::Deficit(20));
    }

    #[test]
    fn test_deficit_clamped_above() {
        assert_eq!(deficit_for(dec!(0.35)), MAX_DEFICIT_PCT);
        assert_eq!(deficit_for(dec!(0.139)), 13);
        assert_eq!(deficit_for(dec!(-0.2)), MIN_DEFICIT_PCT);
    }

    #[test]
    fn test_suggest_hypertrophy() {
        // (19 - 17.5) × 50 = 75
        let m = metrics(dec!(0.85), Some(dec!(12)), Some(dec!(17.5)));
        let suggestion = suggest_goal(Gender::Male, &m).unwrap();
        assert_eq!(suggestion.primary_goal, GoalId::Hypertrophy);
        assert_eq!(suggestion.caloric, CaloricStrategy::Surplus(375));
    }

    #[test]
    fn test_suggest_recomposition_and_standard() {
        let m = metrics(dec!(0.85), Some(dec!(18)), Some(dec!(20)));
        assert_eq!(
            suggest_goal(Gender::Male, &m).unwrap().primary_goal,
            GoalId::AdvancedRecomposition
        );

        let m = metrics(dec!(0.85), Some(dec!(11.2)), Some(dec!(21.91)));
        let suggestion = suggest_goal(Gender::Male, &m).unwrap();
        assert_eq!(suggestion.primary_goal, GoalId::StandardPlan);
        assert_eq!(
            suggestion.caloric,
            CaloricStrategy::Named(STANDARD_STRATEGY.to_string())
        );
    }

    #[test]
    fn test_whr_at_cut_is_not_visceral() {
        let m = metrics(dec!(0.90), Some(dec!(20)), Some(dec!(20)));
        assert_eq!(
            suggest_goal(Gender::Male, &m).unwrap().primary_goal,
            GoalId::AdvancedRecomposition
        );
    }

    #[test]
    fn test_no_suggestion_without_body_composition() {
        let m = metrics(dec!(0.97), None, None);
        assert!(suggest_goal(Gender::Male, &m).is_none());
    }

    #[test]
    fn test_resolve_for_scales_surplus() {
        let m = metrics(dec!(0.80), Some(dec!(20)), Some(dec!(13)));
        let rec = resolve_for(GoalId::Hypertrophy, Gender::Female, &m);
        // (15 - 13) × 50 = 100
        assert_eq!(rec.caloric, CaloricStrategy::Surplus(400));

        // above the floor the surplus stays at its base
        let m = metrics(dec!(0.80), Some(dec!(20)), Some(dec!(18)));
        let rec = resolve_for(GoalId::Hypertrophy, Gender::Female, &m);
        assert_eq!(rec.caloric, CaloricStrategy::Surplus(300));
    }
}
