//! Milestone catalog - the fixed table of recovery milestones.
//!
//! Every kind maps to exactly one target duration measured from the quit
//! anchor. The table is compiled in and never changes at runtime; adding a
//! kind forces every `match` below to be extended.

use serde::{Deserialize, Serialize};

/// Milliseconds in one hour.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

const HOURS_PER_DAY: f64 = 24.0;
const HOURS_PER_YEAR: f64 = 365.0 * HOURS_PER_DAY;

/// A physiological recovery milestone.
///
/// Variants are declared in ascending order of target duration. Declaration
/// order is also the tie-breaker wherever milestones are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// Heart rate drops back toward normal
    PulseRate,
    /// Blood oxygen returns to normal
    OxygenLevel,
    /// Carbon monoxide is cleared from the blood
    CarbonMonoxide,
    /// Acute heart attack risk starts to fall
    HeartAttackRisk,
    /// Nerve endings regrow; taste and smell sharpen
    TasteAndSmell,
    /// Nicotine has left the body
    NicotineExpelled,
    /// Bronchial tubes relax and breathing gets easier
    BreathingEasier,
    /// Circulation improves
    Circulation,
    /// Lung function measurably improves
    LungFunction,
    /// Coughing and shortness of breath subside
    CoughReduction,
    /// Coronary heart disease risk is halved
    CoronaryRiskHalved,
    /// Stroke risk matches a non-smoker's
    StrokeRisk,
    /// Mouth, throat and esophagus cancer risk is halved
    MouthCancerRisk,
    /// Lung cancer death risk is halved
    LungCancerRisk,
    /// Bladder and pancreatic cancer risk falls
    BladderCancerRisk,
    /// Heart disease risk matches a non-smoker's
    HeartDiseaseRisk,
}

impl MilestoneKind {
    /// Every kind, in declaration order.
    pub const ALL: [MilestoneKind; 16] = [
        MilestoneKind::PulseRate,
        MilestoneKind::OxygenLevel,
        MilestoneKind::CarbonMonoxide,
        MilestoneKind::HeartAttackRisk,
        MilestoneKind::TasteAndSmell,
        MilestoneKind::NicotineExpelled,
        MilestoneKind::BreathingEasier,
        MilestoneKind::Circulation,
        MilestoneKind::LungFunction,
        MilestoneKind::CoughReduction,
        MilestoneKind::CoronaryRiskHalved,
        MilestoneKind::StrokeRisk,
        MilestoneKind::MouthCancerRisk,
        MilestoneKind::LungCancerRisk,
        MilestoneKind::BladderCancerRisk,
        MilestoneKind::HeartDiseaseRisk,
    ];

    /// Hours from the (effective) quit anchor until this milestone is reached.
    pub fn target_duration_hours(self) -> f64 {
        match self {
            MilestoneKind::PulseRate => 20.0 / 60.0,
            MilestoneKind::OxygenLevel => 8.0,
            MilestoneKind::CarbonMonoxide => 12.0,
            MilestoneKind::HeartAttackRisk => HOURS_PER_DAY,
            MilestoneKind::TasteAndSmell => 2.0 * HOURS_PER_DAY,
            MilestoneKind::NicotineExpelled => 3.0 * HOURS_PER_DAY,
            MilestoneKind::BreathingEasier => 4.0 * HOURS_PER_DAY,
            MilestoneKind::Circulation => 14.0 * HOURS_PER_DAY,
            MilestoneKind::LungFunction => 90.0 * HOURS_PER_DAY,
            MilestoneKind::CoughReduction => 270.0 * HOURS_PER_DAY,
            MilestoneKind::CoronaryRiskHalved => HOURS_PER_YEAR,
            MilestoneKind::StrokeRisk => 5.0 * HOURS_PER_YEAR,
            MilestoneKind::MouthCancerRisk => 5.0 * HOURS_PER_YEAR,
            MilestoneKind::LungCancerRisk => 10.0 * HOURS_PER_YEAR,
            MilestoneKind::BladderCancerRisk => 10.0 * HOURS_PER_YEAR,
            MilestoneKind::HeartDiseaseRisk => 15.0 * HOURS_PER_YEAR,
        }
    }

    /// Target duration as a chrono duration, rounded to the millisecond.
    pub fn target_duration(self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.target_duration_hours() * MS_PER_HOUR).round() as i64)
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            MilestoneKind::PulseRate => "Pulse rate normalizes",
            MilestoneKind::OxygenLevel => "Oxygen level recovers",
            MilestoneKind::CarbonMonoxide => "Carbon monoxide cleared",
            MilestoneKind::HeartAttackRisk => "Heart attack risk drops",
            MilestoneKind::TasteAndSmell => "Taste and smell improve",
            MilestoneKind::NicotineExpelled => "Nicotine expelled",
            MilestoneKind::BreathingEasier => "Breathing gets easier",
            MilestoneKind::Circulation => "Circulation improves",
            MilestoneKind::LungFunction => "Lung function improves",
            MilestoneKind::CoughReduction => "Cough and breathlessness fade",
            MilestoneKind::CoronaryRiskHalved => "Coronary risk halved",
            MilestoneKind::StrokeRisk => "Stroke risk normalizes",
            MilestoneKind::MouthCancerRisk => "Mouth cancer risk halved",
            MilestoneKind::LungCancerRisk => "Lung cancer risk halved",
            MilestoneKind::BladderCancerRisk => "Bladder cancer risk drops",
            MilestoneKind::HeartDiseaseRisk => "Heart disease risk normalizes",
        }
    }

    /// Longer human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            MilestoneKind::PulseRate => "Your heart rate and blood pressure drop toward normal levels.",
            MilestoneKind::OxygenLevel => "Oxygen levels in your blood return to normal.",
            MilestoneKind::CarbonMonoxide => "Carbon monoxide in your blood drops to a normal level.",
            MilestoneKind::HeartAttackRisk => "Your risk of a heart attack begins to decrease.",
            MilestoneKind::TasteAndSmell => "Damaged nerve endings start to regrow; food tastes and smells better.",
            MilestoneKind::NicotineExpelled => "Nicotine has been eliminated from your body.",
            MilestoneKind::BreathingEasier => "Bronchial tubes relax and your energy level rises.",
            MilestoneKind::Circulation => "Blood circulation improves, making physical activity easier.",
            MilestoneKind::LungFunction => "Lung function increases by up to a third.",
            MilestoneKind::CoughReduction => "Coughing and shortness of breath decrease as cilia regrow.",
            MilestoneKind::CoronaryRiskHalved => "Your excess risk of coronary heart disease is half that of a smoker.",
            MilestoneKind::StrokeRisk => "Your stroke risk falls to that of a non-smoker.",
            MilestoneKind::MouthCancerRisk => "Risk of mouth, throat and esophagus cancer is halved.",
            MilestoneKind::LungCancerRisk => "Your risk of dying from lung cancer is about half that of a smoker.",
            MilestoneKind::BladderCancerRisk => "Risk of bladder and pancreatic cancer decreases.",
            MilestoneKind::HeartDiseaseRisk => "Your risk of heart disease is the same as a non-smoker's.",
        }
    }

    /// Stable machine identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneKind::PulseRate => "pulse_rate",
            MilestoneKind::OxygenLevel => "oxygen_level",
            MilestoneKind::CarbonMonoxide => "carbon_monoxide",
            MilestoneKind::HeartAttackRisk => "heart_attack_risk",
            MilestoneKind::TasteAndSmell => "taste_and_smell",
            MilestoneKind::NicotineExpelled => "nicotine_expelled",
            MilestoneKind::BreathingEasier => "breathing_easier",
            MilestoneKind::Circulation => "circulation",
            MilestoneKind::LungFunction => "lung_function",
            MilestoneKind::CoughReduction => "cough_reduction",
            MilestoneKind::CoronaryRiskHalved => "coronary_risk_halved",
            MilestoneKind::StrokeRisk => "stroke_risk",
            MilestoneKind::MouthCancerRisk => "mouth_cancer_risk",
            MilestoneKind::LungCancerRisk => "lung_cancer_risk",
            MilestoneKind::BladderCancerRisk => "bladder_cancer_risk",
            MilestoneKind::HeartDiseaseRisk => "heart_disease_risk",
        }
    }
}

impl std::fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown milestone identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown milestone kind: {0}")]
pub struct UnknownMilestoneKind(pub String);

impl std::str::FromStr for MilestoneKind {
    type Err = UnknownMilestoneKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MilestoneKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownMilestoneKind(s.to_string()))
    }
}
