use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::config::UnderwritingConfig;
use super::rules::RiskSignals;

/// What the rule set recommends for an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnderwritingRecommendation {
    /// No threshold tripped; eligible for straight-through processing.
    Clear,
    /// Thresholds pass but the composite risk calls for a senior reviewer.
    Referred { reasons: Vec<String> },
    Declined(DeclineReason),
}

impl UnderwritingRecommendation {
    pub fn summary(&self) -> String {
        match self {
            UnderwritingRecommendation::Clear => "clear for approval".to_string(),
            UnderwritingRecommendation::Referred { reasons } => {
                if reasons.is_empty() {
                    "referred for senior review".to_string()
                } else {
                    format!("referred for senior review: {}", reasons.join("; "))
                }
            }
            UnderwritingRecommendation::Declined(reason) => reason.summary(),
        }
    }
}

/// Specific threshold behind a declined recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclineReason {
    CreditScoreBelowFloor { floor: u16, actual: u16 },
    InsufficientIncome { floor: Decimal, actual: Decimal },
    DebtBurdenTooHigh { limit: Decimal, actual: Decimal },
}

impl DeclineReason {
    pub fn summary(&self) -> String {
        match self {
            DeclineReason::CreditScoreBelowFloor { floor, actual } => {
                format!("declined: credit score {actual} below required {floor}")
            }
            DeclineReason::InsufficientIncome { floor, actual } => {
                format!("declined: monthly income {actual} below required {floor}")
            }
            DeclineReason::DebtBurdenTooHigh { limit, actual } => {
                format!("declined: debt-to-income {actual} above limit {limit}")
            }
        }
    }
}

pub(crate) fn decide(
    signals: &RiskSignals,
    risk_score: u8,
    config: &UnderwritingConfig,
) -> UnderwritingRecommendation {
    if signals.credit_score < signals.credit_floor {
        return UnderwritingRecommendation::Declined(DeclineReason::CreditScoreBelowFloor {
            floor: signals.credit_floor,
            actual: signals.credit_score,
        });
    }

    if signals.monthly_income < signals.income_floor {
        return UnderwritingRecommendation::Declined(DeclineReason::InsufficientIncome {
            floor: signals.income_floor,
            actual: signals.monthly_income,
        });
    }

    if let Some(ratio) = signals.debt_to_income {
        if ratio > config.maximum_debt_to_income {
            return UnderwritingRecommendation::Declined(DeclineReason::DebtBurdenTooHigh {
                limit: config.maximum_debt_to_income,
                actual: ratio,
            });
        }
    }

    if risk_score >= config.referral_risk_threshold {
        return UnderwritingRecommendation::Referred {
            reasons: vec![format!(
                "composite risk score {risk_score} at or above referral threshold {}",
                config.referral_risk_threshold
            )],
        };
    }

    UnderwritingRecommendation::Clear
}
