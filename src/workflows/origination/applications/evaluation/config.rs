use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Underwriting thresholds applied when a product does not set its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingConfig {
    pub minimum_credit_score: u16,
    pub minimum_monthly_income: Decimal,
    pub maximum_debt_to_income: Decimal,
    /// Risk scores at or above this level are referred to a senior reviewer.
    pub referral_risk_threshold: u8,
}

impl Default for UnderwritingConfig {
    fn default() -> Self {
        Self {
            minimum_credit_score: 580,
            minimum_monthly_income: dec!(1500),
            maximum_debt_to_income: dec!(0.45),
            referral_risk_threshold: 70,
        }
    }
}
