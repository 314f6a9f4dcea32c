use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::super::domain::LoanApplication;
use super::super::product::LoanProduct;
use super::config::UnderwritingConfig;
use super::{RiskFactorKind, ScoreComponent};

pub(crate) struct RiskSignals {
    pub credit_score: u16,
    pub credit_floor: u16,
    pub monthly_income: Decimal,
    pub income_floor: Decimal,
    pub debt_to_income: Option<Decimal>,
}

/// Score an application against its product, producing the auditable
/// component trail, a 0-100 risk score (higher is riskier), and the raw
/// signals the decision policy consumes.
pub(crate) fn assess_application(
    application: &LoanApplication,
    product: &LoanProduct,
    config: &UnderwritingConfig,
) -> (Vec<ScoreComponent>, u8, RiskSignals) {
    let mut components = Vec::new();
    let mut risk: u32 = 0;

    let credit_floor = product
        .min_credit_score
        .unwrap_or(config.minimum_credit_score);
    let credit_score = application.credit_score;
    if credit_score < credit_floor {
        components.push(ScoreComponent {
            factor: RiskFactorKind::CreditScore,
            weight: 40,
            notes: format!("credit score {credit_score} below floor {credit_floor}"),
        });
        risk += 40;
    } else if credit_score < credit_floor.saturating_add(50) {
        components.push(ScoreComponent {
            factor: RiskFactorKind::CreditScore,
            weight: 25,
            notes: format!("credit score {credit_score} within 50 points of floor {credit_floor}"),
        });
        risk += 25;
    } else {
        components.push(ScoreComponent {
            factor: RiskFactorKind::CreditScore,
            weight: 10,
            notes: format!("credit score {credit_score} comfortably above floor {credit_floor}"),
        });
        risk += 10;
    }

    let income_floor = product.min_income.unwrap_or(config.minimum_monthly_income);
    let monthly_income = application.declared_income;
    if monthly_income < income_floor {
        components.push(ScoreComponent {
            factor: RiskFactorKind::Income,
            weight: 30,
            notes: format!("declared income {monthly_income} below floor {income_floor}"),
        });
        risk += 30;
    } else {
        components.push(ScoreComponent {
            factor: RiskFactorKind::Income,
            weight: 5,
            notes: format!("declared income {monthly_income} meets floor {income_floor}"),
        });
        risk += 5;
    }

    match application.debt_to_income_ratio {
        Some(ratio) if ratio > config.maximum_debt_to_income => {
            components.push(ScoreComponent {
                factor: RiskFactorKind::DebtToIncome,
                weight: 20,
                notes: format!(
                    "debt-to-income {ratio} exceeds limit {}",
                    config.maximum_debt_to_income
                ),
            });
            risk += 20;
        }
        Some(ratio) => {
            components.push(ScoreComponent {
                factor: RiskFactorKind::DebtToIncome,
                weight: 5,
                notes: format!("debt-to-income {ratio} within limit"),
            });
            risk += 5;
        }
        None => {
            components.push(ScoreComponent {
                factor: RiskFactorKind::DebtToIncome,
                weight: 10,
                notes: "no debt-to-income figure declared".to_string(),
            });
            risk += 10;
        }
    }

    let exposure = if product.max_amount.is_zero() {
        Decimal::ZERO
    } else {
        application.requested_amount / product.max_amount
    };
    if exposure > dec!(0.8) {
        components.push(ScoreComponent {
            factor: RiskFactorKind::LoanSize,
            weight: 10,
            notes: "requested amount in the top fifth of the product range".to_string(),
        });
        risk += 10;
    } else {
        components.push(ScoreComponent {
            factor: RiskFactorKind::LoanSize,
            weight: 5,
            notes: "requested amount well inside the product range".to_string(),
        });
        risk += 5;
    }

    let risk_score = risk.min(100) as u8;
    let signals = RiskSignals {
        credit_score,
        credit_floor,
        monthly_income,
        income_floor,
        debt_to_income: application.debt_to_income_ratio,
    };

    (components, risk_score, signals)
}
