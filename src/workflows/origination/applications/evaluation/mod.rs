mod config;
mod policy;
mod rules;

pub use config::UnderwritingConfig;
pub use policy::{DeclineReason, UnderwritingRecommendation};

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, LoanApplication};
use super::product::LoanProduct;
use policy::decide;

/// Credit bureau integration is stubbed; every applicant enters underwriting
/// with this score until the connector lands.
pub const STUB_CREDIT_SCORE: u16 = 650;

/// Stateless assessor applying the configured rule set to an application.
pub struct UnderwritingEngine {
    config: UnderwritingConfig,
}

impl UnderwritingEngine {
    pub fn new(config: UnderwritingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UnderwritingConfig {
        &self.config
    }

    pub fn assess(
        &self,
        application: &LoanApplication,
        product: &LoanProduct,
    ) -> UnderwritingAssessment {
        let (components, risk_score, signals) =
            rules::assess_application(application, product, &self.config);

        let recommendation = decide(&signals, risk_score, &self.config);

        UnderwritingAssessment {
            application_id: application.id.clone(),
            recommendation,
            risk_score,
            components,
        }
    }
}

/// Discrete contribution to a risk score, kept for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RiskFactorKind,
    pub weight: u8,
    pub notes: String,
}

/// Factors the rule set is allowed to weigh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactorKind {
    CreditScore,
    Income,
    DebtToIncome,
    LoanSize,
}

/// Assessment output: composite risk plus the recommendation trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingAssessment {
    pub application_id: ApplicationId,
    pub recommendation: UnderwritingRecommendation,
    pub risk_score: u8,
    pub components: Vec<ScoreComponent>,
}
