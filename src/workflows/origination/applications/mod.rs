//! Loan application intake, lifecycle, underwriting, and calculation engine.
//!
//! Persistence, the customer directory, the product catalog, and notification
//! delivery live behind the traits in [`repository`]; everything else in here
//! is deterministic and synchronous.

pub mod amortization;
pub mod domain;
pub mod evaluation;
pub mod lifecycle;
pub mod product;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use amortization::{
    amortization_schedule, monthly_payment, total_interest, total_payment, AmortizationError,
    ScheduleLine,
};
pub use domain::{
    ApplicationFilter, ApplicationId, ApplicationUpdate, ApprovalTerms, CreateApplicationRequest,
    CustomerId, CustomerSnapshot, LoanApplication, LoanType, ProductId, DEFAULT_PRIORITY,
    MAX_PRIORITY, MIN_PRIORITY,
};
pub use evaluation::{
    DeclineReason, RiskFactorKind, ScoreComponent, UnderwritingAssessment, UnderwritingConfig,
    UnderwritingEngine, UnderwritingRecommendation, STUB_CREDIT_SCORE,
};
pub use lifecycle::{transition, ApplicationStatus, IllegalTransition, WorkflowEvent};
pub use product::{LimitViolation, LoanProduct, ProductPolicyError};
pub use repository::{
    ApplicationRepository, ApplicationStatusView, CustomerDirectory, NotificationError,
    NotificationPublisher, ProductCatalog, RepositoryError, StatusChangeNotice,
};
pub use service::{ApplicationServiceError, LoanApplicationService, SYSTEM_ACTOR};
