use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{
    ApplicationFilter, ApplicationId, CustomerId, CustomerSnapshot, LoanApplication, ProductId,
};
use super::lifecycle::ApplicationStatus;
use super::product::LoanProduct;

/// Storage abstraction so the service can be exercised in isolation.
///
/// `update` must compare the incoming record's `version` against the stored
/// one and answer `Conflict` on a mismatch; the saved record comes back with
/// the version advanced. That contract is what makes concurrent operator
/// actions lose cleanly instead of silently overwriting each other.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    fn update(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    fn fetch_by_number(
        &self,
        application_number: &str,
    ) -> Result<Option<LoanApplication>, RepositoryError>;
    fn search(&self, filter: &ApplicationFilter) -> Result<Vec<LoanApplication>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with stored state")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Customer record capability exposed by the CRM side of the house.
pub trait CustomerDirectory: Send + Sync {
    fn fetch(&self, id: &CustomerId) -> Result<Option<CustomerSnapshot>, RepositoryError>;
}

/// Product catalog lookup.
pub trait ProductCatalog: Send + Sync {
    fn fetch(&self, id: &ProductId) -> Result<Option<LoanProduct>, RepositoryError>;
}

/// Outbound status-change hook (e-mail, SMS, or queue adapters).
///
/// Dispatch is best-effort: the service logs failures and never lets them
/// roll back the state change that triggered them.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: StatusChangeNotice) -> Result<(), NotificationError>;
}

/// Payload handed to the notification adapter after a workflow transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChangeNotice {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub status: ApplicationStatus,
    pub event: &'static str,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's externally visible state.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_number: String,
    pub status: &'static str,
    pub current_step: String,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<Decimal>,
}

impl ApplicationStatusView {
    pub fn from_application(application: &LoanApplication) -> Self {
        Self {
            application_number: application.application_number.clone(),
            status: application.status.label(),
            current_step: application.current_step.clone(),
            decision_rationale: application.decision_rationale(),
            monthly_payment: application.monthly_payment,
        }
    }
}
