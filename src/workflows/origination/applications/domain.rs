use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::lifecycle::ApplicationStatus;

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for customers in the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Identifier wrapper for catalog products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loan category requested by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanType {
    Personal,
    Business,
    Mortgage,
    Car,
    Consumer,
    Education,
    Medical,
}

impl LoanType {
    pub const fn label(self) -> &'static str {
        match self {
            LoanType::Personal => "personal",
            LoanType::Business => "business",
            LoanType::Mortgage => "mortgage",
            LoanType::Car => "car",
            LoanType::Consumer => "consumer",
            LoanType::Education => "education",
            LoanType::Medical => "medical",
        }
    }
}

/// What the customer directory tells us about an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub full_name: String,
    pub kyc_complete: bool,
    pub active: bool,
}

pub const DEFAULT_PRIORITY: u8 = 3;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// The central origination record.
///
/// Timestamps and the soft-delete flag are plain fields stamped by the service
/// at defined points; there is no hidden lifecycle machinery. `version` backs
/// optimistic concurrency at the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub application_number: String,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub loan_type: LoanType,

    pub requested_amount: Decimal,
    pub requested_term_months: u32,
    pub purpose: String,

    pub declared_income: Decimal,
    pub debt_to_income_ratio: Option<Decimal>,
    pub credit_score: u16,
    pub risk_score: u8,

    pub status: ApplicationStatus,
    pub current_step: String,
    pub assigned_to: Option<String>,
    pub priority: u8,

    pub approved_amount: Option<Decimal>,
    pub approved_term_months: Option<u32>,
    pub approved_rate: Option<Decimal>,
    pub monthly_payment: Option<Decimal>,

    pub decision_reason: Option<String>,
    pub decision_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approved_date: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejected_date: Option<DateTime<Utc>>,
    pub disbursed_by: Option<String>,
    pub disbursed_date: Option<DateTime<Utc>>,
    pub disbursed_amount: Option<Decimal>,

    pub submitted_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub version: u64,
}

impl LoanApplication {
    pub fn is_editable(&self) -> bool {
        self.status.permits_edit()
    }

    /// Stamp the update timestamp; called by the service before every save.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn decision_rationale(&self) -> String {
        match &self.decision_reason {
            Some(reason) => reason.clone(),
            None => "no decision recorded".to_string(),
        }
    }
}

/// Intake request for a new application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub loan_type: LoanType,
    pub requested_amount: Decimal,
    pub requested_term_months: u32,
    pub purpose: String,
    pub declared_income: Decimal,
    pub debt_to_income_ratio: Option<Decimal>,
    pub save_as_draft: bool,
    pub auto_submit: bool,
}

/// Terms an underwriter grants at approval time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovalTerms {
    pub amount: Decimal,
    pub term_months: u32,
    pub rate: Decimal,
}

/// Partial update applied while an application is still editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUpdate {
    pub requested_amount: Option<Decimal>,
    pub requested_term_months: Option<u32>,
    pub purpose: Option<String>,
    pub declared_income: Option<Decimal>,
    pub debt_to_income_ratio: Option<Decimal>,
}

/// Search criteria for the work queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub customer_id: Option<CustomerId>,
    pub loan_type: Option<LoanType>,
    pub assigned_to: Option<String>,
    pub include_deleted: bool,
}
