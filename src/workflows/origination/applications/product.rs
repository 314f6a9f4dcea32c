//! Loan product definitions and the policy checks derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amortization::{self, AmortizationError};
use super::domain::ProductId;

/// A configured loan product: the envelope a request has to fit inside.
///
/// Catalog owners are responsible for keeping `min_amount <= max_amount` and
/// `min_term_months <= max_term_months`; [`LoanProduct::bounds_are_coherent`]
/// exists so they can assert it when definitions are loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: ProductId,
    pub name: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub min_term_months: u32,
    pub max_term_months: u32,
    pub min_interest_rate: Decimal,
    pub max_interest_rate: Decimal,
    pub default_interest_rate: Decimal,
    pub auto_approval_limit: Option<Decimal>,
    pub processing_fee_rate: Option<Decimal>,
    pub requires_collateral: bool,
    pub requires_guarantor: bool,
    pub min_credit_score: Option<u16>,
    pub min_income: Option<Decimal>,
}

/// A requested amount or term falling outside the product envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitViolation {
    #[error("amount {amount} outside product bounds {min}..={max}")]
    Amount {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("term {term} months outside product bounds {min}..={max}")]
    Term { term: u32, min: u32, max: u32 },
}

/// Failures from policy-level payment computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductPolicyError {
    #[error(transparent)]
    Limits(#[from] LimitViolation),
    #[error(transparent)]
    Calculation(#[from] AmortizationError),
}

impl LoanProduct {
    /// Inclusive at both ends: the boundary amounts are valid.
    pub fn amount_within_limits(&self, amount: Decimal) -> bool {
        self.min_amount <= amount && amount <= self.max_amount
    }

    /// Inclusive at both ends.
    pub fn term_within_limits(&self, term_months: u32) -> bool {
        self.min_term_months <= term_months && term_months <= self.max_term_months
    }

    pub fn ensure_within_limits(
        &self,
        amount: Decimal,
        term_months: u32,
    ) -> Result<(), LimitViolation> {
        if !self.amount_within_limits(amount) {
            return Err(LimitViolation::Amount {
                amount,
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        if !self.term_within_limits(term_months) {
            return Err(LimitViolation::Term {
                term: term_months,
                min: self.min_term_months,
                max: self.max_term_months,
            });
        }
        Ok(())
    }

    /// True only when the product carries an auto-approval ceiling and the
    /// amount sits at or below it.
    pub fn eligible_for_auto_approval(&self, amount: Decimal) -> bool {
        match self.auto_approval_limit {
            Some(limit) => amount <= limit,
            None => false,
        }
    }

    /// Up-front fee for an amount, zero when the product charges none.
    pub fn processing_fee(&self, amount: Decimal) -> Decimal {
        match self.processing_fee_rate {
            Some(rate) => amount * rate,
            None => Decimal::ZERO,
        }
    }

    /// Monthly payment for an in-bounds request, using `rate_override` when
    /// supplied and the product default otherwise.
    pub fn monthly_payment_for(
        &self,
        amount: Decimal,
        term_months: u32,
        rate_override: Option<Decimal>,
    ) -> Result<Decimal, ProductPolicyError> {
        self.ensure_within_limits(amount, term_months)?;
        let rate = rate_override.unwrap_or(self.default_interest_rate);
        Ok(amortization::monthly_payment(amount, term_months, rate)?)
    }

    pub fn bounds_are_coherent(&self) -> bool {
        self.min_amount <= self.max_amount && self.min_term_months <= self.max_term_months
    }
}
