//! Pure amortization math on fixed-point decimals.
//!
//! Every monetary result is rounded to 2 decimal places, half-up, and the
//! schedule rounds at each step so cumulative figures match what a statement
//! printer would show. Binary floating point never touches money here.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const MONEY_DECIMALS: u32 = 2;
const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Invalid numeric input to the calculator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmortizationError {
    #[error("term must be at least one month")]
    NonPositiveTerm,
    #[error("{0} must not be negative")]
    NegativeInput(&'static str),
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleLine {
    pub month: u32,
    pub payment: Decimal,
    pub principal_portion: Decimal,
    pub interest_portion: Decimal,
    pub remaining_balance: Decimal,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

fn check_inputs(
    principal: Decimal,
    term_months: u32,
    annual_rate: Decimal,
) -> Result<(), AmortizationError> {
    if term_months == 0 {
        return Err(AmortizationError::NonPositiveTerm);
    }
    if principal.is_sign_negative() && !principal.is_zero() {
        return Err(AmortizationError::NegativeInput("principal"));
    }
    if annual_rate.is_sign_negative() && !annual_rate.is_zero() {
        return Err(AmortizationError::NegativeInput("annual rate"));
    }
    Ok(())
}

/// Fixed monthly payment for an amortizing loan.
///
/// A zero rate degrades to a linear payoff of `principal / term`.
pub fn monthly_payment(
    principal: Decimal,
    term_months: u32,
    annual_rate: Decimal,
) -> Result<Decimal, AmortizationError> {
    check_inputs(principal, term_months, annual_rate)?;

    if annual_rate.is_zero() {
        return Ok(round_money(principal / Decimal::from(term_months)));
    }

    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    // p * r / (1 - (1+r)^-n), written with the growth factor to keep the
    // intermediate at full precision: p * r * g / (g - 1).
    let growth = (Decimal::ONE + monthly_rate).powi(i64::from(term_months));
    let payment = principal * monthly_rate * growth / (growth - Decimal::ONE);

    Ok(round_money(payment))
}

/// Sum of all monthly payments over the term.
pub fn total_payment(
    principal: Decimal,
    term_months: u32,
    annual_rate: Decimal,
) -> Result<Decimal, AmortizationError> {
    let payment = monthly_payment(principal, term_months, annual_rate)?;
    Ok(payment * Decimal::from(term_months))
}

/// Interest paid over the life of the loan.
///
/// A zero-rate payment can round down so that `payment * term` lands a cent
/// under the principal; interest never reports negative.
pub fn total_interest(
    principal: Decimal,
    term_months: u32,
    annual_rate: Decimal,
) -> Result<Decimal, AmortizationError> {
    let total = total_payment(principal, term_months, annual_rate)?;
    Ok((total - principal).max(Decimal::ZERO))
}

/// Full month-by-month schedule, materialized up front.
///
/// The final installment retires whatever balance remains, so the last line's
/// `remaining_balance` is exactly zero and the per-step rounding drift ends up
/// in the last payment rather than lingering on the books.
pub fn amortization_schedule(
    principal: Decimal,
    term_months: u32,
    annual_rate: Decimal,
) -> Result<Vec<ScheduleLine>, AmortizationError> {
    let payment = monthly_payment(principal, term_months, annual_rate)?;
    let monthly_rate = if annual_rate.is_zero() {
        Decimal::ZERO
    } else {
        annual_rate / MONTHS_PER_YEAR
    };

    let mut lines = Vec::with_capacity(term_months as usize);
    let mut balance = round_money(principal);

    for month in 1..=term_months {
        let interest_portion = round_money(balance * monthly_rate);
        let (principal_portion, installment) = if month == term_months {
            (balance, round_money(balance + interest_portion))
        } else {
            (round_money(payment - interest_portion), payment)
        };

        balance = round_money(balance - principal_portion);
        lines.push(ScheduleLine {
            month,
            payment: installment,
            principal_portion,
            interest_portion,
            remaining_balance: balance,
        });
    }

    Ok(lines)
}
