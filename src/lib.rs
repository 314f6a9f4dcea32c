//! Core domain engine for a loan-origination back office.
//!
//! The crate owns the loan application lifecycle (draft through disbursement),
//! the amortization calculator, loan product policy, and the underwriting
//! rules that gate auto-approval. Persistence, customer records, and
//! notification delivery are reached through traits so the embedding request
//! layer can supply its own adapters.

pub mod config;
pub mod workflows;
