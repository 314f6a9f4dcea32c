//! Origination workflow: everything between customer intake and disbursement.

pub mod applications;
