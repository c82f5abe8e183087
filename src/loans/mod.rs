//! Loan ledger: marketplace offers, applications, repayments, lifecycle

pub mod interest;
pub mod model;
mod service;
mod sweeper;

pub use model::{CreateLoanRequest, LoanApplication, RecordPaymentRequest, UpdateStatusRequest};
pub use service::{LoanError, LoanService};
pub use sweeper::start_overdue_sweeper;
