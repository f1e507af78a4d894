//! Loan parameters and batch loading

mod data;
pub mod loader;

pub use data::{LoanInput, RepaymentMethod, PrepaymentStrategy};
pub use loader::{load_loans, load_loans_from_reader, LoanRecord};
