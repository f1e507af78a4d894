//! Amortization, prepayment projection and IRR of the prepayment

mod state;
mod schedule;
mod original;
mod prepayment;
mod irr;

pub use state::ScheduleState;
pub use schedule::{generate_schedule, AmortizationEntry, PaymentRule, ScheduleSummary};
pub use original::{compute_original, level_payment, OriginalLoan};
pub use prepayment::{project, NewTerm, Projection};
pub use irr::{annualize, npv_at_rate, prepayment_cashflows, solve_irr};
