//! Whole months between the first payment and the prepayment date

use chrono::{Datelike, NaiveDate};

use crate::error::{AnalysisError, Result};

/// Calendar months from `start` to `end`. A month only counts once its day
/// of month has been reached, so Jan 31 -> Feb 28 is 0 months.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let years = end.year() - start.year();
    let months = end.month() as i32 - start.month() as i32;
    let whole = years * 12 + months;

    if end.day() < start.day() {
        whole - 1
    } else {
        whole
    }
}

/// Months already paid when prepaying on `prepayment_date`
pub fn months_paid(first_payment: NaiveDate, prepayment_date: NaiveDate) -> Result<u32> {
    let months = months_between(first_payment, prepayment_date);
    u32::try_from(months).map_err(|_| {
        AnalysisError::Date(format!(
            "prepayment date {} is before first payment date {}",
            prepayment_date, first_payment
        ))
    })
}
