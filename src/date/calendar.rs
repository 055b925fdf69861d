//! Calendar construction by offsets
//!
//! Some site grammars build dates by rolling the proleptic epoch
//! `0001-01-01` forward by a number of years, months and days instead of
//! setting the fields directly. Out-of-range fields roll over into the next
//! unit (day 31 of November becomes December 1st), and months roll before days.

use chrono::{Duration, Months, NaiveDate};

/// Rolls `0001-01-01` forward by the given offsets
///
/// Returns `None` when the result falls outside chrono's supported range.
pub fn from_offsets(years: i64, months: i64, days: i64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1, 1, 1)?;

    let total_months = years.checked_mul(12)?.checked_add(months)?;
    let shifted = if total_months >= 0 {
        epoch.checked_add_months(Months::new(u32::try_from(total_months).ok()?))?
    } else {
        epoch.checked_sub_months(Months::new(u32::try_from(-total_months).ok()?))?
    };

    shifted.checked_add_signed(Duration::try_days(days)?)
}

/// Builds the calendar date `year-month-day`, rolling over invalid fields
///
/// Equivalent to offsetting the epoch by `(year - 1, month - 1, day - 1)`.
pub fn absolute(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    from_offsets(year.checked_sub(1)?, month.checked_sub(1)?, day.checked_sub(1)?)
}

/// Offsets the epoch by the raw `(year, month, day)` fields
///
/// This lands one year, one month and one day past the literal date. The
/// ggbet grammar has always stored numeric dates this way and downstream
/// consumers rely on it, so it is kept as-is.
pub fn shifted(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    from_offsets(year, month, day)
}
