use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{RateChangeEntry, RateHistory};

/// Select the entry in force on `date`: among entries whose effective date is
/// on or before `date`, the one with the greatest effective date. The baseline
/// always qualifies, so a date before every change resolves to it.
pub fn resolve_entry(history: &RateHistory, date: NaiveDate) -> &RateChangeEntry {
    history
        .entries()
        .iter()
        .filter(|e| e.effective_date.applies_on(date))
        .max_by_key(|e| e.effective_date)
        .unwrap_or_else(|| history.baseline())
}

/// The hourly rate in force on `date`.
pub fn resolve(history: &RateHistory, date: NaiveDate) -> Decimal {
    resolve_entry(history, date).hourly_rate
}
