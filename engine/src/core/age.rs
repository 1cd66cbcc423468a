//! Member age on a reference date

use chrono::{Datelike, NaiveDate};

/// Age in whole years on `reference` by last-birthday subtraction.
///
/// `None` when `reference` falls before the date of birth.
pub fn age_on(date_of_birth: NaiveDate, reference: NaiveDate) -> Option<u32> {
    let mut years = reference.year() - date_of_birth.year();
    if (reference.month(), reference.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
