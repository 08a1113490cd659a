//! Pure recurrence-date computation.

use super::{Recurrence, TaskDomainError};
use chrono::{DateTime, Months, TimeDelta, Utc};

/// Computes the next occurrence date for a recurrence kind.
///
/// Returns `Ok(None)` for [`Recurrence::None`]. Daily and weekly recurrences
/// add one and seven calendar days respectively, preserving the time of day.
/// Monthly recurrence adds one calendar month and clamps day-of-month
/// overflow to the last valid day of the target month (Jan 31 + 1 month is
/// Feb 28, or Feb 29 in leap years).
///
/// # Errors
///
/// Returns [`TaskDomainError::DateOutOfRange`] when the computed date would
/// leave chrono's representable range.
pub fn next_occurrence(
    recurrence: Recurrence,
    from: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, TaskDomainError> {
    let next = match recurrence {
        Recurrence::None => return Ok(None),
        Recurrence::Daily => from.checked_add_signed(TimeDelta::days(1)),
        Recurrence::Weekly => from.checked_add_signed(TimeDelta::days(7)),
        Recurrence::Monthly => from.checked_add_months(Months::new(1)),
    };
    next.map(Some).ok_or(TaskDomainError::DateOutOfRange(from))
}
