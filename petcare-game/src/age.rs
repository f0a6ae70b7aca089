//! Pet age derived from the creation timestamp.

use crate::constants::{AGE_MAX, AGE_MIN, MILLIS_PER_WEEK};

/// Age in years for a pet created at `created_at`, evaluated at `now`.
///
/// A pet starts at age 1 and gains one year for every full week since
/// creation, capped at 19. Missing, negative, or future timestamps yield the
/// starting age instead of an error.
#[must_use]
pub fn pet_age(created_at: Option<i64>, now: i64) -> u8 {
    let Some(created_at) = created_at else {
        return AGE_MIN;
    };
    if created_at < 0 || created_at > now {
        return AGE_MIN;
    }

    let weeks = (now - created_at) / MILLIS_PER_WEEK;
    let cap = i64::from(AGE_MAX - AGE_MIN);
    let bonus = u8::try_from(weeks.min(cap)).unwrap_or(AGE_MAX - AGE_MIN);
    AGE_MIN + bonus
}
