// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared date/time helpers.

use chrono::{DateTime, Utc};

/// Whole days elapsed from `start` to `now`, rounded toward negative infinity.
///
/// A `start` in the future yields a negative count.
pub fn whole_days_between(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_seconds().div_euclid(86_400)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_whole_days_floors_partial_days() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(whole_days_between(start, start + Duration::hours(23)), 0);
        assert_eq!(whole_days_between(start, start + Duration::hours(49)), 2);
        assert_eq!(whole_days_between(start, start - Duration::hours(1)), -1);
    }
}
