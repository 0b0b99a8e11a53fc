//! Business-day calendar arithmetic
//!
//! A business day is Monday through Friday; no holiday calendar is
//! considered. All functions operate on [`NaiveDate`], so a malformed date
//! is unrepresentable here: string input is validated once at the
//! [`parse_day`] boundary and callers keep their original value when it
//! fails to parse.

use chrono::{Datelike, NaiveDate, Weekday};

/// Returns true if the date falls on a Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advances one calendar day.
///
/// `NaiveDate::MAX` is centuries out of range for scheduling input; saturate
/// rather than panic if a caller ever walks there.
fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// Adds `n` business days to a date.
///
/// The walk increments the date first, so the start date itself is never
/// counted: the result is strictly after `date` whenever `n > 0`. With
/// `n == 0` the input is returned unchanged (it does NOT advance to the
/// next business day).
pub fn add_business_days(date: NaiveDate, n: u32) -> NaiveDate {
    let mut current = date;
    let mut added = 0;

    while added < n {
        current = next_day(current);
        if !is_weekend(current) {
            added += 1;
        }
    }

    current
}

/// Counts business days in the inclusive range `[start, end]`.
///
/// Returns 0 when `end < start`.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut count = 0;
    let mut current = start;

    while current <= end {
        if !is_weekend(current) {
            count += 1;
        }
        current = next_day(current);
    }

    count
}

/// Returns the smallest non-weekend date strictly after `date`
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = next_day(date);
    while is_weekend(next) {
        next = next_day(next);
    }
    next
}

/// Lists every business day in the inclusive range `[start, end]`
pub fn business_days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;

    while current <= end {
        if !is_weekend(current) {
            days.push(current);
        }
        current = next_day(current);
    }

    days
}

/// Parses an ISO `YYYY-MM-DD` date.
///
/// This is the single validation boundary for date strings: malformed input
/// yields `None` and the caller falls back to whatever it already had,
/// rather than a malformed date propagating into the arithmetic above.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn weekend_detection() {
        assert!(!is_weekend(day("2024-01-01"))); // Monday
        assert!(!is_weekend(day("2024-01-05"))); // Friday
        assert!(is_weekend(day("2024-01-06"))); // Saturday
        assert!(is_weekend(day("2024-01-07"))); // Sunday
    }

    #[test]
    fn add_zero_business_days_is_identity() {
        let saturday = day("2024-01-06");
        assert_eq!(add_business_days(saturday, 0), saturday);

        let monday = day("2024-01-01");
        assert_eq!(add_business_days(monday, 0), monday);
    }

    #[test]
    fn add_business_days_never_counts_the_start() {
        // Monday + 1 = Tuesday, regardless of Monday being a business day
        assert_eq!(add_business_days(day("2024-01-01"), 1), day("2024-01-02"));
    }

    #[test]
    fn add_business_days_skips_weekends() {
        // Friday + 1 = Monday
        assert_eq!(add_business_days(day("2024-01-05"), 1), day("2024-01-08"));
        // Monday + 5 walks over the weekend to the next Monday
        assert_eq!(add_business_days(day("2024-01-01"), 5), day("2024-01-08"));
        // Saturday + 1 = Monday
        assert_eq!(add_business_days(day("2024-01-06"), 1), day("2024-01-08"));
    }

    #[test]
    fn business_days_between_is_inclusive() {
        // Mon..Fri
        assert_eq!(business_days_between(day("2024-01-01"), day("2024-01-05")), 5);
        // Mon..Mon across a weekend
        assert_eq!(business_days_between(day("2024-01-01"), day("2024-01-08")), 6);
        // single business day
        assert_eq!(business_days_between(day("2024-01-01"), day("2024-01-01")), 1);
        // weekend-only range
        assert_eq!(business_days_between(day("2024-01-06"), day("2024-01-07")), 0);
    }

    #[test]
    fn business_days_between_empty_range_is_zero() {
        assert_eq!(business_days_between(day("2024-01-05"), day("2024-01-01")), 0);
    }

    #[test]
    fn next_business_day_skips_weekend() {
        // Friday -> Monday
        assert_eq!(next_business_day(day("2024-01-05")), day("2024-01-08"));
        // Saturday -> Monday
        assert_eq!(next_business_day(day("2024-01-06")), day("2024-01-08"));
        // Monday -> Tuesday
        assert_eq!(next_business_day(day("2024-01-01")), day("2024-01-02"));
    }

    #[test]
    fn business_days_in_range_lists_weekdays_only() {
        let days = business_days_in_range(day("2024-01-05"), day("2024-01-09"));
        assert_eq!(
            days,
            vec![day("2024-01-05"), day("2024-01-08"), day("2024-01-09")]
        );

        assert!(business_days_in_range(day("2024-01-06"), day("2024-01-07")).is_empty());
        assert!(business_days_in_range(day("2024-01-05"), day("2024-01-01")).is_empty());
    }

    #[test]
    fn parse_day_accepts_iso_dates() {
        assert_eq!(
            parse_day("2024-01-01"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_day(" 2024-01-01 "), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn parse_day_rejects_malformed_input() {
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("not-a-date"), None);
        assert_eq!(parse_day("2024-13-01"), None);
        assert_eq!(parse_day("2024-02-30"), None);
        assert_eq!(parse_day("01/02/2024"), None);
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        // ~8 years on either side of the epoch the app actually schedules in
        (0i64..6000).prop_map(|offset| {
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + chrono::Duration::days(offset)
        })
    }

    proptest! {
        #[test]
        fn add_is_strictly_increasing(d in arb_date(), n in 1u32..200) {
            prop_assert!(add_business_days(d, n) > d);
        }

        #[test]
        fn add_result_is_never_a_weekend(d in arb_date(), n in 1u32..200) {
            prop_assert!(!is_weekend(add_business_days(d, n)));
        }

        #[test]
        fn between_inverts_add_for_business_day_starts(d in arb_date(), n in 1u32..100) {
            // Inclusive counting: the start day contributes 1 when it is a
            // business day, so the span covers n + 1 business days.
            prop_assume!(!is_weekend(d));
            let end = add_business_days(d, n);
            prop_assert_eq!(business_days_between(d, end), n + 1);
        }

        #[test]
        fn next_business_day_is_after_and_on_a_weekday(d in arb_date()) {
            let next = next_business_day(d);
            prop_assert!(next > d);
            prop_assert!(!is_weekend(next));
        }
    }
}
