//! Device depreciation calculator.
//!
//! Pure and deterministic: "today" is injected rather than read from a wall
//! clock. Devices lose 10% of their initial value every completed six-month
//! period and are worth zero after ten periods (five years).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::DeviceType;

/// Average days per month used to convert elapsed days into months.
const DAYS_PER_MONTH: f64 = 30.44;

/// Length of one depreciation period in months.
const PERIOD_MONTHS: f64 = 6.0;

/// Percent of initial value lost per completed period.
const PERCENT_PER_PERIOD: i64 = 10;

/// Completed periods after which the value bottoms out at zero.
const ZERO_VALUE_PERIODS: i64 = 10;

/// Completed six-month periods elapsed between intake and `today`.
pub fn elapsed_periods(intake_date: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - intake_date).num_days().max(0) as f64;
    let months = days / DAYS_PER_MONTH;
    (months / PERIOD_MONTHS).floor() as i64
}

/// Computes the depreciated value of a device.
///
/// A manual override always wins and is returned unchanged. Otherwise the
/// value is `initial * (1 - 10% per completed period)` rounded to two
/// decimals, bottoming out at zero after ten periods. Returns `None` when the
/// initial value or intake date is absent.
pub fn depreciated_value(
    initial_value: Option<Decimal>,
    intake_date: Option<NaiveDate>,
    today: NaiveDate,
    manual_value: bool,
    stored_value: Option<Decimal>,
) -> Option<Decimal> {
    if manual_value {
        return stored_value;
    }

    let initial = initial_value?;
    let intake = intake_date?;

    let periods = elapsed_periods(intake, today);
    if periods >= ZERO_VALUE_PERIODS {
        return Some(Decimal::ZERO);
    }

    let percent = (periods * PERCENT_PER_PERIOD).min(100);
    let remaining = Decimal::from(100 - percent) / Decimal::from(100);
    Some(shared::money::round_currency(initial * remaining))
}

/// Depreciated value gated on the device type: non-tracked types always
/// report "not applicable".
pub fn depreciated_value_for_type(
    device_type: DeviceType,
    initial_value: Option<Decimal>,
    intake_date: Option<NaiveDate>,
    today: NaiveDate,
    manual_value: bool,
    stored_value: Option<Decimal>,
) -> Option<Decimal> {
    if !device_type.is_value_tracked() {
        return None;
    }
    depreciated_value(initial_value, intake_date, today, manual_value, stored_value)
}

/// Whole years elapsed since intake, for display alongside the value.
pub fn age_years(intake_date: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - intake_date).num_days().max(0);
    (days as f64 / 365.25).floor() as i64
}

/// Display form of the device age, capped at "5+".
pub fn age_display(intake_date: NaiveDate, today: NaiveDate) -> String {
    let years = age_years(intake_date, today);
    if years >= 5 {
        "5+".to_string()
    } else {
        years.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_no_periods_keeps_full_value() {
        let value = depreciated_value(
            Some(dec("1000.00")),
            Some(date(2024, 1, 1)),
            date(2024, 3, 1),
            false,
            None,
        );
        assert_eq!(value, Some(dec("1000.00")));
    }

    #[test]
    fn test_one_period_loses_ten_percent() {
        // 200 days is ~6.57 months: one completed period.
        let value = depreciated_value(
            Some(dec("1000.00")),
            Some(date(2024, 1, 1)),
            date(2024, 7, 19),
            false,
            None,
        );
        assert_eq!(value, Some(dec("900.00")));
    }

    #[test]
    fn test_nine_periods_leaves_ten_percent() {
        // 9 periods * 6 months * 30.44 days = 1643.76 days; use 1650.
        let intake = date(2020, 1, 1);
        let today = intake + chrono::Duration::days(1650);
        assert_eq!(elapsed_periods(intake, today), 9);
        let value = depreciated_value(Some(dec("1000.00")), Some(intake), today, false, None);
        assert_eq!(value, Some(dec("100.00")));
    }

    #[test]
    fn test_ten_periods_is_worthless() {
        // 10 periods = 1826.4 days; use 1830.
        let intake = date(2019, 1, 1);
        let today = intake + chrono::Duration::days(1830);
        assert_eq!(elapsed_periods(intake, today), 10);
        let value = depreciated_value(Some(dec("1000.00")), Some(intake), today, false, None);
        assert_eq!(value, Some(Decimal::ZERO));
    }

    #[test]
    fn test_manual_override_wins_regardless_of_age() {
        let intake = date(2010, 1, 1);
        let value = depreciated_value(
            Some(dec("1000.00")),
            Some(intake),
            date(2026, 1, 1),
            true,
            Some(dec("420.00")),
        );
        assert_eq!(value, Some(dec("420.00")));
    }

    #[test]
    fn test_missing_inputs_yield_none() {
        let today = date(2024, 1, 1);
        assert_eq!(depreciated_value(None, Some(today), today, false, None), None);
        assert_eq!(
            depreciated_value(Some(dec("100")), None, today, false, None),
            None
        );
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // 999.99 * 0.9 = 899.991 -> 899.99
        let intake = date(2024, 1, 1);
        let today = intake + chrono::Duration::days(200);
        let value = depreciated_value(Some(dec("999.99")), Some(intake), today, false, None);
        assert_eq!(value, Some(dec("899.99")));
    }

    #[test]
    fn test_type_gate() {
        let today = date(2024, 6, 1);
        let args = (Some(dec("500.00")), Some(date(2024, 1, 1)), today, false, None);
        assert!(depreciated_value_for_type(
            DeviceType::Laptop,
            args.0,
            args.1,
            args.2,
            args.3,
            args.4
        )
        .is_some());
        for device_type in [DeviceType::Sim, DeviceType::Tv, DeviceType::Accesorio] {
            assert_eq!(
                depreciated_value_for_type(device_type, args.0, args.1, args.2, args.3, args.4),
                None
            );
        }
    }

    #[test]
    fn test_age_display_caps_at_five_plus() {
        let intake = date(2018, 1, 1);
        assert_eq!(age_display(intake, date(2019, 6, 1)), "1");
        assert_eq!(age_display(intake, date(2026, 1, 1)), "5+");
    }
}
