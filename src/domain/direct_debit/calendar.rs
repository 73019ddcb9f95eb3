//! TARGET2 calendar used to pick collection dates.
//!
//! Banks only settle SEPA collections on TARGET2 business days: weekends,
//! New Year's Day, Good Friday, Easter Monday, Labour Day and the two
//! Christmas days are closed.

use chrono::{Datelike, Days, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCalendar {
  lead_days: u32,
}

impl CollectionCalendar {
  pub fn new(lead_days: u32) -> Self {
    Self { lead_days }
  }

  pub fn lead_days(&self) -> u32 {
    self.lead_days
  }

  pub fn is_business_day(date: NaiveDate) -> bool {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
      return false;
    }

    let easter = easter_sunday(date.year());
    let good_friday = easter - Days::new(2);
    let easter_monday = easter + Days::new(1);

    !matches!((date.month(), date.day()), (1, 1) | (5, 1) | (12, 25) | (12, 26))
      && date != good_friday
      && date != easter_monday
  }

  /// First business day on or after `date`.
  pub fn roll_forward(date: NaiveDate) -> NaiveDate {
    let mut date = date;
    while !Self::is_business_day(date) {
      date = date + Days::new(1);
    }
    date
  }

  /// Earliest collection date for a file sent on `today`: `lead_days` business
  /// days later (today itself never counts).
  pub fn earliest_collection_date(&self, today: NaiveDate) -> NaiveDate {
    let mut date = today;
    let mut remaining = self.lead_days;
    loop {
      date = date + Days::new(1);
      if Self::is_business_day(date) {
        if remaining <= 1 {
          return date;
        }
        remaining -= 1;
      }
    }
  }

  /// Collection date for an invoice when the operator did not ask for one:
  /// its own debit date when that is still reachable, else the earliest date.
  pub fn default_collection_date(
    &self,
    today: NaiveDate,
    debit_date: Option<NaiveDate>,
  ) -> NaiveDate {
    let earliest = self.earliest_collection_date(today);
    match debit_date {
      Some(d) if d >= earliest => Self::roll_forward(d),
      _ => earliest,
    }
  }
}

// Anonymous Gregorian algorithm (Meeus/Jones/Butcher)
fn easter_sunday(year: i32) -> NaiveDate {
  let a = year % 19;
  let b = year / 100;
  let c = year % 100;
  let d = b / 4;
  let e = b % 4;
  let f = (b + 8) / 25;
  let g = (b - f + 1) / 3;
  let h = (19 * a + b - d - g + 15) % 30;
  let i = c / 4;
  let k = c % 4;
  let l = (32 + 2 * e + 2 * i - h - k) % 7;
  let m = (a + 11 * h + 22 * l) / 451;
  let month = (h + l - 7 * m + 114) / 31;
  let day = (h + l - 7 * m + 114) % 31 + 1;
  NaiveDate::from_ymd_opt(year, month as u32, day as u32).unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_easter() {
    assert_eq!(easter_sunday(2024), date(2024, 3, 31));
    assert_eq!(easter_sunday(2025), date(2025, 4, 20));
    assert_eq!(easter_sunday(2026), date(2026, 4, 5));
  }

  #[test]
  fn test_closing_days() {
    assert!(!CollectionCalendar::is_business_day(date(2024, 6, 15))); // Saturday
    assert!(!CollectionCalendar::is_business_day(date(2024, 3, 29))); // Good Friday
    assert!(!CollectionCalendar::is_business_day(date(2024, 4, 1))); // Easter Monday
    assert!(!CollectionCalendar::is_business_day(date(2024, 5, 1)));
    assert!(!CollectionCalendar::is_business_day(date(2024, 12, 26)));
    assert!(CollectionCalendar::is_business_day(date(2024, 6, 14)));
  }

  #[test]
  fn test_earliest_collection_date_skips_weekend() {
    let calendar = CollectionCalendar::new(2);
    // Thursday + 2 business days = Monday
    assert_eq!(
      calendar.earliest_collection_date(date(2024, 6, 13)),
      date(2024, 6, 17)
    );
    // Thursday before Easter 2024: Good Friday and Easter Monday are closed
    assert_eq!(
      calendar.earliest_collection_date(date(2024, 3, 28)),
      date(2024, 4, 3)
    );
  }

  #[test]
  fn test_zero_lead_days_means_next_business_day() {
    let calendar = CollectionCalendar::new(0);
    assert_eq!(
      calendar.earliest_collection_date(date(2024, 6, 14)),
      date(2024, 6, 17)
    );
  }

  #[test]
  fn test_default_collection_date() {
    let calendar = CollectionCalendar::new(2);
    let today = date(2024, 6, 10);

    assert_eq!(
      calendar.default_collection_date(today, None),
      date(2024, 6, 12)
    );
    // Too early: clamped
    assert_eq!(
      calendar.default_collection_date(today, Some(date(2024, 6, 11))),
      date(2024, 6, 12)
    );
    // Later debit date on a Saturday rolls to Monday
    assert_eq!(
      calendar.default_collection_date(today, Some(date(2024, 6, 22))),
      date(2024, 6, 24)
    );
  }
}
