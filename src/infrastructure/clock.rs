use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::direct_debit::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
  pub fn new(at: DateTime<Utc>) -> Self {
    Self(at)
  }

  /// Morning of `date`, UTC.
  pub fn on(date: NaiveDate) -> Self {
    Self(date.and_hms_opt(8, 30, 0).unwrap_or_default().and_utc())
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fixed_clock() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let clock = FixedClock::on(date);
    assert_eq!(clock.today(), date);
    assert_eq!(clock.now(), clock.now());
  }
}
