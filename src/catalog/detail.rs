//! Records with their weak references resolved, for detail screens.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use super::types::{Animal, Breed, Shelter, Species, User};

/// An animal with whatever its references resolved to. Any reference may be
/// `None`: unset, dangling, or unreachable while offline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalDetail {
  pub animal: Animal,
  pub breed: Option<Breed>,
  pub species: Option<Species>,
  pub shelter: Option<Shelter>,
  pub user: Option<User>,
  /// `(years, months)` since the birthday.
  pub age: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelterDetail {
  pub shelter: Shelter,
  pub manager: Option<User>,
}

/// Age in whole years and remaining months, counting 365-day years and
/// 30-day months. `None` for a missing, unparseable or future birthday.
pub fn age_parts(birthday: Option<&str>, today: NaiveDate) -> Option<(u32, u32)> {
  let born = parse_birthday(birthday?)?;
  let days = u32::try_from((today - born).num_days()).ok()?;
  Some((days / 365, (days % 365) / 30))
}

fn parse_birthday(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    .or_else(|| {
      raw
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn age_in_years_and_months() {
    // 2 * 365 + 95 days
    assert_eq!(age_parts(Some("2020-01-01"), day("2022-04-05")), Some((2, 3)));
  }

  #[test]
  fn young_animal_has_zero_years() {
    assert_eq!(age_parts(Some("2024-03-01"), day("2024-05-15")), Some((0, 2)));
  }

  #[test]
  fn accepts_datetime_birthdays() {
    assert_eq!(
      age_parts(Some("2021-06-01T00:00:00Z"), day("2022-06-01")),
      Some((1, 0))
    );
    assert_eq!(
      age_parts(Some("2021-06-01T10:30:00"), day("2022-06-01")),
      Some((1, 0))
    );
  }

  #[test]
  fn rejects_missing_garbage_and_future() {
    let today = day("2024-01-01");
    assert_eq!(age_parts(None, today), None);
    assert_eq!(age_parts(Some("soon"), today), None);
    assert_eq!(age_parts(Some("2030-01-01"), today), None);
  }
}
