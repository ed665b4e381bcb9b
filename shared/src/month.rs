//! Month navigation for the calendar view.
//!
//! The view is identified by an anchor date carried in the `month` query
//! parameter as `YYYY-M` (no zero padding). Previous/next links reuse the
//! same key.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::models::{Event, EventView};
use crate::{Error, Result};

/// Query-string key holding the displayed month.
pub const MONTH_PARAM: &str = "month";

/// Years a `month` parameter may name.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Anchor date for the requested month, or today when no month is given.
pub fn anchor_date(param: Option<&str>) -> Result<NaiveDate> {
    anchor_date_at(param, Utc::now().date_naive())
}

/// Same as [`anchor_date`] with an explicit `today`.
///
/// A present month is pinned to day 1; `today` is returned as is.
pub fn anchor_date_at(param: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match param {
        Some(raw) if !raw.is_empty() => parse_month(raw),
        _ => Ok(today),
    }
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    let malformed = || Error::MalformedMonth(raw.to_string());

    let mut parts = raw.split('-');
    let (year, month) = match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), None) => (year, month),
        _ => return Err(malformed()),
    };
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let month: u32 = month.parse().map_err(|_| malformed())?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(malformed());
    }

    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    d - Duration::days(i64::from(d.day0()))
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Day 1 of the month after `d`'s month, if chrono can represent it.
fn first_of_next_month(d: NaiveDate) -> Option<NaiveDate> {
    let last_day = Duration::days(i64::from(days_in_month(d.year(), d.month())) - 1);
    first_of_month(d).checked_add_signed(last_day)?.succ_opt()
}

/// Only months the parser accepts back are turned into links.
fn month_param(d: NaiveDate) -> Option<String> {
    (MIN_YEAR..=MAX_YEAR)
        .contains(&d.year())
        .then(|| format!("{}={}-{}", MONTH_PARAM, d.year(), d.month()))
}

/// `month=YYYY-M` for the month before `d`'s month, `None` before year 1.
pub fn previous_month_param(d: NaiveDate) -> Option<String> {
    first_of_month(d).pred_opt().and_then(month_param)
}

/// `month=YYYY-M` for the month after `d`'s month, `None` past year 9999.
pub fn next_month_param(d: NaiveDate) -> Option<String> {
    first_of_next_month(d).and_then(month_param)
}

/// Half-open UTC interval covering `d`'s month.
pub fn month_bounds(d: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let next = first_of_next_month(d)?;
    Some((
        first_of_month(d).and_time(NaiveTime::MIN).and_utc(),
        next.and_time(NaiveTime::MIN).and_utc(),
    ))
}

/// One cell of the month grid. `day` is `None` for padding outside the month.
#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub day: Option<u32>,
    pub events: Vec<EventView>,
}

/// Monday-first weeks of a month with events placed on their start day.
#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayCell>>,
}

pub fn month_grid(anchor: NaiveDate, events: &[Event]) -> MonthGrid {
    let first = first_of_month(anchor);
    let days = days_in_month(anchor.year(), anchor.month());
    let lead = first.weekday().num_days_from_monday();

    let mut cells: Vec<DayCell> = (0..lead)
        .map(|_| DayCell { day: None, events: Vec::new() })
        .collect();

    for day in 1..=days {
        let events = events
            .iter()
            .filter(|e| {
                let start = e.start_time.date_naive();
                start.year() == anchor.year() && start.month() == anchor.month() && start.day() == day
            })
            .map(EventView::from)
            .collect();
        cells.push(DayCell { day: Some(day), events });
    }

    while cells.len() % 7 != 0 {
        cells.push(DayCell { day: None, events: Vec::new() });
    }

    MonthGrid {
        year: anchor.year(),
        month: anchor.month(),
        weeks: cells.chunks(7).map(<[DayCell]>::to_vec).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_anchor_is_first_of_month() {
        for (raw, expected) in [
            ("2023-12", date(2023, 12, 1)),
            ("2024-1", date(2024, 1, 1)),
            ("2024-02", date(2024, 2, 1)),
            ("1999-7", date(1999, 7, 1)),
        ] {
            assert_eq!(anchor_date(Some(raw)).unwrap(), expected);
        }
    }

    #[test]
    fn test_anchor_defaults_to_today() {
        let today = date(2026, 10, 19);
        assert_eq!(anchor_date_at(None, today).unwrap(), today);
        assert_eq!(anchor_date_at(Some(""), today).unwrap(), today);
    }

    #[test]
    fn test_malformed_month() {
        for raw in [
            "2023", "2023-13", "2023-0", "2023-1-5", "abcd-1", "2023-x", "-2023-1", "0-1",
            "10000-1", "262142-12",
        ] {
            let err = anchor_date(Some(raw)).unwrap_err();
            assert!(matches!(err, Error::MalformedMonth(ref s) if s == raw), "{}", raw);
        }
    }

    #[test]
    fn test_links_roll_over_year() {
        assert_eq!(
            next_month_param(anchor_date(Some("2023-12")).unwrap()).as_deref(),
            Some("month=2024-1")
        );
        assert_eq!(
            previous_month_param(anchor_date(Some("2024-1")).unwrap()).as_deref(),
            Some("month=2023-12")
        );
    }

    #[test]
    fn test_links_from_mid_month() {
        let d = date(2024, 3, 31);
        assert_eq!(previous_month_param(d).as_deref(), Some("month=2024-2"));
        assert_eq!(next_month_param(d).as_deref(), Some("month=2024-4"));
        let d = date(2023, 1, 15);
        assert_eq!(previous_month_param(d).as_deref(), Some("month=2022-12"));
    }

    #[test]
    fn test_links_stop_at_supported_years() {
        let first = anchor_date(Some("1-1")).unwrap();
        assert_eq!(previous_month_param(first), None);
        assert_eq!(next_month_param(first).as_deref(), Some("month=1-2"));

        let last = anchor_date(Some("9999-12")).unwrap();
        assert_eq!(next_month_param(last), None);
        assert_eq!(previous_month_param(last).as_deref(), Some("month=9999-11"));

        // Every emitted link parses back.
        for link in [next_month_param(first), previous_month_param(last)].into_iter().flatten() {
            let raw = link.trim_start_matches("month=");
            assert!(anchor_date(Some(raw)).is_ok(), "{}", link);
        }
    }

    #[test]
    fn test_edges_of_chrono_range_do_not_panic() {
        assert_eq!(month_bounds(NaiveDate::MAX), None);
        assert_eq!(next_month_param(NaiveDate::MAX), None);
        assert_eq!(previous_month_param(NaiveDate::MIN), None);
        assert!(month_bounds(date(9999, 12, 31)).is_some());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_month_bounds() {
        let (from, to) = month_bounds(date(2023, 12, 20)).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_grid_layout_and_placement() {
        let start = Utc.with_ymd_and_hms(2024, 2, 14, 18, 0, 0).unwrap();
        let event = Event {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Dinner".to_string(),
            description: String::new(),
            start_time: start,
            end_time: start + Duration::hours(2),
            created_at: start,
        };

        // February 2024 starts on a Thursday and has 29 days.
        let grid = month_grid(date(2024, 2, 1), &[event]);
        assert_eq!((grid.year, grid.month), (2024, 2));
        assert_eq!(grid.weeks.len(), 5);
        assert!(grid.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(grid.weeks[0][2].day, None);
        assert_eq!(grid.weeks[0][3].day, Some(1));
        assert_eq!(grid.weeks[4][3].day, Some(29));
        assert_eq!(grid.weeks[4][4].day, None);

        let placed: Vec<u32> = grid
            .weeks
            .iter()
            .flatten()
            .filter(|c| !c.events.is_empty())
            .filter_map(|c| c.day)
            .collect();
        assert_eq!(placed, vec![14]);
    }
}
