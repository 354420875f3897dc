//! Month grid for the admin calendar view.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, FixedOffset, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::filter::local_date;
use crate::models::{Appointment, AppointmentStatus};

pub const GRID_CELLS: usize = 42;
pub const VISIBLE_PER_DAY: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("year {0} is out of range")]
    InvalidYear(i32),
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    /// First appointments of the day, by start time.
    pub appointments: Vec<Appointment>,
    /// How many more did not fit.
    pub overflow: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub week_start: Weekday,
    pub cells: Vec<DayCell>,
}

/// Builds the 6-row grid for `(year, month)`. Cancelled appointments are not
/// shown; dates are bucketed in `offset`.
pub fn month_grid(
    year: i32,
    month: u32,
    appointments: &[Appointment],
    today: NaiveDate,
    offset: &FixedOffset,
    week_start: Weekday,
) -> Result<MonthGrid, CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidYear(year))?;

    let lead = (first.weekday().num_days_from_sunday() + 7 - week_start.num_days_from_sunday()) % 7;
    // the whole grid must fit inside chrono's date range
    let grid_start = first
        .checked_sub_days(Days::new(u64::from(lead)))
        .filter(|start| start.checked_add_days(Days::new(GRID_CELLS as u64 - 1)).is_some())
        .ok_or(CalendarError::InvalidYear(year))?;

    let mut by_day: BTreeMap<NaiveDate, Vec<&Appointment>> = BTreeMap::new();
    for appt in appointments
        .iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled)
    {
        by_day.entry(local_date(appt, offset)).or_default().push(appt);
    }

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for date in grid_start.iter_days().take(GRID_CELLS) {
        let mut day = by_day.remove(&date).unwrap_or_default();
        day.sort_by_key(|a| a.start_time);
        let overflow = day.len().saturating_sub(VISIBLE_PER_DAY);

        cells.push(DayCell {
            date,
            in_month: date.month() == month && date.year() == year,
            is_today: date == today,
            appointments: day.into_iter().take(VISIBLE_PER_DAY).cloned().collect(),
            overflow,
        });
    }

    Ok(MonthGrid {
        year,
        month,
        week_start,
        cells,
    })
}

/// `(year, month)` shifted by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
