//! Status/date filtering and aggregate counts over an appointment list.
//!
//! Filters are AND-combined. Calendar dates are taken in the evaluation
//! offset carried by `now`.

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl StatusFilter {
    pub fn status(self) -> Option<AppointmentStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(AppointmentStatus::Pending),
            StatusFilter::Confirmed => Some(AppointmentStatus::Confirmed),
            StatusFilter::Completed => Some(AppointmentStatus::Completed),
            StatusFilter::Cancelled => Some(AppointmentStatus::Cancelled),
        }
    }

    pub fn matches(self, status: AppointmentStatus) -> bool {
        self.status().is_none_or(|wanted| wanted == status)
    }
}

impl From<AppointmentStatus> for StatusFilter {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Pending => StatusFilter::Pending,
            AppointmentStatus::Confirmed => StatusFilter::Confirmed,
            AppointmentStatus::Completed => StatusFilter::Completed,
            AppointmentStatus::Cancelled => StatusFilter::Cancelled,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        AppointmentStatus::parse(s)
            .map(StatusFilter::from)
            .ok_or_else(|| format!("unknown status filter: {s}"))
    }
}

/// Relative window anchored to "now" at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePreset {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl DatePreset {
    pub fn matches(self, start: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> bool {
        match self {
            DatePreset::Today => start.date_naive() == now.date_naive(),
            DatePreset::Week => *start >= *now - Duration::days(7),
            DatePreset::Month => match now.checked_sub_months(Months::new(1)) {
                Some(cutoff) => *start >= cutoff,
                None => true,
            },
            DatePreset::All => true,
        }
    }
}

impl std::str::FromStr for DatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DatePreset::Today),
            "week" => Ok(DatePreset::Week),
            "month" => Ok(DatePreset::Month),
            "all" => Ok(DatePreset::All),
            other => Err(format!("unknown date preset: {other}")),
        }
    }
}

/// The three filter inputs of the dashboard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub status: StatusFilter,
    pub preset: DatePreset,
    pub date: Option<NaiveDate>,
}

impl AppointmentQuery {
    pub fn matches(&self, appt: &Appointment, now: &DateTime<FixedOffset>) -> bool {
        if !self.status.matches(appt.status) {
            return false;
        }
        let start = appt.start_time.with_timezone(&now.timezone());
        if !self.preset.matches(&start, now) {
            return false;
        }
        match self.date {
            Some(day) => start.date_naive() == day,
            None => true,
        }
    }

    /// Matching appointments, ascending by start time. Equal start times
    /// keep their input order.
    pub fn apply<'a>(
        &self,
        appointments: &'a [Appointment],
        now: &DateTime<FixedOffset>,
    ) -> Vec<&'a Appointment> {
        let mut out: Vec<&Appointment> = appointments
            .iter()
            .filter(|a| self.matches(a, now))
            .collect();
        out.sort_by_key(|a| a.start_time);
        out
    }
}

/// Counts over the full, unfiltered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub today: usize,
}

impl Stats {
    pub fn compute(appointments: &[Appointment], now: &DateTime<FixedOffset>) -> Self {
        let today = now.date_naive();
        let mut stats = Stats {
            total: appointments.len(),
            ..Stats::default()
        };
        for a in appointments {
            match a.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
            }
            if local_date(a, now.offset()) == today {
                stats.today += 1;
            }
        }
        stats
    }

    pub fn count(&self, status: AppointmentStatus) -> usize {
        match status {
            AppointmentStatus::Pending => self.pending,
            AppointmentStatus::Confirmed => self.confirmed,
            AppointmentStatus::Completed => self.completed,
            AppointmentStatus::Cancelled => self.cancelled,
        }
    }
}

/// Calendar date of the appointment start in the given offset.
pub fn local_date(appt: &Appointment, offset: &FixedOffset) -> NaiveDate {
    appt.start_time.with_timezone(offset).date_naive()
}
