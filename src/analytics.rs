//! Aggregate report behind the admin analytics view.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

use crate::filter::{DatePreset, Stats};
use crate::models::{Appointment, AppointmentStatus};

pub const UNASSIGNED_STYLIST: &str = "Unassigned";
const TOP_SERVICES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StylistLoad {
    pub stylist: String,
    pub booked: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub range: DatePreset,
    pub status: Stats,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub top_services: Vec<ServiceCount>,
    pub stylists: Vec<StylistLoad>,
    /// Sunday first.
    pub by_weekday: [usize; 7],
    pub by_hour: [usize; 24],
    pub busiest_day: Option<NaiveDate>,
}

impl AnalyticsReport {
    pub fn build(appointments: &[Appointment], range: DatePreset, now: &DateTime<FixedOffset>) -> Self {
        let offset = now.timezone();
        let in_range: Vec<Appointment> = appointments
            .iter()
            .filter(|a| range.matches(&a.start_time.with_timezone(&offset), now))
            .cloned()
            .collect();

        let status = Stats::compute(&in_range, now);
        let rate = |n: usize| {
            if status.total == 0 {
                0.0
            } else {
                n as f64 / status.total as f64
            }
        };

        let mut services: HashMap<&str, usize> = HashMap::new();
        let mut stylists: HashMap<&str, StylistLoad> = HashMap::new();
        let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
        let mut by_weekday = [0usize; 7];
        let mut by_hour = [0usize; 24];

        for a in &in_range {
            *services.entry(a.service.as_str()).or_default() += 1;

            let name = a.stylist.as_deref().unwrap_or(UNASSIGNED_STYLIST);
            let load = stylists.entry(name).or_insert_with(|| StylistLoad {
                stylist: name.to_string(),
                booked: 0,
                completed: 0,
            });
            load.booked += 1;
            if a.status == AppointmentStatus::Completed {
                load.completed += 1;
            }

            let local = a.start_time.with_timezone(&offset);
            by_weekday[local.weekday().num_days_from_sunday() as usize] += 1;
            by_hour[local.hour() as usize] += 1;
            *per_day.entry(local.date_naive()).or_default() += 1;
        }

        let mut top_services: Vec<ServiceCount> = services
            .into_iter()
            .map(|(service, count)| ServiceCount {
                service: service.to_string(),
                count,
            })
            .collect();
        top_services.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.service.cmp(&b.service)));
        top_services.truncate(TOP_SERVICES);

        let mut stylists: Vec<StylistLoad> = stylists.into_values().collect();
        stylists.sort_by(|a, b| b.booked.cmp(&a.booked).then_with(|| a.stylist.cmp(&b.stylist)));

        // max count, earliest date on tie
        let busiest_day = per_day
            .into_iter()
            .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then_with(|| db.cmp(da)))
            .map(|(day, _)| day);

        AnalyticsReport {
            range,
            completion_rate: rate(status.completed),
            cancellation_rate: rate(status.cancelled),
            status,
            top_services,
            stylists,
            by_weekday,
            by_hour,
            busiest_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fixtures::{appt, now_utc};
    use crate::models::AppointmentStatus::*;

    fn styled(start: &str, status: AppointmentStatus, service: &str, stylist: Option<&str>) -> Appointment {
        let mut a = appt(start, status);
        a.service = service.into();
        a.stylist = stylist.map(str::to_string);
        a
    }

    fn sample() -> Vec<Appointment> {
        vec![
            styled("2026-10-12T09:00:00Z", Completed, "Gel manicure", Some("Mia")),
            styled("2026-10-12T10:00:00Z", Completed, "Pedicure", Some("Mia")),
            styled("2026-10-13T10:00:00Z", Cancelled, "Gel manicure", Some("Lea")),
            styled("2026-10-15T14:00:00Z", Confirmed, "Nail art", None),
            styled("2026-10-16T10:00:00Z", Pending, "Gel manicure", Some("Lea")),
            styled("2026-07-01T10:00:00Z", Completed, "Pedicure", Some("Mia")),
        ]
    }

    #[test]
    fn week_report() {
        let now = now_utc("2026-10-16T12:00:00Z");
        let report = AnalyticsReport::build(&sample(), DatePreset::Week, &now);

        assert_eq!(report.status.total, 5);
        assert!((report.completion_rate - 0.4).abs() < f64::EPSILON);
        assert!((report.cancellation_rate - 0.2).abs() < f64::EPSILON);

        assert_eq!(
            report.top_services[0],
            ServiceCount { service: "Gel manicure".into(), count: 3 }
        );
        // ties sort by name
        assert_eq!(report.top_services[1].service, "Nail art");

        assert_eq!(report.stylists[0].stylist, "Lea");
        assert_eq!(report.stylists[0].booked, 2);
        assert_eq!(report.stylists[1], StylistLoad { stylist: "Mia".into(), booked: 2, completed: 2 });
        assert!(report.stylists.iter().any(|s| s.stylist == UNASSIGNED_STYLIST));

        // 2026-10-12 is a Monday.
        assert_eq!(report.by_weekday[1], 2);
        assert_eq!(report.by_hour[10], 3);
        assert_eq!(report.busiest_day, NaiveDate::from_ymd_opt(2026, 10, 12));
    }

    #[test]
    fn all_range_includes_old_bookings() {
        let now = now_utc("2026-10-16T12:00:00Z");
        let report = AnalyticsReport::build(&sample(), DatePreset::All, &now);
        assert_eq!(report.status.total, 6);
        assert_eq!(report.by_weekday.iter().sum::<usize>(), 6);
    }

    #[test]
    fn empty_list_has_zero_rates() {
        let now = now_utc("2026-10-16T12:00:00Z");
        let report = AnalyticsReport::build(&[], DatePreset::Month, &now);
        assert_eq!(report.status.total, 0);
        assert_eq!(report.completion_rate, 0.0);
        assert!(report.top_services.is_empty());
        assert_eq!(report.busiest_day, None);
    }
}
