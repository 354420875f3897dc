//! Admin dashboard UI state as an explicit state machine.
//!
//! `reduce` and `render` are pure: the same state, snapshot and clock always
//! produce the same screen.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Weekday};
use uuid::Uuid;

use crate::analytics::AnalyticsReport;
use crate::calendar::{self, CalendarError, MonthGrid};
use crate::filter::{AppointmentQuery, DatePreset, Stats, StatusFilter};
use crate::models::{Appointment, Role};
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminView {
    Dashboard,
    Analytics,
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Closed,
    Open(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUi {
    pub role: Role,
    pub view: AdminView,
    pub modal: Modal,
    pub query: AppointmentQuery,
    pub analytics_range: DatePreset,
    pub calendar_year: i32,
    pub calendar_month: u32,
    pub week_start: Weekday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminEvent {
    ShowDashboard,
    ShowAnalytics,
    ShowCalendar,
    OpenAppointment(Uuid),
    CloseModal,
    SetStatusFilter(StatusFilter),
    SetDatePreset(DatePreset),
    SetDateFilter(Option<NaiveDate>),
    SetAnalyticsRange(DatePreset),
    PrevMonth,
    NextMonth,
}

impl AdminUi {
    pub fn new(role: Role, today: NaiveDate) -> Self {
        Self {
            role,
            view: AdminView::Dashboard,
            modal: Modal::Closed,
            query: AppointmentQuery::default(),
            analytics_range: DatePreset::Month,
            calendar_year: today.year(),
            calendar_month: today.month(),
            week_start: Weekday::Sun,
        }
    }

    pub fn can_view_analytics(&self) -> bool {
        self.role == Role::Master
    }

    pub fn reduce(mut self, event: AdminEvent) -> Self {
        match event {
            AdminEvent::ShowDashboard => {
                self.view = AdminView::Dashboard;
                self.modal = Modal::Closed;
            }
            AdminEvent::ShowAnalytics => {
                if self.can_view_analytics() {
                    self.view = AdminView::Analytics;
                    self.modal = Modal::Closed;
                } else {
                    tracing::debug!(role = ?self.role, "analytics view denied");
                }
            }
            AdminEvent::ShowCalendar => {
                self.view = AdminView::Calendar;
                self.modal = Modal::Closed;
            }
            AdminEvent::OpenAppointment(id) => self.modal = Modal::Open(id),
            AdminEvent::CloseModal => self.modal = Modal::Closed,
            AdminEvent::SetStatusFilter(status) => self.query.status = status,
            AdminEvent::SetDatePreset(preset) => self.query.preset = preset,
            AdminEvent::SetDateFilter(date) => self.query.date = date,
            AdminEvent::SetAnalyticsRange(range) => self.analytics_range = range,
            AdminEvent::PrevMonth | AdminEvent::NextMonth => {
                let delta = if event == AdminEvent::PrevMonth { -1 } else { 1 };
                let (y, m) = calendar::shift_month(self.calendar_year, self.calendar_month, delta);
                self.calendar_year = y;
                self.calendar_month = m;
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Loading,
    /// Load failed; shown instead of the list.
    Failed(String),
    Dashboard {
        stats: Stats,
        appointments: Vec<Appointment>,
    },
    Calendar(MonthGrid),
    Analytics(AnalyticsReport),
}

#[derive(Debug, Clone)]
pub struct Screen {
    pub view: AdminView,
    pub body: Body,
    pub modal: Option<Appointment>,
    pub loading: bool,
}

pub fn render(
    ui: &AdminUi,
    snapshot: &Snapshot,
    now: &DateTime<FixedOffset>,
) -> Result<Screen, CalendarError> {
    // an id that vanished after a refresh renders as closed
    let modal = match ui.modal {
        Modal::Open(id) => snapshot.get(id).cloned(),
        Modal::Closed => None,
    };

    let body = if let Some(err) = &snapshot.load_error {
        Body::Failed(err.clone())
    } else if snapshot.revision == 0 {
        Body::Loading
    } else {
        match ui.view {
            AdminView::Dashboard => Body::Dashboard {
                stats: snapshot.stats(now),
                appointments: snapshot.filtered(&ui.query, now).into_iter().cloned().collect(),
            },
            AdminView::Calendar => Body::Calendar(calendar::month_grid(
                ui.calendar_year,
                ui.calendar_month,
                &snapshot.appointments,
                now.date_naive(),
                now.offset(),
                ui.week_start,
            )?),
            AdminView::Analytics => {
                Body::Analytics(AnalyticsReport::build(&snapshot.appointments, ui.analytics_range, now))
            }
        }
    };

    Ok(Screen {
        view: ui.view,
        body,
        modal,
        loading: snapshot.loading,
    })
}
