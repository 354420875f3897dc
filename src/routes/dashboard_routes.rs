// src/routes/dashboard_routes.rs

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{Datelike, Utc, Weekday};
use serde::Deserialize;

use crate::{
    analytics::AnalyticsReport,
    calendar::{self, MonthGrid},
    error::ApiError,
    filter::DatePreset,
    middleware::auth_context::AuthContext,
    models::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calendar", get(get_calendar))
        .route("/analytics", get(get_analytics))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// `mon` starts weeks on Monday; anything else on Sunday.
    pub week_start: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<DatePreset>,
}

/* ============================================================
   GET /calendar?year=&month=
   ============================================================ */

pub async fn get_calendar(
    State(state): State<AppState>,
    _auth: AuthContext,
    WithRejection(Query(q), _): WithRejection<Query<CalendarQuery>, ApiError>,
) -> Result<Json<MonthGrid>, ApiError> {
    let now = Utc::now().with_timezone(&state.utc_offset);
    let year = q.year.unwrap_or_else(|| now.year());
    let month = q.month.unwrap_or_else(|| now.month());
    let week_start = match q.week_start.as_deref() {
        Some(s) if s.eq_ignore_ascii_case("mon") || s.eq_ignore_ascii_case("monday") => Weekday::Mon,
        _ => Weekday::Sun,
    };

    let appointments = state.appointments.list_all().await?;
    let grid = calendar::month_grid(
        year,
        month,
        &appointments,
        now.date_naive(),
        &state.utc_offset,
        week_start,
    )
    .map_err(|e| ApiError::validation(e.to_string()))?;

    Ok(Json(grid))
}

/* ============================================================
   GET /analytics?range=   (master only)
   ============================================================ */

pub async fn get_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
    WithRejection(Query(q), _): WithRejection<Query<AnalyticsQuery>, ApiError>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    auth.ensure_master()?;

    let now = Utc::now().with_timezone(&state.utc_offset);
    let appointments = state.appointments.list_all().await?;
    let range = q.range.unwrap_or(DatePreset::Month);

    Ok(Json(AnalyticsReport::build(&appointments, range, &now)))
}
