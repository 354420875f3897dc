// src/routes/appointment_routes.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{
        AppState, Appointment, AppointmentList, DeleteQuery, DeleteResponse, NewAppointment,
        StatusUpdate,
    },
};

const MAX_FIELD_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 2000;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/appointments",
        get(list_appointments)
            .post(create_appointment)
            .patch(update_status)
            .delete(delete_appointment),
    )
}

/* ============================================================
   GET /appointments
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<AppointmentList>, ApiError> {
    let appointments = state.appointments.list_all().await?;
    Ok(Json(AppointmentList { appointments }))
}

/* ============================================================
   POST /appointments (public booking)
   ============================================================ */

fn validate_booking(req: &mut NewAppointment) -> Result<(), ApiError> {
    req.client_name = req.client_name.trim().to_string();
    req.client_email = req.client_email.trim().to_string();
    req.service = req.service.trim().to_string();

    for (field, value) in [
        ("clientName", &req.client_name),
        ("clientEmail", &req.client_email),
        ("service", &req.service),
    ] {
        if value.is_empty() {
            return Err(ApiError::validation(format!("{field} is required")));
        }
        if value.len() > MAX_FIELD_LEN {
            return Err(ApiError::validation(format!("{field} is too long")));
        }
    }
    if !req.client_email.contains('@') {
        return Err(ApiError::validation("clientEmail must be an email address"));
    }
    if req.notes.as_ref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        return Err(ApiError::validation("notes is too long"));
    }
    if req.end_time <= req.start_time {
        return Err(ApiError::validation("endTime must be after startTime"));
    }

    // blank optionals are stored as absent
    for opt in [&mut req.client_phone, &mut req.stylist, &mut req.notes] {
        if opt.as_deref().is_some_and(|s| s.trim().is_empty()) {
            *opt = None;
        }
    }
    Ok(())
}

pub async fn create_appointment(
    State(state): State<AppState>,
    WithRejection(Json(mut req), _): WithRejection<Json<NewAppointment>, ApiError>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    validate_booking(&mut req)?;

    let created = state.appointments.insert(req, Utc::now()).await?;
    tracing::info!(id = %created.id, service = %created.service, start = %created.start_time, "appointment booked");
    Ok((StatusCode::CREATED, Json(created)))
}

/* ============================================================
   PATCH /appointments  { id, status }
   ============================================================ */

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthContext,
    WithRejection(Json(req), _): WithRejection<Json<StatusUpdate>, ApiError>,
) -> Result<Json<Appointment>, ApiError> {
    let updated = state
        .appointments
        .update_status(req.id, req.status)
        .await?
        .ok_or_else(ApiError::appointment_not_found)?;

    tracing::info!(
        id = %req.id,
        status = %req.status,
        by = %auth.session.user.username,
        "appointment status updated"
    );
    Ok(Json(updated))
}

/* ============================================================
   DELETE /appointments?id=
   ============================================================ */

pub async fn delete_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    WithRejection(Query(q), _): WithRejection<Query<DeleteQuery>, ApiError>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !state.appointments.delete(q.id).await? {
        return Err(ApiError::appointment_not_found());
    }
    tracing::info!(id = %q.id, by = %auth.session.user.username, "appointment deleted");
    Ok(Json(DeleteResponse { success: true }))
}
