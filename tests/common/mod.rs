#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, Utc};
use salon_server::{
    auth::{CredentialAuthService, hash_password},
    config::utc,
    db::{MemoryStore, UserStore},
    models::{AppState, Appointment, AppointmentStatus, Role},
    routes,
};
use uuid::Uuid;

pub const OWNER: (&str, &str) = ("owner", "rose-gold");
pub const STYLIST: (&str, &str) = ("mia", "french-tips");

pub fn appointment(start: DateTime<Utc>, status: AppointmentStatus, service: &str) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        client_name: "Ana Costa".into(),
        client_email: "ana@example.com".into(),
        client_phone: Some("+1 555 0100".into()),
        service: service.into(),
        stylist: Some("Mia".into()),
        start_time: start,
        end_time: start + Duration::hours(1),
        status,
        notes: None,
        created_at: Utc::now() - Duration::days(30),
    }
}

/// Three pending and one confirmed appointment, starting tomorrow.
pub fn seed_rows() -> Vec<Appointment> {
    let base = Utc::now() + Duration::days(1);
    vec![
        appointment(base, AppointmentStatus::Pending, "Gel manicure"),
        appointment(base + Duration::hours(1), AppointmentStatus::Pending, "Pedicure"),
        appointment(base + Duration::hours(2), AppointmentStatus::Pending, "Nail art"),
        appointment(base + Duration::hours(3), AppointmentStatus::Confirmed, "Gel manicure"),
    ]
}

pub async fn app_with(rows: Vec<Appointment>) -> Router {
    let store = Arc::new(MemoryStore::with_appointments(rows));
    store
        .create_user(OWNER.0, "Salon Owner", &hash_password(OWNER.1).unwrap(), Role::Master, true)
        .await
        .unwrap();
    store
        .create_user(STYLIST.0, "Mia", &hash_password(STYLIST.1).unwrap(), Role::Stylist, true)
        .await
        .unwrap();

    let state = AppState {
        appointments: store.clone(),
        auth: Arc::new(CredentialAuthService::new(store, 24)),
        utc_offset: utc(),
    };
    routes::router(state)
}
