mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use salon_server::{
    admin_view::{AdminEvent, AdminUi, Body, render},
    client::{AppointmentsApi, HttpAppointmentsApi},
    config::utc,
    filter::{AppointmentQuery, DatePreset, StatusFilter},
    models::{AppointmentStatus, NewAppointment, Role},
    store::{AppointmentStore, NoticeKind, RemoveOutcome, StoreError},
};
use tokio::sync::oneshot;

use common::{OWNER, STYLIST, app_with, seed_rows};

struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Server {
    async fn start(rows: Vec<salon_server::models::Appointment>) -> Self {
        let app = app_with(rows).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });
        Server {
            addr,
            shutdown: Some(tx),
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn api_as(&self, (username, password): (&str, &str)) -> HttpAppointmentsApi {
        let mut api = HttpAppointmentsApi::new(self.url());
        api.login(username, password).await.unwrap();
        api
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[tokio::test]
async fn confirming_over_http_moves_one_count() {
    let rows = seed_rows();
    let target = rows[1].id;
    let server = Server::start(rows).await;
    let store = AppointmentStore::new(Arc::new(server.api_as(STYLIST).await));
    let now = Utc::now().with_timezone(&utc());

    store.refresh().await.unwrap();
    let before = store.snapshot().await.stats(&now);
    assert_eq!((before.pending, before.confirmed, before.total), (3, 1, 4));

    store.update_status(target, AppointmentStatus::Confirmed).await.unwrap();

    let after = store.snapshot().await.stats(&now);
    assert_eq!((after.pending, after.confirmed, after.total), (2, 2, 4));
}

#[tokio::test]
async fn removal_over_http_needs_confirmation() {
    let rows = seed_rows();
    let target = rows[2].id;
    let server = Server::start(rows).await;
    let store = AppointmentStore::new(Arc::new(server.api_as(OWNER).await));
    store.refresh().await.unwrap();

    let declined = store.remove(target, &|_: &salon_server::models::Appointment| false).await.unwrap();
    assert_eq!(declined, RemoveOutcome::Declined);
    assert_eq!(store.snapshot().await.appointments.len(), 4);

    let removed = store.remove(target, &|_: &salon_server::models::Appointment| true).await.unwrap();
    assert_eq!(removed, RemoveOutcome::Removed);

    let snap = store.snapshot().await;
    assert_eq!(snap.appointments.len(), 3);
    assert!(snap.get(target).is_none());
}

#[tokio::test]
async fn server_errors_surface_as_store_errors() {
    let server = Server::start(seed_rows()).await;

    // No login: the list endpoint answers 401.
    let anonymous = AppointmentStore::new(Arc::new(HttpAppointmentsApi::new(server.url())));
    let err = anonymous.refresh().await.unwrap_err();
    assert_eq!(err, StoreError::FetchFailure("server answered 401".into()));
    assert!(anonymous.snapshot().await.load_error.is_some());

    let store = AppointmentStore::new(Arc::new(server.api_as(STYLIST).await));
    store.refresh().await.unwrap();
    let before = store.snapshot().await.appointments;

    // Loaded id, but deleted behind the store's back.
    let gone = before[0].id;
    server.api_as(OWNER).await.delete(gone).await.unwrap();
    let err = store.update_status(gone, AppointmentStatus::Completed).await.unwrap_err();
    assert!(matches!(err, StoreError::MutationFailure(_)));
    assert_eq!(store.snapshot().await.appointments, before);
    assert_eq!(store.take_notices().await[0].kind, NoticeKind::Error);
}

#[tokio::test]
async fn booked_appointment_shows_up_in_the_dashboard() {
    let server = Server::start(vec![]).await;
    let public = HttpAppointmentsApi::new(server.url());
    let start = Utc::now() + Duration::hours(2);
    let booked = public
        .book(&NewAppointment {
            client_name: "Lena".into(),
            client_email: "lena@example.com".into(),
            client_phone: None,
            service: "Pedicure".into(),
            stylist: None,
            start_time: start,
            end_time: start + Duration::minutes(45),
            notes: Some("sensitive skin".into()),
        })
        .await
        .unwrap();

    let store = AppointmentStore::new(Arc::new(server.api_as(STYLIST).await));
    store.refresh().await.unwrap();

    let now = Utc::now().with_timezone(&utc());
    let snap = store.snapshot().await;
    let pending_week = AppointmentQuery {
        status: StatusFilter::Pending,
        preset: DatePreset::Week,
        date: None,
    };
    let shown = snap.filtered(&pending_week, &now);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, booked.id);

    let ui = AdminUi::new(Role::Stylist, now.date_naive()).reduce(AdminEvent::OpenAppointment(booked.id));
    let screen = render(&ui, &snap, &now).unwrap();
    assert_eq!(screen.modal.map(|a| a.notes), Some(Some("sensitive skin".to_string())));
    assert!(matches!(screen.body, Body::Dashboard { .. }));
}
