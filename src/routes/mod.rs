use crate::models::AppState;
use axum::Router;

pub mod appointment_routes;
pub mod auth_routes;
pub mod dashboard_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth_routes::router())
        .nest(
            "/api",
            appointment_routes::router().merge(dashboard_routes::router()),
        )
        .with_state(state)
}
