use std::sync::Arc;

use salon_server::{
    auth::CredentialAuthService,
    config::Config,
    db::{self, AppointmentRepo, MemoryStore, PgStore, RepoError, UserStore},
    models::{AppState, Role},
    routes,
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;

    let (appointments, users): (Arc<dyn AppointmentRepo>, Arc<dyn UserStore>) = match &cfg.database_url {
        Some(url) => {
            let store = Arc::new(PgStore::new(db::connect_pg(url).await?));
            (store.clone() as Arc<dyn AppointmentRepo>, store as Arc<dyn UserStore>)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; appointments are kept in memory only");
            let store = Arc::new(MemoryStore::default());
            (store.clone() as Arc<dyn AppointmentRepo>, store as Arc<dyn UserStore>)
        }
    };

    if let Some(seed) = &cfg.seed_admin {
        match users
            .create_user(&seed.username, &seed.username, &seed.password_hash, Role::Master, true)
            .await
        {
            Ok(_) => tracing::info!(username = %seed.username, "seeded master account"),
            Err(RepoError::DuplicateUser(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let state = AppState {
        appointments,
        auth: Arc::new(CredentialAuthService::new(users, cfg.session_ttl_hours)),
        utc_offset: cfg.utc_offset,
    };

    // The booking form and admin dashboard are served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
