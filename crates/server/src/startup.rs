use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::login_log::repo::SeaOrmLoginLogRepository;
use service::login_log::repository::LoginLogRepository;
use service::member::events::{BroadcastNotifier, UserRegistered};
use service::member::repo::SeaOrmMemberRepository;
use service::member::repository::MemberRepository;
use service::{Deadline, LoginLogService, MemberService};

use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Log every registration announced on the bus until the bus closes.
async fn log_registrations(mut rx: broadcast::Receiver<UserRegistered>) {
    loop {
        match rx.recv().await {
            Ok(ev) => info!(event = ev.name(), member_id = ev.user_id, email = %ev.email, "member_registered"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "registration log subscriber lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Wire repositories, services and routes on top of an open connection.
pub async fn build_app(cfg: &AppConfig, db: sea_orm::DatabaseConnection) -> anyhow::Result<Router> {
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await?;
        info!("migrations applied");
    }

    let deadline = Deadline::from(&cfg.member);
    let notifier = Arc::new(BroadcastNotifier::new(cfg.member.event_capacity));
    tokio::spawn(log_registrations(notifier.subscribe()));

    let member_repo: Arc<dyn MemberRepository> = Arc::new(SeaOrmMemberRepository::new(db.clone()));
    let login_repo: Arc<dyn LoginLogRepository> = Arc::new(SeaOrmLoginLogRepository::new(db));
    let members = MemberService::new(member_repo).with_notifier(notifier).with_deadline(deadline);
    let login_logs = LoginLogService::new(login_repo).with_deadline(deadline);

    Ok(routes::build_router(AppState::new(members, login_logs), build_cors()))
}

/// Public entry: connect, migrate, and run the HTTP server until it stops.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::ping(&db).await?;

    let app = build_app(&cfg, db).await?;

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, "starting member server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
