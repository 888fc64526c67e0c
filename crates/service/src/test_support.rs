#![cfg(test)]
use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::{connect_with_config, DATABASE_URL};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> DatabaseConfig {
    DatabaseConfig {
        url: DATABASE_URL.clone(),
        min_connections: 1,
        connect_timeout_secs: 3,
        acquire_timeout_secs: 10,
        ..Default::default()
    }
}

/// Fresh connection for the current test's runtime, or `None` when no database is reachable
/// (or `SKIP_DB_TESTS` is set). Callers return early on `None`.
pub async fn try_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            let db = match connect_with_config(&test_config()).await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    return false;
                }
            };
            if let Err(e) = migration::Migrator::up(&db, None).await {
                eprintln!("skip: migrate up failed: {}", e);
                return false;
            }
            true
        })
        .await;
    if !migrated {
        return None;
    }
    connect_with_config(&test_config()).await.ok()
}

/// Email that no other test run will collide with.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.local", prefix, uuid::Uuid::new_v4().simple())
}
