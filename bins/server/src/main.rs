use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use common::utils::logging::init_logging;
use configs::AppConfig;

fn main() -> anyhow::Result<()> {
    // .env may carry DATABASE_URL and RUST_LOG
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    init_logging(&cfg.logging.format);

    let instance_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "member", event = "panic", %instance_id, pid, message = %info, "unhandled panic occurred");
    }));

    let workers = cfg.server.worker_threads.unwrap_or(4);
    info!(service = "member", event = "start", %instance_id, pid, version, workers, "member service starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()?;
    let result = runtime.block_on(server::run(cfg));

    match &result {
        Ok(()) => info!(service = "member", event = "stop", %instance_id, pid, "member service stopped"),
        Err(e) => error!(service = "member", event = "stop", %instance_id, pid, error = %e, "member service failed"),
    }
    result
}
