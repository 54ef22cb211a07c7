pub mod api;
pub mod config;
pub mod serial;
pub mod state;

use anyhow::Context;
use config::ServerSettings;
use state::AppState;

/// Start the HTTP API and serve until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
  let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

  let settings = ServerSettings::load().context("failed to load server settings")?;
  let app = api::router(AppState::default());

  let addr = settings.socket_addr();
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .with_context(|| format!("failed to bind {}", addr))?;

  log::info!("Backend HTTP API listening on http://{}", addr);
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  log::info!("Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    log::error!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
  log::info!("Shutdown signal received...");
}
