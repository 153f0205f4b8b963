// storefront/src/main.rs

use actix_web::{web, App, HttpServer};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storefront::config::AppConfig;
use storefront::state::AppState;
use storefront::web::configure_app_routes;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let config = AppConfig::from_env()?;
  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::from_config(config).await?;

  match app_state.converter.refresh_all().await {
    Ok(count) => tracing::info!(count, "Exchange rates warmed."),
    Err(e) => tracing::warn!(error = %e, "Could not warm exchange rates; cached or 1:1 rates will be used."),
  }

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;
  Ok(())
}
