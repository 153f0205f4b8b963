// storefront/src/bin/mail_relay.rs

use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storefront::config::{AppConfig, RelayTransport};
use storefront::relay::{configure_relay_routes, relay_cors, RelayState};
use storefront::services::{HttpMailTransport, LogMailTransport, MailTransport};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  let config = AppConfig::from_env()?;

  let transport: Arc<dyn MailTransport> = match (config.relay_transport, config.mail_api.clone()) {
    (RelayTransport::Http, Some(settings)) => Arc::new(HttpMailTransport::new(settings)),
    (RelayTransport::Http, None) => {
      anyhow::bail!("RELAY_TRANSPORT=http needs MAIL_API_URL, MAIL_SERVICE_ID, MAIL_TEMPLATE_ID and MAIL_PUBLIC_KEY")
    }
    (RelayTransport::Log, _) => Arc::new(LogMailTransport::new()),
  };

  let state = RelayState {
    transport,
    operator_email: config.operator_email.clone(),
    sender: config.mail_sender.clone(),
  };

  let address = format!("{}:{}", config.server_host, config.relay_port);
  tracing::info!(%address, transport = ?config.relay_transport, "Starting mail relay.");

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(state.clone()))
      .wrap(relay_cors())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_relay_routes)
  })
  .bind(&address)?
  .run()
  .await?;
  Ok(())
}
