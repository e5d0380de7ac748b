use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use ses_mail_viewer::{
    app_config,
    config::AppConfig,
    handlers::email::{email_smtp::SmtpForwarder, email_source::SesApiSource},
    utils::utils_transports::create_http_client,
    AppState,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let source = SesApiSource::new(
        create_http_client(config.fetch_timeout)?,
        config.ses_api_url.clone(),
    );
    info!(url = source.url(), "Reading captured mail");

    let state = web::Data::new(AppState {
        source: Arc::new(source),
        forwarder: Arc::new(SmtpForwarder::from_config(&config.relay)),
        extra_columns: config.extra_columns.clone(),
    });

    info!(host = %config.host, port = config.port, "Starting server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(app_config)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
