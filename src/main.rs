pub mod config;
pub mod health;
pub mod modules;
pub use modules::email;
pub use modules::verification;

use crate::config::{AppConfig, MailProvider};
use crate::email::adapter::outgoing::mailgun_sender::MailgunEmailSender;
use crate::email::adapter::outgoing::smtp_sender::SmtpEmailSender;
use crate::email::application::ports::outgoing::{EmailSender, MailSendError};
use crate::verification::adapter::incoming::delivery_dedup::DeliveryDeduplicator;
use crate::verification::adapter::outgoing::verification_store_postgres::VerificationStorePostgres;
use crate::verification::application::use_cases::dispatch_verification_email::{
    DispatchSettings, DispatchVerificationEmailUseCase, IDispatchVerificationEmailUseCase,
};

use actix_web::{web, App, HttpServer};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub dispatch_verification_email_use_case: Arc<dyn IDispatchVerificationEmailUseCase + Send + Sync>,
    pub delivery_deduplicator: Arc<DeliveryDeduplicator>,
}

fn build_email_sender(config: &AppConfig) -> Result<Arc<dyn EmailSender>, MailSendError> {
    match config.mail_provider {
        MailProvider::Mailgun => {
            let sender = MailgunEmailSender::new(
                &config.mailgun,
                &config.mail_from,
                config.mail_send_timeout,
            )?;
            Ok(Arc::new(sender))
        }
        MailProvider::Smtp => {
            let smtp = &config.smtp;
            let sender = match (&smtp.username, &smtp.password) {
                (Some(user), Some(pass)) => {
                    SmtpEmailSender::new(&smtp.host, smtp.port, user, pass, &config.mail_from)?
                }
                // Local relay (Mailpit, MailHog, etc.)
                _ => SmtpEmailSender::new_local(&smtp.host, smtp.port, &config.mail_from),
            };
            Ok(Arc::new(sender))
        }
    }
}

fn dispatch_settings(config: &AppConfig) -> DispatchSettings {
    DispatchSettings {
        verify_email_link: config.verify_email_link.clone(),
        expiry_window: chrono::Duration::milliseconds(config.expiry_window_ms),
        mail_timeout: config.mail_send_timeout,
        store_timeout: config.store_timeout,
    }
}

#[actix_web::main]
#[cfg(not(tarpaulin_include))]
async fn start() -> std::io::Result<()> {
    // Environment variable loading
    let env = std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());

    // Try .env.{environment} first, then fall back to .env
    let env_file = format!(".env.{}", env);
    if dotenvy::from_filename(&env_file).is_err() {
        dotenvy::dotenv().ok();
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_current_span(false)
        .flatten_event(true)
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    info!(
        environment = %env,
        mail_provider = ?config.mail_provider,
        expiry_window_ms = config.expiry_window_ms,
        dedup_window_secs = config.dedup_window.as_secs(),
        "Starting verify-email function"
    );

    // Database connection
    let mut opt = ConnectOptions::new(config.database.connection_url());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(config.store_timeout)
        .acquire_timeout(config.store_timeout)
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Failed to connect to database");
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
    })?;
    let db_arc = Arc::new(conn);

    let email_sender = build_email_sender(&config).map_err(|e| {
        error!(error = %e, "Failed to build email sender");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let store = VerificationStorePostgres::new(Arc::clone(&db_arc));
    let dispatch_use_case =
        DispatchVerificationEmailUseCase::new(store, email_sender, dispatch_settings(&config));

    let deduplicator = DeliveryDeduplicator::new(config.dedup_window);
    if !deduplicator.is_enabled() {
        warn!("Delivery deduplication disabled, redelivered events send the email again");
    }

    let state = AppState {
        dispatch_verification_email_use_case: Arc::new(dispatch_use_case),
        delivery_deduplicator: Arc::new(deduplicator),
    };

    let db_for_server = Arc::clone(&db_arc);
    let server_url = (config.host.clone(), config.port);
    info!(host = %config.host, port = config.port, "Listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(Arc::clone(&db_for_server)))
            .configure(init_routes)
    })
    .bind(server_url)?
    .run()
    .await
}

#[cfg(not(tarpaulin_include))]
fn init_routes(cfg: &mut web::ServiceConfig) {
    // Health
    cfg.service(crate::health::health);
    cfg.service(crate::health::readiness);
    // Pub/Sub push
    cfg.service(crate::verification::adapter::incoming::web::routes::receive_verification_event_handler);
}

#[cfg(not(tarpaulin_include))]
fn main() {
    if let Err(e) = start() {
        eprintln!("Error starting app: {e}");
        std::process::exit(1);
    }
}
