use std::sync::Arc;

use actix_web::web;

use crate::config::ExtraColumn;
use crate::handlers::email::{
    email_routes::email_config, email_smtp::SmtpForwarder, email_source::MessageSource,
};

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod utils;

/// Shared by every worker; built once in `main`.
pub struct AppState {
    pub source: Arc<dyn MessageSource>,
    pub forwarder: Arc<SmtpForwarder>,
    pub extra_columns: Vec<ExtraColumn>,
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(email_config);
}
