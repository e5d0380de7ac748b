pub mod email_normalizer;
pub mod email_routes;
pub mod email_smtp;
pub mod email_source;
pub mod email_views;
pub mod models;
pub mod models_responders;
