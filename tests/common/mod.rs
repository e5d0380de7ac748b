#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;

use ses_mail_viewer::{
    config::ExtraColumn,
    error::{AppError, RelayError},
    handlers::email::{
        email_smtp::SmtpForwarder, email_source::MessageSource, models::MessagesResponse,
        models::RawMessageRecord,
    },
    utils::utils_transports::{RelayEnvelope, RelayTransport},
    AppState,
};

pub const INBOX_JSON: &str = include_str!("../fixtures/inbox.json");
pub const LOGO_INBOX_JSON: &str = include_str!("../fixtures/logo_inbox.json");

pub fn records(json: &str) -> Vec<RawMessageRecord> {
    serde_json::from_str::<MessagesResponse>(json)
        .unwrap()
        .messages
}

pub struct FakeSource {
    pub records: Option<Vec<RawMessageRecord>>,
}

#[async_trait]
impl MessageSource for FakeSource {
    async fn fetch_messages(&self) -> Result<Vec<RawMessageRecord>, AppError> {
        match &self.records {
            Some(records) => Ok(records.clone()),
            None => Err(AppError::UpstreamStatus(502)),
        }
    }
}

#[derive(Default)]
pub struct RecordingRelay {
    pub sent: Mutex<Vec<RelayEnvelope>>,
}

#[async_trait]
impl RelayTransport for RecordingRelay {
    async fn send_raw(&self, envelope: &RelayEnvelope, _raw: &[u8]) -> Result<(), RelayError> {
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

pub fn state(
    records: Option<Vec<RawMessageRecord>>,
    forwarder: Arc<SmtpForwarder>,
    extra_columns: Vec<ExtraColumn>,
) -> web::Data<AppState> {
    web::Data::new(AppState {
        source: Arc::new(FakeSource { records }),
        forwarder,
        extra_columns,
    })
}
